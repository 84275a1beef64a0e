//! Block Kit subset.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::PlainText { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header {
        text: TextObject,
    },
    Section {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Divider,
}

impl Block {
    pub fn header(text: impl Into<String>) -> Self {
        Self::Header {
            text: TextObject::plain(text),
        }
    }

    pub fn section(text: impl Into<String>) -> Self {
        Self::Section {
            text: Some(TextObject::mrkdwn(text)),
            fields: Vec::new(),
        }
    }

    pub fn fields(fields: Vec<TextObject>) -> Self {
        Self::Section { text: None, fields }
    }

    /// Every piece of text in the block, for assertions and fallbacks.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Header { text } => vec![text.text()],
            Self::Section { text, fields } => text
                .iter()
                .chain(fields.iter())
                .map(TextObject::text)
                .collect(),
            Self::Divider => Vec::new(),
        }
    }
}

/// One message for the alert channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Notification fallback shown where blocks are not rendered.
    pub text: String,
    pub blocks: Vec<Block>,
}

impl AlertMessage {
    pub fn new(text: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            text: text.into(),
            blocks,
        }
    }

    /// Whether any block text contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
            || self
                .blocks
                .iter()
                .flat_map(Block::texts)
                .any(|t| t.contains(needle))
    }
}
