//! Alert dispatch.
//!
//! - [`blocks`]: the Slack Block Kit subset alerts are built from
//! - [`messages`]: one builder per alert kind, returning data, never sending
//! - [`sink`]: the [`AlertSink`] seam and the Slack Web API client
//! - [`dispatcher`]: binds a sink to a channel and logs delivery

pub mod blocks;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod sink;

pub use blocks::{AlertMessage, Block, TextObject};
pub use dispatcher::AlertDispatcher;
pub use error::AlertError;
pub use sink::{AlertSink, SlackClient};
