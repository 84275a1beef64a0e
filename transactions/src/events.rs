//! Reward and commission totals from transaction events.

use serde::{Deserialize, Serialize};
use vigil_types::Coins;

use crate::Event;

pub const WITHDRAW_REWARDS_EVENT: &str = "withdraw_rewards";
pub const WITHDRAW_COMMISSION_EVENT: &str = "withdraw_commission";

const AMOUNT_KEY: &str = "amount";

/// Sum every `amount` attribute of every event of `kind`, per denom.
///
/// An empty amount (nothing to withdraw) contributes nothing. Unparseable
/// amounts are logged and skipped.
pub fn sum_event_amounts(events: &[Event], kind: &str) -> Coins {
    let mut total = Coins::new();
    for event in events.iter().filter(|e| e.kind == kind) {
        for raw in event.attribute(AMOUNT_KEY) {
            let parsed = Coins::parse(raw).and_then(|coins| total.merge(&coins));
            if let Err(e) = parsed {
                tracing::warn!(event = kind, amount = raw, error = %e, "unreadable event amount");
            }
        }
    }
    total
}

/// Amounts moved by one withdrawal transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawTotals {
    pub rewards: Coins,
    pub commission: Coins,
}

impl WithdrawTotals {
    pub fn from_events(events: &[Event]) -> Self {
        Self {
            rewards: sum_event_amounts(events, WITHDRAW_REWARDS_EVENT),
            commission: sum_event_amounts(events, WITHDRAW_COMMISSION_EVENT),
        }
    }
}
