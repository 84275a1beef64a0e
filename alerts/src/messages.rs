//! Alert builders.

use std::fmt::Display;

use vigil_types::{Coins, ExplorerLinks, MissedProposal, Timestamp};

use crate::{AlertMessage, Block, TextObject};

fn days_label(days: u64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

fn coins_label(coins: &Coins) -> String {
    if coins.is_empty() {
        "none".to_string()
    } else {
        coins.to_string()
    }
}

/// One message listing every proposal a validator has not voted on.
pub fn missed_proposals(
    network: &str,
    missed: &[MissedProposal],
    links: &ExplorerLinks,
    now: Timestamp,
) -> AlertMessage {
    let mut blocks = vec![Block::header(format!(" {network} "))];
    for proposal in missed {
        let ends_in = match proposal.voting_end_time {
            Some(end) => days_label(end.days_after(now).max(1)),
            None => "unknown".to_string(),
        };
        blocks.push(Block::section(format!("*{}*", proposal.title)));
        blocks.push(Block::fields(vec![
            TextObject::mrkdwn(format!(
                "*Proposal Id*\n *<{}| {} >* ",
                links.proposal_url(proposal.proposal_id),
                proposal.proposal_id
            )),
            TextObject::mrkdwn(format!("*Voting ends in* \n {ends_in} ")),
            TextObject::mrkdwn(format!("*Validator* \n{}", proposal.validator_address)),
        ]));
    }
    let text = format!(
        "{} proposal(s) awaiting a vote on {network}",
        missed.len()
    );
    AlertMessage::new(text, blocks)
}

pub fn low_balance(network: &str, address: &str, display_denom: &str) -> AlertMessage {
    let text = format!(
        "`{address}` is low on balance, available balance is less than 1 {display_denom}"
    );
    AlertMessage::new(
        text.clone(),
        vec![Block::header(format!(" {network} ")), Block::section(text)],
    )
}

pub fn withdraw_complete(
    network: &str,
    validator: &str,
    rewards: &Coins,
    commission: &Coins,
    tx_url: &str,
) -> AlertMessage {
    AlertMessage::new(
        format!("Rewards withdrawn on {network}"),
        vec![
            Block::header(format!(" {network} ")),
            Block::section(format!("*Rewards withdrawn* for `{validator}`")),
            Block::fields(vec![
                TextObject::mrkdwn(format!("*Rewards*\n{}", coins_label(rewards))),
                TextObject::mrkdwn(format!("*Commission*\n{}", coins_label(commission))),
                TextObject::mrkdwn(format!("*Transaction*\n<{tx_url}|view>")),
            ]),
        ],
    )
}

pub fn vote_cast(network: &str, proposal_id: u64, option: &str, tx_url: &str) -> AlertMessage {
    AlertMessage::new(
        format!("Voted {option} on {network} proposal {proposal_id}"),
        vec![
            Block::header(format!(" {network} ")),
            Block::section(format!(
                "Voted *{option}* on proposal {proposal_id}: <{tx_url}|transaction>"
            )),
        ],
    )
}

/// Report of one failed unit of work (a network, a validator, a sweep).
pub fn failure(scope: &str, error: &dyn Display) -> AlertMessage {
    let text = format!("{scope} failed: {error}");
    AlertMessage::new(
        text.clone(),
        vec![Block::header(" Failure "), Block::section(text)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missed(id: u64, end: Option<u64>) -> MissedProposal {
        MissedProposal {
            network: "cosmoshub".into(),
            proposal_id: id,
            title: format!("Proposal {id}"),
            voting_end_time: end.map(Timestamp::new),
            validator_address: "cosmos1val".into(),
        }
    }

    #[test]
    fn missed_layout_has_header_then_two_blocks_per_proposal() {
        let now = Timestamp::new(1_000_000);
        let links = ExplorerLinks::for_network("cosmoshub", None);
        let msg = missed_proposals(
            "cosmoshub",
            &[
                missed(1, Some(1_000_000 + 3 * 86_400 + 10)),
                missed(2, Some(1_000_100)),
                missed(3, None),
            ],
            &links,
            now,
        );
        assert_eq!(msg.blocks.len(), 7);
        assert!(matches!(msg.blocks[0], Block::Header { .. }));
        assert!(msg.contains("https://www.mintscan.io/cosmos/proposals/1"));
        assert!(msg.contains("3 days"));
        assert!(msg.contains("1 day"));
        assert!(msg.contains("unknown"));
        assert!(msg.contains("*Proposal 2*"));
    }

    #[test]
    fn low_balance_wording() {
        let msg = low_balance("osmosis", "osmo1abc", "OSMO");
        assert_eq!(
            msg.text,
            "`osmo1abc` is low on balance, available balance is less than 1 OSMO"
        );
    }

    #[test]
    fn withdraw_alert_carries_totals_and_link() {
        let rewards = Coins::parse("2000uatom").unwrap();
        let msg = withdraw_complete(
            "cosmoshub",
            "cosmosvaloper1v",
            &rewards,
            &Coins::new(),
            "https://www.mintscan.io/cosmos/tx/ABC",
        );
        assert!(msg.contains("2000uatom"));
        assert!(msg.contains("none"));
        assert!(msg.contains("https://www.mintscan.io/cosmos/tx/ABC"));
    }

    #[test]
    fn failure_names_scope() {
        let msg = failure("proposal poll on juno", &"no active REST endpoint");
        assert!(msg.contains("proposal poll on juno failed: no active REST endpoint"));
    }
}
