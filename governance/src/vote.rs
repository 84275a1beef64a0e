//! Vote option strings as stored in the proposal log.

use vigil_network::WeightedVote;

/// `VOTE_OPTION_YES` → `YES`. Unknown labels pass through upper-cased.
pub fn normalize_option(raw: &str) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    upper
        .strip_prefix("VOTE_OPTION_")
        .map(str::to_string)
        .unwrap_or(upper)
}

/// Stored form of a vote: the option alone for a single-option vote,
/// otherwise `OPTION-weight` pairs joined by `,` with weights as reported.
/// Empty when there is no vote.
pub fn compose_vote_option(votes: &[WeightedVote]) -> String {
    match votes {
        [] => String::new(),
        [single] => normalize_option(&single.option),
        split => split
            .iter()
            .map(|v| format!("{}-{}", normalize_option(&v.option), v.weight))
            .collect::<Vec<_>>()
            .join(","),
    }
}
