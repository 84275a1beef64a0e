//! Denomination-aware coin amounts.
//!
//! Amounts are integers in the chain's base unit (u128) so sums never lose
//! precision. A [`Coins`] set keeps one running total per denom and renders
//! in the chain's own `"500uatom,10stake"` notation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A single amount of one denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Parse a single `<amount><denom>` token such as `1000uatom` or
    /// `5ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2`.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TypesError::InvalidCoin(s.to_string()))?;
        let (digits, denom) = s.split_at(split);
        if digits.is_empty() || !is_valid_denom(denom) {
            return Err(TypesError::InvalidCoin(s.to_string()));
        }
        let amount = digits
            .parse::<u128>()
            .map_err(|_| TypesError::InvalidCoin(s.to_string()))?;
        Ok(Self::new(denom, amount))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

fn is_valid_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}

/// A set of coins with one cumulative amount per denomination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coins(BTreeMap<String, u128>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a coin, accumulating into any existing amount of the same denom.
    pub fn add(&mut self, coin: Coin) -> Result<(), TypesError> {
        let entry = self.0.entry(coin.denom.clone()).or_insert(0);
        *entry = entry
            .checked_add(coin.amount)
            .ok_or(TypesError::CoinOverflow(coin.denom))?;
        Ok(())
    }

    /// Add every denom of `other` into this set.
    pub fn merge(&mut self, other: &Coins) -> Result<(), TypesError> {
        for coin in other.iter() {
            self.add(coin)?;
        }
        Ok(())
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate coins in denom order.
    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0
            .iter()
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    /// Parse a comma-separated coin list. An empty string is an empty set.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let mut coins = Coins::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            coins.add(Coin::parse(token)?)?;
        }
        Ok(coins)
    }
}

impl FromStr for Coins {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coins::parse(s)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for Coins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Coins::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_coin() {
        let coin = Coin::parse("1000uatom").unwrap();
        assert_eq!(coin.denom, "uatom");
        assert_eq!(coin.amount, 1000);
    }

    #[test]
    fn parse_ibc_denom() {
        let coin =
            Coin::parse("42ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2")
                .unwrap();
        assert_eq!(coin.amount, 42);
        assert!(coin.denom.starts_with("ibc/"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Coin::parse("uatom").is_err());
        assert!(Coin::parse("1000").is_err());
        assert!(Coin::parse("10 0uatom").is_err());
        assert!(Coin::parse("1.5uatom").is_err());
    }

    #[test]
    fn same_denom_accumulates() {
        let mut coins = Coins::new();
        coins.add(Coin::new("uatom", 1000)).unwrap();
        coins.add(Coin::new("uatom", 1000)).unwrap();
        assert_eq!(coins.amount_of("uatom"), 2000);
        assert_eq!(coins.to_string(), "2000uatom");
    }

    #[test]
    fn denoms_accumulate_independently() {
        let mut coins = Coins::parse("500uatom,10stake").unwrap();
        coins.merge(&Coins::parse("500uatom,10stake").unwrap()).unwrap();
        assert_eq!(coins.amount_of("uatom"), 1000);
        assert_eq!(coins.amount_of("stake"), 20);
        assert_eq!(coins.len(), 2);
    }

    #[test]
    fn empty_string_is_empty_set() {
        let coins = Coins::parse("").unwrap();
        assert!(coins.is_empty());
        assert_eq!(coins.to_string(), "");
    }

    #[test]
    fn overflow_is_reported() {
        let mut coins = Coins::new();
        coins.add(Coin::new("uatom", u128::MAX)).unwrap();
        assert_eq!(
            coins.add(Coin::new("uatom", 1)),
            Err(TypesError::CoinOverflow("uatom".into()))
        );
    }

    #[test]
    fn serializes_as_string() {
        let coins = Coins::parse("10stake,500uatom").unwrap();
        let json = serde_json::to_string(&coins).unwrap();
        assert_eq!(json, "\"10stake,500uatom\"");
        let back: Coins = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coins);
    }
}
