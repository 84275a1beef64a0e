use proptest::prelude::*;

use vigil_types::{Coin, Coins, RewardPeriod, Timestamp};

fn denom() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["uatom", "stake", "uosmo", "aevmos"]).prop_map(String::from)
}

proptest! {
    /// Adding coins in any order yields the same totals.
    #[test]
    fn coin_addition_is_order_independent(
        entries in prop::collection::vec((denom(), 0u64..1_000_000_000), 0..20)
    ) {
        let mut forward = Coins::new();
        for (d, a) in &entries {
            forward.add(Coin::new(d.clone(), *a as u128)).unwrap();
        }
        let mut backward = Coins::new();
        for (d, a) in entries.iter().rev() {
            backward.add(Coin::new(d.clone(), *a as u128)).unwrap();
        }
        prop_assert_eq!(&forward, &backward);
    }

    /// Display output parses back to the same set.
    #[test]
    fn coins_display_parses_back(
        entries in prop::collection::vec((denom(), 0u64..u64::MAX), 0..10)
    ) {
        let mut coins = Coins::new();
        for (d, a) in entries {
            coins.add(Coin::new(d, a as u128)).unwrap();
        }
        let parsed = Coins::parse(&coins.to_string()).unwrap();
        prop_assert_eq!(parsed, coins);
    }

    /// Every day of a month maps to the same monthly period key.
    #[test]
    fn monthly_key_is_stable_within_month(secs in 0u64..4_102_444_800) {
        let ts = Timestamp::new(secs);
        let date = ts.date();
        let key = RewardPeriod::Monthly.period_key(date);
        prop_assert!(key.ends_with("-01"));
        prop_assert_eq!(&key[..7], &date.format("%Y-%m").to_string()[..]);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
    }

    /// Bincode round trip of coin sets used by the LMDB backend.
    #[test]
    fn coins_bincode_roundtrip(amount in 0u64..u64::MAX) {
        let mut coins = Coins::new();
        coins.add(Coin::new("uatom", amount as u128)).unwrap();
        let encoded = bincode::serialize(&coins).unwrap();
        let decoded: Coins = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, coins);
    }
}
