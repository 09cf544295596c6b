//! Property-based tests for update arithmetic.

use proptest::prelude::*;
use starledger_shared::types::UpdateMode;

use super::mode::{apply_balance, apply_quantity};

fn mode() -> impl Strategy<Value = UpdateMode> {
    prop_oneof![
        Just(UpdateMode::Add),
        Just(UpdateMode::Subtract),
        Just(UpdateMode::Set),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No accepted sequence of operations drives the balance below zero,
    /// and a rejected operation leaves the balance untouched.
    #[test]
    fn test_balance_never_negative(
        start in 0i64..1_000_000,
        ops in prop::collection::vec((mode(), -1_000i64..1_000_000), 1..50),
    ) {
        let mut balance = start;
        for (mode, amount) in ops {
            if let Ok(next) = apply_balance(balance, amount, mode) {
                balance = next;
            }
            prop_assert!(balance >= 0);
        }
    }

    /// Add then subtract of the same amount restores the balance.
    #[test]
    fn test_add_subtract_inverse(start in 0i64..1_000_000_000, amount in 0i64..1_000_000_000) {
        let added = apply_balance(start, amount, UpdateMode::Add).unwrap();
        prop_assert_eq!(apply_balance(added, amount, UpdateMode::Subtract), Ok(start));
    }

    /// Quantities stay finite and non-negative under any accepted operation.
    #[test]
    fn test_quantity_never_negative(
        start in 0.0f64..1e9,
        ops in prop::collection::vec((mode(), -10.0f64..1e6), 1..50),
    ) {
        let mut quantity = start;
        for (mode, amount) in ops {
            if let Ok(next) = apply_quantity(quantity, amount, mode) {
                quantity = next;
            }
            prop_assert!(quantity >= 0.0);
            prop_assert!(quantity.is_finite());
        }
    }
}
