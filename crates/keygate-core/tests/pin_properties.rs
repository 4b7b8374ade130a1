//! Property-based tests for PIN shape validation.
//!
//! These tests use proptest to generate arbitrary keypad input and verify that
//! exactly the 4-ASCII-digit strings are accepted.

use keygate_core::constants::PIN_LENGTH;
use keygate_core::{Error, Pin};
use proptest::prelude::*;

/// Strategy for generating well-formed PINs.
fn valid_pin() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9]{4}").expect("Failed to create PIN regex strategy")
}

/// Strategy for digit strings of any length except 4.
fn wrong_length_digits() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[0-9]{0,3}").expect("Failed to create short regex"),
        prop::string::string_regex("[0-9]{5,12}").expect("Failed to create long regex"),
    ]
}

/// Strategy for 4-character strings containing at least one non-digit.
fn four_chars_with_non_digit() -> impl Strategy<Value = String> {
    (
        prop::string::string_regex("[0-9]{0,3}").expect("Failed to create prefix regex"),
        "[^0-9]",
    )
        .prop_map(|(prefix, bad)| {
            let mut pin = prefix;
            pin.push_str(&bad);
            pin.chars().take(PIN_LENGTH).collect()
        })
}

proptest! {
    /// Property: every 4-digit string is a valid PIN and keeps its digits.
    #[test]
    fn prop_four_digits_always_accepted(raw in valid_pin()) {
        let pin = Pin::new(&raw).unwrap();
        prop_assert_eq!(pin.as_str(), raw.as_str());
        prop_assert!(pin.matches(&raw));
    }

    /// Property: digit strings of the wrong length are always rejected.
    #[test]
    fn prop_wrong_length_rejected(raw in wrong_length_digits()) {
        prop_assert!(matches!(Pin::new(&raw), Err(Error::InvalidPin(_))));
    }

    /// Property: any non-digit character makes the PIN invalid.
    #[test]
    fn prop_non_digit_rejected(raw in four_chars_with_non_digit()) {
        prop_assert!(Pin::new(&raw).is_err());
    }

    /// Property: two PINs are equal exactly when their digits are equal.
    #[test]
    fn prop_equality_follows_digits(a in valid_pin(), b in valid_pin()) {
        let left = Pin::new(&a).unwrap();
        let right = Pin::new(&b).unwrap();
        prop_assert_eq!(left == right, a == b);
    }
}
