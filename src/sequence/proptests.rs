//! Property-based tests for text cleanup
//!
//! Tests for:
//! - Idempotence: normalizing twice changes nothing
//! - ASCII input passes through untouched
//! - Displayable text is always short ASCII

use super::{is_displayable, normalize, Message, MAX_TEXT_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_normalize_idempotent(text in "\\PC{0,80}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_ascii_unchanged(text in "[ -~]{0,200}") {
        prop_assert_eq!(normalize(&text), text);
    }

    #[test]
    fn prop_displayable_means_short_ascii(text in "\\PC{0,200}") {
        let message = Message::new(normalize(&text));
        if is_displayable(&message) {
            prop_assert!(message.text.is_ascii());
            prop_assert!(message.text.len() <= MAX_TEXT_LEN);
        }
    }
}
