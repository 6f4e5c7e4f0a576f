//! Account field validation.
//!
//! All functions here are total: bad input yields `false` or an empty
//! list, never an error. Lengths are counted in UTF-16 code units and
//! trimming uses the ECMAScript whitespace set, so verdicts agree with
//! snapshots written by the browser form.

use super::model::{AccountType, Label};

/// Maximum length of the raw label text.
pub const MAX_LABELS_INPUT: usize = 50;

/// Maximum length of a trimmed login.
pub const MAX_LOGIN: usize = 100;

/// Maximum length of a trimmed password.
pub const MAX_PASSWORD: usize = 100;

/// Separator between labels in the raw label text.
pub const LABEL_SEPARATOR: char = ';';

/// A field flagged invalid by derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidField {
    /// Raw label text is too long.
    RawLabels,
    /// Login is missing, blank, or too long.
    Login,
    /// Password is blank or too long.
    Password,
}

impl InvalidField {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::RawLabels => "Labels must be at most 50 characters",
            Self::Login => "Login is required (at most 100 characters)",
            Self::Password => "Password is required (at most 100 characters)",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::RawLabels => "rawLabels",
            Self::Login => "login",
            Self::Password => "password",
        }
    }
}

impl std::fmt::Display for InvalidField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Check the raw label text length. No trimming is applied.
#[must_use]
pub fn validate_labels_input(raw: &str) -> bool {
    utf16_len(raw) <= MAX_LABELS_INPUT
}

/// Split raw label text into labels.
///
/// Pieces are separated by `;`, trimmed, and empty pieces dropped.
#[must_use]
pub fn split_labels(raw: &str) -> Vec<Label> {
    raw.split(LABEL_SEPARATOR)
        .map(trim)
        .filter(|token| !token.is_empty())
        .map(Label::new)
        .collect()
}

/// Check that a login is non-blank and within [`MAX_LOGIN`].
#[must_use]
pub fn validate_login(login: &str) -> bool {
    is_filled_within(login, MAX_LOGIN)
}

/// Check a password for the given account type.
///
/// Directory-backed accounts need no local password, so any input passes.
#[must_use]
pub fn validate_password(password: &str, account_type: AccountType) -> bool {
    if account_type.is_directory_backed() {
        return true;
    }
    is_filled_within(password, MAX_PASSWORD)
}

fn is_filled_within(value: &str, max: usize) -> bool {
    let normalized = trim(value);
    !normalized.is_empty() && utf16_len(normalized) <= max
}

fn utf16_len(value: &str) -> usize {
    value.encode_utf16().count()
}

/// Same set as ECMAScript `String.prototype.trim`: Unicode whitespace
/// except NEL, plus the byte order mark.
fn is_trimmable(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

fn trim(value: &str) -> &str {
    value.trim_matches(is_trimmable)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(labels: &[Label]) -> Vec<&str> {
        labels.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_split_labels() {
        let labels = split_labels(" work ;; home;  ;x ");
        assert_eq!(texts(&labels), vec!["work", "home", "x"]);
    }

    #[test]
    fn test_split_labels_empty() {
        assert!(split_labels("").is_empty());
        assert!(split_labels(" ; ;").is_empty());
    }

    #[test]
    fn test_labels_length_boundary() {
        assert!(validate_labels_input(""));
        assert!(validate_labels_input(&"a".repeat(50)));
        assert!(!validate_labels_input(&"a".repeat(51)));
    }

    #[test]
    fn test_labels_length_counts_whitespace() {
        let raw = format!("{} ", "a".repeat(50));
        assert!(!validate_labels_input(&raw));
    }

    #[test]
    fn test_labels_length_counts_characters() {
        assert!(validate_labels_input(&"ж".repeat(50)));
        assert!(!validate_labels_input(&"ж".repeat(51)));
    }

    #[test]
    fn test_validate_login() {
        assert!(!validate_login(""));
        assert!(!validate_login(" "));
        assert!(validate_login("bob"));
        assert!(validate_login(&"a".repeat(100)));
        assert!(!validate_login(&"a".repeat(101)));
    }

    #[test]
    fn test_validate_login_trims_before_length() {
        let padded = format!("  {}  ", "a".repeat(100));
        assert!(validate_login(&padded));
    }

    #[test]
    fn test_validate_password_local() {
        assert!(!validate_password("", AccountType::Local));
        assert!(!validate_password("   ", AccountType::Local));
        assert!(validate_password("hunter2", AccountType::Local));
        assert!(validate_password(&"p".repeat(100), AccountType::Local));
        assert!(!validate_password(&"p".repeat(101), AccountType::Local));
    }

    #[test]
    fn test_validate_password_ldap() {
        assert!(validate_password("", AccountType::Ldap));
        assert!(validate_password(&"p".repeat(500), AccountType::Ldap));
    }

    #[test]
    fn test_labels_length_counts_utf16_units() {
        assert!(validate_labels_input(&"😀".repeat(25)));
        assert!(!validate_labels_input(&"😀".repeat(26)));
        assert!(!validate_labels_input(&format!("{}😀", "a".repeat(49))));
    }

    #[test]
    fn test_login_and_password_count_utf16_units() {
        assert!(validate_login(&"😀".repeat(50)));
        assert!(!validate_login(&"😀".repeat(51)));
        assert!(validate_password(&"😀".repeat(50), AccountType::Local));
        assert!(!validate_password(&"😀".repeat(51), AccountType::Local));
    }

    #[test]
    fn test_byte_order_mark_is_trimmed() {
        assert!(!validate_login("\u{FEFF}"));
        assert!(!validate_password(" \u{FEFF} ", AccountType::Local));
        assert!(validate_login("\u{FEFF}bob\u{FEFF}"));
        assert_eq!(texts(&split_labels("\u{FEFF}a\u{FEFF};\u{FEFF}")), vec!["a"]);
    }

    #[test]
    fn test_next_line_is_not_trimmed() {
        assert!(validate_login("\u{85}"));
        assert_eq!(texts(&split_labels("\u{85}")), vec!["\u{85}"]);
    }

    #[test]
    fn test_invalid_field_messages() {
        assert_eq!(InvalidField::Login.field(), "login");
        assert_eq!(
            InvalidField::Password.to_string(),
            InvalidField::Password.message()
        );
    }

    proptest! {
        #[test]
        fn split_labels_has_no_empty_entries(raw in "[a-z ;\\t]{0,80}") {
            let labels = split_labels(&raw);
            prop_assert!(labels.iter().all(|l| !l.text.is_empty()));
        }

        #[test]
        fn split_labels_matches_trimmed_segments(raw in "[a-z ;]{0,80}") {
            let expected: Vec<&str> = raw
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let labels = split_labels(&raw);
            prop_assert_eq!(texts(&labels), expected);
        }

        #[test]
        fn split_labels_entries_are_trimmed(raw in "[a-z ;]{0,80}") {
            for label in split_labels(&raw) {
                prop_assert_eq!(label.text.trim(), label.text.as_str());
                prop_assert!(!label.text.contains(';'));
            }
        }

        #[test]
        fn short_label_input_is_valid(raw in "[^\\n\\x{10000}-\\x{10FFFF}]{0,50}") {
            prop_assert!(validate_labels_input(&raw));
        }

        #[test]
        fn ldap_password_always_valid(password in ".*") {
            prop_assert!(validate_password(&password, AccountType::Ldap));
        }
    }
}
