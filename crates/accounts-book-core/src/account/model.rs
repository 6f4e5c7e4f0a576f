//! Account model types.

use serde::{Deserialize, Deserializer, Serialize};

use super::validation::InvalidField;

/// Unique identifier for an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<&AccountId> for AccountId {
    fn from(id: &Self) -> Self {
        id.clone()
    }
}

/// Where the account's credential lives.
///
/// Serialized names match the snapshots already written by earlier
/// versions of the accounts book. Anything other than `"LDAP"` (including
/// null and unknown names) reads back as [`AccountType::Local`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AccountType {
    /// Directory-backed account; the password is managed externally.
    #[serde(rename = "LDAP")]
    Ldap,
    /// Local account with a locally stored password.
    #[default]
    #[serde(rename = "Локальная")]
    Local,
}

impl<'de> Deserialize<'de> for AccountType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;
        match name.as_deref() {
            Some("LDAP") => Ok(Self::Ldap),
            _ => Ok(Self::Local),
        }
    }
}

impl AccountType {
    /// Get display name for the account type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ldap => "LDAP",
            Self::Local => "Local",
        }
    }

    /// Whether the credential is managed by an external directory.
    #[must_use]
    pub const fn is_directory_backed(&self) -> bool {
        matches!(self, Self::Ldap)
    }
}

/// A single label token derived from the raw label text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Trimmed, non-empty label text.
    pub text: String,
}

impl Label {
    /// Create a label from already-normalized text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Per-field validity flags, recomputed on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    /// Raw label text is within the length limit.
    pub raw_labels: bool,
    /// Account type is valid (it has no invalid state).
    #[serde(rename = "type")]
    pub account_type: bool,
    /// Login is present and within limits.
    pub login: bool,
    /// Password is within limits, or not required.
    pub password: bool,
}

impl Default for Validity {
    fn default() -> Self {
        Self {
            raw_labels: true,
            account_type: true,
            login: false,
            password: false,
        }
    }
}

impl Validity {
    /// List the fields currently flagged invalid, in field order.
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<InvalidField> {
        let mut fields = Vec::new();
        if !self.raw_labels {
            fields.push(InvalidField::RawLabels);
        }
        if !self.login {
            fields.push(InvalidField::Login);
        }
        if !self.password {
            fields.push(InvalidField::Password);
        }
        fields
    }
}

/// A credential entry in the accounts book.
///
/// `labels` and `valid` are derived from the other fields; see
/// [`crate::derive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier, fixed at creation.
    pub id: AccountId,
    /// Free-text labels separated by `;`.
    #[serde(default)]
    pub raw_labels: String,
    /// Labels parsed from `raw_labels`.
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Account type.
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    /// Login name.
    #[serde(default)]
    pub login: Option<String>,
    /// Password (always `None` for directory-backed accounts).
    #[serde(default)]
    pub password: Option<String>,
    /// Validity flags.
    #[serde(default)]
    pub valid: Validity,
}

impl Account {
    /// Create a blank local account with the given ID.
    ///
    /// The returned record has not been derived yet.
    #[must_use]
    pub fn blank(id: AccountId) -> Self {
        Self {
            id,
            raw_labels: String::new(),
            labels: Vec::new(),
            account_type: AccountType::Local,
            login: Some(String::new()),
            password: Some(String::new()),
            valid: Validity::default(),
        }
    }

    /// Aggregate verdict: login is valid and, for local accounts, so is
    /// the password. Label validity does not count.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.valid.login && (self.account_type.is_directory_backed() || self.valid.password)
    }
}

/// Partial update for an existing account.
///
/// Only supplied fields are applied. For `login` and `password`,
/// `Some(None)` sets the field to null while `None` leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPatch {
    /// Target account.
    pub id: AccountId,
    /// New account type.
    pub account_type: Option<AccountType>,
    /// New raw label text.
    pub raw_labels: Option<String>,
    /// New login.
    pub login: Option<Option<String>>,
    /// New password.
    pub password: Option<Option<String>>,
}

impl AccountPatch {
    /// Create an empty patch targeting `id`.
    #[must_use]
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            account_type: None,
            raw_labels: None,
            login: None,
            password: None,
        }
    }

    /// Set the account type.
    #[must_use]
    pub fn with_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// Set the raw label text.
    #[must_use]
    pub fn with_raw_labels(mut self, raw_labels: impl Into<String>) -> Self {
        self.raw_labels = Some(raw_labels.into());
        self
    }

    /// Set the login.
    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(Some(login.into()));
        self
    }

    /// Set the login to null.
    #[must_use]
    pub fn clear_login(mut self) -> Self {
        self.login = Some(None);
        self
    }

    /// Set the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Some(password.into()));
        self
    }

    /// Set the password to null.
    #[must_use]
    pub fn clear_password(mut self) -> Self {
        self.password = Some(None);
        self
    }

    /// Overlay the supplied fields onto `account`.
    pub(crate) fn apply_to(self, account: &mut Account) {
        if let Some(account_type) = self.account_type {
            account.account_type = account_type;
        }
        if let Some(raw_labels) = self.raw_labels {
            account.raw_labels = raw_labels;
        }
        if let Some(login) = self.login {
            account.login = login;
        }
        if let Some(password) = self.password {
            account.password = password;
        }
    }
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

    mod account_id_tests {
        use super::*;

        #[test]
        fn display() {
            let id = AccountId::new("abc-123");
            assert_eq!(format!("{id}"), "abc-123");
        }

        #[test]
        fn equality() {
            assert_eq!(AccountId::new("a"), AccountId::from("a"));
            assert_ne!(AccountId::new("a"), AccountId::new("b"));
        }

        #[test]
        fn serializes_as_plain_string() {
            let json = serde_json::to_string(&AccountId::new("x1")).unwrap();
            assert_eq!(json, "\"x1\"");
        }
    }

    mod account_type_tests {
        use super::*;

        #[test]
        fn default_is_local() {
            assert_eq!(AccountType::default(), AccountType::Local);
        }

        #[test]
        fn wire_names() {
            assert_eq!(serde_json::to_string(&AccountType::Ldap).unwrap(), "\"LDAP\"");
            assert_eq!(
                serde_json::to_string(&AccountType::Local).unwrap(),
                "\"Локальная\""
            );
        }

        #[test]
        fn accepts_english_local_alias() {
            let parsed: AccountType = serde_json::from_str("\"Local\"").unwrap();
            assert_eq!(parsed, AccountType::Local);
        }

        #[test]
        fn unknown_and_null_read_as_local() {
            for raw in ["\"Other\"", "\"ldap\"", "\"\"", "null"] {
                let parsed: AccountType = serde_json::from_str(raw).unwrap();
                assert_eq!(parsed, AccountType::Local, "input {raw}");
            }
        }

        #[test]
        fn reads_back_what_it_writes() {
            for account_type in [AccountType::Ldap, AccountType::Local] {
                let json = serde_json::to_string(&account_type).unwrap();
                let parsed: AccountType = serde_json::from_str(&json).unwrap();
                assert_eq!(parsed, account_type);
            }
        }

        #[test]
        fn display_names() {
            assert_eq!(AccountType::Ldap.display_name(), "LDAP");
            assert_eq!(AccountType::Local.display_name(), "Local");
        }

        #[test]
        fn directory_backed() {
            assert!(AccountType::Ldap.is_directory_backed());
            assert!(!AccountType::Local.is_directory_backed());
        }
    }

    mod validity_tests {
        use super::*;

        #[test]
        fn invalid_fields_in_order() {
            let valid = Validity {
                raw_labels: false,
                account_type: true,
                login: false,
                password: false,
            };
            assert_eq!(
                valid.invalid_fields(),
                vec![
                    InvalidField::RawLabels,
                    InvalidField::Login,
                    InvalidField::Password
                ]
            );
        }

        #[test]
        fn all_valid_has_no_invalid_fields() {
            let valid = Validity {
                raw_labels: true,
                account_type: true,
                login: true,
                password: true,
            };
            assert!(valid.invalid_fields().is_empty());
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn serialized_layout() {
            let account = Account::blank(AccountId::new("id-1"));
            let value = serde_json::to_value(&account).unwrap();
            let object = value.as_object().unwrap();
            for key in ["id", "rawLabels", "labels", "type", "login", "password", "valid"] {
                assert!(object.contains_key(key), "missing {key}");
            }
            let valid = object["valid"].as_object().unwrap();
            for key in ["rawLabels", "type", "login", "password"] {
                assert!(valid.contains_key(key), "missing valid.{key}");
            }
        }

        #[test]
        fn missing_raw_labels_defaults_to_empty() {
            let account: Account =
                serde_json::from_str(r#"{"id":"a","type":"LDAP","login":"bob"}"#).unwrap();
            assert_eq!(account.raw_labels, "");
            assert!(account.labels.is_empty());
            assert!(account.password.is_none());
        }

        #[test]
        fn null_password_round_trips() {
            let mut account = Account::blank(AccountId::new("a"));
            account.password = None;
            let json = serde_json::to_string(&account).unwrap();
            assert!(json.contains("\"password\":null"));
        }

        #[test]
        fn is_complete_ignores_labels() {
            let mut account = Account::blank(AccountId::new("a"));
            account.valid = Validity {
                raw_labels: false,
                account_type: true,
                login: true,
                password: true,
            };
            assert!(account.is_complete());
        }

        #[test]
        fn is_complete_skips_password_for_ldap() {
            let mut account = Account::blank(AccountId::new("a"));
            account.account_type = AccountType::Ldap;
            account.valid.login = true;
            account.valid.password = false;
            assert!(account.is_complete());
        }
    }

    mod patch_tests {
        use super::*;

        #[test]
        fn applies_only_supplied_fields() {
            let mut account = Account::blank(AccountId::new("a"));
            account.login = Some("alice".to_string());
            AccountPatch::new("a")
                .with_raw_labels("x; y")
                .apply_to(&mut account);
            assert_eq!(account.raw_labels, "x; y");
            assert_eq!(account.login.as_deref(), Some("alice"));
            assert_eq!(account.account_type, AccountType::Local);
        }

        #[test]
        fn clear_sets_null() {
            let mut account = Account::blank(AccountId::new("a"));
            AccountPatch::new("a").clear_login().apply_to(&mut account);
            assert!(account.login.is_none());
        }
    }
}
