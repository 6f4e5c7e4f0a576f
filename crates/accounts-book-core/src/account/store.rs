//! Persisted account list.

use tracing::{debug, warn};

use super::id::{IdGenerator, UuidGenerator};
use super::model::{Account, AccountId, AccountPatch, Validity};
use super::validation::{split_labels, validate_labels_input, validate_login, validate_password};
use crate::Result;
use crate::config::StoreConfig;
use crate::storage::{FileStorage, MemoryStorage, Storage};

/// Recompute the derived fields of an account.
///
/// Directory-backed accounts lose their password, `labels` is rebuilt from
/// `raw_labels`, and every `valid` flag is recomputed. The result depends
/// only on the non-derived fields, so deriving twice changes nothing.
#[must_use]
pub fn derive(mut account: Account) -> Account {
    let directory_backed = account.account_type.is_directory_backed();
    if directory_backed {
        account.password = None;
    }

    account.labels = split_labels(&account.raw_labels);

    let login_ok = account.login.as_deref().is_some_and(validate_login);
    let password_ok = directory_backed
        || validate_password(
            account.password.as_deref().unwrap_or_default(),
            account.account_type,
        );

    account.valid = Validity {
        raw_labels: validate_labels_input(&account.raw_labels),
        account_type: true,
        login: login_ok,
        password: password_ok,
    };
    account
}

/// Bring a record read from storage in line with the current invariants.
///
/// Fields missing from older snapshots (`rawLabels`, `labels`, `valid`)
/// are defaulted during deserialization; stale derived fields are
/// overwritten here.
#[must_use]
pub fn normalize_on_load(account: Account) -> Account {
    derive(account)
}

/// Ordered list of accounts mirrored to a single storage slot.
///
/// Every mutation derives the affected record and rewrites the whole list.
pub struct AccountStore<S, G = UuidGenerator> {
    items: Vec<Account>,
    storage: S,
    storage_key: String,
    ids: G,
}

impl AccountStore<MemoryStorage> {
    /// Create an empty store backed by memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new(), crate::config::DEFAULT_STORAGE_KEY)
    }
}

impl AccountStore<FileStorage> {
    /// Open the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. Unreadable stored
    /// data is not an error; the store starts empty instead.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let storage = FileStorage::new(&config.data_dir);
        Ok(Self::open(storage, config.storage_key.clone()))
    }
}

impl<S: Storage> AccountStore<S> {
    /// Open a store over `storage`, loading whatever is under `storage_key`.
    ///
    /// Missing, unreadable, or malformed data yields an empty store.
    pub fn open(storage: S, storage_key: impl Into<String>) -> Self {
        Self::with_id_generator(storage, storage_key, UuidGenerator)
    }
}

impl<S: Storage, G: IdGenerator> AccountStore<S, G> {
    /// Open a store that takes new account IDs from `ids`.
    pub fn with_id_generator(storage: S, storage_key: impl Into<String>, ids: G) -> Self {
        let storage_key = storage_key.into();
        let items = load(&storage, &storage_key);
        debug!("Loaded {} accounts from {storage_key}", items.len());
        Self {
            items,
            storage,
            storage_key,
            ids,
        }
    }

    /// All accounts, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Account] {
        &self.items
    }

    /// Look up an account by ID.
    #[must_use]
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.items.iter().find(|a| &a.id == id)
    }

    /// Number of accounts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Whether there is at least one account.
    #[must_use]
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// The underlying storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning its storage.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Build a fresh, derived local account with a new ID.
    ///
    /// The account is not added to the store.
    pub fn new_account(&mut self) -> Account {
        derive(Account::blank(self.ids.next_id()))
    }

    /// Append a blank account and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails. The account stays in memory.
    pub fn add_empty(&mut self) -> Result<AccountId> {
        let account = self.new_account();
        let id = account.id.clone();
        self.items.push(account);
        self.persist()?;
        debug!("Added account {id}");
        Ok(id)
    }

    /// Remove the account with `id`, if any, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn remove(&mut self, id: &AccountId) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|a| &a.id != id);
        if self.items.len() == before {
            debug!("No account {id} to remove");
        }
        self.persist()
    }

    /// Apply `patch` to its account, derive, persist, and report whether
    /// the result is complete.
    ///
    /// Returns `Ok(None)` without touching storage if no account has the
    /// patch's ID. Otherwise returns `Ok(Some(verdict))` where the verdict
    /// is [`Account::is_complete`]; label validity does not affect it.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails. The updated record stays in
    /// memory.
    pub fn validate_and_save(&mut self, patch: AccountPatch) -> Result<Option<bool>> {
        let Some(idx) = self.items.iter().position(|a| a.id == patch.id) else {
            debug!("Ignoring update for unknown account {}", patch.id);
            return Ok(None);
        };

        let mut next = self.items[idx].clone();
        patch.apply_to(&mut next);
        let derived = derive(next);
        let complete = derived.is_complete();

        self.items[idx] = derived;
        self.persist()?;
        Ok(Some(complete))
    }

    /// Write the whole account list to storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn persist(&mut self) -> Result<()> {
        let snapshot = serde_json::to_string(&self.items)?;
        self.storage.set_item(&self.storage_key, &snapshot)?;
        debug!(
            "Persisted {} accounts to {}",
            self.items.len(),
            self.storage_key
        );
        Ok(())
    }
}

impl<S: std::fmt::Debug, G> std::fmt::Debug for AccountStore<S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("total", &self.items.len())
            .field("storage", &self.storage)
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}

/// Read and normalize the stored list, discarding it if it is unusable.
fn load<S: Storage>(storage: &S, key: &str) -> Vec<Account> {
    match read_snapshot(storage, key) {
        Ok(Some(accounts)) => accounts.into_iter().map(normalize_on_load).collect(),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Discarding unreadable account list in {key}: {e}");
            Vec::new()
        }
    }
}

fn read_snapshot<S: Storage>(storage: &S, key: &str) -> Result<Option<Vec<Account>>> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&raw)?))
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
    use crate::account::{AccountType, Label, SequentialIdGenerator};
    use crate::config::DEFAULT_STORAGE_KEY;
    use proptest::prelude::*;

    const KEY: &str = DEFAULT_STORAGE_KEY;

    fn store() -> AccountStore<MemoryStorage, SequentialIdGenerator> {
        AccountStore::with_id_generator(MemoryStorage::new(), KEY, SequentialIdGenerator::new("acc"))
    }

    fn stored_json(store: &AccountStore<MemoryStorage, SequentialIdGenerator>) -> String {
        store.storage().get_item(KEY).unwrap().unwrap()
    }

    mod derive_tests {
        use super::*;
        use proptest::prelude::*;

        #[test]
        fn ldap_drops_password() {
            let mut account = Account::blank(AccountId::new("a"));
            account.account_type = AccountType::Ldap;
            account.password = Some("secret".to_string());
            let derived = derive(account);
            assert!(derived.password.is_none());
            assert!(derived.valid.password);
        }

        #[test]
        fn labels_follow_raw_labels() {
            let mut account = Account::blank(AccountId::new("a"));
            account.raw_labels = "a; b ;".to_string();
            account.labels = vec![Label::new("stale")];
            let derived = derive(account);
            assert_eq!(derived.labels, vec![Label::new("a"), Label::new("b")]);
            assert!(derived.valid.raw_labels);
        }

        #[test]
        fn null_login_is_invalid() {
            let mut account = Account::blank(AccountId::new("a"));
            account.login = None;
            assert!(!derive(account).valid.login);
        }

        #[test]
        fn null_password_is_invalid_for_local() {
            let mut account = Account::blank(AccountId::new("a"));
            account.password = None;
            assert!(!derive(account).valid.password);
        }

        #[test]
        fn type_flag_is_always_true() {
            let mut account = Account::blank(AccountId::new("a"));
            account.valid.account_type = false;
            assert!(derive(account).valid.account_type);
        }

        fn account_strategy() -> impl Strategy<Value = Account> {
            let account_type = prop_oneof![Just(AccountType::Ldap), Just(AccountType::Local)];
            (
                ".{0,60}",
                account_type,
                proptest::option::of(".{0,110}"),
                proptest::option::of(".{0,110}"),
                any::<[bool; 4]>(),
            )
                .prop_map(|(raw_labels, account_type, login, password, flags)| Account {
                    id: AccountId::new("p"),
                    raw_labels,
                    labels: Vec::new(),
                    account_type,
                    login,
                    password,
                    valid: Validity {
                        raw_labels: flags[0],
                        account_type: flags[1],
                        login: flags[2],
                        password: flags[3],
                    },
                })
        }

        proptest! {
            #[test]
            fn derive_is_idempotent(account in account_strategy()) {
                let once = derive(account);
                let twice = derive(once.clone());
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn derived_labels_match_split(account in account_strategy()) {
                let derived = derive(account);
                let expected = split_labels(&derived.raw_labels);
                prop_assert_eq!(derived.labels, expected);
            }

            #[test]
            fn ldap_never_keeps_password(account in account_strategy()) {
                let derived = derive(account);
                if derived.account_type == AccountType::Ldap {
                    prop_assert!(derived.password.is_none());
                    prop_assert!(derived.valid.password);
                }
            }
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn add_empty_on_empty_store() {
            let mut store = store();
            assert!(!store.has_items());

            let id = store.add_empty().unwrap();

            assert_eq!(store.total(), 1);
            assert!(store.has_items());
            let account = store.get(&id).unwrap();
            assert_eq!(account.account_type, AccountType::Local);
            assert!(!account.valid.login);
            assert!(!account.valid.password);
            assert!(account.valid.raw_labels);
            assert!(account.valid.account_type);
            assert_eq!(account.login.as_deref(), Some(""));
            assert_eq!(account.password.as_deref(), Some(""));
        }

        #[test]
        fn add_empty_persists() {
            let mut store = store();
            store.add_empty().unwrap();
            let stored: Vec<Account> = serde_json::from_str(&stored_json(&store)).unwrap();
            assert_eq!(stored, store.items());
        }

        #[test]
        fn new_account_is_not_added() {
            let mut store = store();
            let account = store.new_account();
            assert_eq!(account.id.as_str(), "acc-1");
            assert_eq!(store.total(), 0);
        }

        #[test]
        fn remove_existing() {
            let mut store = store();
            let first = store.add_empty().unwrap();
            let second = store.add_empty().unwrap();

            store.remove(&first).unwrap();

            assert_eq!(store.total(), 1);
            assert_eq!(store.items()[0].id, second);
            assert!(!stored_json(&store).contains(first.as_str()));
        }

        #[test]
        fn remove_missing_is_noop() {
            let mut store = store();
            store.add_empty().unwrap();
            store.remove(&AccountId::new("missing-id")).unwrap();
            assert_eq!(store.total(), 1);
        }
    }

    mod validate_and_save_tests {
        use super::*;

        #[test]
        fn switch_to_ldap() {
            let mut store = store();
            let id = store.add_empty().unwrap();

            let result = store
                .validate_and_save(
                    AccountPatch::new(&id)
                        .with_type(AccountType::Ldap)
                        .with_login("bob")
                        .with_password("ignored"),
                )
                .unwrap();

            assert_eq!(result, Some(true));
            let account = store.get(&id).unwrap();
            assert!(account.password.is_none());
            assert!(account.valid.password);
            assert!(stored_json(&store).contains("\"password\":null"));
        }

        #[test]
        fn missing_id_returns_none() {
            let mut store = store();
            store.add_empty().unwrap();
            let before = store.items().to_vec();
            let snapshot = stored_json(&store);

            let result = store
                .validate_and_save(AccountPatch::new("missing").with_login("bob"))
                .unwrap();

            assert_eq!(result, None);
            assert_eq!(store.items(), before.as_slice());
            assert_eq!(stored_json(&store), snapshot);
        }

        #[test]
        fn local_needs_password() {
            let mut store = store();
            let id = store.add_empty().unwrap();

            let without = store
                .validate_and_save(AccountPatch::new(&id).with_login("alice"))
                .unwrap();
            assert_eq!(without, Some(false));

            let with = store
                .validate_and_save(AccountPatch::new(&id).with_password("hunter2"))
                .unwrap();
            assert_eq!(with, Some(true));
            assert_eq!(store.get(&id).unwrap().login.as_deref(), Some("alice"));
        }

        #[test]
        fn long_labels_do_not_block() {
            let mut store = store();
            let id = store.add_empty().unwrap();

            let result = store
                .validate_and_save(
                    AccountPatch::new(&id)
                        .with_raw_labels("x".repeat(60))
                        .with_login("alice")
                        .with_password("pw"),
                )
                .unwrap();

            assert_eq!(result, Some(true));
            assert!(!store.get(&id).unwrap().valid.raw_labels);
        }

        #[test]
        fn cleared_login_is_invalid() {
            let mut store = store();
            let id = store.add_empty().unwrap();
            store
                .validate_and_save(AccountPatch::new(&id).with_login("alice"))
                .unwrap();

            let result = store
                .validate_and_save(AccountPatch::new(&id).clear_login())
                .unwrap();

            assert_eq!(result, Some(false));
            let account = store.get(&id).unwrap();
            assert!(account.login.is_none());
            assert!(!account.valid.login);
        }

        #[test]
        fn keeps_position() {
            let mut store = store();
            let a = store.add_empty().unwrap();
            let b = store.add_empty().unwrap();
            let c = store.add_empty().unwrap();

            store
                .validate_and_save(AccountPatch::new(&b).with_raw_labels("mid"))
                .unwrap();

            let ids: Vec<_> = store.items().iter().map(|x| x.id.clone()).collect();
            assert_eq!(ids, vec![a, b, c]);
            assert_eq!(store.items()[1].labels, vec![Label::new("mid")]);
        }

        #[test]
        fn back_to_local_requires_new_password() {
            let mut store = store();
            let id = store.add_empty().unwrap();
            store
                .validate_and_save(
                    AccountPatch::new(&id)
                        .with_type(AccountType::Ldap)
                        .with_login("bob")
                        .with_password("pw"),
                )
                .unwrap();

            let result = store
                .validate_and_save(AccountPatch::new(&id).with_type(AccountType::Local))
                .unwrap();

            assert_eq!(result, Some(false));
            assert!(store.get(&id).unwrap().password.is_none());
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn round_trip() {
            let mut store = store();
            let a = store.add_empty().unwrap();
            let b = store.add_empty().unwrap();
            store
                .validate_and_save(
                    AccountPatch::new(&a)
                        .with_raw_labels("work; mail")
                        .with_login("alice")
                        .with_password("pw"),
                )
                .unwrap();
            store
                .validate_and_save(AccountPatch::new(&b).with_type(AccountType::Ldap))
                .unwrap();
            let items = store.items().to_vec();

            let reopened = AccountStore::open(store.into_storage(), KEY);

            assert_eq!(reopened.items(), items.as_slice());
        }

        #[test]
        fn in_memory_starts_empty() {
            let mut store = AccountStore::in_memory();
            assert!(!store.has_items());
            store.add_empty().unwrap();
            assert_eq!(store.storage().len(), 1);
        }

        #[test]
        fn empty_slot_gives_empty_store() {
            let store = AccountStore::open(MemoryStorage::new(), KEY);
            assert_eq!(store.total(), 0);
        }

        #[test]
        fn corrupt_json_is_discarded() {
            let store = AccountStore::open(MemoryStorage::with_item(KEY, "{not json"), KEY);
            assert_eq!(store.total(), 0);
        }

        #[test]
        fn wrong_shape_is_discarded() {
            for raw in ["null", "{}", "[1, 2]", "\"text\"", ""] {
                let store = AccountStore::open(MemoryStorage::with_item(KEY, raw), KEY);
                assert_eq!(store.total(), 0, "input {raw:?}");
            }
        }

        #[test]
        fn legacy_records_are_normalized() {
            let raw = r#"[
                {"id":"old-1","type":"Локальная","login":"alice","password":"pw"},
                {"id":"old-2","rawLabels":"a;b","labels":[],"type":"LDAP",
                 "login":null,"password":"leftover",
                 "valid":{"rawLabels":false,"type":false,"login":true,"password":false}}
            ]"#;
            let store = AccountStore::open(MemoryStorage::with_item(KEY, raw), KEY);

            assert_eq!(store.total(), 2);
            let first = &store.items()[0];
            assert_eq!(first.raw_labels, "");
            assert!(first.labels.is_empty());
            assert!(first.is_complete());

            let second = &store.items()[1];
            assert_eq!(second.labels, vec![Label::new("a"), Label::new("b")]);
            assert!(second.password.is_none());
            assert_eq!(
                second.valid,
                Validity {
                    raw_labels: true,
                    account_type: true,
                    login: false,
                    password: true,
                }
            );
        }

        #[test]
        fn unknown_type_is_kept_as_local() {
            let raw = r#"[
                {"id":"a","type":"LDAP","login":"bob","password":"x"},
                {"id":"b","type":"Other","login":"carol","password":"pw"}
            ]"#;
            let store = AccountStore::open(MemoryStorage::with_item(KEY, raw), KEY);

            assert_eq!(store.total(), 2);
            let other = store.get(&AccountId::new("b")).unwrap();
            assert_eq!(other.account_type, AccountType::Local);
            assert_eq!(other.password.as_deref(), Some("pw"));
            assert!(other.is_complete());
        }

        #[test]
        fn loading_does_not_write() {
            let raw = r#"[{"id":"x","type":"LDAP","login":"bob"}]"#;
            let store = AccountStore::open(MemoryStorage::with_item(KEY, raw), KEY);
            assert_eq!(store.storage().get_item(KEY).unwrap().as_deref(), Some(raw));
        }
    }

    mod file_store_tests {
        use super::*;

        #[test]
        fn open_with_config_persists_to_disk() {
            let dir = tempfile::tempdir().unwrap();
            let config = StoreConfig::default().with_data_dir(dir.path());

            let mut store = AccountStore::open_with_config(&config).unwrap();
            let id = store.add_empty().unwrap();
            store
                .validate_and_save(AccountPatch::new(&id).with_login("carol"))
                .unwrap();

            let reopened = AccountStore::open_with_config(&config).unwrap();
            assert_eq!(reopened.total(), 1);
            assert_eq!(reopened.get(&id).unwrap().login.as_deref(), Some("carol"));
            assert!(
                dir.path()
                    .join("accounts-book_list.json")
                    .exists()
            );
        }

        #[test]
        fn open_with_config_rejects_blank_key() {
            let config = StoreConfig::default().with_storage_key("");
            assert!(AccountStore::open_with_config(&config).is_err());
        }

        #[test]
        fn corrupt_file_is_discarded_then_overwritten() {
            let dir = tempfile::tempdir().unwrap();
            let config = StoreConfig::default().with_data_dir(dir.path());
            std::fs::write(dir.path().join("accounts-book_list.json"), "[{oops").unwrap();

            let mut store = AccountStore::open_with_config(&config).unwrap();
            assert_eq!(store.total(), 0);

            store.add_empty().unwrap();
            let reopened = AccountStore::open_with_config(&config).unwrap();
            assert_eq!(reopened.total(), 1);
        }
    }
}
