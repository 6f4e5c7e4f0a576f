//! Account identifier generation.

use uuid::Uuid;

use super::AccountId;

/// Source of fresh account identifiers.
pub trait IdGenerator {
    /// Produce an identifier not returned before.
    fn next_id(&mut self) -> AccountId;
}

/// Random v4 UUID identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> AccountId {
        AccountId::new(Uuid::new_v4().to_string())
    }
}

/// Deterministic identifiers (`{prefix}-1`, `{prefix}-2`, ...).
///
/// Useful for reproducible fixtures.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    /// Create a generator whose first ID is `{prefix}-1`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> AccountId {
        let id = AccountId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        let mut generator = UuidGenerator;
        let a = generator.next_id();
        let b = generator.next_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn sequential_ids() {
        let mut generator = SequentialIdGenerator::new("acc");
        assert_eq!(generator.next_id().as_str(), "acc-1");
        assert_eq!(generator.next_id().as_str(), "acc-2");
    }
}
