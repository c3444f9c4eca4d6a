//! Subscription filter strings

use std::fmt;

/// Event type key
pub const TYPE_KEY: &str = "tm.event";
pub const TX_HASH_KEY: &str = "tx.hash";
pub const TX_HEIGHT_KEY: &str = "tx.height";
pub const ACTION_KEY: &str = "action";
pub const SENDER_KEY: &str = "sender";
pub const RECIPIENT_KEY: &str = "recipient";

pub const NEW_BLOCK_VALUE: &str = "NewBlock";
pub const NEW_BLOCK_HEADER_VALUE: &str = "NewBlockHeader";
pub const TX_VALUE: &str = "Tx";
pub const VALIDATOR_SET_UPDATES_VALUE: &str = "ValidatorSetUpdates";

/// Accumulates `key = 'value'` conditions joined with `AND`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventQueryBuilder {
    conditions: Vec<(String, String)>,
}

impl EventQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; an existing condition on `key` is replaced in place
    pub fn add_condition(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.conditions.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.conditions.push((key, value)),
        }
        self
    }

    pub fn tx_hash(self, hash: impl Into<String>) -> Self {
        self.add_condition(TX_HASH_KEY, hash.into())
    }

    pub fn tx_height(self, height: i64) -> Self {
        self.add_condition(TX_HEIGHT_KEY, height)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn build(&self) -> String {
        self.conditions
            .iter()
            .map(|(key, value)| format!("{key} = '{value}'"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl fmt::Display for EventQueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}
