//! Broadcast outcomes
//!
//! Commit mode observes both the admission and the execution phase; sync
//! and async only observe admission.

use crate::events::Tag;
use serde::{Deserialize, Serialize};

/// Outcome of one node-side phase (check or deliver)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPhaseResult {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tags: Vec<Tag>,
    pub codespace: String,
}

impl TxPhaseResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Response of a commit-mode broadcast
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBroadcastTxCommit {
    pub check_tx: TxPhaseResult,
    pub deliver_tx: TxPhaseResult,
    pub hash: String,
    pub height: i64,
}

impl ResultBroadcastTxCommit {
    pub fn is_success(&self) -> bool {
        self.check_tx.is_ok() && self.deliver_tx.is_ok()
    }
}

/// Response of a sync or async broadcast
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBroadcastTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub hash: String,
}

/// Outcome of a broadcast, tagged by mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastResult {
    Commit(ResultBroadcastTxCommit),
    Sync(ResultBroadcastTx),
    Async(ResultBroadcastTx),
}

impl BroadcastResult {
    pub fn is_success(&self) -> bool {
        match self {
            BroadcastResult::Commit(r) => r.is_success(),
            BroadcastResult::Sync(r) | BroadcastResult::Async(r) => r.code == 0,
        }
    }

    pub fn hash(&self) -> &str {
        match self {
            BroadcastResult::Commit(r) => &r.hash,
            BroadcastResult::Sync(r) | BroadcastResult::Async(r) => &r.hash,
        }
    }

    /// Log of the first failing phase, or `"success"`
    pub fn log(&self) -> &str {
        match self {
            BroadcastResult::Commit(r) if !r.check_tx.is_ok() => &r.check_tx.log,
            BroadcastResult::Commit(r) if !r.deliver_tx.is_ok() => &r.deliver_tx.log,
            BroadcastResult::Sync(r) | BroadcastResult::Async(r) if r.code != 0 => &r.log,
            _ => "success",
        }
    }

    /// Inclusion height; zero when the mode does not wait for a block
    pub fn height(&self) -> i64 {
        match self {
            BroadcastResult::Commit(r) => r.height,
            _ => 0,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            BroadcastResult::Commit(r) if !r.check_tx.is_ok() => r.check_tx.code,
            BroadcastResult::Commit(r) => r.deliver_tx.code,
            BroadcastResult::Sync(r) | BroadcastResult::Async(r) => r.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(check: u32, deliver: u32) -> BroadcastResult {
        BroadcastResult::Commit(ResultBroadcastTxCommit {
            check_tx: TxPhaseResult {
                code: check,
                log: "check log".into(),
                ..Default::default()
            },
            deliver_tx: TxPhaseResult {
                code: deliver,
                log: "deliver log".into(),
                ..Default::default()
            },
            hash: "ABCD".into(),
            height: 42,
        })
    }

    #[test]
    fn test_commit_accessors() {
        let ok = commit(0, 0);
        assert!(ok.is_success());
        assert_eq!(ok.log(), "success");
        assert_eq!(ok.height(), 42);
        assert_eq!(ok.hash(), "ABCD");

        let reverted = commit(0, 5);
        assert!(!reverted.is_success());
        assert_eq!(reverted.log(), "deliver log");
        assert_eq!(reverted.code(), 5);

        let rejected = commit(4, 0);
        assert_eq!(rejected.log(), "check log");
        assert_eq!(rejected.code(), 4);
    }

    #[test]
    fn test_async_accessors() {
        let result = BroadcastResult::Async(ResultBroadcastTx {
            code: 0,
            hash: "FF".into(),
            ..Default::default()
        });
        assert!(result.is_success());
        assert_eq!(result.height(), 0);
        assert_eq!(result.log(), "success");

        let failed = BroadcastResult::Sync(ResultBroadcastTx {
            code: 3,
            log: "bad".into(),
            ..Default::default()
        });
        assert!(!failed.is_success());
        assert_eq!(failed.log(), "bad");
    }
}
