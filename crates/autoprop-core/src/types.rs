use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Opaque identifier of one unit of pending work (a deploy waiting to be
/// included in a block).
///
/// Compared by value. Produced by the pending-work source; the scheduler only
/// reads and compares sets of these.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(pub String);

impl WorkItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WorkItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<Uuid> for WorkItemId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier returned by a successful block proposal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Vec<u8>);

impl BlockHash {
    /// Number of hex characters shown by the abbreviated `Display` form.
    const SHORT_HEX_LEN: usize = 10;

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl From<Uuid> for BlockHash {
    fn from(id: Uuid) -> Self {
        Self(id.as_bytes().to_vec())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        if hex.len() > Self::SHORT_HEX_LEN {
            write!(f, "{}...", &hex[..Self::SHORT_HEX_LEN])
        } else {
            f.write_str(&hex)
        }
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// The set of pending work observed at one instant.
///
/// Captured once per scheduler poll and discarded after the iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSnapshot {
    /// Clock reading (milliseconds) at which the set was read.
    pub observed_at_millis: i64,
    /// Identifiers of all work items pending at that time.
    pub items: HashSet<WorkItemId>,
}

impl PendingSnapshot {
    pub fn new(observed_at_millis: i64, items: HashSet<WorkItemId>) -> Self {
        Self {
            observed_at_millis,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_id_equality_by_value() {
        let a = WorkItemId::from("deploy-1");
        let b = WorkItemId::new(String::from("deploy-1"));
        assert_eq!(a, b);
        assert_ne!(a, WorkItemId::from("deploy-2"));
    }

    #[test]
    fn test_work_item_id_serializes_transparently() {
        let id = WorkItemId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_work_item_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = WorkItemId::from(uuid);
        assert_eq!(id.as_str(), uuid.to_string());
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_block_hash_display_is_abbreviated() {
        let hash = BlockHash(vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67]);
        assert_eq!(hash.to_hex(), "deadbeef01234567");
        assert_eq!(hash.to_string(), "deadbeef01...");
    }

    #[test]
    fn test_block_hash_display_short_hash_unchanged() {
        let hash = BlockHash(vec![0xab, 0xcd]);
        assert_eq!(hash.to_string(), "abcd");
    }

    #[test]
    fn test_pending_snapshot_len() {
        let items: HashSet<WorkItemId> = ["a", "b"].into_iter().map(WorkItemId::from).collect();
        let snapshot = PendingSnapshot::new(42, items);
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.is_empty());
        assert!(PendingSnapshot::new(0, HashSet::new()).is_empty());
    }
}
