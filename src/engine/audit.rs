//! Audit trail seam.
//!
//! Every run transition and payslip-affecting operation emits one
//! [`AuditEntry`] through the [`AuditSink`] the engine was built with. The
//! in-memory sink is the default wiring; a persistent sink slots in behind
//! the same trait.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

/// One recorded audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    /// Logical table the event belongs to (e.g., "payroll_runs").
    pub table: String,
    /// Identifier of the affected record.
    pub record_id: String,
    /// Action name (e.g., "create", "calculate", "close").
    pub action: String,
    /// The actor the operation ran as.
    pub actor_id: String,
    /// Optional free-text reason supplied by the caller.
    pub reason: Option<String>,
    /// Structured change payload.
    pub changes: Value,
    /// When the event was recorded.
    pub at: DateTime<Utc>,
}

/// Receives audit entries from the engine.
pub trait AuditSink: Send + Sync {
    /// Records one entry. Implementations must not fail the calling
    /// operation; auditing is fire-and-forget from the engine's side.
    fn record(&self, entry: AuditEntry);
}

/// In-memory audit sink used by tests and the default engine wiring.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All entries recorded so far, in order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.guard().clone()
    }

    /// Number of entries recorded for an action.
    pub fn count_for(&self, action: &str) -> usize {
        self.guard().iter().filter(|e| e.action == action).count()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.guard().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(action: &str) -> AuditEntry {
        AuditEntry {
            table: "payroll_runs".to_string(),
            record_id: "a2e3e4d1".to_string(),
            action: action.to_string(),
            actor_id: "system".to_string(),
            reason: None,
            changes: json!({"status": "paid"}),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_entries_record_in_order() {
        let sink = MemoryAuditSink::new();
        sink.record(entry("create"));
        sink.record(entry("validate"));
        sink.record(entry("close"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, "create");
        assert_eq!(entries[2].action, "close");
    }

    #[test]
    fn test_count_for_filters_by_action() {
        let sink = MemoryAuditSink::new();
        sink.record(entry("calculate"));
        sink.record(entry("calculate"));
        sink.record(entry("close"));
        assert_eq!(sink.count_for("calculate"), 2);
        assert_eq!(sink.count_for("close"), 1);
        assert_eq!(sink.count_for("reopen"), 0);
    }
}
