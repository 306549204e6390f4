//! Structured logging field names shared by every notekeep crate.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (lost creation race, store unavailable) |
//! | INFO  | Lifecycle events (startup, shutdown), note creation/deletion |
//! | DEBUG | Reconciliation outcomes, resolver decisions |
//! | TRACE | Per-tag iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID of the HTTP request (UUIDv7).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "tags"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "tag_resolver", "tag_reconciler", "note_service"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "reconcile", "create", "update"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Tag id being operated on.
pub const TAG_ID: &str = "tag_id";

/// Normalized tag name.
pub const TAG_NAME: &str = "tag_name";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Associations inserted by a reconciliation.
pub const ADDED: &str = "added";

/// Associations deleted by a reconciliation.
pub const REMOVED: &str = "removed";

/// Associations left untouched by a reconciliation.
pub const RETAINED: &str = "retained";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_unique_snake_case() {
        let fields = [
            REQUEST_ID,
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            NOTE_ID,
            TAG_ID,
            TAG_NAME,
            DURATION_MS,
            RESULT_COUNT,
            ADDED,
            REMOVED,
            RETAINED,
            POOL_SIZE,
            POOL_IDLE,
            SUCCESS,
            ERROR_MSG,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
        for field in fields {
            assert!(
                field.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "{} is not snake_case",
                field
            );
        }
    }
}
