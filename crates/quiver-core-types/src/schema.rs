//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_ARROW_ID: &str = "arrow_id";
pub const FIELD_MANUFACTURER: &str = "manufacturer";
pub const FIELD_MIGRATION_VERSION: &str = "migration_version";
pub const FIELD_ISSUE_ID: &str = "issue_id";
pub const FIELD_URL: &str = "url";

// Collection sizes
pub const FIELD_ARROWS_FOUND: &str = "arrows_found";
pub const FIELD_ISSUE_COUNT: &str = "issue_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
