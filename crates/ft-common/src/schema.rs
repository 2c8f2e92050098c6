//! Schema version for JSON payloads.

/// Version stamped on every JSON document ft-core prints.
pub const SCHEMA_VERSION: &str = "1.0.0";
