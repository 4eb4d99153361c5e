//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a ledger record.
pub type RecordId = DatabaseId;

/// Database identifier for a category.
pub type CategoryId = DatabaseId;
