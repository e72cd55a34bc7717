//! Database schema definitions
//!
//! Constants for table and column names shared by the SQLite store and the
//! hosted store's query strings.

/// Tickets table schema
pub mod tickets {
    /// Table name
    pub const TABLE: &str = "tickets";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning organization column
    pub const ORG_ID: &str = "org_id";
    /// Latest reply text column
    pub const LAST_MESSAGE: &str = "last_message";
    /// Urgency label column (1 or 3)
    pub const URGENCY: &str = "urgency";
    /// Importance label column (1 or 2)
    pub const IMPORTANCE: &str = "importance";
    /// Sentiment label column
    pub const SENTIMENT: &str = "sentiment";
    /// Last write timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}
