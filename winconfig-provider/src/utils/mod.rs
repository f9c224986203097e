//! Utility modules.

/// Date/time serialization helpers shared by the data model.
pub mod datetime;
