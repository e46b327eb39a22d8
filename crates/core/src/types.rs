/// SMART attributes are addressed by their numeric ID (e.g. 5 = Reallocated_Sector_Ct).
pub type AttributeId = u32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
