//! Tag record database: flash layout, record codecs and bounded lookup.

pub mod database;
pub mod layout;
pub mod record;
pub mod search;

pub use database::{Lookup, OrderReport, RegionCounts, TagDatabase};
pub use record::{EntityType, MopRecord, RfidRecord, RoomRecord};
pub use search::SearchResult;
