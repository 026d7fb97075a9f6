//! Data structures for unit rosters.
//!
//! Pure data types deserialized from RON. The [`BuildTree`](crate::registry::BuildTree)
//! resolves string references between them into numeric IDs.

mod faction_data;
mod unit_data;

pub use faction_data::FactionData;
pub use unit_data::UnitData;
