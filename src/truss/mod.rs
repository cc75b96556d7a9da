//! Truss detail page: resolves a truss id, fetches its exported JSON record
//! and renders it as a view with a status badge.
pub mod detail;
pub mod payload;
pub mod record;
pub mod source;

pub use detail::{BadgeKind, StatusBadge, TrussDetailView};
pub use payload::truss_id_from_payload;
pub use record::TrussRecord;
pub use source::{HttpTrussSource, StaticDirSource, TrussSource};
