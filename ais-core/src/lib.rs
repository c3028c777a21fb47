//! ais-core: Pure decode + tracking library for AIS position reports.
//!
//! No async, no sockets — just algorithms. `ais-feeder` supplies the bytes
//! and consumes the `TrackEvent`s.

pub mod armor;
pub mod config;
pub mod coords;
pub mod decode;
pub mod layout;
pub mod tracker;
pub mod types;

// Re-export commonly used types at crate root
pub use armor::BitBuffer;
pub use decode::{decode, VesselFactory};
pub use layout::{FieldLayoutTable, FieldSpec};
pub use tracker::{TrackEvent, TrackedVessel, Tracker, VesselObserver};
pub use types::*;
