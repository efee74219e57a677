//! Analysis engines.
//!
//! - [`stats`] - robust statistics shared by both engines
//! - [`tempo`] - response-time thresholds and fast/normal/slow labels
//! - [`phase`] - tactical phase segmentation

pub mod phase;
pub mod stats;
pub mod tempo;
