//! Greedy packing of cargo boxes into a truck's cargo bay.
//!
//! Items are placed largest first at the lowest free anchor point that keeps
//! them inside the bay and clear of everything placed before.

pub mod anchors;
pub mod api;
pub mod config;
pub mod geometry;
pub mod intake;
pub mod layout;
pub mod model;
pub mod optimizer;
pub mod store;
pub mod types;
