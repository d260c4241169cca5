//! Tiered access control for streamed content.
//!
//! Content folders encode their own access tier in the path ("GOLD HITS/",
//! "premium/..."), and a user's purchased plan decides which tiers they can
//! stream. The gate issues signed stream URLs once a request clears the
//! tier check.

mod gate;
mod tier;

pub use gate::{EntitlementGate, GateError};
pub use tier::{parent_folder, Tier};
