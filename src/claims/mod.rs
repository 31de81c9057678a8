//! Claims for kiosk.
//!
//! This module handles:
//! - Declaring which document nodes belong to which resource types
//! - Staking claims over a document in priority order
//! - Tracking the resource claimed for each node

pub mod claim;
pub mod claimed;
pub mod priority;

pub use claim::{Claim, ClaimKind, ClaimOptions, Matcher};
pub use claimed::ClaimedDocument;
pub use priority::Priority;
