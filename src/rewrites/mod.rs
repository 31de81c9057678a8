//! Rewrites for kiosk.
//!
//! This module handles:
//! - Host-defined node, path and CDN rewrites keyed by resource type
//! - Dispatching every matching rewrite to a freshly claimed node

pub mod rewrite;

pub use rewrite::{NodeTransform, PathTransform, Rewrite, RewriteKind, TransformResult, dispatch};
