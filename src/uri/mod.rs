//! URI matching for kiosk.
//!
//! This module handles:
//! - Compiling path templates (`post/:id`, `!year/:slug`) into matchers
//! - Resolving node URIs relative to the content origin's site

pub mod pattern;
pub mod resource_uri;

pub use pattern::{DEFAULT_TOKEN_PATTERN, PathPattern};
pub use resource_uri::{ResourceUri, Route};
