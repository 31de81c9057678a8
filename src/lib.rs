//! Kiosk - claim-and-rewrite engine for mirroring CMS content into a host
//! application.
//!
//! This library provides the core functionality for kiosk, including:
//! - Path pattern matching of node URIs against the content origin
//! - Claiming document nodes for resource types, in priority order
//! - Rewriting claimed nodes (new link targets, local paths, CDN assets)
//! - Configuration file parsing and cascade discovery
//!
//! # Example
//!
//! ```no_run
//! use kiosk::Kiosk;
//! use kiosk::rewrites::Rewrite;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let mut kiosk = Kiosk::load(&cwd).unwrap();
//!
//! kiosk.rewriter_mut().add_rewrite(Rewrite::path("post", |post, _| {
//!     Ok(format!("/posts/{}", post.slug().unwrap_or_default()))
//! }));
//!
//! let html = kiosk.rewrite(r#"<a href="http://cms.example/2011/05/11/hello/">hi</a>"#).unwrap();
//! println!("{}", html);
//! ```

pub mod claims;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod origin;
pub mod resource;
pub mod rewriter;
pub mod rewrites;
pub mod teaser;
pub mod uri;
pub mod wordpress;

pub use context::Kiosk;
pub use error::{KioskError, Result, TransformError};
pub use rewriter::Rewriter;
