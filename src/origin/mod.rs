//! The content origin: the CMS site whose content kiosk rewrites.
//!
//! This module handles:
//! - Normalizing the configured site URI
//! - The CDN target assets are redirected to

pub mod cdn;

pub use cdn::Cdn;

use crate::config::OriginConfig;
use crate::error::{KioskError, Result};
use url::Url;

/// A configured content origin.
#[derive(Debug, Clone)]
pub struct Origin {
	site: Url,
	default_locale: Option<String>,
	cdn: Cdn,
}

impl Origin {
	/// Build an origin from its configuration.
	///
	/// The site always ends in exactly one `/`, so routes are computed relative
	/// to the site directory.
	pub fn new(config: &OriginConfig) -> Result<Self> {
		let site = format!("{}/", config.site.trim_end_matches('/'));
		let site = Url::parse(&site).map_err(|source| KioskError::InvalidSite { site, source })?;

		Ok(Origin {
			site,
			default_locale: config.default_locale.clone(),
			cdn: Cdn::new(config.cdn.host.as_deref())?,
		})
	}

	/// An origin with no CDN and no default locale.
	pub fn from_site(site: &str) -> Result<Self> {
		Self::new(&OriginConfig {
			site: site.to_string(),
			..Default::default()
		})
	}

	pub fn site(&self) -> &Url {
		&self.site
	}

	pub fn default_locale(&self) -> Option<&str> {
		self.default_locale.as_deref()
	}

	pub fn cdn(&self) -> &Cdn {
		&self.cdn
	}
}
