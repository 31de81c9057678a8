//! The application context tying configuration, origin and rewriter together.

use crate::claims::ClaimKind;
use crate::config::{MergedConfig, current_env, load_merged_config};
use crate::error::{KioskError, Result};
use crate::origin::Origin;
use crate::resource::ResourceTypes;
use crate::rewriter::Rewriter;
use crate::rewrites::Rewrite;
use crate::wordpress;
use std::path::Path;
use tracing::debug;

/// Environment whose origin applies when the active one has none.
pub const DEFAULT_ORIGIN: &str = "default";

/// A configured kiosk: the active environment's origin, the known resource
/// types, and a rewriter holding the configured claims and rewrites.
///
/// Host applications add their own rewrites through [`Kiosk::rewriter_mut`].
#[derive(Debug)]
pub struct Kiosk {
	env: String,
	resource_types: ResourceTypes,
	rewriter: Rewriter,
}

impl Kiosk {
	/// Build a kiosk for `env` from merged configuration.
	pub fn from_config(config: &MergedConfig, env: &str) -> Result<Self> {
		let origin = Self::origin_for(config, env)?;

		let mut resource_types = ResourceTypes::new();
		if config.wordpress {
			wordpress::register_types(&mut resource_types);
		}
		for resource in &config.resources {
			resource_types.define(&resource.name, &resource.supertypes)?;
		}

		let mut rewriter = Rewriter::new(origin);
		if config.wordpress {
			wordpress::register_claims(&mut rewriter)?;
		}

		for loaded in &config.claims {
			let resource_type = resource_types.get(&loaded.claim.resource)?;
			rewriter.register_claim(ClaimKind::Path, resource_type, loaded.claim.options(), None)?;
			debug!(source = %loaded.source.display(), resource = %resource_type, "configured claim");
		}

		for cdn_rewrite in &config.cdn_rewrites {
			let resource_type = resource_types.get(&cdn_rewrite.resource)?;
			rewriter.add_rewrite(Rewrite::cdn(resource_type.name()));
		}

		debug!(
			env,
			site = %rewriter.origin().site(),
			resource_types = resource_types.len(),
			"kiosk configured"
		);

		Ok(Kiosk {
			env: env.to_string(),
			resource_types,
			rewriter,
		})
	}

	/// Discover configuration from `start_dir` upward and build a kiosk for
	/// the environment named by `KIOSK_ENV`.
	pub fn load(start_dir: &Path) -> Result<Self> {
		let config = load_merged_config(start_dir)?;
		Self::from_config(&config, &current_env())
	}

	/// The origin for `env`, falling back to the `default` origin.
	pub fn origin_for(config: &MergedConfig, env: &str) -> Result<Origin> {
		let origin = config
			.origins
			.get(env)
			.or_else(|| config.origins.get(DEFAULT_ORIGIN))
			.ok_or_else(|| KioskError::NoOrigin {
				env: env.to_string(),
			})?;

		Origin::new(origin)
	}

	pub fn env(&self) -> &str {
		&self.env
	}

	pub fn origin(&self) -> &Origin {
		self.rewriter.origin()
	}

	pub fn resource_types(&self) -> &ResourceTypes {
		&self.resource_types
	}

	pub fn rewriter(&self) -> &Rewriter {
		&self.rewriter
	}

	pub fn rewriter_mut(&mut self) -> &mut Rewriter {
		&mut self.rewriter
	}

	/// Rewrite content with the configured claims and rewrites.
	pub fn rewrite(&self, content: &str) -> Result<String> {
		self.rewriter.rewrite(content)
	}
}
