use crate::claims::{ClaimOptions, Priority};
use crate::error::KioskError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Top-level configuration from a `kiosk.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop the directory cascade here and only add the user config.
	#[serde(default)]
	pub root: bool,

	/// If true, register the built-in WordPress resource types and claims.
	#[serde(default)]
	pub wordpress: bool,

	/// Content origins keyed by environment name. `default` applies to any
	/// environment without its own entry.
	#[serde(default)]
	pub origins: BTreeMap<String, OriginConfig>,

	/// Additional resource types.
	#[serde(default)]
	pub resources: Vec<ResourceConfig>,

	/// Path claims, in registration order.
	#[serde(default)]
	pub claims: Vec<ClaimConfig>,

	/// Resource types whose assets are served from the origin's CDN.
	#[serde(default)]
	pub cdn_rewrites: Vec<CdnRewriteConfig>,
}

/// Where content for one environment comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OriginConfig {
	/// Base URI of the CMS site.
	pub site: String,

	/// Locale assumed for content without one.
	#[serde(default)]
	pub default_locale: Option<String>,

	#[serde(default)]
	pub cdn: CdnConfig,
}

/// CDN settings of an origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CdnConfig {
	/// A bare host (`cdn.example`), a URI (`https://cdn.example/prefix/`) or
	/// a protocol-relative URI (`//cdn.example`).
	#[serde(default)]
	pub host: Option<String>,
}

/// A resource type declared in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
	pub name: String,

	/// Types this one is substitutable for. Each must already be defined.
	#[serde(default)]
	pub supertypes: Vec<String>,
}

/// A path claim declared in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimConfig {
	/// Name of the claimed resource type.
	pub resource: String,

	/// CSS selector for candidate nodes.
	pub selector: Option<String>,

	/// Path template, e.g. `galleries/:slug`.
	pub pattern: Option<String>,

	/// `"high"`, `"normal"`, `"low"` or an integer.
	#[serde(default)]
	pub priority: Priority,

	/// Override patterns for template tokens.
	#[serde(default)]
	pub shims: HashMap<String, String>,
}

/// A CDN rewrite declared in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CdnRewriteConfig {
	/// Name of the resource type to rewrite.
	pub resource: String,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Whether any config in the cascade enables the WordPress catalogue.
	pub wordpress: bool,

	/// Origins per environment, each from the most specific config defining it.
	pub origins: BTreeMap<String, OriginConfig>,

	/// Resource types from all configs, in cascade order.
	pub resources: Vec<ResourceConfig>,

	/// Claims from all configs, in cascade order.
	pub claims: Vec<ClaimWithSource>,

	/// CDN rewrites from all configs, in cascade order.
	pub cdn_rewrites: Vec<CdnRewriteConfig>,
}

/// A claim with its source config path for debugging/display.
#[derive(Debug, Clone)]
pub struct ClaimWithSource {
	/// The claim itself.
	pub claim: ClaimConfig,

	/// The config file this claim came from.
	pub source: PathBuf,
}

impl ClaimConfig {
	/// Validate that the claim can be built.
	pub fn validate(&self) -> Result<(), KioskError> {
		if self.selector.is_none() {
			return Err(KioskError::MissingSelector {
				resource: self.resource.clone(),
			});
		}
		if self.pattern.is_none() {
			return Err(KioskError::MissingPattern {
				resource: self.resource.clone(),
			});
		}
		Ok(())
	}

	/// Options for building the claim.
	pub fn options(&self) -> ClaimOptions {
		ClaimOptions {
			selector: self.selector.clone(),
			priority: self.priority,
			pattern: self.pattern.clone(),
			shims: self.shims.clone(),
		}
	}
}

impl Config {
	/// Validate all claims in this config.
	pub fn validate(&self) -> Result<(), KioskError> {
		for claim in &self.claims {
			claim.validate()?;
		}
		Ok(())
	}
}
