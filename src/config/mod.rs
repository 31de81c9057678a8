//! Configuration loading and parsing for kiosk.
//!
//! This module handles:
//! - TOML config file parsing
//! - Directory cascade discovery
//! - Config merging
//! - Selecting the active environment

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	current_env, discover_configs, discover_configs_with_user_config, load_merged_config,
	merge_configs, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{
	CdnConfig, CdnRewriteConfig, ClaimConfig, ClaimWithSource, Config, LoadedConfig, MergedConfig,
	OriginConfig, ResourceConfig,
};
