use crate::config::parser::parse_config_file;
use crate::config::types::{ClaimWithSource, LoadedConfig, MergedConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file names looked for in each directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["kiosk.toml", "config/kiosk.toml"];

/// Environment variable that, if truthy, skips the user config.
pub const NO_USER_CONFIG_ENV_VAR: &str = "KIOSK_NO_USER_CONFIG";

/// Environment variable naming the active environment.
pub const ENV_VAR: &str = "KIOSK_ENV";

/// Environment used when `KIOSK_ENV` is unset.
pub const DEFAULT_ENV: &str = "development";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `kiosk.toml`, then `config/kiosk.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check the user config (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let user_config = if is_env_truthy(NO_USER_CONFIG_ENV_VAR) {
		None
	} else {
		user_config_path()
	};

	discover_configs_with_user_config(start_dir, user_config.as_deref())
}

/// Discover configs from `start_dir` upward, ending with `user_config` if it
/// exists.
pub fn discover_configs_with_user_config(
	start_dir: &Path,
	user_config: Option<&Path>,
) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = Some(start_dir);

	'cascade: while let Some(dir) = current_dir {
		for name in CONFIG_FILE_NAMES {
			let config_path = dir.join(name);
			if !config_path.is_file() {
				continue;
			}

			let config = parse_config_file(&config_path)?;
			debug!(path = %config_path.display(), root = config.root, "config discovered");
			let root = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if root {
				break 'cascade;
			}
			break;
		}

		current_dir = dir.parent();
	}

	if let Some(path) = user_config
		&& path.is_file()
		&& !configs.iter().any(|loaded| loaded.path == path)
	{
		let config = parse_config_file(path)?;
		debug!(path = %path.display(), "user config discovered");
		configs.push(LoadedConfig {
			config,
			path: path.to_path_buf(),
		});
	}

	Ok(configs)
}

/// Check if an environment variable is set to a truthy value.
pub fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge multiple configs into a single effective config.
///
/// Each environment's origin comes from the first (most specific) config
/// defining it. Resources, claims and CDN rewrites are collected in cascade
/// order. The WordPress catalogue is enabled if any config enables it.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		for (env, origin) in &loaded.config.origins {
			merged
				.origins
				.entry(env.clone())
				.or_insert_with(|| origin.clone());
		}

		merged.resources.extend(loaded.config.resources.iter().cloned());

		for claim in &loaded.config.claims {
			merged.claims.push(ClaimWithSource {
				claim: claim.clone(),
				source: loaded.path.clone(),
			});
		}

		merged
			.cdn_rewrites
			.extend(loaded.config.cdn_rewrites.iter().cloned());

		if loaded.config.wordpress {
			merged.wordpress = true;
		}
	}

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file, if the platform has a config
/// directory.
pub fn user_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("kiosk").join("kiosk.toml"))
}

/// The active environment name, from `KIOSK_ENV`.
pub fn current_env() -> String {
	std::env::var(ENV_VAR)
		.ok()
		.filter(|env| !env.is_empty())
		.unwrap_or_else(|| DEFAULT_ENV.to_string())
}
