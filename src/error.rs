use std::path::PathBuf;

/// Library-level structured errors for kiosk.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// Host applications wrap these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("No origin configured for the `{env}' or default environment")]
	NoOrigin { env: String },

	#[error("Invalid origin site: {site}")]
	InvalidSite {
		site: String,
		#[source]
		source: url::ParseError,
	},

	#[error("Invalid priority: {value}")]
	InvalidPriority { value: String },

	#[error("No selector given for {resource} claim")]
	MissingSelector { resource: String },

	#[error("Invalid CSS selector: {selector} ({message})")]
	InvalidSelector { selector: String, message: String },

	#[error("No matcher given for {resource} node claim")]
	MissingMatcher { resource: String },

	#[error("No path pattern given for {resource} path claim")]
	MissingPattern { resource: String },

	#[error("Invalid path pattern: {pattern}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Unknown resource type: {name}")]
	UnknownResourceType { name: String },

	#[error("Invalid URI: {uri}")]
	InvalidUri {
		uri: String,
		#[source]
		source: url::ParseError,
	},

	#[error("Rewrite for {resource} failed")]
	Transform {
		resource: String,
		#[source]
		source: anyhow::Error,
	},
}

/// Failure reported by a caller-supplied rewrite transform.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
	/// The resource has no route in the host application. Path rewrites leave
	/// the node untouched when they see this.
	#[error("No route for {0}")]
	Routing(String),

	#[error(transparent)]
	Failed(#[from] anyhow::Error),
}

/// Result type alias using KioskError.
pub type Result<T> = std::result::Result<T, KioskError>;
