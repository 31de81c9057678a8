use crate::document::Node;
use crate::error::{KioskError, Result};
use crate::origin::Origin;
use crate::resource::Attributes;
use crate::uri::PathPattern;
use tracing::trace;
use url::Url;

/// A URI found in document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri(Url);

/// A URI expressed relative to a base URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	/// A path within the base's directory, without a leading `/`.
	Relative(String),

	/// The URI lies outside the base; kept absolute.
	Absolute(Url),
}

impl ResourceUri {
	/// Parse an absolute URI.
	pub fn parse(uri: &str) -> Result<Self> {
		Url::parse(uri)
			.map(ResourceUri)
			.map_err(|source| KioskError::InvalidUri {
				uri: uri.to_string(),
				source,
			})
	}

	/// The URI in a node's `href` or, failing that, `src` attribute.
	pub fn of_node(node: &Node<'_>) -> Result<Self> {
		let value = node.uri_attribute().map(|(_, value)| value).unwrap_or_default();
		Self::parse(&value)
	}

	pub fn url(&self) -> &Url {
		&self.0
	}

	/// Express this URI relative to `base`.
	///
	/// A scheme difference between `http` and `https` on the same host is
	/// ignored. Routes that would climb out of the base directory (`../`) are
	/// resolved against the base and returned as absolute.
	pub fn route_from(&self, base: &Url) -> Route {
		let mut candidate = self.0.clone();

		let mixed_scheme = matches!(
			(candidate.scheme(), base.scheme()),
			("http", "https") | ("https", "http")
		);
		if mixed_scheme
			&& candidate.host_str() == base.host_str()
			&& candidate.set_scheme(base.scheme()).is_ok()
		{
			candidate.set_port(base.port()).ok();
		}

		let same_authority = candidate.scheme() == base.scheme()
			&& candidate.host_str() == base.host_str()
			&& candidate.port_or_known_default() == base.port_or_known_default()
			&& candidate.username() == base.username()
			&& candidate.password() == base.password();

		if !same_authority || candidate.cannot_be_a_base() {
			return Route::Absolute(candidate);
		}

		let route = relative_path(base.path(), candidate.path());
		if route.contains("../") {
			return Route::Absolute(base.join(&route).unwrap_or(candidate));
		}

		Route::Relative(route)
	}

	/// Match the part of this URI's path below the origin site against
	/// `pattern`. URIs outside the site never match.
	pub fn match_pattern(&self, origin: &Origin, pattern: &PathPattern) -> Option<Attributes> {
		match self.route_from(origin.site()) {
			Route::Relative(path) => pattern.captures(&path),
			Route::Absolute(url) => {
				trace!(uri = %url, "URI is outside the origin site");
				None
			}
		}
	}
}

impl Node<'_> {
	/// The node's link/asset URI.
	pub fn resource_uri(&self) -> Result<ResourceUri> {
		ResourceUri::of_node(self)
	}

	/// Match the node's link/asset URI against `pattern`. Missing or malformed
	/// URIs simply do not match.
	pub fn match_uri(&self, origin: &Origin, pattern: &PathPattern) -> Option<Attributes> {
		self.resource_uri().ok()?.match_pattern(origin, pattern)
	}
}

/// The path of `target` relative to the directory of `base`, climbing with
/// `../` where the two diverge.
fn relative_path(base: &str, target: &str) -> String {
	let base_dir = &base[..base.rfind('/').map_or(0, |i| i + 1)];
	let (target_dir, target_file) = target.split_at(target.rfind('/').map_or(0, |i| i + 1));

	let base_segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
	let target_segments: Vec<&str> = target_dir.split('/').filter(|s| !s.is_empty()).collect();

	let common = base_segments
		.iter()
		.zip(&target_segments)
		.take_while(|(a, b)| a == b)
		.count();

	let mut route = "../".repeat(base_segments.len() - common);
	for segment in &target_segments[common..] {
		route.push_str(segment);
		route.push('/');
	}
	route.push_str(target_file);
	route
}
