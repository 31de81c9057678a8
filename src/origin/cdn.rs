use crate::document::NodeMut;
use crate::error::{KioskError, Result};
use tracing::debug;
use url::{ParseError, Position, Url};

/// Where asset URIs are redirected.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CdnTarget {
	/// A bare host name; only the host of a URI is replaced.
	Host(String),

	/// A URI whose scheme, host and path prefix are applied. A missing scheme
	/// means a protocol-relative target (`//cdn.example`).
	Uri {
		scheme: Option<String>,
		host: String,
		port: Option<u16>,
		path: String,
	},
}

/// A content delivery network for origin assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cdn {
	target: Option<CdnTarget>,
}

impl Cdn {
	/// Parse the configured CDN host. `None` or an empty host leaves the CDN
	/// unconfigured.
	pub fn new(host: Option<&str>) -> Result<Self> {
		let host = match host.map(str::trim) {
			Some(host) if !host.is_empty() => host,
			_ => return Ok(Cdn::default()),
		};

		let invalid = |source| KioskError::InvalidUri {
			uri: host.to_string(),
			source,
		};

		let target = if let Some(rest) = host.strip_prefix("//") {
			let url = Url::parse(&format!("http://{}", rest)).map_err(invalid)?;
			CdnTarget::Uri {
				scheme: None,
				host: url.host_str().unwrap_or_default().to_string(),
				port: url.port(),
				path: url.path().to_string(),
			}
		} else if host.contains("://") {
			let url = Url::parse(host).map_err(invalid)?;
			let Some(name) = url.host_str() else {
				return Err(invalid(url::ParseError::EmptyHost));
			};
			CdnTarget::Uri {
				scheme: Some(url.scheme().to_string()),
				host: name.to_string(),
				port: url.port(),
				path: url.path().to_string(),
			}
		} else {
			CdnTarget::Host(host.to_string())
		};

		Ok(Cdn {
			target: Some(target),
		})
	}

	pub fn is_configured(&self) -> bool {
		self.target.is_some()
	}

	/// Redirect a URI to the CDN.
	///
	/// Returns the URI unchanged when no CDN is configured, and `None` when the
	/// rewritten URI cannot be expressed (for example a `mailto:` URI has no
	/// host to replace).
	pub fn rewrite_uri(&self, uri: &Url) -> Option<String> {
		let Some(target) = &self.target else {
			return Some(uri.to_string());
		};

		let url = target.redirect(uri)?;
		match target {
			CdnTarget::Uri { scheme: None, .. } => Some(authority_relative(&url)),
			_ => Some(url.into()),
		}
	}

	/// Redirect a relative reference (`/files/a.png`, `//host/a.png`,
	/// `a.png`), resolved against `site`.
	///
	/// The reference names no scheme, so the result is protocol-relative
	/// unless the CDN target names one.
	pub fn rewrite_reference(&self, reference: &str, site: &Url) -> Option<String> {
		let Some(target) = &self.target else {
			return Some(reference.to_string());
		};

		let uri = site.join(reference).ok()?;
		let url = target.redirect(&uri)?;
		match target {
			CdnTarget::Uri {
				scheme: Some(_), ..
			} => Some(url.into()),
			_ => Some(authority_relative(&url)),
		}
	}

	/// Redirect the node's link/asset attribute to the CDN.
	///
	/// Relative references are resolved against `site`; malformed URIs are
	/// left alone. Returns whether the node was changed.
	pub fn rewrite_node(&self, node: &mut NodeMut<'_>, site: &Url) -> bool {
		if !self.is_configured() {
			return false;
		}

		let Some((attr, value)) = node.uri_attribute() else {
			return false;
		};

		let rewritten = match Url::parse(&value) {
			Ok(uri) => self.rewrite_uri(&uri),
			Err(ParseError::RelativeUrlWithoutBase) => self.rewrite_reference(&value, site),
			Err(error) => {
				debug!(uri = %value, %error, "skipping CDN rewrite of unparseable URI");
				None
			}
		};

		match rewritten {
			Some(rewritten) => node.set_attr(attr, &rewritten),
			None => false,
		}
	}
}

impl CdnTarget {
	/// Apply the target's scheme, host, port and path prefix to `uri`.
	fn redirect(&self, uri: &Url) -> Option<Url> {
		let mut url = uri.clone();
		match self {
			CdnTarget::Host(host) => {
				url.set_host(Some(host.as_str())).ok()?;
			}
			CdnTarget::Uri {
				scheme,
				host,
				port,
				path,
			} => {
				if let Some(scheme) = scheme {
					url.set_scheme(scheme).ok()?;
				}
				url.set_host(Some(host.as_str())).ok()?;
				if port.is_some() {
					url.set_port(*port).ok()?;
				}
				if !path.is_empty() && path != "/" {
					let prefix = path.strip_suffix('/').unwrap_or(path);
					let joined = format!("{}{}", prefix, url.path());
					url.set_path(&joined);
				}
			}
		}
		Some(url)
	}
}

/// `url` without its scheme: `//host/path?query#fragment`.
fn authority_relative(url: &Url) -> String {
	format!("//{}", &url[Position::BeforeUsername..])
}
