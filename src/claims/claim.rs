use crate::claims::{ClaimedDocument, Priority};
use crate::document::{Node, NodeId, Selectors};
use crate::error::{KioskError, Result};
use crate::origin::Origin;
use crate::resource::{Attributes, Resource, ResourceType};
use crate::uri::PathPattern;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

/// Extracts identifying attributes from a candidate node, or `None` when the
/// node does not belong to the claim's resource type.
pub type Matcher = Box<dyn Fn(&Node<'_>, &Origin) -> Option<Attributes> + Send + Sync>;

/// How a claim decides whether a selected node is its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
	/// A caller-supplied [`Matcher`].
	Node,

	/// The node's `href`/`src` matched against a path template.
	Path,
}

/// Options shared by every kind of claim.
#[derive(Debug, Clone, Default)]
pub struct ClaimOptions {
	/// CSS selector for candidate nodes.
	pub selector: Option<String>,

	/// Claims with a lower value are staked first.
	pub priority: Priority,

	/// Path template, for path claims.
	pub pattern: Option<String>,

	/// Per-token override patterns for the path template.
	pub shims: HashMap<String, String>,
}

impl ClaimOptions {
	pub fn selector(selector: &str) -> Self {
		ClaimOptions {
			selector: Some(selector.to_string()),
			..Default::default()
		}
	}

	pub fn with_pattern(mut self, pattern: &str) -> Self {
		self.pattern = Some(pattern.to_string());
		self
	}

	pub fn with_priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	pub fn with_shim(mut self, name: &str, pattern: &str) -> Self {
		self.shims.insert(name.to_string(), pattern.to_string());
		self
	}
}

enum Strategy {
	Node(Matcher),
	Path(PathPattern),
}

/// A rule tagging document nodes as belonging to a resource type.
pub struct Claim {
	resource_type: ResourceType,
	selector: Selectors,
	selector_source: String,
	priority: Priority,
	strategy: Strategy,
}

impl Claim {
	/// Build a claim of the given kind.
	///
	/// Fails when the selector is missing or unparseable, when a node claim has
	/// no matcher, or when a path claim has no (valid) pattern.
	pub fn new(
		kind: ClaimKind,
		resource_type: &ResourceType,
		options: ClaimOptions,
		matcher: Option<Matcher>,
	) -> Result<Self> {
		let resource = resource_type.name().to_string();

		let Some(selector_source) = options.selector else {
			return Err(KioskError::MissingSelector { resource });
		};
		let selector =
			Selectors::compile(&selector_source).map_err(|()| KioskError::InvalidSelector {
				selector: selector_source.clone(),
				message: "malformed or unsupported selector".to_string(),
			})?;

		let strategy = match kind {
			ClaimKind::Node => Strategy::Node(matcher.ok_or(KioskError::MissingMatcher { resource })?),
			ClaimKind::Path => {
				let pattern = options
					.pattern
					.ok_or(KioskError::MissingPattern { resource })?;
				Strategy::Path(PathPattern::compile(&pattern, &options.shims)?)
			}
		};

		Ok(Claim {
			resource_type: resource_type.clone(),
			selector,
			selector_source,
			priority: options.priority,
			strategy,
		})
	}

	/// A claim deciding with a caller-supplied matcher.
	pub fn node<F>(resource_type: &ResourceType, options: ClaimOptions, matcher: F) -> Result<Self>
	where
		F: Fn(&Node<'_>, &Origin) -> Option<Attributes> + Send + Sync + 'static,
	{
		Self::new(ClaimKind::Node, resource_type, options, Some(Box::new(matcher)))
	}

	/// A claim matching the node's URI against `options.pattern`.
	pub fn path(resource_type: &ResourceType, options: ClaimOptions) -> Result<Self> {
		Self::new(ClaimKind::Path, resource_type, options, None)
	}

	pub fn kind(&self) -> ClaimKind {
		match self.strategy {
			Strategy::Node(_) => ClaimKind::Node,
			Strategy::Path(_) => ClaimKind::Path,
		}
	}

	pub fn resource_type(&self) -> &ResourceType {
		&self.resource_type
	}

	pub fn selector(&self) -> &str {
		&self.selector_source
	}

	pub fn priority(&self) -> Priority {
		self.priority
	}

	/// The path template of a path claim.
	pub fn pattern(&self) -> Option<&PathPattern> {
		match &self.strategy {
			Strategy::Path(pattern) => Some(pattern),
			Strategy::Node(_) => None,
		}
	}

	/// Run the claim's matcher on a node. Empty attribute sets count as no
	/// match.
	pub fn attributes_for(&self, node: &Node<'_>, origin: &Origin) -> Option<Attributes> {
		let attributes = match &self.strategy {
			Strategy::Node(matcher) => matcher(node, origin),
			Strategy::Path(pattern) => node.match_uri(origin, pattern),
		};
		attributes.filter(|attributes| !attributes.is_empty())
	}

	/// Stake the claim over a document.
	///
	/// Candidates are selected once, up front. Each unclaimed candidate the
	/// matcher accepts is claimed for this claim's resource type and handed to
	/// `on_match` before the next candidate is examined. Returns the number of
	/// nodes claimed.
	pub fn stake<F>(
		&self,
		target: &mut ClaimedDocument,
		origin: &Origin,
		mut on_match: F,
	) -> Result<usize>
	where
		F: FnMut(&mut ClaimedDocument, NodeId) -> Result<()>,
	{
		let candidates = target.document().select(&self.selector);
		let mut staked = 0;

		for id in candidates {
			if target.is_claimed(id) {
				trace!(selector = %self.selector_source, "node already claimed");
				continue;
			}

			let Some(attributes) = target
				.document()
				.node(id)
				.and_then(|node| self.attributes_for(&node, origin))
			else {
				continue;
			};

			debug!(
				resource = %self.resource_type,
				selector = %self.selector_source,
				?attributes,
				"claim staked"
			);

			target.claim(id, Resource::new(self.resource_type.clone(), attributes));
			staked += 1;
			on_match(target, id)?;
		}

		Ok(staked)
	}
}

impl fmt::Debug for Claim {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Claim")
			.field("resource_type", &self.resource_type)
			.field("selector", &self.selector_source)
			.field("priority", &self.priority)
			.field("kind", &self.kind())
			.finish()
	}
}
