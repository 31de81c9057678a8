use crate::claims::ClaimedDocument;
use crate::document::{Node, NodeId, NodeMut};
use crate::error::{KioskError, Result, TransformError};
use crate::origin::Origin;
use crate::resource::Resource;
use std::fmt;
use tracing::{debug, trace};

/// Outcome of a caller-supplied transform.
pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Mutates a claimed node in place.
pub type NodeTransform =
	Box<dyn Fn(&Resource, &mut NodeMut<'_>) -> TransformResult<()> + Send + Sync>;

/// Computes the new link/asset URI of a claimed node.
pub type PathTransform = Box<dyn Fn(&Resource, &Node<'_>) -> TransformResult<String> + Send + Sync>;

/// What a rewrite does to the nodes it fires on.
pub enum RewriteKind {
	/// Arbitrary mutation of the node.
	Node(NodeTransform),

	/// Replace the node's `href`/`src` with the transform's result.
	Path(PathTransform),

	/// Redirect the node's `href`/`src` to the origin's CDN.
	Cdn,
}

/// A host-defined rule applied to nodes claimed for a resource type.
pub struct Rewrite {
	target: String,
	kind: RewriteKind,
}

impl Rewrite {
	pub fn new(target: impl Into<String>, kind: RewriteKind) -> Self {
		Rewrite {
			target: target.into(),
			kind,
		}
	}

	/// A rewrite mutating nodes claimed for `target`.
	pub fn node<F>(target: impl Into<String>, transform: F) -> Self
	where
		F: Fn(&Resource, &mut NodeMut<'_>) -> TransformResult<()> + Send + Sync + 'static,
	{
		Self::new(target, RewriteKind::Node(Box::new(transform)))
	}

	/// A rewrite pointing nodes claimed for `target` at a new URI.
	pub fn path<F>(target: impl Into<String>, transform: F) -> Self
	where
		F: Fn(&Resource, &Node<'_>) -> TransformResult<String> + Send + Sync + 'static,
	{
		Self::new(target, RewriteKind::Path(Box::new(transform)))
	}

	/// A rewrite serving assets claimed for `target` from the CDN.
	pub fn cdn(target: impl Into<String>) -> Self {
		Self::new(target, RewriteKind::Cdn)
	}

	/// Name of the resource type this rewrite targets.
	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn kind(&self) -> &RewriteKind {
		&self.kind
	}

	/// Whether the rewrite applies to a resource: its type is the target or is
	/// substitutable for it.
	pub fn matches(&self, resource: &Resource) -> bool {
		resource.is_a(&self.target)
	}

	/// Apply the rewrite to a node claimed for `resource`.
	///
	/// Returns whether the node was changed. Routing failures of path
	/// transforms leave the node untouched; any other transform failure is
	/// returned as [`KioskError::Transform`].
	pub fn evaluate(
		&self,
		resource: &Resource,
		node: &mut NodeMut<'_>,
		origin: &Origin,
	) -> Result<bool> {
		let failed = |source: anyhow::Error| KioskError::Transform {
			resource: resource.kind().name().to_string(),
			source,
		};

		match &self.kind {
			RewriteKind::Node(transform) => match transform(resource, node) {
				Ok(()) => Ok(true),
				Err(TransformError::Failed(source)) => Err(failed(source)),
				Err(error) => Err(failed(error.into())),
			},
			RewriteKind::Path(transform) => {
				let routed = transform(resource, &node.as_node());
				match routed {
					Ok(uri) => Ok(node.set_uri_attribute(&uri)),
					Err(TransformError::Routing(message)) => {
						debug!(resource = %resource.kind(), %message, "no route, node left unchanged");
						Ok(false)
					}
					Err(TransformError::Failed(source)) => Err(failed(source)),
				}
			}
			RewriteKind::Cdn => Ok(origin.cdn().rewrite_node(node, origin.site())),
		}
	}
}

impl fmt::Debug for Rewrite {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.kind {
			RewriteKind::Node(_) => "node",
			RewriteKind::Path(_) => "path",
			RewriteKind::Cdn => "cdn",
		};
		f.debug_struct("Rewrite")
			.field("target", &self.target)
			.field("kind", &kind)
			.finish()
	}
}

/// Apply every matching rewrite, in order, to a claimed node.
///
/// Effects accumulate: each rewrite sees the node as left by the previous one.
/// Unclaimed nodes are left alone. Returns the number of rewrites that fired.
pub fn dispatch(
	rewrites: &[Rewrite],
	target: &mut ClaimedDocument,
	id: NodeId,
	origin: &Origin,
) -> Result<usize> {
	let Some((resource, mut node)) = target.claimed_mut(id) else {
		trace!(node = ?id, "skipping rewrites of unclaimed node");
		return Ok(0);
	};

	let mut fired = 0;
	for rewrite in rewrites.iter().filter(|rewrite| rewrite.matches(resource)) {
		rewrite.evaluate(resource, &mut node, origin)?;
		fired += 1;
	}

	Ok(fired)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{CdnConfig, OriginConfig};
	use crate::document::{Document, Selectors};
	use crate::resource::{Attributes, ResourceType};

	fn origin() -> Origin {
		Origin::from_site("http://some.example/site/").unwrap()
	}

	fn cdn_origin(host: &str) -> Origin {
		Origin::new(&OriginConfig {
			site: "http://some.example/site/".to_string(),
			cdn: CdnConfig {
				host: Some(host.to_string()),
			},
			..Default::default()
		})
		.unwrap()
	}

	fn resource(kind: &str, slug: &str) -> Resource {
		let mut attributes = Attributes::new();
		attributes.insert("slug".to_string(), slug.to_string());
		Resource::new(ResourceType::new(kind), attributes)
	}

	/// A document with its first `css` match claimed for `resource`.
	fn claimed(markup: &str, css: &str, resource: Resource) -> (ClaimedDocument, NodeId) {
		let document = Document::parse(markup);
		let id = document.select(&Selectors::compile(css).unwrap())[0];
		let mut target = ClaimedDocument::new(document);
		target.claim(id, resource);
		(target, id)
	}

	/// A link claimed as the post `y`.
	fn post_link(markup: &str) -> (ClaimedDocument, NodeId) {
		claimed(markup, "a", resource("post", "y"))
	}

	#[test]
	fn test_matches_subtypes() {
		let base = ResourceType::new("resource");
		let post = ResourceType::extending("post", &base);
		let of = |kind: &ResourceType| Resource::new(kind.clone(), Attributes::new());
		let rewrite = Rewrite::cdn("resource");

		assert!(rewrite.matches(&of(&post)));
		assert!(rewrite.matches(&of(&base)));
		assert!(!Rewrite::cdn("post").matches(&of(&base)));
		assert!(!Rewrite::cdn("page").matches(&of(&post)));
	}

	#[test]
	fn test_path_rewrite_sets_uri_attribute() {
		let rewrite = Rewrite::path("post", |post, _| {
			Ok(format!("/posts/{}", post.slug().unwrap_or_default()))
		});
		let (mut target, id) = post_link(r#"<a href="http://x/y">y</a>"#);

		assert_eq!(dispatch(&[rewrite], &mut target, id, &origin()).unwrap(), 1);
		assert_eq!(target.serialize(), r#"<a href="/posts/y">y</a>"#);
	}

	#[test]
	fn test_path_rewrite_passes_node() {
		let rewrite = Rewrite::path("post", |_, node| Ok(format!("#{}", node.text())));
		let (mut target, id) = post_link(r#"<a href="http://x/y">label</a>"#);

		dispatch(&[rewrite], &mut target, id, &origin()).unwrap();
		assert_eq!(target.serialize(), r##"<a href="#label">label</a>"##);
	}

	#[test]
	fn test_path_rewrite_swallows_routing_errors() {
		let rewrite = Rewrite::path("post", |_, _| {
			Err(TransformError::Routing("post_url".to_string()))
		});
		let (mut target, id) = post_link(r#"<a href="http://x/y">y</a>"#);

		assert_eq!(dispatch(&[rewrite], &mut target, id, &origin()).unwrap(), 1);
		assert_eq!(target.serialize(), r#"<a href="http://x/y">y</a>"#);
	}

	#[test]
	fn test_path_rewrite_without_uri_attribute_is_noop() {
		let rewrite = Rewrite::path("video", |_, _| Ok("/videos/1".to_string()));
		let markup = r#"<object id="viddler-1"></object>"#;
		let (mut target, id) = claimed(markup, "object", resource("video", "1"));

		let (resource, mut node) = target.claimed_mut(id).unwrap();
		assert!(!rewrite.evaluate(resource, &mut node, &origin()).unwrap());
		assert_eq!(target.serialize(), markup);
	}

	#[test]
	fn test_transform_failures_propagate() {
		let rewrite = Rewrite::node("post", |_, _| Err(anyhow::anyhow!("template missing").into()));
		let (mut target, id) = post_link("<a>y</a>");

		match dispatch(&[rewrite], &mut target, id, &origin()).unwrap_err() {
			KioskError::Transform { resource, source } => {
				assert_eq!(resource, "post");
				assert_eq!(source.to_string(), "template missing");
			}
			_ => panic!("Expected Transform error"),
		}
	}

	#[test]
	fn test_all_matching_rewrites_fire_in_order() {
		let rewrites = vec![
			Rewrite::node("post", |_, node| {
				node.set_name("span");
				Ok(())
			}),
			Rewrite::node("page", |_, node| {
				node.set_attr("class", "page");
				Ok(())
			}),
			Rewrite::node("post", |_, node| {
				let name = node.name().unwrap_or_default();
				node.set_attr("data-was", &name);
				Ok(())
			}),
		];
		let (mut target, id) = post_link("<a>y</a>");

		assert_eq!(dispatch(&rewrites, &mut target, id, &origin()).unwrap(), 2);
		assert_eq!(target.serialize(), r#"<span data-was="span">y</span>"#);
	}

	#[test]
	fn test_unclaimed_nodes_are_skipped() {
		let document = Document::parse("<a>y</a>");
		let id = document.select(&Selectors::compile("a").unwrap())[0];
		let mut target = ClaimedDocument::new(document);

		let rewrites = vec![Rewrite::node("post", |_, node| {
			node.set_name("b");
			Ok(())
		})];
		assert_eq!(dispatch(&rewrites, &mut target, id, &origin()).unwrap(), 0);
		assert_eq!(target.serialize(), "<a>y</a>");
	}

	#[test]
	fn test_cdn_rewrite() {
		let (mut target, id) = claimed(
			r#"<img src="http://some.example/site/files/a.png">"#,
			"img",
			resource("attachment", "a"),
		);

		let origin = cdn_origin("cdn.example");
		dispatch(&[Rewrite::cdn("attachment")], &mut target, id, &origin).unwrap();
		assert_eq!(target.serialize(), r#"<img src="http://cdn.example/site/files/a.png">"#);
	}

	#[test]
	fn test_cdn_rewrite_of_root_relative_asset() {
		let (mut target, id) = claimed(
			r#"<img src="/files/a.png?v=2">"#,
			"img",
			resource("attachment", "a"),
		);

		let origin = cdn_origin("cdn.example");
		dispatch(&[Rewrite::cdn("attachment")], &mut target, id, &origin).unwrap();
		assert_eq!(target.serialize(), r#"<img src="//cdn.example/files/a.png?v=2">"#);
	}
}
