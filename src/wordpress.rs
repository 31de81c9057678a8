//! Built-in resource types and claims for WordPress content.
//!
//! This module handles:
//! - The WordPress resource types, all substitutable for `resource`
//! - Claims recognizing post, page, attachment and video references
//! - Helpers deriving video and page details from claimed resources

use crate::claims::{Claim, ClaimOptions, Priority};
use crate::document::Node;
use crate::error::Result;
use crate::origin::Origin;
use crate::resource::{Attributes, Resource, ResourceType, ResourceTypes};
use crate::rewriter::Rewriter;
use regex::Regex;
use std::sync::LazyLock;

pub const RESOURCE: &str = "resource";
pub const POST: &str = "post";
pub const PAGE: &str = "page";
pub const ATTACHMENT: &str = "attachment";
pub const CATEGORY: &str = "category";
pub const COMMENT: &str = "comment";
pub const VIDEO: &str = "video";

/// Dated permalinks, e.g. `2011/05/11/what-is-nanowrimo/`.
pub const POST_PATTERN: &str = r"\d{4}/\d{2}/\d{2}/:slug";

/// Any path below the site; hierarchical page slugs keep their `/`.
pub const PAGE_PATTERN: &str = ":slug";

/// Uploaded files, e.g. `files/2011/05/cover.png`.
pub const ATTACHMENT_PATTERN: &str = r"files/\d{4}/\d{2}/:slug";

static VIDDLER_OBJECT_ID: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^viddler(?:player)?-(\w+)").expect("valid regex"));

static VIDEO_ID_SUFFIX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"-(\w+)$").expect("valid regex"));

/// The base type every WordPress type extends.
pub fn resource() -> ResourceType {
	ResourceType::new(RESOURCE)
}

/// A WordPress type by name, extending [`resource`].
pub fn resource_type(name: &str) -> ResourceType {
	if name == RESOURCE {
		return resource();
	}
	ResourceType::extending(name, &resource())
}

/// Add the WordPress types to a catalogue.
pub fn register_types(types: &mut ResourceTypes) {
	for name in [RESOURCE, POST, PAGE, ATTACHMENT, CATEGORY, COMMENT, VIDEO] {
		types.insert(resource_type(name));
	}
}

/// Register the standard WordPress claims.
pub fn register_claims(rewriter: &mut Rewriter) -> Result<()> {
	rewriter.add_claim(Claim::path(
		&resource_type(POST),
		ClaimOptions::selector("a").with_pattern(POST_PATTERN),
	)?);

	rewriter.add_claim(Claim::path(
		&resource_type(PAGE),
		ClaimOptions::selector("a")
			.with_pattern(PAGE_PATTERN)
			.with_shim("slug", r"[^?]+")
			.with_priority(Priority::LOW),
	)?);

	rewriter.add_claim(Claim::path(
		&resource_type(ATTACHMENT),
		ClaimOptions::selector("a, img").with_pattern(ATTACHMENT_PATTERN),
	)?);

	rewriter.add_claim(Claim::node(
		&resource_type(VIDEO),
		ClaimOptions::selector("object"),
		match_video,
	)?);

	Ok(())
}

/// Claim embedded Viddler players by their object id.
fn match_video(node: &Node<'_>, _origin: &Origin) -> Option<Attributes> {
	let id = node.attr("id")?;
	if !VIDDLER_OBJECT_ID.is_match(&id) {
		return None;
	}

	let mut attributes = Attributes::new();
	attributes.insert("slug".to_string(), id);
	if let Some(classid) = node.attr("classid") {
		attributes.insert("classid".to_string(), classid);
	}
	Some(attributes)
}

/// The video id: the explicit `id` attribute, else the trailing identifier
/// of the slug (after its last `-`).
pub fn video_id(video: &Resource) -> Option<&str> {
	video.id().or_else(|| {
		let slug = video.slug()?;
		VIDEO_ID_SUFFIX
			.captures(slug)
			.and_then(|captures| captures.get(1))
			.map(|id| id.as_str())
	})
}

/// Location of the full player for a video.
pub fn video_url(video: &Resource) -> Option<String> {
	video_id(video).map(|id| format!("http://www.viddler.com/player/{}/", id))
}

/// Location of the thumbnail player for a video.
pub fn video_thumbnail_url(video: &Resource) -> Option<String> {
	video_id(video).map(|id| format!("http://www.viddler.com/simple/{}/", id))
}

/// The top-level section of a page: the leading segment of its slug.
pub fn page_section(page: &Resource) -> Option<&str> {
	page.slug()?.split('/').next().filter(|section| !section.is_empty())
}
