//! The claim-and-rewrite pipeline.

use crate::claims::{Claim, ClaimKind, ClaimOptions, ClaimedDocument, Matcher, Priority};
use crate::document::Document;
use crate::error::Result;
use crate::origin::Origin;
use crate::resource::ResourceType;
use crate::rewrites::{Rewrite, dispatch};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Rewrites origin content into the host application's URL space.
///
/// Claims are grouped by priority and staked in ascending priority order,
/// registration order within a group. Every node a claim takes is handed to
/// all matching rewrites straight away, before the claim moves on.
#[derive(Debug)]
pub struct Rewriter {
	origin: Arc<Origin>,
	claims: BTreeMap<Priority, Vec<Claim>>,
	rewrites: Vec<Rewrite>,
}

impl Rewriter {
	pub fn new(origin: impl Into<Arc<Origin>>) -> Self {
		Rewriter {
			origin: origin.into(),
			claims: BTreeMap::new(),
			rewrites: Vec::new(),
		}
	}

	pub fn origin(&self) -> &Arc<Origin> {
		&self.origin
	}

	/// Append a claim to its priority group.
	pub fn add_claim(&mut self, claim: Claim) {
		self.claims.entry(claim.priority()).or_default().push(claim);
	}

	/// Build and add a claim in one step.
	pub fn register_claim(
		&mut self,
		kind: ClaimKind,
		resource_type: &ResourceType,
		options: ClaimOptions,
		matcher: Option<Matcher>,
	) -> Result<()> {
		let claim = Claim::new(kind, resource_type, options, matcher)?;
		debug!(?claim, "claim registered");
		self.add_claim(claim);
		Ok(())
	}

	pub fn add_rewrite(&mut self, rewrite: Rewrite) {
		self.rewrites.push(rewrite);
	}

	/// Drop every rewrite, keeping the claims.
	pub fn reset_rewrites(&mut self) {
		self.rewrites.clear();
	}

	/// Priorities with at least one claim, in staking order.
	pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
		self.claims.keys().copied()
	}

	/// Claims in a priority group, in registration order.
	pub fn claims_at(&self, priority: Priority) -> &[Claim] {
		self.claims.get(&priority).map_or(&[], Vec::as_slice)
	}

	pub fn rewrites(&self) -> &[Rewrite] {
		&self.rewrites
	}

	/// Rewrite content, returning the serialized result.
	pub fn rewrite(&self, content: &str) -> Result<String> {
		Ok(self.rewrite_to_document(content)?.serialize())
	}

	/// Rewrite content, returning the document with its claims.
	pub fn rewrite_to_document(&self, content: &str) -> Result<ClaimedDocument> {
		let mut target = ClaimedDocument::new(Document::parse(content));

		for (priority, claims) in &self.claims {
			for claim in claims {
				let staked = claim.stake(&mut target, &self.origin, |target, id| {
					dispatch(&self.rewrites, target, id, &self.origin).map(|_| ())
				})?;

				if staked > 0 {
					debug!(%priority, resource = %claim.resource_type(), staked, "claim pass complete");
				}
			}
		}

		Ok(target)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Node;
	use crate::error::{KioskError, TransformError};
	use crate::resource::{Attributes, Resource};
	use crate::uri::PathPattern;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};

	const CONTENT: &str = r#"<p>
  Link to a <a class="post" href="http://some.example/site/post/123">post</a>.
</p>
<p>
  Link to a <a class="page" href="http://some.example/site/page/321">page</a>.
  <img src="http://some.example/site/file/name.png"/>
  Link to a <a href="http://some.example/site/page/456">page</a>.
</p>"#;

	const REWRITTEN: &str = r#"<p>
  Link to a <a class="post" href="post_url">post</a>.
</p>
<p>
  Link to a <a class="page" href="page_url">page</a>.
  <p src="http://some.example/site/file/name.png"></p>
  Link to a <a href="page_url">page</a>.
</p>"#;

	fn origin() -> Origin {
		Origin::from_site("http://some.example/site/").unwrap()
	}

	/// Call counters for each claim and rewrite, in registration order.
	struct Counters {
		claims: [Arc<AtomicUsize>; 4],
		rewrites: [Arc<AtomicUsize>; 3],
	}

	fn counted<F>(
		counter: &Arc<AtomicUsize>,
		matcher: F,
	) -> impl Fn(&Node<'_>, &Origin) -> Option<Attributes> + Send + Sync + 'static
	where
		F: Fn(&Node<'_>, &Origin) -> Option<Attributes> + Send + Sync + 'static,
	{
		let counter = Arc::clone(counter);
		move |node: &Node<'_>, origin: &Origin| {
			counter.fetch_add(1, Ordering::SeqCst);
			matcher(node, origin)
		}
	}

	fn pattern(source: &str) -> PathPattern {
		PathPattern::compile(source, &HashMap::new()).unwrap()
	}

	/// Posts, pages and attachments claimed at three priorities, with a
	/// rewrite for each.
	fn rewriter() -> (Rewriter, Counters) {
		let counters = Counters {
			claims: Default::default(),
			rewrites: Default::default(),
		};
		let post = ResourceType::new("post");
		let page = ResourceType::new("page");
		let attachment = ResourceType::new("attachment");

		let mut rewriter = Rewriter::new(origin());

		let post_id = pattern("post/:id");
		let claim1 = Claim::node(
			&post,
			ClaimOptions::selector("a.post"),
			counted(&counters.claims[0], move |node, origin| node.match_uri(origin, &post_id)),
		)
		.unwrap();

		let slug = pattern(":slug");
		let claim2 = Claim::node(
			&page,
			ClaimOptions::selector("a").with_priority(Priority::LOW),
			counted(&counters.claims[1], move |node, origin| node.match_uri(origin, &slug)),
		)
		.unwrap();

		let page_id = pattern("page/:id");
		let claim3 = Claim::node(
			&page,
			ClaimOptions::selector("a.page"),
			counted(&counters.claims[2], move |node, origin| node.match_uri(origin, &page_id)),
		)
		.unwrap();

		let filename = pattern("file/:filename");
		let claim4 = Claim::node(
			&attachment,
			ClaimOptions::selector("img").with_priority(Priority::HIGH),
			counted(&counters.claims[3], move |node, origin| node.match_uri(origin, &filename)),
		)
		.unwrap();

		rewriter.add_claim(claim1);
		rewriter.add_claim(claim2);
		rewriter.add_claim(claim3);
		rewriter.add_claim(claim4);

		let calls = Arc::clone(&counters.rewrites[0]);
		rewriter.add_rewrite(Rewrite::path("post", move |_, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok("post_url".to_string())
		}));
		let calls = Arc::clone(&counters.rewrites[1]);
		rewriter.add_rewrite(Rewrite::path("page", move |_, _| {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok("page_url".to_string())
		}));
		let calls = Arc::clone(&counters.rewrites[2]);
		rewriter.add_rewrite(Rewrite::node("attachment", move |_, node| {
			calls.fetch_add(1, Ordering::SeqCst);
			node.set_name("p");
			Ok(())
		}));

		(rewriter, counters)
	}

	fn count(counter: &Arc<AtomicUsize>) -> usize {
		counter.load(Ordering::SeqCst)
	}

	#[test]
	fn test_add_claim_default_priority() {
		let mut rewriter = Rewriter::new(origin());
		let options = ClaimOptions::selector("a").with_pattern(":id");
		let claim = Claim::path(&ResourceType::new("post"), options).unwrap();
		rewriter.add_claim(claim);

		assert_eq!(rewriter.priorities().collect::<Vec<_>>(), vec![Priority::NORMAL]);
		assert_eq!(rewriter.claims_at(Priority::new(0)).len(), 1);
	}

	#[test]
	fn test_add_claim_groups_by_priority() {
		let mut rewriter = Rewriter::new(origin());
		let post = ResourceType::new("post");
		for priority in [Priority::new(1), Priority::HIGH, Priority::new(1)] {
			rewriter
				.register_claim(
					ClaimKind::Path,
					&post,
					ClaimOptions::selector("a").with_pattern(":id").with_priority(priority),
					None,
				)
				.unwrap();
		}

		assert_eq!(
			rewriter.priorities().collect::<Vec<_>>(),
			vec![Priority::new(-9), Priority::new(1)]
		);
		assert_eq!(rewriter.claims_at(Priority::new(1)).len(), 2);
		assert!(rewriter.claims_at(Priority::LOW).is_empty());
	}

	#[test]
	fn test_register_claim_rejects_invalid_claims() {
		let mut rewriter = Rewriter::new(origin());
		let post = ResourceType::new("post");
		let result = rewriter.register_claim(ClaimKind::Path, &post, ClaimOptions::default(), None);

		assert!(matches!(result, Err(KioskError::MissingSelector { .. })));
		assert_eq!(rewriter.priorities().count(), 0);
	}

	#[test]
	fn test_rewrite_content() {
		let (rewriter, _) = rewriter();
		assert_eq!(rewriter.rewrite(CONTENT).unwrap(), REWRITTEN);
	}

	#[test]
	fn test_claimed_nodes_are_skipped_by_later_claims() {
		let (rewriter, counters) = rewriter();
		rewriter.rewrite(CONTENT).unwrap();

		assert_eq!(count(&counters.claims[0]), 1);
		// Only the unclassed link is still unclaimed at low priority.
		assert_eq!(count(&counters.claims[1]), 1);
		assert_eq!(count(&counters.claims[2]), 1);
		assert_eq!(count(&counters.claims[3]), 1);
	}

	#[test]
	fn test_all_matching_rewrites_evaluated() {
		let (rewriter, counters) = rewriter();
		rewriter.rewrite(CONTENT).unwrap();

		assert_eq!(count(&counters.rewrites[0]), 1);
		assert_eq!(count(&counters.rewrites[1]), 2);
		assert_eq!(count(&counters.rewrites[2]), 1);
	}

	#[test]
	fn test_low_priority_claims_take_leftovers() {
		let (rewriter, counters) = rewriter();
		let content = r#"<a class="page" href="http://some.example/site/page-name">page</a>"#;

		let document = rewriter.rewrite_to_document(content).unwrap();
		let (_, resource) = document.claimed_nodes()[0];

		assert_eq!(resource.kind().name(), "page");
		assert_eq!(resource.slug(), Some("page-name"));
		assert_eq!(count(&counters.claims[2]), 1);
		assert_eq!(count(&counters.claims[1]), 1);
		assert_eq!(document.serialize(), r#"<a class="page" href="page_url">page</a>"#);
	}

	#[test]
	fn test_unclaimed_content_passes_through() {
		let (rewriter, _) = rewriter();
		let content =
			r#"<p>Elsewhere: <a href="http://other.example/post/1">link</a> <img src="/x.png"></p>"#;

		assert_eq!(rewriter.rewrite(content).unwrap(), content);
	}

	#[test]
	fn test_highest_priority_claim_wins_shared_node() {
		let calls: [Arc<AtomicUsize>; 3] = Default::default();
		let claims = [
			("page", Priority::NORMAL, &calls[1]),
			("attachment", Priority::LOW, &calls[2]),
			("post", Priority::HIGH, &calls[0]),
		];

		let mut rewriter = Rewriter::new(origin());
		for (name, priority, counter) in claims {
			let claim = Claim::node(
				&ResourceType::new(name),
				ClaimOptions::selector("a").with_priority(priority),
				counted(counter, |_, _| {
					Some(Attributes::from([("slug".to_string(), "shared".to_string())]))
				}),
			)
			.unwrap();
			rewriter.add_claim(claim);
		}

		let content = r#"<a href="http://some.example/site/shared">x</a>"#;
		let document = rewriter.rewrite_to_document(content).unwrap();
		let claimed = document.claimed_nodes();

		assert_eq!(claimed.len(), 1);
		assert_eq!(claimed[0].1.kind().name(), "post");
		assert_eq!(count(&calls[0]), 1);
		assert_eq!(count(&calls[1]), 0);
		assert_eq!(count(&calls[2]), 0);
	}

	#[test]
	fn test_reset_rewrites_keeps_claims() {
		let (mut rewriter, _) = rewriter();
		rewriter.reset_rewrites();

		assert!(rewriter.rewrites().is_empty());
		assert_eq!(rewriter.priorities().count(), 3);

		let document = rewriter.rewrite_to_document(CONTENT).unwrap();
		assert_eq!(document.claimed_nodes().len(), 4);
		assert_eq!(document.serialize(), rewriter.rewrite(CONTENT).unwrap());
	}

	#[test]
	fn test_end_to_end_post_link() {
		let mut rewriter = Rewriter::new(origin());
		rewriter
			.register_claim(
				ClaimKind::Path,
				&ResourceType::new("post"),
				ClaimOptions::selector("a.post").with_pattern("post/:id"),
				None,
			)
			.unwrap();
		rewriter.add_rewrite(Rewrite::path("post", |post: &Resource, _| {
			assert_eq!(post.id(), Some("123"));
			Ok("post_url".to_string())
		}));

		let content = r#"<p>See <a class="post" href="http://some.example/site/post/123">this</a>.</p>"#;
		assert_eq!(
			rewriter.rewrite(content).unwrap(),
			r#"<p>See <a class="post" href="post_url">this</a>.</p>"#
		);
	}

	#[test]
	fn test_transform_errors_abort_rewrite() {
		let (mut rewriter, _) = rewriter();
		rewriter.add_rewrite(Rewrite::node("post", |_, _| {
			Err(TransformError::Failed(anyhow::anyhow!("broken template")))
		}));

		assert!(matches!(rewriter.rewrite(CONTENT), Err(KioskError::Transform { .. })));
	}

	#[test]
	fn test_rewrites_see_earlier_mutations() {
		let mut rewriter = Rewriter::new(origin());
		rewriter
			.register_claim(
				ClaimKind::Path,
				&ResourceType::new("post"),
				ClaimOptions::selector("a").with_pattern("post/:id"),
				None,
			)
			.unwrap();
		rewriter.add_rewrite(Rewrite::node("post", |_, node| {
			node.set_attr("class", "local");
			Ok(())
		}));
		rewriter.add_rewrite(Rewrite::node("post", |post, node| {
			let class = node.attr("class").unwrap_or_default();
			node.set_attr("title", &format!("{} {}", class, post.id().unwrap_or_default()));
			Ok(())
		}));

		let content = r#"<a href="http://some.example/site/post/7">x</a>"#;
		assert_eq!(
			rewriter.rewrite(content).unwrap(),
			r#"<a href="http://some.example/site/post/7" class="local" title="local 7">x</a>"#
		);
	}
}
