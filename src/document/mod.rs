//! Mutable HTML documents for kiosk.
//!
//! This module handles:
//! - Parsing markup (fragments or whole documents) with html5ever via `kuchikiki`
//! - CSS selection against the current, possibly rewritten, tree
//! - Node inspection and mutation through [`Node`] and [`NodeMut`]
//! - Serializing the tree back to markup

pub mod node;

pub use kuchikiki::Selectors;
pub use node::{Node, NodeMut};

use html5ever::{LocalName, Namespace, QualName};
use kuchikiki::NodeRef;
use kuchikiki::traits::{NodeIterator, TendrilSink};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::warn;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Tags that mark markup as a complete page rather than body content.
const DOCUMENT_TAGS: [&str; 4] = ["<!doctype", "<html", "<head", "<body"];

/// Identifies a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// How the markup was parsed, and therefore how it is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
	/// Content inside `<body>`, as delivered by most CMS APIs.
	Fragment,

	/// A complete page with its own doctype, `<html>`, `<head>` or `<body>`.
	Document,
}

impl ParseMode {
	/// Detect the mode of raw markup.
	///
	/// Leading whitespace and comments are skipped; the markup is a whole
	/// document when what follows is a doctype or an `<html>`, `<head>` or
	/// `<body>` start tag.
	pub fn detect(markup: &str) -> Self {
		let mut rest = markup.trim_start();
		while let Some(comment) = rest.strip_prefix("<!--") {
			let Some((_, after)) = comment.split_once("-->") else {
				break;
			};
			rest = after.trim_start();
		}

		if DOCUMENT_TAGS.iter().any(|tag| starts_with_tag(rest, tag)) {
			ParseMode::Document
		} else {
			ParseMode::Fragment
		}
	}
}

/// Whether `markup` opens with `tag`, case-insensitively, followed by the end
/// of the tag name.
fn starts_with_tag(markup: &str, tag: &str) -> bool {
	let Some(head) = markup.get(..tag.len()) else {
		return false;
	};

	head.eq_ignore_ascii_case(tag)
		&& markup[tag.len()..]
			.chars()
			.next()
			.is_none_or(|c| c.is_ascii_whitespace() || c == '>' || c == '/')
}

/// A parsed document whose nodes can be selected and rewritten in place.
///
/// Every node is registered under a [`NodeId`] when it enters the tree. Nodes
/// are never removed, so an id obtained from [`Document::select`] stays valid
/// for the lifetime of the document, however the node is mutated.
pub struct Document {
	/// Node handles, indexed by [`NodeId`]. The first is the document node.
	nodes: Vec<NodeRef>,
	ids: HashMap<usize, NodeId>,
	/// The node whose children are the parsed content: the document node, or
	/// the `<html>` element a fragment is parsed into.
	container: NodeRef,
	mode: ParseMode,
}

impl Document {
	/// Parse markup, detecting whether it is a whole page or a body fragment.
	pub fn parse(markup: &str) -> Self {
		Self::parse_with_mode(markup, ParseMode::detect(markup))
	}

	/// Parse markup in the given mode.
	pub fn parse_with_mode(markup: &str, mode: ParseMode) -> Self {
		let tree = match mode {
			ParseMode::Document => kuchikiki::parse_html().one(markup),
			ParseMode::Fragment => {
				let context = QualName::new(
					None,
					Namespace::from(HTML_NAMESPACE),
					LocalName::from("body"),
				);
				kuchikiki::parse_fragment(context, Vec::new()).one(markup)
			}
		};

		let container = match mode {
			ParseMode::Document => tree.clone(),
			ParseMode::Fragment => tree
				.children()
				.elements()
				.next()
				.map_or_else(|| tree.clone(), |wrapper| wrapper.as_node().clone()),
		};

		let mut document = Document {
			nodes: Vec::new(),
			ids: HashMap::new(),
			container: container.clone(),
			mode,
		};

		document.register(tree.clone());
		if container != tree {
			document.register(container.clone());
		}
		for node in container.descendants() {
			document.register(node);
		}

		document
	}

	/// The parse mode of this document.
	pub fn mode(&self) -> ParseMode {
		self.mode
	}

	/// Select element nodes matching `selectors`, in document order.
	///
	/// Selection runs against the current state of the tree, so renamed
	/// elements and rewritten attributes are taken into account. The wrapper a
	/// fragment is parsed into is never selected.
	pub fn select(&self, selectors: &Selectors) -> Vec<NodeId> {
		selectors
			.filter(self.container.descendants().elements())
			.filter_map(|element| self.id_of(element.as_node()))
			.collect()
	}

	/// Read access to a node.
	pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
		self.nodes.get(id.0).map(|_| Node::new(self, id))
	}

	/// Write access to a node.
	pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
		if id.0 < self.nodes.len() {
			Some(NodeMut::new(self, id))
		} else {
			None
		}
	}

	/// Content of a text node.
	pub fn text(&self, id: NodeId) -> Option<String> {
		let text = self.handle(id)?.as_text()?;
		Some(text.borrow().clone())
	}

	/// Replace the content of a text node. Returns false for other nodes.
	pub fn set_text(&mut self, id: NodeId, text: &str) -> bool {
		match self.handle(id).and_then(|node| node.as_text()) {
			Some(content) => {
				*content.borrow_mut() = text.to_string();
				true
			}
			None => false,
		}
	}

	/// Serialize the document back to markup.
	pub fn serialize(&self) -> String {
		let mut markup = Vec::new();
		if let Err(error) = self.write_markup(&mut markup) {
			warn!(%error, "document serialization stopped early");
		}
		String::from_utf8_lossy(&markup).into_owned()
	}

	fn write_markup(&self, out: &mut Vec<u8>) -> io::Result<()> {
		for child in self.container.children() {
			match child.as_doctype() {
				Some(doctype) => {
					write!(out, "<!DOCTYPE {}", doctype.name)?;
					if !doctype.public_id.is_empty() {
						write!(out, " PUBLIC \"{}\"", doctype.public_id)?;
					} else if !doctype.system_id.is_empty() {
						out.write_all(b" SYSTEM")?;
					}
					if !doctype.system_id.is_empty() {
						write!(out, " \"{}\"", doctype.system_id)?;
					}
					out.write_all(b">")?;
				}
				None => child.serialize(&mut *out)?,
			}
		}
		Ok(())
	}

	pub(crate) fn handle(&self, id: NodeId) -> Option<&NodeRef> {
		self.nodes.get(id.0)
	}

	pub(crate) fn id_of(&self, node: &NodeRef) -> Option<NodeId> {
		self.ids.get(&key(node)).copied()
	}

	/// Give a node that entered the tree an id.
	pub(crate) fn register(&mut self, node: NodeRef) -> NodeId {
		if let Some(id) = self.id_of(&node) {
			return id;
		}

		let id = NodeId(self.nodes.len());
		self.ids.insert(key(&node), id);
		self.nodes.push(node);
		id
	}

	/// Point an id at the node that took its place in the tree.
	pub(crate) fn replace(&mut self, id: NodeId, node: NodeRef) {
		let Some(slot) = self.nodes.get_mut(id.0) else {
			return;
		};

		self.ids.remove(&key(slot));
		self.ids.insert(key(&node), id);
		*slot = node;
	}
}

/// Identity of a node handle.
fn key(node: &NodeRef) -> usize {
	Rc::as_ptr(&node.0).addr()
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Document")
			.field("mode", &self.mode)
			.field("nodes", &self.nodes.len())
			.finish()
	}
}

impl fmt::Display for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.serialize())
	}
}
