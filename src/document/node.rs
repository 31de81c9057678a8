use super::{Document, NodeId};
use html5ever::{LocalName, Namespace};
use kuchikiki::{ExpandedName, NodeRef};

/// Attributes that hold a node's link or asset URI, in lookup order.
pub const URI_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Read-only view of a document node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
	document: &'a Document,
	id: NodeId,
}

impl<'a> Node<'a> {
	pub(crate) fn new(document: &'a Document, id: NodeId) -> Self {
		Node { document, id }
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	fn handle(&self) -> Option<&'a NodeRef> {
		self.document.handle(self.id)
	}

	/// The element name, or `None` for text, comments and the like.
	pub fn name(&self) -> Option<String> {
		let element = self.handle()?.as_element()?;
		Some(element.name.local.to_string())
	}

	/// The value of an attribute.
	pub fn attr(&self, name: &str) -> Option<String> {
		let element = self.handle()?.as_element()?;
		let attributes = element.attributes.borrow();
		attributes.get(name).map(str::to_string)
	}

	/// Whether the element has the given class.
	pub fn has_class(&self, class: &str) -> bool {
		self.attr("class")
			.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
	}

	/// The first present of `href` and `src`, as `(attribute, value)`.
	pub fn uri_attribute(&self) -> Option<(&'static str, String)> {
		URI_ATTRIBUTES
			.iter()
			.find_map(|name| self.attr(name).map(|value| (*name, value)))
	}

	/// Text nodes under this node, in document order.
	pub fn text_nodes(&self) -> Vec<NodeId> {
		let Some(handle) = self.handle() else {
			return Vec::new();
		};

		handle
			.descendants()
			.filter(|node| node.as_text().is_some())
			.filter_map(|node| self.document.id_of(&node))
			.collect()
	}

	/// Concatenated text content.
	pub fn text(&self) -> String {
		self.handle().map(NodeRef::text_contents).unwrap_or_default()
	}
}

/// Mutable view of a document node.
///
/// Mutations keep the node's [`NodeId`] usable by later rewrites, renaming
/// included.
#[derive(Debug)]
pub struct NodeMut<'a> {
	document: &'a mut Document,
	id: NodeId,
}

impl<'a> NodeMut<'a> {
	pub(crate) fn new(document: &'a mut Document, id: NodeId) -> Self {
		NodeMut { document, id }
	}

	pub fn id(&self) -> NodeId {
		self.id
	}

	/// Read-only view of the same node.
	pub fn as_node(&self) -> Node<'_> {
		Node::new(self.document, self.id)
	}

	pub fn name(&self) -> Option<String> {
		self.as_node().name()
	}

	pub fn attr(&self, name: &str) -> Option<String> {
		self.as_node().attr(name)
	}

	pub fn uri_attribute(&self) -> Option<(&'static str, String)> {
		self.as_node().uri_attribute()
	}

	/// Rename the element. Returns false for non-element nodes.
	///
	/// Element names are fixed once parsed, so the element is replaced by a
	/// new one carrying the same attributes and children.
	pub fn set_name(&mut self, new_name: &str) -> bool {
		let Some(old) = self.document.handle(self.id).cloned() else {
			return false;
		};
		let Some(element) = old.as_element() else {
			return false;
		};

		let mut name = element.name.clone();
		name.local = LocalName::from(new_name.to_ascii_lowercase().as_str());
		let attributes = element.attributes.borrow().map.clone();
		let renamed = NodeRef::new_element(name, attributes);

		for child in old.children().collect::<Vec<_>>() {
			renamed.append(child);
		}
		old.insert_before(renamed.clone());
		old.detach();

		self.document.replace(self.id, renamed);
		true
	}

	/// Set an attribute, replacing any existing value in place.
	pub fn set_attr(&mut self, name: &str, value: &str) -> bool {
		let Some(element) = self.document.handle(self.id).and_then(|node| node.as_element()) else {
			return false;
		};

		element
			.attributes
			.borrow_mut()
			.insert(name, value.to_string());
		true
	}

	/// Remove an attribute, returning its previous value. Remaining
	/// attributes keep their order.
	pub fn remove_attr(&mut self, name: &str) -> Option<String> {
		let element = self.document.handle(self.id)?.as_element()?;
		let key = ExpandedName::new(Namespace::from(""), name);
		let removed = element.attributes.borrow_mut().map.shift_remove(&key)?;
		Some(removed.value)
	}

	/// Overwrite the link/asset attribute, whichever of `href` and `src` is
	/// present first. Returns false when the node has neither.
	pub fn set_uri_attribute(&mut self, value: &str) -> bool {
		match self.uri_attribute() {
			Some((name, _)) => self.set_attr(name, value),
			None => false,
		}
	}

	/// Text nodes under this node, in document order.
	pub fn text_nodes(&self) -> Vec<NodeId> {
		self.as_node().text_nodes()
	}

	/// Replace the content of one of this node's text nodes.
	pub fn set_text(&mut self, text_node: NodeId, text: &str) -> bool {
		self.text_nodes().contains(&text_node) && self.document.set_text(text_node, text)
	}

	/// Append a text node as the last child.
	pub fn append_text(&mut self, text: &str) -> NodeId {
		let text = NodeRef::new_text(text);
		if let Some(handle) = self.document.handle(self.id) {
			handle.append(text.clone());
		}
		self.document.register(text)
	}
}
