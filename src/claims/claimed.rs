use crate::document::{Document, NodeId, NodeMut};
use crate::resource::Resource;
use std::collections::HashMap;

/// A document together with the claims staked on its nodes.
///
/// A node is claimed at most once; the resource attached by the first
/// successful claim is kept for the rest of the pass.
#[derive(Debug)]
pub struct ClaimedDocument {
	document: Document,
	claims: HashMap<NodeId, Resource>,
}

impl ClaimedDocument {
	pub fn new(document: Document) -> Self {
		ClaimedDocument {
			document,
			claims: HashMap::new(),
		}
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	pub fn is_claimed(&self, node: NodeId) -> bool {
		self.claims.contains_key(&node)
	}

	/// The resource claimed for a node.
	pub fn claimed(&self, node: NodeId) -> Option<&Resource> {
		self.claims.get(&node)
	}

	/// Mark a node claimed. Returns false, keeping the existing claim, if the
	/// node was already claimed.
	pub fn claim(&mut self, node: NodeId, resource: Resource) -> bool {
		if self.is_claimed(node) {
			return false;
		}
		self.claims.insert(node, resource);
		true
	}

	/// Claimed nodes in document order.
	pub fn claimed_nodes(&self) -> Vec<(NodeId, &Resource)> {
		let mut nodes: Vec<_> = self.claims.iter().map(|(id, r)| (*id, r)).collect();
		nodes.sort_by_key(|(id, _)| *id);
		nodes
	}

	/// The resource of a claimed node alongside write access to the node.
	pub fn claimed_mut(&mut self, node: NodeId) -> Option<(&Resource, NodeMut<'_>)> {
		let resource = self.claims.get(&node)?;
		let node = self.document.node_mut(node)?;
		Some((resource, node))
	}

	pub fn serialize(&self) -> String {
		self.document.serialize()
	}

	pub fn into_document(self) -> Document {
		self.document
	}
}
