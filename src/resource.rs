//! Resource types and the resources claims attach to document nodes.

use crate::error::{KioskError, Result};
use std::collections::{BTreeMap, HashMap};

/// Attributes identifying a resource, as extracted from a node.
pub type Attributes = BTreeMap<String, String>;

/// A resource type tag.
///
/// A type is substitutable for each of its supertypes, so a rewrite aimed at a
/// supertype also fires for nodes claimed by the subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType {
	name: String,
	supertypes: Vec<String>,
}

impl ResourceType {
	/// A type with no supertypes.
	pub fn new(name: impl Into<String>) -> Self {
		ResourceType {
			name: name.into(),
			supertypes: Vec::new(),
		}
	}

	/// A type substitutable for `parent` and everything `parent` is.
	pub fn extending(name: impl Into<String>, parent: &ResourceType) -> Self {
		ResourceType::new(name).with_supertype(parent)
	}

	/// Add `parent` and its own supertypes to this type's supertypes.
	pub fn with_supertype(mut self, parent: &ResourceType) -> Self {
		for name in std::iter::once(&parent.name).chain(&parent.supertypes) {
			if *name != self.name && !self.supertypes.contains(name) {
				self.supertypes.push(name.clone());
			}
		}
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn supertypes(&self) -> &[String] {
		&self.supertypes
	}

	/// Whether this type is `name` or is substitutable for it.
	pub fn is_a(&self, name: &str) -> bool {
		self.name == name || self.supertypes.iter().any(|s| s == name)
	}
}

impl std::fmt::Display for ResourceType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.name)
	}
}

/// A resource attached to a claimed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
	kind: ResourceType,
	attributes: Attributes,
}

impl Resource {
	pub fn new(kind: ResourceType, attributes: Attributes) -> Self {
		Resource { kind, attributes }
	}

	pub fn kind(&self) -> &ResourceType {
		&self.kind
	}

	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	pub fn get(&self, attribute: &str) -> Option<&str> {
		self.attributes.get(attribute).map(String::as_str)
	}

	pub fn id(&self) -> Option<&str> {
		self.get("id")
	}

	pub fn slug(&self) -> Option<&str> {
		self.get("slug")
	}

	/// The value used when building a URL to this resource: the slug, else
	/// the id.
	pub fn to_param(&self) -> Option<&str> {
		self.slug().or_else(|| self.id())
	}

	pub fn is_a(&self, name: &str) -> bool {
		self.kind.is_a(name)
	}
}

/// Catalogue of the resource types known to an application.
#[derive(Debug, Clone, Default)]
pub struct ResourceTypes {
	types: HashMap<String, ResourceType>,
}

impl ResourceTypes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a type, replacing any previous type of the same name.
	pub fn insert(&mut self, kind: ResourceType) -> &ResourceType {
		let name = kind.name.clone();
		self.types.insert(name.clone(), kind);
		&self.types[&name]
	}

	/// Define a type by name from already registered supertypes.
	pub fn define(&mut self, name: &str, supertypes: &[String]) -> Result<&ResourceType> {
		let mut kind = ResourceType::new(name);
		for parent in supertypes {
			kind = kind.with_supertype(self.get(parent)?);
		}
		Ok(self.insert(kind))
	}

	pub fn get(&self, name: &str) -> Result<&ResourceType> {
		self.types
			.get(name)
			.ok_or_else(|| KioskError::UnknownResourceType {
				name: name.to_string(),
			})
	}

	pub fn contains(&self, name: &str) -> bool {
		self.types.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}
