use crate::{Field, FieldErr, Link};

/// How a json property references other documents: not at all, by bare IRI,
/// embedded in place, or as a list mixing both forms.
pub enum Node<T : crate::Base> {
	Empty,
	Link(Box<dyn Link + Send + Sync>),
	Object(Box<T>),
	Array(Vec<Node<T>>),
}

impl<T : crate::Base> Node<T> {
	/// borrow the first embedded document; bare references hold none
	pub fn get(&self) -> Option<&T> {
		match self {
			Node::Object(document) => Some(document),
			Node::Array(nodes) => nodes.iter().find_map(|x| x.get()),
			_ => None,
		}
	}

	/// consume the node into its first embedded document
	pub fn extract(self) -> Option<T> {
		match self {
			Node::Object(document) => Some(*document),
			Node::Array(nodes) => nodes.into_iter().find_map(|x| x.extract()),
			_ => None,
		}
	}

	pub fn is_nothing(&self) -> bool {
		matches!(self, Node::Empty)
	}

	/// id of the first referenced document: href for links, id field for documents
	pub fn id(&self) -> Field<&str> {
		match self {
			Node::Empty => Err(FieldErr("id")),
			Node::Link(link) => link.href(),
			Node::Object(document) => document.id(),
			Node::Array(nodes) => nodes.first().ok_or(FieldErr("id"))?.id(),
		}
	}

	/// ids of everything referenced, skipping elements that carry none
	pub fn ids(&self) -> Vec<String> {
		match self {
			Node::Array(nodes) => nodes.iter().flat_map(|x| x.ids()).collect(),
			one => one.id().map(|x| vec![x.to_string()]).unwrap_or_default(),
		}
	}

	/// break a multi-valued node into its elements, one node each
	pub fn flat(self) -> Vec<Node<T>> {
		match self {
			Node::Empty => Vec::new(),
			Node::Array(nodes) => nodes,
			one => vec![one],
		}
	}
}

impl Node<serde_json::Value> {
	pub fn link(uri: String) -> Self {
		Node::Link(Box::new(uri))
	}

	pub fn links(uris: Vec<String>) -> Self {
		Node::Array(uris.into_iter().map(Node::link).collect())
	}

	pub fn object(document: serde_json::Value) -> Self {
		Node::Object(Box::new(document))
	}

	pub fn array(documents: Vec<serde_json::Value>) -> Self {
		Node::Array(documents.into_iter().map(Node::object).collect())
	}
}

impl From<serde_json::Value> for Node<serde_json::Value> {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::String(uri) => Node::Link(Box::new(uri)),
			serde_json::Value::Array(values) => Node::Array(
				values.into_iter().map(Node::from).collect()
			),
			serde_json::Value::Object(_) => {
				// objects with a Link type tag are references too, not documents
				if value.link_type().is_ok() {
					Node::Link(Box::new(value))
				} else {
					Node::Object(Box::new(value))
				}
			},
			_ => Node::Empty,
		}
	}
}

impl From<Node<serde_json::Value>> for serde_json::Value {
	fn from(node: Node<serde_json::Value>) -> Self {
		match node {
			Node::Empty => serde_json::Value::Null,
			Node::Link(link) => serde_json::Value::String(
				link.href().unwrap_or_default().to_string()
			),
			Node::Object(document) => *document,
			Node::Array(nodes) => serde_json::Value::Array(
				nodes.into_iter().map(serde_json::Value::from).collect()
			),
		}
	}
}

#[cfg(test)]
mod test {
	use super::Node;

	#[test]
	fn bare_strings_become_references() {
		let node = Node::from(serde_json::Value::String("https://example.net/a".into()));
		assert_eq!(node.id().unwrap(), "https://example.net/a");
		assert!(node.get().is_none());
	}

	#[test]
	fn mixed_arrays_yield_every_id() {
		let node = Node::from(serde_json::json!([
			"https://example.net/a",
			{"id": "https://example.net/b", "type": "Note"},
			{"type": "Note", "content": "no id here"},
		]));
		assert_eq!(node.ids(), vec![
			"https://example.net/a".to_string(),
			"https://example.net/b".to_string(),
		]);
	}

	#[test]
	fn extract_skips_references() {
		let node = Node::from(serde_json::json!([
			"https://example.net/a",
			{"id": "https://example.net/b", "type": "Note"},
		]));
		let document = node.extract().expect("no embedded document");
		assert_eq!(document["id"], "https://example.net/b");
	}

	#[test]
	fn mention_tags_are_references_not_documents() {
		let node = Node::from(serde_json::json!({
			"type": "Mention",
			"href": "https://example.net/a",
		}));
		assert!(node.get().is_none());
		assert_eq!(node.id().unwrap(), "https://example.net/a");
	}

	#[test]
	fn empty_nodes_have_nothing_to_say() {
		let node = Node::from(serde_json::Value::Null);
		assert!(node.is_nothing());
		assert!(node.id().is_err());
		assert!(node.ids().is_empty());
		assert!(node.flat().is_empty());
	}
}
