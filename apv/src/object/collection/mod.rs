use crate::{Node, Object, object::ObjectMut};

crate::strenum! {
	pub enum CollectionType {
		Collection,
		CollectionPage,
		OrderedCollection,
		OrderedCollectionPage;
	};
}

pub trait Collection : Object {
	fn collection_type(&self) -> crate::Field<CollectionType>;

	fn total_items(&self) -> crate::Field<u64> { Err(crate::FieldErr("totalItems")) }
	fn first(&self) -> Node<<Self as Object>::Object> { Node::Empty }
	fn next(&self) -> Node<<Self as Object>::Object> { Node::Empty }
	fn items(&self) -> Node<<Self as Object>::Object> { Node::Empty }
	fn ordered_items(&self) -> Node<<Self as Object>::Object> { Node::Empty }
}

pub trait CollectionMut : ObjectMut {
	fn set_collection_type(self, val: Option<CollectionType>) -> Self;
	fn set_total_items(self, val: Option<u64>) -> Self;
	fn set_first(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
	fn set_next(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
	fn set_items(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
	fn set_ordered_items(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
}

impl Collection for serde_json::Value {
	crate::getter! { collection_type -> type CollectionType }
	crate::getter! { total_items::totalItems -> u64 }
	crate::getter! { first -> node <Self as Object>::Object }
	crate::getter! { next -> node <Self as Object>::Object }
	crate::getter! { items -> node <Self as Object>::Object }
	crate::getter! { ordered_items::orderedItems -> node <Self as Object>::Object }
}

impl CollectionMut for serde_json::Value {
	crate::setter! { collection_type -> type CollectionType }
	crate::setter! { total_items::totalItems -> u64 }
	crate::setter! { first -> node <Self as ObjectMut>::Object }
	crate::setter! { next -> node <Self as ObjectMut>::Object }
	crate::setter! { items -> node <Self as ObjectMut>::Object }
	crate::setter! { ordered_items::orderedItems -> node <Self as ObjectMut>::Object }
}
