pub mod activity;
pub mod actor;
pub mod collection;
pub mod tombstone;

use crate::{getter, setter, strenum};

use super::{Base, BaseMut, Link, Node};

use activity::ActivityType;
use actor::{Actor, ActorType};
use collection::{Collection, CollectionType};

strenum! {
	pub enum ObjectType {
		Object,
		Article,
		Document,
		Event,
		Note,
		Page,
		Tombstone;

		Activity(ActivityType),
		Actor(ActorType),
		Collection(CollectionType)
	};
}

pub trait Object : Base {
	type Link : Link + Base;
	type Actor : Actor;
	type Object : Object;
	type Collection : Collection;

	fn object_type(&self) -> crate::Field<ObjectType>;
	fn attributed_to(&self) -> Node<Self::Actor> { Node::Empty }
	fn name(&self) -> crate::Field<&str> { Err(crate::FieldErr("name")) }
	fn summary(&self) -> crate::Field<&str> { Err(crate::FieldErr("summary")) }
	fn content(&self) -> crate::Field<&str> { Err(crate::FieldErr("content")) }
	fn in_reply_to(&self) -> Node<Self::Object> { Node::Empty }
	fn published(&self) -> crate::Field<chrono::DateTime<chrono::Utc>> { Err(crate::FieldErr("published")) }
	fn updated(&self) -> crate::Field<chrono::DateTime<chrono::Utc>> { Err(crate::FieldErr("updated")) }
	fn tag(&self) -> Node<Self::Object> { Node::Empty }
	fn url(&self) -> Node<Self::Link> { Node::Empty }
	fn to(&self) -> Node<Self::Link> { Node::Empty }
	fn bto(&self) -> Node<Self::Link> { Node::Empty }
	fn cc(&self) -> Node<Self::Link> { Node::Empty }
	fn bcc(&self) -> Node<Self::Link> { Node::Empty }
	fn audience(&self) -> Node<Self::Link> { Node::Empty }
	fn media_type(&self) -> crate::Field<&str> { Err(crate::FieldErr("mediaType")) }
	fn likes(&self) -> Node<Self::Collection> { Node::Empty }
	fn shares(&self) -> Node<Self::Collection> { Node::Empty }
}

pub trait ObjectMut : BaseMut {
	type Link : Link + Base;
	type Actor : Actor;
	type Object : Object;
	type Collection : Collection;

	fn set_object_type(self, val: Option<ObjectType>) -> Self;
	fn set_attributed_to(self, val: Node<Self::Actor>) -> Self;
	fn set_name(self, val: Option<&str>) -> Self;
	fn set_summary(self, val: Option<&str>) -> Self;
	fn set_content(self, val: Option<&str>) -> Self;
	fn set_in_reply_to(self, val: Node<Self::Object>) -> Self;
	fn set_published(self, val: Option<chrono::DateTime<chrono::Utc>>) -> Self;
	fn set_updated(self, val: Option<chrono::DateTime<chrono::Utc>>) -> Self;
	fn set_tag(self, val: Node<Self::Object>) -> Self;
	fn set_url(self, val: Node<Self::Link>) -> Self;
	fn set_to(self, val: Node<Self::Link>) -> Self;
	fn set_bto(self, val: Node<Self::Link>) -> Self;
	fn set_cc(self, val: Node<Self::Link>) -> Self;
	fn set_bcc(self, val: Node<Self::Link>) -> Self;
	fn set_audience(self, val: Node<Self::Link>) -> Self;
	fn set_media_type(self, val: Option<&str>) -> Self;
	fn set_likes(self, val: Node<Self::Collection>) -> Self;
	fn set_shares(self, val: Node<Self::Collection>) -> Self;
}

impl Object for serde_json::Value {
	type Link = serde_json::Value;
	type Actor = serde_json::Value;
	type Object = serde_json::Value;
	type Collection = serde_json::Value;

	getter! { object_type -> type ObjectType }
	getter! { attributed_to::attributedTo -> node Self::Actor }
	getter! { name -> &str }
	getter! { summary -> &str }
	getter! { content -> &str }
	getter! { in_reply_to::inReplyTo -> node <Self as Object>::Object }
	getter! { published -> chrono::DateTime<chrono::Utc> }
	getter! { updated -> chrono::DateTime<chrono::Utc> }
	getter! { tag -> node <Self as Object>::Object }
	getter! { url -> node Self::Link }
	getter! { to -> node Self::Link }
	getter! { bto -> node Self::Link }
	getter! { cc -> node Self::Link }
	getter! { bcc -> node Self::Link }
	getter! { audience -> node Self::Link }
	getter! { media_type::mediaType -> &str }
	getter! { likes -> node Self::Collection }
	getter! { shares -> node Self::Collection }
}

impl ObjectMut for serde_json::Value {
	type Link = serde_json::Value;
	type Actor = serde_json::Value;
	type Object = serde_json::Value;
	type Collection = serde_json::Value;

	setter! { object_type -> type ObjectType }
	setter! { attributed_to::attributedTo -> node Self::Actor }
	setter! { name -> &str }
	setter! { summary -> &str }
	setter! { content -> &str }
	setter! { in_reply_to::inReplyTo -> node <Self as ObjectMut>::Object }
	setter! { published -> chrono::DateTime<chrono::Utc> }
	setter! { updated -> chrono::DateTime<chrono::Utc> }
	setter! { tag -> node <Self as ObjectMut>::Object }
	setter! { url -> node Self::Link }
	setter! { to -> node Self::Link }
	setter! { bto -> node Self::Link }
	setter! { cc -> node Self::Link }
	setter! { bcc -> node Self::Link }
	setter! { audience -> node Self::Link }
	setter! { media_type::mediaType -> &str }
	setter! { likes -> node Self::Collection }
	setter! { shares -> node Self::Collection }
}
