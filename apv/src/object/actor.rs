use crate::{getter, setter, strenum, Node};

use super::{Object, ObjectMut, super::key::PublicKey};

strenum! {
	pub enum ActorType {
		Application,
		Group,
		Organization,
		Person,
		Service;
	};
}

pub trait Actor : Object {
	type PublicKey : PublicKey;
	type Endpoints : Endpoints;

	fn actor_type(&self) -> crate::Field<ActorType>;
	fn preferred_username(&self) -> crate::Field<&str> { Err(crate::FieldErr("preferredUsername")) }
	fn inbox(&self) -> Node<<Self as Object>::Collection>;
	fn outbox(&self) -> Node<<Self as Object>::Collection>;
	fn following(&self) -> Node<<Self as Object>::Collection> { Node::Empty }
	fn followers(&self) -> Node<<Self as Object>::Collection> { Node::Empty }
	fn public_key(&self) -> Node<Self::PublicKey> { Node::Empty }
	fn endpoints(&self) -> Node<Self::Endpoints> { Node::Empty }
}

pub trait ActorMut : ObjectMut {
	type PublicKey : PublicKey;
	type Endpoints : Endpoints;

	fn set_actor_type(self, val: Option<ActorType>) -> Self;
	fn set_preferred_username(self, val: Option<&str>) -> Self;
	fn set_inbox(self, val: Node<<Self as ObjectMut>::Collection>) -> Self;
	fn set_outbox(self, val: Node<<Self as ObjectMut>::Collection>) -> Self;
	fn set_following(self, val: Node<<Self as ObjectMut>::Collection>) -> Self;
	fn set_followers(self, val: Node<<Self as ObjectMut>::Collection>) -> Self;
	fn set_public_key(self, val: Node<Self::PublicKey>) -> Self;
	fn set_endpoints(self, val: Node<Self::Endpoints>) -> Self;
}

// the shared inbox lives in its own little json object on the actor
pub trait Endpoints : crate::Base {
	fn shared_inbox(&self) -> crate::Field<&str>;
}

pub trait EndpointsMut : crate::BaseMut {
	fn set_shared_inbox(self, val: Option<&str>) -> Self;
}

impl Actor for serde_json::Value {
	type PublicKey = serde_json::Value;
	type Endpoints = serde_json::Value;

	getter! { actor_type -> type ActorType }
	getter! { preferred_username::preferredUsername -> &str }
	getter! { inbox -> node <Self as Object>::Collection }
	getter! { outbox -> node <Self as Object>::Collection }
	getter! { following -> node <Self as Object>::Collection }
	getter! { followers -> node <Self as Object>::Collection }
	getter! { public_key::publicKey -> node Self::PublicKey }
	getter! { endpoints -> node <Self as Actor>::Endpoints }
}

impl ActorMut for serde_json::Value {
	type PublicKey = serde_json::Value;
	type Endpoints = serde_json::Value;

	setter! { actor_type -> type ActorType }
	setter! { preferred_username::preferredUsername -> &str }
	setter! { inbox -> node <Self as ObjectMut>::Collection }
	setter! { outbox -> node <Self as ObjectMut>::Collection }
	setter! { following -> node <Self as ObjectMut>::Collection }
	setter! { followers -> node <Self as ObjectMut>::Collection }
	setter! { public_key::publicKey -> node Self::PublicKey }
	setter! { endpoints -> node <Self as ActorMut>::Endpoints }
}

impl Endpoints for serde_json::Value {
	getter! { shared_inbox::sharedInbox -> &str }
}

impl EndpointsMut for serde_json::Value {
	setter! { shared_inbox::sharedInbox -> &str }
}
