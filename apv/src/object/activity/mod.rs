pub mod accept;
pub mod reject;

use crate::{getter, setter, strenum, Node};

use super::{Object, ObjectMut};
use accept::AcceptType;
use reject::RejectType;

strenum! {
	pub enum ActivityType {
		Activity,
		Add,
		Announce,
		Block,
		Create,
		Delete,
		Follow,
		Like,
		Remove,
		Undo,
		Update;

		Accept(AcceptType),
		Reject(RejectType)
	};
}

pub trait Activity : Object {
	fn activity_type(&self) -> crate::Field<ActivityType>;
	fn actor(&self) -> Node<<Self as Object>::Actor>;
	fn object(&self) -> Node<<Self as Object>::Object>;
	fn target(&self) -> Node<<Self as Object>::Object>;
}

pub trait ActivityMut : ObjectMut {
	fn set_activity_type(self, val: Option<ActivityType>) -> Self;
	fn set_actor(self, val: Node<<Self as ObjectMut>::Actor>) -> Self;
	fn set_object(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
	fn set_target(self, val: Node<<Self as ObjectMut>::Object>) -> Self;
}

impl Activity for serde_json::Value {
	getter! { activity_type -> type ActivityType }
	getter! { actor -> node <Self as Object>::Actor }
	getter! { object -> node <Self as Object>::Object }
	getter! { target -> node <Self as Object>::Object }
}

impl ActivityMut for serde_json::Value {
	setter! { activity_type -> type ActivityType }
	setter! { actor -> node <Self as ObjectMut>::Actor }
	setter! { object -> node <Self as ObjectMut>::Object }
	setter! { target -> node <Self as ObjectMut>::Object }
}
