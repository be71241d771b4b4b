mod macros;
pub(crate) use macros::{strenum, getter, setter};

mod field;
pub use field::{Field, FieldErr};

mod node;
pub use node::Node;

mod link;
pub use link::{Link, LinkMut, LinkType};

mod key;
pub use key::{PublicKey, PublicKeyMut};

mod base;
pub use base::{Base, BaseMut, BaseType};

mod object;
pub use object::{
	Object, ObjectMut, ObjectType,
	activity::{
		Activity, ActivityMut, ActivityType,
		accept::AcceptType,
		reject::RejectType,
	},
	actor::{Actor, ActorMut, ActorType, Endpoints, EndpointsMut},
	collection::{Collection, CollectionMut, CollectionType},
	tombstone::{Tombstone, TombstoneMut},
};

pub mod target;
pub mod jsonld;
pub use jsonld::LD;

/// an empty json object, starting point to build any value with the *Mut traits
pub fn new() -> serde_json::Value {
	serde_json::Value::Object(serde_json::Map::default())
}
