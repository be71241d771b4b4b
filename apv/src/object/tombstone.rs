use crate::{getter, setter};

pub trait Tombstone : super::Object {
	fn former_type(&self) -> crate::Field<&str> { Err(crate::FieldErr("formerType")) }
	fn deleted(&self) -> crate::Field<chrono::DateTime<chrono::Utc>> { Err(crate::FieldErr("deleted")) }
}

pub trait TombstoneMut : super::ObjectMut {
	fn set_former_type(self, val: Option<&str>) -> Self;
	fn set_deleted(self, val: Option<chrono::DateTime<chrono::Utc>>) -> Self;
}

impl Tombstone for serde_json::Value {
	getter! { former_type::formerType -> &str }
	getter! { deleted -> chrono::DateTime<chrono::Utc> }
}

impl TombstoneMut for serde_json::Value {
	setter! { former_type::formerType -> &str }
	setter! { deleted -> chrono::DateTime<chrono::Utc> }
}
