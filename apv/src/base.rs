use crate::{getter, setter, strenum, Field, LinkType, ObjectType};

strenum! {
	pub enum BaseType {
		;
		Object(ObjectType),
		Link(LinkType)
	};
}

pub trait Base {
	fn id(&self) -> Field<&str>;
	fn base_type(&self) -> Field<BaseType>;
}

pub trait BaseMut {
	fn set_id(self, val: Option<&str>) -> Self;
	fn set_base_type(self, val: Option<BaseType>) -> Self;
}

impl Base for String {
	fn id(&self) -> Field<&str> {
		Ok(self)
	}

	fn base_type(&self) -> Field<BaseType> {
		Ok(BaseType::Link(LinkType::Link))
	}
}

impl Base for serde_json::Value {
	getter! { id -> &str }
	getter! { base_type -> type BaseType }
}

impl BaseMut for serde_json::Value {
	setter! { id -> &str }
	setter! { base_type -> type BaseType }
}
