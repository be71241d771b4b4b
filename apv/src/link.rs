use crate::{Field, FieldErr, getter, setter, strenum};

strenum! {
	pub enum LinkType {
		Link,
		Mention;
	};
}

pub trait Link {
	fn href(&self) -> Field<&str>;
	fn link_type(&self) -> Field<LinkType> { Err(FieldErr("type")) }
	fn rel(&self) -> Field<&str> { Err(FieldErr("rel")) }
	fn name(&self) -> Field<&str> { Err(FieldErr("name")) }
	fn media_type(&self) -> Field<&str> { Err(FieldErr("mediaType")) }
}

pub trait LinkMut {
	fn set_href(self, href: Option<&str>) -> Self;
	fn set_link_type(self, val: Option<LinkType>) -> Self;
	fn set_rel(self, val: Option<&str>) -> Self;
	fn set_name(self, val: Option<&str>) -> Self;
	fn set_media_type(self, val: Option<&str>) -> Self;
}

impl Link for String {
	fn href(&self) -> Field<&str> {
		Ok(self)
	}
}

impl Link for serde_json::Value {
	getter! { link_type -> type LinkType }
	getter! { rel -> &str }
	getter! { name -> &str }
	getter! { media_type::mediaType -> &str }

	// links may be bare strings or objects with an href
	fn href(&self) -> Field<&str> {
		match self {
			serde_json::Value::String(x) => Ok(x),
			serde_json::Value::Object(_) =>
				self.get("href")
					.and_then(|x| x.as_str())
					.ok_or(FieldErr("href")),
			_ => Err(FieldErr("href")),
		}
	}
}

impl LinkMut for serde_json::Value {
	setter! { link_type -> type LinkType }
	setter! { rel -> &str }
	setter! { name -> &str }
	setter! { media_type::mediaType -> &str }

	fn set_href(mut self, href: Option<&str>) -> Self {
		crate::macros::set_maybe_value(
			&mut self, "href", href.map(|x| serde_json::Value::String(x.to_string()))
		);
		self
	}
}
