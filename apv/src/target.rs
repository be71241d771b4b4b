use crate::Object;

pub const PUBLIC : &str = "https://www.w3.org/ns/activitystreams#Public";

// json-ld documents may shorten the public IRI through the activitystreams context
const PUBLIC_COMPACT : &str = "Public";
const PUBLIC_ALIASED : &str = "as:Public";

/// all five addressing properties
pub const ADDRESSING : [&str; 5] = ["to", "bto", "cc", "bcc", "audience"];

pub fn is_public(target: &str) -> bool {
	target == PUBLIC || target == PUBLIC_COMPACT || target == PUBLIC_ALIASED
}

pub trait Addressed {
	/// union of to, bto, cc, bcc and audience, in order, duplicates included
	fn addressed(&self) -> Vec<String>;
	/// ids of one addressing property, by its json name
	fn addressing(&self, field: &str) -> Vec<String>;
	/// overwrite one addressing property, by its json name
	fn set_addressing(self, field: &str, ids: Vec<String>) -> Self;
}

impl Addressed for serde_json::Value {
	fn addressed(&self) -> Vec<String> {
		let mut to : Vec<String> = self.to().ids();
		to.append(&mut self.bto().ids());
		to.append(&mut self.cc().ids());
		to.append(&mut self.bcc().ids());
		to.append(&mut self.audience().ids());
		to
	}

	fn addressing(&self, field: &str) -> Vec<String> {
		match field {
			"to" => self.to().ids(),
			"bto" => self.bto().ids(),
			"cc" => self.cc().ids(),
			"bcc" => self.bcc().ids(),
			"audience" => self.audience().ids(),
			_ => Vec::new(),
		}
	}

	fn set_addressing(mut self, field: &str, ids: Vec<String>) -> Self {
		if let Some(map) = self.as_object_mut() {
			map.insert(
				field.to_string(),
				serde_json::Value::Array(
					ids.into_iter().map(serde_json::Value::String).collect()
				),
			);
		}
		self
	}
}

#[cfg(test)]
mod test {
	use super::{Addressed, is_public};

	#[test]
	fn public_iri_matches_all_compact_forms() {
		assert!(is_public("https://www.w3.org/ns/activitystreams#Public"));
		assert!(is_public("Public"));
		assert!(is_public("as:Public"));
		assert!(!is_public("https://example.net/actors/someone"));
	}

	#[test]
	fn addressed_unions_all_five_properties() {
		let value = serde_json::json!({
			"to": ["https://a.example/a"],
			"bto": "https://b.example/b",
			"cc": ["https://c.example/c"],
			"bcc": ["https://d.example/d"],
			"audience": ["https://e.example/e"],
		});
		assert_eq!(value.addressed(), vec![
			"https://a.example/a".to_string(),
			"https://b.example/b".to_string(),
			"https://c.example/c".to_string(),
			"https://d.example/d".to_string(),
			"https://e.example/e".to_string(),
		]);
	}
}
