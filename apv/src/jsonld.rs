pub const ACTIVITYSTREAMS_VOCAB : &str = "https://www.w3.org/ns/activitystreams";
pub const SECURITY_VOCAB : &str = "https://w3id.org/security/v1";

pub const CONTENT_TYPE_ACTIVITY_JSON : &str = "application/activity+json";
pub const CONTENT_TYPE_LD_JSON_ACTIVITYPUB : &str = "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

// the http spec is ambiguous about whitespace around media type parameters, so rather than a
// full parser we accept a tolerable amount of variants
const ACTIVITYPUB_MEDIA_TYPES : [&str; 9] = [
	"application/activity+json",
	"application/ld+json;profile=https://www.w3.org/ns/activitystreams",
	"application/ld+json;profile=\"https://www.w3.org/ns/activitystreams\"",
	"application/ld+json ;profile=https://www.w3.org/ns/activitystreams",
	"application/ld+json ;profile=\"https://www.w3.org/ns/activitystreams\"",
	"application/ld+json ; profile=https://www.w3.org/ns/activitystreams",
	"application/ld+json ; profile=\"https://www.w3.org/ns/activitystreams\"",
	"application/ld+json; profile=https://www.w3.org/ns/activitystreams",
	"application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"",
];

pub fn is_activity_pub_content_type(header: &str) -> bool {
	ACTIVITYPUB_MEDIA_TYPES.iter().any(|x| header.contains(x))
}

/// assemble a `@context` value out of (vocabulary, alias) bindings, where an empty alias
/// means the vocabulary is not aliased
pub fn context_value(bindings: &[(&str, &str)]) -> serde_json::Value {
	match bindings {
		[] => serde_json::Value::Null,
		[(vocab, "")] => serde_json::Value::String(vocab.to_string()),
		[(vocab, alias)] => {
			let mut map = serde_json::Map::new();
			map.insert(alias.to_string(), serde_json::Value::String(vocab.to_string()));
			serde_json::Value::Object(map)
		},
		many => {
			let mut arr = Vec::new();
			let mut aliases = serde_json::Map::new();
			for (vocab, alias) in many {
				if alias.is_empty() {
					arr.push(serde_json::Value::String(vocab.to_string()));
				} else {
					aliases.insert(alias.to_string(), serde_json::Value::String(vocab.to_string()));
				}
			}
			if !aliases.is_empty() {
				arr.push(serde_json::Value::Object(aliases));
			}
			serde_json::Value::Array(arr)
		},
	}
}

/// delete `@context` keys in nested maps, only the root document carries one
pub fn strip_nested_context(value: &mut serde_json::Value) {
	match value {
		serde_json::Value::Object(map) => {
			for (_, v) in map.iter_mut() {
				if let Some(inner) = v.as_object_mut() {
					inner.remove("@context");
				}
				strip_nested_context(v);
			}
		},
		serde_json::Value::Array(arr) => {
			for v in arr.iter_mut() {
				if let Some(inner) = v.as_object_mut() {
					inner.remove("@context");
				}
				strip_nested_context(v);
			}
		},
		_ => {},
	}
}

pub trait LD {
	fn ld_context(self) -> Self;
	fn ld_context_with(self, bindings: &[(&str, &str)]) -> Self;
}

impl LD for serde_json::Value {
	fn ld_context(self) -> Self {
		self.ld_context_with(&[(ACTIVITYSTREAMS_VOCAB, ""), (SECURITY_VOCAB, "")])
	}

	fn ld_context_with(mut self, bindings: &[(&str, &str)]) -> Self {
		strip_nested_context(&mut self);
		if let Some(map) = self.as_object_mut() {
			map.insert("@context".to_string(), context_value(bindings));
		} else {
			tracing::warn!("cannot add @context to json value which is not an object");
		}
		self
	}
}
