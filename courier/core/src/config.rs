#[serde_inline_default::serde_inline_default]
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, serde_default::DefaultFromSerde)]
pub struct Config {
	#[serde(default)]
	pub instance: InstanceConfig,

	#[serde(default)]
	pub security: SecurityConfig,

	#[serde(default)]
	pub compat: CompatibilityConfig,
}

#[serde_inline_default::serde_inline_default]
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, serde_default::DefaultFromSerde)]
pub struct InstanceConfig {
	#[serde_inline_default("courier".into())]
	pub name: String,

	#[serde_inline_default("example.net".into())]
	pub domain: String,

	#[serde(default)]
	pub contact: Option<String>,
}

#[serde_inline_default::serde_inline_default]
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, serde_default::DefaultFromSerde)]
pub struct SecurityConfig {
	// id documents may redirect to their canonical form, don't follow these forever
	#[serde_inline_default(4u32)]
	pub max_id_redirects: u32,

	// activitypub requires at least one level of collection expansion when resolving recipients
	#[serde_inline_default(1u32)]
	pub collection_expansion_depth: u32,

	#[serde(default)]
	pub strict_activity_types: bool,
}

#[serde_inline_default::serde_inline_default]
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize, serde_default::DefaultFromSerde)]
pub struct CompatibilityConfig {
	// deliver once per shared inbox instead of once per actor, when remote actors advertise one
	#[serde(default)]
	pub collapse_shared_inboxes: bool,
}
