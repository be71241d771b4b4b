use crate::Context;
use crate::traits::process::{Processor, ProcessorError};

/// Thin per-protocol entry point over the processor: actors may speak the
/// federation protocol, the social api, or both, and posts over a protocol the
/// actor doesn't speak are refused before anything else happens.
#[derive(Clone)]
pub struct ProtocolActor {
	ctx: Context,
	federated: bool,
	social: bool,
}

impl ProtocolActor {
	/// server-to-server only
	pub fn federating(ctx: Context) -> Self {
		ProtocolActor { ctx, federated: true, social: false }
	}

	/// client-to-server only
	pub fn social(ctx: Context) -> Self {
		ProtocolActor { ctx, federated: false, social: true }
	}

	pub fn full(ctx: Context) -> Self {
		ProtocolActor { ctx, federated: true, social: true }
	}

	pub fn context(&self) -> &Context {
		&self.ctx
	}

	pub async fn post_inbox(&self, inbox: &str, activity: serde_json::Value) -> Result<(), ProcessorError> {
		if !self.federated {
			return Err(ProcessorError::NotEnabled);
		}
		self.ctx.post_inbox(inbox, activity).await
	}

	pub async fn post_outbox(&self, outbox: &str, value: serde_json::Value, actor: &str) -> Result<String, ProcessorError> {
		if !self.social {
			return Err(ProcessorError::NotEnabled);
		}
		self.ctx.post_outbox(outbox, value, actor).await
	}
}
