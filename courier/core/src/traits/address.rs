use std::collections::HashSet;

use apv::{Actor, Collection, Endpoints, Object, ObjectType};

use crate::Context;
use super::fetch::{Fetcher, PullError};

#[async_trait::async_trait]
pub trait Addresser {
	/// Expand addressing ids into concrete inbox IRIs: the public collection is
	/// filtered out, collections are expanded up to the configured depth, shared
	/// inboxes collapse when enabled, and everything in `ignored` is dropped.
	/// Individual recipients that fail to resolve are logged and skipped.
	async fn resolve_recipients(&self, targets: &[String], box_iri: &str, ignored: &[String]) -> Result<Vec<String>, PullError>;
}

#[async_trait::async_trait]
impl Addresser for Context {
	async fn resolve_recipients(&self, targets: &[String], box_iri: &str, ignored: &[String]) -> Result<Vec<String>, PullError> {
		let mut queue : Vec<(String, u32)> = Vec::new();
		let mut queued : HashSet<String> = HashSet::new();
		for target in targets {
			if apv::target::is_public(target) {
				continue;
			}
			if queued.insert(target.clone()) {
				queue.push((target.clone(), 0));
			}
		}

		let ignored : HashSet<&str> = ignored.iter().map(|x| x.as_str()).collect();
		let mut out = Vec::new();
		let mut delivered : HashSet<String> = HashSet::new();

		while let Some((target, depth)) = queue.pop() {
			let document = match self.resolve(&target, box_iri).await {
				Ok(x) => x,
				Err(e) => {
					tracing::warn!("failed resolving recipient {target}: {e}, skipping");
					continue;
				},
			};

			match document.object_type() {
				Ok(ObjectType::Actor(_)) => {
					let inbox = if self.cfg().compat.collapse_shared_inboxes {
						document.endpoints()
							.get()
							.and_then(|x| x.shared_inbox().ok().map(|x| x.to_string()))
							.or_else(|| document.inbox().id().ok().map(|x| x.to_string()))
					} else {
						document.inbox().id().ok().map(|x| x.to_string())
					};
					match inbox {
						Some(inbox) => {
							if !ignored.contains(inbox.as_str()) && delivered.insert(inbox.clone()) {
								out.push(inbox);
							}
						},
						None => tracing::warn!("recipient {target} has no inbox, skipping"),
					}
				},
				Ok(ObjectType::Collection(_)) => {
					if depth >= self.cfg().security.collection_expansion_depth {
						tracing::warn!("not expanding collection {target}, depth limit reached");
						continue;
					}
					let mut members = document.items().ids();
					members.append(&mut document.ordered_items().ids());
					for member in members {
						if queued.insert(member.clone()) {
							queue.push((member, depth + 1));
						}
					}
				},
				Ok(other) => tracing::warn!("recipient {target} is a {:?}, cannot deliver to it", other),
				Err(e) => tracing::warn!("recipient {target} has no type ({e}), skipping"),
			}
		}

		Ok(out)
	}
}
