use std::collections::HashSet;

use apv::{target::{Addressed, ADDRESSING}, Activity, ActivityMut, Base, BaseMut, Collection, CollectionMut, CollectionType, Node, Object, ObjectMut, ObjectType, Tombstone, TombstoneMut};

use crate::Context;
use super::fetch::{Fetcher, PullError};
use super::store::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum NormalizerError {
	#[error("document misses required field: {0:?}")]
	Malformed(#[from] apv::FieldErr),

	#[error("create object is not embedded, cannot reconcile addressing")]
	NotEmbedded,

	#[error("element in collection has no id and is not an IRI")]
	Unidentified,

	#[error("target is neither a Collection nor an OrderedCollection: {0}")]
	NotACollection(String),

	#[error("object {0} is not in the activity origin")]
	OriginMismatch(String),

	#[error("activity does not list all actors of its objects")]
	ActorMismatch,

	#[error("storage error while normalizing: {0:?}")]
	Storage(#[from] StorageError),

	#[error("failed resolving referenced resource: {0:?}")]
	Pull(#[from] PullError),
}

/// wrap a bare object in a Create carrying the same addressing and published time
pub fn wrap_in_create(object: serde_json::Value, actor: &str) -> serde_json::Value {
	let mut create = apv::new()
		.set_activity_type(Some(apv::ActivityType::Create))
		.set_actor(Node::link(actor.to_string()))
		.set_published(object.published().ok());
	for field in ADDRESSING {
		let ids = object.addressing(field);
		if !ids.is_empty() {
			create = create.set_addressing(field, ids);
		}
	}
	create.set_object(Node::object(object))
}

// append everything from `extra` that `base` doesn't already hold, keeping first
// occurrence order
fn union(base: Vec<String>, extra: impl IntoIterator<Item = String>) -> Vec<String> {
	let mut seen : HashSet<String> = base.iter().cloned().collect();
	let mut out = base;
	for id in extra {
		if seen.insert(id.clone()) {
			out.push(id);
		}
	}
	out
}

/// Reconcile addressing between a Create and its objects, in both directions: the
/// activity gains every recipient of every object, each object gains the activity's
/// own recipients. Objects never leak recipients into each other.
pub fn normalize_recipients(activity: serde_json::Value) -> Result<serde_json::Value, NormalizerError> {
	let mut objects = Vec::new();
	for node in activity.object().flat() {
		objects.push(node.extract().ok_or(NormalizerError::NotEmbedded)?);
	}

	let mut activity = activity;
	for field in ADDRESSING {
		let activity_ids = activity.addressing(field);

		let mut all_object_ids = Vec::new();
		for object in objects.iter_mut() {
			let object_ids = object.addressing(field);
			all_object_ids = union(all_object_ids, object_ids.iter().cloned());
			// objects receive the activity's recipients, not each other's
			let merged = union(object_ids, activity_ids.iter().cloned());
			*object = std::mem::take(object).set_addressing(field, merged);
		}

		let merged = union(activity_ids, all_object_ids);
		activity = activity.set_addressing(field, merged);
	}

	Ok(activity.set_object(Node::array(objects)))
}

/// drop `bto` and `bcc` before a payload goes on the wire (social api, section 6)
pub fn strip_hidden_recipients(mut activity: serde_json::Value) -> serde_json::Value {
	if let Some(map) = activity.as_object_mut() {
		map.remove("bto");
		map.remove("bcc");
	}
	activity
}

/// like [strip_hidden_recipients], but also descends into every embedded object
pub fn clear_sensitive_fields(value: serde_json::Value) -> serde_json::Value {
	let mut value = strip_hidden_recipients(value);
	if let Some(map) = value.as_object_mut() {
		if let Some(inner) = map.remove("object") {
			let cleared = match inner {
				serde_json::Value::Array(arr) => serde_json::Value::Array(
					arr.into_iter().map(clear_sensitive_fields).collect()
				),
				serde_json::Value::Object(_) => clear_sensitive_fields(inner),
				x => x,
			};
			map.insert("object".to_string(), cleared);
		}
	}
	value
}

/// deletion marker for an object, preserving its timestamps where present; deleting
/// something already deleted refreshes the deletion time and nothing else
pub fn to_tombstone(object: &serde_json::Value, id: &str, now: chrono::DateTime<chrono::Utc>) -> serde_json::Value {
	let former = match object.object_type() {
		Ok(ObjectType::Tombstone) => object.former_type().ok().map(|x| x.to_string()),
		Ok(x) => Some(x.as_ref().to_string()),
		Err(_) => None,
	};
	apv::new()
		.set_id(Some(id))
		.set_object_type(Some(ObjectType::Tombstone))
		.set_former_type(former.as_deref())
		.set_published(object.published().ok())
		.set_updated(object.updated().ok())
		.set_deleted(Some(now))
}

/// drop every element of `orderedItems` whose id was already seen, stable with
/// respect to first occurrence
pub fn dedupe_ordered_items(collection: serde_json::Value) -> Result<serde_json::Value, NormalizerError> {
	let mut seen : HashSet<String> = HashSet::new();
	let mut out = Vec::new();
	for node in collection.ordered_items().flat() {
		let id = node.id().map_err(|_| NormalizerError::Unidentified)?.to_string();
		if seen.insert(id) {
			out.push(serde_json::Value::from(node));
		}
	}
	Ok(collection.set_ordered_items(Node::from(serde_json::Value::Array(out))))
}

/// every inReplyTo, object, target and tag reference, split into embedded documents
/// and bare IRIs, as needed by the forwarding-from-inbox rule
pub fn inbox_forwarding_values(value: &serde_json::Value) -> (Vec<serde_json::Value>, Vec<String>) {
	let mut documents = Vec::new();
	let mut iris = Vec::new();
	for field in ["inReplyTo", "object", "target", "tag"] {
		let node = match value.get(field) {
			Some(x) => Node::from(x.clone()),
			None => Node::Empty,
		};
		for element in node.flat() {
			match element {
				Node::Link(link) => if let Ok(href) = link.href() {
					iris.push(href.to_string());
				},
				Node::Object(document) => documents.push(*document),
				_ => {},
			}
		}
	}
	(documents, iris)
}

/// the host of the activity id must be authoritative for every object id, as
/// required of Update and Delete
pub fn activity_origin_matches_objects(activity: &serde_json::Value) -> Result<(), NormalizerError> {
	let origin = Context::server(activity.id()?);
	for node in activity.object().flat() {
		let id = node.id()?.to_string();
		if Context::server(&id) != origin {
			return Err(NormalizerError::OriginMismatch(id));
		}
	}
	Ok(())
}

#[async_trait::async_trait]
pub trait Normalizer {
	/// every actor referenced by the activity's objects must appear among the
	/// activity's own actors; IRI-only objects are dereferenced to check
	async fn activity_actors_match_object_actors(&self, activity: &serde_json::Value, box_iri: &str) -> Result<(), NormalizerError>;

	/// append object ids to each owned target Collection or OrderedCollection
	async fn add_to_targets(&self, object_ids: &[String], target_ids: &[String]) -> Result<(), NormalizerError>;

	/// drop object ids from each owned target Collection or OrderedCollection
	async fn remove_from_targets(&self, object_ids: &[String], target_ids: &[String]) -> Result<(), NormalizerError>;
}

#[async_trait::async_trait]
impl Normalizer for Context {
	async fn activity_actors_match_object_actors(&self, activity: &serde_json::Value, box_iri: &str) -> Result<(), NormalizerError> {
		let declared : HashSet<String> = activity.actor().ids().into_iter().collect();
		for node in activity.object().flat() {
			let document = match node {
				Node::Object(x) => *x,
				Node::Link(link) => self.resolve(link.href()?, box_iri).await?,
				_ => continue,
			};
			let object_actors = document.actor();
			if object_actors.is_nothing() {
				return Err(NormalizerError::Malformed(apv::FieldErr("actor")));
			}
			for id in object_actors.ids() {
				if !declared.contains(&id) {
					return Err(NormalizerError::ActorMismatch);
				}
			}
		}
		Ok(())
	}

	async fn add_to_targets(&self, object_ids: &[String], target_ids: &[String]) -> Result<(), NormalizerError> {
		for target in target_ids {
			let _guard = self.db().lock(target).await?;
			if !self.db().owns(target).await? {
				continue;
			}
			let collection = self.db().get(target).await?;
			let updated = match collection.collection_type() {
				Ok(CollectionType::OrderedCollection | CollectionType::OrderedCollectionPage) => {
					let mut items : Vec<serde_json::Value> = collection.ordered_items().flat()
						.into_iter()
						.map(serde_json::Value::from)
						.collect();
					items.extend(object_ids.iter().map(|x| serde_json::Value::String(x.clone())));
					collection.set_ordered_items(Node::from(serde_json::Value::Array(items)))
				},
				Ok(CollectionType::Collection | CollectionType::CollectionPage) => {
					let mut items : Vec<serde_json::Value> = collection.items().flat()
						.into_iter()
						.map(serde_json::Value::from)
						.collect();
					items.extend(object_ids.iter().map(|x| serde_json::Value::String(x.clone())));
					collection.set_items(Node::from(serde_json::Value::Array(items)))
				},
				_ => return Err(NormalizerError::NotACollection(target.clone())),
			};
			self.db().update(updated).await?;
		}
		Ok(())
	}

	async fn remove_from_targets(&self, object_ids: &[String], target_ids: &[String]) -> Result<(), NormalizerError> {
		let removing : HashSet<&str> = object_ids.iter().map(|x| x.as_str()).collect();
		for target in target_ids {
			let _guard = self.db().lock(target).await?;
			if !self.db().owns(target).await? {
				continue;
			}
			let collection = self.db().get(target).await?;
			let filter = |nodes: Vec<Node<serde_json::Value>>| -> Result<Vec<serde_json::Value>, NormalizerError> {
				let mut kept = Vec::new();
				for node in nodes {
					let id = node.id().map_err(|_| NormalizerError::Unidentified)?.to_string();
					if !removing.contains(id.as_str()) {
						kept.push(serde_json::Value::from(node));
					}
				}
				Ok(kept)
			};
			let updated = match collection.collection_type() {
				Ok(CollectionType::OrderedCollection | CollectionType::OrderedCollectionPage) => {
					let kept = filter(collection.ordered_items().flat())?;
					collection.set_ordered_items(Node::from(serde_json::Value::Array(kept)))
				},
				Ok(CollectionType::Collection | CollectionType::CollectionPage) => {
					let kept = filter(collection.items().flat())?;
					collection.set_items(Node::from(serde_json::Value::Array(kept)))
				},
				_ => return Err(NormalizerError::NotACollection(target.clone())),
			};
			self.db().update(updated).await?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use apv::target::{Addressed, ADDRESSING};
	use apv::{Activity, Base, Object, Tombstone};

	use super::*;

	#[test]
	fn wrapping_copies_addressing_and_published() {
		let note = serde_json::json!({
			"type": "Note",
			"content": "hi",
			"published": "2024-04-13T13:36:23Z",
			"to": ["https://b.example/b"],
			"bcc": ["https://c.example/c"],
		});
		let create = wrap_in_create(note, "https://a.example/a");
		assert_eq!(create.activity_type().unwrap(), apv::ActivityType::Create);
		assert_eq!(create.actor().id().unwrap(), "https://a.example/a");
		assert_eq!(create.addressing("to"), vec!["https://b.example/b".to_string()]);
		assert_eq!(create.addressing("bcc"), vec!["https://c.example/c".to_string()]);
		assert!(create.published().is_ok());
		assert_eq!(create.object().get().unwrap().content().unwrap(), "hi");
	}

	#[test]
	fn normalized_create_has_symmetric_addressing() {
		let activity = serde_json::json!({
			"type": "Create",
			"actor": "https://a.example/a",
			"to": ["https://b.example/b"],
			"cc": ["https://c.example/c"],
			"object": [
				{"type": "Note", "to": ["https://d.example/d"]},
				{"type": "Note", "cc": ["https://e.example/e"]},
			],
		});
		let normalized = normalize_recipients(activity).unwrap();
		for field in ADDRESSING {
			let mut on_activity = normalized.addressing(field);
			on_activity.sort();
			let mut on_objects : Vec<String> = normalized.object()
				.flat()
				.into_iter()
				.flat_map(|x| x.extract().map(|o| o.addressing(field)).unwrap_or_default())
				.collect();
			on_objects.sort();
			on_objects.dedup();
			assert_eq!(on_activity, on_objects, "asymmetric '{field}' after normalization");
		}
		// objects do not leak recipients into each other
		let first = normalized.object().flat()[0].get().unwrap().addressing("to").clone();
		assert!(first.contains(&"https://b.example/b".to_string()));
		assert!(first.contains(&"https://d.example/d".to_string()));
	}

	#[test]
	fn iri_only_create_object_is_rejected() {
		let activity = serde_json::json!({
			"type": "Create",
			"actor": "https://a.example/a",
			"object": "https://a.example/note/1",
		});
		assert!(matches!(normalize_recipients(activity), Err(NormalizerError::NotEmbedded)));
	}

	#[test]
	fn sensitive_fields_clear_recursively() {
		let activity = serde_json::json!({
			"type": "Create",
			"bto": ["https://x.example/x"],
			"bcc": ["https://y.example/y"],
			"object": {
				"type": "Note",
				"bto": ["https://x.example/x"],
				"bcc": ["https://y.example/y"],
			},
		});
		let cleared = clear_sensitive_fields(activity);
		assert!(cleared.get("bto").is_none());
		assert!(cleared.get("bcc").is_none());
		assert!(cleared["object"].get("bto").is_none());
		assert!(cleared["object"].get("bcc").is_none());
	}

	#[test]
	fn tombstones_keep_timestamps_and_former_type() {
		let note = serde_json::json!({
			"id": "https://a.example/note/7",
			"type": "Note",
			"published": "2024-04-13T13:36:23Z",
			"updated": "2024-04-14T10:00:00Z",
		});
		let now = chrono::Utc::now();
		let tomb = to_tombstone(&note, "https://a.example/note/7", now);
		assert_eq!(tomb.former_type().unwrap(), "Note");
		assert!(tomb.published().is_ok());
		assert!(tomb.updated().is_ok());
		assert!(tomb.deleted().is_ok());
		// deleting the tombstone again yields the same tombstone
		let again = to_tombstone(&tomb, "https://a.example/note/7", now);
		assert_eq!(again.former_type().unwrap(), "Note");
		assert_eq!(again, tomb);
	}

	#[test]
	fn ordered_items_dedupe_is_stable() {
		let collection = serde_json::json!({
			"type": "OrderedCollection",
			"orderedItems": [
				"https://a.example/act/1",
				{"id": "https://a.example/act/2", "type": "Create"},
				"https://a.example/act/1",
				"https://a.example/act/3",
			],
		});
		let deduped = dedupe_ordered_items(collection).unwrap();
		let ids = deduped.ordered_items().ids();
		assert_eq!(ids, vec![
			"https://a.example/act/1".to_string(),
			"https://a.example/act/2".to_string(),
			"https://a.example/act/3".to_string(),
		]);
	}

	#[test]
	fn unidentified_ordered_items_are_an_error() {
		let collection = serde_json::json!({
			"type": "OrderedCollection",
			"orderedItems": [{"type": "Note", "content": "no id"}],
		});
		assert!(matches!(dedupe_ordered_items(collection), Err(NormalizerError::Unidentified)));
	}

	#[test]
	fn origin_check_rejects_cross_host_objects() {
		let activity = serde_json::json!({
			"id": "https://a.example/act/1",
			"type": "Update",
			"object": "https://b.example/note/7",
		});
		assert!(matches!(
			activity_origin_matches_objects(&activity),
			Err(NormalizerError::OriginMismatch(_)),
		));

		let same_origin = serde_json::json!({
			"id": "https://a.example/act/1",
			"type": "Update",
			"object": "https://a.example/note/7",
		});
		assert!(activity_origin_matches_objects(&same_origin).is_ok());
	}

	#[test]
	fn forwarding_values_partition_documents_and_iris() {
		let activity = serde_json::json!({
			"type": "Create",
			"object": {
				"id": "https://c.example/note/9",
				"type": "Note",
			},
			"target": "https://a.example/coll/1",
			"tag": [{"type": "Mention", "href": "https://a.example/a"}],
		});
		let (documents, iris) = inbox_forwarding_values(&activity);
		assert_eq!(documents.len(), 1);
		assert_eq!(documents[0].id().unwrap(), "https://c.example/note/9");
		assert!(iris.contains(&"https://a.example/coll/1".to_string()));
		assert!(iris.contains(&"https://a.example/a".to_string()));
	}
}
