use apv::{target::Addressed, Activity, ActivityMut, ActivityType, Actor, Base, BaseMut, Collection, CollectionMut, Node, Object, ObjectMut, ObjectType, LD};

use crate::Context;
use super::address::Addresser;
use super::app::{FollowPolicy, PolicyError};
use super::fetch::PullError;
use super::normalize::{self, Normalizer, NormalizerError};
use super::store::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
	#[error("processed activity misses required field: {0:?}")]
	Malformed(#[from] apv::FieldErr),

	#[error("object property required on the provided activity")]
	ObjectRequired,

	#[error("target property required on the provided activity")]
	TargetRequired,

	#[error("actor is not authorized to carry out this activity")]
	Unauthorized,

	#[error("activity {0} not processable by this application")]
	Unprocessable(String),

	#[error("this protocol is not enabled on this actor")]
	NotEnabled,

	#[error("failed serializing payload: {0:?}")]
	Json(#[from] serde_json::Error),

	#[error("storage error while processing: {0:?}")]
	Storage(#[from] StorageError),

	#[error("application policy refused this activity: {0}")]
	Policy(#[from] PolicyError),

	#[error("failed normalizing activity: {0:?}")]
	Normalizer(#[from] NormalizerError),

	#[error("could not resolve resources involved in this activity: {0:?}")]
	Pull(#[from] PullError),
}

/// The protocol state machine. `post_inbox` drives server-to-server receipt,
/// `post_outbox` drives client-to-server submission; both apply the side effects
/// the ActivityPub spec mandates, in its order.
#[async_trait::async_trait]
pub trait Processor {
	async fn post_inbox(&self, inbox: &str, activity: serde_json::Value) -> Result<(), ProcessorError>;

	/// returns the id of the committed activity
	async fn post_outbox(&self, outbox: &str, value: serde_json::Value, actor: &str) -> Result<String, ProcessorError>;
}

fn push_ordered_item(collection: serde_json::Value, id: &str) -> serde_json::Value {
	let mut items : Vec<serde_json::Value> = collection.ordered_items()
		.flat()
		.into_iter()
		.map(serde_json::Value::from)
		.collect();
	items.push(serde_json::Value::String(id.to_string()));
	collection.set_ordered_items(Node::from(serde_json::Value::Array(items)))
}

#[async_trait::async_trait]
impl Processor for Context {
	async fn post_inbox(&self, inbox: &str, activity: serde_json::Value) -> Result<(), ProcessorError> {
		let aid = activity.id()?.to_string();
		let actors = activity.actor().ids();
		if actors.is_empty() {
			return Err(ProcessorError::Malformed(apv::FieldErr("actor")));
		}

		if self.app().blocked(&actors).await? {
			return Err(ProcessorError::Policy(PolicyError::Forbidden));
		}

		// Dedupe and claim under the inbox lock: the duplicate check and the append
		// commit together, so a replayed activity can never reapply side effects. The
		// lock drops before anything touches the network.
		{
			let _guard = self.db().lock(inbox).await?;
			if self.db().inbox_contains(inbox, &aid).await? {
				tracing::debug!("already processed {aid}, skipping");
				return Ok(());
			}
			let collection = self.db().get(inbox).await?;
			self.db().update(push_ordered_item(collection, &aid)).await?;
		}

		// activitypub section 7.1.2, forwarding from inbox happens before the side effect
		if let Err(e) = inbox_forwarding(self, inbox, &activity).await {
			tracing::warn!("inbox forwarding failed for {aid}: {e}");
		}

		match dispatch_inbox(self, inbox, &activity).await {
			Ok(()) => {},
			Err(ProcessorError::Unprocessable(id)) if !self.cfg().security.strict_activity_types => {
				tracing::debug!("no built-in side effect for {id}, surfacing to application");
			},
			Err(e) => return Err(e),
		}

		self.app().on_activity(&activity).await?;
		Ok(())
	}

	async fn post_outbox(&self, outbox: &str, value: serde_json::Value, actor: &str) -> Result<String, ProcessorError> {
		// bare objects wrap into a Create, as the social api requires
		let mut activity = match value.object_type()? {
			ObjectType::Activity(_) => value,
			_ => normalize::wrap_in_create(value, actor),
		};

		if activity.id().is_err() {
			let aid = self.db().new_id(&activity).await?;
			activity = activity.set_id(Some(&aid));
		}
		if activity.actor().id().is_err() {
			activity = activity.set_actor(Node::link(actor.to_string()));
		}
		if activity.published().is_err() {
			activity = activity.set_published(Some(self.now()));
		}

		let activity_type = activity.activity_type()?;

		if matches!(activity_type, ActivityType::Create) {
			let mut objects = Vec::new();
			for node in activity.object().flat() {
				match node {
					Node::Object(document) => {
						let mut document = *document;
						if document.id().is_err() {
							let oid = self.db().new_id(&document).await?;
							document = document.set_id(Some(&oid));
						}
						if document.attributed_to().id().is_err() {
							document = document.set_attributed_to(Node::link(actor.to_string()));
						}
						objects.push(document);
					},
					node => objects.push(serde_json::Value::from(node)),
				}
			}
			activity = activity.set_object(Node::from(serde_json::Value::Array(objects)));
			activity = normalize::normalize_recipients(activity)?;
		}

		dispatch_outbox(self, &activity, actor).await?;

		let aid = activity.id()?.to_string();
		{
			let _guard = self.db().lock(outbox).await?;
			let collection = self.db().get(outbox).await?;
			self.db().update(push_ordered_item(collection, &aid)).await?;
		}

		// delivery is post-commit and best effort: failures are reported in the log,
		// the committed activity stays committed
		if matches!(activity_type, ActivityType::Block) {
			tracing::debug!("never delivering Block activity {aid} to the fediverse");
		} else {
			let targets = activity.addressed();
			let wire = normalize::clear_sensitive_fields(activity.clone()).ld_context();
			let payload = serde_json::to_vec(&wire)?;
			let own_inbox = self.db().inbox_for_actor(actor).await?;
			let recipients = self.resolve_recipients(&targets, outbox, &[own_inbox]).await?;
			if !recipients.is_empty() {
				let transport = self.transport(outbox).await.map_err(PullError::Request)?;
				if let Err(e) = transport.batch_deliver(&payload, &recipients).await {
					tracing::warn!("outbox delivery incomplete for {aid}: {e}");
				}
			}
		}

		self.app().on_activity(&activity).await?;
		Ok(aid)
	}
}

async fn dispatch_inbox(ctx: &Context, inbox: &str, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let activity_type = match activity.activity_type() {
		Ok(x) => x,
		// a type we don't know still committed to the inbox, surface it instead of
		// failing, unless there is no type at all
		Err(e) => return match activity.get("type") {
			Some(_) => Err(ProcessorError::Unprocessable(activity.id()?.to_string())),
			None => Err(e.into()),
		},
	};
	match activity_type {
		ActivityType::Create => create(ctx, activity).await,
		ActivityType::Update => {
			normalize::activity_origin_matches_objects(activity)?;
			update(ctx, activity).await
		},
		ActivityType::Delete => {
			normalize::activity_origin_matches_objects(activity)?;
			delete(ctx, activity).await
		},
		ActivityType::Follow => follow(ctx, inbox, activity).await,
		ActivityType::Accept(_) => accept(ctx, activity).await,
		ActivityType::Reject(_) => {
			tracing::debug!("follow request was rejected by {}", activity.actor().id().unwrap_or_default());
			Ok(())
		},
		ActivityType::Add => add(ctx, activity).await,
		ActivityType::Remove => remove(ctx, activity).await,
		ActivityType::Like => like(ctx, activity).await,
		ActivityType::Announce => announce(ctx, activity).await,
		ActivityType::Undo => {
			undoer_must_own_inner(ctx, activity, inbox).await?;
			let local_actor = ctx.db().actor_for_inbox(inbox).await?;
			undo(ctx, &local_actor, activity, UndoSide::Server).await
		},
		// a federated Block mandates nothing here, whom the sender blocks is their
		// own business
		ActivityType::Block => Ok(()),
		_ => Err(ProcessorError::Unprocessable(activity.id()?.to_string())),
	}
}

async fn dispatch_outbox(ctx: &Context, activity: &serde_json::Value, actor: &str) -> Result<(), ProcessorError> {
	match activity.activity_type()? {
		ActivityType::Create => create(ctx, activity).await,
		ActivityType::Update => update_owned(ctx, activity, actor).await,
		ActivityType::Delete => delete(ctx, activity).await,
		ActivityType::Follow => {
			// keep it on record so an incoming Accept can be matched by id
			Ok(ctx.db().create(activity.clone()).await?)
		},
		ActivityType::Accept(_) => accept_owned(ctx, activity, actor).await,
		ActivityType::Reject(_) => Ok(ctx.db().create(activity.clone()).await?),
		ActivityType::Add => add(ctx, activity).await,
		ActivityType::Remove => remove(ctx, activity).await,
		ActivityType::Like => like(ctx, activity).await,
		ActivityType::Announce => announce(ctx, activity).await,
		ActivityType::Undo => {
			let box_iri = ctx.db().inbox_for_actor(actor).await?;
			undoer_must_own_inner(ctx, activity, &box_iri).await?;
			undo(ctx, actor, activity, UndoSide::Client).await
		},
		ActivityType::Block => Ok(ctx.db().create(activity.clone()).await?),
		_ => Err(ProcessorError::Unprocessable(activity.id()?.to_string())),
	}
}

/// activitypub section 7.1.2: when an activity addresses a collection this server owns, the
/// sender is remote, and the referenced thread is nowhere to be found locally, the
/// server re-delivers the activity verbatim to that collection's members
async fn inbox_forwarding(ctx: &Context, inbox: &str, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let mut owned_collections = Vec::new();
	for target in activity.addressed() {
		if apv::target::is_public(&target) {
			continue;
		}
		if ctx.db().owns(&target).await? {
			let document = ctx.db().get(&target).await?;
			if matches!(document.object_type(), Ok(ObjectType::Collection(_))) {
				owned_collections.push(document);
			}
		}
	}
	if owned_collections.is_empty() {
		return Ok(());
	}

	for actor in activity.actor().ids() {
		if ctx.db().owns(&actor).await? {
			return Ok(());
		}
	}

	let (documents, iris) = normalize::inbox_forwarding_values(activity);
	for document in &documents {
		if let Ok(id) = document.id() {
			if ctx.db().exists(id).await? {
				return Ok(());
			}
		}
	}
	for iri in &iris {
		if ctx.db().exists(iri).await? {
			return Ok(());
		}
	}

	let mut members = Vec::new();
	for collection in owned_collections {
		members.append(&mut collection.items().ids());
		members.append(&mut collection.ordered_items().ids());
	}
	let recipients = ctx.resolve_recipients(&members, inbox, &[inbox.to_string()]).await?;
	if recipients.is_empty() {
		return Ok(());
	}

	tracing::info!("forwarding {} to {} recipients", activity.id().unwrap_or_default(), recipients.len());
	let payload = serde_json::to_vec(&activity.clone().ld_context())?;
	let transport = ctx.transport(inbox).await.map_err(PullError::Request)?;
	if let Err(e) = transport.batch_deliver(&payload, &recipients).await {
		tracing::warn!("could not forward to every recipient: {e}");
	}

	Ok(())
}

pub async fn create(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let nodes = activity.object().flat();
	if nodes.is_empty() {
		return Err(ProcessorError::ObjectRequired);
	}
	// objects first, then the activity itself
	for node in nodes {
		match node {
			Node::Object(document) => ctx.db().create(*document).await?,
			Node::Link(link) => tracing::debug!(
				"skipping non-embedded object {} of Create",
				link.href().unwrap_or_default(),
			),
			_ => {},
		}
	}
	ctx.db().create(activity.clone()).await?;
	Ok(())
}

// shallow merge: keys present in the payload override the stored ones, an explicit
// null deletes the key
fn merge_fields(current: serde_json::Value, incoming: &serde_json::Value) -> serde_json::Value {
	let mut current = current;
	if let (Some(map), Some(patch)) = (current.as_object_mut(), incoming.as_object()) {
		for (key, value) in patch {
			if value.is_null() {
				map.remove(key);
			} else {
				map.insert(key.clone(), value.clone());
			}
		}
	}
	current
}

pub async fn update(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let nodes = activity.object().flat();
	if nodes.is_empty() {
		return Err(ProcessorError::ObjectRequired);
	}
	for node in nodes {
		// updates must embed the new state
		let incoming = node.extract().ok_or(ProcessorError::ObjectRequired)?;
		let oid = incoming.id()?.to_string();
		let _guard = ctx.db().lock(&oid).await?;
		if !ctx.db().owns(&oid).await? {
			tracing::debug!("not keeping {oid}, skipping update");
			continue;
		}
		let current = ctx.db().get(&oid).await?;
		ctx.db().update(merge_fields(current, &incoming)).await?;
	}
	Ok(())
}

async fn update_owned(ctx: &Context, activity: &serde_json::Value, actor: &str) -> Result<(), ProcessorError> {
	// a client may only update what its actor authored
	for node in activity.object().flat() {
		let incoming = node.extract().ok_or(ProcessorError::ObjectRequired)?;
		let oid = incoming.id()?.to_string();
		if !ctx.db().owns(&oid).await? {
			return Err(ProcessorError::Unauthorized);
		}
		let current = ctx.db().get(&oid).await?;
		match current.attributed_to().id() {
			Ok(author) => if author != actor {
				return Err(ProcessorError::Unauthorized);
			},
			Err(_) => if Context::server(&oid) != Context::server(actor) {
				return Err(ProcessorError::Unauthorized);
			},
		}
	}
	update(ctx, activity).await
}

pub async fn delete(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let oids = activity.object().ids();
	if oids.is_empty() {
		return Err(ProcessorError::ObjectRequired);
	}
	for oid in oids {
		let _guard = ctx.db().lock(&oid).await?;
		if !ctx.db().owns(&oid).await? {
			tracing::debug!("not keeping {oid}, skipping delete");
			continue;
		}
		let current = ctx.db().get(&oid).await?;
		let tombstone = normalize::to_tombstone(&current, &oid, ctx.now());
		ctx.db().update(tombstone).await?;
	}
	Ok(())
}

async fn follow(ctx: &Context, inbox: &str, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let aid = activity.id()?.to_string();
	let follower = activity.actor().id()?.to_string();
	let local_actor = ctx.db().actor_for_inbox(inbox).await?;

	if !activity.object().ids().contains(&local_actor) {
		tracing::debug!("follow {aid} does not concern {local_actor}, ignoring");
		return Ok(());
	}

	// keep the follow on record, Accepts and Undos reference it by id
	ctx.db().create(activity.clone()).await?;

	match ctx.app().follow_policy() {
		FollowPolicy::Manual => Ok(()),
		FollowPolicy::AutoReject => {
			let reject = apv::new()
				.set_activity_type(Some(ActivityType::Reject(apv::RejectType::Reject)))
				.set_object(Node::link(aid))
				.set_to(Node::links(vec![follower]));
			let outbox = ctx.db().outbox_for_inbox(inbox).await?;
			ctx.post_outbox(&outbox, reject, &local_actor).await?;
			Ok(())
		},
		FollowPolicy::AutoAccept => {
			// the followers collection gains the requester when the Accept goes
			// through our own outbox below
			let accept = apv::new()
				.set_activity_type(Some(ActivityType::Accept(apv::AcceptType::Accept)))
				.set_object(Node::link(aid))
				.set_to(Node::links(vec![follower]));
			let outbox = ctx.db().outbox_for_inbox(inbox).await?;
			ctx.post_outbox(&outbox, accept, &local_actor).await?;
			Ok(())
		},
	}
}

async fn accept(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let follow_id = activity.object().id()?.to_string();

	// only meaningful when it accepts a follow this server actually sent
	if !ctx.db().exists(&follow_id).await? {
		return Err(ProcessorError::Unauthorized);
	}
	let follow = ctx.db().get(&follow_id).await?;
	let accepter = activity.actor().id()?.to_string();
	if !follow.object().ids().contains(&accepter) {
		return Err(ProcessorError::Unauthorized);
	}

	let follower = follow.actor().id()?.to_string();
	let follower_document = ctx.db().get(&follower).await?;
	if let Ok(following) = follower_document.following().id() {
		ctx.add_to_targets(&[accepter], &[following.to_string()]).await?;
	}
	Ok(())
}

async fn accept_owned(ctx: &Context, activity: &serde_json::Value, actor: &str) -> Result<(), ProcessorError> {
	let follow_id = activity.object().id()?.to_string();
	if !ctx.db().exists(&follow_id).await? {
		return Err(ProcessorError::Unauthorized);
	}
	let follow = ctx.db().get(&follow_id).await?;
	if !follow.object().ids().contains(&actor.to_string()) {
		return Err(ProcessorError::Unauthorized);
	}

	ctx.db().create(activity.clone()).await?;

	// manually accepting a pending follow request
	let follower = follow.actor().id()?.to_string();
	let actor_document = ctx.db().get(actor).await?;
	if let Ok(followers) = actor_document.followers().id() {
		ctx.add_to_targets(&[follower], &[followers.to_string()]).await?;
	}
	Ok(())
}

pub async fn add(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let objects = activity.object().ids();
	if objects.is_empty() {
		return Err(ProcessorError::ObjectRequired);
	}
	let targets = activity.target().ids();
	if targets.is_empty() {
		return Err(ProcessorError::TargetRequired);
	}
	Ok(ctx.add_to_targets(&objects, &targets).await?)
}

pub async fn remove(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let objects = activity.object().ids();
	if objects.is_empty() {
		return Err(ProcessorError::ObjectRequired);
	}
	let targets = activity.target().ids();
	if targets.is_empty() {
		return Err(ProcessorError::TargetRequired);
	}
	Ok(ctx.remove_from_targets(&objects, &targets).await?)
}

// the likes/shares collection IRI of an object this server keeps, read under its lock
async fn engagement_collection(ctx: &Context, oid: &str, shares: bool) -> Result<Option<String>, ProcessorError> {
	let _guard = ctx.db().lock(oid).await?;
	if !ctx.db().owns(oid).await? {
		return Ok(None);
	}
	let document = ctx.db().get(oid).await?;
	let collection = if shares { document.shares() } else { document.likes() };
	Ok(collection.id().ok().map(|x| x.to_string()))
}

pub async fn like(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let aid = activity.id()?.to_string();
	for oid in activity.object().ids() {
		match engagement_collection(ctx, &oid, false).await? {
			Some(likes) => ctx.add_to_targets(&[aid.clone()], &[likes]).await?,
			None => tracing::debug!("object {oid} has no likes collection here, skipping"),
		}
	}
	Ok(())
}

pub async fn announce(ctx: &Context, activity: &serde_json::Value) -> Result<(), ProcessorError> {
	let aid = activity.id()?.to_string();
	for oid in activity.object().ids() {
		match engagement_collection(ctx, &oid, true).await? {
			Some(shares) => ctx.add_to_targets(&[aid.clone()], &[shares]).await?,
			None => tracing::debug!("object {oid} has no shares collection here, skipping"),
		}
	}
	Ok(())
}

// undone activities belong to whoever undoes them; dereferences IRI-only objects
// before comparing actors
async fn undoer_must_own_inner(ctx: &Context, activity: &serde_json::Value, box_iri: &str) -> Result<(), ProcessorError> {
	ctx.activity_actors_match_object_actors(activity, box_iri).await
		.map_err(|e| match e {
			NormalizerError::ActorMismatch => ProcessorError::Unauthorized,
			e => ProcessorError::Normalizer(e),
		})
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum UndoSide {
	Server,
	Client,
}

/// inverting a previous activity is best effort: follows leave the relevant
/// relationship collection, likes and announces leave the object's counters,
/// everything else is only surfaced to the application
async fn undo(ctx: &Context, local_actor: &str, activity: &serde_json::Value, side: UndoSide) -> Result<(), ProcessorError> {
	let inner = activity.object().extract().ok_or(ProcessorError::ObjectRequired)?;
	let undoer = activity.actor().id()?.to_string();

	match inner.activity_type()? {
		ActivityType::Follow => {
			let actor_document = ctx.db().get(local_actor).await?;
			match side {
				// a remote actor retracts their follow of one of ours
				UndoSide::Server => {
					if let Ok(followers) = actor_document.followers().id() {
						ctx.remove_from_targets(&[undoer], &[followers.to_string()]).await?;
					}
				},
				// our actor retracts a follow they sent out
				UndoSide::Client => {
					if let Ok(following) = actor_document.following().id() {
						ctx.remove_from_targets(&inner.object().ids(), &[following.to_string()]).await?;
					}
				},
			}
		},
		ActivityType::Like => {
			let like_id = inner.id()?.to_string();
			for oid in inner.object().ids() {
				if let Some(likes) = engagement_collection(ctx, &oid, false).await? {
					ctx.remove_from_targets(&[like_id.clone()], &[likes]).await?;
				}
			}
		},
		ActivityType::Announce => {
			let announce_id = inner.id()?.to_string();
			for oid in inner.object().ids() {
				if let Some(shares) = engagement_collection(ctx, &oid, true).await? {
					ctx.remove_from_targets(&[announce_id.clone()], &[shares]).await?;
				}
			}
		},
		t => tracing::debug!("nothing to invert for Undo of {}, surfacing to application", t.as_ref()),
	}

	Ok(())
}
