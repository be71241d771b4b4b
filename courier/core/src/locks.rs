use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keyed advisory locking for resources named by IRI. Lock managers are cheap to clone
/// and share one lock table. Guards release on drop, so every exit path unlocks.
#[derive(Clone, Default)]
pub struct IriLocks {
	locks: Arc<dashmap::DashMap<String, Arc<tokio::sync::Mutex<()>>>>,
	held: Arc<AtomicUsize>,
}

pub struct IriGuard {
	iri: String,
	held: Arc<AtomicUsize>,
	_guard: tokio::sync::OwnedMutexGuard<()>,
}

impl IriGuard {
	pub fn iri(&self) -> &str {
		&self.iri
	}
}

impl Drop for IriGuard {
	fn drop(&mut self) {
		self.held.fetch_sub(1, Ordering::SeqCst);
		tracing::trace!("released lock on {}", self.iri);
	}
}

impl IriLocks {
	pub async fn acquire(&self, iri: &str) -> IriGuard {
		let mutex = self.locks
			.entry(iri.to_string())
			.or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
			.clone();
		let guard = mutex.lock_owned().await;
		self.held.fetch_add(1, Ordering::SeqCst);
		tracing::trace!("acquired lock on {iri}");
		IriGuard {
			iri: iri.to_string(),
			held: self.held.clone(),
			_guard: guard,
		}
	}

	/// acquire multiple locks in lexicographic order, so that concurrent multi-resource
	/// operations can not deadlock each other
	pub async fn acquire_all(&self, iris: &[&str]) -> Vec<IriGuard> {
		let mut sorted : Vec<&str> = iris.to_vec();
		sorted.sort_unstable();
		sorted.dedup();
		let mut out = Vec::with_capacity(sorted.len());
		for iri in sorted {
			out.push(self.acquire(iri).await);
		}
		out
	}

	/// number of currently held guards, for instrumentation
	pub fn held(&self) -> usize {
		self.held.load(Ordering::SeqCst)
	}
}
