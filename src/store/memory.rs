//! Thread-safe in-memory secret store keyed by [`SessionId`].

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	config::MAX_PENDING_TTL,
	store::{PendingAuthSecret, SecretSlot, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<SessionId, PendingAuthSecret>>>;

/// Server-side `SessionId -> PendingAuthSecret` map with a fixed lifetime per entry.
///
/// Expired entries are never returned. Every save sweeps out all expired entries, so attempts
/// abandoned by browsers that never come back do not accumulate; [`MemoryStore::purge_expired`]
/// does the same sweep on demand.
#[derive(Clone, Debug)]
pub struct MemoryStore {
	map: StoreMap,
	ttl: Duration,
}
impl MemoryStore {
	/// Creates an empty store whose entries live for `ttl`, capped at [`MAX_PENDING_TTL`].
	pub fn new(ttl: Duration) -> Self {
		Self { map: Default::default(), ttl: ttl.min(MAX_PENDING_TTL) }
	}

	/// Lifetime applied to every saved secret.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the slot owned by `session`.
	pub fn slot(&self, session: SessionId) -> MemorySlot {
		MemorySlot { map: self.map.clone(), ttl: self.ttl, session }
	}

	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.map.read().len()
	}

	/// Returns true when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.map.read().is_empty()
	}

	/// Drops every entry expired at `now`, returning how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.map.write();
		let before = guard.len();

		guard.retain(|_, secret| !secret.is_expired(now));

		before - guard.len()
	}

	fn save_now(
		map: &StoreMap,
		session: SessionId,
		secret: PendingAuthSecret,
		now: OffsetDateTime,
	) {
		let mut guard = map.write();

		guard.retain(|_, pending| !pending.is_expired(now));
		guard.insert(session, secret);
	}

	fn load_now(
		map: &StoreMap,
		session: &SessionId,
		now: OffsetDateTime,
	) -> Option<PendingAuthSecret> {
		let mut guard = map.write();

		if guard.get(session)?.is_expired(now) {
			guard.remove(session);

			return None;
		}

		guard.get(session).cloned()
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::new(Duration::minutes(10))
	}
}

/// [`SecretSlot`] view onto one session's entry inside a [`MemoryStore`].
#[derive(Clone, Debug)]
pub struct MemorySlot {
	map: StoreMap,
	ttl: Duration,
	session: SessionId,
}
impl MemorySlot {
	/// Session owning this slot.
	pub fn session(&self) -> &SessionId {
		&self.session
	}
}
impl SecretSlot for MemorySlot {
	fn save(&self, secret: PendingAuthSecret) -> StoreFuture<'_, ()> {
		let now = OffsetDateTime::now_utc();
		// The store's lifetime wins over whatever the caller stamped.
		let secret = secret.expiring(now, self.ttl);

		Box::pin(async move {
			MemoryStore::save_now(&self.map, self.session.clone(), secret, now);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<PendingAuthSecret>> {
		Box::pin(async move {
			Ok(MemoryStore::load_now(&self.map, &self.session, OffsetDateTime::now_utc()))
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.map.write().remove(&self.session);

			Ok(())
		})
	}
}
