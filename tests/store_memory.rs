#![cfg(feature = "reqwest")]

// self
use guild_auth::{
	_preludet::*,
	auth::SessionId,
	error::FailureKind,
	flows::{Authenticator, CallbackQuery},
	provider::{STUB_AUTHORIZATION_CODE, StubProvider},
	store::{MemoryStore, SecretSlot},
};

fn stub_authenticator() -> Authenticator {
	let config = test_config("https://provider.example.com");
	let provider = StubProvider::from_config(&config);

	Authenticator::new(Arc::new(config), Arc::new(provider))
}

fn session(value: &str) -> SessionId {
	SessionId::new(value).expect("Failed to build session identifier for memory store tests.")
}

fn callback(state: &str) -> CallbackQuery {
	CallbackQuery {
		code: Some(STUB_AUTHORIZATION_CODE.into()),
		state: Some(state.into()),
		..Default::default()
	}
}

async fn stored_verifier(slot: &dyn SecretSlot) -> String {
	slot.load()
		.await
		.expect("Slot load should succeed.")
		.and_then(|pending| pending.code_verifier)
		.expect("A started attempt should store its verifier.")
		.expose()
		.to_owned()
}

#[tokio::test]
async fn last_initiated_attempt_wins() {
	let authenticator = stub_authenticator();
	let store = MemoryStore::default();
	let slot = store.slot(session("browser-1"));
	let first = authenticator.begin_authorization(&slot).await.expect("First attempt should start.");
	let first_verifier = stored_verifier(&slot).await;
	let second =
		authenticator.begin_authorization(&slot).await.expect("Second attempt should start.");
	let second_verifier = stored_verifier(&slot).await;

	assert_ne!(first.state, second.state);
	assert_ne!(first_verifier, second_verifier, "Every attempt draws a fresh verifier.");
	assert_eq!(store.len(), 1, "Both attempts share one slot per session.");

	let err = authenticator
		.complete_authorization(&slot, callback(&first.state))
		.await
		.expect_err("The overwritten attempt must fail.");

	assert_eq!(err.kind(), FailureKind::StateMismatch);
	assert!(store.is_empty(), "A failed callback still clears the slot.");
}

#[tokio::test]
async fn sessions_do_not_share_secrets() {
	let authenticator = stub_authenticator();
	let store = MemoryStore::default();
	let alice = store.slot(session("browser-alice"));
	let bob = store.slot(session("browser-bob"));
	let start = authenticator.begin_authorization(&alice).await.expect("Attempt should start.");
	let err = authenticator
		.complete_authorization(&bob, callback(&start.state))
		.await
		.expect_err("Another session's state must not be accepted.");

	assert_eq!(err.kind(), FailureKind::SessionExpired);

	let profile = authenticator
		.complete_authorization(&alice, callback(&start.state))
		.await
		.expect("The owning session should complete.");

	assert_eq!(profile.username, "aztecguild");
	assert_eq!(profile.display_name, "Aztecguild");
}

#[tokio::test]
async fn expired_secrets_are_never_returned() {
	let authenticator = stub_authenticator();
	let store = MemoryStore::new(Duration::milliseconds(50));
	let slot = store.slot(session("browser-1"));
	let start = authenticator.begin_authorization(&slot).await.expect("Attempt should start.");

	tokio::time::sleep(std::time::Duration::from_millis(120)).await;

	assert!(slot.load().await.expect("Slot load should succeed.").is_none());

	let err = authenticator
		.complete_authorization(&slot, callback(&start.state))
		.await
		.expect_err("Expired attempts must fail.");

	assert_eq!(err.kind(), FailureKind::SessionExpired);
}

#[tokio::test]
async fn purge_drops_only_expired_entries() {
	let authenticator = stub_authenticator();
	let short = MemoryStore::new(Duration::milliseconds(50));
	let stale = short.slot(session("browser-stale"));

	authenticator.begin_authorization(&stale).await.expect("Attempt should start.");

	let now = OffsetDateTime::now_utc();

	assert_eq!(short.purge_expired(now), 0);
	assert_eq!(short.purge_expired(now + Duration::seconds(1)), 1);
	assert!(short.is_empty());
}

#[tokio::test]
async fn abandoned_attempts_are_swept_by_later_saves() {
	let authenticator = stub_authenticator();
	let store = MemoryStore::new(Duration::milliseconds(500));

	for i in 0..100 {
		let slot = store.slot(session(&format!("browser-{i}")));

		authenticator.begin_authorization(&slot).await.expect("Attempt should start.");
	}

	assert_eq!(store.len(), 100);

	tokio::time::sleep(std::time::Duration::from_millis(700)).await;

	let returning = store.slot(session("browser-returning"));

	authenticator.begin_authorization(&returning).await.expect("Attempt should start.");

	assert_eq!(store.len(), 1, "Expired attempts should not accumulate.");
}
