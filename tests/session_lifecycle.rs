//! Session lifecycle integration tests
//!
//! End-to-end checks of restore, sign-in, sign-out and guarding against an
//! on-disk store that is reopened between "launches".

use app_state::{GuardDecision, Route, RouteGuard, SessionConfig, SessionManager, SessionToken};
use storage::{KvConfig, KvStore};
use tempfile::TempDir;

fn open_store(temp_dir: &TempDir) -> KvStore {
    let path = temp_dir.path().join("session.db");
    KvStore::new(KvConfig::new(path.to_string_lossy()).flush_every_ms(None)).unwrap()
}

/// Sign in, relaunch, and come back signed in
#[tokio::test]
async fn test_session_survives_relaunch() {
    let temp_dir = TempDir::new().unwrap();

    // Launch 1: nothing stored, user signs in
    {
        let manager = SessionManager::new(open_store(&temp_dir), SessionConfig::default());
        assert_eq!(RouteGuard::Protected.evaluate_manager(&manager), GuardDecision::Loading);

        let snapshot = manager.restore().await;
        assert!(snapshot.session.is_none());
        assert_eq!(
            RouteGuard::Protected.evaluate(&snapshot),
            GuardDecision::Redirect(Route::SignIn)
        );

        manager.sign_in(SessionToken::new("tok-123").unwrap());
        assert_eq!(RouteGuard::Protected.evaluate_manager(&manager), GuardDecision::Render);

        manager.dispose().await;
    }

    // Launch 2: the token is restored
    {
        let manager = SessionManager::new(open_store(&temp_dir), SessionConfig::default());
        let snapshot = manager.restore().await;

        assert_eq!(snapshot.session, Some(SessionToken::new("tok-123").unwrap()));
        assert_eq!(
            RouteGuard::GuestOnly.evaluate(&snapshot),
            GuardDecision::Redirect(Route::Main)
        );

        manager.sign_out();
        manager.dispose().await;
    }

    // Launch 3: signed out stays signed out
    {
        let manager = SessionManager::new(open_store(&temp_dir), SessionConfig::default());
        let snapshot = manager.restore().await;

        assert!(snapshot.session.is_none());
        assert!(!snapshot.is_loading);
    }
}

/// Separate storage keys keep separate sessions
#[tokio::test]
async fn test_storage_key_isolation() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let staging = SessionManager::new(store.clone(), SessionConfig::new().storage_key("staging"));
    let production = SessionManager::new(store.clone(), SessionConfig::new().storage_key("production"));

    staging.restore().await;
    production.restore().await;

    staging.sign_in(SessionToken::new("staging-token").unwrap());
    staging.dispose().await;
    production.dispose().await;

    let staging = SessionManager::new(store.clone(), SessionConfig::new().storage_key("staging"));
    let production = SessionManager::new(store, SessionConfig::new().storage_key("production"));

    assert!(staging.restore().await.session.is_some());
    assert!(production.restore().await.session.is_none());
}

/// Subscribers observe the whole lifecycle in order
#[tokio::test]
async fn test_guard_follows_subscription() {
    let temp_dir = TempDir::new().unwrap();
    let manager = SessionManager::new(open_store(&temp_dir), SessionConfig::default());
    let mut rx = manager.subscribe();

    assert_eq!(RouteGuard::Protected.evaluate(&rx.borrow()), GuardDecision::Loading);

    manager.restore().await;
    rx.changed().await.unwrap();
    assert_eq!(
        RouteGuard::Protected.evaluate(&rx.borrow_and_update()),
        GuardDecision::Redirect(Route::SignIn)
    );

    manager.sign_in(SessionToken::new("tok").unwrap());
    rx.changed().await.unwrap();
    assert_eq!(RouteGuard::Protected.evaluate(&rx.borrow_and_update()), GuardDecision::Render);

    manager.dispose().await;
}
