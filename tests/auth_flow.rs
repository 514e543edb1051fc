//! Auth flow integration tests
//!
//! Drives the sign-up, verification, sign-in and sign-out flows the way the
//! screens do, with canned API payloads.

use app_core::auth::{self, LoginOutcome, MutationResponse, UserTokenData};
use app_core::validation::{LoginForm, ResetPasswordForm, SignUpForm};
use app_state::{GuardDecision, Route, RouteGuard, SessionConfig, SessionManager};
use serde_json::json;
use storage::{KeyValueStore, KvStore};

async fn restored_manager(store: KvStore) -> SessionManager {
    let manager = SessionManager::new(store, SessionConfig::default());
    manager.restore().await;
    manager
}

/// Sign up, verify the email, and land in the main app
#[tokio::test]
async fn test_sign_up_then_verify() {
    let store = KvStore::in_memory().unwrap();
    let manager = restored_manager(store.clone()).await;

    let form = SignUpForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "Secr3t!".to_string(),
        confirm_password: "Secr3t!".to_string(),
    };
    let vars = auth::prepare_sign_up(&form).unwrap();

    let created: MutationResponse<()> =
        serde_json::from_value(json!({ "success": true, "message": "User created" })).unwrap();
    let step = auth::handle_sign_up(&vars.email, &created).unwrap();
    assert_eq!(step.next, Route::VerifyAccount { email: "ada@example.com".to_string() });

    // Still a guest until verified
    assert_eq!(RouteGuard::GuestOnly.evaluate_manager(&manager), GuardDecision::Render);

    // A blank OTP never reaches the API
    assert!(auth::prepare_verification(&vars.email, " ").is_err());
    let verify_vars = auth::prepare_verification(&vars.email, "123456").unwrap();
    assert_eq!(verify_vars.email, "ada@example.com");

    let verified: MutationResponse<String> = serde_json::from_value(json!({
        "success": true,
        "message": "Email verified",
        "data": "tok-verified"
    }))
    .unwrap();
    let step = auth::handle_verification(&manager, &verified).unwrap();

    assert_eq!(step.next, Route::Main);
    assert_eq!(RouteGuard::Protected.evaluate_manager(&manager), GuardDecision::Render);

    manager.flush().await;
    assert_eq!(
        KeyValueStore::get(&store, "session").await.unwrap(),
        Some("tok-verified".to_string())
    );
}

/// Sign in, then sign out from the profile
#[tokio::test]
async fn test_sign_in_then_sign_out() {
    let store = KvStore::in_memory().unwrap();
    let manager = restored_manager(store.clone()).await;

    let vars = auth::prepare_login(&LoginForm {
        email: "ada@example.com".to_string(),
        password: "Secr3t!".to_string(),
    })
    .unwrap();

    let response: MutationResponse<UserTokenData> = serde_json::from_value(json!({
        "success": true,
        "message": null,
        "data": { "isVerified": true, "token": "tok-login" }
    }))
    .unwrap();

    let outcome = auth::handle_login(&manager, &vars.email, &response).unwrap();
    assert!(matches!(outcome, LoginOutcome::SignedIn(_)));
    assert!(manager.is_authenticated());

    let step = auth::sign_out(&manager);
    assert_eq!(step.next, Route::SignIn);
    assert_eq!(
        RouteGuard::Protected.evaluate_manager(&manager),
        GuardDecision::Redirect(Route::SignIn)
    );

    manager.dispose().await;
    assert_eq!(KeyValueStore::get(&store, "session").await.unwrap(), None);
}

/// A rejected login leaves the session untouched
#[tokio::test]
async fn test_rejected_login_keeps_guest() {
    let manager = restored_manager(KvStore::in_memory().unwrap()).await;

    let response: MutationResponse<UserTokenData> = serde_json::from_value(json!({
        "success": false,
        "message": "Invalid email or password"
    }))
    .unwrap();

    let err = auth::handle_login(&manager, "ada@example.com", &response).unwrap_err();
    assert_eq!(auth::error_notice(&err).message, "Invalid email or password");
    assert!(!manager.is_authenticated());
}

/// Forgot password, reset it, then sign in with the new one
#[tokio::test]
async fn test_forgot_then_reset_password() {
    let manager = restored_manager(KvStore::in_memory().unwrap()).await;

    assert!(auth::prepare_forgot_password("not-an-email").is_err());
    let vars = auth::prepare_forgot_password(" ada@example.com").unwrap();

    let sent: MutationResponse<()> =
        serde_json::from_value(json!({ "success": true, "message": "OTP Sent Successfully." }))
            .unwrap();
    let step = auth::handle_forgot_password(&vars.email, &sent).unwrap();
    assert_eq!(step.next, Route::ResetPassword { email: "ada@example.com".to_string() });

    let reset_vars = auth::prepare_reset_password(
        &vars.email,
        &ResetPasswordForm {
            otp: "123456".to_string(),
            password: "N3w-pass".to_string(),
            confirm_password: "N3w-pass".to_string(),
        },
    )
    .unwrap();
    assert_eq!(reset_vars.email, "ada@example.com");

    let reset: MutationResponse<serde_json::Value> =
        serde_json::from_value(json!({ "success": true, "message": null, "data": null })).unwrap();
    let step = auth::handle_password_reset(&reset).unwrap();
    assert_eq!(step.next, Route::SignIn);
    assert!(!manager.is_authenticated());
}
