//! Route guarding on top of the session
//!
//! Layouts ask a [`RouteGuard`] what to do with the current session snapshot:
//! show a neutral loading affordance, redirect, or render their content.

use serde::{Deserialize, Serialize};

use crate::session::{SessionManager, SessionSnapshot};

/// Screens the session layer can send the user to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    /// Story carousel shown at cold start
    Welcome,
    /// Unauthenticated landing with sign-in / sign-up choices
    Splash,
    /// Sign-in form
    SignIn,
    /// Account creation form
    SignUp,
    /// Request a password reset OTP
    ForgotPassword,
    /// Enter the OTP sent after sign-up
    VerifyAccount {
        /// Address the OTP was sent to
        email: String,
    },
    /// Enter reset OTP and new password
    ResetPassword {
        /// Address the OTP was sent to
        email: String,
    },
    /// Authenticated home
    Main,
    /// Profile with booking statistics
    Profile,
}

impl Route {
    /// Get the router path for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Welcome => "/".to_string(),
            Route::Splash => "/(auth)/splash-screen".to_string(),
            Route::SignIn => "/(auth)/signin".to_string(),
            Route::SignUp => "/(auth)/signup".to_string(),
            Route::ForgotPassword => "/(auth)/forgot-password".to_string(),
            Route::VerifyAccount { email } => {
                format!("/(auth)/verify-account/{}", urlencoding::encode(email))
            }
            Route::ResetPassword { email } => {
                format!("/(auth)/reset/{}", urlencoding::encode(email))
            }
            Route::Main => "/(main)".to_string(),
            Route::Profile => "/(main)/profile".to_string(),
        }
    }

    /// Check if this route requires authentication
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Main | Route::Profile)
    }

    /// Check if this route is only for signed-out users
    pub fn is_guest_only(&self) -> bool {
        matches!(
            self,
            Route::Splash
                | Route::SignIn
                | Route::SignUp
                | Route::ForgotPassword
                | Route::VerifyAccount { .. }
                | Route::ResetPassword { .. }
        )
    }

    /// The guard that protects this route, if any
    pub fn guard(&self) -> Option<RouteGuard> {
        if self.requires_auth() {
            Some(RouteGuard::Protected)
        } else if self.is_guest_only() {
            Some(RouteGuard::GuestOnly)
        } else {
            None
        }
    }
}

/// What a guarded layout should do right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not restored yet; show a loading affordance
    Loading,
    /// Navigate elsewhere instead of rendering
    Redirect(Route),
    /// Render the guarded content
    Render,
}

/// Session-based access rule for a group of screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Signed-in users only; others go to sign-in
    Protected,
    /// Signed-out users only; signed-in users go to the main app
    GuestOnly,
}

impl RouteGuard {
    /// Decide based on a snapshot
    ///
    /// While the snapshot is loading the session is not authoritative, so the
    /// decision is always [`GuardDecision::Loading`].
    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> GuardDecision {
        if snapshot.is_loading {
            return GuardDecision::Loading;
        }

        match (self, snapshot.session.is_some()) {
            (RouteGuard::Protected, true) | (RouteGuard::GuestOnly, false) => GuardDecision::Render,
            (RouteGuard::Protected, false) => GuardDecision::Redirect(Route::SignIn),
            (RouteGuard::GuestOnly, true) => GuardDecision::Redirect(Route::Main),
        }
    }

    /// Decide based on the manager's current state
    pub fn evaluate_manager(&self, manager: &SessionManager) -> GuardDecision {
        self.evaluate(&manager.read())
    }
}

/// Where "Get started" on the welcome screen leads
///
/// `None` while the session is still being restored.
pub fn landing_route(snapshot: &SessionSnapshot) -> Option<Route> {
    if snapshot.is_loading {
        return None;
    }
    Some(if snapshot.session.is_some() { Route::Main } else { Route::Splash })
}

/// Resolve navigation to `route`, applying its guard
///
/// Returns the route to show, or `None` while loading.
pub fn resolve(route: Route, snapshot: &SessionSnapshot) -> Option<Route> {
    let Some(guard) = route.guard() else {
        return Some(route);
    };

    match guard.evaluate(snapshot) {
        GuardDecision::Loading => None,
        GuardDecision::Redirect(target) => Some(target),
        GuardDecision::Render => Some(route),
    }
}
