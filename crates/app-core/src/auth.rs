//! Authentication flows
//!
//! This module sits between the auth screens and the API. It validates forms,
//! builds mutation variables, and interprets mutation payloads into the next
//! step: sign in through the [`SessionManager`], move to another screen, or
//! report an error. The GraphQL transport itself is not part of this crate.

use app_state::{Route, SessionError, SessionManager, SessionToken};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{self, LoginForm, ResetPasswordForm, SignUpForm, ValidationErrors};

const LOGIN_SUCCESS: &str = "Login successful.";
const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const VERIFY_SUCCESS: &str = "Account verified successfully.";
const VERIFY_FAILED: &str = "Account verification failed.";
const SIGN_UP_SUCCESS: &str = "Account created. Check your email for the OTP.";
const SIGN_UP_FAILED: &str = "Account creation failed.";
const OTP_SENT: &str = "OTP Sent Successfully.";
const GENERIC_FAILURE: &str = "Something Went Wrong.";
const RESET_SUCCESS: &str = "Password reset successfully.";
const RESET_FAILED: &str = "Error While Resetting Password.";

/// Authentication flow error types
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form failed client-side validation
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// API answered `success: false`
    #[error("{0}")]
    Rejected(String),

    /// API reported success but sent no token
    #[error("Server did not return a session token")]
    MissingToken,

    /// API sent a token that cannot be used
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] SessionError),
}

/// Result type for authentication flows
pub type Result<T> = std::result::Result<T, AuthError>;

/// Common `{ success, message, data }` mutation payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationResponse<T> {
    /// Whether the API accepted the request
    pub success: bool,
    /// Human-readable outcome
    pub message: Option<String>,
    /// Mutation-specific payload
    pub data: Option<T>,
}

impl<T> MutationResponse<T> {
    fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// `data` of the `getUserToken` mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTokenData {
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// Session token (present once verified)
    #[serde(default)]
    pub token: Option<String>,
}

/// Variables for the `getUserToken` mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoginVariables {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Variables for the `createUser` mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateUserVariables {
    /// First name
    pub first_name: String,
    /// Last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password confirmation
    pub confirm_password: String,
}

/// Variables for the `verifyEmail` mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerifyEmailVariables {
    /// Email address being verified
    pub email: String,
    /// OTP received by email
    pub otp: String,
}

/// Variables for the `forgotPassword` mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForgotPasswordVariables {
    /// Email address to send the reset OTP to
    pub email: String,
}

/// Variables for the `resetPassword` mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResetPasswordVariables {
    /// Email address the OTP was sent to
    pub email: String,
    /// OTP
    pub otp: String,
    /// New password
    pub password: String,
    /// New password confirmation
    pub confirm_password: String,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Operation succeeded
    Success,
    /// Operation succeeded with a caveat
    Warning,
    /// Operation failed
    Error,
}

/// Short message shown after a flow step (e.g. as a toast)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Next step of a successful flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStep {
    /// Where to navigate
    pub next: Route,
    /// Whether the current screen should be replaced instead of pushed
    pub replace: bool,
    /// Message to show
    pub notice: Option<Notice>,
}

/// Outcome of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Verified account; the session is now active
    SignedIn(FlowStep),
    /// Account exists but the email is unverified; no session was created
    VerificationRequired(FlowStep),
}

impl LoginOutcome {
    /// The navigation step for either outcome
    pub fn step(&self) -> &FlowStep {
        match self {
            LoginOutcome::SignedIn(step) | LoginOutcome::VerificationRequired(step) => step,
        }
    }
}

/// Validate the sign-in form and build mutation variables
pub fn prepare_login(form: &LoginForm) -> Result<LoginVariables> {
    validation::validate_login(form)?;
    Ok(LoginVariables {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    })
}

/// Validate the sign-up form and build mutation variables
pub fn prepare_sign_up(form: &SignUpForm) -> Result<CreateUserVariables> {
    validation::validate_sign_up(form)?;
    let last_name = form.last_name.trim();
    Ok(CreateUserVariables {
        first_name: form.first_name.trim().to_string(),
        last_name: (!last_name.is_empty()).then(|| last_name.to_string()),
        email: form.email.trim().to_string(),
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
    })
}

/// Validate the verification OTP and build mutation variables
pub fn prepare_verification(email: &str, otp: &str) -> Result<VerifyEmailVariables> {
    validation::validate_verification_otp(otp)?;
    Ok(VerifyEmailVariables {
        email: email.trim().to_string(),
        otp: otp.trim().to_string(),
    })
}

/// Validate the forgot-password form and build mutation variables
pub fn prepare_forgot_password(email: &str) -> Result<ForgotPasswordVariables> {
    validation::validate_email(email)?;
    Ok(ForgotPasswordVariables { email: email.trim().to_string() })
}

/// Validate the reset form and build mutation variables
pub fn prepare_reset_password(email: &str, form: &ResetPasswordForm) -> Result<ResetPasswordVariables> {
    validation::validate_reset_password(form)?;
    Ok(ResetPasswordVariables {
        email: email.trim().to_string(),
        otp: form.otp.trim().to_string(),
        password: form.password.clone(),
        confirm_password: form.confirm_password.clone(),
    })
}

/// Interpret a `getUserToken` payload
///
/// A verified account signs in immediately. An unverified one is sent to the
/// verification screen for `email` without touching the session.
pub fn handle_login(
    manager: &SessionManager,
    email: &str,
    response: &MutationResponse<UserTokenData>,
) -> Result<LoginOutcome> {
    if !response.success {
        tracing::debug!("Login rejected by API");
        return Err(AuthError::Rejected(response.message_or(LOGIN_FAILED)));
    }

    let verified = response.data.as_ref().is_some_and(|d| d.is_verified);
    if !verified {
        tracing::debug!("Login requires email verification");
        return Ok(LoginOutcome::VerificationRequired(FlowStep {
            next: Route::VerifyAccount { email: email.trim().to_string() },
            replace: false,
            notice: None,
        }));
    }

    let raw = response
        .data
        .as_ref()
        .and_then(|d| d.token.clone())
        .ok_or(AuthError::MissingToken)?;
    manager.sign_in(SessionToken::new(raw)?);

    Ok(LoginOutcome::SignedIn(FlowStep {
        next: Route::Main,
        replace: true,
        notice: Some(Notice::new(NoticeLevel::Success, response.message_or(LOGIN_SUCCESS))),
    }))
}

/// Interpret a `verifyEmail` payload; `data` carries the new session token
pub fn handle_verification(
    manager: &SessionManager,
    response: &MutationResponse<String>,
) -> Result<FlowStep> {
    if !response.success {
        return Err(AuthError::Rejected(response.message_or(VERIFY_FAILED)));
    }

    let raw = response.data.clone().ok_or(AuthError::MissingToken)?;
    manager.sign_in(SessionToken::new(raw)?);

    Ok(FlowStep {
        next: Route::Main,
        replace: true,
        notice: Some(Notice::new(NoticeLevel::Success, response.message_or(VERIFY_SUCCESS))),
    })
}

/// Interpret a `createUser` payload
pub fn handle_sign_up(email: &str, response: &MutationResponse<()>) -> Result<FlowStep> {
    if !response.success {
        return Err(AuthError::Rejected(response.message_or(SIGN_UP_FAILED)));
    }

    Ok(FlowStep {
        next: Route::VerifyAccount { email: email.trim().to_string() },
        replace: false,
        notice: Some(Notice::new(NoticeLevel::Success, response.message_or(SIGN_UP_SUCCESS))),
    })
}

/// Interpret a `forgotPassword` payload
///
/// The API reports partial successes through its message; anything other
/// than the standard "OTP sent" text is surfaced as a warning.
pub fn handle_forgot_password(email: &str, response: &MutationResponse<()>) -> Result<FlowStep> {
    if !response.success {
        return Err(AuthError::Rejected(response.message_or(GENERIC_FAILURE)));
    }

    let message = response.message_or(OTP_SENT);
    let level = if message == OTP_SENT { NoticeLevel::Success } else { NoticeLevel::Warning };

    Ok(FlowStep {
        next: Route::ResetPassword { email: email.trim().to_string() },
        replace: false,
        notice: Some(Notice::new(level, message)),
    })
}

/// Interpret a `resetPassword` payload
pub fn handle_password_reset(response: &MutationResponse<serde_json::Value>) -> Result<FlowStep> {
    if !response.success {
        return Err(AuthError::Rejected(response.message_or(RESET_FAILED)));
    }

    Ok(FlowStep {
        next: Route::SignIn,
        replace: true,
        notice: Some(Notice::new(NoticeLevel::Success, response.message_or(RESET_SUCCESS))),
    })
}

/// Sign out from the profile screen and go back to sign-in
pub fn sign_out(manager: &SessionManager) -> FlowStep {
    manager.sign_out();
    FlowStep { next: Route::SignIn, replace: false, notice: None }
}

/// Convert a failure into the notice the screen shows
pub fn error_notice(error: &AuthError) -> Notice {
    Notice::new(NoticeLevel::Error, error.to_string())
}
