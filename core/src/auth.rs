//! Session lifecycle operations shared by every view.
//!
//! [`AuthService`] is the only writer of the session: sign-in, sign-up and
//! code verification all end in [`AuthService::login`], which stores every
//! session field at once and queues a one-shot [`Notice::LoginSucceeded`].
//! [`AuthService::logout`] is the only operation here that navigates.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::api::{ApiClient, RegisterRequest};
use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_ERROR};
use crate::notify::{Notice, Notifications};
use crate::routes::Route;
use crate::session::{Session, SessionStore, SignupDraft};
use crate::storage::StorageError;

pub const MISSING_CREDENTIALS: &str = "Please enter both email and password.";
pub const MISSING_FIELDS: &str = "All fields are required.";
pub const MISSING_EMAIL: &str = "Please enter your email address.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The one-time session check has not run yet.
    Loading,
    Ready { authenticated: bool },
}

impl AuthStatus {
    pub fn check(session: &SessionStore) -> Self {
        AuthStatus::Ready {
            authenticated: session.is_authenticated(),
        }
    }

    /// Re-reads the session; `None` when the status is unchanged.
    pub fn recheck(self, session: &SessionStore) -> Option<Self> {
        let next = Self::check(session);
        (next != self).then_some(next)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, AuthStatus::Loading)
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, AuthStatus::Ready { authenticated: true })
    }
}

pub trait Navigator {
    fn navigate(&self, route: Route);
    fn redirect_external(&self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRedirect {
    pub url: String,
    pub delay_ms: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignInFailure {
    #[error(transparent)]
    Rejected(#[from] ApiError),
    /// The account exists but has no access; the user is sent to the pricing
    /// page after a delay.
    #[error("{message}")]
    Forbidden {
        message: String,
        redirect: ExternalRedirect,
    },
}

impl SignInFailure {
    pub fn display_message(&self) -> String {
        match self {
            SignInFailure::Rejected(error) => error.display_message(),
            SignInFailure::Forbidden { message, .. } => message.clone(),
        }
    }
}

impl From<StorageError> for SignInFailure {
    fn from(error: StorageError) -> Self {
        SignInFailure::Rejected(error.into())
    }
}

/// Registration waiting for its emailed code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

impl SignUpForm {
    fn validate(&self) -> Result<(), ApiError> {
        let blank = [&self.username, &self.email, &self.phone_number]
            .iter()
            .any(|field| field.trim().is_empty())
            || self.password.is_empty();
        if blank {
            return Err(ApiError::Validation(MISSING_FIELDS.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The backend answered with a token; the session is live.
    SignedIn,
    VerificationRequired,
}

impl SignUpOutcome {
    pub fn route(self) -> Route {
        match self {
            SignUpOutcome::SignedIn => Route::Chat,
            SignUpOutcome::VerificationRequired => Route::TwoFactor,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
    notices: Notifications,
    navigator: Rc<dyn Navigator>,
    forbidden_redirect: ExternalRedirect,
    pending: Rc<RefCell<Option<PendingVerification>>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session", &self.session)
            .field("pending", &self.pending.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        api: ApiClient,
        notices: Notifications,
        navigator: Rc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Self {
        let session = api.http().session().clone();
        Self {
            api,
            session,
            notices,
            navigator,
            forbidden_redirect: ExternalRedirect {
                url: config.pricing_url.clone(),
                delay_ms: config.forbidden_redirect_delay_ms,
            },
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notices(&self) -> &Notifications {
        &self.notices
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus::check(&self.session)
    }

    pub fn login(&self, session: &Session) -> Result<(), StorageError> {
        self.session.set_session(session)?;
        self.notices.push(Notice::LoginSucceeded);
        Ok(())
    }

    /// Removes every session key, then navigates to sign-in. Navigation
    /// happens even if a removal failed; the failure is returned.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.pending.borrow_mut().take();
        let cleared = self.session.clear();
        if let Err(e) = &cleared {
            tracing::warn!(error = %e, "logout left session keys behind");
        }
        self.navigator.navigate(Route::SignIn);
        cleared
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Route, SignInFailure> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(MISSING_CREDENTIALS.to_string()).into());
        }

        match self.api.login(email, password).await {
            Ok(response) => {
                let session = response.into_session()?;
                self.login(&session)?;
                tracing::info!("signed in");
                Ok(Route::Chat)
            }
            Err(ApiError::Forbidden { .. }) => {
                tracing::info!("sign-in refused, account has no access");
                Err(SignInFailure::Forbidden {
                    message: GENERIC_ERROR.to_string(),
                    redirect: self.forbidden_redirect.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn follow_external(&self, redirect: &ExternalRedirect) {
        self.navigator.redirect_external(&redirect.url);
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpOutcome, ApiError> {
        form.validate()?;
        let email = form.email.trim();
        self.session.save_signup_draft(&SignupDraft {
            name: form.username.trim().to_string(),
            email: email.to_string(),
            number: form.phone_number.trim().to_string(),
        })?;

        let response = self
            .api
            .register(&RegisterRequest {
                username: form.username.trim(),
                email,
                password: &form.password,
                phone_number: form.phone_number.trim(),
            })
            .await?;

        let user_id = response.user.id.to_string();
        if let Some(token) = response.token.filter(|t| !t.trim().is_empty()) {
            self.login(&Session {
                auth_token: token,
                user_id,
                session_id: response.session_id.map(|id| id.to_string()).unwrap_or_default(),
                user_email: response.user.email,
            })?;
            self.session.clear_signup_draft()?;
            return Ok(SignUpOutcome::SignedIn);
        }

        tracing::info!(%user_id, "registration accepted, awaiting code");
        *self.pending.borrow_mut() = Some(PendingVerification {
            user_id,
            email: response.user.email,
        });
        self.notices.push(Notice::SignupCompleted);
        Ok(SignUpOutcome::VerificationRequired)
    }

    pub fn pending_verification(&self) -> Option<PendingVerification> {
        self.pending.borrow().clone()
    }

    pub fn verification_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Submits a two-factor code for the pending registration.
    pub async fn verify_code(&self, code: &str) -> Result<Route, ApiError> {
        let pending = self
            .pending_verification()
            .ok_or_else(|| ApiError::Validation("Please sign up first.".to_string()))?;

        let session = self
            .api
            .verify_otp(code, &pending.user_id)
            .await?
            .into_session()?;
        self.login(&session)?;
        self.pending.borrow_mut().take();
        if let Err(e) = self.session.clear_signup_draft() {
            tracing::warn!(error = %e, "failed to clear signup draft");
        }
        Ok(Route::Chat)
    }

    /// Asks the backend to email a fresh code; returns its message, if any.
    pub async fn resend_code(&self) -> Result<Option<String>, ApiError> {
        let pending = self
            .pending_verification()
            .ok_or_else(|| ApiError::Validation("Please sign up first.".to_string()))?;
        Ok(self.api.resend_otp(&pending.user_id).await?.message)
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::Validation(MISSING_EMAIL.to_string()));
        }
        self.api.request_password_reset(email).await?;
        self.notices.push(Notice::PasswordResetRequested);
        Ok(())
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<(), ApiError> {
        if form.old_password.is_empty() || form.new_password.is_empty() {
            return Err(ApiError::Validation(MISSING_FIELDS.to_string()));
        }
        if form.new_password != form.confirm_password {
            return Err(ApiError::Validation(PASSWORD_MISMATCH.to_string()));
        }
        self.api
            .change_password(&form.old_password, &form.new_password)
            .await?;
        self.notices.push(Notice::PasswordChanged);
        Ok(())
    }
}
