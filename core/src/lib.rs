//! Session, routing and backend plumbing for the chatdesk web client.
//!
//! Nothing in this crate touches the browser. Persistent storage, the wire
//! transport, cookies and navigation all sit behind traits
//! ([`storage::KeyValueStore`], [`http::Transport`], [`http::CsrfSource`],
//! [`auth::Navigator`]) that the client binary implements with `gloo` and
//! `web-sys`, and that tests implement in memory.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod notify;
pub mod routes;
pub mod scope;
pub mod session;
pub mod storage;
pub mod two_factor;

pub use api::ApiClient;
pub use auth::{AuthService, AuthStatus, Navigator};
pub use chat::{ChatMessage, ChatService};
pub use config::ClientConfig;
pub use error::ApiError;
pub use guard::{GuardDecision, GuardInput, Redirect};
pub use http::HttpClient;
pub use notify::{Notice, Notifications};
pub use routes::Route;
pub use scope::RequestScope;
pub use session::{Session, SessionEvent, SessionStore};
pub use two_factor::{GateState, TwoFactorGate};
