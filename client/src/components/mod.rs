pub mod auth;
pub mod chat;
pub mod guard;
pub mod password;
pub mod toast;
pub mod two_factor;
