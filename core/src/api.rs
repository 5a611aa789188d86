use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::session::Session;

pub const LOGIN_PATH: &str = "auth/users/login/";
pub const REGISTER_PATH: &str = "auth/users/register/";
pub const VERIFY_OTP_PATH: &str = "auth/users/verify_otp/";
pub const RESEND_OTP_PATH: &str = "auth/users/resend_otp/";
pub const PASSWORD_RESET_PATH: &str = "auth/users/request-password-reset/";
pub const CHANGE_PASSWORD_PATH: &str = "auth/users/change-password/";
pub const CHATBOT_PATH: &str = "chat/chatbot/";
pub const MESSAGES_PATH: &str = "chat/messages/";

pub fn history_path(session_id: &str) -> String {
    format!("chat/history/{session_id}/")
}

/// User ids arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserId::Number(id) => write!(f, "{id}"),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body returned by login and OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserInfo,
    pub session_id: UserId,
}

impl SessionResponse {
    pub fn into_session(self) -> Result<Session, ApiError> {
        if self.token.trim().is_empty() {
            return Err(ApiError::Decode("response missing token".to_string()));
        }
        Ok(Session {
            auth_token: self.token,
            user_id: self.user.id.to_string(),
            session_id: self.session_id.to_string(),
            user_email: self.user.email,
        })
    }
}

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone_number: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    pub user: UserInfo,
    #[serde(default)]
    pub session_id: Option<UserId>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub otp: &'a str,
    pub user_id: &'a str,
}

#[derive(Serialize)]
pub struct ResendOtpRequest<'a> {
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct PasswordResetRequest<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub graph: Option<String>,
    pub is_sender: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryEntry>,
}

#[derive(Serialize)]
pub struct ChatbotRequest<'a> {
    pub user_id: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatbotResponse {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub graph: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveMessageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<&'a str>,
    pub session_id: &'a str,
    pub is_sender: bool,
}

/// Typed endpoints of the backend REST service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
}

impl ApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse, ApiError> {
        self.http
            .post_json(LOGIN_PATH, &LoginRequest { email, password })
            .await
    }

    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<RegisterResponse, ApiError> {
        self.http.post_json(REGISTER_PATH, request).await
    }

    pub async fn verify_otp(&self, otp: &str, user_id: &str) -> Result<SessionResponse, ApiError> {
        self.http
            .post_json(VERIFY_OTP_PATH, &VerifyOtpRequest { otp, user_id })
            .await
    }

    /// An empty success body carries no message.
    pub async fn resend_otp(&self, user_id: &str) -> Result<MessageResponse, ApiError> {
        self.http
            .post_json_or_default(RESEND_OTP_PATH, &ResendOtpRequest { user_id })
            .await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        self.http
            .post(PASSWORD_RESET_PATH, &PasswordResetRequest { email })
            .await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), ApiError> {
        self.http
            .post(
                CHANGE_PASSWORD_PATH,
                &ChangePasswordRequest {
                    old_password,
                    new_password,
                },
            )
            .await
    }

    pub async fn chat_history(&self, session_id: &str) -> Result<HistoryResponse, ApiError> {
        self.http.get_json(&history_path(session_id)).await
    }

    pub async fn chatbot(&self, user_id: &str, prompt: &str) -> Result<ChatbotResponse, ApiError> {
        self.http
            .post_json(CHATBOT_PATH, &ChatbotRequest { user_id, prompt })
            .await
    }

    pub async fn save_message(&self, request: &SaveMessageRequest<'_>) -> Result<(), ApiError> {
        self.http.post(MESSAGES_PATH, request).await
    }
}
