#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use chatdesk_core::auth::Navigator;
use chatdesk_core::http::{HttpRequest, HttpResponse, Transport};
use chatdesk_core::storage::MemoryStore;
use chatdesk_core::{
    ApiClient, ApiError, AuthService, ChatService, ClientConfig, HttpClient, Notifications, Route,
    SessionStore,
};

pub const BASE_URL: &str = "https://api.test/api/";

/// Answers requests from per-path queues and records what was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<Vec<(String, VecDeque<Result<HttpResponse, ApiError>>)>>,
    pub sent: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn reply(&self, path: &str, status: u16, body: &str) {
        self.push(
            path,
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, path: &str, error: ApiError) {
        self.push(path, Err(error));
    }

    fn push(&self, path: &str, reply: Result<HttpResponse, ApiError>) {
        let url = format!("{BASE_URL}{path}");
        let mut replies = self.replies.borrow_mut();
        match replies.iter_mut().find(|(existing, _)| *existing == url) {
            Some((_, queue)) => queue.push_back(reply),
            None => replies.push((url, VecDeque::from([reply]))),
        }
    }

    pub fn count(&self, path: &str) -> usize {
        let url = format!("{BASE_URL}{path}");
        self.sent.borrow().iter().filter(|r| r.url == url).count()
    }

    pub fn bodies(&self, path: &str) -> Vec<serde_json::Value> {
        let url = format!("{BASE_URL}{path}");
        self.sent
            .borrow()
            .iter()
            .filter(|r| r.url == url)
            .filter_map(|r| r.body.as_deref())
            .map(|b| serde_json::from_str(b).expect("request body is json"))
            .collect()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.clone();
        self.sent.borrow_mut().push(request);
        self.replies
            .borrow_mut()
            .iter_mut()
            .find(|(existing, _)| *existing == url)
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| Err(ApiError::Network(format!("no reply scripted for {url}"))))
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub routes: RefCell<Vec<Route>>,
    pub external: RefCell<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.borrow_mut().push(route);
    }

    fn redirect_external(&self, url: &str) {
        self.external.borrow_mut().push(url.to_string());
    }
}

pub struct Harness {
    pub storage: Rc<MemoryStore>,
    pub session: SessionStore,
    pub transport: Rc<ScriptedTransport>,
    pub navigator: Rc<RecordingNavigator>,
    pub config: ClientConfig,
    pub auth: AuthService,
    pub chat: ChatService,
}

impl Harness {
    pub fn new() -> Self {
        let storage = Rc::new(MemoryStore::new());
        let session = SessionStore::new(storage.clone());
        let transport = Rc::new(ScriptedTransport::default());
        let navigator = Rc::new(RecordingNavigator::default());
        let config = ClientConfig {
            api_base_url: BASE_URL.to_string(),
            pricing_url: "https://pricing.test/plans".to_string(),
            ..ClientConfig::default()
        };

        let api = ApiClient::new(HttpClient::new(
            config.api_base_url.clone(),
            session.clone(),
            transport.clone(),
        ));
        let auth = AuthService::new(api.clone(), Notifications::new(), navigator.clone(), &config);
        let chat = ChatService::new(api);

        Self {
            storage,
            session,
            transport,
            navigator,
            config,
            auth,
            chat,
        }
    }
}

pub const LOGIN_OK: &str =
    r#"{"token":"tok-1","user":{"id":12,"email":"ana@example.com"},"session_id":"sess-9"}"#;
