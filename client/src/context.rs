//! App-wide services and the reactive authentication status.

use std::future::Future;
use std::rc::Rc;

use chatdesk_core::auth::Navigator;
use chatdesk_core::{
    ApiClient, AuthService, AuthStatus, ChatService, ClientConfig, HttpClient, Notifications,
    RequestScope, Route as AppRoute, SessionStore,
};
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions};

use crate::api::{CookieCsrf, FetchTransport};
use crate::components::toast::Toasts;
use crate::storage::BrowserStorage;

#[derive(Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub auth: AuthService,
    pub chat: ChatService,
    /// `Loading` until the one-time session check at mount.
    pub status: RwSignal<AuthStatus>,
    pub toasts: Toasts,
}

pub fn use_app() -> AppContext {
    expect_context::<AppContext>()
}

struct RouterNavigator {
    navigate: Rc<dyn Fn(&str, NavigateOptions)>,
}

impl Navigator for RouterNavigator {
    fn navigate(&self, route: AppRoute) {
        (self.navigate)(route.path(), NavigateOptions::default());
    }

    fn redirect_external(&self, url: &str) {
        if let Err(e) = window().location().set_href(url) {
            tracing::error!(url, error = ?e, "external redirect failed");
        }
    }
}

/// Builds the services, tracks the session and holds back `children` until
/// the first session check has completed.
#[component]
pub fn AuthProvider(config: ClientConfig, children: ChildrenFn) -> impl IntoView {
    let navigator = Rc::new(RouterNavigator {
        navigate: Rc::new(use_navigate()),
    });
    let session = SessionStore::new(BrowserStorage);
    let http = HttpClient::new(
        config.api_base_url.clone(),
        session.clone(),
        Rc::new(FetchTransport::new(config.request_timeout_ms)),
    )
    .with_csrf(Rc::new(CookieCsrf));
    let api = ApiClient::new(http);
    let auth = AuthService::new(api.clone(), Notifications::new(), navigator, &config);
    let status = create_rw_signal(AuthStatus::Loading);
    let toasts = Toasts::new(config.toast_timeout_ms);

    provide_context(AppContext {
        config,
        auth,
        chat: ChatService::new(api),
        status,
        toasts,
    });

    let subscription = session.subscribe({
        let session = session.clone();
        move |event| {
            tracing::debug!(?event, "session changed");
            if let Some(next) = status.get_untracked().recheck(&session) {
                status.set(next);
            }
        }
    });

    // other tabs write the same localStorage keys
    let storage_listener = window_event_listener(ev::storage, {
        let session = session.clone();
        move |_| session.sync_external_change()
    });

    on_cleanup({
        let session = session.clone();
        move || {
            session.unsubscribe(subscription);
            storage_listener.remove();
        }
    });

    create_effect(move |_| {
        let checked = AuthStatus::check(&session);
        tracing::info!(authenticated = checked.is_authenticated(), "session checked");
        status.set(checked);
    });

    view! {
        <Show
            when=move || !status.get().is_loading()
            fallback=|| view! { <div class="loading-screen">"Loading..."</div> }
        >
            {children()}
        </Show>
    }
}

/// Cancels the view's requests when it is torn down.
pub fn use_request_scope() -> RequestScope {
    let scope = RequestScope::new();
    on_cleanup({
        let scope = scope.clone();
        move || scope.cancel()
    });
    scope
}

/// Spawns `task` so that it is dropped if `scope` is cancelled first.
pub fn spawn_scoped(scope: &RequestScope, task: impl Future<Output = ()> + 'static) {
    let task = scope.run(task);
    spawn_local(async move {
        if task.await.is_none() {
            tracing::debug!("request abandoned by its view");
        }
    });
}
