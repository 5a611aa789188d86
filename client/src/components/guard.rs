use chatdesk_core::guard::{self, GuardDecision, GuardInput};
use chatdesk_core::{AuthStatus, Route as AppRoute};
use leptos::*;
use leptos_router::{use_location, Redirect};

use crate::context::use_app;

/// Guard decision for `route`; subscribers only hear about it when the
/// decision itself changes.
fn guard_decision(
    route: AppRoute,
    requested: impl Fn() -> String + 'static,
    status: RwSignal<AuthStatus>,
    verification_pending: impl Fn() -> bool + 'static,
) -> Memo<GuardDecision> {
    create_memo(move |_| {
        let requested = requested();
        guard::evaluate(GuardInput {
            route,
            location: &requested,
            status: status.get(),
            verification_pending: verification_pending(),
        })
    })
}

/// Decides whether `route` may render before any of `children` is built.
#[component]
pub fn Guarded(route: AppRoute, children: ChildrenFn) -> impl IntoView {
    let app = use_app();
    let location = use_location();

    let auth = app.auth.clone();
    let decision = guard_decision(
        route,
        move || guard::requested_location(&location.pathname.get(), &location.search.get()),
        app.status,
        move || auth.verification_pending(),
    );

    move || match decision.get() {
        GuardDecision::Pending => view! { <div class="loading-screen">"Loading..."</div> }.into_view(),
        GuardDecision::Allow => children().into_view(),
        GuardDecision::Redirect(redirect) => {
            tracing::debug!(to = %redirect.href(), "route guarded");
            view! { <Redirect path=redirect.href()/> }.into_view()
        }
    }
}
