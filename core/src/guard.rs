//! Navigation-layer guard, evaluated before a view is constructed.

use crate::auth::AuthStatus;
use crate::routes::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    /// Location the user originally asked for.
    pub from: Option<String>,
}

impl Redirect {
    pub fn to(route: Route) -> Self {
        Self { to: route, from: None }
    }

    /// Target href, with the requested location percent-encoded into `?from=`.
    pub fn href(&self) -> String {
        match &self.from {
            Some(from) => {
                let from: String = url::form_urlencoded::byte_serialize(from.as_bytes()).collect();
                format!("{}?from={}", self.to.path(), from)
            }
            None => self.to.path().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The initial session check has not completed.
    Pending,
    Allow,
    Redirect(Redirect),
}

/// What the guard knows about the client when a route is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardInput<'a> {
    pub route: Route,
    pub location: &'a str,
    pub status: AuthStatus,
    pub verification_pending: bool,
}

/// Rebuilds a location from a path and a query string without its `?`.
pub fn requested_location(pathname: &str, search: &str) -> String {
    if search.is_empty() {
        pathname.to_string()
    } else {
        format!("{pathname}?{search}")
    }
}

pub fn evaluate(input: GuardInput<'_>) -> GuardDecision {
    let authenticated = match input.status {
        AuthStatus::Loading => return GuardDecision::Pending,
        AuthStatus::Ready { authenticated } => authenticated,
    };

    let route = input.route;
    if route.is_protected() && !authenticated {
        tracing::debug!(location = input.location, "unauthenticated, redirecting to sign-in");
        return GuardDecision::Redirect(Redirect {
            to: Route::SignIn,
            from: Some(input.location.to_string()),
        });
    }
    if route == Route::TwoFactor && !input.verification_pending {
        return GuardDecision::Redirect(Redirect::to(Route::SignUp));
    }
    if route.is_guest_only() && authenticated {
        return GuardDecision::Redirect(Redirect::to(Route::Chat));
    }
    GuardDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(route: Route, status: AuthStatus) -> GuardInput<'static> {
        GuardInput {
            route,
            location: route.path(),
            status,
            verification_pending: false,
        }
    }

    const SIGNED_IN: AuthStatus = AuthStatus::Ready { authenticated: true };
    const SIGNED_OUT: AuthStatus = AuthStatus::Ready { authenticated: false };

    #[test]
    fn protected_views_render_only_with_a_token() {
        for route in [Route::Chat, Route::ChangePassword] {
            assert_eq!(evaluate(input(route, SIGNED_IN)), GuardDecision::Allow);
            assert_eq!(
                evaluate(input(route, SIGNED_OUT)),
                GuardDecision::Redirect(Redirect {
                    to: Route::SignIn,
                    from: Some(route.path().to_string()),
                })
            );
        }
    }

    #[test]
    fn nothing_is_decided_while_loading() {
        for route in Route::ALL {
            assert_eq!(evaluate(input(route, AuthStatus::Loading)), GuardDecision::Pending);
        }
    }

    #[test]
    fn redirect_carries_requested_location() {
        let decision = evaluate(GuardInput {
            location: "/chatpage?tab=history",
            ..input(Route::Chat, SIGNED_OUT)
        });
        let redirect = match decision {
            GuardDecision::Redirect(redirect) => redirect,
            other => panic!("expected redirect, got {other:?}"),
        };
        assert_eq!(redirect.href(), "/signin?from=%2Fchatpage%3Ftab%3Dhistory");
    }

    #[test]
    fn requested_location_joins_path_and_query() {
        assert_eq!(requested_location("/chatpage", ""), "/chatpage");
        assert_eq!(requested_location("/chatpage", "tab=history"), "/chatpage?tab=history");
    }

    #[test]
    fn two_factor_requires_a_completed_signup() {
        assert_eq!(
            evaluate(input(Route::TwoFactor, SIGNED_OUT)),
            GuardDecision::Redirect(Redirect::to(Route::SignUp))
        );
        let armed = GuardInput {
            verification_pending: true,
            ..input(Route::TwoFactor, SIGNED_OUT)
        };
        assert_eq!(evaluate(armed), GuardDecision::Allow);
    }

    #[test]
    fn signed_in_users_skip_the_sign_in_view() {
        assert_eq!(
            evaluate(input(Route::SignIn, SIGNED_IN)),
            GuardDecision::Redirect(Redirect::to(Route::Chat))
        );
        assert_eq!(evaluate(input(Route::SignIn, SIGNED_OUT)), GuardDecision::Allow);
        assert_eq!(evaluate(input(Route::SignUp, SIGNED_IN)), GuardDecision::Allow);
    }
}
