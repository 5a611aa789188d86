use chatdesk_core::auth::{SignInFailure, SignUpForm, SignUpOutcome};
use chatdesk_core::{Notice, Route as AppRoute};
use gloo_timers::callback::Timeout;
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions, A};

use crate::context::{spawn_scoped, use_app, use_request_scope};

#[component]
pub fn SignIn() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (loading, set_loading) = create_signal(false);

    if app.auth.notices().take(Notice::PasswordResetRequested) {
        app.toasts.success(Notice::PasswordResetRequested.message());
    }

    let handle_submit = {
        let app = app.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            if loading.get_untracked() {
                return;
            }
            set_loading.set(true);

            let auth = app.auth.clone();
            let toasts = app.toasts;
            let navigate = navigate.clone();
            let email = email.get_untracked();
            let password = password.get_untracked();
            spawn_scoped(&scope, async move {
                match auth.sign_in(&email, &password).await {
                    Ok(route) => navigate(route.path(), NavigateOptions::default()),
                    Err(SignInFailure::Forbidden { message, redirect }) => {
                        toasts.error(message);
                        Timeout::new(redirect.delay_ms, move || auth.follow_external(&redirect))
                            .forget();
                    }
                    Err(failure) => {
                        tracing::warn!(error = %failure, "sign-in failed");
                        toasts.error(failure.display_message());
                    }
                }
                set_loading.set(false);
            });
        }
    };

    view! {
        <div class="auth-container">
            <form class="auth-form" on:submit=handle_submit>
                <h2>"Sign In"</h2>
                <input
                    type="email"
                    placeholder="Email"
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    disabled=loading
                />
                <A href=AppRoute::ForgotPassword.path() class="auth-link">"Forgot password?"</A>
                <button type="submit" disabled=loading>
                    {move || if loading.get() { "Signing in..." } else { "Sign In" }}
                </button>
                <p class="auth-switch">
                    "Don't have an account? "
                    <A href=AppRoute::SignUp.path()>"Sign up"</A>
                </p>
            </form>
        </div>
    }
}

#[component]
pub fn SignUp() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    // a draft left by an earlier attempt pre-fills the form
    let draft = app.auth.session().signup_draft().unwrap_or_default();
    let (username, set_username) = create_signal(draft.name);
    let (email, set_email) = create_signal(draft.email);
    let (password, set_password) = create_signal(String::new());
    let (phone_number, set_phone_number) = create_signal(draft.number);
    let (loading, set_loading) = create_signal(false);

    let handle_submit = {
        let app = app.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            if loading.get_untracked() {
                return;
            }
            set_loading.set(true);

            let form = SignUpForm {
                username: username.get_untracked(),
                email: email.get_untracked(),
                password: password.get_untracked(),
                phone_number: phone_number.get_untracked(),
            };
            let auth = app.auth.clone();
            let toasts = app.toasts;
            let navigate = navigate.clone();
            spawn_scoped(&scope, async move {
                match auth.sign_up(&form).await {
                    Ok(outcome) => {
                        if outcome == SignUpOutcome::VerificationRequired {
                            tracing::info!(email = %form.email, "registered, awaiting code");
                        }
                        navigate(outcome.route().path(), NavigateOptions::default());
                    }
                    Err(error) => {
                        tracing::warn!(%error, "sign-up failed");
                        toasts.error(error.display_message());
                    }
                }
                set_loading.set(false);
            });
        }
    };

    view! {
        <div class="auth-container">
            <form class="auth-form" on:submit=handle_submit>
                <h2>"Create Account"</h2>
                <input
                    type="text"
                    placeholder="Username"
                    prop:value=username
                    on:input=move |ev| set_username.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="email"
                    placeholder="Email"
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="password"
                    placeholder="Password"
                    prop:value=password
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="tel"
                    placeholder="Phone number"
                    prop:value=phone_number
                    on:input=move |ev| set_phone_number.set(event_target_value(&ev))
                    disabled=loading
                />
                <button type="submit" disabled=loading>
                    {move || if loading.get() { "Creating account..." } else { "Sign Up" }}
                </button>
                <p class="auth-switch">
                    "Already have an account? "
                    <A href=AppRoute::SignIn.path()>"Sign in"</A>
                </p>
            </form>
        </div>
    }
}
