use chatdesk_core::auth::ChangePasswordForm;
use chatdesk_core::Route as AppRoute;
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions};

use crate::context::{spawn_scoped, use_app, use_request_scope};

#[component]
pub fn ForgotPassword() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    let (email, set_email) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (loading, set_loading) = create_signal(false);

    let handle_submit = {
        let navigate = navigate.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            if loading.get_untracked() {
                return;
            }
            set_loading.set(true);
            set_error.set(None);

            let auth = app.auth.clone();
            let navigate = navigate.clone();
            let email = email.get_untracked();
            spawn_scoped(&scope, async move {
                match auth.request_password_reset(&email).await {
                    // the sign-in view announces the reset
                    Ok(()) => navigate(AppRoute::SignIn.path(), NavigateOptions::default()),
                    Err(e) => set_error.set(Some(e.display_message())),
                }
                set_loading.set(false);
            });
        }
    };

    view! {
        <div class="auth-container">
            <form class="auth-form" on:submit=handle_submit>
                <h2>"Forgot Password"</h2>
                <p>"Enter your email and we'll send you a new password."</p>
                {move || error.get().map(|e| view! { <div class="error-message">{e}</div> })}
                <input
                    type="email"
                    placeholder="Email"
                    prop:value=email
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    disabled=loading
                />
                <button type="submit" disabled=loading>
                    {move || if loading.get() { "Sending..." } else { "Reset Password" }}
                </button>
                <button
                    type="button"
                    class="secondary"
                    on:click=move |_| navigate(AppRoute::SignIn.path(), NavigateOptions::default())
                >
                    "Back to Sign In"
                </button>
            </form>
        </div>
    }
}

#[component]
pub fn ChangePassword() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    let (old_password, set_old_password) = create_signal(String::new());
    let (new_password, set_new_password) = create_signal(String::new());
    let (confirm_password, set_confirm_password) = create_signal(String::new());
    let (error, set_error) = create_signal(Option::<String>::None);
    let (loading, set_loading) = create_signal(false);

    let handle_submit = {
        let navigate = navigate.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            if loading.get_untracked() {
                return;
            }
            set_loading.set(true);
            set_error.set(None);

            let form = ChangePasswordForm {
                old_password: old_password.get_untracked(),
                new_password: new_password.get_untracked(),
                confirm_password: confirm_password.get_untracked(),
            };
            let auth = app.auth.clone();
            let navigate = navigate.clone();
            spawn_scoped(&scope, async move {
                match auth.change_password(&form).await {
                    // the chat view announces the change
                    Ok(()) => navigate(AppRoute::Chat.path(), NavigateOptions::default()),
                    Err(e) => set_error.set(Some(e.display_message())),
                }
                set_loading.set(false);
            });
        }
    };

    view! {
        <div class="auth-container">
            <form class="auth-form" on:submit=handle_submit>
                <h2>"Change Password"</h2>
                {move || error.get().map(|e| view! { <div class="error-message">{e}</div> })}
                <input
                    type="password"
                    placeholder="Current password"
                    prop:value=old_password
                    on:input=move |ev| set_old_password.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="password"
                    placeholder="New password"
                    prop:value=new_password
                    on:input=move |ev| set_new_password.set(event_target_value(&ev))
                    disabled=loading
                />
                <input
                    type="password"
                    placeholder="Confirm new password"
                    prop:value=confirm_password
                    on:input=move |ev| set_confirm_password.set(event_target_value(&ev))
                    disabled=loading
                />
                <button type="submit" disabled=loading>
                    {move || if loading.get() { "Saving..." } else { "Change Password" }}
                </button>
                <button
                    type="button"
                    class="secondary"
                    on:click=move |_| navigate(AppRoute::Chat.path(), NavigateOptions::default())
                >
                    "Back to Chat"
                </button>
            </form>
        </div>
    }
}
