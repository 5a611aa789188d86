use chatdesk_core::two_factor::{GateState, CODE_LENGTH};
use chatdesk_core::{Notice, Route as AppRoute, TwoFactorGate};
use gloo_timers::callback::Interval;
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions, Redirect};
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::context::{spawn_scoped, use_app, use_request_scope};

fn focus_sibling(input: &HtmlInputElement, forward: bool) {
    let sibling = if forward {
        input.next_element_sibling()
    } else {
        input.previous_element_sibling()
    };
    if let Some(element) = sibling.and_then(|s| s.dyn_into::<HtmlElement>().ok()) {
        let _ = element.focus();
    }
}

#[component]
pub fn TwoFactor() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    let mut initial = TwoFactorGate::new(app.config.resend_cooldown_ticks);
    if let Err(route) = initial.enter(app.auth.verification_pending()) {
        return view! { <Redirect path=route.path()/> }.into_view();
    }
    let gate = create_rw_signal(initial);
    let email = app
        .auth
        .pending_verification()
        .map(|pending| pending.email)
        .unwrap_or_default();

    if app.auth.notices().take(Notice::SignupCompleted) {
        app.toasts.success(Notice::SignupCompleted.message());
    }

    let ticker = store_value(Some(Interval::new(1_000, move || {
        if gate.with_untracked(|g| g.cooldown() > 0) {
            gate.update(|g| {
                g.tick();
            });
        }
    })));
    on_cleanup(move || {
        ticker.update_value(|interval| {
            interval.take();
        });
    });

    let on_input = move |index: usize, ev: ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let value = input.value();
        let accepted = gate.try_update(|g| g.set_digit(index, &value)).unwrap_or(false);
        if !accepted {
            let current = gate.with_untracked(|g| g.digit(index));
            input.set_value(&current.map(String::from).unwrap_or_default());
            return;
        }
        if !value.is_empty() {
            focus_sibling(&input, true);
        }
    };

    let on_keydown = move |index: usize, ev: KeyboardEvent| {
        let empty = gate.with_untracked(|g| g.digit(index).is_none());
        if ev.key() == "Backspace" && empty && index > 0 {
            focus_sibling(&event_target::<HtmlInputElement>(&ev), false);
        }
    };

    let verify = {
        let auth = app.auth.clone();
        let navigate = navigate.clone();
        let scope = scope.clone();
        move |_: ev::MouseEvent| {
            let Some(Ok(code)) = gate.try_update(|g| g.begin_verify()) else {
                return;
            };
            let auth = auth.clone();
            let navigate = navigate.clone();
            spawn_scoped(&scope, async move {
                let result = auth.verify_code(&code).await;
                if let Some(route) = gate.try_update(|g| g.finish_verify(result)).flatten() {
                    navigate(route.path(), NavigateOptions::default());
                }
            });
        }
    };

    let resend = {
        let auth = app.auth.clone();
        move |_: ev::MouseEvent| {
            if let Some(Err(e)) = gate.try_update(|g| g.begin_resend()) {
                tracing::debug!(error = %e, "resend refused");
                return;
            }
            let auth = auth.clone();
            spawn_scoped(&scope, async move {
                let result = auth.resend_code().await;
                gate.update(|g| g.finish_resend(result));
            });
        }
    };

    let boxes = (0..CODE_LENGTH)
        .map(|index| {
            view! {
                <input
                    class="code-box"
                    type="text"
                    inputmode="numeric"
                    maxlength="1"
                    prop:value=move || gate.with(|g| g.digit(index).map(String::from).unwrap_or_default())
                    on:input=move |ev| on_input(index, ev)
                    on:keydown=move |ev| on_keydown(index, ev)
                    disabled=move || gate.with(|g| g.is_busy())
                />
            }
        })
        .collect_view();

    view! {
        <div class="auth-container">
            <div class="auth-form two-factor">
                <h2>"Two-Factor Verification"</h2>
                <p>"Enter the 6-digit code sent to " <strong>{email}</strong></p>
                <div class="code-boxes">{boxes}</div>
                {move || gate.with(|g| g.error().map(|e| view! { <div class="error-message">{e.to_string()}</div> }))}
                {move || gate.with(|g| g.message().map(|m| view! { <div class="info-message">{m.to_string()}</div> }))}
                <button
                    on:click=verify
                    disabled=move || gate.with(|g| g.is_busy() || g.state() == GateState::Verified)
                >
                    {move || if gate.with(|g| g.is_busy()) { "Please wait..." } else { "Verify" }}
                </button>
                <button class="link-button" on:click=resend disabled=move || gate.with(|g| !g.can_resend())>
                    {move || match gate.with(|g| g.cooldown()) {
                        0 => "Resend code".to_string(),
                        seconds => format!("Resend in {}s", seconds),
                    }}
                </button>
                <button
                    class="secondary"
                    on:click=move |_| navigate(AppRoute::SignUp.path(), NavigateOptions::default())
                >
                    "Back"
                </button>
            </div>
        </div>
    }
    .into_view()
}
