use chatdesk_core::chat::{continues_run, initials, prompt_from_input};
use chatdesk_core::{ChatMessage, Notice, Route as AppRoute};
use gloo_timers::callback::Interval;
use leptos::html::Div;
use leptos::*;
use leptos_router::{use_navigate, NavigateOptions};
use web_sys::KeyboardEvent;

use crate::context::{spawn_scoped, use_app, use_request_scope};

/// Cycles the typing indicator through ".", "..", "...".
fn next_dots(dots: &str) -> String {
    if dots.len() >= 3 {
        ".".to_string()
    } else {
        format!("{dots}.")
    }
}

#[component]
pub fn Chat() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let scope = use_request_scope();

    let messages = create_rw_signal(Vec::<ChatMessage>::new());
    let (input_value, set_input_value) = create_signal(String::new());
    let (loading_history, set_loading_history) = create_signal(true);
    let (is_typing, set_is_typing) = create_signal(false);
    let (dots, set_dots) = create_signal(".".to_string());
    let (menu_open, set_menu_open) = create_signal(false);
    let email = app.auth.session().user_email().unwrap_or_default();

    let messages_ref = create_node_ref::<Div>();

    for notice in [Notice::LoginSucceeded, Notice::PasswordChanged] {
        if app.auth.notices().take(notice) {
            app.toasts.success(notice.message());
        }
    }

    // Load history on mount
    {
        let chat = app.chat.clone();
        spawn_scoped(&scope, async move {
            match chat.load_history().await {
                Ok(history) => messages.set(history),
                Err(e) => tracing::error!(error = %e, "failed to load chat history"),
            }
            set_loading_history.set(false);
        });
    }

    let typing_ticker = store_value(Some(Interval::new(500, move || {
        if is_typing.get_untracked() {
            set_dots.update(|d| *d = next_dots(d));
        }
    })));
    on_cleanup(move || {
        typing_ticker.update_value(|interval| {
            interval.take();
        });
    });

    // Auto-scroll to bottom when messages change
    create_effect(move |_| {
        messages.track();
        is_typing.track();
        if let Some(element) = messages_ref.get() {
            request_animation_frame(move || {
                element.set_scroll_top(element.scroll_height());
            });
        }
    });

    let submit_message = {
        let chat = app.chat.clone();
        let toasts = app.toasts;
        move || {
            let input = input_value.get_untracked();
            let Some(prompt) = prompt_from_input(&input).map(str::to_string) else {
                return;
            };
            if is_typing.get_untracked() {
                return;
            }

            messages.update(|m| m.push(ChatMessage::user(prompt.clone())));
            set_input_value.set(String::new());
            set_dots.set(".".to_string());
            set_is_typing.set(true);

            let chat = chat.clone();
            spawn_scoped(&scope, async move {
                match chat.send_prompt(&prompt).await {
                    Ok(replies) => messages.update(|m| m.extend(replies)),
                    Err(e) => {
                        tracing::error!(error = %e, "chatbot request failed");
                        toasts.error(e.display_message());
                    }
                }
                set_is_typing.set(false);
            });
        }
    };

    let handle_keydown = {
        let submit_message = submit_message.clone();
        move |event: KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() {
                event.prevent_default();
                submit_message();
            }
        }
    };

    let logout = {
        let auth = app.auth.clone();
        move |_: ev::MouseEvent| {
            set_menu_open.set(false);
            if let Err(e) = auth.logout() {
                tracing::error!(error = %e, "failed to clear session");
            }
        }
    };

    let avatar = initials(&email);

    view! {
        <div class="chat-page">
            <header class="chat-header">
                <h1 class="logo">"ChatDesk"</h1>
                <div class="user-menu">
                    <button class="avatar" on:click=move |_| set_menu_open.update(|open| *open = !*open)>
                        {avatar}
                    </button>
                    <Show when=move || menu_open.get()>
                        <div class="dropdown">
                            <div class="dropdown-email">{email.clone()}</div>
                            <button on:click={
                                let navigate = navigate.clone();
                                move |_| {
                                    set_menu_open.set(false);
                                    navigate(AppRoute::ChangePassword.path(), NavigateOptions::default());
                                }
                            }>
                                "Change Password"
                            </button>
                            <button on:click=logout.clone()>"Logout"</button>
                        </div>
                    </Show>
                </div>
            </header>

            <div class="messages" node_ref=messages_ref>
                <Show
                    when=move || !loading_history.get()
                    fallback=|| view! { <div class="spinner">"Loading conversation..."</div> }
                >
                    {move || {
                        let all = messages.get();
                        all.iter()
                            .enumerate()
                            .map(|(index, message)| {
                                let side = if message.is_sender { "message user" } else { "message bot" };
                                let class = if continues_run(&all, index) {
                                    format!("{side} continued")
                                } else {
                                    side.to_string()
                                };
                                let lines = message
                                    .lines()
                                    .into_iter()
                                    .map(|line| view! { <span>{line.to_string()}</span><br/> })
                                    .collect_view();
                                let graph = message
                                    .graph_src()
                                    .map(|src| view! { <img class="graph" src=src alt="Graph"/> });
                                view! { <div class=class>{lines}{graph}</div> }
                            })
                            .collect_view()
                    }}
                    <Show when=move || is_typing.get()>
                        <div class="message bot typing">{move || dots.get()}</div>
                    </Show>
                </Show>
            </div>

            <div class="input-container">
                <textarea
                    class="chat-input"
                    placeholder="Type your message... (Enter to send, Shift+Enter for new line)"
                    prop:value=move || input_value.get()
                    on:input=move |ev| set_input_value.set(event_target_value(&ev))
                    on:keydown=handle_keydown
                    disabled=move || is_typing.get()
                    rows="3"
                />
                <button
                    class="send-button"
                    on:click=move |_| submit_message()
                    disabled=move || is_typing.get() || prompt_from_input(&input_value.get()).is_none()
                >
                    "Send"
                </button>
            </div>
        </div>
    }
}
