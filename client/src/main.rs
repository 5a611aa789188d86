use chatdesk_core::{ClientConfig, Route as AppRoute};
use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use wasm_bindgen::JsCast;

mod api;
mod components;
mod context;
mod storage;

use components::{
    auth::{SignIn, SignUp},
    chat::Chat,
    guard::Guarded,
    password::{ChangePassword, ForgotPassword},
    toast::ToastHost,
    two_factor::TwoFactor,
};
use context::AuthProvider;

const CONFIG: &str = include_str!("../../config/client.toml");

fn load_config() -> ClientConfig {
    match ClientConfig::load(
        CONFIG,
        option_env!("CHATDESK_API_URL"),
        option_env!("CHATDESK_PRICING_URL"),
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid client config, using defaults");
            ClientConfig::default()
        }
    }
}

#[component]
fn App(config: ClientConfig) -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="ChatDesk"/>
        <Meta name="viewport" content="width=device-width, initial-scale=1.0"/>

        <Router>
            <AuthProvider config=config>
                <ToastHost/>
                <main>
                    <Routes>
                        <Route path=AppRoute::Root.path() view=|| view! {
                            <Guarded route=AppRoute::Root><SignIn/></Guarded>
                        }/>
                        <Route path=AppRoute::SignIn.path() view=|| view! {
                            <Guarded route=AppRoute::SignIn><SignIn/></Guarded>
                        }/>
                        <Route path=AppRoute::SignUp.path() view=|| view! {
                            <Guarded route=AppRoute::SignUp><SignUp/></Guarded>
                        }/>
                        <Route path=AppRoute::TwoFactor.path() view=|| view! {
                            <Guarded route=AppRoute::TwoFactor><TwoFactor/></Guarded>
                        }/>
                        <Route path=AppRoute::ForgotPassword.path() view=|| view! {
                            <Guarded route=AppRoute::ForgotPassword><ForgotPassword/></Guarded>
                        }/>
                        <Route path=AppRoute::ChangePassword.path() view=|| view! {
                            <Guarded route=AppRoute::ChangePassword><ChangePassword/></Guarded>
                        }/>
                        <Route path=AppRoute::Chat.path() view=|| view! {
                            <Guarded route=AppRoute::Chat><Chat/></Guarded>
                        }/>
                        <Route path=AppRoute::NotFound.path() view=NotFound/>
                    </Routes>
                </main>
            </AuthProvider>
        </Router>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="not-found">
            <h2>"404 - Page Not Found"</h2>
            <p>"The page you are looking for does not exist."</p>
            <A href=AppRoute::SignIn.path()>"Go to Sign In"</A>
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();

    // Initialize tracing for WASM
    tracing_wasm::set_as_global_default();

    let config = load_config();
    tracing::info!(api = %config.api_base_url, "starting client");

    // Mount the app to the #app div
    let Some(app_div) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("app"))
    else {
        tracing::error!("no #app element to mount into");
        return;
    };
    leptos::mount_to(app_div.unchecked_into(), move || view! { <App config=config/> });
}
