use crate::config::EnvConfig;
use crate::pages::{AuthGate, FATAL_MESSAGE};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::Router;

#[component]
pub fn App() -> impl IntoView {
    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <ErrorBoundary fallback=|errors| {
                for (_, e) in errors.get_untracked().into_iter() {
                    log::error!("{e:?}");
                }
                view! {
                    <div class="flex min-h-screen items-center justify-center px-4">
                        <h1 class="text-sm font-medium text-foreground">{FATAL_MESSAGE}</h1>
                    </div>
                }
            }>
                <Shell />
            </ErrorBoundary>
        </Router>
    }
}

/// Loads `window.ENV` and provides the app context. Invalid configuration surfaces as an error.
#[component]
fn Shell() -> impl IntoView {
    match EnvConfig::load() {
        Ok(config) => {
            log::debug!("using database {}", config.database_url);
            provide_context(AppContext(AppState::new(config)));
            Ok(view! { <AuthGate /> })
        }
        Err(e) => Err(e),
    }
}
