//! Todo App
//!
//! Page shell: title, live todo list and the sync hint panel.

use leptos::prelude::*;
use leptos_use::use_locales as use_preferred_languages;
use shape_client::{ShapeParams, ShapeProvider};

use crate::components::{SyncHint, TodoListView};
use crate::config::AppConfig;
use crate::i18n::Locale;

#[component]
pub fn App() -> impl IntoView {
    let config = AppConfig::from_env();
    let locale = Locale::detect(requested_lang().as_deref(), &use_preferred_languages().get_untracked());
    let strings = locale.strings();

    log::info!(
        "[App] following '{}' at {} ({:?})",
        config.table,
        config.shape_url,
        locale
    );

    view! {
        <ShapeProvider url=config.shape_url.clone()>
            <div class="app">
                <h1>{strings.title}</h1>
                <TodoListView params=ShapeParams::table(config.table) locale=locale />
                <SyncHint locale=locale />
            </div>
        </ShapeProvider>
    }
}

/// `lang` query parameter of the current page, if any.
fn requested_lang() -> Option<String> {
    let search = window().location().search().ok()?;
    web_sys::UrlSearchParams::new_with_str(&search).ok()?.get("lang")
}
