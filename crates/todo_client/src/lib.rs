//! Todo Client
//!
//! Leptos CSR app that renders the `todos` shape as a live list.

pub mod app;
pub mod components;
pub mod config;
pub mod i18n;

pub use app::App;
pub use components::{TodoList, TodoListModel, TodoListView, TodoStatus};
pub use config::AppConfig;
pub use i18n::Locale;
