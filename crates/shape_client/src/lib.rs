//! # Shape Client
//!
//! Reactive client for HTTP shape subscriptions with Leptos integration.
//!
//! A shape is a live, filtered view of one server-side table. This crate
//! follows shapes over HTTP and exposes each one as a Leptos signal holding
//! the latest complete snapshot.
//!
//! ## Features
//!
//! - **Automatic Subscription Management**: follow a shape with a single hook call
//! - **Subscription Deduplication**: components asking for the same shape share one stream
//! - **Lifecycle Management**: listener registered on mount, removed on unmount
//! - **Boundary Validation**: rows are schema-coerced and decoded into your type;
//!   a snapshot that does not decode is published as an empty list
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leptos::prelude::*;
//! use serde::Deserialize;
//! use shape_client::{ShapeParams, ShapeProvider, use_shape};
//!
//! #[derive(Deserialize, Clone)]
//! struct Todo {
//!     id: i64,
//!     task: String,
//!     completed: bool,
//! }
//!
//! #[component]
//! fn App() -> impl IntoView {
//!     view! {
//!         <ShapeProvider url="http://localhost:3000/v1/shape".to_string()>
//!             <Todos/>
//!         </ShapeProvider>
//!     }
//! }
//!
//! #[component]
//! fn Todos() -> impl IntoView {
//!     let todos = use_shape::<Todo>(ShapeParams::table("todos"));
//!
//!     view! {
//!         <For
//!             each=move || todos.data.get().unwrap_or_default()
//!             key=|todo| todo.id
//!             let:todo
//!         >
//!             <li>{todo.task}</li>
//!         </For>
//!     }
//! }
//! ```
//!
//! Failed requests are not retried: the stream stops, `error` is set and
//! the last snapshot stays in place.

// Module declarations
mod context;
mod error;
mod hooks;
mod provider;
mod stream;
mod traits;
pub mod transport;

// Re-exports
pub use context::{ShapeContext, UseShapeReturn};
pub use error::ShapeError;
pub use hooks::{use_shape, use_shape_context};
pub use provider::ShapeProvider;
pub use stream::{Listener, ListenerId, ShapeStream, StreamEvent, StreamStatus};
pub use traits::ShapeRow;

// Re-export shape definition types for convenience
pub use shape_common::{Replica, Row, ShapeParams, ShapeSnapshot};
