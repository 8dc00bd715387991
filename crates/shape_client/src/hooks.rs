use leptos::prelude::*;
use shape_common::ShapeParams;

use crate::context::{ShapeContext, UseShapeReturn};
use crate::traits::ShapeRow;

/// Hook to follow a shape and read it as `Vec<T>`.
///
/// The subscription is automatically managed: a listener is registered with
/// the shape's stream when the component mounts and removed when it
/// unmounts. Components following the same shape share one stream.
///
/// `data` is `None` until the first complete snapshot arrives and is then
/// replaced as a whole on every update.
///
/// # Panics
///
/// Panics if called outside of a `ShapeProvider` context.
///
/// # Example
///
/// ```rust,ignore
/// use shape_client::{use_shape, ShapeParams};
///
/// #[component]
/// fn TaskNames() -> impl IntoView {
///     let todos = use_shape::<Todo>(ShapeParams::table("todos"));
///
///     view! {
///         <ul>
///             <For
///                 each=move || todos.data.get().unwrap_or_default()
///                 key=|todo| todo.id
///                 children=|todo| view! { <li>{todo.task}</li> }
///             />
///         </ul>
///     }
/// }
/// ```
pub fn use_shape<T: ShapeRow>(params: ShapeParams) -> UseShapeReturn<T> {
    let ctx = expect_context::<ShapeContext>();
    ctx.subscribe_shape::<T>(params)
}

/// Hook to access the ShapeContext directly.
///
/// # Panics
///
/// Panics if called outside of a `ShapeProvider` context.
pub fn use_shape_context() -> ShapeContext {
    expect_context::<ShapeContext>()
}
