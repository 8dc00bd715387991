use leptos::prelude::*;

use crate::context::ShapeContext;

/// Provider component that sets up the shape client and provides ShapeContext.
///
/// This component should wrap your application or the part of your
/// application that reads shapes. Streams are started lazily by the hooks
/// and all of them are closed when the provider unmounts.
///
/// # Example
///
/// ```rust,ignore
/// use shape_client::ShapeProvider;
///
/// #[component]
/// pub fn App() -> impl IntoView {
///     view! {
///         <ShapeProvider url="http://localhost:3000/v1/shape".to_string()>
///             <MyAppUI />
///         </ShapeProvider>
///     }
/// }
/// ```
#[component]
pub fn ShapeProvider(
    /// Shape endpoint URL
    url: String,
    /// Child components
    children: Children,
) -> impl IntoView {
    #[cfg(target_arch = "wasm32")]
    leptos::logging::log!("[ShapeProvider] using shape endpoint {}", url);

    let ctx = ShapeContext::new(url);
    provide_context(ctx.clone());

    on_cleanup(move || ctx.close_all());

    children()
}
