//! Todo client entry point.
//!
//! Run the shape service (see the sync hint panel for the database), then:
//!   cd crates/todo_client
//!   trunk serve --open
//!
//! Point at another endpoint with `SHAPE_URL=https://... trunk serve`.

use todo_client::App;

fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    leptos::mount::mount_to_body(App);
}
