//! Entities shared by everything that reads the `todos` shape.
//!
//! `ShapeRow` is implemented automatically for every type here, so they can
//! be passed straight to `use_shape`.

use serde::{Deserialize, Serialize};
use shape_client::ShapeParams;

/// Name of the table the todos shape is defined on.
pub const TODOS_TABLE: &str = "todos";

/// A row of the `todos` table.
///
/// `id` is the primary key and the only stable identity of a todo.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub completed: bool,
    /// Creation timestamp as text; kept but not interpreted.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Todo {
    /// Shape definition for all todos.
    pub fn shape() -> ShapeParams {
        ShapeParams::table(TODOS_TABLE)
    }
}
