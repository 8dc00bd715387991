mod sync_hint;
mod todo_list;

pub use sync_hint::{SYNC_COMMANDS, SyncHint};
pub use todo_list::{TodoItemView, TodoList, TodoListModel, TodoListView, TodoStatus};
