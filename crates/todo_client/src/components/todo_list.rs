//! The live todo list.
//!
//! `TodoListView` follows the todos shape; `TodoList` renders whatever
//! snapshot it is given. The rendering rules live in [`TodoListModel`] so
//! they can be checked without a DOM.

use std::collections::HashMap;

use leptos::prelude::*;
use shape_client::{ShapeParams, use_shape};
use todo_types::Todo;

use crate::i18n::Locale;

/// Display state of a todo. Derived from `completed` only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TodoStatus {
    Done,
    Pending,
}

impl TodoStatus {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            TodoStatus::Done
        } else {
            TodoStatus::Pending
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        let strings = locale.strings();
        match self {
            TodoStatus::Done => strings.done,
            TodoStatus::Pending => strings.pending,
        }
    }

    /// CSS class of the list item.
    pub fn class(self) -> &'static str {
        match self {
            TodoStatus::Done => "completed",
            TodoStatus::Pending => "",
        }
    }
}

/// One rendered list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoItemView {
    pub id: i64,
    pub task: String,
    pub status: TodoStatus,
}

impl From<&Todo> for TodoItemView {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            task: todo.task.clone(),
            status: TodoStatus::from_completed(todo.completed),
        }
    }
}

/// What the list shows for a given snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoListModel {
    /// No snapshot yet, or an empty one: show the placeholder.
    Empty,
    /// One entry per todo, in snapshot order, indexed by id.
    Items {
        items: Vec<TodoItemView>,
        by_id: HashMap<i64, usize>,
    },
}

impl TodoListModel {
    pub fn from_snapshot(snapshot: Option<&[Todo]>) -> Self {
        match snapshot {
            Some(todos) if !todos.is_empty() => {
                let items: Vec<TodoItemView> = todos.iter().map(TodoItemView::from).collect();
                let by_id = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (item.id, index))
                    .collect();
                TodoListModel::Items { items, by_id }
            }
            _ => TodoListModel::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, TodoListModel::Empty)
    }

    pub fn items(&self) -> &[TodoItemView] {
        match self {
            TodoListModel::Empty => &[],
            TodoListModel::Items { items, .. } => items,
        }
    }

    /// Keys in render order.
    pub fn ids(&self) -> Vec<i64> {
        self.items().iter().map(|item| item.id).collect()
    }

    pub fn item(&self, id: i64) -> Option<&TodoItemView> {
        match self {
            TodoListModel::Empty => None,
            TodoListModel::Items { items, by_id } => {
                by_id.get(&id).and_then(|&index| items.get(index))
            }
        }
    }
}

/// Follows the todos shape and renders it.
#[component]
pub fn TodoListView(
    /// Shape to follow (default: all todos)
    #[prop(optional)]
    params: Option<ShapeParams>,
    /// UI language
    #[prop(optional)]
    locale: Locale,
) -> impl IntoView {
    let todos = use_shape::<Todo>(params.unwrap_or_else(Todo::shape));

    Effect::new(move |_| {
        if let Some(error) = todos.error.get() {
            log::warn!("[TodoListView] todos shape: {}", error);
        }
    });

    view! { <TodoList todos=todos.data locale=locale /> }
}

/// Renders a todo snapshot.
///
/// Entries are keyed by todo id, so an update to a todo re-renders its
/// existing entry instead of adding a new one.
#[component]
pub fn TodoList(
    /// Latest snapshot; `None` while loading
    #[prop(into)]
    todos: Signal<Option<Vec<Todo>>>,
    /// UI language
    #[prop(optional)]
    locale: Locale,
) -> impl IntoView {
    let strings = locale.strings();
    let model = Memo::new(move |_| todos.with(|todos| TodoListModel::from_snapshot(todos.as_deref())));

    view! {
        <div class="todo-container">
            <h2>{strings.heading}</h2>
            <Show
                when=move || !model.with(TodoListModel::is_empty)
                fallback=move || view! { <p class="todo-empty">{strings.empty}</p> }
            >
                <ul class="todo-list">
                    <For
                        each=move || model.with(TodoListModel::ids)
                        key=|id| *id
                        children=move |id| view! { <TodoRow id=id model=model locale=locale /> }
                    />
                </ul>
            </Show>
        </div>
    }
}

#[component]
fn TodoRow(id: i64, model: Memo<TodoListModel>, locale: Locale) -> impl IntoView {
    let item = Memo::new(move |_| model.with(|model| model.item(id).cloned()));
    let status = move || {
        item.with(|item| item.as_ref().map(|item| item.status))
            .unwrap_or(TodoStatus::Pending)
    };
    let task = move || item.with(|item| item.as_ref().map(|item| item.task.clone()).unwrap_or_default());

    view! {
        <li class=move || status().class() data-id=id.to_string()>
            <span class="task">{task}</span>
            <span class="status">{move || status().label(locale)}</span>
        </li>
    }
}
