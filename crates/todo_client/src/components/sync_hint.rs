use leptos::prelude::*;

use crate::i18n::Locale;

/// Commands that change the todos table behind the app's back.
pub const SYNC_COMMANDS: [&str; 2] = [
    r#"docker exec electric_quickstart-postgres-1 psql -U postgres -d electric -c "INSERT INTO todos (task, completed) VALUES ('新しいタスク', false);""#,
    r#"docker exec electric_quickstart-postgres-1 psql -U postgres -d electric -c "UPDATE todos SET completed = true WHERE id = 1;""#,
];

/// Info panel explaining how to watch live updates.
#[component]
pub fn SyncHint(#[prop(optional)] locale: Locale) -> impl IntoView {
    let strings = locale.strings();

    view! {
        <div class="info">
            <h3>{strings.sync_heading}</h3>
            <p>{strings.sync_hint}</p>
            {SYNC_COMMANDS.iter().map(|command| view! { <pre>{*command}</pre> }).collect_view()}
        </div>
    }
}
