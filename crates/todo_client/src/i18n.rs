//! UI text.

/// Languages the UI is translated into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

/// Every piece of text the UI shows.
#[derive(Debug, PartialEq, Eq)]
pub struct Strings {
    pub title: &'static str,
    pub heading: &'static str,
    pub empty: &'static str,
    pub done: &'static str,
    pub pending: &'static str,
    pub sync_heading: &'static str,
    pub sync_hint: &'static str,
}

static JA: Strings = Strings {
    title: "Electric SQL Todo App",
    heading: "タスク一覧",
    empty: "タスクがありません",
    done: "✅ 完了",
    pending: "⏳ 未完了",
    sync_heading: "リアルタイム同期を試す",
    sync_hint: "以下のコマンドでデータベースを直接更新すると、画面がリアルタイムで更新されます：",
};

static EN: Strings = Strings {
    title: "Electric SQL Todo App",
    heading: "Tasks",
    empty: "No tasks",
    done: "✅ Done",
    pending: "⏳ Pending",
    sync_heading: "Try live sync",
    sync_hint: "Update the database directly with the commands below and the list updates in real time:",
};

impl Locale {
    /// Map a language tag (`ja`, `ja-JP`, `en-US`, ...) to a locale.
    pub fn from_tag(tag: &str) -> Locale {
        if tag.trim().to_ascii_lowercase().starts_with("ja") {
            Locale::Ja
        } else {
            Locale::En
        }
    }

    /// Pick the locale from an explicit `lang` parameter, then the browser's
    /// preferred languages, then the default.
    pub fn detect(requested: Option<&str>, preferred: &[String]) -> Locale {
        requested
            .filter(|tag| !tag.trim().is_empty())
            .or_else(|| preferred.first().map(String::as_str))
            .map(Locale::from_tag)
            .unwrap_or_default()
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Locale::Ja => &JA,
            Locale::En => &EN,
        }
    }
}
