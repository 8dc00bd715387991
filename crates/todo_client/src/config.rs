use todo_types::TODOS_TABLE;

/// Shape endpoint used when `SHAPE_URL` is not set at build time.
pub const DEFAULT_SHAPE_URL: &str = "http://localhost:3000/v1/shape";

/// Build-time configuration of the app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub shape_url: String,
    pub table: &'static str,
}

impl AppConfig {
    /// Read the configuration baked in by the build (`SHAPE_URL=... trunk build`).
    pub fn from_env() -> Self {
        Self::with_shape_url(option_env!("SHAPE_URL"))
    }

    pub fn with_shape_url(shape_url: Option<&str>) -> Self {
        let shape_url = shape_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_SHAPE_URL)
            .to_string();

        Self {
            shape_url,
            table: TODOS_TABLE,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_shape_url(None)
    }
}
