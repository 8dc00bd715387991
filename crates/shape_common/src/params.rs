use serde::{Deserialize, Serialize};

use crate::messages::{Offset, ShapeHandle};

/// How much of a row update messages carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Replica {
    /// Updates carry the primary key and changed columns only.
    #[default]
    Default,
    /// Updates carry the full row.
    Full,
}

/// Definition of a shape: which table, and optionally which rows and columns.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeParams {
    pub table: String,
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub replica: Replica,
}

impl ShapeParams {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            where_clause: None,
            columns: None,
            replica: Replica::Default,
        }
    }

    pub fn with_where(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_replica(mut self, replica: Replica) -> Self {
        self.replica = replica;
        self
    }

    /// Stable identity used to share one stream between subscribers.
    pub fn cache_key(&self) -> String {
        let mut key = self.table.clone();
        if let Some(clause) = &self.where_clause {
            key.push_str("|where=");
            key.push_str(clause);
        }
        if let Some(columns) = &self.columns {
            key.push_str("|columns=");
            key.push_str(&columns.join(","));
        }
        if self.replica == Replica::Full {
            key.push_str("|replica=full");
        }
        key
    }
}

/// Position of a stream in its shape log, i.e. what to ask for next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeRequest {
    pub offset: Offset,
    pub handle: Option<ShapeHandle>,
    /// Long-poll for new changes instead of reading existing ones.
    pub live: bool,
    pub cursor: Option<String>,
}

impl ShapeRequest {
    /// Start over from the beginning of the log, optionally under a new handle.
    pub fn restart(&mut self, handle: Option<ShapeHandle>) {
        *self = ShapeRequest {
            handle,
            ..ShapeRequest::default()
        };
    }

    /// Query-string pairs for the next request.
    pub fn query(&self, params: &ShapeParams) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("table", params.table.clone()),
            ("offset", self.offset.to_string()),
        ];

        if let Some(clause) = &params.where_clause {
            query.push(("where", clause.clone()));
        }
        if let Some(columns) = &params.columns {
            query.push(("columns", columns.join(",")));
        }
        if params.replica == Replica::Full {
            query.push(("replica", "full".to_string()));
        }
        if let Some(handle) = &self.handle {
            query.push(("handle", handle.to_string()));
        }
        if self.live {
            query.push(("live", "true".to_string()));
            if let Some(cursor) = &self.cursor {
                query.push(("cursor", cursor.clone()));
            }
        }

        query
    }
}
