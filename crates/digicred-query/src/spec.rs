//! The per-request query description that also travels inside cursor tokens.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::cursor::CursorToken;
use crate::error::QueryError;

pub const DEFAULT_LIMIT: usize = 50;

/// Match on `record.metadata[key] == value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataMatch {
    pub key: String,
    pub value: Value,
}

/// Exact-equality filter over record attributes.
///
/// Serialized as a flat object: `{"state": "completed", "metadata": {"key": .., "value": ..}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataMatch>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl Filter {
    /// Filter on a single attribute.
    pub fn attribute(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(name, value)
    }

    /// Filter on a single metadata entry.
    pub fn metadata(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            metadata: Some(MetadataMatch {
                key: key.into(),
                value: value.into(),
            }),
            attributes: BTreeMap::new(),
        }
    }

    pub fn and(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_none() && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortSpec {
    pub attribute: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Id of the boundary record the page is anchored on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl Pagination {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            cursor: None,
            direction: None,
        }
    }
}

/// Filter, sort, and pagination for one listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.pagination = Some(Pagination::with_limit(limit));
        self
    }

    /// Build the query for a listing request carrying `limit` and at most one
    /// of the `next`/`previous` tokens.
    ///
    /// A decoded token keeps its filter and sort; its direction comes from the
    /// parameter it arrived in and its limit from `limit`. `next` wins when
    /// both are present.
    pub fn from_cursor_params(
        limit: usize,
        next: Option<&str>,
        previous: Option<&str>,
    ) -> Result<Self, QueryError> {
        let (token, direction) = match (next, previous) {
            (Some(t), _) if !t.is_empty() => (t, Direction::Next),
            (_, Some(t)) if !t.is_empty() => (t, Direction::Previous),
            _ => return Ok(Self::new().with_limit(limit)),
        };
        let mut spec = CursorToken::from(token).decode()?;
        let pagination = spec.pagination.get_or_insert_with(Pagination::default);
        pagination.direction = Some(direction);
        pagination.limit = limit;
        Ok(spec)
    }
}
