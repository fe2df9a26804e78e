//! Stateless cursor pagination.
//!
//! A cursor token is the base64-encoded JSON of the whole [`QuerySpec`] that
//! produced a page, with `pagination.cursor` pointing at the boundary record
//! and `pagination.direction` telling which way to move from it. Decoding a
//! token therefore restores the filter and sort along with the position, and
//! the server keeps no state between calls.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::QueryError;
use crate::record::{Queryable, record_id};
use crate::spec::{Direction, Pagination, QuerySpec};

/// Opaque continuation token handed to clients as `next` / `previous`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CursorToken(String);

impl CursorToken {
    pub fn encode(spec: &QuerySpec) -> Result<Self, QueryError> {
        let json = serde_json::to_vec(spec)?;
        Ok(Self(STANDARD.encode(json)))
    }

    /// Decode the token back into its query. Fails closed: anything that is
    /// not a well-formed query anchored on a cursor is `InvalidCursor`.
    pub fn decode(&self) -> Result<QuerySpec, QueryError> {
        let raw = self.0.trim();
        // Query strings turn an unescaped '+' into a space.
        let raw = raw.replace(' ', "+");
        let bytes = STANDARD
            .decode(&raw)
            .or_else(|_| URL_SAFE_NO_PAD.decode(raw.trim_end_matches('=')))
            .map_err(|e| QueryError::InvalidCursor(format!("not base64: {e}")))?;
        let spec: QuerySpec = serde_json::from_slice(&bytes)
            .map_err(|e| QueryError::InvalidCursor(format!("malformed query: {e}")))?;
        let anchored = spec
            .pagination
            .as_ref()
            .and_then(|p| p.cursor.as_deref())
            .is_some_and(|c| !c.is_empty());
        if !anchored {
            return Err(QueryError::InvalidCursor(
                "token carries no boundary record".into(),
            ));
        }
        Ok(spec)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for CursorToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CursorToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<CursorToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<CursorToken>,
    /// The requested limit, not the number of items returned.
    pub limit: usize,
}

/// Slice `records` into the page `query` asks for.
///
/// `records` must already be filtered and sorted with the query's own filter
/// and sort; the tokens returned re-apply them on the next call.
pub fn cursor_paginate<R: Queryable>(
    records: Vec<R>,
    query: Option<&QuerySpec>,
    id_field: &str,
) -> Result<CursorPage<R>, QueryError> {
    let pagination = query
        .and_then(|q| q.pagination.clone())
        .unwrap_or_default();
    let limit = pagination.limit;
    if limit == 0 {
        return Err(QueryError::InvalidLimit(limit));
    }

    let mut start = 0;
    if let Some(cursor) = pagination.cursor.as_deref().filter(|c| !c.is_empty()) {
        let anchor = records
            .iter()
            .position(|r| record_id(r, id_field).as_deref() == Some(cursor))
            .ok_or_else(|| {
                QueryError::InvalidCursor(format!("no record with {id_field} `{cursor}`"))
            })?;
        start = match pagination.direction {
            Some(Direction::Next) => anchor + 1,
            Some(Direction::Previous) => anchor.saturating_sub(limit),
            None => anchor,
        };
    }

    let total = records.len();
    let start = start.min(total);
    let end = start.saturating_add(limit).min(total);

    let next = match records[start..end].last() {
        Some(last) if end != total => Some(token_for(
            query,
            &pagination,
            last,
            id_field,
            Direction::Next,
        )?),
        _ => None,
    };
    // An empty page past the last record has nothing to anchor a previous
    // cursor on.
    let previous = match records.get(start) {
        Some(first) if start > 0 => Some(token_for(
            query,
            &pagination,
            first,
            id_field,
            Direction::Previous,
        )?),
        _ => None,
    };

    debug!(
        total,
        start,
        returned = end - start,
        has_next = next.is_some(),
        has_previous = previous.is_some(),
        "paginated records"
    );

    let data = records.into_iter().skip(start).take(limit).collect();
    Ok(CursorPage {
        data,
        next,
        previous,
        limit,
    })
}

fn token_for<R: Queryable>(
    query: Option<&QuerySpec>,
    pagination: &Pagination,
    anchor: &R,
    id_field: &str,
    direction: Direction,
) -> Result<CursorToken, QueryError> {
    let id = record_id(anchor, id_field).ok_or_else(|| QueryError::MissingId {
        field: id_field.to_string(),
    })?;
    let mut spec = query.cloned().unwrap_or_default();
    spec.pagination = Some(Pagination {
        limit: pagination.limit,
        cursor: Some(id),
        direction: Some(direction),
    });
    CursorToken::encode(&spec)
}
