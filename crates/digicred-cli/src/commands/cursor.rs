//! Offline helpers for the opaque cursor tokens returned by listings.

use digicred_core::{DigiCredError, Result};
use digicred_query::{CursorToken, Direction, Filter, Pagination, QuerySpec, SortSpec};

/// Pretty-printed JSON of the query `token` carries.
pub fn describe(token: &str) -> Result<String> {
    let query = CursorToken::from(token).decode()?;
    Ok(serde_json::to_string_pretty(&query)?)
}

pub fn encode(query: &QuerySpec) -> Result<String> {
    Ok(CursorToken::encode(query)?.into_string())
}

/// Assemble the query a listing token would carry. Exactly one of `after`
/// and `before` names the anchor record.
pub fn build_query(
    limit: usize,
    after: Option<&str>,
    before: Option<&str>,
    filter: &[(String, String)],
    metadata: Option<(String, String)>,
    sort: Option<&str>,
) -> Result<QuerySpec> {
    if limit == 0 {
        return Err(DigiCredError::InvalidRequest("limit must be at least 1".into()));
    }
    let (cursor, direction) = match (after, before) {
        (Some(id), None) => (id, Direction::Next),
        (None, Some(id)) => (id, Direction::Previous),
        _ => {
            return Err(DigiCredError::InvalidRequest(
                "exactly one of --after or --before is required".into(),
            ));
        }
    };

    let mut query = QuerySpec::new();
    query.pagination = Some(Pagination {
        limit,
        cursor: Some(cursor.to_string()),
        direction: Some(direction),
    });

    let mut combined = match metadata {
        Some((key, value)) => Filter::metadata(key, value),
        None => Filter::default(),
    };
    for (name, value) in filter {
        combined = combined.and(name.as_str(), value.as_str());
    }
    if !combined.is_empty() {
        query = query.with_filter(combined);
    }

    if let Some(sort) = sort {
        query = query.with_sort(parse_sort(sort)?);
    }
    Ok(query)
}

fn parse_sort(raw: &str) -> Result<SortSpec> {
    match raw.split_once(':') {
        None => Ok(SortSpec::asc(raw)),
        Some((attribute, "asc")) => Ok(SortSpec::asc(attribute)),
        Some((attribute, "desc")) => Ok(SortSpec::desc(attribute)),
        Some((_, order)) => Err(DigiCredError::InvalidRequest(format!(
            "unknown sort order `{order}`, expected asc or desc"
        ))),
    }
}
