//! # digicred-query
//!
//! Attribute-driven slicing of in-memory record sets: exact-match filtering,
//! stable sorting, and stateless cursor pagination whose tokens carry the
//! whole query.

pub mod cursor;
pub mod engine;
pub mod error;
pub mod offset;
pub mod record;
pub mod spec;

pub use cursor::{CursorPage, CursorToken, cursor_paginate};
pub use engine::{apply_filter, apply_sort, compare_values, matches};
pub use error::QueryError;
pub use offset::{OffsetPage, offset_paginate};
pub use record::Queryable;
pub use spec::{
    DEFAULT_LIMIT, Direction, Filter, MetadataMatch, Pagination, QuerySpec, SortOrder, SortSpec,
};

/// Id attribute cursors anchor on unless told otherwise.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Filter, then sort, then paginate `records` according to `query`.
pub fn execute<R: Queryable>(
    records: Vec<R>,
    query: &QuerySpec,
    id_field: &str,
) -> Result<CursorPage<R>, QueryError> {
    let mut records = apply_filter(records, query.filter.as_ref());
    if let Some(ref sort) = query.sort {
        records = apply_sort(records, sort);
    }
    cursor_paginate(records, Some(query), id_field)
}
