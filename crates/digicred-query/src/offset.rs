use serde::Serialize;

/// One page of an offset-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetPage<T> {
    pub data: Vec<T>,
    /// Number of records before slicing.
    pub total: usize,
}

/// Plain `offset`/`limit` slicing. Out-of-range offsets yield an empty page.
pub fn offset_paginate<T>(records: Vec<T>, offset: usize, limit: usize) -> OffsetPage<T> {
    let total = records.len();
    let data = records.into_iter().skip(offset).take(limit).collect();
    OffsetPage { data, total }
}
