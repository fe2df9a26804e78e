use serde_json::Value;
use std::cmp::Ordering;

use crate::record::Queryable;
use crate::spec::{Filter, SortOrder, SortSpec};

/// Keep only records that match every key of `filter`. No filter keeps everything.
pub fn apply_filter<R: Queryable>(mut records: Vec<R>, filter: Option<&Filter>) -> Vec<R> {
    let Some(filter) = filter else {
        return records;
    };
    records.retain(|record| matches(record, filter));
    records
}

/// Whether `record` satisfies `filter`.
pub fn matches<R: Queryable>(record: &R, filter: &Filter) -> bool {
    if let Some(ref meta) = filter.metadata {
        if record.metadata_value(&meta.key).as_ref() != Some(&meta.value) {
            return false;
        }
    }
    filter
        .attributes
        .iter()
        .all(|(name, expected)| record.attribute(name).as_ref() == Some(expected))
}

/// Stable sort on `sort.attribute`. Records with equal values keep their order.
pub fn apply_sort<R: Queryable>(mut records: Vec<R>, sort: &SortSpec) -> Vec<R> {
    records.sort_by(|a, b| {
        let ord = compare_values(
            a.attribute(&sort.attribute).as_ref(),
            b.attribute(&sort.attribute).as_ref(),
        );
        match sort.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    records
}

/// Total order over optional JSON values.
///
/// Values of one type compare naturally (strings lexically, numbers
/// numerically). Across types, and for missing values, the order is by
/// type rank so the comparator stays consistent for mixed columns.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
