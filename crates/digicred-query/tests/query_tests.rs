#[cfg(test)]
mod tests {
    use digicred_query::*;
    use serde_json::{Value, json};

    fn records(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "id": format!("r{i:03}"),
                    "createdAt": format!("2024-01-01T00:{:02}:{:02}.000Z", i / 60, i % 60),
                    "state": if i % 3 == 0 { "completed" } else { "request-sent" },
                    "metadata": { "tenant": if i % 2 == 0 { "even" } else { "odd" } },
                })
            })
            .collect()
    }

    fn ids(page: &CursorPage<Value>) -> Vec<String> {
        page.data
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    fn follow(
        all: &[Value],
        limit: usize,
        next: Option<&CursorToken>,
        previous: Option<&CursorToken>,
    ) -> CursorPage<Value> {
        let spec = QuerySpec::from_cursor_params(
            limit,
            next.map(|t| t.as_str()),
            previous.map(|t| t.as_str()),
        )
        .unwrap();
        execute(all.to_vec(), &spec, DEFAULT_ID_FIELD).unwrap()
    }

    // ── Filter tests ───────────────────────────────────────────

    #[test]
    fn test_filter_returns_matching_subset_in_order() {
        let all = records(30);
        let filtered = apply_filter(all.clone(), Some(&Filter::attribute("state", "completed")));
        assert_eq!(filtered.len(), 10);
        assert!(filtered.iter().all(|r| r["state"] == "completed"));
        let expected: Vec<&Value> = all.iter().filter(|r| r["state"] == "completed").collect();
        assert_eq!(filtered.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_filter_none_keeps_everything() {
        let all = records(5);
        assert_eq!(apply_filter(all.clone(), None), all);
    }

    #[test]
    fn test_filter_on_metadata() {
        let filtered = apply_filter(records(10), Some(&Filter::metadata("tenant", "odd")));
        assert_eq!(filtered.len(), 5);
        assert!(filtered.iter().all(|r| r["metadata"]["tenant"] == "odd"));
    }

    #[test]
    fn test_filter_conjunction() {
        let filter = Filter::attribute("state", "completed").and("id", "r003");
        let filtered = apply_filter(records(10), Some(&filter));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], "r003");
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let filtered = apply_filter(records(10), Some(&Filter::attribute("alias", "x")));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_null_attribute_matches_null_filter() {
        let data = vec![
            json!({"id": "a", "alias": null, "metadata": {"tenant": null}}),
            json!({"id": "b", "alias": "bob", "metadata": {"tenant": "acme"}}),
            json!({"id": "c"}),
        ];
        let filtered = apply_filter(data.clone(), Some(&Filter::attribute("alias", Value::Null)));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], "a");

        let filtered = apply_filter(data, Some(&Filter::metadata("tenant", Value::Null)));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["id"], "a");
    }

    #[test]
    fn test_unset_record_field_matches_null_filter() {
        use digicred_core::ConnectionRecord;

        let connection = |id: &str, alias: Value| -> ConnectionRecord {
            serde_json::from_value(json!({
                "id": id,
                "createdAt": "2024-01-01T00:00:00.000Z",
                "state": "completed",
                "role": "responder",
                "alias": alias,
            }))
            .unwrap()
        };
        let all = vec![connection("c1", Value::Null), connection("c2", json!("bob"))];

        let filtered = apply_filter(all.clone(), Some(&Filter::attribute("alias", Value::Null)));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "c1");
        // Names outside the record are still missing, not null.
        assert!(apply_filter(all, Some(&Filter::attribute("nickname", Value::Null))).is_empty());
    }

    #[test]
    fn test_filter_serializes_flat() {
        let filter = Filter::attribute("state", "completed");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, json!({ "state": "completed" }));
        let restored: Filter = serde_json::from_value(json!({
            "theirLabel": "Alice",
            "metadata": { "key": "tenant", "value": "odd" }
        }))
        .unwrap();
        assert_eq!(restored.attributes["theirLabel"], "Alice");
        assert_eq!(restored.metadata.unwrap().key, "tenant");
    }

    // ── Sort tests ─────────────────────────────────────────────

    #[test]
    fn test_sort_desc_is_monotone() {
        let sorted = apply_sort(records(40), &SortSpec::desc("createdAt"));
        for pair in sorted.windows(2) {
            assert!(pair[0]["createdAt"].as_str() >= pair[1]["createdAt"].as_str());
        }
    }

    #[test]
    fn test_sort_is_idempotent_and_stable() {
        let once = apply_sort(records(40), &SortSpec::asc("state"));
        let twice = apply_sort(once.clone(), &SortSpec::asc("state"));
        assert_eq!(once, twice);
        // Equal keys keep their input order.
        let completed: Vec<&str> = once
            .iter()
            .filter(|r| r["state"] == "completed")
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        let mut expected = completed.clone();
        expected.sort();
        assert_eq!(completed, expected);
    }

    #[test]
    fn test_missing_values_sort_first() {
        let data = vec![json!({"id": "a", "n": 2}), json!({"id": "b"}), json!({"id": "c", "n": 1})];
        let sorted = apply_sort(data, &SortSpec::asc("n"));
        let order: Vec<&str> = sorted.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        use std::cmp::Ordering;
        assert_eq!(compare_values(Some(&json!(9)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("9")), Some(&json!("10"))), Ordering::Greater);
    }

    // ── Cursor pagination tests ────────────────────────────────

    #[test]
    fn test_empty_set_has_no_cursors() {
        let page = cursor_paginate(Vec::<Value>::new(), None, "id").unwrap();
        assert!(page.data.is_empty());
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert_eq!(page.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_first_page_of_many() {
        let all = records(120);
        let page = follow(&all, 50, None, None);
        assert_eq!(page.data.len(), 50);
        assert_eq!(page.data[0]["id"], "r000");
        assert!(page.next.is_some());
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_walk_forward_to_last_page() {
        let all = records(120);
        let first = follow(&all, 50, None, None);
        let second = follow(&all, 50, first.next.as_ref(), None);
        assert_eq!(second.data[0]["id"], "r050");
        assert_eq!(second.data.len(), 50);
        assert!(second.next.is_some());
        assert!(second.previous.is_some());

        let third = follow(&all, 50, second.next.as_ref(), None);
        assert_eq!(third.data.len(), 20);
        assert_eq!(third.data[0]["id"], "r100");
        assert!(third.next.is_none());
        assert!(third.previous.is_some());
    }

    #[test]
    fn test_previous_returns_to_earlier_page() {
        let all = records(120);
        let first = follow(&all, 50, None, None);
        let second = follow(&all, 50, first.next.as_ref(), None);
        let back = follow(&all, 50, None, second.previous.as_ref());
        assert_eq!(ids(&back), ids(&first));
        assert!(back.previous.is_none());
    }

    #[test]
    fn test_forward_walk_visits_every_record_once() {
        let all = records(120);
        let mut seen = Vec::new();
        let mut page = follow(&all, 7, None, None);
        loop {
            seen.extend(ids(&page));
            match page.next.clone() {
                Some(next) => page = follow(&all, 7, Some(&next), None),
                None => break,
            }
        }
        let expected: Vec<String> = all.iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_token_carries_filter_and_sort() {
        let all = records(120);
        let query = QuerySpec::new()
            .with_filter(Filter::attribute("state", "completed"))
            .with_sort(SortSpec::desc("createdAt"))
            .with_limit(10);
        let first = execute(all.clone(), &query, "id").unwrap();
        assert!(first.data.iter().all(|r| r["state"] == "completed"));

        let next = first.next.as_ref().unwrap();
        let decoded = next.decode().unwrap();
        assert_eq!(decoded.filter, query.filter);
        assert_eq!(decoded.sort, query.sort);

        let second = follow(&all, 10, Some(next), None);
        assert!(second.data.iter().all(|r| r["state"] == "completed"));
        assert!(
            first.data.last().unwrap()["createdAt"].as_str()
                > second.data[0]["createdAt"].as_str()
        );
    }

    #[test]
    fn test_limit_larger_than_set() {
        let page = cursor_paginate(records(3), Some(&QuerySpec::new().with_limit(10)), "id").unwrap();
        assert_eq!(page.data.len(), 3);
        assert!(page.next.is_none());
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn test_huge_limit_with_cursor_returns_rest() {
        let mut spec = QuerySpec::new();
        spec.pagination = Some(Pagination {
            limit: usize::MAX,
            cursor: Some("r000".into()),
            direction: Some(Direction::Next),
        });
        let page = cursor_paginate(records(5), Some(&spec), "id").unwrap();
        assert_eq!(ids(&page), vec!["r001", "r002", "r003", "r004"]);
        assert!(page.next.is_none());
        assert!(page.previous.is_some());
        assert_eq!(page.limit, usize::MAX);

        spec.pagination.as_mut().unwrap().direction = Some(Direction::Previous);
        spec.pagination.as_mut().unwrap().cursor = Some("r004".into());
        let page = cursor_paginate(records(5), Some(&spec), "id").unwrap();
        assert_eq!(page.data.len(), 5);
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = cursor_paginate(records(3), Some(&QuerySpec::new().with_limit(0)), "id").unwrap_err();
        assert!(matches!(err, QueryError::InvalidLimit(0)));
    }

    #[test]
    fn test_stale_cursor_is_rejected() {
        let all = records(20);
        let first = follow(&all, 5, None, None);
        let next = first.next.unwrap();
        // The anchor record disappears between calls.
        let remaining: Vec<Value> = all.into_iter().filter(|r| r["id"] != "r004").collect();
        let spec = QuerySpec::from_cursor_params(5, Some(next.as_str()), None).unwrap();
        let err = execute(remaining, &spec, "id").unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor(_)));
    }

    #[test]
    fn test_garbage_tokens_are_rejected() {
        for token in ["not base64!!", "e30=", "bm90IGpzb24="] {
            let err = QuerySpec::from_cursor_params(50, Some(token), None).unwrap_err();
            assert!(matches!(err, QueryError::InvalidCursor(_)), "token {token}");
        }
    }

    #[test]
    fn test_token_survives_url_decoding_spaces() {
        let spec = QuerySpec::new().with_filter(Filter::attribute("theirLabel", "?>?>"));
        let mut spec = spec;
        spec.pagination = Some(Pagination {
            limit: 5,
            cursor: Some("r001".into()),
            direction: Some(Direction::Next),
        });
        let token = CursorToken::encode(&spec).unwrap();
        let mangled = token.as_str().replace('+', " ");
        assert_eq!(CursorToken::from(mangled).decode().unwrap(), spec);
    }

    #[test]
    fn test_cursor_params_direction_and_limit() {
        let all = records(30);
        let first = follow(&all, 10, None, None);
        let token = first.next.unwrap();
        let spec = QuerySpec::from_cursor_params(25, None, Some(token.as_str())).unwrap();
        let pagination = spec.pagination.unwrap();
        assert_eq!(pagination.direction, Some(Direction::Previous));
        assert_eq!(pagination.limit, 25);

        let plain = QuerySpec::from_cursor_params(12, None, None).unwrap();
        assert_eq!(plain.pagination.unwrap().limit, 12);
    }

    #[test]
    fn test_page_serializes_without_absent_cursors() {
        let page = cursor_paginate(records(2), None, "id").unwrap();
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("next").is_none());
        assert!(json.get("previous").is_none());
        assert_eq!(json["limit"], 50);
    }

    // ── Offset pagination tests ────────────────────────────────

    #[test]
    fn test_offset_page_reports_total() {
        let page = offset_paginate(records(120), 100, 50);
        assert_eq!(page.total, 120);
        assert_eq!(page.data.len(), 20);
        assert_eq!(page.data[0]["id"], "r100");
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let page = offset_paginate(records(3), 10, 5);
        assert!(page.data.is_empty());
        assert_eq!(page.total, 3);
    }
}
