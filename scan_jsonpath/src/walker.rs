//! In-memory evaluation of the segments the scan leaves over: those after a
//! filter, and those from a backward slice on.
//!
//! Matches come out in selector order: a union or a negative slice step gives
//! the order of its members, wildcards and filters give document order.

use serde_json::{Map, Value};

use crate::filter;
use crate::segment::{Segment, Selector, UnionMember};
use crate::stack::{push_index, push_name};
use crate::stream::Match;

/// Apply `segments` to `value`, which sits at `base_path` in the document.
#[must_use]
pub fn walk(segments: &[Segment], value: &Value, base_path: &str) -> Vec<Match> {
    let mut found = Vec::new();
    walk_into(segments, value, base_path, &mut found);
    found
}

fn walk_into(segments: &[Segment], value: &Value, path: &str, found: &mut Vec<Match>) {
    let Some((segment, rest)) = segments.split_first() else {
        found.push(Match {
            path: path.to_string(),
            value: value.clone(),
        });
        return;
    };
    if segment.deep {
        descend(segment, rest, value, path, found);
    } else {
        select_children(segment, rest, value, path, found);
    }
}

// `..`: the segment's selection is made at the node and at every descendant
fn descend(segment: &Segment, rest: &[Segment], value: &Value, path: &str, found: &mut Vec<Match>) {
    select_children(segment, rest, value, path, found);
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                descend(segment, rest, child, &member_path(path, name), found);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                descend(segment, rest, child, &element_path(path, index), found);
            }
        }
        _ => {}
    }
}

fn select_children(
    segment: &Segment,
    rest: &[Segment],
    value: &Value,
    path: &str,
    found: &mut Vec<Match>,
) {
    for selector in &segment.selectors {
        match value {
            Value::Object(map) => select_members(selector, segment.deep, rest, map, path, found),
            Value::Array(items) => select_elements(selector, rest, items, path, found),
            _ => {}
        }
    }
}

fn select_members(
    selector: &Selector,
    deep: bool,
    rest: &[Segment],
    map: &Map<String, Value>,
    path: &str,
    found: &mut Vec<Match>,
) {
    let mut visit = |name: &str| {
        if let Some(child) = map.get(name) {
            walk_into(rest, child, &member_path(path, name), found);
        }
    };
    match selector {
        Selector::Name(name) => visit(name),
        Selector::Wildcard => {
            for name in map.keys() {
                visit(name);
            }
        }
        Selector::Union(members) => {
            for member in members {
                if let UnionMember::Name(name) = member {
                    visit(name);
                }
            }
        }
        // under `..` a filter tests member values too
        Selector::Filter(filter) if deep => {
            for (name, child) in map {
                if filter::evaluate(filter, child) {
                    visit(name);
                }
            }
        }
        Selector::Index(_) | Selector::Slice(_) | Selector::Filter(_) => {}
    }
}

fn select_elements(
    selector: &Selector,
    rest: &[Segment],
    items: &[Value],
    path: &str,
    found: &mut Vec<Match>,
) {
    let mut visit = |index: usize| {
        if let Some(child) = items.get(index) {
            walk_into(rest, child, &element_path(path, index), found);
        }
    };
    match selector {
        Selector::Index(index) => visit(*index),
        Selector::Slice(slice) => {
            for index in slice.indices(items.len()) {
                visit(index);
            }
        }
        Selector::Wildcard => {
            for index in 0..items.len() {
                visit(index);
            }
        }
        Selector::Union(members) => {
            for member in members {
                if let UnionMember::Index(index) = member {
                    visit(*index);
                }
            }
        }
        Selector::Filter(filter) => {
            for (index, item) in items.iter().enumerate() {
                if filter::evaluate(filter, item) {
                    visit(index);
                }
            }
        }
        Selector::Name(_) => {}
    }
}

fn member_path(base: &str, name: &str) -> String {
    let mut path = base.to_string();
    push_name(&mut path, name);
    path
}

fn element_path(base: &str, index: usize) -> String {
    let mut path = base.to_string();
    push_index(&mut path, index);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;

    fn run(expression: &str, value: &Value) -> Vec<(String, Value)> {
        let segments = compile(expression).unwrap();
        walk(&segments, value, "$")
            .into_iter()
            .map(|m| (m.path, m.value))
            .collect()
    }

    #[test]
    fn no_segments_yields_the_value() {
        assert_eq!(run("$", &json!(5)), vec![("$".to_string(), json!(5))]);
    }

    #[test]
    fn child_selectors() {
        let doc = json!({"a": {"b": [10, 20, 30]}, "c": 1});
        assert_eq!(run("$.a.b[1]", &doc), vec![("$.a.b[1]".to_string(), json!(20))]);
        assert_eq!(
            run("$.a.b[::-1]", &doc),
            vec![
                ("$.a.b[2]".to_string(), json!(30)),
                ("$.a.b[1]".to_string(), json!(20)),
                ("$.a.b[0]".to_string(), json!(10)),
            ]
        );
        assert_eq!(
            run("$['c', 'a']", &doc),
            vec![
                ("$.c".to_string(), json!(1)),
                ("$.a".to_string(), json!({"b": [10, 20, 30]})),
            ]
        );
        assert!(run("$.missing", &doc).is_empty());
        assert!(run("$.c.d", &doc).is_empty());
    }

    #[test]
    fn descendant_is_pre_order() {
        let doc = json!({"x": {"x": 1}, "y": [{"x": 2}]});
        assert_eq!(
            run("$..x", &doc),
            vec![
                ("$.x".to_string(), json!({"x": 1})),
                ("$.x.x".to_string(), json!(1)),
                ("$.y[0].x".to_string(), json!(2)),
            ]
        );
    }

    #[test]
    fn child_filters_select_array_elements_only() {
        let doc = json!({"a": {"v": 1}, "b": [{"v": 1}, {"v": 2}]});
        assert!(run("$[?(@.v == 1)]", &doc).is_empty());
        assert_eq!(
            run("$.b[?(@.v > 1)].v", &doc),
            vec![("$.b[1].v".to_string(), json!(2))]
        );
    }

    #[test]
    fn descendant_filters_select_members_too() {
        let doc = json!({"store": {
            "book": [{"price": 8.95}, {"price": 22.99}],
            "bicycle": {"color": "red", "price": 19.95}
        }});
        assert_eq!(
            run("$..[?(@.price < 20)]", &doc),
            vec![
                ("$.store.bicycle".to_string(), json!({"color": "red", "price": 19.95})),
                ("$.store.book[0]".to_string(), json!({"price": 8.95})),
            ]
        );
    }

    #[test]
    fn quoted_member_names() {
        let doc = json!({"first name": {"it's": true}});
        assert_eq!(
            run("$..*", &doc),
            vec![
                ("$['first name']".to_string(), json!({"it's": true})),
                (r"$['first name']['it\'s']".to_string(), json!(true)),
            ]
        );
    }
}
