//! Evaluation of filter predicates against decoded candidates.
//!
//! A missing comparison target never matches, whatever the operator: `!=`,
//! `!~` and `nin` are false for it too.

use std::borrow::Cow;

use serde_json::Value;

use crate::segment::{Filter, FilterStep, Literal, Operator, Scalar};

/// Does `candidate` pass `filter`?
#[must_use]
pub fn evaluate(filter: &Filter, candidate: &Value) -> bool {
    resolve(&filter.path, candidate)
        .is_some_and(|target| compare(filter.operator, target, &filter.literal))
}

/// Follow the `@` path of a filter. `None` if a step is missing.
#[must_use]
pub fn resolve<'v>(path: &[FilterStep], candidate: &'v Value) -> Option<&'v Value> {
    path.iter().try_fold(candidate, |current, step| match step {
        FilterStep::Name(name) => current.as_object()?.get(name),
        FilterStep::Index(index) => current.as_array()?.get(*index),
    })
}

#[must_use]
pub fn compare(operator: Operator, value: &Value, literal: &Literal) -> bool {
    match (operator, literal) {
        (Operator::Eq, Literal::Scalar(scalar)) => scalar_eq(value, scalar),
        (Operator::Ne, Literal::Scalar(scalar)) => !scalar_eq(value, scalar),
        (Operator::Lt, Literal::Scalar(Scalar::Number(n))) => number(value).is_some_and(|v| v < *n),
        (Operator::Le, Literal::Scalar(Scalar::Number(n))) => number(value).is_some_and(|v| v <= *n),
        (Operator::Gt, Literal::Scalar(Scalar::Number(n))) => number(value).is_some_and(|v| v > *n),
        (Operator::Ge, Literal::Scalar(Scalar::Number(n))) => number(value).is_some_and(|v| v >= *n),
        (Operator::Match, Literal::Regex(regex)) => regex.regex.is_match(&string_form(value)),
        (Operator::NotMatch, Literal::Regex(regex)) => !regex.regex.is_match(&string_form(value)),
        (Operator::In, Literal::Array(items)) => items.iter().any(|item| scalar_eq(value, item)),
        (Operator::NotIn, Literal::Array(items)) => !items.iter().any(|item| scalar_eq(value, item)),
        // rejected by the compiler
        _ => false,
    }
}

// Numbers compare by value, whatever their spelling; other types never convert.
#[allow(clippy::float_cmp)]
fn scalar_eq(value: &Value, scalar: &Scalar) -> bool {
    match (value, scalar) {
        (Value::Null, Scalar::Null) => true,
        (Value::Bool(a), Scalar::Bool(b)) => a == b,
        (Value::Number(a), Scalar::Number(b)) => a.as_f64() == Some(*b),
        (Value::String(a), Scalar::String(b)) => a == b,
        _ => false,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::segment::Selector;
    use serde_json::json;

    fn filter(expression: &str) -> Filter {
        let mut segments = compile(expression).unwrap();
        match segments.remove(0).selectors.remove(0) {
            Selector::Filter(filter) => filter,
            other => panic!("expected a filter, got {other:?}"),
        }
    }

    fn passes(expression: &str, candidate: &Value) -> bool {
        evaluate(&filter(expression), candidate)
    }

    #[test]
    fn numbers_compare_by_value() {
        let book = serde_json::from_str::<Value>(r#"{"price": 8.0, "count": 3}"#).unwrap();
        assert!(passes("$[?(@.price == 8)]", &book));
        assert!(passes("$[?(@.count == 3.0)]", &book));
        assert!(passes("$[?(@.price < 10)]", &book));
        assert!(passes("$[?(@.price <= 8)]", &book));
        assert!(!passes("$[?(@.price > 8)]", &book));
        assert!(passes("$[?(@.price >= 8)]", &book));
    }

    #[test]
    fn no_coercion_between_types() {
        let item = json!({"id": "1", "flag": true, "none": null});
        assert!(!passes("$[?(@.id == 1)]", &item));
        assert!(passes("$[?(@.id == '1')]", &item));
        assert!(passes("$[?(@.id != 1)]", &item));
        assert!(!passes("$[?(@.id < 2)]", &item));
        assert!(passes("$[?(@.flag == true)]", &item));
        assert!(!passes("$[?(@.flag == 'true')]", &item));
        assert!(passes("$[?(@.none == null)]", &item));
    }

    #[test]
    fn missing_target_never_matches() {
        let item = json!({"a": 1});
        assert!(!passes("$[?(@.b == 1)]", &item));
        assert!(!passes("$[?(@.b != 1)]", &item));
        assert!(!passes("$[?(@.b !~ /x/)]", &item));
        assert!(!passes("$[?(@.b nin [1])]", &item));
        assert!(!passes("$[?(@.a.b == 1)]", &item));
    }

    #[test]
    fn regex_uses_string_form() {
        let item = json!({"name": "Moby Dick", "isbn": 12345, "ok": false});
        assert!(passes("$[?(@.name =~ /^moby/i)]", &item));
        assert!(!passes("$[?(@.name =~ /^moby/)]", &item));
        assert!(passes("$[?(@.name !~ /^moby/)]", &item));
        assert!(passes("$[?(@.isbn =~ /^123/)]", &item));
        assert!(passes("$[?(@.ok =~ /false/)]", &item));
    }

    #[test]
    fn membership() {
        assert!(passes("$[?(@.size in ['S', 'M'])]", &json!({"size": "M"})));
        assert!(!passes("$[?(@.size in ['S', 'M'])]", &json!({"size": "L"})));
        assert!(passes("$[?(@.size nin ['S', 'M'])]", &json!({"size": "L"})));
        assert!(passes("$[?(@ in [1, 2])]", &json!(2.0)));
    }

    #[test]
    fn nested_filter_path() {
        let item = json!({"tags": [{"k": "a"}, {"k": "b"}]});
        assert!(passes("$[?(@.tags[1].k == 'b')]", &item));
        assert!(passes("$[?(@['tags'][0]['k'] == 'a')]", &item));
        assert!(!passes("$[?(@.tags[2].k == 'b')]", &item));
    }
}
