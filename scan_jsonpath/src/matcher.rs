//! This module contains the `Matcher` trait and `PathMatcher`, which decides
//! whether compiled segments select the node at a given traversal position.

use serde_json::Value;

use crate::filter;
use crate::segment::{Filter, Segment, Selector, UnionMember};
use crate::stack::PathElem;

/// How a filter selector treats a node whose value is not decoded yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Assume the filter passes; the caller decodes the node and asks again
    Match,
    NoMatch,
}

/// Defines the interface for matching the current node against its context.
pub trait Matcher: std::fmt::Debug {
    /// Determines if the node at the end of `path` is selected.
    ///
    /// # Arguments
    ///
    /// * `path` - Steps from the root to the node. The first element is the
    ///            root placeholder.
    /// * `current` - Decoded value of the node, if available. Values of the
    ///               ancestors are never needed.
    /// * `unresolved` - Outcome of a filter when `current` is `None`
    fn matches(&self, path: &[PathElem], current: Option<&Value>, unresolved: Unresolved) -> bool;
}

/// Matches a list of segments. Descendant segments are tried against every
/// remaining path position, so the work is bounded by the depth of the path.
#[derive(Debug, Clone, Copy)]
pub struct PathMatcher<'s> {
    segments: &'s [Segment],
}

impl<'s> PathMatcher<'s> {
    #[must_use]
    pub fn new(segments: &'s [Segment]) -> Self {
        Self { segments }
    }
}

impl Matcher for PathMatcher<'_> {
    fn matches(&self, path: &[PathElem], current: Option<&Value>, unresolved: Unresolved) -> bool {
        let steps = match path.split_first() {
            Some((PathElem::Root, steps)) => steps,
            _ => path,
        };
        match_from(self.segments, steps, current, unresolved)
    }
}

fn match_from(
    segments: &[Segment],
    path: &[PathElem],
    current: Option<&Value>,
    unresolved: Unresolved,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return path.is_empty();
    };

    // `current` belongs to the last element of the path
    let value_at = |position: usize| {
        if position + 1 == path.len() {
            current
        } else {
            None
        }
    };

    if segment.deep {
        return (0..path.len()).any(|position| {
            selects(segment, &path[position], value_at(position), unresolved)
                && match_from(rest, &path[position + 1..], current, unresolved)
        });
    }

    match path.first() {
        Some(elem) => {
            selects(segment, elem, value_at(0), unresolved)
                && match_from(rest, &path[1..], current, unresolved)
        }
        None => false,
    }
}

fn selects(
    segment: &Segment,
    elem: &PathElem,
    value: Option<&Value>,
    unresolved: Unresolved,
) -> bool {
    segment
        .selectors
        .iter()
        .any(|selector| selector_matches(selector, segment.deep, elem, value, unresolved))
}

// A child filter tests array elements. Under `..` it tests every node below
// the root, object members included.
fn selector_matches(
    selector: &Selector,
    deep: bool,
    elem: &PathElem,
    value: Option<&Value>,
    unresolved: Unresolved,
) -> bool {
    match (selector, elem) {
        (_, PathElem::Root) => false,
        (Selector::Wildcard, _) => true,
        (Selector::Name(name), PathElem::Name(key)) => name == key,
        (Selector::Index(index), PathElem::Index(position)) => index == position,
        (Selector::Slice(slice), PathElem::Index(position)) => slice.contains(*position),
        (Selector::Union(members), elem) => members.iter().any(|member| match (member, elem) {
            (UnionMember::Name(name), PathElem::Name(key)) => name == key,
            (UnionMember::Index(index), PathElem::Index(position)) => index == position,
            _ => false,
        }),
        (Selector::Filter(filter), PathElem::Index(_)) => passes(filter, value, unresolved),
        (Selector::Filter(filter), PathElem::Name(_)) if deep => passes(filter, value, unresolved),
        _ => false,
    }
}

fn passes(filter: &Filter, value: Option<&Value>, unresolved: Unresolved) -> bool {
    match value {
        Some(value) => filter::evaluate(filter, value),
        None => unresolved == Unresolved::Match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;

    fn path(steps: &[PathElem]) -> Vec<PathElem> {
        std::iter::once(PathElem::Root).chain(steps.iter().cloned()).collect()
    }

    fn name(n: &str) -> PathElem {
        PathElem::Name(n.to_string())
    }

    fn check(expression: &str, steps: &[PathElem]) -> bool {
        let segments = compile(expression).unwrap();
        PathMatcher::new(&segments).matches(&path(steps), None, Unresolved::NoMatch)
    }

    #[test]
    fn child_segments_match_exactly() {
        assert!(check("$", &[]));
        assert!(!check("$", &[name("a")]));
        assert!(check("$.store.book", &[name("store"), name("book")]));
        assert!(!check("$.store.book", &[name("store")]));
        assert!(!check("$.store", &[name("store"), name("book")]));
    }

    #[test]
    fn names_and_indices_do_not_mix() {
        assert!(!check("$.a", &[PathElem::Index(0)]));
        assert!(!check("$[0]", &[name("0")]));
        assert!(check("$.*", &[name("x")]));
        assert!(check("$[*]", &[PathElem::Index(7)]));
        assert!(check("$['x', 1]", &[name("x")]));
        assert!(check("$['x', 1]", &[PathElem::Index(1)]));
        assert!(!check("$['x', 1]", &[PathElem::Index(0)]));
    }

    #[test]
    fn descendant_matches_at_any_depth() {
        let deep = [name("store"), name("book"), PathElem::Index(0), name("author")];
        assert!(check("$..author", &deep));
        assert!(check("$..book[0].author", &deep));
        assert!(check("$.store..author", &deep));
        assert!(!check("$..book", &deep));
        assert!(check("$..*", &deep));
        assert!(!check("$..author", &[]));
    }

    #[test]
    fn descendant_backtracks() {
        // the first `a` does not lead to a match, the second does
        let steps = [name("a"), name("x"), name("a"), name("b")];
        assert!(check("$..a.b", &steps));
        assert!(!check("$..a.x.b", &steps));
    }

    #[test]
    fn filter_uses_current_value() {
        let segments = compile("$.prices[?(@ > 10)]").unwrap();
        let matcher = PathMatcher::new(&segments);
        let at = path(&[name("prices"), PathElem::Index(3)]);

        assert!(matcher.matches(&at, Some(&json!(11)), Unresolved::NoMatch));
        assert!(!matcher.matches(&at, Some(&json!(9)), Unresolved::NoMatch));
        assert!(!matcher.matches(&at, None, Unresolved::NoMatch));
        assert!(matcher.matches(&at, None, Unresolved::Match));
    }

    #[test]
    fn filter_applies_to_array_elements_only() {
        let segments = compile("$[?(@ == 1)]").unwrap();
        let matcher = PathMatcher::new(&segments);

        assert!(!matcher.matches(&path(&[name("a")]), Some(&json!(1)), Unresolved::Match));
    }

    #[test]
    fn descendant_filter_tests_object_members() {
        let segments = compile("$..[?(@.price < 20)]").unwrap();
        let matcher = PathMatcher::new(&segments);
        let bicycle = path(&[name("store"), name("bicycle")]);

        assert!(matcher.matches(&bicycle, Some(&json!({"price": 19.95})), Unresolved::NoMatch));
        assert!(!matcher.matches(&bicycle, Some(&json!({"price": 22})), Unresolved::NoMatch));
        let element = path(&[name("x"), PathElem::Index(0)]);
        assert!(matcher.matches(&element, Some(&json!({"price": 1})), Unresolved::NoMatch));
        assert!(!matcher.matches(&path(&[]), Some(&json!({"price": 1})), Unresolved::NoMatch));
    }
}
