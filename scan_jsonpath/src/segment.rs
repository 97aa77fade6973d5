//! Compiled form of a JSONPath query.
//!
//! A query is a list of segments applied left to right. A segment holds the
//! selectors of one `.name`, `..name` or `[...]` step. Segments are built once
//! by the compiler and never change afterwards.

use regex::Regex;

/// One step of a compiled query.
#[derive(Debug, Clone)]
pub struct Segment {
    pub selectors: Vec<Selector>,
    /// `..`: the selectors apply at any depth below the current node
    pub deep: bool,
}

impl Segment {
    #[must_use]
    pub fn child(selector: Selector) -> Self {
        Segment {
            selectors: vec![selector],
            deep: false,
        }
    }

    #[must_use]
    pub fn descendant(selector: Selector) -> Self {
        Segment {
            selectors: vec![selector],
            deep: true,
        }
    }

    /// Whether a selector depends on the length of the array, which is only
    /// known once the array has been decoded. Backward slices count from the
    /// last element.
    #[must_use]
    pub fn needs_length(&self) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches!(selector, Selector::Slice(slice) if slice.step < 0))
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        self.selectors.iter().find_map(|selector| match selector {
            Selector::Filter(filter) => Some(filter),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum Selector {
    Name(String),
    Index(usize),
    Wildcard,
    Slice(Slice),
    Union(Vec<UnionMember>),
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionMember {
    Name(String),
    Index(usize),
}

/// `[start:end:step]`. The step is never zero, and bounds are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub step: i64,
}

impl Slice {
    /// Whether the element at `index` belongs to a forward slice when the
    /// array length is not known yet.
    ///
    /// Backward slices never match here: which elements they select depends
    /// on the length, so they are evaluated with [`Slice::indices`] on the
    /// decoded array.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        if self.step < 0 {
            return false;
        }
        let start = self.start.unwrap_or(0);
        let step = self.step.unsigned_abs() as usize;
        index >= start && self.end.map_or(true, |end| index < end) && (index - start) % step == 0
    }

    /// Selected positions of an array of length `len`, in selection order.
    #[must_use]
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let step = self.step.unsigned_abs() as usize;
        if self.step > 0 {
            let end = self.end.map_or(len, |end| end.min(len));
            (self.start.unwrap_or(0)..end).step_by(step).collect()
        } else {
            if len == 0 {
                return Vec::new();
            }
            let start = self.start.map_or(len - 1, |start| start.min(len - 1));
            (0..=start)
                .rev()
                .step_by(step)
                .take_while(|index| self.end.map_or(true, |end| *index > end))
                .collect()
        }
    }
}

/// `?(@<path> <operator> <literal>)`
#[derive(Debug, Clone)]
pub struct Filter {
    /// Steps from the candidate (`@`) to the compared value
    pub path: Vec<FilterStep>,
    pub operator: Operator,
    pub literal: Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStep {
    Name(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
    NotMatch,
    In,
    NotIn,
}

impl Operator {
    #[must_use]
    pub fn is_ordering(self) -> bool {
        matches!(self, Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge)
    }

    #[must_use]
    pub fn is_regex(self) -> bool {
        matches!(self, Operator::Match | Operator::NotMatch)
    }

    #[must_use]
    pub fn is_membership(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Match => "=~",
            Operator::NotMatch => "!~",
            Operator::In => "in",
            Operator::NotIn => "nin",
        };
        f.write_str(text)
    }
}

/// Right-hand side of a filter comparison, fixed at compile time.
#[derive(Debug, Clone)]
pub enum Literal {
    Scalar(Scalar),
    Regex(RegexLiteral),
    /// Only with `in` / `nin`
    Array(Vec<Scalar>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// `/pattern/flags`, compiled with flags `i` and `m` applied.
#[derive(Debug, Clone)]
pub struct RegexLiteral {
    pub regex: Regex,
}
