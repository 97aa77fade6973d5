//! Compile a JSONPath expression into [`Segment`]s.
//!
//! Supported grammar:
//!
//! ```text
//! query    := '$' segment*
//! segment  := '.' name | '.*' | '..' name | '..*' | '..' bracket | bracket
//! bracket  := '[' ( '*' | index | slice | union | '?' filter ) ']'
//! union    := (index | quoted) (',' (index | quoted))*
//! slice    := [start] ':' [end] [':' [step]]
//! filter   := ['('] '@' ('.' name | '[' index ']' | '[' quoted ']')* op literal [')']
//! op       := '==' | '!=' | '<' | '<=' | '>' | '>=' | '=~' | '!~' | 'in' | 'nin'
//! literal  := number | quoted | 'true' | 'false' | 'null' | '/' regex '/' flags | '[' scalars ']'
//! ```
//!
//! Constructs the streaming engine cannot honor are rejected with
//! `Error::NotSupported` instead of being approximated.

use regex::RegexBuilder;

use crate::error::{Error, Result};
use crate::segment::{
    Filter, FilterStep, Literal, Operator, RegexLiteral, Scalar, Segment, Selector, Slice,
    UnionMember,
};

/// Parse and validate `expression`.
///
/// # Errors
///
/// `Error::Syntax` if the text is not JSONPath, `Error::NotSupported` for valid
/// JSONPath outside the supported subset.
pub fn compile(expression: &str) -> Result<Vec<Segment>> {
    let segments = Parser::new(expression).parse_query()?;
    log::debug!(
        "compiled `{expression}` into {} segment(s)",
        segments.len()
    );
    Ok(segments)
}

struct Parser<'e> {
    expr: &'e str,
    pos: usize,
}

// A bracket member before we know whether it is a union
enum Member {
    Name(String),
    Index(usize),
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl<'e> Parser<'e> {
    fn new(expr: &'e str) -> Self {
        Parser { expr, pos: 0 }
    }

    fn rest(&self) -> &'e str {
        &self.expr[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            return true;
        }
        false
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.rest().starts_with(keyword)
            && !self.rest()[keyword.len()..]
                .chars()
                .next()
                .is_some_and(is_name_char)
    }

    fn syntax(&self, message: impl Into<String>) -> Error {
        Error::syntax(self.expr, self.pos, message)
    }

    fn syntax_at(&self, position: usize, message: impl Into<String>) -> Error {
        Error::syntax(self.expr, position, message)
    }

    fn not_supported_at(&self, position: usize, message: impl Into<String>) -> Error {
        Error::not_supported(self.expr, position, message)
    }

    fn parse_query(&mut self) -> Result<Vec<Segment>> {
        if !self.eat('$') {
            return Err(self.syntax("expression must start with `$`"));
        }

        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            let segment = match c {
                '.' if self.rest().starts_with("..") => self.parse_descendant()?,
                '.' => self.parse_dot_child()?,
                '[' => self.parse_bracket()?,
                _ => return Err(self.syntax(format!("unexpected `{c}`"))),
            };
            segments.push(segment);
        }
        Ok(segments)
    }

    fn parse_descendant(&mut self) -> Result<Segment> {
        let start = self.pos;
        self.pos += 2;
        match self.peek() {
            None => Err(self.not_supported_at(start, "trailing `..` selects nothing")),
            Some('[') => {
                let segment = self.parse_bracket()?;
                Ok(Segment {
                    selectors: segment.selectors,
                    deep: true,
                })
            }
            Some('*') => {
                self.bump();
                Ok(Segment::descendant(Selector::Wildcard))
            }
            Some(c) if is_name_char(c) => {
                Ok(Segment::descendant(Selector::Name(self.parse_member_name()?)))
            }
            Some(c) => Err(self.syntax(format!("unexpected `{c}` after `..`"))),
        }
    }

    fn parse_dot_child(&mut self) -> Result<Segment> {
        let start = self.pos;
        self.bump();
        match self.peek() {
            None => Err(self.syntax_at(start, "trailing `.`")),
            Some('*') => {
                self.bump();
                Ok(Segment::child(Selector::Wildcard))
            }
            Some(c) if is_name_char(c) => {
                Ok(Segment::child(Selector::Name(self.parse_member_name()?)))
            }
            Some(c) => Err(self.syntax(format!("unexpected `{c}` after `.`"))),
        }
    }

    fn parse_member_name(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.syntax("expected a member name"));
        }
        Ok(self.expr[start..self.pos].to_string())
    }

    fn parse_bracket(&mut self) -> Result<Segment> {
        let open = self.pos;
        self.bump();
        self.skip_ws();

        let selector = match self.peek() {
            None => return Err(self.syntax_at(open, "unterminated bracket")),
            Some(']') => return Err(self.syntax_at(open, "empty bracket selector")),
            Some('*') => {
                self.bump();
                Selector::Wildcard
            }
            Some('?') => {
                self.bump();
                Selector::Filter(self.parse_filter()?)
            }
            Some(c) if c == '\'' || c == '"' || c == '-' || c == ':' || c.is_ascii_digit() => {
                self.parse_index_slice_or_union()?
            }
            Some(c) => return Err(self.syntax(format!("unexpected `{c}` in bracket selector"))),
        };

        self.skip_ws();
        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(Segment::child(selector))
            }
            None => Err(self.syntax_at(open, "unterminated bracket")),
            Some(c) => Err(self.syntax(format!("expected `]`, found `{c}`"))),
        }
    }

    fn parse_index_slice_or_union(&mut self) -> Result<Selector> {
        if self.peek() == Some(':') {
            return self.parse_slice(None);
        }

        let first = if matches!(self.peek(), Some('\'' | '"')) {
            Member::Name(self.parse_string()?)
        } else {
            let start = self.pos;
            let value = self.parse_integer()?;
            self.skip_ws();
            if self.peek() == Some(':') {
                return self.parse_slice(Some((value, start)));
            }
            Member::Index(self.to_index(value, start)?)
        };

        let mut members = vec![first];
        loop {
            self.skip_ws();
            if !self.eat(',') {
                break;
            }
            self.skip_ws();
            let start = self.pos;
            let member = match self.peek() {
                Some('\'' | '"') => Member::Name(self.parse_string()?),
                Some(c) if c == '-' || c.is_ascii_digit() => {
                    let value = self.parse_integer()?;
                    Member::Index(self.to_index(value, start)?)
                }
                Some('*' | ':' | '?') => {
                    return Err(
                        self.not_supported_at(start, "unions may only list names and indices")
                    )
                }
                None => return Err(self.syntax("unterminated union")),
                Some(c) => return Err(self.syntax(format!("unexpected `{c}` in union"))),
            };
            self.skip_ws();
            if self.peek() == Some(':') {
                return Err(self.not_supported_at(start, "unions may only list names and indices"));
            }
            members.push(member);
        }

        let mut members = members.into_iter().map(|member| match member {
            Member::Name(name) => UnionMember::Name(name),
            Member::Index(index) => UnionMember::Index(index),
        });
        match (members.next(), members.len()) {
            (Some(UnionMember::Name(name)), 0) => Ok(Selector::Name(name)),
            (Some(UnionMember::Index(index)), 0) => Ok(Selector::Index(index)),
            (first, _) => Ok(Selector::Union(first.into_iter().chain(members).collect())),
        }
    }

    // The cursor is at the first `:`
    fn parse_slice(&mut self, start: Option<(i64, usize)>) -> Result<Selector> {
        self.bump();
        self.skip_ws();
        let end = self.parse_optional_integer()?;
        self.skip_ws();
        let step = if self.eat(':') {
            self.skip_ws();
            self.parse_optional_integer()?
        } else {
            None
        };

        let bound = |value: Option<(i64, usize)>| -> Result<Option<usize>> {
            match value {
                Some((value, position)) if value < 0 => Err(self.not_supported_at(
                    position,
                    "negative slice bounds need the array length, which is unknown while streaming",
                )),
                Some((value, _)) => Ok(Some(value.unsigned_abs() as usize)),
                None => Ok(None),
            }
        };
        let start_index = bound(start)?;
        let end_index = bound(end)?;

        let step_value = match step {
            Some((0, position)) => {
                return Err(self.not_supported_at(position, "slice step must not be zero"))
            }
            Some((value, _)) => value,
            None => 1,
        };

        Ok(Selector::Slice(Slice {
            start: start_index,
            end: end_index,
            step: step_value,
        }))
    }

    fn parse_optional_integer(&mut self) -> Result<Option<(i64, usize)>> {
        match self.peek() {
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                Ok(Some((self.parse_integer()?, start)))
            }
            _ => Ok(None),
        }
    }

    fn parse_integer(&mut self) -> Result<i64> {
        let start = self.pos;
        self.eat('-');
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if digits_start == self.pos {
            return Err(self.syntax("expected an integer"));
        }
        self.expr[start..self.pos]
            .parse::<i64>()
            .map_err(|_| self.syntax_at(start, "integer out of range"))
    }

    fn to_index(&self, value: i64, position: usize) -> Result<usize> {
        if value < 0 {
            return Err(self.not_supported_at(
                position,
                "negative array indices need the array length, which is unknown while streaming",
            ));
        }
        Ok(value.unsigned_abs() as usize)
    }

    //
    // Filters
    //

    // The cursor is after `?`
    fn parse_filter(&mut self) -> Result<Filter> {
        self.skip_ws();
        let open = self.pos;
        let parenthesized = self.eat('(');
        self.skip_ws();

        match self.peek() {
            Some('@') => {
                self.bump();
            }
            Some('$') => {
                return Err(self.not_supported_at(
                    self.pos,
                    "filters may only reference the current node `@`",
                ))
            }
            Some('!') => {
                return Err(self.not_supported_at(self.pos, "negated filters are not supported"))
            }
            None => return Err(self.syntax_at(open, "unterminated filter")),
            Some(c) => return Err(self.syntax(format!("filter must start with `@`, found `{c}`"))),
        }

        let path = self.parse_filter_path()?;
        self.skip_ws();

        let operator_position = self.pos;
        let Some(operator) = self.parse_operator() else {
            return Err(match self.peek() {
                Some(')' | ']') => self.not_supported_at(
                    operator_position,
                    "existence tests are not supported, compare with an operator",
                ),
                Some('&' | '|') => {
                    self.not_supported_at(operator_position, "logical operators are not supported")
                }
                Some('=') => self.syntax("use `==` to compare"),
                None => self.syntax_at(open, "unterminated filter"),
                Some(c) => self.syntax(format!("expected a comparison operator, found `{c}`")),
            });
        };

        self.skip_ws();
        let literal = self.parse_literal()?;
        self.check_operands(operator, &literal, operator_position)?;

        self.skip_ws();
        if self.rest().starts_with("&&") || self.rest().starts_with("||") {
            return Err(self.not_supported_at(self.pos, "logical operators are not supported"));
        }
        if parenthesized && !self.eat(')') {
            return Err(match self.peek() {
                None | Some(']') => self.syntax_at(open, "unterminated filter parentheses"),
                Some(c) => self.syntax(format!("expected `)`, found `{c}`")),
            });
        }

        Ok(Filter {
            path,
            operator,
            literal,
        })
    }

    fn parse_filter_path(&mut self) -> Result<Vec<FilterStep>> {
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.bump();
                    match self.peek() {
                        Some('.') => {
                            return Err(self.not_supported_at(
                                self.pos,
                                "descendant segments are not supported inside filters",
                            ))
                        }
                        Some('*') => {
                            return Err(self.not_supported_at(
                                self.pos,
                                "wildcards are not supported inside filters",
                            ))
                        }
                        _ => path.push(FilterStep::Name(self.parse_member_name()?)),
                    }
                }
                Some('[') => {
                    let open = self.pos;
                    self.bump();
                    self.skip_ws();
                    let step = match self.peek() {
                        Some('\'' | '"') => FilterStep::Name(self.parse_string()?),
                        Some(c) if c == '-' || c.is_ascii_digit() => {
                            let start = self.pos;
                            let value = self.parse_integer()?;
                            FilterStep::Index(self.to_index(value, start)?)
                        }
                        Some('*' | ':' | '?') => {
                            return Err(self.not_supported_at(
                                self.pos,
                                "only names and indices are supported inside filters",
                            ))
                        }
                        None => return Err(self.syntax_at(open, "unterminated bracket")),
                        Some(c) => {
                            return Err(self.syntax(format!("unexpected `{c}` in bracket selector")))
                        }
                    };
                    self.skip_ws();
                    if !self.eat(']') {
                        return Err(self.syntax_at(open, "unterminated bracket"));
                    }
                    path.push(step);
                }
                _ => return Ok(path),
            }
        }
    }

    fn parse_operator(&mut self) -> Option<Operator> {
        const SYMBOLS: [(&str, Operator); 8] = [
            ("==", Operator::Eq),
            ("!=", Operator::Ne),
            ("<=", Operator::Le),
            (">=", Operator::Ge),
            ("=~", Operator::Match),
            ("!~", Operator::NotMatch),
            ("<", Operator::Lt),
            (">", Operator::Gt),
        ];
        for (symbol, operator) in SYMBOLS {
            if self.rest().starts_with(symbol) {
                self.pos += symbol.len();
                return Some(operator);
            }
        }
        for (keyword, operator) in [("nin", Operator::NotIn), ("in", Operator::In)] {
            if self.at_keyword(keyword) {
                self.pos += keyword.len();
                return Some(operator);
            }
        }
        None
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        match self.peek() {
            Some('/') => Ok(Literal::Regex(self.parse_regex()?)),
            Some('[') => Ok(Literal::Array(self.parse_array()?)),
            Some('$' | '@') => Err(self.not_supported_at(
                self.pos,
                "comparisons between two paths are not supported",
            )),
            _ => Ok(Literal::Scalar(self.parse_scalar()?)),
        }
    }

    fn parse_scalar(&mut self) -> Result<Scalar> {
        match self.peek() {
            Some('\'' | '"') => Ok(Scalar::String(self.parse_string()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => Ok(Scalar::Number(self.parse_number()?)),
            Some(_) if self.at_keyword("true") => {
                self.pos += 4;
                Ok(Scalar::Bool(true))
            }
            Some(_) if self.at_keyword("false") => {
                self.pos += 5;
                Ok(Scalar::Bool(false))
            }
            Some(_) if self.at_keyword("null") => {
                self.pos += 4;
                Ok(Scalar::Null)
            }
            Some('[' | '/') => Err(self.not_supported_at(
                self.pos,
                "array literals may only contain numbers, strings, booleans and null",
            )),
            Some(c) => Err(self.syntax(format!("expected a literal, found `{c}`"))),
            None => Err(self.syntax("expected a literal")),
        }
    }

    fn parse_number(&mut self) -> Result<f64> {
        let start = self.pos;
        self.eat('-');
        let mut digits = 0;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            digits += 1;
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                digits += 1;
            }
        }
        if digits > 0 && matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if !self.eat('+') {
                self.eat('-');
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if digits == 0 {
            return Err(self.syntax_at(start, "expected a number"));
        }
        self.expr[start..self.pos]
            .parse::<f64>()
            .map_err(|_| self.syntax_at(start, "invalid number"))
    }

    fn parse_string(&mut self) -> Result<String> {
        let open = self.pos;
        let quote = self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.syntax_at(open, "unterminated string literal")),
                Some(c) if Some(c) == quote => return Ok(text),
                Some('\\') => {
                    let escape = self.pos - 1;
                    let unescaped = match self.bump() {
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000C}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.parse_unicode_escape(escape)?,
                        None => return Err(self.syntax_at(open, "unterminated string literal")),
                        Some(c) => {
                            return Err(self.syntax_at(escape, format!("invalid escape `\\{c}`")))
                        }
                    };
                    text.push(unescaped);
                }
                Some(c) => text.push(c),
            }
        }
    }

    // The cursor is after `\u`
    fn parse_unicode_escape(&mut self, escape: usize) -> Result<char> {
        let high = self.parse_hex4(escape)?;
        let code = match high {
            0xD800..=0xDBFF => {
                if !self.rest().starts_with("\\u") {
                    return Err(self.syntax_at(escape, "unpaired high surrogate"));
                }
                self.pos += 2;
                let low = self.parse_hex4(escape)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.syntax_at(escape, "invalid low surrogate"));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.syntax_at(escape, "unpaired low surrogate")),
            code => code,
        };
        char::from_u32(code).ok_or_else(|| self.syntax_at(escape, "invalid unicode escape"))
    }

    fn parse_hex4(&mut self, escape: usize) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.syntax_at(escape, "expected four hex digits after `\\u`"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_regex(&mut self) -> Result<RegexLiteral> {
        let open = self.pos;
        self.bump();
        let mut pattern = String::new();
        loop {
            match self.bump() {
                None => return Err(self.syntax_at(open, "unterminated regex literal")),
                Some('/') => break,
                Some('\\') => match self.bump() {
                    Some('/') => pattern.push('/'),
                    Some(c) => {
                        pattern.push('\\');
                        pattern.push(c);
                    }
                    None => return Err(self.syntax_at(open, "unterminated regex literal")),
                },
                Some(c) => pattern.push(c),
            }
        }

        let flags_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.bump();
        }
        let flags = self.expr[flags_start..self.pos].to_string();
        if let Some((offset, flag)) = flags.char_indices().find(|(_, c)| *c != 'i' && *c != 'm') {
            return Err(self.not_supported_at(
                flags_start + offset,
                format!("unsupported regex flag `{flag}`, only `i` and `m` are allowed"),
            ));
        }

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .build()
            .map_err(|e| self.syntax_at(open, format!("invalid regular expression: {e}")))?;
        Ok(RegexLiteral { regex })
    }

    fn parse_array(&mut self) -> Result<Vec<Scalar>> {
        let open = self.pos;
        self.bump();
        self.skip_ws();
        let mut items = Vec::new();
        if self.eat(']') {
            return Ok(items);
        }
        loop {
            self.skip_ws();
            items.push(self.parse_scalar()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Ok(items);
            }
            return Err(match self.peek() {
                None => self.syntax_at(open, "unterminated array literal"),
                Some(c) => self.syntax(format!("expected `,` or `]`, found `{c}`")),
            });
        }
    }

    fn check_operands(&self, operator: Operator, literal: &Literal, position: usize) -> Result<()> {
        let problem = match literal {
            Literal::Scalar(Scalar::Number(_)) if operator.is_ordering() => None,
            _ if operator.is_ordering() => Some(format!("`{operator}` needs a numeric literal")),
            Literal::Regex(_) if operator.is_regex() => None,
            _ if operator.is_regex() => Some(format!("`{operator}` needs a regex literal")),
            Literal::Array(_) if operator.is_membership() => None,
            _ if operator.is_membership() => Some(format!("`{operator}` needs an array literal")),
            Literal::Regex(_) => Some(format!("a regex literal cannot be compared with `{operator}`")),
            Literal::Array(_) => Some(format!("an array literal cannot be compared with `{operator}`")),
            Literal::Scalar(_) => None,
        };
        match problem {
            Some(message) => Err(self.not_supported_at(position, message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(expression: &str) -> Selector {
        let mut segments = compile(expression).unwrap();
        assert_eq!(segments.len(), 1, "{expression}");
        segments.remove(0).selectors.remove(0)
    }

    fn filter(expression: &str) -> Filter {
        match selector(expression) {
            Selector::Filter(filter) => filter,
            other => panic!("expected a filter, got {other:?}"),
        }
    }

    #[test]
    fn root_only() {
        assert!(compile("$").unwrap().is_empty());
    }

    #[test]
    fn dot_and_descendant_segments() {
        let segments = compile("$.store..author.*").unwrap();
        assert_eq!(segments.len(), 3);
        assert!(!segments[0].deep);
        assert!(matches!(&segments[0].selectors[0], Selector::Name(n) if n == "store"));
        assert!(segments[1].deep);
        assert!(matches!(&segments[1].selectors[0], Selector::Name(n) if n == "author"));
        assert!(matches!(segments[2].selectors[0], Selector::Wildcard));
    }

    #[test]
    fn dot_names_take_letters_from_any_script() {
        assert!(matches!(selector("$.café"), Selector::Name(n) if n == "café"));
        assert!(matches!(selector("$..名前"), Selector::Name(n) if n == "名前"));
        assert!(matches!(selector("$.a-b_1"), Selector::Name(n) if n == "a-b_1"));
        // punctuation and symbols need brackets
        assert!(matches!(compile("$.a→b"), Err(Error::Syntax { .. })));
        assert!(matches!(compile("$.€"), Err(Error::Syntax { .. })));
        assert!(matches!(selector("$['a→b']"), Selector::Name(n) if n == "a→b"));
    }

    #[test]
    fn descendant_bracket() {
        let segments = compile("$..[0]").unwrap();
        assert!(segments[0].deep);
        assert!(matches!(segments[0].selectors[0], Selector::Index(0)));
    }

    #[test]
    fn bracket_members() {
        assert!(matches!(selector("$['a b']"), Selector::Name(n) if n == "a b"));
        assert!(matches!(selector("$[ 3 ]"), Selector::Index(3)));
        assert!(matches!(selector("$[*]"), Selector::Wildcard));
        match selector("$[0, 'x', \"y\"]") {
            Selector::Union(members) => assert_eq!(
                members,
                vec![
                    UnionMember::Index(0),
                    UnionMember::Name("x".to_string()),
                    UnionMember::Name("y".to_string())
                ]
            ),
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn slices() {
        let slice = |expression| match selector(expression) {
            Selector::Slice(slice) => slice,
            other => panic!("expected a slice, got {other:?}"),
        };
        assert_eq!(slice("$[:2]"), Slice { start: None, end: Some(2), step: 1 });
        assert_eq!(slice("$[1:]"), Slice { start: Some(1), end: None, step: 1 });
        assert_eq!(slice("$[1:8:3]"), Slice { start: Some(1), end: Some(8), step: 3 });
        assert_eq!(slice("$[::-1]"), Slice { start: None, end: None, step: -1 });
        assert_eq!(slice("$[5::-2]"), Slice { start: Some(5), end: None, step: -2 });
    }

    #[test]
    fn filter_path_and_literals() {
        let f = filter("$[?(@.price < 10)]");
        assert_eq!(f.path, vec![FilterStep::Name("price".to_string())]);
        assert_eq!(f.operator, Operator::Lt);
        assert!(matches!(f.literal, Literal::Scalar(Scalar::Number(n)) if n == 10.0));

        let f = filter("$[?(@['a b'][2] == 'x\\u0041')]");
        assert_eq!(
            f.path,
            vec![FilterStep::Name("a b".to_string()), FilterStep::Index(2)]
        );
        assert!(matches!(f.literal, Literal::Scalar(Scalar::String(ref s)) if s == "xA"));

        let f = filter("$[?@.ok != true]");
        assert_eq!(f.operator, Operator::Ne);
        assert!(matches!(f.literal, Literal::Scalar(Scalar::Bool(true))));
    }

    #[test]
    fn surrogate_pair_escape() {
        let f = filter(r#"$[?(@ == "\uD83D\uDE00")]"#);
        assert!(matches!(f.literal, Literal::Scalar(Scalar::String(ref s)) if s == "\u{1F600}"));
    }

    #[test]
    fn regex_literal() {
        let f = filter("$[?(@.name =~ /^a\\/b/i)]");
        match f.literal {
            Literal::Regex(regex) => {
                assert_eq!(regex.regex.as_str(), "^a/b");
                assert!(regex.regex.is_match("A/B"));
            }
            other => panic!("expected a regex, got {other:?}"),
        }
    }

    #[test]
    fn membership_literal() {
        let f = filter("$[?(@.size nin ['S', 2, null])]");
        assert_eq!(f.operator, Operator::NotIn);
        match f.literal {
            Literal::Array(items) => assert_eq!(
                items,
                vec![Scalar::String("S".to_string()), Scalar::Number(2.0), Scalar::Null]
            ),
            other => panic!("expected an array, got {other:?}"),
        }
    }

    #[test]
    fn name_starting_with_in_is_not_an_operator() {
        let err = compile("$[?(@.a index 1)]").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }), "{err}");
    }
}
