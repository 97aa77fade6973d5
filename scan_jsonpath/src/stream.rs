//! The streaming engine: a pull-based iterator of matches over a JSON reader.
//!
//! The compiled query is split in two. The leading segments, up to and
//! including the first filter and up to but excluding the first backward
//! slice, are matched while the input is scanned token by token. A node they select is decoded in full and handed to the walker,
//! which applies the remaining segments in memory. Containers nobody selects
//! are never decoded: the engine steps into them and keeps scanning.
//!
//! Memory use is bounded by the nesting depth of the input, the largest
//! token, and the largest selected value.

use std::collections::VecDeque;
use std::io::Read;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jiter::Peek;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::matcher::{Matcher, PathMatcher, Unresolved};
use crate::reader::TokenReader;
use crate::segment::Segment;
use crate::stack::{canonical_path, ContainerKind, PathElem, StructurePosition, TraversalStack};
use crate::walker;

/// A selected node: its canonical path and its decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub path: String,
    pub value: Value,
}

/// Limits and buffer sizes of one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Initial size of the read window
    pub buffer_size: usize,
    /// The window grows up to this size to hold a single token
    pub max_buffer_size: usize,
    /// Deepest container nesting accepted in the input
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            buffer_size: 8 * 1024,
            max_buffer_size: 64 * 1024 * 1024,
            max_depth: 512,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    #[must_use]
    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Stops a running traversal from any thread.
///
/// Clones share the same flag. The iterator checks it before every step and
/// before yielding a match; after that, it reports [`Error::Cancelled`] once.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing is read yet
    AtRoot,
    /// Inside the root container
    Streaming,
    /// The root value is complete, trailing input is not checked yet
    AfterRoot,
    Done,
    /// An error was reported; nothing more is produced
    Failed,
}

// Outcome of visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// A container frame was opened; the node stays on the stack
    Entered,
    /// The node was decoded and is finished
    Consumed,
}

/// Lazy sequence of matches.
///
/// Input is read only when the next item is requested. Matches come in
/// document order of the selected nodes. An error ends the sequence: it is
/// yielded once, and `None` follows.
pub struct Matches<R> {
    reader: TokenReader<R>,
    segments: Arc<[Segment]>,
    // `segments[..split]` are matched while scanning, the rest by the walker
    split: usize,
    // a streaming segment is `..`: decoded subtrees are searched too
    has_deep: bool,
    stack: TraversalStack,
    pending: VecDeque<Match>,
    phase: Phase,
    cancel: CancelHandle,
    max_depth: usize,
}

impl<R> std::fmt::Debug for Matches<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matches")
            .field("reader", &self.reader)
            .field("split", &self.split)
            .field("phase", &self.phase)
            .field("path", &self.stack.canonical_path())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl<R: Read> Matches<R> {
    pub(crate) fn new(reader: R, segments: Arc<[Segment]>, options: &Options) -> Self {
        let split = segments
            .iter()
            .enumerate()
            .find_map(|(at, segment)| {
                if segment.needs_length() {
                    Some(at)
                } else if segment.filter().is_some() {
                    Some(at + 1)
                } else {
                    None
                }
            })
            .unwrap_or(segments.len());
        let has_deep = segments[..split].iter().any(|segment| segment.deep);
        log::debug!(
            "streaming {} of {} segments, deep: {has_deep}",
            split,
            segments.len()
        );
        Matches {
            reader: TokenReader::new(reader, options.buffer_size, options.max_buffer_size),
            segments,
            split,
            has_deep,
            stack: TraversalStack::new(),
            pending: VecDeque::new(),
            phase: Phase::AtRoot,
            cancel: CancelHandle::new(),
            max_depth: options.max_depth,
        }
    }

    /// Handle to stop this traversal, possibly from another thread.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Use an existing handle, for example one shared by several traversals.
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Absolute input offset of the next unread byte.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.reader.current_index()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn step(&mut self) -> Result<()> {
        match self.phase {
            Phase::AtRoot => {
                let peeked = self.reader.peek()?;
                self.phase = match self.visit(peeked)? {
                    Visit::Entered => Phase::Streaming,
                    Visit::Consumed => Phase::AfterRoot,
                };
                Ok(())
            }
            Phase::Streaming => self.step_container(),
            Phase::AfterRoot => {
                self.reader.finish()?;
                log::debug!("end of input at index {}", self.reader.current_index());
                self.phase = Phase::Done;
                Ok(())
            }
            Phase::Done | Phase::Failed => Ok(()),
        }
    }

    // Advance inside the innermost open container by one member or element
    fn step_container(&mut self) -> Result<()> {
        let Some(frame) = self.stack.top_container() else {
            self.phase = Phase::AfterRoot;
            return Ok(());
        };
        let position = frame.position;
        let index = frame.next_index;
        frame.position = match frame.kind {
            ContainerKind::Object => StructurePosition::ObjectMiddle,
            ContainerKind::Array => StructurePosition::ArrayMiddle,
        };

        match position {
            StructurePosition::ObjectBegin | StructurePosition::ObjectMiddle => {
                let key = if position == StructurePosition::ObjectBegin {
                    self.reader.known_object()?
                } else {
                    self.reader.next_key()?
                };
                let Some(key) = key else {
                    self.leave_container();
                    return Ok(());
                };
                let peeked = self.reader.peek()?;
                self.stack.push_node(PathElem::Name(key));
                self.visit_child(peeked)
            }
            StructurePosition::ArrayBegin | StructurePosition::ArrayMiddle => {
                let element = if position == StructurePosition::ArrayBegin {
                    self.reader.known_array()?
                } else {
                    self.reader.array_step()?
                };
                let Some(peeked) = element else {
                    self.leave_container();
                    return Ok(());
                };
                if let Some(frame) = self.stack.top_container() {
                    frame.next_index = index + 1;
                }
                self.stack.push_node(PathElem::Index(index));
                self.visit_child(peeked)
            }
        }
    }

    fn visit_child(&mut self, peeked: Peek) -> Result<()> {
        if self.visit(peeked)? == Visit::Consumed {
            self.stack.pop_node();
        }
        Ok(())
    }

    // The node is on the stack and its first byte is peeked. A container that
    // cannot be selected, even if a pending filter passes, is streamed into.
    // Anything else is decoded and matched with its value.
    fn visit(&mut self, peeked: Peek) -> Result<Visit> {
        let kind = match peeked {
            Peek::Object => Some(ContainerKind::Object),
            Peek::Array => Some(ContainerKind::Array),
            _ => None,
        };
        let streaming = PathMatcher::new(&self.segments[..self.split]);

        let value = match kind {
            Some(kind) if !streaming.matches(self.stack.path(), None, Unresolved::Match) => {
                if self.stack.container_depth() >= self.max_depth {
                    return Err(Error::MaxNestingExceeded {
                        limit: self.max_depth,
                        index: self.reader.current_index(),
                    });
                }
                log::trace!("entering {}", self.stack.canonical_path());
                self.stack.open_container(kind);
                return Ok(Visit::Entered);
            }
            Some(_) => {
                log::trace!("materializing {}", self.stack.canonical_path());
                self.reader
                    .known_value(peeked, self.stack.container_depth(), self.max_depth)?
            }
            None => self.reader.known_scalar(peeked)?,
        };

        self.stack.set_value(value);
        self.emit_current();
        Ok(Visit::Consumed)
    }

    fn leave_container(&mut self) {
        self.stack.close_container();
        if self.stack.container_depth() == 0 {
            self.phase = Phase::AfterRoot;
        } else {
            self.stack.pop_node();
        }
    }

    fn emit_current(&mut self) {
        let Some(value) = self.stack.take_value() else {
            return;
        };
        let mut emitter = Emitter {
            streaming: PathMatcher::new(&self.segments[..self.split]),
            tail: &self.segments[self.split..],
            has_deep: self.has_deep,
            pending: &mut self.pending,
        };
        emitter.emit(self.stack.path(), value);
    }
}

// Turns a decoded node into matches
struct Emitter<'a> {
    streaming: PathMatcher<'a>,
    tail: &'a [Segment],
    has_deep: bool,
    pending: &'a mut VecDeque<Match>,
}

impl Emitter<'_> {
    fn emit(&mut self, path: &[PathElem], value: Value) {
        if self.has_deep && (value.is_object() || value.is_array()) {
            // the scan does not step into a decoded subtree, so a descendant
            // segment is matched against its nodes here
            let mut path = path.to_vec();
            self.subtree(&mut path, &value);
        } else if self.streaming.matches(path, Some(&value), Unresolved::NoMatch) {
            self.selected(canonical_path(path), value);
        }
    }

    fn subtree(&mut self, path: &mut Vec<PathElem>, value: &Value) {
        if self.streaming.matches(path, Some(value), Unresolved::NoMatch) {
            self.selected(canonical_path(path), value.clone());
        }
        match value {
            Value::Object(map) => {
                for (name, child) in map {
                    path.push(PathElem::Name(name.clone()));
                    self.subtree(path, child);
                    path.pop();
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    path.push(PathElem::Index(index));
                    self.subtree(path, child);
                    path.pop();
                }
            }
            _ => {}
        }
    }

    fn selected(&mut self, path: String, value: Value) {
        if self.tail.is_empty() {
            log::trace!("match at {path}");
            self.pending.push_back(Match { path, value });
        } else {
            let found = walker::walk(self.tail, &value, &path);
            log::trace!("{} matches below {path}", found.len());
            self.pending.extend(found);
        }
    }
}

impl<R: Read> Iterator for Matches<R> {
    type Item = Result<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.phase == Phase::Failed {
                return None;
            }
            if self.cancel.is_cancelled() {
                if self.phase == Phase::Done && self.pending.is_empty() {
                    return None;
                }
                log::debug!("cancelled at index {}", self.reader.current_index());
                self.phase = Phase::Failed;
                self.pending.clear();
                return Some(Err(Error::Cancelled));
            }
            if let Some(found) = self.pending.pop_front() {
                return Some(Ok(found));
            }
            if self.phase == Phase::Done {
                return None;
            }
            if let Err(error) = self.step() {
                log::debug!("traversal failed: {error}");
                self.phase = Phase::Failed;
                self.pending.clear();
                return Some(Err(error));
            }
        }
    }
}

impl<R: Read> FusedIterator for Matches<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use serde_json::json;

    fn matches<'a>(expression: &str, input: &'a str) -> Matches<&'a [u8]> {
        let segments: Arc<[Segment]> = compile(expression).unwrap().into();
        Matches::new(input.as_bytes(), segments, &Options::default())
    }

    #[test]
    fn query_is_split_after_the_first_filter() {
        let m = matches("$.a[?(@.b == 1)].c[?(@ > 2)]", "{}");
        assert_eq!(m.split, 2);
        assert!(!m.has_deep);
        let m = matches("$..a.b", "{}");
        assert_eq!(m.split, 2);
        assert!(m.has_deep);
    }

    #[test]
    fn backward_slices_are_left_to_the_walker() {
        let m = matches("$.a[9:0:-2].b", "{}");
        assert_eq!(m.split, 1);
        let m = matches("$[::-1]", "[]");
        assert_eq!(m.split, 0);
        let m = matches("$.a[?(@.b == 1)][::-1]", "{}");
        assert_eq!(m.split, 2);
    }

    #[test]
    fn unselected_containers_are_not_decoded() {
        let mut m = matches("$.b", r#"{"a": {"x": [1, 2]}, "b": 3}"#);
        assert_eq!(
            m.next().unwrap().unwrap(),
            Match {
                path: "$.b".to_string(),
                value: json!(3)
            }
        );
        assert!(m.next().is_none());
        assert_eq!(m.stack.container_depth(), 0);
    }

    #[test]
    fn options_builder() {
        let options = Options::new()
            .with_buffer_size(16)
            .with_max_buffer_size(64)
            .with_max_depth(3);
        assert_eq!(
            options,
            Options {
                buffer_size: 16,
                max_buffer_size: 64,
                max_depth: 3
            }
        );
    }
}
