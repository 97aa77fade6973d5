pub mod buffer;
pub mod compiler;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod query;
pub mod reader;
pub mod segment;
pub mod stack;
pub mod stream;
pub mod walker;

pub use compiler::compile;
pub use error::{Error, ErrorKind, Result};
pub use matcher::{Matcher, PathMatcher, Unresolved};
pub use query::{compile_and_validate, stream, stream_with_options, JsonPath};
pub use segment::{Filter, Literal, Operator, Segment, Selector, Slice};
pub use stack::{canonical_path, PathElem};
pub use stream::{CancelHandle, Match, Matches, Options};

pub use jiter;
