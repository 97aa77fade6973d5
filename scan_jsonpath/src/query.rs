//! Entry points: compile an expression once, run it over any number of streams.

use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

use crate::compiler::compile;
use crate::error::{Error, Result};
use crate::segment::Segment;
use crate::stream::{Matches, Options};

/// A compiled JSONPath expression.
///
/// Cloning is cheap, and the segments are shared by every traversal started
/// from the same `JsonPath`.
#[derive(Debug, Clone)]
pub struct JsonPath {
    expression: String,
    segments: Arc<[Segment]>,
}

impl JsonPath {
    /// # Errors
    ///
    /// `Syntax` or `NotSupported`, with the position in `expression`.
    pub fn compile(expression: &str) -> Result<Self> {
        let segments = compile(expression)?;
        Ok(JsonPath {
            expression: expression.to_string(),
            segments: segments.into(),
        })
    }

    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start a traversal of `reader` with default options. Nothing is read
    /// until the first match is requested.
    #[must_use]
    pub fn stream<R: Read>(&self, reader: R) -> Matches<R> {
        self.stream_with_options(reader, &Options::default())
    }

    #[must_use]
    pub fn stream_with_options<R: Read>(&self, reader: R, options: &Options) -> Matches<R> {
        Matches::new(reader, Arc::clone(&self.segments), options)
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(expression: &str) -> Result<Self> {
        JsonPath::compile(expression)
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Check an expression without running it.
///
/// # Errors
///
/// `Syntax` or `NotSupported`.
pub fn compile_and_validate(expression: &str) -> Result<()> {
    compile(expression).map(|_| ())
}

/// Compile `expression` and start a traversal of `reader`.
///
/// Expression errors are returned here, before any input is read. Input
/// errors come later, as the last item of the sequence.
///
/// # Errors
///
/// `Syntax` or `NotSupported`.
pub fn stream<R: Read>(reader: R, expression: &str) -> Result<Matches<R>> {
    stream_with_options(reader, expression, &Options::default())
}

/// [`stream`] with explicit limits and buffer sizes.
///
/// # Errors
///
/// `Syntax` or `NotSupported`.
pub fn stream_with_options<R: Read>(
    reader: R,
    expression: &str,
    options: &Options,
) -> Result<Matches<R>> {
    let path = JsonPath::compile(expression)?;
    Ok(path.stream_with_options(reader, options))
}
