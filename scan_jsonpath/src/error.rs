//! Errors of query compilation and stream traversal.

use jiter::{JiterError, JiterErrorType, JsonErrorType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while compiling or running a query.
///
/// `Syntax` and `NotSupported` are raised before any input is read. All other
/// variants are reported once, as the last item of a [`crate::Matches`] sequence.
#[derive(Debug, Error)]
pub enum Error {
    /// The expression does not follow the JSONPath grammar
    #[error("syntax error in `{expression}` at position {position}: {message}")]
    Syntax {
        expression: String,
        position: usize,
        message: String,
    },
    /// The expression is valid JSONPath but cannot be evaluated by the streaming engine
    #[error("not supported in `{expression}` at position {position}: {message}")]
    NotSupported {
        expression: String,
        position: usize,
        message: String,
    },
    /// The input is structurally invalid where a container, key or value was expected
    #[error("malformed JSON at index {index}: {error_type}")]
    MalformedInput {
        error_type: JsonErrorType,
        index: usize,
    },
    /// The tokenizer rejected a scalar (bad escape, bad number, wrong type)
    #[error("cannot decode JSON at index {index}: {error_type}")]
    Decode {
        error_type: JiterErrorType,
        index: usize,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("query cancelled")]
    Cancelled,
    #[error("JSON nesting deeper than {limit} levels at index {index}")]
    MaxNestingExceeded { limit: usize, index: usize },
    #[error("token at index {index} does not fit into {limit} bytes")]
    TokenTooLarge { limit: usize, index: usize },
}

/// Coarse classification of [`Error`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    NotSupported,
    MalformedInput,
    Decode,
    Io,
    Cancelled,
    LimitExceeded,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::NotSupported { .. } => ErrorKind::NotSupported,
            Error::MalformedInput { .. } => ErrorKind::MalformedInput,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Io(_) => ErrorKind::Io,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::MaxNestingExceeded { .. } | Error::TokenTooLarge { .. } => {
                ErrorKind::LimitExceeded
            }
        }
    }

    /// `true` if the query text itself must be fixed, `false` if the problem is in the data
    /// or in the way the stream was driven.
    #[must_use]
    pub fn is_expression_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Syntax | ErrorKind::NotSupported)
    }

    /// Byte offset in the input, if the error is tied to a location in the document.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Error::MalformedInput { index, .. }
            | Error::Decode { index, .. }
            | Error::MaxNestingExceeded { index, .. }
            | Error::TokenTooLarge { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub(crate) fn syntax(expression: &str, position: usize, message: impl Into<String>) -> Error {
        Error::Syntax {
            expression: expression.to_string(),
            position,
            message: message.into(),
        }
    }

    pub(crate) fn not_supported(
        expression: &str,
        position: usize,
        message: impl Into<String>,
    ) -> Error {
        Error::NotSupported {
            expression: expression.to_string(),
            position,
            message: message.into(),
        }
    }

    /// `offset` is the absolute position of the window the tokenizer was looking at.
    pub(crate) fn from_jiter_error(offset: usize, jiter_error: JiterError) -> Error {
        let index = offset + jiter_error.index;
        match jiter_error.error_type {
            JiterErrorType::JsonError(json_error_type) if is_structural(&json_error_type) => {
                Error::MalformedInput {
                    error_type: json_error_type,
                    index,
                }
            }
            error_type => Error::Decode { error_type, index },
        }
    }

    pub(crate) fn unexpected_token(index: usize) -> Error {
        Error::MalformedInput {
            error_type: JsonErrorType::ExpectedSomeValue,
            index,
        }
    }
}

fn is_structural(error_type: &JsonErrorType) -> bool {
    matches!(
        error_type,
        JsonErrorType::EofWhileParsingList
            | JsonErrorType::EofWhileParsingObject
            | JsonErrorType::EofWhileParsingValue
            | JsonErrorType::ExpectedColon
            | JsonErrorType::ExpectedListCommaOrEnd
            | JsonErrorType::ExpectedObjectCommaOrEnd
            | JsonErrorType::ExpectedSomeValue
            | JsonErrorType::KeyMustBeAString
            | JsonErrorType::TrailingComma
            | JsonErrorType::TrailingCharacters
    )
}

// Errors a tokenizer may report only because the window ends in the middle of a token.
pub(crate) fn allowed_if_partial(error_type: &JiterErrorType) -> bool {
    matches!(
        error_type,
        JiterErrorType::JsonError(
            JsonErrorType::EofWhileParsingList
                | JsonErrorType::EofWhileParsingObject
                | JsonErrorType::EofWhileParsingString
                | JsonErrorType::EofWhileParsingValue
                | JsonErrorType::ExpectedListCommaOrEnd
                | JsonErrorType::ExpectedObjectCommaOrEnd
        )
    )
}
