//! Token-level access to a JSON stream.
//!
//! `TokenReader` drives `jiter` over the window of a [`Buffer`]. Each call
//! parses from the first unconsumed byte; if the window ends inside the token,
//! more input is read and the call is repeated from the same position.

use std::io::Read;

use jiter::{Jiter, JiterError, JiterResult, Peek};
use serde_json::{Map, Number, Value};

use crate::buffer::Buffer;
use crate::error::{allowed_if_partial, Error, Result};

pub struct TokenReader<R> {
    buffer: Buffer<R>,
}

impl<R> std::fmt::Debug for TokenReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenReader {{ buffer: {:?} }}", self.buffer)
    }
}

// A container being decoded by `TokenReader::known_value`
enum Partial {
    Array(Vec<Value>),
    Object(Map<String, Value>, String),
}

impl<R: Read> TokenReader<R> {
    #[must_use]
    pub fn new(reader: R, buffer_size: usize, max_buffer_size: usize) -> Self {
        TokenReader {
            buffer: Buffer::new(reader, buffer_size, max_buffer_size),
        }
    }

    /// Absolute input offset of the next unconsumed byte.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.buffer.position()
    }

    pub fn into_inner(self) -> R {
        self.buffer.into_inner()
    }

    /// Skip whitespace and report the kind of the next value without consuming it.
    ///
    /// # Errors
    ///
    /// `MalformedInput` at the end of input, or from the reader.
    pub fn peek(&mut self) -> Result<Peek> {
        self.loop_until_success(|j| j.peek())
    }

    /// Consume `{` and the first key with its colon. `None` for an empty object.
    ///
    /// # Errors
    ///
    /// From the tokenizer or the reader.
    pub fn known_object(&mut self) -> Result<Option<String>> {
        self.loop_until_success(|j| j.known_object().map(|key| key.map(str::to_owned)))
    }

    /// Consume `,` and the next key with its colon, or `}` (then `None`).
    ///
    /// # Errors
    ///
    /// From the tokenizer or the reader.
    pub fn next_key(&mut self) -> Result<Option<String>> {
        self.loop_until_success(|j| j.next_key().map(|key| key.map(str::to_owned)))
    }

    /// Consume `[` and peek the first element. `None` for an empty array.
    ///
    /// # Errors
    ///
    /// From the tokenizer or the reader.
    pub fn known_array(&mut self) -> Result<Option<Peek>> {
        self.loop_until_success(|j| j.known_array())
    }

    /// Consume `,` and peek the next element, or consume `]` (then `None`).
    ///
    /// # Errors
    ///
    /// From the tokenizer or the reader.
    pub fn array_step(&mut self) -> Result<Option<Peek>> {
        self.loop_until_success(|j| j.array_step())
    }

    /// Decode a scalar whose first byte was peeked.
    ///
    /// Numbers keep their full precision. The spelling of an exponent is
    /// normalized, so `2E3` reads back as `2e+3`.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if `peeked` does not start a scalar, otherwise from the
    /// tokenizer or the reader.
    pub fn known_scalar(&mut self, peeked: Peek) -> Result<Value> {
        if peeked == Peek::Null {
            self.loop_until_success(|j| j.known_null())?;
            return Ok(Value::Null);
        }
        if peeked == Peek::True || peeked == Peek::False {
            let flag = self.loop_until_success(|j| j.known_bool(peeked))?;
            return Ok(Value::Bool(flag));
        }
        if peeked == Peek::String {
            let text = self.loop_until_success(|j| j.known_str().map(str::to_owned))?;
            return Ok(Value::String(text));
        }
        if peeked.is_num() {
            let index = self.current_index();
            let bytes = self.loop_until_success(|j| j.next_number_bytes().map(<[u8]>::to_vec))?;
            let number = serde_json::from_slice::<Number>(&bytes).map_err(|_| Error::Decode {
                error_type: jiter::JiterErrorType::JsonError(jiter::JsonErrorType::InvalidNumber),
                index,
            })?;
            return Ok(Value::Number(number));
        }
        Err(Error::unexpected_token(self.current_index()))
    }

    /// Decode the complete value whose first byte was peeked.
    ///
    /// Nested containers are tracked on an explicit stack. `depth` is the
    /// nesting level of the value itself; containers below `max_depth` levels
    /// are rejected.
    ///
    /// # Errors
    ///
    /// From the tokenizer or the reader, or `MaxNestingExceeded`.
    pub fn known_value(&mut self, peeked: Peek, depth: usize, max_depth: usize) -> Result<Value> {
        let mut stack: Vec<Partial> = Vec::new();
        let mut peeked = peeked;
        loop {
            let mut value = if peeked == Peek::Array || peeked == Peek::Object {
                if depth + stack.len() >= max_depth {
                    return Err(Error::MaxNestingExceeded {
                        limit: max_depth,
                        index: self.current_index(),
                    });
                }
                if peeked == Peek::Array {
                    match self.known_array()? {
                        Some(first) => {
                            stack.push(Partial::Array(Vec::new()));
                            peeked = first;
                            continue;
                        }
                        None => Value::Array(Vec::new()),
                    }
                } else {
                    match self.known_object()? {
                        Some(key) => {
                            stack.push(Partial::Object(Map::new(), key));
                            peeked = self.peek()?;
                            continue;
                        }
                        None => Value::Object(Map::new()),
                    }
                }
            } else {
                self.known_scalar(peeked)?
            };

            //
            // Attach the value to its parent, closing every container that ends here
            //
            loop {
                let next = match stack.last_mut() {
                    None => return Ok(value),
                    Some(Partial::Array(items)) => {
                        items.push(value);
                        self.array_step()?
                    }
                    Some(Partial::Object(map, key)) => {
                        map.insert(std::mem::take(key), value);
                        match self.next_key()? {
                            Some(next_key) => {
                                *key = next_key;
                                Some(self.peek()?)
                            }
                            None => None,
                        }
                    }
                };
                if let Some(next) = next {
                    peeked = next;
                    break;
                }
                value = match stack.pop() {
                    Some(Partial::Array(items)) => Value::Array(items),
                    Some(Partial::Object(map, _)) => Value::Object(map),
                    None => return Err(Error::unexpected_token(self.current_index())),
                };
            }
        }
    }

    /// Check that only whitespace follows the top-level value.
    ///
    /// # Errors
    ///
    /// `MalformedInput` for trailing characters, or from the reader.
    pub fn finish(&mut self) -> Result<()> {
        self.loop_until_success(|j| j.finish())
    }

    // Run `f` on a fresh `Jiter` over the window. A result is final when it
    // ends before the window does, or when the reader is exhausted. Otherwise
    // the token may continue in unread input: read more and run again.
    fn loop_until_success<T, F>(&mut self, mut f: F) -> Result<T>
    where
        F: for<'j> FnMut(&mut Jiter<'j>) -> JiterResult<T>,
    {
        loop {
            let (result, consumed, available) = {
                let window = self.buffer.window();
                let mut jiter = Jiter::new(window);
                let result = f(&mut jiter);
                (result, jiter.current_index(), window.len())
            };

            match result {
                Ok(value) if consumed < available || self.buffer.is_eof() => {
                    self.buffer.consume(consumed);
                    return Ok(value);
                }
                Ok(_) => {}
                Err(error) if self.buffer.is_eof() || !may_be_truncated(&error, available) => {
                    return Err(Error::from_jiter_error(self.buffer.position(), error));
                }
                Err(_) => {}
            }

            self.buffer.read_more()?;
        }
    }
}

fn may_be_truncated(error: &JiterError, available: usize) -> bool {
    allowed_if_partial(&error.error_type) || error.index + 1 >= available
}
