//! The line-oriented wire protocol.
//!
//! Requests are UTF-8 text, one command per line, whitespace-separated
//! tokens. Replies (only `SolveMST` produces one) are framed with a 4-byte
//! little-endian signed length prefix followed by that many bytes of UTF-8.

use std::io::{self, Read, Write};

use crate::mst::Algorithm;

/// The largest command the server accepts, including the terminator.
///
/// Longer lines are dropped whole, never split.
pub const MAX_COMMAND_BYTES: usize = 1024;

/// A parsed client command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Reset the client's graph to `vertex_count` fresh vertices.
    NewGraph {
        /// Number of vertices in the new graph.
        vertex_count: usize,
    },
    /// Add an undirected weighted edge.
    AddEdge {
        /// One endpoint.
        source: usize,
        /// The other endpoint.
        target: usize,
        /// Edge weight.
        weight: i64,
    },
    /// Remove every edge between the endpoint pair.
    RemoveEdge {
        /// One endpoint.
        source: usize,
        /// The other endpoint.
        target: usize,
    },
    /// Compute the MST with the named algorithm and ship the reply.
    SolveMst {
        /// The requested algorithm.
        algorithm: Algorithm,
    },
}

/// Errors raised while parsing a command line.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The line contained no tokens.
    #[error("empty command")]
    EmptyCommand,
    /// The first token named no known command.
    #[error("unknown command `{command}`")]
    UnknownCommand {
        /// The unrecognised token.
        command: String,
    },
    /// A command was missing a required argument.
    #[error("command `{command}` is missing its `{argument}` argument")]
    MissingArgument {
        /// The command being parsed.
        command: &'static str,
        /// Name of the absent argument.
        argument: &'static str,
    },
    /// An argument did not parse as an integer of the expected width.
    #[error("command `{command}` argument `{argument}` is not an integer: `{value}`")]
    InvalidInteger {
        /// The command being parsed.
        command: &'static str,
        /// Name of the offending argument.
        argument: &'static str,
        /// The raw token.
        value: String,
    },
    /// `SolveMST` named an algorithm this server does not provide.
    ///
    /// Unlike the other variants this one produces a framed error reply.
    #[error("unsupported MST algorithm `{name}`")]
    UnsupportedAlgorithm {
        /// The requested algorithm name.
        name: String,
    },
}

/// Parses one command line into a [`Request`].
///
/// Surplus trailing tokens are ignored.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the malformed input; the caller
/// decides the disposition (log-and-ignore for everything except
/// [`ParseError::UnsupportedAlgorithm`], which is answered on the wire).
pub fn parse_request(line: &str) -> Result<Request, ParseError> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next().ok_or(ParseError::EmptyCommand)?;

    match command {
        "NewGraph" => {
            let vertex_count = integer_argument(&mut tokens, "NewGraph", "n")?;
            Ok(Request::NewGraph { vertex_count })
        }
        "AddEdge" => {
            let source = integer_argument(&mut tokens, "AddEdge", "i")?;
            let target = integer_argument(&mut tokens, "AddEdge", "j")?;
            let weight = integer_argument(&mut tokens, "AddEdge", "w")?;
            Ok(Request::AddEdge {
                source,
                target,
                weight,
            })
        }
        "RemoveEdge" => {
            let source = integer_argument(&mut tokens, "RemoveEdge", "i")?;
            let target = integer_argument(&mut tokens, "RemoveEdge", "j")?;
            Ok(Request::RemoveEdge { source, target })
        }
        "SolveMST" => {
            let name = tokens.next().ok_or(ParseError::MissingArgument {
                command: "SolveMST",
                argument: "algorithm",
            })?;
            let algorithm =
                Algorithm::parse(name).ok_or_else(|| ParseError::UnsupportedAlgorithm {
                    name: name.to_owned(),
                })?;
            Ok(Request::SolveMst { algorithm })
        }
        other => Err(ParseError::UnknownCommand {
            command: other.to_owned(),
        }),
    }
}

fn integer_argument<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<T, ParseError> {
    let token = tokens
        .next()
        .ok_or(ParseError::MissingArgument { command, argument })?;
    token.parse().map_err(|_| ParseError::InvalidInteger {
        command,
        argument,
        value: token.to_owned(),
    })
}

/// Errors raised while framing or unframing a reply.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The underlying transport failed.
    #[error("transport failure: {0}")]
    Io(#[from] io::Error),
    /// A reply body exceeded the signed 32-bit length prefix.
    #[error("reply body of {bytes} bytes does not fit the frame header")]
    BodyTooLarge {
        /// Size of the oversized body.
        bytes: usize,
    },
    /// A frame header announced a negative length.
    #[error("frame header announced invalid length {length}")]
    InvalidLength {
        /// The announced length.
        length: i32,
    },
}

/// Writes `body` as one length-prefixed frame.
///
/// # Errors
///
/// Returns [`FrameError::BodyTooLarge`] when the body exceeds `i32::MAX`
/// bytes, or the underlying I/O error.
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), FrameError> {
    let length =
        i32::try_from(body.len()).map_err(|_| FrameError::BodyTooLarge { bytes: body.len() })?;
    writer.write_all(&length.to_le_bytes())?;
    writer.write_all(body)?;
    writer.flush()?;
    Ok(())
}

/// Reads one length-prefixed frame and returns its body.
///
/// # Errors
///
/// Returns [`FrameError::InvalidLength`] for a negative header, or the
/// underlying I/O error (including a short read).
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header)?;
    let length = i32::from_le_bytes(header);
    let length = usize::try_from(length).map_err(|_| FrameError::InvalidLength { length })?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    Ok(body)
}
