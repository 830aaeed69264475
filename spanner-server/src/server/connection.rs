//! Per-connection request handling.
//!
//! One handler thread per accepted socket. The handler reads one command
//! per line, mutates its own client slot for the graph commands, and for
//! `SolveMST` computes the result synchronously under the slot mutex before
//! handing delivery to the configured concurrency core. It never waits for
//! a reply to reach the wire.

use std::{
    io::{BufRead, BufReader, Read},
    net::TcpStream,
    str,
    sync::{Arc, Mutex},
};

use spanner_core::{
    Algorithm, Graph, MAX_COMMAND_BYTES, ParseError, Request, parse_request, solve,
};
use tracing::{info, warn};

use super::{
    registry::{ClientId, ClientSlot, Registry},
    reply::{self, ReplyCore},
};

pub(crate) fn handle_client(
    client: ClientId,
    stream: TcpStream,
    registry: &Registry,
    core: &ReplyCore,
) {
    let slot = registry.register(client);

    let reader = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            warn!(client, error = %err, "failed to clone client socket; dropping connection");
            registry.remove(client);
            return;
        }
    };
    let mut reader = BufReader::with_capacity(MAX_COMMAND_BYTES, reader);

    let mut line = Vec::new();
    loop {
        line.clear();
        // The cap is enforced while reading: a line can never occupy more
        // than `MAX_COMMAND_BYTES` of memory, no matter what arrives.
        let read = reader
            .by_ref()
            .take(MAX_COMMAND_BYTES as u64)
            .read_until(b'\n', &mut line);
        match read {
            Ok(0) => break,
            Ok(bytes) => {
                if bytes == MAX_COMMAND_BYTES && line.last() != Some(&b'\n') {
                    warn!(client, "dropping oversized command");
                    if !discard_to_line_end(&mut reader) {
                        break;
                    }
                    continue;
                }
                match str::from_utf8(&line) {
                    Ok(text) => process_command(client, text, &slot, core, &stream),
                    Err(err) => warn!(client, error = %err, "ignoring non-UTF-8 command"),
                }
            }
            Err(err) => {
                warn!(client, error = %err, "read failed; treating as disconnect");
                break;
            }
        }
    }

    registry.remove(client);
    info!(client, "client disconnected");
}

/// Consumes the rest of an over-long line in bounded chunks.
///
/// Returns `false` when the stream ends (EOF or error) before the line
/// does, in which case the caller drops the connection.
fn discard_to_line_end(reader: &mut impl BufRead) -> bool {
    let mut chunk = Vec::new();
    loop {
        chunk.clear();
        match reader
            .by_ref()
            .take(MAX_COMMAND_BYTES as u64)
            .read_until(b'\n', &mut chunk)
        {
            Ok(0) | Err(_) => return false,
            Ok(_) => {
                if chunk.last() == Some(&b'\n') {
                    return true;
                }
            }
        }
    }
}

fn process_command(
    client: ClientId,
    line: &str,
    slot: &Arc<Mutex<ClientSlot>>,
    core: &ReplyCore,
    stream: &TcpStream,
) {
    if line.trim().is_empty() {
        return;
    }

    match parse_request(line) {
        Ok(Request::NewGraph { vertex_count }) => {
            with_slot(client, slot, |state| {
                state.graph = Graph::new(vertex_count);
            });
            info!(client, vertices = vertex_count, "graph reset");
        }
        Ok(Request::AddEdge {
            source,
            target,
            weight,
        }) => {
            with_slot(client, slot, |state| {
                state.graph.add_edge(source, target, weight);
            });
            info!(client, source, target, weight, "edge added");
        }
        Ok(Request::RemoveEdge { source, target }) => {
            with_slot(client, slot, |state| {
                state.graph.remove_edge(source, target);
            });
            info!(client, source, target, "edges removed");
        }
        Ok(Request::SolveMst { algorithm }) => solve_and_ship(client, algorithm, slot, core, stream),
        Err(ParseError::UnsupportedAlgorithm { name }) => {
            warn!(client, algorithm = %name, "unsupported MST algorithm requested");
            reply::send_unsupported_algorithm(stream);
        }
        Err(err) => {
            warn!(client, error = %err, "ignoring malformed command");
        }
    }
}

fn solve_and_ship(
    client: ClientId,
    algorithm: Algorithm,
    slot: &Arc<Mutex<ClientSlot>>,
    core: &ReplyCore,
    stream: &TcpStream,
) {
    let Ok(mut state) = slot.lock() else {
        warn!(client, "client slot poisoned; no reply");
        return;
    };
    let result = match solve(algorithm, &state.graph) {
        Ok(result) => Arc::new(result),
        Err(err) => {
            warn!(
                client,
                code = err.code().as_str(),
                error = %err,
                "MST solve failed; no reply"
            );
            return;
        }
    };
    state.last_result = Some(Arc::clone(&result));
    drop(state);

    let reply_stream = match stream.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            warn!(client, error = %err, "failed to clone socket for reply; no reply");
            return;
        }
    };
    core.submit_solve(result, algorithm, reply_stream);
    info!(client, %algorithm, "solve shipped to reply core");
}

fn with_slot(
    client: ClientId,
    slot: &Arc<Mutex<ClientSlot>>,
    mutate: impl FnOnce(&mut ClientSlot),
) {
    match slot.lock() {
        Ok(mut state) => mutate(&mut state),
        Err(_) => warn!(client, "client slot poisoned; command dropped"),
    }
}
