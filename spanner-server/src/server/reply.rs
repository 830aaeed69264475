//! Reply rendering and the bridge onto the concurrency cores.
//!
//! Solving happens on the connection handler's thread; everything from
//! formatting to the socket write is delegated to whichever core the server
//! was started with. The leader–followers pool receives one self-contained
//! closure per reply. The pipeline receives a [`ReplyTask`] envelope that
//! accumulates its message stage by stage and is released by the final,
//! sending stage.

use std::{fmt::Write as _, net::TcpStream, sync::Arc};

use spanner_core::{
    Algorithm, MstResult,
    exec::{LeaderFollowersPool, Pipeline, StageFn},
    write_frame,
};
use tracing::{error, warn};

/// Framed body sent when `SolveMST` names an algorithm we do not provide.
const UNSUPPORTED_ALGORITHM_BODY: &str = "Error: Unsupported MST algorithm\n";

/// The envelope routed through the pipeline.
///
/// Owned by exactly one stage at a time; the final stage writes the framed
/// reply and drops it.
pub(crate) struct ReplyTask {
    result: Arc<MstResult>,
    message: String,
    stream: TcpStream,
}

/// The concurrency core delivering `SolveMST` replies.
pub(crate) enum ReplyCore {
    /// Single-step formatting and send on the worker pool.
    LeaderFollowers(LeaderFollowersPool),
    /// Five-stage formatting ending in the send.
    Pipeline(Pipeline<ReplyTask>),
}

impl ReplyCore {
    /// Ships one solved result towards `stream`.
    ///
    /// Never blocks on the socket; failures inside the core are logged by
    /// the worker that hits them.
    pub(crate) fn submit_solve(
        &self,
        result: Arc<MstResult>,
        algorithm: Algorithm,
        stream: TcpStream,
    ) {
        let outcome = match self {
            Self::LeaderFollowers(pool) => pool.submit(move || {
                let body = leader_followers_body(&result);
                send_framed(&stream, &body);
            }),
            Self::Pipeline(pipeline) => pipeline.submit(ReplyTask {
                result,
                message: format!("MST created using {algorithm} algorithm.\n"),
                stream,
            }),
        };
        if let Err(err) = outcome {
            error!(error = %err, "reply core rejected a solve reply");
        }
    }

    /// Flushes outstanding replies and joins the core's workers.
    pub(crate) fn shutdown(self) {
        match self {
            Self::LeaderFollowers(pool) => pool.shutdown(),
            Self::Pipeline(pipeline) => pipeline.shutdown(),
        }
    }
}

/// The short reply body used in leader–followers mode.
fn leader_followers_body(result: &MstResult) -> String {
    let mut body = String::from("MST result:\n");
    push_edge_lines(&mut body, result);
    body
}

/// The five pipeline stages, in traversal order.
pub(crate) fn pipeline_stages() -> Vec<StageFn<ReplyTask>> {
    vec![
        Box::new(|task: &mut ReplyTask| {
            let _ = writeln!(
                task.message,
                "Total weight of MST: {}",
                task.result.total_weight()
            );
        }) as StageFn<ReplyTask>,
        Box::new(|task: &mut ReplyTask| {
            let _ = writeln!(
                task.message,
                "Longest path in MST: {}",
                task.result.longest_distance()
            );
        }),
        Box::new(|task: &mut ReplyTask| {
            let _ = writeln!(
                task.message,
                "Average distance in MST: {:.6}",
                task.result.average_distance()
            );
        }),
        Box::new(|task: &mut ReplyTask| {
            task.message.push_str("Shortest paths in MST:\n");
            for (&from, row) in task.result.shortest_distances() {
                for (&to, &distance) in row {
                    let _ = writeln!(task.message, "From {from} to {to}: {distance}");
                }
            }
        }),
        Box::new(|task: &mut ReplyTask| {
            let mut body = String::new();
            push_edge_lines(&mut body, &task.result);
            body.push_str("\nFinal pipeline data:\n");
            body.push_str(&task.message);
            send_framed(&task.stream, &body);
        }),
    ]
}

fn push_edge_lines(body: &mut String, result: &MstResult) {
    for edge in result.edges() {
        let _ = writeln!(
            body,
            "Edge from {} to {} with weight {}",
            edge.source(),
            edge.target(),
            edge.weight()
        );
    }
}

/// Sends the unsupported-algorithm error reply directly, outside any core.
pub(crate) fn send_unsupported_algorithm(stream: &TcpStream) {
    send_framed(stream, UNSUPPORTED_ALGORITHM_BODY);
}

fn send_framed(stream: &TcpStream, body: &str) {
    let mut writer = stream;
    if let Err(err) = write_frame(&mut writer, body.as_bytes()) {
        warn!(error = %err, "failed to deliver reply; client likely disconnected");
    }
}
