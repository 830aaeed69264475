//! End-to-end tests driving a real server over loopback TCP.

use std::{
    io::Write,
    net::TcpStream,
    num::NonZeroUsize,
    thread::{self, JoinHandle},
    time::Duration,
};

use spanner_core::read_frame;
use spanner_server::server::{ConcurrencyMode, Server, ServerConfig, ServerError, ShutdownHandle};

struct TestServer {
    addr: std::net::SocketAddr,
    handle: ShutdownHandle,
    thread: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    fn start(mode: ConcurrencyMode) -> Self {
        let config = ServerConfig::new(0)
            .with_mode(mode)
            .with_workers(NonZeroUsize::new(4).expect("4 is non-zero"));
        let server = Server::bind(&config).expect("ephemeral bind must succeed");
        let addr = server.local_addr();
        let handle = server.shutdown_handle();
        let thread = thread::spawn(move || server.run());
        Self {
            addr,
            handle,
            thread,
        }
    }

    fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr).expect("loopback connect must succeed");
        stream
            .set_read_timeout(Some(Duration::from_secs(30)))
            .expect("socket accepts a read timeout");
        TestClient { stream }
    }

    fn stop(self) {
        self.handle.shutdown();
        self.thread
            .join()
            .expect("server thread must not panic")
            .expect("server must stop cleanly");
    }
}

struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    fn send(&mut self, command: &str) {
        self.stream
            .write_all(command.as_bytes())
            .and_then(|()| self.stream.write_all(b"\n"))
            .expect("command write must succeed");
    }

    fn read_reply(&mut self) -> String {
        let body = read_frame(&mut self.stream).expect("reply must arrive framed");
        String::from_utf8(body).expect("reply body is UTF-8")
    }
}

/// Loads the seven-vertex example graph from the protocol walkthrough.
fn load_seven_vertex_graph(client: &mut TestClient) {
    client.send("NewGraph 7");
    for command in [
        "AddEdge 0 5 10",
        "AddEdge 5 4 25",
        "AddEdge 6 4 24",
        "AddEdge 1 6 14",
        "AddEdge 0 1 28",
        "AddEdge 4 3 22",
        "AddEdge 3 2 12",
        "AddEdge 2 1 16",
        "AddEdge 3 6 18",
    ] {
        client.send(command);
    }
}

/// Extracts the weights of the `Edge from .. with weight w` lines.
fn edge_weights(body: &str) -> Vec<i64> {
    let mut weights: Vec<i64> = body
        .lines()
        .filter_map(|line| {
            line.strip_prefix("Edge from ")?
                .rsplit_once("with weight ")?
                .1
                .trim()
                .parse()
                .ok()
        })
        .collect();
    weights.sort_unstable();
    weights
}

/// Extracts `(from, to, weight)` triples normalised to unordered endpoints.
fn edge_set(body: &str) -> Vec<(usize, usize, i64)> {
    let mut edges: Vec<(usize, usize, i64)> = body
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("Edge from ")?;
            let (from, rest) = rest.split_once(" to ")?;
            let (to, weight) = rest.split_once(" with weight ")?;
            let from: usize = from.trim().parse().ok()?;
            let to: usize = to.trim().parse().ok()?;
            let weight: i64 = weight.trim().parse().ok()?;
            Some((from.min(to), from.max(to), weight))
        })
        .collect();
    edges.sort_unstable();
    edges
}

#[test]
fn pipeline_solves_the_seven_vertex_example() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    load_seven_vertex_graph(&mut client);
    client.send("SolveMST Kruskal");
    let body = client.read_reply();

    assert_eq!(edge_weights(&body), vec![10, 12, 14, 16, 18, 22]);
    assert!(body.contains("\nFinal pipeline data:\n"));
    assert!(body.contains("MST created using Kruskal algorithm.\n"));
    assert!(body.contains("Total weight of MST: 92\n"));
    assert!(body.contains("Shortest paths in MST:\n"));

    drop(client);
    server.stop();
}

#[test]
fn prim_and_kruskal_return_the_same_tree() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    load_seven_vertex_graph(&mut client);
    client.send("SolveMST Kruskal");
    let kruskal = client.read_reply();
    client.send("SolveMST Prim");
    let prim = client.read_reply();

    assert_eq!(edge_set(&prim), edge_set(&kruskal));
    assert!(prim.contains("MST created using Prim algorithm.\n"));

    drop(client);
    server.stop();
}

#[test]
fn removing_an_edge_changes_the_tree() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    load_seven_vertex_graph(&mut client);
    client.send("SolveMST Kruskal");
    let before = client.read_reply();
    assert!(before.contains("Total weight of MST: 92\n"));

    client.send("RemoveEdge 3 6");
    client.send("SolveMST Kruskal");
    let after = client.read_reply();

    assert_eq!(edge_weights(&after), vec![10, 12, 14, 16, 22, 24]);
    assert!(after.contains("Total weight of MST: 98\n"));

    drop(client);
    server.stop();
}

#[test]
fn disconnected_graphs_yield_a_forest_with_unreachable_pairs_omitted() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    client.send("NewGraph 4");
    client.send("AddEdge 0 1 5");
    client.send("AddEdge 2 3 7");
    client.send("SolveMST Prim");
    let body = client.read_reply();

    assert_eq!(edge_weights(&body), vec![5, 7]);
    assert!(body.contains("Total weight of MST: 12\n"));
    // Within-component distances are listed; cross-component pairs are
    // unreachable and therefore absent.
    assert!(body.contains("From 0 to 1: 5\n"));
    assert!(body.contains("From 2 to 3: 7\n"));
    assert!(!body.contains("From 0 to 2:"));
    assert!(!body.contains("From 3 to 1:"));

    drop(client);
    server.stop();
}

#[test]
fn concurrent_clients_keep_isolated_graphs() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut first = server.connect();
    let mut second = server.connect();

    first.send("NewGraph 3");
    second.send("NewGraph 3");
    first.send("AddEdge 0 1 1");
    second.send("AddEdge 0 1 7");
    first.send("AddEdge 1 2 2");
    second.send("AddEdge 0 2 9");

    first.send("SolveMST Prim");
    second.send("SolveMST Prim");

    let first_body = first.read_reply();
    let second_body = second.read_reply();

    assert!(first_body.contains("Total weight of MST: 3\n"));
    assert!(second_body.contains("Total weight of MST: 16\n"));

    drop(first);
    drop(second);
    server.stop();
}

#[test]
fn a_thousand_pipeline_replies_are_identical() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    load_seven_vertex_graph(&mut client);
    client.send("SolveMST Kruskal");
    let reference = client.read_reply();

    for _ in 0..999 {
        client.send("SolveMST Kruskal");
    }
    for round in 0..999 {
        let body = client.read_reply();
        assert_eq!(body, reference, "reply {round} diverged");
    }

    drop(client);
    server.stop();
}

#[test]
fn leader_followers_mode_sends_the_short_body() {
    let server = TestServer::start(ConcurrencyMode::LeaderFollowers);
    let mut client = server.connect();

    load_seven_vertex_graph(&mut client);
    client.send("SolveMST Prim");
    let body = client.read_reply();

    assert!(body.starts_with("MST result:\n"));
    assert_eq!(edge_weights(&body), vec![10, 12, 14, 16, 18, 22]);
    assert!(!body.contains("Total weight of MST:"));

    drop(client);
    server.stop();
}

#[test]
fn unsupported_algorithms_get_a_framed_error() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    client.send("NewGraph 2");
    client.send("AddEdge 0 1 1");
    client.send("SolveMST Boruvka");
    let body = client.read_reply();

    assert_eq!(body, "Error: Unsupported MST algorithm\n");

    // The connection stays usable afterwards.
    client.send("SolveMST Prim");
    let body = client.read_reply();
    assert!(body.contains("Total weight of MST: 1\n"));

    drop(client);
    server.stop();
}

#[test]
fn unknown_commands_are_ignored_without_a_reply() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    client.send("NewGraph 2");
    client.send("Grow 17");
    client.send("AddEdge 0 1 four");
    client.send("AddEdge 0 1 4");
    client.send("SolveMST Kruskal");
    let body = client.read_reply();

    // The malformed AddEdge was dropped; only the valid one contributes.
    assert_eq!(edge_weights(&body), vec![4]);
    assert!(body.contains("Total weight of MST: 4\n"));

    drop(client);
    server.stop();
}

#[test]
fn oversized_commands_are_dropped_without_desyncing_the_stream() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    client.send("NewGraph 2");
    // Far past the 1024-byte command cap; must be discarded whole, not
    // split into garbage that shifts the following commands.
    client.send(&format!("AddEdge 0 1 {}", "9".repeat(4096)));
    client.send("AddEdge 0 1 6");
    client.send("SolveMST Kruskal");
    let body = client.read_reply();

    assert_eq!(edge_weights(&body), vec![6]);
    assert!(body.contains("Total weight of MST: 6\n"));

    drop(client);
    server.stop();
}

#[test]
fn an_empty_graph_still_replies() {
    let server = TestServer::start(ConcurrencyMode::Pipeline);
    let mut client = server.connect();

    client.send("NewGraph 3");
    client.send("SolveMST Kruskal");
    let body = client.read_reply();

    assert!(edge_weights(&body).is_empty());
    assert!(body.contains("Total weight of MST: 0\n"));

    drop(client);
    server.stop();
}

#[test]
fn solving_before_new_graph_replies_with_an_empty_tree() {
    let server = TestServer::start(ConcurrencyMode::LeaderFollowers);
    let mut client = server.connect();

    client.send("SolveMST Kruskal");
    let body = client.read_reply();

    assert_eq!(body, "MST result:\n");

    drop(client);
    server.stop();
}
