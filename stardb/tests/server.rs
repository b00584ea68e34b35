use stardb::protocol::{ERR_RESPONSE, OK_RESPONSE};
use stardb::reactor::Event;
use stardb::server::{LoopState, LoopStats};
use stardb::{Config, Error, Server};

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(20);

fn local_config() -> Config {
    Config::builder()
        .listen_addr("127.0.0.1:0")
        .poll_timeout(Duration::from_millis(50))
        .without_log()
        .build()
}

/// Turns the loop until `done` holds, failing after a couple of seconds.
fn drive(server: &mut Server, done: impl Fn(&Server) -> bool) {
    for _ in 0..100 {
        if done(server) {
            return;
        }
        server.turn(TICK).expect("turn failed");
    }
    panic!("condition not reached; stats = {:?}", server.stats());
}

fn connect(server: &mut Server) -> TcpStream {
    let before = server.registry().len();
    let client =
        TcpStream::connect(server.local_addr().expect("no local addr")).expect("Failed to connect");
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("Failed to set timeout");

    drive(server, |s| s.registry().len() == before + 1);
    client
}

fn exchange(server: &mut Server, client: &mut TcpStream, request: &[u8], expected: &[u8]) {
    let dispatched = server.stats().dispatched;
    client.write_all(request).expect("Failed to write");
    drive(server, |s| s.stats().dispatched > dispatched);

    let mut response = vec![0u8; expected.len()];
    client.read_exact(&mut response).expect("Failed to read");
    assert_eq!(
        String::from_utf8_lossy(&response),
        String::from_utf8_lossy(expected)
    );
}

#[test]
fn crlf_request_is_acknowledged() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    exchange(&mut server, &mut client, b"PING\r\n", OK_RESPONSE);
}

#[test]
fn bare_lf_request_is_rejected() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    exchange(&mut server, &mut client, b"PING\n", ERR_RESPONSE);
}

#[test]
fn two_lines_in_one_write_get_two_acknowledgments() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    exchange(&mut server, &mut client, b"A\r\nB\r\n", b"+OK\r\n+OK\r\n");
}

#[test]
fn mixed_lines_are_answered_in_order() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    let expected = [OK_RESPONSE, ERR_RESPONSE, OK_RESPONSE].concat();
    exchange(&mut server, &mut client, b"A\r\nB\nC\r\n", &expected);
}

#[test]
fn line_split_across_writes_is_reassembled() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    let dispatched = server.stats().dispatched;
    client.write_all(b"PI").expect("Failed to write");
    drive(&mut server, |s| s.stats().dispatched > dispatched);

    let fd = server.registry().fds()[0];
    let connection = server.registry().get(fd).expect("connection missing");
    assert_eq!(connection.pending_input(), 2);

    exchange(&mut server, &mut client, b"NG\r\n", OK_RESPONSE);
    // A stray response from the first half would show up here instead.
    exchange(&mut server, &mut client, b"PING\r\n", OK_RESPONSE);
}

#[test]
fn oversized_line_is_rejected_once_and_the_stream_recovers() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .read_buffer_size(16)
        .without_log()
        .build();
    let mut server = Server::bind(config).expect("Failed to bind");
    let mut client = connect(&mut server);

    let mut request = vec![b'a'; 40];
    request.extend_from_slice(b"\r\nPING\r\n");
    client.write_all(&request).expect("Failed to write");

    // The socket may hand the request over in any number of reads.
    let expected = [ERR_RESPONSE, OK_RESPONSE].concat();
    client
        .set_read_timeout(Some(TICK))
        .expect("Failed to set timeout");

    let mut response = Vec::new();
    let mut chunk = [0u8; 128];
    for _ in 0..100 {
        if response.len() >= expected.len() {
            break;
        }
        server.turn(TICK).expect("turn failed");
        if let Ok(n) = client.read(&mut chunk) {
            response.extend_from_slice(&chunk[..n]);
        }
    }
    assert_eq!(
        String::from_utf8_lossy(&response),
        String::from_utf8_lossy(&expected)
    );

    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("Failed to set timeout");
    // A stray rejection for the tail of the long line would show up here.
    exchange(&mut server, &mut client, b"PING\r\n", OK_RESPONSE);
}

#[test]
fn half_closed_peer_still_receives_its_acknowledgment() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut client = connect(&mut server);

    client.write_all(b"PING\r\n").expect("Failed to write");
    client
        .shutdown(Shutdown::Write)
        .expect("Failed to shut down");

    drive(&mut server, |s| s.stats().closed == 1);
    assert!(server.registry().is_empty());

    let mut response = Vec::new();
    client
        .read_to_end(&mut response)
        .expect("Failed to read");
    assert_eq!(response, OK_RESPONSE);
}

#[test]
fn empty_batch_dispatches_nothing() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");

    let n = server.turn(TICK).expect("turn failed");

    assert_eq!(n, 0);
    assert_eq!(server.stats(), LoopStats::default());
    assert_eq!(server.state(), LoopState::AwaitingEvents);
    assert!(server.registry().is_empty());
}

#[test]
fn event_for_unknown_descriptor_is_discarded() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");

    server.dispatch(&[Event {
        fd: 10_000,
        readable: true,
        writable: true,
    }]);

    assert_eq!(server.stats().discarded, 1);
    assert_eq!(server.stats().dispatched, 0);

    let mut client = connect(&mut server);
    exchange(&mut server, &mut client, b"PING\r\n", OK_RESPONSE);
}

#[test]
fn disconnect_removes_the_registry_entry() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let mut first = connect(&mut server);
    let _second = connect(&mut server);
    assert_eq!(server.registry().len(), 2);

    exchange(&mut server, &mut first, b"PING\r\n", OK_RESPONSE);
    drop(first);

    drive(&mut server, |s| s.registry().len() == 1);
    assert_eq!(server.stats().closed, 1);
    assert_eq!(server.stats().accepted, 2);
}

#[test]
fn binding_a_taken_port_is_fatal() {
    let server = Server::bind(local_config()).expect("Failed to bind");
    let addr = server.local_addr().expect("no local addr");

    let config = Config::builder()
        .listen_addr(addr.to_string())
        .without_log()
        .build();

    match Server::bind(config) {
        Err(e @ Error::Setup { .. }) => assert!(e.is_fatal()),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("second bind succeeded"),
    }
}

#[test]
fn run_serves_clients_until_shutdown() {
    let mut server = Server::bind(local_config()).expect("Failed to bind");
    let addr = server.local_addr().expect("no local addr");
    let shutdown = server.shutdown_handle();

    let handle = thread::spawn(move || server.run());

    let mut client = TcpStream::connect(addr).expect("Failed to connect");
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("Failed to set timeout");

    for _ in 0..3 {
        client.write_all(b"PING\r\n").expect("Failed to write");
        let mut response = [0u8; 5];
        client.read_exact(&mut response).expect("Failed to read");
        assert_eq!(&response, b"+OK\r\n");
    }

    shutdown.store(true, std::sync::atomic::Ordering::Release);
    handle
        .join()
        .expect("Thread panicked")
        .expect("run returned an error");
}
