use stardb::protocol::RequestLog;
use stardb::{Config, Server};

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn temp_log(name: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock drift")
        .as_nanos();

    std::env::temp_dir().join(format!(
        "stardb-{}-{}-{}.log",
        name,
        std::process::id(),
        unique
    ))
}

#[test]
fn processed_reads_are_appended_to_the_log() {
    let path = temp_log("server");
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .log_path(&path)
        .build();

    let mut server = Server::bind(config).expect("Failed to bind");
    let mut client = TcpStream::connect(server.local_addr().unwrap()).expect("Failed to connect");
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("Failed to set timeout");
    let peer = client.local_addr().unwrap();

    client.write_all(b"PING\r\nPONG\n").expect("Failed to write");
    for _ in 0..100 {
        if server.stats().dispatched > 0 {
            break;
        }
        server.turn(Duration::from_millis(20)).expect("turn failed");
    }

    let mut response = [0u8; 5];
    client.read_exact(&mut response).expect("Failed to read");
    assert_eq!(&response, b"+OK\r\n");
    drop(server);

    let contents = std::fs::read_to_string(&path).expect("log missing");
    let expected = format!(
        "Reading 11 bytes for the connection: {peer}\n\
         PING\r\n\
         PONG\n\
         Completed reading 11 bytes for the connection: {peer}\n"
    );
    assert_eq!(contents, expected);

    let _ = std::fs::remove_file(path);
}

#[test]
fn log_appends_across_reopen() {
    let path = temp_log("append");
    let peer = "10.0.0.1:4000".parse().unwrap();

    let mut log = RequestLog::open(&path);
    assert!(log.is_enabled());
    log.begin(3, peer);
    log.line(b"A\r\n");
    log.complete(3, peer);
    drop(log);

    let mut log = RequestLog::open(&path);
    log.begin(2, peer);
    log.line(b"BB");
    log.complete(2, peer);
    drop(log);

    let contents = std::fs::read_to_string(&path).expect("log missing");
    assert_eq!(
        contents,
        "Reading 3 bytes for the connection: 10.0.0.1:4000\n\
         A\r\n\
         Completed reading 3 bytes for the connection: 10.0.0.1:4000\n\
         Reading 2 bytes for the connection: 10.0.0.1:4000\n\
         BB\n\
         Completed reading 2 bytes for the connection: 10.0.0.1:4000\n"
    );

    let _ = std::fs::remove_file(path);
}

#[test]
fn unopenable_log_is_disabled_not_fatal() {
    let path = temp_log("missing-dir").join("nested").join("requests.log");

    let mut log = RequestLog::open(&path);
    assert!(!log.is_enabled());
    log.line(b"ignored\r\n");

    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .log_path(&path)
        .build();
    assert!(Server::bind(config).is_ok());
}
