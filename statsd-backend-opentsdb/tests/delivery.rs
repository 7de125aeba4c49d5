use std::io::Read;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use statsd_backend_core::{Backend, Events, MetricsSnapshot};
use statsd_backend_opentsdb::{init, OpenTsdbBuilder, OpenTsdbConfig};

const STARTUP_TIME: u64 = 42;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn delivers_the_payload_and_records_success() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut conn, _) = listener.accept().expect("accept");
        let mut received = String::new();
        conn.read_to_string(&mut received).expect("read payload");
        tx.send(received).expect("send payload");
    });

    let mut backend = OpenTsdbBuilder::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .build(STARTUP_TIME)
        .expect("build backend");
    let health = backend.health();

    let mut snapshot = MetricsSnapshot::new();
    snapshot.record_counter("app.requests", 5i64);
    backend.flush(1000, &snapshot);

    let received = rx.recv_timeout(Duration::from_secs(5)).expect("payload should arrive");
    assert!(received.contains("put stats_counts.app.requests 1000 5  source=statsd\n"));
    assert!(received.contains("put statsd.numStats 1000 1 source=statsd\n"));
    assert!(received.ends_with('\n'));

    // The health trailer reports the timestamps from before this attempt,
    // which is still the startup time on the first flush.
    let last_exception = received
        .lines()
        .find(|line| line.contains("last_exception"))
        .expect("last_exception trailer line");
    assert!(last_exception.starts_with("put stats.statsd.opentsdbStats.last_exception "));
    assert!(last_exception.ends_with(" 42"));

    let last_flush = received
        .lines()
        .find(|line| line.contains("last_flush"))
        .expect("last_flush trailer line");
    assert!(last_flush.starts_with("put stats.statsd.opentsdbStats.last_flush "));
    assert!(last_flush.ends_with(" 42"));

    assert!(
        wait_until(|| health.last_flush() > STARTUP_TIME),
        "last_flush should advance after a successful delivery"
    );
    assert_eq!(health.last_exception(), STARTUP_TIME);
}

#[test]
fn connection_failure_records_the_exception_timestamp() {
    init_tracing();

    // Grab a port that is closed by binding and immediately dropping it.
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let mut backend = OpenTsdbBuilder::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .build(STARTUP_TIME)
        .expect("build backend");
    let health = backend.health();

    let mut snapshot = MetricsSnapshot::new();
    snapshot.record_counter("app.requests", 5i64);
    backend.flush(1000, &snapshot);

    assert!(
        wait_until(|| health.last_exception() > STARTUP_TIME),
        "last_exception should advance after a refused connection"
    );
    assert_eq!(health.last_flush(), STARTUP_TIME);
}

#[test]
fn missing_host_renders_but_never_connects() {
    let config = OpenTsdbConfig::default();
    let mut events = Events::new();
    assert!(init(STARTUP_TIME, &config, &mut events));

    let mut snapshot = MetricsSnapshot::new();
    snapshot.record_counter("app.requests", 5i64);
    events.flush(1000, &snapshot);
    thread::sleep(Duration::from_millis(50));

    // The status query reports both fields, still at startup time.
    let mut fields = Vec::new();
    events.status(&mut |backend, field, value| {
        fields.push((backend.to_string(), field.to_string(), value));
    });
    assert_eq!(
        fields,
        vec![
            ("opentsdb".to_string(), "last_flush".to_string(), STARTUP_TIME),
            ("opentsdb".to_string(), "last_exception".to_string(), STARTUP_TIME),
        ]
    );
}
