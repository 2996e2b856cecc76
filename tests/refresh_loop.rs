use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hisstock_board::config::Config;
use hisstock_board::fetch::HisStockClient;
use hisstock_board::render::{CsvSnapshotSink, FanoutSink, MemorySink};
use hisstock_board::scheduler::{CycleReport, RefreshLoop, Timer};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PAYLOAD: &str = r#"{
    "stockitem": [
        {"stockid": "2330", "stocknm": "TSMC", "datalist": [
            {"date": "2015-06-04", "open": 139, "high": 141, "low": 138, "close": 140, "volume": 1000},
            {"date": "2015-06-05", "open": 140, "high": 142, "low": 139, "close": 141, "volume": 12345678}
        ]},
        {"stockid": "2317", "stocknm": "HonHai", "datalist": []}
    ],
    "credititem": [
        {"stockid": "2330", "stocknm": "TSMC", "datalist": [
            {"date": "2015-06-05", "financeused": 12.344, "bearishused": 5.666}
        ]}
    ]
}"#;

#[derive(Clone, Default)]
struct InstantTimer {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl Timer for InstantTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.waits.lock().unwrap().push(duration);
        std::future::ready(())
    }
}

/// Serve one canned `(status, body)` response per connection and record each request line.
async fn spawn_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&buf).to_string();
            seen.lock()
                .unwrap()
                .push(request.lines().next().unwrap_or_default().to_string());

            let reason = StatusCode::from_u16(status)
                .unwrap()
                .canonical_reason()
                .unwrap_or("");
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    (
        format!("http://{addr}/handler/api/hisstock_list/"),
        requests,
    )
}

fn client_for(endpoint: String) -> HisStockClient {
    client_with_timeout(endpoint, Duration::from_secs(5))
}

fn client_with_timeout(endpoint: String, timeout: Duration) -> HisStockClient {
    let mut config = Config::builtin();
    config.fetch.endpoint = endpoint;
    config.fetch.timeout = timeout;
    HisStockClient::new(&config.fetch).expect("client builds")
}

/// Accept connections and never answer them.
async fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{addr}/handler/api/hisstock_list/")
}

/// Endpoint on a port nothing listens on.
async fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/handler/api/hisstock_list/")
}

fn assert_statusless_failure(report: &CycleReport) -> String {
    match report {
        CycleReport::FetchFailed { status: None, error } => error.clone(),
        other => panic!("expected a fetch failure without status, got {other:?}"),
    }
}

#[tokio::test]
async fn fetches_merges_and_renders_latest_rows() {
    let (endpoint, requests) = spawn_server(vec![(200, PAYLOAD)]).await;
    let sink = MemorySink::new();
    let mut refresh = RefreshLoop::with_timer(
        client_for(endpoint),
        sink.clone(),
        InstantTimer::default(),
        Duration::from_secs(600),
    );

    let report = refresh.run_cycle().await;
    assert_eq!(
        report,
        CycleReport::Rendered {
            rows: 1,
            skipped_stock: 1,
            skipped_credit: 0,
            unmatched_credit: 0,
        }
    );

    let rows = sink.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, "20150605");
    assert_eq!(rows[0].stockidnm, "2330-TSMC");
    assert_eq!(rows[0].close, 141.0);
    assert_eq!(rows[0].volume, 12345678);
    assert_eq!(rows[0].financeused, 12.34);
    assert_eq!(rows[0].bearishused, 5.67);

    let request_line = requests.lock().unwrap()[0].clone();
    assert!(
        request_line.starts_with(
            "GET /handler/api/hisstock_list/?opt=twse&starttime=2015%2F05%2F01&endtime=2015%2F06%2F05&stockids=&traderids=&algorithm=StockProfile0%2B "
        ),
        "{request_line}"
    );
}

#[tokio::test]
async fn server_error_is_reported_and_next_cycle_recovers() {
    let (endpoint, _) = spawn_server(vec![(500, "database offline"), (200, PAYLOAD)]).await;
    let sink = MemorySink::new();
    let timer = InstantTimer::default();
    let interval = Duration::from_secs(600);
    let mut refresh =
        RefreshLoop::with_timer(client_for(endpoint), sink.clone(), timer.clone(), interval);

    let reports = refresh.run_cycles(2).await;

    match &reports[0] {
        CycleReport::FetchFailed { status, error } => {
            assert_eq!(*status, Some(StatusCode::INTERNAL_SERVER_ERROR));
            assert!(error.contains("database offline"), "{error}");
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert!(reports[1].is_rendered());
    assert_eq!(sink.render_count(), 1);
    assert_eq!(*timer.waits.lock().unwrap(), vec![interval]);
}

#[tokio::test]
async fn malformed_body_counts_as_fetch_failure() {
    let (endpoint, _) = spawn_server(vec![(200, "<html>login</html>")]).await;
    let sink = MemorySink::new();
    let mut refresh = RefreshLoop::with_timer(
        client_for(endpoint),
        sink.clone(),
        InstantTimer::default(),
        Duration::from_secs(1),
    );

    let report = refresh.run_cycle().await;
    assert!(
        matches!(report, CycleReport::FetchFailed { status: None, .. }),
        "{report:?}"
    );
    assert_eq!(sink.render_count(), 0);
}

#[tokio::test]
async fn fanout_writes_csv_snapshot_per_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let (endpoint, _) = spawn_server(vec![(200, PAYLOAD)]).await;
    let memory = MemorySink::new();
    let sinks = FanoutSink::new()
        .with(memory.clone())
        .with(CsvSnapshotSink::new(dir.path()).unwrap());
    let mut refresh = RefreshLoop::with_timer(
        client_for(endpoint),
        sinks,
        InstantTimer::default(),
        Duration::from_secs(1),
    );

    assert!(refresh.run_cycle().await.is_rendered());

    let written: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(written.len(), 1);
    let contents = std::fs::read_to_string(&written[0]).unwrap();
    assert!(contents.starts_with("date,stockidnm,"), "{contents}");
    assert!(contents.contains("2330-TSMC"), "{contents}");
    assert_eq!(memory.rows().len(), 1);
}

#[tokio::test]
async fn unanswered_request_times_out_and_loop_continues() {
    let endpoint = spawn_silent_server().await;
    let sink = MemorySink::new();
    let timer = InstantTimer::default();
    let interval = Duration::from_secs(600);
    let mut refresh = RefreshLoop::with_timer(
        client_with_timeout(endpoint, Duration::from_secs(1)),
        sink.clone(),
        timer.clone(),
        interval,
    );

    let started = std::time::Instant::now();
    let reports = refresh.run_cycles(2).await;
    assert!(started.elapsed() < Duration::from_secs(10));

    for report in &reports {
        let error = assert_statusless_failure(report);
        assert!(error.contains("timed out"), "{error}");
    }
    assert_eq!(*timer.waits.lock().unwrap(), vec![interval]);
    assert_eq!(sink.render_count(), 0);
    assert_eq!(refresh.cycles(), 2);
}

#[tokio::test]
async fn refused_connection_is_reported_and_loop_continues() {
    let endpoint = closed_endpoint().await;
    let sink = MemorySink::new();
    let timer = InstantTimer::default();
    let interval = Duration::from_secs(600);
    let mut refresh =
        RefreshLoop::with_timer(client_for(endpoint), sink.clone(), timer.clone(), interval);

    let reports = refresh.run_cycles(2).await;

    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_statusless_failure(report);
    }
    assert_eq!(*timer.waits.lock().unwrap(), vec![interval]);
    assert_eq!(sink.render_count(), 0);
}
