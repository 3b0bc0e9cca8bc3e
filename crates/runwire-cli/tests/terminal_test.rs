//! Terminal driver end to end against a local socket server.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use runwire_app::{Runtime, RuntimeConfig};
use runwire_cli::{CliError, TerminalDriver, TerminalSink, page_location};
use runwire_client::{RunSession, transport::TransportConfig};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

/// Writer whose contents stay readable after the sink is moved away.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Backend that answers one run and reports every request it saw.
async fn spawn_backend(replies: Vec<&'static str>) -> (String, tokio::sync::oneshot::Receiver<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let mut requests = Vec::new();

        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
            let text = msg.to_text().unwrap().to_string();
            let is_run = text.contains(r#""type":"run""#);
            requests.push(text);
            if is_run {
                for reply in &replies {
                    ws.send(Message::text(reply.to_string())).await.unwrap();
                }
            }
        }
        let _ = tx.send(requests);
    });

    (format!("http://{addr}/"), rx)
}

async fn run_client(page_url: &str, source: &str) -> (Result<(), CliError>, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();

    let session = RunSession::for_page(&page_location(page_url).unwrap()).unwrap();
    let sink = TerminalSink::new(out.clone(), err.clone());
    let driver = TerminalDriver::with_sink(source.to_string(), TransportConfig::default(), sink);
    let closed = driver.closed();

    let config = RuntimeConfig {
        exit_after_run: true,
        exit_on_close: true,
        drain_grace: Duration::from_millis(100),
    };
    let result = tokio::time::timeout(WAIT, Runtime::new(driver, session, config).run())
        .await
        .expect("runtime finished in time");
    tokio::time::timeout(WAIT, closed).await.unwrap();

    (result, out, err)
}

#[tokio::test]
async fn submits_once_and_streams_output() {
    let (page, requests) = spawn_backend(vec![
        r#"{"type":"started","msg":""}"#,
        r#"{"type":"stdout","msg":"hi"}"#,
        r#"{"type":"stderr","msg":"warn"}"#,
        r#"{"type":"stdout","msg":"Program ran successful"}"#,
        r#"{"type":"stopped","msg":""}"#,
    ])
    .await;

    let (result, out, err) = run_client(&page, "print(\"hi\")").await;
    result.unwrap();

    insta::assert_snapshot!(out.contents(), @r"
    hi
    Program ran successful
    ");
    assert_eq!(err.contents(), "warn\n");

    let requests = tokio::time::timeout(WAIT, requests).await.unwrap().unwrap();
    assert_eq!(
        requests,
        vec![
            r#"{"type":"run","msg":"print(\"hi\")"}"#.to_string(),
            r#"{"type":"close","msg":""}"#.to_string(),
        ]
    );
}

#[tokio::test]
async fn backend_error_ends_the_run() {
    let (page, _requests) = spawn_backend(vec![r#"{"type":"error","msg":"file creation failed"}"#]).await;

    let (result, out, err) = run_client(&page, "x").await;
    result.unwrap();

    assert_eq!(out.contents(), "");
    assert_eq!(err.contents(), "file creation failed\n");
}

#[tokio::test]
async fn unreachable_backend_exits_cleanly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (result, out, _err) = run_client(&format!("http://{addr}/"), "x").await;
    result.unwrap();
    assert_eq!(out.contents(), "");
}

#[tokio::test]
async fn output_after_stopped_is_still_shown() {
    let (page, requests) = spawn_backend(vec![
        r#"{"type":"started","msg":""}"#,
        r#"{"type":"stderr","msg":"Program was killed due to timeout"}"#,
        r#"{"type":"stopped","msg":""}"#,
        r#"{"type":"stdout","msg":"late"}"#,
    ])
    .await;

    let (result, out, err) = run_client(&page, "loop").await;
    result.unwrap();

    assert_eq!(out.contents(), "late\n");
    assert_eq!(err.contents(), "Program was killed due to timeout\n");

    let requests = tokio::time::timeout(WAIT, requests).await.unwrap().unwrap();
    assert_eq!(requests.last().map(String::as_str), Some(r#"{"type":"close","msg":""}"#));
}
