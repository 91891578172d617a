use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use tempfile::tempdir;
use violations_scraper::config::{Config, SourceConfig};
use violations_scraper::fetch::{FetchError, HttpFetcher, PageSource};
use violations_scraper::{Pipeline, RunOutcome};

/// Serve exactly one canned HTTP response; the handle yields the request head.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/violacoes", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut head = Vec::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                break;
            }
            head.push(line.trim_end().to_string());
        }

        let response = format!(
            "{}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        head
    });

    (url, handle)
}

fn source(url: &str) -> SourceConfig {
    SourceConfig {
        url: url.to_string(),
        user_agent: "Mozilla/5.0 (test)".to_string(),
        timeout_secs: Some(10),
        use_system_proxy: false,
    }
}

#[test]
fn test_successful_get_returns_body_and_sends_user_agent() -> Result<()> {
    let (url, server) = serve_once("HTTP/1.1 200 OK", "<table><tr><th>Data</th></tr></table>");

    let body = HttpFetcher::new(&source(&url)).fetch_page()?;
    let head = server.join().unwrap();

    assert_eq!(body, "<table><tr><th>Data</th></tr></table>");
    assert!(head[0].starts_with("GET /violacoes"));
    assert!(head
        .iter()
        .any(|h| h.eq_ignore_ascii_case("user-agent: Mozilla/5.0 (test)")));
    Ok(())
}

#[test]
fn test_non_success_status_is_a_fetch_error() -> Result<()> {
    let (url, server) = serve_once("HTTP/1.1 404 Not Found", "gone");

    let err = HttpFetcher::new(&source(&url)).fetch_page().unwrap_err();
    server.join().unwrap();

    match err {
        FetchError::Status { url: failed, status } => {
            assert_eq!(failed, url);
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn test_unreachable_host_is_a_fetch_error() {
    // Bind then drop to get a port with nothing listening.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{}/violacoes", port);

    let err = HttpFetcher::new(&source(&url)).fetch_page().unwrap_err();
    assert!(matches!(err, FetchError::Request { .. }));
}

#[test]
fn test_server_error_leaves_no_output() -> Result<()> {
    let (url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "oops");
    let temp = tempdir()?;
    let out = temp.path().join("out");

    let mut config = Config::default();
    config.source = source(&url);
    config.output.dir = out.clone();
    config.logging.log_dir = None;

    let outcome = Pipeline::run(&HttpFetcher::new(&config.source), &config)?;
    server.join().unwrap();

    match outcome {
        RunOutcome::NoData(err) => assert!(err.to_string().contains("500")),
        RunOutcome::Completed(_) => panic!("expected no data"),
    }
    assert!(!out.exists());
    Ok(())
}
