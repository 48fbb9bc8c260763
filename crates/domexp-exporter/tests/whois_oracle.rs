#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use domexp_core::ErrorKind;
use domexp_exporter::oracle::{ExpirationOracle, WhoisOracle};

/// Answer every connection with `answer`; returns a counter of queries served.
fn serve_whois(listener: TcpListener, answer: String) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let answer = Arc::new(answer);
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else { return };
            counter.fetch_add(1, Ordering::SeqCst);
            let answer = Arc::clone(&answer);
            tokio::spawn(async move {
                let mut buf = [0u8; 512];
                let n = sock.read(&mut buf).await.unwrap_or(0);
                assert!(buf[..n].ends_with(b"\r\n"));
                let _ = sock.write_all(answer.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    hits
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

async fn spawn_whois(answer: &str) -> String {
    let (listener, addr) = bind().await;
    serve_whois(listener, answer.to_string());
    addr
}

fn dead_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn date(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

#[tokio::test]
async fn reads_expiry_from_answer() {
    let server = spawn_whois(
        "Domain Name: EXAMPLE.COM\r\nRegistry Expiry Date: 2030-08-13T04:00:00Z\r\n",
    )
    .await;
    let oracle = WhoisOracle::new().with_server(server);

    let got = oracle.expiration_date("example.com").await.unwrap();
    assert_eq!(got, Some(Utc.with_ymd_and_hms(2030, 8, 13, 4, 0, 0).unwrap()));
}

#[tokio::test]
async fn answer_without_expiry_is_none() {
    let server = spawn_whois("Domain Name: EXAMPLE.DE\r\nStatus: connect\r\n").await;
    let oracle = WhoisOracle::new().with_server(server);
    assert_eq!(oracle.expiration_date("example.de").await.unwrap(), None);
}

#[tokio::test]
async fn not_found_is_parse_error() {
    let server = spawn_whois("No match for \"NOPE.COM\".\r\n").await;
    let oracle = WhoisOracle::new().with_server(server);
    let err = oracle.expiration_date("nope.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleParse);
    assert!(err.to_string().contains("nope.com"));
}

#[tokio::test]
async fn unreachable_server_is_parse_error() {
    let oracle = WhoisOracle::new()
        .with_server(dead_addr())
        .with_timeout(Duration::from_secs(1));
    let err = oracle.expiration_date("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleParse);
}

#[tokio::test]
async fn invalid_domain_is_rejected_before_querying() {
    let oracle = WhoisOracle::new().with_server("127.0.0.1:1");
    let err = oracle.expiration_date("not a domain").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleParse);
}

#[tokio::test]
async fn follows_registry_referral() {
    let registrar = spawn_whois(
        "Domain Name: example.com\r\nRegistrar Registration Expiration Date: 2031-01-01T00:00:00Z\r\n",
    )
    .await;
    let registry = spawn_whois(&format!(
        "% IANA WHOIS server\r\ndomain:       COM\r\nrefer:        {registrar}\r\n"
    ))
    .await;

    let oracle = WhoisOracle::new().with_server(registry);
    assert_eq!(oracle.expiration_date("example.com").await.unwrap(), date(2031, 1, 1));
}

#[tokio::test]
async fn failed_referral_uses_registry_answer() {
    let registry = spawn_whois(&format!(
        "Domain Name: EXAMPLE.COM\r\nRegistrar WHOIS Server: {}\r\nRegistry Expiry Date: 2030-05-05T00:00:00Z\r\n",
        dead_addr()
    ))
    .await;

    let oracle = WhoisOracle::new()
        .with_server(registry)
        .with_timeout(Duration::from_secs(1));
    assert_eq!(oracle.expiration_date("example.com").await.unwrap(), date(2030, 5, 5));
}

#[tokio::test]
async fn circular_referrals_query_each_server_once() {
    let (a_listener, a) = bind().await;
    let (b_listener, b) = bind().await;
    let a_hits = serve_whois(
        a_listener,
        format!("refer: {b}\r\nRegistry Expiry Date: 2030-01-01T00:00:00Z\r\n"),
    );
    let b_hits = serve_whois(
        b_listener,
        format!("Registrar WHOIS Server: {a}\r\nRegistry Expiry Date: 2032-02-02T00:00:00Z\r\n"),
    );

    let oracle = WhoisOracle::new().with_server(a);
    // The most specific answer comes first.
    assert_eq!(oracle.expiration_date("example.com").await.unwrap(), date(2032, 2, 2));
    assert_eq!(a_hits.load(Ordering::SeqCst), 1);
    assert_eq!(b_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn referral_chain_stops_after_three_queries() {
    let (d_listener, d) = bind().await;
    let d_hits = serve_whois(d_listener, "Registry Expiry Date: 2099-09-09T00:00:00Z\r\n".to_string());
    let c = spawn_whois(&format!(
        "Registry Expiry Date: 2033-03-03T00:00:00Z\r\nRegistrar WHOIS Server: {d}\r\n"
    ))
    .await;
    let b = spawn_whois(&format!("refer: {c}\r\n")).await;
    let a = spawn_whois(&format!("refer: {b}\r\n")).await;

    let oracle = WhoisOracle::new().with_server(a);
    assert_eq!(oracle.expiration_date("example.com").await.unwrap(), date(2033, 3, 3));
    assert_eq!(d_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_answer_is_parse_error() {
    let mut answer = "Registry Expiry Date: 2030-01-01T00:00:00Z\r\n".to_string();
    answer.push_str(&"%".repeat(1024 * 1024 + 1));
    let (listener, addr) = bind().await;
    serve_whois(listener, answer);

    let oracle = WhoisOracle::new().with_server(addr);
    let err = oracle.expiration_date("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OracleParse);
    assert!(err.to_string().contains("too large"));
}
