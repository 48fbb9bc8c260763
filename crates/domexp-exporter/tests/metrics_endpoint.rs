#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::to_bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use domexp_core::error::{ExpiryError, Result};
use domexp_core::Expiration;
use domexp_exporter::account::AccountClient;
use domexp_exporter::app_state::AppState;
use domexp_exporter::checker::{Checker, RetryPolicy};
use domexp_exporter::expiration::ExpirationLookup;
use domexp_exporter::ops;

struct StaticAccount(Vec<&'static str>);

#[async_trait]
impl AccountClient for StaticAccount {
    async fn list_domains(&self) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|d| d.to_string()).collect())
    }
    fn obfuscated_id(&self) -> &str {
        "static...acct01"
    }
    fn account_key(&self) -> &str {
        "static"
    }
}

/// `expired.com` is 3 days past, `soon.com` in 10 days, anything else unknown.
struct TableLookup;

#[async_trait]
impl ExpirationLookup for TableLookup {
    async fn days_till_expiration(&self, domain: &str) -> Result<Expiration> {
        let days = match domain {
            "expired.com" => -3,
            "soon.com" => 10,
            _ => return Err(ExpiryError::ExpirationUnavailable(domain.to_string())),
        };
        Ok(Expiration {
            days,
            expires_at: Utc::now() + chrono::Duration::days(days),
        })
    }
}

fn state() -> (AppState, Arc<Checker>) {
    let account: Arc<dyn AccountClient> =
        Arc::new(StaticAccount(vec!["soon.com", "expired.com", "mystery.org"]));
    let checker = Arc::new(
        Checker::new(vec![account], Arc::new(TableLookup)).with_retry_policy(
            RetryPolicy::new().with_initial_delay(std::time::Duration::from_millis(1)),
        ),
    );
    (AppState::new(Arc::clone(&checker)), checker)
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn scrape_reflects_latest_snapshot() {
    let (state, checker) = state();

    let before = body_string(ops::metrics(State(state.clone())).await).await;
    assert!(!before.contains("domain_expiration_checker_result{"));

    checker.run_cycle().await;

    let resp = ops::metrics(State(state)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let body = body_string(resp).await;

    assert!(body.contains("# TYPE domain_expiration_checker_result gauge"));
    assert!(body.contains(r#"domain_expiration_checker_result{domain="soon.com",status="ok"} 10"#));
    assert!(body.contains(r#"domain_expiration_checker_result{domain="expired.com",status="ok"} -3"#));
    assert!(body.contains(r#"domain_expiration_checker_result{domain="mystery.org",status="unknown"} 0"#));
    assert!(body.contains("domain_expiration_checker_cycles_total 1"));
    assert!(body.contains(r#"domain_expiration_checker_lookup_failures_total{account="static...acct01"} 3"#));
}

#[tokio::test]
async fn readiness_follows_first_cycle() {
    let (state, checker) = state();

    let resp = ops::readyz(State(state.clone())).await.into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    tokio::spawn(Arc::clone(&checker).start());
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !state.is_ready() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("first cycle must finish");

    let resp = ops::readyz(State(state)).await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ops::healthz().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn router_serves_metrics_path() {
    let (state, checker) = state();
    checker.run_cycle().await;

    let app = domexp_exporter::router::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"domain="soon.com""#));

    let status = reqwest::get(format!("http://{addr}/nope")).await.unwrap().status();
    assert_eq!(status.as_u16(), 404);
}
