//! End-to-end guard behavior over real HTTP.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

mod common;

use common::{applicant, client, start_gatekeeper, test_config, API_KEY, ORIGIN};

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("cache-control", "no-store, no-cache, must-revalidate, max-age=0"),
];

fn assert_security_headers(res: &reqwest::Response) {
    for (name, value) in SECURITY_HEADERS {
        assert_eq!(
            res.headers().get(name).and_then(|v| v.to_str().ok()),
            Some(value),
            "missing or wrong {name}"
        );
    }
}

#[tokio::test]
async fn test_full_chain_admits_valid_submission() {
    let (addr, shutdown) = start_gatekeeper(test_config()).await;

    let res = client()
        .post(format!("http://{addr}/api/apply"))
        .header("X-API-Key", API_KEY)
        .header("Origin", ORIGIN)
        .header("Referer", format!("{ORIGIN}/careers"))
        .json(&applicant("ada@example.com"))
        .send()
        .await
        .expect("gatekeeper unreachable");

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_security_headers(&res);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    let id = body["application_id"].as_str().unwrap();
    let res = client()
        .get(format!("http://{addr}/api/apply/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejections_map_to_wire_contract() {
    let (addr, shutdown) = start_gatekeeper(test_config()).await;
    let url = format!("http://{addr}/api/apply");

    // Each request uses its own forwarded client so rate limiting stays out of the way.
    let cases: Vec<(reqwest::RequestBuilder, StatusCode, &str)> = vec![
        (
            client().post(&url).header("X-Forwarded-For", "192.0.2.1"),
            StatusCode::UNAUTHORIZED,
            "API key required",
        ),
        (
            client()
                .post(&url)
                .header("X-Forwarded-For", "192.0.2.2")
                .header("X-API-Key", "wrong"),
            StatusCode::UNAUTHORIZED,
            "Invalid API key",
        ),
        (
            client()
                .post(&url)
                .header("X-Forwarded-For", "192.0.2.3")
                .header("X-API-Key", API_KEY)
                .header("Origin", "https://example.com.evil.com"),
            StatusCode::FORBIDDEN,
            "Unauthorized origin",
        ),
        (
            client()
                .post(&url)
                .header("X-Forwarded-For", "192.0.2.4")
                .header("X-API-Key", API_KEY)
                .header("Referer", "https://evil.com/page"),
            StatusCode::FORBIDDEN,
            "Unauthorized referer",
        ),
    ];

    for (request, status, error) in cases {
        let res = request.json(&applicant("x@example.com")).send().await.unwrap();
        assert_eq!(res.status(), status);
        assert_security_headers(&res);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], error);
        assert!(body["message"].is_string());
    }

    let mut spam = applicant("bot@example.com");
    spam["website"] = Value::from("http://spam.com");
    let res = client()
        .post(&url)
        .header("X-Forwarded-For", "192.0.2.5")
        .header("X-API-Key", API_KEY)
        .json(&spam)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_security_headers(&res);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rate_limit_per_client_over_http() {
    let (addr, shutdown) = start_gatekeeper(test_config()).await;
    let url = format!("http://{addr}/api/apply/00000000-0000-0000-0000-000000000000");

    // Lookups allow 10 per 15 minutes per client.
    for _ in 0..10 {
        let res = client().get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    let res = client().get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_security_headers(&res);
    let retry_header: u64 = res.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["retry_after"].as_u64(), Some(retry_header));
    assert!(retry_header <= 15 * 60);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let res = client().get(&url).send().await.unwrap();
    let later: Value = res.json().await.unwrap();
    let later = later["retry_after"].as_u64().unwrap();
    assert!(later <= retry_header);
    assert!(retry_header - later <= 2);

    // A different forwarded client has its own window.
    let res = client()
        .get(&url)
        .header("X-Forwarded-For", "203.0.113.50")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn test_missing_server_key_fails_closed() {
    let mut config = test_config();
    config.gatekeeper.api_key = None;
    let (addr, shutdown) = start_gatekeeper(config).await;

    let res = client()
        .post(format!("http://{addr}/api/apply"))
        .header("X-API-Key", "anything")
        .json(&applicant("ada@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid API key");

    shutdown.trigger();
}
