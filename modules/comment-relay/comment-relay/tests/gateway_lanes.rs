#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Drives the assembled gateway router lane by lane, without sockets.

mod common;

use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use comment_relay::GatewayConfig;
use comment_relay_sdk::proto::{CommentsResponse, PostRequest, PublishResponse, RedditComment};
use http::{HeaderMap, Request, StatusCode, header};
use prost::Message;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{FETCH_PATH, RecordingProducer, SEND_PATH, StaticSource, gateway, gateway_with};

const CORS_HEADERS: [&str; 4] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-max-age",
];

fn app(source: StaticSource) -> Router {
    gateway(source, RecordingProducer::acking()).router()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let resp = app.oneshot(req).await.expect("router is infallible");
    let (parts, body) = resp.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (parts.status, parts.headers, bytes.to_vec())
}

fn json_post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn assert_cors(headers: &HeaderMap) {
    for name in CORS_HEADERS {
        assert!(headers.contains_key(name), "missing {name}");
    }
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-max-age"], "86400");
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

#[tokio::test]
async fn json_lane_returns_first_post_comments() {
    let body = json!({"subreddit": "uiuc", "searchQuery": "Arboretum", "limit": 1}).to_string();

    let (status, headers, bytes) =
        send(app(StaticSource::arboretum()), json_post(FETCH_PATH, body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );
    assert_cors(&headers);
    assert_eq!(
        as_json(&bytes),
        json!({
            "postTitle": "Arboretum at night?",
            "comments": [
                {"body": "It closes at sunset."},
                {"body": "Not in summer."},
                {"body": "Bring a flashlight."}
            ]
        })
    );
}

#[tokio::test]
async fn json_lane_accepts_json_accept_header() {
    let req = Request::builder()
        .method("POST")
        .uri(FETCH_PATH)
        .header(header::ACCEPT, "application/json")
        .body(Body::from(
            json!({"subreddit": "uiuc", "searchQuery": "Arboretum", "limit": 2}).to_string(),
        ))
        .unwrap();

    let (status, _, bytes) = send(app(StaticSource::arboretum()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&bytes)["postTitle"], "Arboretum at night?");
}

#[tokio::test]
async fn json_lane_reports_no_posts_as_server_error() {
    let body = json!({"subreddit": "uiuc", "searchQuery": "zzzzznonexistentqueryzzzz", "limit": 1})
        .to_string();

    let (status, headers, bytes) = send(app(StaticSource::default()), json_post(FETCH_PATH, body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);
    assert_eq!(as_json(&bytes), json!({"error": "no posts found"}));
}

#[tokio::test]
async fn json_lane_rejects_malformed_body() {
    let (status, headers, bytes) =
        send(app(StaticSource::arboretum()), json_post(FETCH_PATH, "not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_cors(&headers);
    assert_eq!(as_json(&bytes), json!({"error": "Invalid JSON format"}));
}

#[tokio::test]
async fn json_lane_rejects_invalid_fields_before_fetching() {
    let body = json!({"subreddit": "uiuc", "searchQuery": "Arboretum", "limit": 0}).to_string();

    let (status, _, bytes) = send(app(StaticSource::arboretum()), json_post(FETCH_PATH, body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&bytes), json!({"error": "limit must be a positive integer"}));
}

#[tokio::test]
async fn json_lane_rejects_oversized_body() {
    let cfg = GatewayConfig {
        body_limit_bytes: 16,
        ..GatewayConfig::default()
    };
    let router = gateway_with(&cfg, StaticSource::arboretum(), RecordingProducer::acking()).router();
    let body = json!({"subreddit": "uiuc", "searchQuery": "Arboretum", "limit": 1}).to_string();

    let (status, _, bytes) = send(router, json_post(FETCH_PATH, body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&bytes), json!({"error": "Failed to read request body"}));
}

#[tokio::test]
async fn preflight_is_answered_on_any_path() {
    for path in [FETCH_PATH, SEND_PATH, "/", "/whatever"] {
        let req = Request::builder()
            .method("OPTIONS")
            .uri(path)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let (status, headers, bytes) = send(app(StaticSource::arboretum()), req).await;

        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(bytes.is_empty());
        assert_cors(&headers);
    }
}

#[tokio::test]
async fn unclaimed_request_inside_service_prefix_is_a_client_error() {
    let req = Request::builder()
        .method("POST")
        .uri(FETCH_PATH)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();

    let (status, headers, bytes) = send(app(StaticSource::arboretum()), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_cors(&headers);
    assert!(String::from_utf8(bytes).unwrap().contains(FETCH_PATH));
}

#[tokio::test]
async fn paths_outside_the_service_get_the_banner() {
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, headers, bytes) = send(app(StaticSource::arboretum()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        GatewayConfig::default().banner
    );
}

// gRPC-Web framing: 1 flag byte, 4 length bytes (big endian), payload.
// Flag 0x80 marks the trailer frame.

fn grpc_web_frame<M: Message>(msg: &M) -> Vec<u8> {
    let payload = msg.encode_to_vec();
    let mut frame = Vec::with_capacity(payload.len() + 5);
    frame.push(0);
    frame.extend_from_slice(&u32::try_from(payload.len()).unwrap().to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

fn grpc_web_request<M: Message>(path: &str, msg: &M) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/grpc-web+proto")
        .header("x-grpc-web", "1")
        .body(Body::from(grpc_web_frame(msg)))
        .unwrap()
}

/// The text variant may concatenate separately padded base64 chunks, so decode
/// quantum by quantum.
fn decode_grpc_web_text(body: &[u8]) -> Vec<u8> {
    body.chunks(4)
        .flat_map(|quantum| STANDARD.decode(quantum).unwrap())
        .collect()
}

struct GrpcWebReply {
    messages: Vec<Vec<u8>>,
    status: Option<String>,
}

fn parse_grpc_web(headers: &HeaderMap, body: &[u8]) -> GrpcWebReply {
    let mut messages = Vec::new();
    let mut status = headers
        .get("grpc-status")
        .map(|v| v.to_str().unwrap().to_owned());

    let mut rest = body;
    while rest.len() >= 5 {
        let flag = rest[0];
        let len = u32::from_be_bytes(rest[1..5].try_into().unwrap()) as usize;
        let chunk = &rest[5..5 + len];
        if flag & 0x80 == 0 {
            messages.push(chunk.to_vec());
        } else {
            let trailers = String::from_utf8_lossy(chunk);
            for line in trailers.split("\r\n") {
                if let Some((name, value)) = line.split_once(':')
                    && name.trim().eq_ignore_ascii_case("grpc-status")
                {
                    status = Some(value.trim().to_owned());
                }
            }
        }
        rest = &rest[5 + len..];
    }

    GrpcWebReply { messages, status }
}

#[tokio::test]
async fn grpc_web_lane_serves_get_post_comments() {
    let req = grpc_web_request(
        FETCH_PATH,
        &PostRequest {
            subreddit: "uiuc".to_owned(),
            search_query: "Arboretum".to_owned(),
            limit: 1,
        },
    );

    let (status, headers, bytes) = send(app(StaticSource::arboretum()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/grpc-web")
    );

    let reply = parse_grpc_web(&headers, &bytes);
    assert_eq!(reply.status.as_deref(), Some("0"));
    let response = CommentsResponse::decode(reply.messages[0].as_slice()).unwrap();
    assert_eq!(response.post_title, "Arboretum at night?");
    let bodies: Vec<_> = response.comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(
        bodies,
        ["It closes at sunset.", "Not in summer.", "Bring a flashlight."]
    );
}

#[tokio::test]
async fn grpc_web_lane_reports_no_posts_as_not_found() {
    let req = grpc_web_request(
        FETCH_PATH,
        &PostRequest {
            subreddit: "uiuc".to_owned(),
            search_query: "zzzzznonexistentqueryzzzz".to_owned(),
            limit: 1,
        },
    );

    let (status, headers, bytes) = send(app(StaticSource::default()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let reply = parse_grpc_web(&headers, &bytes);
    assert!(reply.messages.is_empty());
    assert_eq!(reply.status.as_deref(), Some("5"));
}

#[tokio::test]
async fn grpc_web_lane_publishes_comments() {
    let producer = RecordingProducer::acking();
    let router = gateway(StaticSource::default(), producer.clone()).router();
    let req = grpc_web_request(
        SEND_PATH,
        &RedditComment {
            id: "c1".to_owned(),
            post_id: "abc123".to_owned(),
            subreddit: "uiuc".to_owned(),
            author: "alma".to_owned(),
            body: "It closes at sunset.".to_owned(),
            score: 4,
            created_utc: 1_700_000_000.0,
            permalink: String::new(),
        },
    );

    let (status, headers, bytes) = send(router, req).await;

    assert_eq!(status, StatusCode::OK);
    let reply = parse_grpc_web(&headers, &bytes);
    let response = PublishResponse::decode(reply.messages[0].as_slice()).unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Comment sent to Kafka successfully");
    assert_eq!(producer.count(), 1);

    let record = producer.records.lock().unwrap()[0].clone();
    assert_eq!(record.key.as_deref(), Some("c1"));
    let payload: Value = serde_json::from_slice(&record.payload).unwrap();
    assert_eq!(payload["body"], "It closes at sunset.");
}

#[tokio::test]
async fn grpc_web_lane_surfaces_broker_failure_in_the_reply() {
    let producer = RecordingProducer::failing("Broker: Message size too large");
    let router = gateway(StaticSource::default(), producer).router();
    let req = grpc_web_request(SEND_PATH, &RedditComment::default());

    let (_, headers, bytes) = send(router, req).await;

    let reply = parse_grpc_web(&headers, &bytes);
    assert_eq!(reply.status.as_deref(), Some("0"));
    let response = PublishResponse::decode(reply.messages[0].as_slice()).unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "Broker: Message size too large");
}

#[tokio::test]
async fn grpc_web_text_lane_round_trips_base64_frames() {
    let frame = grpc_web_frame(&PostRequest {
        subreddit: "uiuc".to_owned(),
        search_query: "Arboretum".to_owned(),
        limit: 1,
    });
    let req = Request::builder()
        .method("POST")
        .uri(FETCH_PATH)
        .header(header::CONTENT_TYPE, "application/grpc-web-text")
        .header(header::ACCEPT, "application/grpc-web-text")
        .header("x-grpc-web", "1")
        .body(Body::from(STANDARD.encode(frame)))
        .unwrap();

    let (status, headers, bytes) = send(app(StaticSource::arboretum()), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/grpc-web-text")
    );

    let reply = parse_grpc_web(&headers, &decode_grpc_web_text(&bytes));
    assert_eq!(reply.status.as_deref(), Some("0"));
    let response = CommentsResponse::decode(reply.messages[0].as_slice()).unwrap();
    assert_eq!(response.post_title, "Arboretum at night?");
    assert_eq!(response.comments.len(), 3);
}

#[tokio::test]
async fn grpc_timeout_header_bounds_a_stalled_fetch() {
    let cfg = GatewayConfig {
        request_timeout: Duration::from_secs(2),
        ..GatewayConfig::default()
    };
    let router = gateway_with(
        &cfg,
        StaticSource::stalled(Duration::from_secs(10)),
        RecordingProducer::acking(),
    )
    .router();
    let mut req = grpc_web_request(
        FETCH_PATH,
        &PostRequest {
            subreddit: "uiuc".to_owned(),
            search_query: "Arboretum".to_owned(),
            limit: 1,
        },
    );
    req.headers_mut().insert("grpc-timeout", "100m".parse().unwrap());

    let started = Instant::now();
    let (status, headers, bytes) = send(router, req).await;
    let elapsed = started.elapsed();

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let reply = parse_grpc_web(&headers, &bytes);
    assert_eq!(reply.status.as_deref(), Some("4"));
    assert!(
        elapsed < Duration::from_secs(1),
        "caller deadline of 100ms should end the call early, took {elapsed:?}"
    );
}
