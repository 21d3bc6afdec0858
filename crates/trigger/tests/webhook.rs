//! `WebhookTrigger` against an in-process endpoint.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use checks::{
    ChangeNumber, PatchSetId, PipelineTrigger, RepositoryName, TriggerError, TriggerIntent,
    TriggerRequest,
};
use reqwest::Url;
use serde_json::Value;
use trigger::WebhookTrigger;

#[derive(Default)]
struct Endpoint {
    reply: Mutex<(u16, String)>,
    seen: Mutex<Vec<(Option<String>, Option<String>, Value)>>,
}

async fn receive(
    State(endpoint): State<Arc<Endpoint>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    endpoint.seen.lock().unwrap().push((
        header("x-jarvis"),
        header("content-type"),
        serde_json::from_str(&body).unwrap(),
    ));
    let (status, reply) = endpoint.reply.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), reply)
}

async fn start(status: u16, reply: &str) -> (Arc<Endpoint>, WebhookTrigger) {
    let endpoint = Arc::new(Endpoint {
        reply: Mutex::new((status, reply.to_string())),
        ..Endpoint::default()
    });
    let app = Router::new()
        .route("/", post(receive))
        .with_state(endpoint.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let trigger = WebhookTrigger::new(
        Url::parse(&format!("http://{addr}/")).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();
    (endpoint, trigger)
}

fn request() -> TriggerRequest {
    TriggerRequest {
        repo_root: "https://review.example.org/".to_string(),
        project: RepositoryName::new("airship/treasuremap").unwrap(),
        change_number: ChangeNumber::new(1234),
        patch_set: PatchSetId::new(2),
        checker_uuid: None,
    }
}

#[tokio::test]
async fn create_posts_json_with_intent_header() {
    let (endpoint, trigger) = start(202, r#"{"eventID":"e-1"}"#).await;

    let ack = trigger
        .trigger(TriggerIntent::Create, &request())
        .await
        .unwrap();

    assert_eq!(ack.messages.len(), 1);
    let seen = endpoint.seen.lock().unwrap().clone();
    let (intent, content_type, body) = &seen[0];
    assert_eq!(intent.as_deref(), Some("create"));
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["patchSetNumber"], 2);
    assert_eq!(body["changeNumber"], "1234");
}

#[tokio::test]
async fn merge_uses_merge_header() {
    let (endpoint, trigger) = start(200, "").await;

    trigger
        .trigger(TriggerIntent::Merge, &request())
        .await
        .unwrap();

    let seen = endpoint.seen.lock().unwrap().clone();
    assert_eq!(seen[0].0.as_deref(), Some("merge"));
    assert_eq!(seen[0].2["patchSetNumber"], "2");
}

#[tokio::test]
async fn irrelevant_reply_is_the_sentinel() {
    let (_endpoint, trigger) = start(200, r#"{"irrelevant":true}"#).await;

    let result = trigger.trigger(TriggerIntent::Create, &request()).await;

    assert_eq!(result, Err(TriggerError::Irrelevant));
}

#[tokio::test]
async fn mistyped_reply_is_not_taken_as_success() {
    let (_endpoint, trigger) = start(200, r#"{"irrelevant":true,"detailsUrl":7}"#).await;

    let result = trigger.trigger(TriggerIntent::Create, &request()).await;

    assert!(matches!(result, Err(TriggerError::Decode { .. })));
}

#[tokio::test]
async fn error_status_is_reported() {
    let (_endpoint, trigger) = start(500, "boom").await;

    let result = trigger.trigger(TriggerIntent::Create, &request()).await;

    assert!(matches!(result, Err(TriggerError::Status { status: 500, .. })));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let trigger = WebhookTrigger::new(
        Url::parse(&format!("http://{addr}/")).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();

    let result = trigger.trigger(TriggerIntent::Create, &request()).await;

    assert!(matches!(result, Err(TriggerError::Transport { .. })));
}
