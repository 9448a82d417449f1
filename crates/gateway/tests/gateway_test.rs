//! HTTP-level gateway tests against a mock inference endpoint.

use futures::StreamExt;
use llm_relay_common::{ContentBlock, ConversationTurn, GatewayError};
use llm_relay_gateway::{collect_text, AnthropicGateway, Fragment, ModelGateway, ModelRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> ModelRequest {
    ModelRequest::new(
        "You are a terse assistant.",
        vec![ConversationTurn::user(vec![ContentBlock::text("What is 2+2?")])],
        "test-model",
    )
}

fn sse_body(events: &[(&str, &str)]) -> String {
    events
        .iter()
        .map(|(event, data)| format!("event: {event}\ndata: {data}\n\n"))
        .collect()
}

#[tokio::test]
async fn streaming_reply_arrives_in_order_with_ack() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        ("message_start", r#"{"type":"message_start","message":{}}"#),
        (
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"The answer "}}"#,
        ),
        (
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"is 4."}}"#,
        ),
        ("message_stop", r#"{"type":"message_stop"}"#),
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let gateway = AnthropicGateway::new(server.uri(), None);
    let fragments: Vec<Fragment> = gateway
        .invoke_streaming(request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        fragments,
        vec![
            Fragment::Text("The answer ".to_string()),
            Fragment::Text("is 4.".to_string()),
            Fragment::EndOfMessage,
        ]
    );
}

#[tokio::test]
async fn mid_stream_throttling_yields_one_fault_fragment_then_ack() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        (
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"partial"}}"#,
        ),
        (
            "error",
            r#"{"type":"error","error":{"type":"throttlingException","message":"Too many requests, please wait."}}"#,
        ),
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let gateway = AnthropicGateway::new(server.uri(), None);
    let fragments: Vec<Fragment> = gateway
        .invoke_streaming(request())
        .await
        .unwrap()
        .collect()
        .await;

    // One ordinary fragment, one fault fragment, then the stream ends
    // cleanly with the acknowledgement marker. No error escapes.
    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0], Fragment::Text("partial".to_string()));
    match &fragments[1] {
        Fragment::Text(text) => assert!(text.contains("Too many requests")),
        other => panic!("expected fault text, got {other:?}"),
    }
    assert_eq!(fragments[2], Fragment::EndOfMessage);
}

#[tokio::test]
async fn single_shot_collects_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"content":[{"type":"text","text":"4"}],"stop_reason":"end_turn"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let gateway = AnthropicGateway::new(server.uri(), None);
    let reply = gateway.invoke(request()).await.unwrap();
    assert_eq!(reply, "4");
}

#[tokio::test]
async fn http_429_maps_to_throttled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_raw(
            r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let gateway = AnthropicGateway::new(server.uri(), None);
    match gateway.invoke(request()).await {
        Err(GatewayError::Throttled(msg)) => assert_eq!(msg, "slow down"),
        other => panic!("expected throttled error, got {other:?}"),
    }
}

#[tokio::test]
async fn collect_text_stops_at_ack() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        (
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"done"}}"#,
        ),
        ("message_stop", r#"{"type":"message_stop"}"#),
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let gateway = AnthropicGateway::new(server.uri(), None);
    let stream = gateway.invoke_streaming(request()).await.unwrap();
    assert_eq!(collect_text(stream).await, "done");
}
