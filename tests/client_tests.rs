//! Slack Web API client tests against a mock server.

use serde_json::json;
use standup_bot::core::models::{ConversationKind, HistoryQuery, MessageRecord};
use standup_bot::errors::SlackError;
use standup_bot::slack::{ConversationSummary, SlackClient};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> SlackClient {
    SlackClient::with_api_base("xoxb-test".to_string(), &server.uri())
}

fn query() -> HistoryQuery {
    HistoryQuery {
        oldest: "1699395200.000000".to_string(),
        latest: "1700000000.000000".to_string(),
        limit: 1000,
        inclusive: true,
    }
}

#[tokio::test]
async fn test_conversation_history_sends_bounds_and_decodes_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(query_param("channel", "C1"))
        .and(query_param("oldest", "1699395200.000000"))
        .and(query_param("latest", "1700000000.000000"))
        .and(query_param("limit", "1000"))
        .and(query_param("inclusive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "has_more": true,
            "messages": [
                {"type": "message", "user": "U1", "text": "<@UBOT> hi", "ts": "1699999999.000100"},
                {"type": "message", "subtype": "channel_join", "user": "U2", "text": "joined", "ts": "1699999998.000100"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .conversation_history("C1", &query())
        .await
        .unwrap();

    assert!(page.has_more);
    assert_eq!(page.messages.len(), 2);
    assert_eq!(
        page.messages[0],
        MessageRecord::user_message("U1", "<@UBOT> hi", "1699999999.000100")
    );
    assert_eq!(page.messages[1].subtype, "channel_join");
}

#[tokio::test]
async fn test_bound_conversation_uses_client_history() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .and(query_param("channel", "G7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = test_client(&server).conversation(ConversationSummary {
        id: "G7".to_string(),
        name: "secret".to_string(),
        kind: ConversationKind::PrivateGroup,
    });
    let page = conversation.fetch_history(query()).await.unwrap();

    assert_eq!(conversation.id, "G7");
    assert!(page.messages.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_invalid_auth_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rtm.connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error": "invalid_auth"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server).rtm_connect().await.unwrap_err();
    assert!(matches!(err, SlackError::AuthError(_)), "got: {err:?}");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_api_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "error": "channel_not_found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .conversation_history("C404", &query())
        .await
        .unwrap_err();
    assert!(
        matches!(err, SlackError::ApiError(ref msg) if msg.contains("channel_not_found")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_rtm_connect_returns_identity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rtm.connect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "url": "wss://rtm.example.invalid/ws",
            "self": {"id": "UBOT", "name": "standup"},
            "team": {"id": "T1", "name": "Acme", "domain": "acme"}
        })))
        .mount(&server)
        .await;

    let session = test_client(&server).rtm_connect().await.unwrap();

    assert_eq!(session.url, "wss://rtm.example.invalid/ws");
    assert_eq!(session.identity.id, "UBOT");
    assert_eq!(session.identity.name, "standup");
    assert_eq!(session.identity.team_id, "T1");
    assert_eq!(session.identity.team_name, "Acme");
}

#[tokio::test]
async fn test_list_member_conversations_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .and(query_param("types", "public_channel,private_channel"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "channels": [
                {"id": "C1", "name": "general", "is_member": true},
                {"id": "C2", "name": "random", "is_member": false}
            ],
            "response_metadata": {"next_cursor": "page-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations.list"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "channels": [
                {"id": "G1", "name": "leads", "is_private": true, "is_member": true},
                {"id": "C3", "name": "old", "is_member": true, "is_archived": true}
            ],
            "response_metadata": {"next_cursor": ""}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversations = test_client(&server)
        .list_member_conversations()
        .await
        .unwrap();

    assert_eq!(
        conversations,
        vec![
            ConversationSummary {
                id: "C1".to_string(),
                name: "general".to_string(),
                kind: ConversationKind::PublicChannel,
            },
            ConversationSummary {
                id: "G1".to_string(),
                name: "leads".to_string(),
                kind: ConversationKind::PrivateGroup,
            },
        ]
    );
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/conversations.history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "messages": [
                {"type": "message", "user": "U1", "text": "<@UBOT> back", "ts": "1699999999.000100"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .conversation_history("C1", &query())
        .await
        .unwrap();

    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].text, "<@UBOT> back");
}

#[test]
fn test_debug_output_hides_token() {
    let client = SlackClient::new("xoxb-secret".to_string());
    let rendered = format!("{client:?}");
    assert!(!rendered.contains("xoxb-secret"));
    assert!(rendered.contains("slack.com/api"));
}
