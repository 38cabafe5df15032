//! Session chat relay.

mod helpers;

use consulthub_core::ErrorKind;
use consulthub_core::types::SessionId;
use consulthub_database::ChatStore;
use consulthub_entity::session::Session;
use consulthub_realtime::session::NewSession;
use serde_json::json;

use helpers::{TestConn, TestNode, count, only};

/// A session in SALES claimed by `consultant`.
async fn active_session(node: &TestNode, client: &TestConn, consultant: &TestConn) -> Session {
    let room = node.room("SALES").await;
    let session = node
        .engine
        .sessions
        .create(
            client.identity,
            NewSession {
                room_id: room.id,
                consultant_id: None,
                problem_description: "Invoice totals do not match".to_string(),
            },
        )
        .await
        .unwrap();
    node.engine
        .claims
        .accept(consultant.handle.id, consultant.identity, session.id)
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_message_reaches_both_participants() {
    let node = TestNode::new().await;
    let mut consultant = node.consultant("Ana").await;
    let mut client = node.client().await;
    let session = active_session(&node, &client, &consultant).await;
    consultant.drain();
    client.drain();

    node.send(
        &client,
        "chat:message",
        json!({ "sessionId": session.id, "message": "  It fails at step 3  " }),
    )
    .await;

    for conn in [&mut consultant, &mut client] {
        let frames = conn.drain();
        let line = only(&frames, "chat:new-message");
        assert_eq!(line["message"], "It fails at step 3");
        assert_eq!(line["messageType"], "TEXT");
        assert_eq!(line["sessionId"], json!(session.id));
        assert_eq!(line["user"]["role"], "CLIENT");
    }

    let log = node.store.list_for_session(session.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].sender_id, client.user_id());
}

#[tokio::test]
async fn test_message_type_is_kept() {
    let node = TestNode::new().await;
    let mut consultant = node.consultant("Ana").await;
    let client = node.client().await;
    let session = active_session(&node, &client, &consultant).await;
    consultant.drain();

    node.send(
        &consultant,
        "chat:message",
        json!({ "sessionId": session.id, "message": "https://files.test/a.png", "messageType": "IMAGE" }),
    )
    .await;

    let frames = consultant.drain();
    assert_eq!(only(&frames, "chat:new-message")["messageType"], "IMAGE");
}

#[tokio::test]
async fn test_rejections() {
    let node = TestNode::new().await;
    let consultant = node.consultant("Ana").await;
    let mut client = node.client().await;
    let mut outsider = node.client().await;
    let session = active_session(&node, &client, &consultant).await;
    client.drain();
    outsider.drain();

    node.send(&outsider, "chat:message", json!({ "sessionId": session.id, "message": "hi" }))
        .await;
    assert_eq!(only(&outsider.drain(), "error")["code"], "FORBIDDEN");

    node.send(&client, "chat:message", json!({ "sessionId": session.id, "message": "   " }))
        .await;
    assert_eq!(only(&client.drain(), "error")["code"], "VALIDATION");

    let too_long = "x".repeat(node.engine.config().max_chat_message_length + 1);
    node.send(&client, "chat:message", json!({ "sessionId": session.id, "message": too_long }))
        .await;
    assert_eq!(only(&client.drain(), "error")["code"], "VALIDATION");

    node.send(&client, "chat:message", json!({ "sessionId": SessionId::new(), "message": "hi" }))
        .await;
    assert_eq!(only(&client.drain(), "error")["code"], "NOT_FOUND");

    assert!(node.store.list_for_session(session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_session_is_not_active() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let room = node.room("HR").await;
    let session = node
        .engine
        .sessions
        .create(
            client.identity,
            NewSession {
                room_id: room.id,
                consultant_id: None,
                problem_description: "Payroll export is empty".to_string(),
            },
        )
        .await
        .unwrap();

    let err = node
        .engine
        .chat
        .send(client.identity, session.id, "hello?", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert_eq!(err.message, "Session is not active");
}

#[tokio::test]
async fn test_mark_read_only_touches_other_side() {
    let node = TestNode::new().await;
    let mut consultant = node.consultant("Ana").await;
    let mut client = node.client().await;
    let session = active_session(&node, &client, &consultant).await;

    node.engine
        .chat
        .send(consultant.identity, session.id, "Try clearing the cache", None)
        .await
        .unwrap();
    node.engine
        .chat
        .send(client.identity, session.id, "Done, still failing", None)
        .await
        .unwrap();
    consultant.drain();
    client.drain();

    node.send(&client, "chat:mark-read", json!({ "sessionId": session.id }))
        .await;

    let frames = consultant.drain();
    let read = only(&frames, "chat:messages-read");
    assert_eq!(read["readBy"], json!(client.user_id()));
    assert_eq!(count(&client.drain(), "chat:messages-read"), 1);

    let log = node
        .engine
        .chat
        .history(client.identity, session.id)
        .await
        .unwrap();
    assert!(log[0].read_at.is_some());
    assert!(log[1].read_at.is_none());
}
