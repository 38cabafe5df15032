//! Session create / view / end / rate.

mod helpers;

use consulthub_core::ErrorKind;
use consulthub_core::types::RoomId;
use consulthub_entity::session::{Session, SessionStatus};
use consulthub_realtime::session::{EndSession, NewSession};

use helpers::{TestConn, TestNode, only};

fn request(room_id: RoomId, problem: &str) -> NewSession {
    NewSession {
        room_id,
        consultant_id: None,
        problem_description: problem.to_string(),
    }
}

async fn claimed(node: &TestNode, client: &TestConn, consultant: &TestConn) -> Session {
    let room = node.room("INVENTORY").await;
    let session = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "Stock counts are off by one"))
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
async fn test_create_assigns_numbers_and_posts_to_room() {
    let node = TestNode::new().await;
    let mut consultant = node.consultant("Ana").await;
    let mut bystander = node.consultant("Ben").await;
    let client = node.client().await;
    node.join_room(&consultant, "SALES").await;
    node.join_room(&bystander, "HR").await;
    consultant.drain();
    bystander.drain();

    let room = node.room("SALES").await;
    let first = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "  Quote PDF is blank  "))
        .await
        .unwrap();
    let second = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "Discount rules ignored"))
        .await
        .unwrap();

    assert_eq!(first.status, SessionStatus::Pending);
    assert_eq!(first.problem_description, "Quote PDF is blank");
    assert!(first.session_number.starts_with("SES-"));
    assert!(first.session_number < second.session_number);

    let frames = consultant.take("session:new-request");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["data"]["sessionNumber"], first.session_number);
    assert!(bystander.take("session:new-request").is_empty());
}

#[tokio::test]
async fn test_create_validation() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let consultant = node.consultant("Ana").await;
    let room = node.room("SALES").await;

    let short = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "help"))
        .await
        .unwrap_err();
    assert_eq!(short.kind, ErrorKind::Validation);

    node.store.deactivate_room(room.id);
    let inactive = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "Long enough description"))
        .await
        .unwrap_err();
    assert_eq!(inactive.kind, ErrorKind::NotFound);

    let hr = node.room("HR").await;
    let mut wanted = request(hr.id, "Long enough description");
    wanted.consultant_id = Some(node.presence_of(consultant.user_id()).await.id);
    let offline = node
        .engine
        .sessions
        .create(client.identity, wanted.clone())
        .await
        .unwrap_err();
    assert_eq!(offline.kind, ErrorKind::Unavailable);

    node.join_room(&consultant, "HR").await;
    let ok = node
        .engine
        .sessions
        .create(client.identity, wanted)
        .await
        .unwrap();
    assert_eq!(ok.consultant_id, Some(node.presence_of(consultant.user_id()).await.id));

    let by_consultant = node
        .engine
        .sessions
        .create(consultant.identity, request(hr.id, "Long enough description"))
        .await
        .unwrap_err();
    assert_eq!(by_consultant.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_get_visibility() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let in_room = node.consultant("Ana").await;
    let elsewhere = node.consultant("Ben").await;
    let admin = node.admin().await;
    node.join_room(&in_room, "TROIA").await;
    node.join_room(&elsewhere, "HR").await;

    let room = node.room("TROIA").await;
    let session = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "Report designer crashes"))
        .await
        .unwrap();

    let sessions = &node.engine.sessions;
    assert!(sessions.get(client.identity, session.id).await.is_ok());
    assert!(sessions.get(admin.identity, session.id).await.is_ok());
    assert!(sessions.get(in_room.identity, session.id).await.is_ok());
    let denied = sessions.get(elsewhere.identity, session.id).await.unwrap_err();
    assert_eq!(denied.kind, ErrorKind::Forbidden);

    node.engine
        .claims
        .accept(in_room.handle.id, in_room.identity, session.id)
        .await
        .unwrap();
    assert!(sessions.get(in_room.identity, session.id).await.is_ok());
}

#[tokio::test]
async fn test_end_requires_assigned_consultant() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let mut consultant = node.consultant("Ana").await;
    let other = node.consultant("Ben").await;
    let session = claimed(&node, &client, &consultant).await;
    consultant.drain();

    let sessions = &node.engine.sessions;
    let err = sessions
        .end(other.identity, session.id, EndSession::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    let err = sessions
        .end(client.identity, session.id, EndSession::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let ended = sessions
        .end(
            consultant.identity,
            session.id,
            EndSession {
                solution_summary: Some("Rebuilt the index".to_string()),
                consultant_notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(ended.status, SessionStatus::Completed);
    assert_eq!(ended.duration_minutes, Some(0));
    assert!(ended.ended_at.is_some());

    let frames = consultant.drain();
    assert_eq!(only(&frames, "session:status-changed")["status"], "COMPLETED");

    let again = sessions
        .end(consultant.identity, session.id, EndSession::default())
        .await
        .unwrap_err();
    assert_eq!(again.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_admin_can_end_and_pending_cannot_end() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let admin = node.admin().await;
    let room = node.room("GENERAL").await;
    let pending = node
        .engine
        .sessions
        .create(client.identity, request(room.id, "Login page loops forever"))
        .await
        .unwrap();

    let err = node
        .engine
        .sessions
        .end(admin.identity, pending.id, EndSession::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    let consultant = node.consultant("Ana").await;
    node.engine
        .claims
        .accept(consultant.handle.id, consultant.identity, pending.id)
        .await
        .unwrap();
    let ended = node
        .engine
        .sessions
        .end(admin.identity, pending.id, EndSession::default())
        .await
        .unwrap();
    assert_eq!(ended.status, SessionStatus::Completed);
}

#[tokio::test]
async fn test_rate_rules() {
    let node = TestNode::new().await;
    let client = node.client().await;
    let consultant = node.consultant("Ana").await;
    let session = claimed(&node, &client, &consultant).await;
    let sessions = &node.engine.sessions;

    let early = sessions
        .rate(client.identity, session.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(early.kind, ErrorKind::InvalidState);

    sessions
        .end(consultant.identity, session.id, EndSession::default())
        .await
        .unwrap();

    let by_consultant = sessions
        .rate(consultant.identity, session.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(by_consultant.kind, ErrorKind::Forbidden);

    for bad in [0, 6] {
        let err = sessions
            .rate(client.identity, session.id, bad, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    let rated = sessions
        .rate(client.identity, session.id, 4, Some(" Quick and clear ".to_string()))
        .await
        .unwrap();
    assert_eq!(rated.rating, Some(4));
    assert_eq!(rated.feedback.as_deref(), Some("Quick and clear"));
}
