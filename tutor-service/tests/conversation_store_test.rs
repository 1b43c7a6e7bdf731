//! Store adapter semantics: idempotent creation, ordered retrieval, atomic
//! deletion, derived metadata.

mod common;

use common::TestApp;
use mongodb::bson::doc;
use service_core::error::AppError;
use tutor_service::models::{Part, Role};
use tutor_service::session::generate_session_id;

#[tokio::test]
async fn ensure_conversation_is_idempotent() {
    let app = TestApp::spawn().await;
    let session_id = generate_session_id();

    app.db
        .ensure_conversation(&session_id)
        .await
        .expect("First ensure failed");

    let first = app
        .db
        .conversations()
        .find_one(doc! { "_id": &session_id }, None)
        .await
        .unwrap()
        .expect("Conversation not created");

    // Repeat calls must not reset created_at or create duplicates
    for _ in 0..3 {
        app.db
            .ensure_conversation(&session_id)
            .await
            .expect("Repeat ensure failed");
    }

    let after = app
        .db
        .conversations()
        .find_one(doc! { "_id": &session_id }, None)
        .await
        .unwrap()
        .expect("Conversation disappeared");
    assert_eq!(after.created_at, first.created_at);

    let count = app
        .db
        .conversations()
        .count_documents(doc! { "_id": &session_id }, None)
        .await
        .unwrap();
    assert_eq!(count, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn list_messages_returns_appends_in_timestamp_order() {
    let app = TestApp::spawn().await;
    let session_id = generate_session_id();
    app.db.ensure_conversation(&session_id).await.unwrap();

    app.db
        .append_message(&session_id, Role::User, vec![Part::text("one")])
        .await
        .unwrap();
    app.db
        .append_message(&session_id, Role::Assistant, vec![Part::text("two")])
        .await
        .unwrap();
    app.db
        .append_message(&session_id, Role::User, vec![Part::text("three")])
        .await
        .unwrap();

    let messages = app.db.list_messages(&session_id).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let texts: Vec<_> = messages
        .iter()
        .map(|m| match &m.parts[0] {
            Part::Text { text } => text.as_str(),
            _ => panic!("expected text part"),
        })
        .collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);

    app.cleanup().await;
}

#[tokio::test]
async fn list_messages_on_unknown_session_is_empty_not_an_error() {
    let app = TestApp::spawn().await;

    let messages = app
        .db
        .list_messages("session_1_neverexisted")
        .await
        .expect("Unknown session should not error");
    assert!(messages.is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn metadata_reflects_record_and_messages() {
    let app = TestApp::spawn().await;
    let session_id = generate_session_id();
    app.db.ensure_conversation(&session_id).await.unwrap();

    assert_eq!(
        app.db.metadata(&session_id).await.unwrap().unwrap().message_count,
        0
    );

    app.db
        .append_message(&session_id, Role::User, vec![Part::text("q")])
        .await
        .unwrap();
    let last = app
        .db
        .append_message(&session_id, Role::Assistant, vec![Part::text("a")])
        .await
        .unwrap();

    let metadata = app.db.metadata(&session_id).await.unwrap().unwrap();
    assert_eq!(metadata.session_id, session_id);
    assert_eq!(metadata.message_count, 2);
    assert_eq!(metadata.last_activity, Some(last.timestamp));

    app.cleanup().await;
}

#[tokio::test]
async fn metadata_is_absent_for_unknown_session() {
    let app = TestApp::spawn().await;
    assert!(app.db.metadata("session_1_unknown").await.unwrap().is_none());
    app.cleanup().await;
}

#[tokio::test]
async fn delete_removes_conversation_and_messages_together() {
    let app = TestApp::spawn().await;
    let session_id = generate_session_id();
    app.db.ensure_conversation(&session_id).await.unwrap();
    app.db
        .append_message(&session_id, Role::User, vec![Part::text("q")])
        .await
        .unwrap();

    app.db
        .delete_conversation(&session_id)
        .await
        .expect("Delete failed");

    assert!(app.db.list_messages(&session_id).await.unwrap().is_empty());
    assert!(app.db.metadata(&session_id).await.unwrap().is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn delete_on_unknown_session_reports_not_found_and_mutates_nothing() {
    let app = TestApp::spawn().await;
    let session_id = generate_session_id();
    app.db.ensure_conversation(&session_id).await.unwrap();

    let result = app.db.delete_conversation("session_1_unknown").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // The existing conversation is untouched
    assert!(app.db.metadata(&session_id).await.unwrap().is_some());

    app.cleanup().await;
}
