use crate::chat::dtos::SendMessageRequest;
use crate::chat::get_thread::GetThreadUseCase;
use crate::chat::list_conversations::ListConversationsUseCase;
use crate::chat::send_message::SendMessageUseCase;
use crate::chat::unread_count::UnreadCountUseCase;
use chrono::{TimeZone, Utc};
use maplit::btreemap;
use reel_core::entities::{messages, users};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

fn user(username: &str) -> users::Model {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    users::Model {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        display_name: Some(username.to_string()),
        avatar_url: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn message(
    sender_id: Uuid,
    receiver_id: Uuid,
    content: &str,
    is_read: bool,
    minute: u32,
) -> messages::Model {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap();
    messages::Model {
        message_id: Uuid::new_v4(),
        sender_id,
        receiver_id,
        content: content.to_string(),
        is_read,
        created_at: at.into(),
        updated_at: at.into(),
    }
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
    btreemap! { "num_items" => Into::<Value>::into(n) }
}

#[tokio::test]
async fn send_to_self_fails_with_validation_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let sender = Uuid::new_v4();

    let err = SendMessageUseCase::execute(
        &db,
        sender,
        SendMessageRequest {
            receiver_id: sender,
            content: "hi".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn send_with_blank_content_fails() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let err = SendMessageUseCase::execute(
        &db,
        Uuid::new_v4(),
        SendMessageRequest {
            receiver_id: Uuid::new_v4(),
            content: "   ".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn send_to_unknown_receiver_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();

    let err = SendMessageUseCase::execute(
        &db,
        Uuid::new_v4(),
        SendMessageRequest {
            receiver_id: Uuid::new_v4(),
            content: "hi".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn send_persists_unread_message_with_populated_parties() {
    let sender = user("alice");
    let receiver = user("bob");
    let stored = message(sender.user_id, receiver.user_id, "hi", false, 0);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![receiver.clone()]])
        .append_query_results([vec![sender.clone()]])
        .append_query_results([vec![stored.clone()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let dto = SendMessageUseCase::execute(
        &db,
        sender.user_id,
        SendMessageRequest {
            receiver_id: receiver.user_id,
            content: "hi".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(dto.sender.username, "alice");
    assert_eq!(dto.receiver.username, "bob");
    assert_eq!(dto.content, "hi");
    assert!(!dto.is_read);
}

#[tokio::test]
async fn get_thread_with_unknown_user_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();

    let err = GetThreadUseCase::execute(&db, Uuid::new_v4(), Uuid::new_v4(), None, None)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn get_thread_reverses_page_to_chronological_order() {
    let me = user("alice");
    let other = user("bob");
    let older = message(other.user_id, me.user_id, "first", false, 0);
    let newer = message(me.user_id, other.user_id, "second", false, 5);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![other.clone()]])
        .append_query_results([vec![count_row(2)]])
        // storage order is newest-first
        .append_query_results([vec![newer.clone(), older.clone()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let thread = GetThreadUseCase::execute(&db, me.user_id, other.user_id, None, None)
        .await
        .unwrap();

    assert_eq!(thread.total, 2);
    assert_eq!(thread.page, 1);
    assert_eq!(thread.limit, 30);
    assert_eq!(thread.total_pages, 1);
    assert_eq!(thread.user.username, "bob");
    assert_eq!(thread.messages[0].content, "first");
    assert_eq!(thread.messages[1].content, "second");
}

#[tokio::test]
async fn get_thread_pagination_math() {
    let me = user("alice");
    let other = user("bob");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![other.clone()]])
        .append_query_results([vec![count_row(61)]])
        .append_query_results([Vec::<messages::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let thread = GetThreadUseCase::execute(&db, me.user_id, other.user_id, Some(3), Some(30))
        .await
        .unwrap();

    assert_eq!(thread.total, 61);
    assert_eq!(thread.total_pages, 3);
    assert_eq!(thread.page, 3);
}

#[tokio::test]
async fn get_thread_with_huge_page_number_does_not_overflow() {
    let me = user("alice");
    let other = user("bob");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![other.clone()]])
        .append_query_results([vec![count_row(1)]])
        .append_query_results([Vec::<messages::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let thread =
        GetThreadUseCase::execute(&db, me.user_id, other.user_id, Some(u64::MAX), Some(30))
            .await
            .unwrap();

    assert!(thread.messages.is_empty());
    assert_eq!(thread.total, 1);
}

#[tokio::test]
async fn get_thread_marks_counterpart_messages_read_on_any_page() {
    let me = user("alice");
    let other = user("bob");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![other.clone()]])
        .append_query_results([vec![count_row(61)]])
        .append_query_results([Vec::<messages::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .into_connection();

    // fetching an old page, not the newest one
    GetThreadUseCase::execute(&db, me.user_id, other.user_id, Some(3), Some(30))
        .await
        .unwrap();

    // the bulk mark-read still ran, filtered to messages the counterpart
    // sent to the requester
    let log = db.into_transaction_log();
    let stmt = log.last().unwrap().statements().last().unwrap();
    let update = format!("{} {:?}", stmt.sql, stmt.values);
    assert!(update.contains(r#"UPDATE "messages""#), "got: {}", update);
    assert!(update.contains(r#""is_read""#), "got: {}", update);
    assert!(update.contains(&other.user_id.to_string()), "got: {}", update);
    assert!(update.contains(&me.user_id.to_string()), "got: {}", update);
}

#[tokio::test]
async fn list_conversations_reports_unread_and_latest() {
    let me = user("alice");
    let other = user("bob");
    let latest = message(other.user_id, me.user_id, "hello there", false, 9);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // every message involving me
        .append_query_results([vec![latest.clone()]])
        // latest between the pair
        .append_query_results([vec![latest.clone()]])
        // unread count from bob
        .append_query_results([vec![count_row(1)]])
        // counterpart user row
        .append_query_results([vec![other.clone()]])
        .into_connection();

    let conversations = ListConversationsUseCase::execute(&db, me.user_id)
        .await
        .unwrap();

    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].user.username, "bob");
    assert_eq!(conversations[0].unread_count, 1);
    assert_eq!(conversations[0].latest_message.content, "hello there");
}

#[tokio::test]
async fn list_conversations_sorts_by_latest_message_descending() {
    let me = user("alice");
    let bob = user("bob");
    let carol = user("carol");
    // bob's thread is older than carol's
    let bob_latest = message(bob.user_id, me.user_id, "old", true, 1);
    let carol_latest = message(me.user_id, carol.user_id, "new", false, 30);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bob_latest.clone(), carol_latest.clone()]])
        // bob: latest, unread, user
        .append_query_results([vec![bob_latest.clone()]])
        .append_query_results([vec![count_row(0)]])
        .append_query_results([vec![bob.clone()]])
        // carol: latest, unread, user
        .append_query_results([vec![carol_latest.clone()]])
        .append_query_results([vec![count_row(0)]])
        .append_query_results([vec![carol.clone()]])
        .into_connection();

    let conversations = ListConversationsUseCase::execute(&db, me.user_id)
        .await
        .unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].user.username, "carol");
    assert_eq!(conversations[1].user.username, "bob");
}

#[tokio::test]
async fn unread_count_sums_across_counterparts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(3)]])
        .into_connection();

    let response = UnreadCountUseCase::execute(&db, Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(response.unread_count, 3);
}
