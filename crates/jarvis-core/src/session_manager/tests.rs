use super::*;
use jarvis_memory::SqliteStore;

async fn manager(window: u32) -> SessionManager {
    let store = SqliteStore::in_memory().await.unwrap();
    SessionManager::new(
        Arc::new(store),
        SessionConfig::default().with_history_window(window),
    )
}

#[tokio::test]
async fn test_first_contact_creates_default_user() {
    let sessions = manager(20).await;
    let session = sessions
        .get_or_create_conversation("sess-1", "echo-kitchen")
        .await
        .unwrap();

    assert!(session.started);
    assert_eq!(session.user.name, DEFAULT_USER_NAME);
    assert_eq!(session.user.role, Role::Adult);
    assert_eq!(session.conversation.session_id, "sess-1");

    let again = sessions
        .get_or_create_conversation("sess-1", "echo-kitchen")
        .await
        .unwrap();
    assert!(!again.started);
    assert_eq!(again.conversation.id, session.conversation.id);
    assert_eq!(again.user.id, session.user.id);
}

#[tokio::test]
async fn test_closed_session_is_never_resumed() {
    let sessions = manager(20).await;
    let first = sessions
        .get_or_create_conversation("sess-1", "echo-kitchen")
        .await
        .unwrap();
    sessions.close(first.conversation.id, None).await.unwrap();

    let second = sessions
        .get_or_create_conversation("sess-1", "echo-kitchen")
        .await
        .unwrap();
    assert!(second.started);
    assert_ne!(second.conversation.id, first.conversation.id);
}

#[tokio::test]
async fn test_session_owned_by_other_user() {
    let sessions = manager(20).await;
    sessions
        .get_or_create_conversation("shared", "device-a")
        .await
        .unwrap();

    let err = sessions
        .get_or_create_conversation("shared", "device-b")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Authorization(_)));
}

#[tokio::test]
async fn test_history_window_is_a_view() {
    let sessions = manager(3).await;
    let session = sessions
        .get_or_create_conversation("sess-1", "echo-kitchen")
        .await
        .unwrap();
    let id = session.conversation.id;

    for i in 0..5 {
        sessions
            .append_message(id, NewMessage::user(format!("question {i}")))
            .await
            .unwrap();
    }

    let window = sessions.recent_history(id).await.unwrap();
    let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["question 2", "question 3", "question 4"]);

    assert_eq!(sessions.transcript(id).await.unwrap().len(), 5);
    let closed = sessions.close(id, Some("Asked five questions")).await.unwrap();
    assert_eq!(closed.message_count, 5);
}

#[test]
fn test_history_conversion_drops_tool_results() {
    let conversation_id = Uuid::new_v4();
    let make = |seq: i64, new: NewMessage| ConversationMessage {
        id: Uuid::new_v4(),
        conversation_id,
        seq,
        role: new.role,
        content: new.content,
        tool_name: new.tool_name,
        tool_call_id: new.tool_call_id,
        created_at: chrono::Utc::now(),
    };
    let history = vec![
        make(1, NewMessage::user("what's the time")),
        make(2, NewMessage::tool("get_current_time", "call_0", "{}")),
        make(3, NewMessage::assistant("It's noon.")),
    ];

    let messages = history_to_messages(&history);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);

    assert_eq!(
        render_transcript(&history),
        "User: what's the time\nAssistant: It's noon."
    );
}

#[tokio::test]
async fn test_tool_rows_do_not_shrink_history() {
    let sessions = manager(4).await;
    let session = sessions
        .get_or_create_conversation("sess-tools", "echo-kitchen")
        .await
        .unwrap();
    let id = session.conversation.id;

    sessions
        .append_message(id, NewMessage::user("add milk"))
        .await
        .unwrap();
    sessions
        .append_message(id, NewMessage::assistant("Added milk."))
        .await
        .unwrap();
    sessions
        .append_message(id, NewMessage::user("add eggs, bread and rice"))
        .await
        .unwrap();
    for (i, item) in ["eggs", "bread", "rice"].iter().enumerate() {
        sessions
            .append_message(
                id,
                NewMessage::tool(
                    "add_to_grocery_list",
                    format!("call_{i}"),
                    format!("{{\"added\":\"{item}\"}}"),
                ),
            )
            .await
            .unwrap();
    }
    sessions
        .append_message(id, NewMessage::assistant("Added eggs, bread and rice."))
        .await
        .unwrap();

    let window = sessions.recent_history(id).await.unwrap();
    let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec![
            "add milk",
            "Added milk.",
            "add eggs, bread and rice",
            "Added eggs, bread and rice."
        ]
    );
    assert_eq!(history_to_messages(&window).len(), 4);
}
