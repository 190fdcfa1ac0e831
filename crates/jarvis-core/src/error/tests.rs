use super::*;

#[test]
fn test_transport_detection() {
    assert!(Error::Transport("store down".into()).is_transport());
    assert!(Error::Llm(jarvis_llm::Error::Timeout(30_000)).is_transport());
    assert!(!Error::Llm(jarvis_llm::Error::InvalidResponse("empty".into())).is_transport());
    assert!(!Error::Authorization("child".into()).is_transport());
}

#[test]
fn test_invalid_transition_message() {
    let error = Error::InvalidTransition {
        order_id: Uuid::new_v4(),
        from: OrderStatus::Delivered,
        to: OrderStatus::Pending,
    };

    assert!(error.is_policy_denial());
    assert!(error.to_string().contains("delivered to pending"));
    assert_eq!(
        error.user_message(),
        "That order is already delivered, so I can't mark it pending."
    );
    assert!(error.suggestion().is_none());
}

#[test]
fn test_authorization_message() {
    let error = Error::Authorization("maid cannot approve".into());
    let spoken = format_error_for_voice(&error);
    assert!(spoken.starts_with("Sorry, you're not allowed"));
    assert!(spoken.contains("Ask an adult"));
}

#[test]
fn test_store_failure_is_degraded_reply() {
    let error = Error::Store(jarvis_memory::Error::Internal("disk full".into()));
    assert_eq!(error.user_message(), DEGRADED_REPLY);
}

#[test]
fn test_messages_are_speakable() {
    let errors = vec![
        Error::Transport("x".into()),
        Error::Tool(jarvis_tools::Error::InvalidArgs("city missing".into())),
        Error::Extraction("bad json".into()),
        Error::NotFound {
            entity: "order",
            id: "42".into(),
        },
        Error::Configuration("no key".into()),
        Error::Internal("boom".into()),
    ];

    for error in errors {
        let spoken = format_error_for_voice(&error);
        assert!(spoken.is_ascii(), "not speakable: {spoken}");
        assert!(!spoken.contains('*') && !spoken.contains('#'));
    }
}
