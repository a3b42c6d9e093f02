mod common;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use arogya_core::models::escalation::EscalationStatus;
use arogya_core::models::intake::Locale;
use arogya_intake::error::InboxError;
use arogya_intake::escalation::memory::MemoryInbox;
use arogya_intake::escalation::{EscalationDispatcher, EscalationInbox, ResponseDelivery};

use common::{FlakyInbox, UnsteadyInbox, subject, transcript};

#[test]
fn prepare_splits_complaint_from_follow_ups() {
    let dispatcher = EscalationDispatcher::new(Arc::new(MemoryInbox::new()));
    let subject = subject();
    let session_id = Uuid::new_v4();

    let receipt = dispatcher.prepare(
        session_id,
        &subject,
        Locale::Local,
        &transcript(&["पेट में दर्द", "दो दिन से", "नहीं"]),
    );

    assert_eq!(receipt.problem_description, "पेट में दर्द");
    assert_eq!(receipt.follow_up_answers, ["दो दिन से", "नहीं"]);
    assert_eq!(receipt.status, EscalationStatus::Pending);
    assert_eq!(receipt.session_id, session_id);
    assert_eq!(receipt.subject_id, subject.id);
    assert_eq!(receipt.subject_contact.name, "Asha Devi");
    assert_eq!(receipt.subject_contact.location.as_deref(), Some("Sitapur"));
    assert_eq!(receipt.locale, Locale::Local);
    assert!(receipt.response.is_none());

    let other = dispatcher.prepare(session_id, &subject, Locale::Local, &transcript(&["x"]));
    assert_ne!(receipt.id, other.id);
}

#[tokio::test]
async fn submit_publishes_to_inbox() {
    let inbox = Arc::new(MemoryInbox::new());
    let dispatcher = EscalationDispatcher::new(inbox.clone());

    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["rash", "a week"]))
        .await;

    assert_eq!(inbox.fetch(receipt.id).await.unwrap(), Some(receipt.clone()));
    assert!(matches!(
        inbox.publish(&receipt).await,
        Err(InboxError::Duplicate(id)) if id == receipt.id
    ));
    assert_eq!(inbox.list().len(), 1);
}

#[tokio::test]
async fn failed_publish_is_retried() {
    let inbox = FlakyInbox::new(2);
    let dispatcher = EscalationDispatcher::new(inbox.clone());

    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["fall"]))
        .await;
    assert_eq!(dispatcher.pending_retries(), [receipt.clone()]);

    assert_eq!(dispatcher.retry_pending().await, 0);
    assert_eq!(dispatcher.pending_retries().len(), 1);

    assert_eq!(dispatcher.retry_pending().await, 1);
    assert!(dispatcher.pending_retries().is_empty());
    assert_eq!(inbox.inner.fetch(receipt.id).await.unwrap(), Some(receipt));
}

#[tokio::test]
async fn push_delivery_sees_reviewer_response() {
    let inbox = Arc::new(MemoryInbox::new());
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["dizzy"]))
        .await;

    let reviewer = inbox.clone();
    let id = receipt.id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        reviewer.respond(id, "dr-mehta", "Visit the PHC tomorrow").unwrap();
    });

    let answered = dispatcher
        .await_response(id, &ResponseDelivery::Push, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(answered.status, EscalationStatus::Responded);
    let response = answered.response.unwrap();
    assert_eq!(response.reviewer, "dr-mehta");
    assert_eq!(response.message, "Visit the PHC tomorrow");
}

#[tokio::test]
async fn poll_delivery_sees_reviewer_response() {
    let inbox = Arc::new(MemoryInbox::new());
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["swelling"]))
        .await;

    let reviewer = inbox.clone();
    let id = receipt.id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        reviewer.respond(id, "dr-rao", "Apply ice").unwrap();
    });

    let delivery = ResponseDelivery::Poll {
        interval: Duration::from_millis(20),
    };
    let answered = dispatcher
        .await_response(id, &delivery, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(answered.response.unwrap().message, "Apply ice");
}

#[tokio::test]
async fn polling_outlasts_a_failed_read() {
    let inbox = UnsteadyInbox::new(2);
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["back pain"]))
        .await;

    let reviewer = inbox.clone();
    let id = receipt.id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        reviewer.inner.respond(id, "dr-rao", "Rest and a warm compress").unwrap();
    });

    let delivery = ResponseDelivery::Poll {
        interval: Duration::from_millis(20),
    };
    let answered = dispatcher
        .await_response(id, &delivery, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(answered.status, EscalationStatus::Responded);
    assert!(inbox.reads() > 2);
}

#[tokio::test]
async fn push_fallback_outlasts_a_failed_first_read() {
    // No subscription on this inbox, so push falls back to polling.
    let inbox = UnsteadyInbox::new(1);
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["cough"]))
        .await;
    inbox.inner.respond(receipt.id, "dr-mehta", "Steam inhalation").unwrap();

    let answered = dispatcher
        .await_response(receipt.id, &ResponseDelivery::Push, Duration::from_secs(8))
        .await
        .unwrap();
    assert_eq!(answered.response.unwrap().message, "Steam inhalation");
}

#[tokio::test]
async fn already_answered_receipt_returns_at_once() {
    let inbox = Arc::new(MemoryInbox::new());
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["cut"]))
        .await;
    inbox.respond(receipt.id, "dr-rao", "Clean and bandage").unwrap();

    let answered = dispatcher
        .await_response(receipt.id, &ResponseDelivery::Push, Duration::from_millis(200))
        .await
        .unwrap();
    assert!(!answered.is_pending());
    assert!(matches!(
        inbox.respond(receipt.id, "dr-rao", "again"),
        Err(InboxError::AlreadyResponded(_))
    ));
}

#[tokio::test]
async fn no_response_before_deadline() {
    let inbox = Arc::new(MemoryInbox::new());
    let dispatcher = EscalationDispatcher::new(inbox.clone());
    let receipt = dispatcher
        .submit(Uuid::new_v4(), &subject(), Locale::Default, &transcript(&["itch"]))
        .await;

    let result = dispatcher
        .await_response(receipt.id, &ResponseDelivery::Push, Duration::from_millis(50))
        .await;
    assert!(matches!(result, Err(InboxError::Deadline(id)) if id == receipt.id));
}

#[test]
fn responding_to_unknown_receipt_fails() {
    let inbox = MemoryInbox::new();
    let id = Uuid::new_v4();
    assert!(matches!(inbox.respond(id, "dr", "msg"), Err(InboxError::NotFound(found)) if found == id));
}
