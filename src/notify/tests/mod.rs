//! Unit tests for notification adapters.

use crate::notify::adapters::{LogNotifier, RecordingNotifier};
use crate::notify::ports::{ChatMessage, ChatNotifier, Delivery, MailMessage, MailSender};
use rstest::rstest;


#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn log_notifier_reports_nothing_delivered() {
    let notifier = LogNotifier;

    let chat = notifier
        .post_message(&ChatMessage::new("C123", "hello"))
        .await
        .expect("logging never fails");
    let mail = notifier
        .send_plain_text(&MailMessage {
            to: vec!["ops@example.com".to_owned()],
            subject: "digest".to_owned(),
            body: "body".to_owned(),
        })
        .await
        .expect("logging never fails");

    assert_eq!(chat, Delivery::skipped());
    assert_eq!(mail, Delivery::skipped());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recording_notifier_keeps_messages_in_order() {
    let notifier = RecordingNotifier::new();

    let first = notifier
        .post_message(&ChatMessage::new("C1", "one").in_thread(Some("171.2".to_owned())))
        .await
        .expect("recording succeeds");
    notifier
        .post_message(&ChatMessage::new("C1", "two"))
        .await
        .expect("recording succeeds");

    let texts: Vec<_> = notifier
        .chat_messages()
        .into_iter()
        .map(|message| message.text)
        .collect();
    assert_eq!(texts, vec!["one", "two"]);
    assert_eq!(first, Delivery::delivered(Some("recorded-1".to_owned())));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejecting_notifier_records_but_reports_not_ok() {
    let notifier = RecordingNotifier::rejecting();

    let delivery = notifier
        .post_message(&ChatMessage::new("C1", "one"))
        .await
        .expect("recording succeeds");

    assert!(!delivery.ok);
    assert_eq!(notifier.chat_messages().len(), 1);
}
