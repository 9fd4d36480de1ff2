use pressroom::email::EmailNotifier;
use pressroom::load_config::NotifierSection;
use url::Url;

fn section() -> NotifierSection {
    NotifierSection {
        smtp_server: "smtp.example.com".to_string(),
        smtp_port: 587,
        sender_email: "bot@example.com".to_string(),
        recipient_email: "me@example.com".to_string(),
    }
}

#[tokio::test]
async fn message_carries_title_and_location() {
    let notifier = EmailNotifier::new(&section(), "password".to_string()).unwrap();
    let location = Url::parse("https://telegra.ph/Tides-10-16").unwrap();

    let message = notifier.message(&location, "Tides").unwrap();
    let formatted = String::from_utf8(message.formatted()).unwrap();

    assert!(formatted.contains("Subject: Tides"));
    assert!(formatted.contains("From: bot@example.com"));
    assert!(formatted.contains("To: me@example.com"));
    assert!(formatted.contains("Content-Type: text/plain"));
    assert!(formatted.contains("https://telegra.ph/Tides-10-16"));
}

#[tokio::test]
async fn invalid_sender_is_rejected() {
    let mut config = section();
    config.sender_email = "not an address".to_string();
    assert!(EmailNotifier::new(&config, "password".to_string()).is_err());
}
