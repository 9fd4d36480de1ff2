use assert_cmd::Command;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

const SECRETS: [&str; 3] = ["GEMINI_API_KEY", "TELEGRAPH_API_KEY", "MAIL_SENDER_PASSWORD"];
const JOB_VARS: [&str; 4] = ["REQUEST_ID", "REQUEST_BODY", "CONTENT_TYPE", "CONTENT_CONFIG"];

/// Creates a minimal config file for the CLI to read (secrets come from the environment).
fn create_minimal_config() -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"notifier:\n  smtp_server: smtp.example.com\n  sender_email: bot@example.com\n  recipient_email: me@example.com\n",
    )
    .expect("Writing temp config failed");
    config
}

/// The binary with every secret and job variable cleared.
fn pressroom() -> Command {
    let mut cmd = Command::cargo_bin("pressroom").expect("Binary exists");
    for name in SECRETS.iter().chain(JOB_VARS.iter()) {
        cmd.env_remove(name);
    }
    cmd
}

#[test]
fn clean_strips_markup_from_a_file() {
    let input = NamedTempFile::new().unwrap();
    write(
        input.path(),
        "# Heading\n\nSome **bold** and <em>tagged</em> text with \\textit{latex}.",
    )
    .unwrap();

    pressroom()
        .arg("clean")
        .arg("--input")
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Some bold and tagged text with latex."))
        .stdout(predicate::str::contains("**").not())
        .stdout(predicate::str::contains("<em>").not());
}

#[test]
fn clean_reads_stdin_when_no_input_is_given() {
    pressroom()
        .arg("clean")
        .write_stdin("A [link](https://example.com) here.")
        .assert()
        .success()
        .stdout(predicate::str::contains("A link here."));
}

#[test]
fn clean_fails_on_missing_input() {
    pressroom()
        .args(["clean", "--input", "/definitely/not/here.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn generators_lists_the_builtin_article_generator() {
    pressroom()
        .arg("generators")
        .assert()
        .success()
        .stdout(predicate::str::contains("article"));
}

#[test]
fn telegraph_token_requires_a_short_name() {
    pressroom()
        .arg("telegraph-token")
        .env_remove("TELEGRAPH_SHORT_NAME")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--short-name is required"));
}

#[test]
fn telegraph_token_prints_the_new_token() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/createAccount"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "ok": true, "result": { "access_token": "tok-42" } }),
            ))
            .mount(&server)
            .await;
        server
    });

    pressroom()
        .args(["telegraph-token", "--short-name", "pressroom", "--base-url"])
        .arg(server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("tok-42"));
}

#[test]
fn run_fails_without_a_config_file() {
    pressroom()
        .args(["run", "--config", "/definitely/not/here.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn run_fails_naming_the_missing_api_key() {
    let config = create_minimal_config();
    pressroom()
        .arg("run")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn run_rejects_an_invalid_request_id() {
    let config = create_minimal_config();
    let body = STANDARD.encode(r#"{"topic":"tides"}"#);
    let mut cmd = pressroom();
    for name in SECRETS {
        cmd.env(name, "dummy");
    }
    cmd.arg("run")
        .arg("--config")
        .arg(config.path())
        .env("REQUEST_ID", "not-a-uuid")
        .env("REQUEST_BODY", body)
        .env("CONTENT_TYPE", "article")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid request"));
}

#[test]
fn generate_rejects_a_non_object_body() {
    let config = create_minimal_config();
    pressroom()
        .arg("generate")
        .arg("--config")
        .arg(config.path())
        .args(["--generator", "article", "--body", "[1, 2]"])
        .env("GEMINI_API_KEY", "dummy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--body must be a JSON object"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_config_failure_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use pressroom::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Run {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    assert!(run(cli).await.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Failed to read config file")),
        "Expected a config failure event, got: {:?}",
        event_msgs
    );
}
