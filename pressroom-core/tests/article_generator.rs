use pressroom_core::assistant::{MockAssistant, RunContext};
use pressroom_core::contract::ContentGenerator;
use pressroom_core::generators::article::{factory, ArticleGenerator};
use pressroom_core::request::{ContentRequest, GeneratorConfig};
use serde_json::{json, Map, Value};
use uuid::Uuid;

const SECTION_BODY: &str = "Para one. Still one.\n\nToo short.\n\nPara two. Yes two!";

fn request(body: Value) -> ContentRequest {
    match body {
        Value::Object(map) => ContentRequest::new(Uuid::new_v4(), map),
        _ => panic!("body must be an object"),
    }
}

fn outline(sections: usize) -> Value {
    let sections: Vec<Value> = (1..=sections)
        .map(|i| json!({ "title": format!("Part {i}"), "brief": format!("Brief {i}") }))
        .collect();
    json!({ "title": "Rust in Practice", "sections": sections })
}

#[tokio::test]
async fn writes_one_section_per_outline_entry() {
    let mut assistant = MockAssistant::new();
    assistant
        .expect_structured_ask()
        .withf(|_, _, prompt, schema| {
            prompt.contains("ownership") && schema["required"] == json!(["title", "sections"])
        })
        .times(1)
        .returning(|_, _, _, _| Ok(outline(2)));
    assistant
        .expect_ask()
        .times(2)
        .returning(|_, _, _| Ok(SECTION_BODY.to_string()));

    let generator = ArticleGenerator::from_config(&GeneratorConfig::default());
    let doc = generator
        .generate(
            &RunContext::default(),
            &request(json!({ "topic": "ownership", "sections": 2 })),
            &assistant,
        )
        .await
        .unwrap();

    assert_eq!(doc.title, "Rust in Practice");
    assert_eq!(doc.author, "Pressroom");
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.sections[1].title, "Part 2");
    assert_eq!(
        doc.sections[0].paragraphs,
        vec!["Para one. Still one.", "Para two. Yes two!"]
    );
}

#[tokio::test]
async fn section_count_limits_the_asks() {
    let mut assistant = MockAssistant::new();
    assistant
        .expect_structured_ask()
        .returning(|_, _, _, _| Ok(outline(3)));
    assistant
        .expect_ask()
        .times(1)
        .returning(|_, _, _| Ok(SECTION_BODY.to_string()));

    let doc = ArticleGenerator::new("Ann")
        .generate(
            &RunContext::default(),
            &request(json!({ "topic": "lifetimes", "sections": 1 })),
            &assistant,
        )
        .await
        .unwrap();

    assert_eq!(doc.author, "Ann");
    assert_eq!(doc.sections.len(), 1);
}

#[tokio::test]
async fn author_comes_from_config() {
    let mut options = Map::new();
    options.insert("author".into(), json!("Jane Doe"));
    let generator = factory(GeneratorConfig::new(options).unwrap()).unwrap();

    let mut assistant = MockAssistant::new();
    assistant
        .expect_structured_ask()
        .returning(|_, _, _, _| Ok(outline(1)));
    assistant
        .expect_ask()
        .withf(|_, _, prompt| prompt.contains("Part 1"))
        .returning(|_, _, _| Ok(SECTION_BODY.to_string()));

    let doc = generator
        .generate(
            &RunContext::default(),
            &request(json!({ "topic": "traits" })),
            &assistant,
        )
        .await
        .unwrap();
    assert_eq!(doc.author, "Jane Doe");
}

#[tokio::test]
async fn missing_topic_fails_before_asking() {
    let assistant = MockAssistant::new();
    let err = ArticleGenerator::new("Ann")
        .generate(&RunContext::default(), &request(json!({ "sections": 2 })), &assistant)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("topic"));
}

#[tokio::test]
async fn assistant_failure_propagates() {
    let mut assistant = MockAssistant::new();
    assistant
        .expect_structured_ask()
        .returning(|_, _, _, _| {
            Err(pressroom_core::assistant::AssistantError::Blocked("SAFETY".into()))
        });

    let err = ArticleGenerator::new("Ann")
        .generate(&RunContext::default(), &request(json!({ "topic": "x" })), &assistant)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("blocked"));
}

#[tokio::test]
async fn malformed_outline_is_an_error() {
    let mut assistant = MockAssistant::new();
    assistant
        .expect_structured_ask()
        .returning(|_, _, _, _| Ok(json!({ "headline": "no sections" })));

    let result = ArticleGenerator::new("Ann")
        .generate(&RunContext::default(), &request(json!({ "topic": "x" })), &assistant)
        .await;
    assert!(result.is_err());
}

#[test]
fn model_key_must_be_a_string() {
    let mut options = Map::new();
    options.insert("model".into(), json!(3));
    assert!(GeneratorConfig::new(options).is_err());
}
