//! Integration tests for LlmClient against a local Ollama server
//!
//! These tests require FINQA_TEST_OLLAMA_MODEL naming a pulled model.
//! They are skipped if it is not set.

mod common;

use common::{create_test_client, get_ollama_model, multiply_registry};
use finqa_core::{AgenticConfig, AgenticResponder, DirectResponder, LlmRequest, Responder};
use std::sync::Arc;

#[tokio::test]
#[ignore] // Requires a local Ollama server
async fn test_generate_simple_prompt() {
    let Some(model) = get_ollama_model() else {
        eprintln!("Skipping test: FINQA_TEST_OLLAMA_MODEL not set");
        return;
    };

    let client = create_test_client(&model);
    let request = LlmRequest::new("What is 2 + 2? Reply with just the number.");

    match client.generate(request).await {
        Ok(resp) => {
            println!("Response: {}", resp.text);
            println!("Tokens used: {:?}", resp.tokens_used);
            assert!(resp.text.contains('4'), "Response should contain '4', got: {}", resp.text);
        }
        Err(e) => panic!("Generate failed: {:?}", e),
    }
}

#[tokio::test]
#[ignore] // Requires a local Ollama server
async fn test_direct_responder_live() {
    let Some(model) = get_ollama_model() else {
        eprintln!("Skipping test: FINQA_TEST_OLLAMA_MODEL not set");
        return;
    };

    let responder = DirectResponder::new(Arc::new(create_test_client(&model)));
    let generation = responder.generate("What does ROI stand for?").await;

    println!("Response: {}", generation.response);
    assert!(!generation.is_failure(), "{}", generation.response);
}

#[tokio::test]
#[ignore] // Requires a local Ollama server with a tool-capable model
async fn test_agentic_responder_live() {
    let Some(model) = get_ollama_model() else {
        eprintln!("Skipping test: FINQA_TEST_OLLAMA_MODEL not set");
        return;
    };

    let responder = AgenticResponder::new(
        Arc::new(create_test_client(&model)),
        multiply_registry(),
        AgenticConfig::default(),
    )
    .unwrap();
    let generation = responder.generate("What is 37 multiplied by 43?").await;

    println!("Response: {}", generation.response);
    println!("Trace: {:?}", generation.trace);
    assert!(!generation.is_failure(), "{}", generation.response);
}
