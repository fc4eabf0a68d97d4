//! Scenario tests for the sentiment pipeline. These download checkpoints from
//! the Hugging Face Hub. Run with: cargo test --features integration

#![cfg(feature = "integration")]

use candle_core::Device;
use polarity_pipelines::SentimentPipeline;

const GENERAL_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

fn general_pipeline() -> SentimentPipeline {
    SentimentPipeline::new(GENERAL_MODEL, &Device::Cpu, None, None).unwrap()
}

#[test]
fn single_positive_text_is_labeled_positive() {
    let pipeline = general_pipeline();
    let result = pipeline
        .classify("I love this product! It's amazing and works perfectly.")
        .unwrap();
    assert_eq!(result.label, "positive");
    assert!(result.score > 0.5);
    assert!(result.score <= 1.0);
}

#[test]
fn batch_results_align_with_inputs() {
    let pipeline = general_pipeline();
    let texts = vec![
        "This is the best day ever!",
        "I'm feeling really sad today.",
        "The weather is okay, nothing special.",
        "I'm extremely happy with the service!",
        "This is terrible, I hate it.",
    ];
    let results = pipeline.classify_batch(texts.clone()).unwrap();

    assert_eq!(results.len(), texts.len());
    for result in &results {
        assert!(result.score >= 0.0 && result.score <= 1.0);
    }
    assert_eq!(results[0].label, "positive");
    assert_eq!(results[3].label, "positive");
    assert_eq!(results[4].label, "negative");
}

#[test]
fn single_and_one_element_batch_agree() {
    let pipeline = general_pipeline();
    let text = "The weather is okay, nothing special.";
    let single = pipeline.classify(text).unwrap();
    let batch = pipeline.classify_batch(vec![text]).unwrap();
    assert_eq!(single.label, batch[0].label);
}

#[test]
fn empty_batch_is_a_noop() {
    let pipeline = general_pipeline();
    let results = pipeline.classify_batch(Vec::<String>::new()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn unknown_repository_fails_to_load() {
    let result = SentimentPipeline::new(
        "polarity-tests/definitely-not-a-model",
        &Device::Cpu,
        None,
        None,
    );
    assert!(result.is_err());
}
