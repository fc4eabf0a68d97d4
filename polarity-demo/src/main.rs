#[cfg(feature = "accelerate")]
extern crate accelerate_src;

#[cfg(feature = "mkl")]
extern crate intel_mkl_src;

mod report;

use std::sync::Arc;

use anyhow::Result;
use candle_core::Device;
use polarity_pipelines::{PipelineCache, SentimentPipeline};

const GENERAL_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";
const CHINESE_MODEL: &str = "uer/roberta-base-finetuned-dianping-chinese";

const BANNER_WIDTH: usize = 50;

fn get_device() -> Result<Device> {
    let device = if cfg!(feature = "cuda") {
        Device::new_cuda(0)?
    } else if cfg!(feature = "metal") {
        Device::new_metal(0)?
    } else {
        Device::Cpu
    };
    Ok(device)
}

/// Runs one scenario against a freshly resolved pipeline. A failed model load
/// is reported and the scenario is skipped; errors raised by the scenario
/// itself keep propagating.
fn with_pipeline<T>(
    loaded: polarity::Result<Arc<SentimentPipeline>>,
    scenario: impl FnOnce(&SentimentPipeline) -> Result<T>,
) -> Result<Option<T>> {
    match loaded {
        Ok(pipeline) => scenario(&pipeline).map(Some),
        Err(e) => {
            tracing::warn!(error = %e, "model load failed, skipping scenario");
            println!("Model failed to load: {e}");
            println!("Hint: on a slow network the checkpoint download can take a while.");
            Ok(None)
        }
    }
}

fn banner(title: &str) {
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(BANNER_WIDTH));
}

fn section(title: &str) {
    println!("{title}");
    println!("{}", "-".repeat(BANNER_WIDTH));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let device = get_device()?;
    let cache = PipelineCache::new();
    let load = |identifier: &str| {
        cache.get_or_load(identifier, || {
            SentimentPipeline::new(identifier, &device, None, None)
        })
    };

    banner("Sentiment analysis demo");
    println!();

    section("Example 1: single text");
    with_pipeline(load(GENERAL_MODEL), |pipeline| {
        let text = "I love this product! It's amazing and works perfectly.";
        let result = pipeline.classify(text)?;
        print!("{}", report::single(text, &result));
        Ok(())
    })?;
    println!();

    section("Example 2: batch of texts");
    with_pipeline(load(GENERAL_MODEL), |pipeline| {
        let texts: Vec<String> = [
            "This is the best day ever!",
            "I'm feeling really sad today.",
            "The weather is okay, nothing special.",
            "I'm extremely happy with the service!",
            "This is terrible, I hate it.",
        ]
        .map(String::from)
        .to_vec();
        let results = pipeline.classify_batch(texts.clone())?;
        print!("{}", report::table(&texts, &results));
        Ok(())
    })?;
    println!();

    section("Example 3: Chinese texts");
    with_pipeline(load(CHINESE_MODEL), |pipeline| {
        let texts: Vec<String> = [
            "这个产品太棒了！我非常喜欢。",
            "今天心情很糟糕，什么都不顺利。",
            "一般般吧，没什么特别的。",
        ]
        .map(String::from)
        .to_vec();
        let results = pipeline.classify_batch(texts.clone())?;
        print!("{}", report::table(&texts, &results));
        Ok(())
    })?;
    println!();

    banner("Done.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polarity::Error;

    #[test]
    fn load_failure_is_contained_by_the_scenario_boundary() {
        let outcome = with_pipeline(Err(Error::ModelWeightsNotFound), |_pipeline| -> Result<()> {
            panic!("scenario must not run when the model failed to load");
        });
        assert!(matches!(outcome, Ok(None)));
    }
}
