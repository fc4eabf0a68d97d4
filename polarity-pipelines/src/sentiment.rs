use std::collections::HashMap;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::ops::{sigmoid, softmax};
use polarity::{Error, FromPretrainedParameters, Result};
use polarity_models::{
    AutoModelForSequenceClassification, ClassifierInput, ProblemType, SequenceClassificationModel,
};
use polarity_tokenizers::{AutoTokenizer, BatchEncoding, Tokenizer};
use serde::Serialize;

/// The sentiment predicted for one input text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sentiment {
    /// The label chosen by the model.
    pub label: String,
    /// The model's confidence in the chosen label, in `[0, 1]`.
    pub score: f32,
}

/// A pipeline for classifying the sentiment of texts with a pretrained
/// sequence classification model.
pub struct SentimentPipeline {
    model: Box<dyn SequenceClassificationModel>,
    tokenizer: Box<dyn Tokenizer>,
    device: Device,
}

impl SentimentPipeline {
    /// Creates a new `SentimentPipeline`, loading the model and the tokenizer
    /// of the provided repository from the Hugging Face Hub. Any error
    /// returned here is a model-load failure: the identifier could not be
    /// resolved, a required file could not be fetched, or the checkpoint uses
    /// an unsupported architecture.
    ///
    /// # Arguments
    ///
    /// * `identifier` - The repository id of the model to load.
    /// * `device` - The device to run the model on.
    /// * `dtype` - Optional dtype override for the model weights.
    /// * `params` - Optional parameters to specify the revision and auth token.
    ///
    /// # Returns
    ///
    /// The `SentimentPipeline` instance.
    pub fn new<S: AsRef<str> + Copy>(
        identifier: S,
        device: &Device,
        dtype: Option<DType>,
        params: Option<FromPretrainedParameters>,
    ) -> Result<Self> {
        tracing::info!(model = identifier.as_ref(), "loading sentiment pipeline");
        let model = AutoModelForSequenceClassification::from_pretrained(
            identifier,
            device,
            dtype,
            params.clone(),
        )?;
        let tokenizer = AutoTokenizer::from_pretrained(identifier, params)?;
        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
        })
    }

    fn preprocess(&self, inputs: Vec<String>) -> Result<BatchEncoding> {
        let mut encodings = self.tokenizer.encode(inputs, true)?;
        encodings.to_device(&self.device)?;
        Ok(encodings)
    }

    fn postprocess(&self, logits: &Tensor) -> Result<Vec<Sentiment>> {
        let config = self.model.config();
        let id2label = config.get_id2label().ok_or(Error::MissingLabelMapping)?;

        let problem_type = config.get_problem_type();
        let scores = {
            if *problem_type == ProblemType::MultiLabelClassification || config.num_labels() == 1 {
                sigmoid(logits)?
            } else {
                softmax(logits, D::Minus1)?
            }
        }
        .to_dtype(DType::F32)?
        .to_vec2::<f32>()?;

        resolve_labels(&scores, id2label)
    }

    /// Classifies the sentiment of a single text.
    ///
    /// # Arguments
    ///
    /// * `input` - The input text to classify.
    ///
    /// # Returns
    ///
    /// The predicted label and the confidence score.
    pub fn classify<I: Into<String>>(&self, input: I) -> Result<Sentiment> {
        let mut results = self.classify_batch(vec![input.into()])?;
        Ok(results.remove(0))
    }

    /// Classifies the sentiment of a batch of texts. The output has the same
    /// length as the input and result `i` belongs to input `i`. An empty
    /// batch is a no-op and returns an empty `Vec` without running the model.
    ///
    /// # Arguments
    ///
    /// * `inputs` - The input texts to classify.
    ///
    /// # Returns
    ///
    /// The predicted label and the confidence score for each text.
    pub fn classify_batch<I: Into<String>>(&self, inputs: Vec<I>) -> Result<Vec<Sentiment>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let inputs: Vec<String> = inputs.into_iter().map(|x| x.into()).collect();
        let encodings = self.preprocess(inputs)?;
        let logits = self.model.forward(ClassifierInput::from(&encodings))?;
        self.postprocess(&logits)
    }
}

/// Picks the highest-scoring label for every row of a score matrix. Rows stay
/// in input order; row `i` of the output belongs to row `i` of `scores`.
fn resolve_labels(
    scores: &[Vec<f32>],
    id2label: &HashMap<usize, String>,
) -> Result<Vec<Sentiment>> {
    let mut results = Vec::with_capacity(scores.len());
    for row in scores {
        let (label_id, score) = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .ok_or_else(|| Error::msg("empty score row"))?;
        let label = id2label
            .get(&label_id)
            .ok_or(Error::MissingLabelMapping)?
            .clone();
        results.push(Sentiment {
            label,
            score: *score,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id2label() -> HashMap<usize, String> {
        [(0, "negative"), (1, "neutral"), (2, "positive")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect()
    }

    #[test]
    fn resolve_labels_preserves_order_and_length() {
        let scores = vec![
            vec![0.1, 0.2, 0.7],
            vec![0.8, 0.15, 0.05],
            vec![0.2, 0.5, 0.3],
        ];
        let results = resolve_labels(&scores, &id2label()).unwrap();
        assert_eq!(results.len(), scores.len());
        assert_eq!(results[0].label, "positive");
        assert_eq!(results[1].label, "negative");
        assert_eq!(results[2].label, "neutral");
    }

    #[test]
    fn resolve_labels_reports_the_winning_score() {
        let scores = vec![vec![0.25, 0.05, 0.7]];
        let results = resolve_labels(&scores, &id2label()).unwrap();
        assert!((results[0].score - 0.7).abs() < f32::EPSILON);
        assert!(results[0].score >= 0.0 && results[0].score <= 1.0);
    }

    #[test]
    fn resolve_labels_of_nothing_is_nothing() {
        let results = resolve_labels(&[], &id2label()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn resolve_labels_fails_on_unmapped_label_id() {
        let scores = vec![vec![0.1, 0.9]];
        let only_one = [(0, "negative".to_string())].into_iter().collect();
        assert!(resolve_labels(&scores, &only_one).is_err());
    }
}
