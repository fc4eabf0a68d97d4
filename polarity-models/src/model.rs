use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use polarity::Result;

use crate::config::PretrainedConfig;
use crate::from_pretrained::from_pretrained;
use crate::models::bert::BertForSequenceClassification;
use crate::models::roberta::RobertaForSequenceClassification;

/// The dtype classification checkpoints are loaded with unless the caller
/// overrides it.
pub const CLASSIFIER_DTYPE: DType = DType::F32;

/// The tensors a sequence classification model consumes in one forward pass.
pub struct ClassifierInput<'a> {
    pub input_ids: &'a Tensor,
    pub attention_mask: &'a Tensor,
    pub token_type_ids: Option<&'a Tensor>,
}

#[cfg(feature = "tokenizers")]
impl<'a> From<&'a polarity_tokenizers::BatchEncoding> for ClassifierInput<'a> {
    fn from(encodings: &'a polarity_tokenizers::BatchEncoding) -> Self {
        Self {
            input_ids: encodings.get_input_ids(),
            attention_mask: encodings.get_attention_mask(),
            token_type_ids: Some(encodings.get_token_type_ids()),
        }
    }
}

/// Trait for a pretrained sequence classification model.
pub trait SequenceClassificationModel: Send + Sync {
    fn load(vb: VarBuilder, config: serde_json::Value) -> Result<Self>
    where
        Self: Sized;
    fn config(&self) -> &PretrainedConfig;
    /// Runs the model over a batch and returns the classification logits with
    /// shape `(batch_size, num_labels)`.
    fn forward(&self, input: ClassifierInput) -> Result<Tensor>;
}

/// Loads the appropriate `SequenceClassificationModel` for a Hugging Face Hub
/// repository, dispatching on the `model_type` declared in `config.json`.
pub struct AutoModelForSequenceClassification {}

impl AutoModelForSequenceClassification {
    /// Loads a model from the Hugging Face Hub.
    ///
    /// # Arguments
    ///
    /// * `repo_id` - The repository id of the model to load.
    /// * `device` - The device to run the model on.
    /// * `dtype` - The numeric type in which the model parameters should be loaded.
    /// * `params` - Optional parameters to specify the revision and auth token.
    ///
    /// # Returns
    ///
    /// The loaded model.
    pub fn from_pretrained<S: AsRef<str>>(
        repo_id: S,
        device: &Device,
        dtype: Option<DType>,
        params: Option<polarity::FromPretrainedParameters>,
    ) -> Result<Box<dyn SequenceClassificationModel>> {
        let model_info = from_pretrained(repo_id.as_ref(), params)?;
        let config = model_info
            .get_config()
            .ok_or_else(|| polarity::Error::msg("Model config not found. Cannot load the model."))?
            .clone();
        let model_type = config["model_type"].as_str().unwrap_or_default().to_string();

        let dtype = dtype.unwrap_or(CLASSIFIER_DTYPE);
        let vb = model_info.get_var_builder(dtype, device)?;

        match model_type.as_str() {
            "bert" => Ok(Box::new(BertForSequenceClassification::load(vb, config)?)),
            "roberta" => Ok(Box::new(RobertaForSequenceClassification::load(vb, config)?)),
            _ => Err(polarity::Error::ModelNotImplemented(model_type)),
        }
    }
}
