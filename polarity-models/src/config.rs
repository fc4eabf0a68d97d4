use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// The type of problem the model was trained on.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub enum ProblemType {
    #[serde(rename = "regression")]
    Regression,
    #[serde(rename = "single_label_classification")]
    SingleLabelClassification,
    #[serde(rename = "multi_label_classification")]
    MultiLabelClassification,
    #[default]
    None,
}

/// The architecture-independent part of a pretrained model configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PretrainedConfig {
    /// The type of problem the model was trained on.
    #[serde(default)]
    problem_type: ProblemType,
    /// A map of the label ids to their corresponding labels.
    #[serde(default, deserialize_with = "deserialize_id2label")]
    id2label: Option<HashMap<usize, String>>,
}

impl PretrainedConfig {
    pub fn get_problem_type(&self) -> &ProblemType {
        &self.problem_type
    }

    pub fn get_id2label(&self) -> Option<&HashMap<usize, String>> {
        self.id2label.as_ref()
    }

    /// Gets the number of labels the model was trained on.
    pub fn num_labels(&self) -> usize {
        self.id2label.as_ref().map(|m| m.len()).unwrap_or(0)
    }
}

fn deserialize_id2label<'de, D>(deserializer: D) -> Result<Option<HashMap<usize, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<HashMap<String, String>> = Deserialize::deserialize(deserializer)?;
    map.map(|m| {
        m.into_iter()
            .map(|(k, v)| {
                k.parse::<usize>()
                    .map(|id| (id, v))
                    .map_err(serde::de::Error::custom)
            })
            .collect::<Result<HashMap<usize, String>, D::Error>>()
    })
    .transpose()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenAct {
    Gelu,
    Relu,
}

/// The configuration of a BERT-style encoder, deserialized from `config.json`.
/// BERT and RoBERTa checkpoints share every field here; they differ only in
/// embeddings semantics and the classification head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub hidden_act: HiddenAct,
    pub hidden_dropout_prob: f32,
    pub attention_probs_dropout_prob: f32,
    pub max_position_embeddings: usize,
    pub type_vocab_size: usize,
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub pad_token_id: usize,
    pub classifier_dropout: Option<f32>,
    pub model_type: Option<String>,

    #[serde(flatten, default)]
    pub pretrained_config: PretrainedConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBERTA_CONFIG: &str = r#"{
        "model_type": "roberta",
        "vocab_size": 50265,
        "hidden_size": 768,
        "num_hidden_layers": 12,
        "num_attention_heads": 12,
        "intermediate_size": 3072,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.1,
        "attention_probs_dropout_prob": 0.1,
        "max_position_embeddings": 514,
        "type_vocab_size": 1,
        "layer_norm_eps": 1e-05,
        "pad_token_id": 1,
        "classifier_dropout": null,
        "initializer_range": 0.02,
        "id2label": {"0": "negative", "1": "neutral", "2": "positive"}
    }"#;

    #[test]
    fn parses_classification_config() {
        let config: EncoderConfig = serde_json::from_str(ROBERTA_CONFIG).unwrap();
        assert_eq!(config.pad_token_id, 1);
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
        assert_eq!(config.pretrained_config.num_labels(), 3);
        assert_eq!(
            config
                .pretrained_config
                .get_id2label()
                .and_then(|m| m.get(&2))
                .map(String::as_str),
            Some("positive")
        );
    }

    #[test]
    fn problem_type_defaults_to_none() {
        let config: EncoderConfig = serde_json::from_str(ROBERTA_CONFIG).unwrap();
        assert_eq!(*config.pretrained_config.get_problem_type(), ProblemType::None);
    }

    #[test]
    fn missing_id2label_yields_zero_labels() {
        let config = PretrainedConfig::default();
        assert_eq!(config.num_labels(), 0);
        assert!(config.get_id2label().is_none());
    }
}
