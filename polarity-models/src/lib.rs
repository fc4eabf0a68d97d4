pub mod config;
pub mod encoder;
pub mod from_pretrained;
pub mod model;
pub mod models;

pub use config::{EncoderConfig, PretrainedConfig, ProblemType};
pub use model::{
    AutoModelForSequenceClassification, ClassifierInput, SequenceClassificationModel,
    CLASSIFIER_DTYPE,
};

// BERT
pub use models::bert::BertForSequenceClassification;

// RoBERTa
pub use models::roberta::RobertaForSequenceClassification;
