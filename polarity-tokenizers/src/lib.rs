pub mod config;
pub mod encoding;
pub mod from_pretrained;
pub mod tokenizer;
pub mod tokenizers;

pub use config::TokenizerConfig;
pub use encoding::BatchEncoding;
pub use from_pretrained::{FromPretrainedParameters, TokenizerInfo};
pub use tokenizer::{AutoTokenizer, Tokenizer};
pub use tokenizers::bert::BertTokenizer;
pub use tokenizers::roberta::RobertaTokenizer;
