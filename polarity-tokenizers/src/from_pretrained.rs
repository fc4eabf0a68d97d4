use std::{collections::HashMap, fs};

use hf_hub::api::sync::ApiRepo;
use lazy_static::lazy_static;
use polarity::{
    from_pretrained::{hub_repo, load_model_config, MODEL_CONFIG_FILE},
    Result,
};
use serde::{Deserialize, Deserializer, Serialize};
use tokenizers::{
    models::bpe::{Merges, Vocab},
    AddedToken,
};

use crate::config::TokenizerConfig;

pub use polarity::FromPretrainedParameters;

const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_TXT_FILE: &str = "vocab.txt";
const VOCAB_JSON_FILE: &str = "vocab.json";
const MERGES_FILE: &str = "merges.txt";
const SPECIAL_TOKENS_MAP_FILE: &str = "special_tokens_map.json";

lazy_static! {
    static ref MODEL_TYPE_TO_TOKENIZER_CLASS: HashMap<String, String> = {
        let mut map = HashMap::new();
        map.insert("bert".to_string(), "BertTokenizer".to_string());
        map.insert("roberta".to_string(), "RobertaTokenizer".to_string());
        map
    };
    static ref IGNORE_TOKENIZER_CLASSES: Vec<&'static str> = vec!["PreTrainedTokenizerFast"];
}

/// The special tokens a classification tokenizer may carry.
pub enum SpecialTokenName {
    Cls,
    Mask,
    Pad,
    Sep,
    Unk,
}

/// An [`AddedToken`] deserialized either from a bare string or from the full
/// object form used in `special_tokens_map.json`.
#[derive(Debug, Serialize, Deserialize)]
struct AddedTokenWithDefaults {
    added_token: AddedToken,
}

fn deserialize_special_token<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<AddedTokenWithDefaults>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(|v| {
        if let serde_json::Value::String(s) = v {
            Some(AddedTokenWithDefaults {
                added_token: AddedToken {
                    content: s,
                    single_word: false,
                    lstrip: false,
                    rstrip: false,
                    normalized: false,
                    special: true,
                },
            })
        } else {
            serde_json::from_value(v).ok()
        }
    })
}

/// The special tokens map of a tokenizer, from `special_tokens_map.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SpecialTokensMap {
    #[serde(deserialize_with = "deserialize_special_token", default)]
    cls_token: Option<AddedTokenWithDefaults>,
    #[serde(deserialize_with = "deserialize_special_token", default)]
    mask_token: Option<AddedTokenWithDefaults>,
    #[serde(deserialize_with = "deserialize_special_token", default)]
    pad_token: Option<AddedTokenWithDefaults>,
    #[serde(deserialize_with = "deserialize_special_token", default)]
    sep_token: Option<AddedTokenWithDefaults>,
    #[serde(deserialize_with = "deserialize_special_token", default)]
    unk_token: Option<AddedTokenWithDefaults>,
}

impl SpecialTokensMap {
    pub fn get_cls_token(&self) -> Option<&AddedToken> {
        self.cls_token.as_ref().map(|t| &t.added_token)
    }

    pub fn get_mask_token(&self) -> Option<&AddedToken> {
        self.mask_token.as_ref().map(|t| &t.added_token)
    }

    pub fn get_pad_token(&self) -> Option<&AddedToken> {
        self.pad_token.as_ref().map(|t| &t.added_token)
    }

    pub fn get_sep_token(&self) -> Option<&AddedToken> {
        self.sep_token.as_ref().map(|t| &t.added_token)
    }

    pub fn get_unk_token(&self) -> Option<&AddedToken> {
        self.unk_token.as_ref().map(|t| &t.added_token)
    }
}

/// Everything required to build a tokenizer for a Hub repository.
#[derive(Debug, Default)]
pub struct TokenizerInfo {
    /// The configuration of the tokenizer.
    pub config: Option<TokenizerConfig>,
    /// The configuration of the model.
    pub model_config: Option<serde_json::Value>,
    /// The path to the `tokenizer.json` file if it exists.
    pub tokenizer_file_path: Option<std::path::PathBuf>,
    /// The vocabulary of the tokenizer.
    pub vocab: Option<Vocab>,
    /// The merges of the tokenizer.
    pub merges: Option<Merges>,
    /// The special tokens of the tokenizer.
    pub special_tokens_map: Option<SpecialTokensMap>,
}

impl TokenizerInfo {
    pub fn get_config(&self) -> Option<&TokenizerConfig> {
        self.config.as_ref()
    }

    /// Resolves the tokenizer class, first from `tokenizer_config.json` and
    /// then from the model type in `config.json`.
    pub fn get_tokenizer_class(&self) -> &str {
        if let Some(config) = &self.config {
            if let Some(tokenizer_class) = &config.tokenizer_class {
                if !IGNORE_TOKENIZER_CLASSES.contains(&tokenizer_class.as_str()) {
                    return tokenizer_class;
                }
            }
        }

        if let Some(model_config) = &self.model_config {
            if let Some(model_type) = model_config["model_type"].as_str() {
                if let Some(tokenizer_class) = MODEL_TYPE_TO_TOKENIZER_CLASS.get(model_type) {
                    return tokenizer_class;
                }
            }
        }

        ""
    }

    /// Gets the `String` representation of the CLS token.
    pub fn get_cls_token(&self) -> Option<String> {
        self.get_special_token(SpecialTokenName::Cls)
    }

    /// Gets the `String` representation of the MASK token.
    pub fn get_mask_token(&self) -> Option<String> {
        self.get_special_token(SpecialTokenName::Mask)
    }

    /// Gets the `String` representation of the PAD token.
    pub fn get_pad_token(&self) -> Option<String> {
        self.get_special_token(SpecialTokenName::Pad)
    }

    /// Gets the `String` representation of the SEP token.
    pub fn get_sep_token(&self) -> Option<String> {
        self.get_special_token(SpecialTokenName::Sep)
    }

    /// Gets the `String` representation of the UNK token.
    pub fn get_unk_token(&self) -> Option<String> {
        self.get_special_token(SpecialTokenName::Unk)
    }

    /// Looks a special token up in the special tokens map first and falls back
    /// to the tokenizer config.
    fn get_special_token(&self, special_token_name: SpecialTokenName) -> Option<String> {
        if let Some(special_tokens_map) = &self.special_tokens_map {
            let from_map = match special_token_name {
                SpecialTokenName::Cls => special_tokens_map.get_cls_token(),
                SpecialTokenName::Mask => special_tokens_map.get_mask_token(),
                SpecialTokenName::Pad => special_tokens_map.get_pad_token(),
                SpecialTokenName::Sep => special_tokens_map.get_sep_token(),
                SpecialTokenName::Unk => special_tokens_map.get_unk_token(),
            };
            if let Some(token) = from_map {
                return Some(token.content.clone());
            }
        }

        if let Some(config) = &self.config {
            let from_config = match special_token_name {
                SpecialTokenName::Cls => &config.cls_token,
                SpecialTokenName::Mask => &config.mask_token,
                SpecialTokenName::Pad => &config.pad_token,
                SpecialTokenName::Sep => &config.sep_token,
                SpecialTokenName::Unk => &config.unk_token,
            };
            if let Some(token) = from_config {
                return Some(token.clone());
            }
        }

        None
    }
}

/// Loads a WordPiece vocabulary from a `vocab.txt` file, one token per line.
pub fn load_vocab_txt(file_path: std::path::PathBuf) -> Result<Vocab> {
    let vocab = fs::read_to_string(file_path)?.lines().enumerate().fold(
        HashMap::<String, u32>::new(),
        |mut map, (idx, line)| {
            map.insert(line.to_string(), idx as u32);
            map
        },
    );
    Ok(vocab)
}

/// Loads a BPE vocabulary from a `vocab.json` file.
pub fn load_vocab_json(file_path: std::path::PathBuf) -> Result<Vocab> {
    let vocab = fs::read_to_string(file_path)?;
    let vocab: Vocab = serde_json::from_str(vocab.as_str())?;
    Ok(vocab)
}

/// Loads BPE merges from a `merges.txt` file.
pub fn load_merges(file_path: std::path::PathBuf) -> Result<Merges> {
    let merges = fs::read_to_string(file_path)?.lines().skip(1).fold(
        Vec::<(String, String)>::new(),
        |mut vec, line| {
            if let Some((left, right)) = line.split_once(' ') {
                vec.push((left.to_string(), right.to_string()));
            }
            vec
        },
    );
    Ok(merges)
}

/// Loads the special tokens map from a `special_tokens_map.json` file.
pub fn load_special_tokens_map(file_path: std::path::PathBuf) -> Result<SpecialTokensMap> {
    let special_tokens_map = fs::read_to_string(file_path)?;
    let special_tokens_map: SpecialTokensMap = serde_json::from_str(&special_tokens_map)?;
    Ok(special_tokens_map)
}

fn get_file(api: &ApiRepo, file_name: &str) -> Option<std::path::PathBuf> {
    api.get(file_name).ok()
}

/// Gathers the files needed to build a tokenizer from a Hub repository.
///
/// # Arguments
///
/// * `repo_id` - The ID of the repository to load the tokenizer from.
/// * `params` - Optional parameters to specify the revision and auth token.
///
/// # Returns
///
/// A `TokenizerInfo` with every file that could be fetched.
pub fn from_pretrained<I: AsRef<str>>(
    repo_id: I,
    params: Option<FromPretrainedParameters>,
) -> Result<TokenizerInfo> {
    let api = hub_repo(repo_id.as_ref(), params)?;

    let config = match get_file(&api, TOKENIZER_CONFIG_FILE) {
        Some(tokenizer_config_file) => TokenizerConfig::from_file(tokenizer_config_file).ok(),
        None => None,
    };

    // Used to determine the tokenizer class if the config does not name one
    let model_config = match get_file(&api, MODEL_CONFIG_FILE) {
        Some(model_config_file_path) => load_model_config(model_config_file_path).ok(),
        None => None,
    };

    let tokenizer_file_path = get_file(&api, TOKENIZER_FILE);

    // Try `vocab.json` (BPE) first, then `vocab.txt` (WordPiece)
    let vocab = match get_file(&api, VOCAB_JSON_FILE) {
        Some(vocab_json_file_path) => load_vocab_json(vocab_json_file_path).ok(),
        None => match get_file(&api, VOCAB_TXT_FILE) {
            Some(vocab_txt_file_path) => load_vocab_txt(vocab_txt_file_path).ok(),
            None => None,
        },
    };

    let merges = match get_file(&api, MERGES_FILE) {
        Some(merges_file_path) => load_merges(merges_file_path).ok(),
        None => None,
    };

    let special_tokens_map = match get_file(&api, SPECIAL_TOKENS_MAP_FILE) {
        Some(special_tokens_map_file) => load_special_tokens_map(special_tokens_map_file).ok(),
        None => None,
    };

    Ok(TokenizerInfo {
        config,
        model_config,
        tokenizer_file_path,
        vocab,
        merges,
        special_tokens_map,
    })
}
