use crate::tokenizers::bert::{BertTokenizer, BertTokenizerBuilder};
use crate::tokenizers::roberta::{RobertaTokenizer, RobertaTokenizerBuilder};
use crate::{
    encoding::BatchEncoding,
    from_pretrained::{from_pretrained, FromPretrainedParameters, TokenizerInfo},
};
use candle_core::{DType, Device, Tensor};
use polarity::{Error, Result};
use tokenizers::{
    AddedToken, PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer as CoreTokenizer,
};

/// A thin wrapper around `tokenizers::Tokenizer` that encodes batches into
/// rectangular tensors and can be loaded from a Hugging Face Hub repository.
pub trait Tokenizer: std::fmt::Debug + Send + Sync {
    fn get_tokenizer(&self) -> &CoreTokenizer;

    fn get_max_length(&self) -> usize;
    fn get_cls_token(&self) -> Option<&str>;
    fn get_mask_token(&self) -> Option<&str>;
    fn get_pad_token(&self) -> Option<&str>;
    fn get_sep_token(&self) -> Option<&str>;
    fn get_unk_token(&self) -> Option<&str>;

    /// Get the token ID of a given token.
    fn get_token_id(&self, token: &str) -> Option<u32> {
        self.get_tokenizer().token_to_id(token)
    }

    /// Get the token ID of the CLS token.
    fn get_cls_token_id(&self) -> Option<u32> {
        self.get_token_id(self.get_cls_token()?)
    }

    /// Get the token ID of the MASK token.
    fn get_mask_token_id(&self) -> Option<u32> {
        self.get_token_id(self.get_mask_token()?)
    }

    /// Get the token ID of the PAD token.
    fn get_pad_token_id(&self) -> Option<u32> {
        self.get_token_id(self.get_pad_token()?)
    }

    /// Get the token ID of the SEP token.
    fn get_sep_token_id(&self) -> Option<u32> {
        self.get_token_id(self.get_sep_token()?)
    }

    /// Get the token ID of the UNK token.
    fn get_unk_token_id(&self) -> Option<u32> {
        self.get_token_id(self.get_unk_token()?)
    }

    /// Encodes a list of sequences into a [`BatchEncoding`]. Sequences are
    /// padded to the longest sequence in the batch (padding is configured when
    /// the tokenizer is built).
    ///
    /// # Arguments
    ///
    /// * `inputs` - A list of sequences to encode.
    /// * `add_special_tokens` - A flag indicating if special tokens should be added.
    ///
    /// # Returns
    ///
    /// A `BatchEncoding` containing the encoded sequences.
    fn encode(&self, inputs: Vec<String>, add_special_tokens: bool) -> Result<BatchEncoding> {
        let encodings = self
            .get_tokenizer()
            .encode_batch(inputs, add_special_tokens)
            .map_err(|e| Error::TokenizerEncodingError(e.to_string()))?;

        let mut input_ids: Vec<Vec<u32>> = Vec::new();
        let mut token_type_ids: Vec<Vec<u32>> = Vec::new();
        let mut attention_mask: Vec<Vec<u32>> = Vec::new();

        for encoding in &encodings {
            input_ids.push(encoding.get_ids().to_vec());
            token_type_ids.push(encoding.get_type_ids().to_vec());
            attention_mask.push(encoding.get_attention_mask().to_vec());
        }

        let input_ids = Tensor::new(input_ids, &Device::Cpu)?;
        let token_type_ids = Tensor::new(token_type_ids, &Device::Cpu)?;
        let attention_mask = Tensor::new(attention_mask, &Device::Cpu)?.to_dtype(DType::U8)?;

        Ok(BatchEncoding::new(
            input_ids,
            token_type_ids,
            attention_mask,
            encodings,
        ))
    }
}

/// A macro that implements the `Tokenizer` trait for a given tokenizer type.
#[macro_export]
macro_rules! impl_tokenizer {
    ($tokenizer_type:ty) => {
        impl Tokenizer for $tokenizer_type {
            fn get_tokenizer(&self) -> &CoreTokenizer {
                &self.tokenizer
            }

            fn get_max_length(&self) -> usize {
                self.max_length
            }

            fn get_cls_token(&self) -> Option<&str> {
                self.cls_token.as_deref()
            }

            fn get_mask_token(&self) -> Option<&str> {
                self.mask_token.as_deref()
            }

            fn get_pad_token(&self) -> Option<&str> {
                self.pad_token.as_deref()
            }

            fn get_sep_token(&self) -> Option<&str> {
                self.sep_token.as_deref()
            }

            fn get_unk_token(&self) -> Option<&str> {
                self.unk_token.as_deref()
            }
        }
    };
}

/// A trait that defines the methods required to build a `Tokenizer`.
pub trait TokenizerBuilder<T: Tokenizer> {
    fn new(tokenizer_info: TokenizerInfo) -> Self;
    fn get_tokenizer_info(&self) -> &TokenizerInfo;

    /// The PAD token this tokenizer pads with when the repository does not
    /// name one.
    fn pad_token(&self) -> String;

    /// Builds the inner `tokenizers::Tokenizer` from vocabulary files when the
    /// repository does not ship a `tokenizer.json`.
    fn build_tokenizer(&mut self) -> Result<CoreTokenizer>;

    fn build_with_tokenizer(&self, tokenizer: CoreTokenizer) -> Result<T>;

    fn build(&mut self) -> Result<T> {
        let tokenizer_info = self.get_tokenizer_info();

        let mut special_tokens: Vec<AddedToken> = Vec::new();
        if let Some(ref special_tokens_map) = tokenizer_info.special_tokens_map {
            for token in [
                special_tokens_map.get_cls_token(),
                special_tokens_map.get_mask_token(),
                special_tokens_map.get_pad_token(),
                special_tokens_map.get_sep_token(),
                special_tokens_map.get_unk_token(),
            ]
            .into_iter()
            .flatten()
            {
                special_tokens.push(token.clone());
            }
        }

        let mut added_tokens: Vec<AddedToken> = Vec::new();
        if let Some(config) = &tokenizer_info.config {
            if let Some(added_tokens_decoder) = &config.added_tokens_decoder {
                for added_token in added_tokens_decoder.values() {
                    added_tokens.push(added_token.clone());
                }
            }
        }

        // Try to build from `tokenizer.json`. Otherwise, build from `vocab.txt`,
        // `vocab.json` and `merges.txt`
        let mut tokenizer = match &tokenizer_info.tokenizer_file_path {
            Some(tokenizer_file_path) => CoreTokenizer::from_file(tokenizer_file_path)
                .map_err(|e| Error::TokenizerBuildError(e.to_string()))?,
            _ => self.build_tokenizer()?,
        };

        tokenizer.add_special_tokens(&special_tokens);
        tokenizer.add_tokens(&added_tokens);

        let pad_token = self
            .get_tokenizer_info()
            .get_pad_token()
            .unwrap_or_else(|| self.pad_token());
        let pad_id = tokenizer
            .token_to_id(&pad_token)
            .ok_or_else(|| Error::MissingSpecialTokenId("pad_token".to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id,
            pad_type_id: 0,
            pad_token,
        }));

        self.build_with_tokenizer(tokenizer)
    }
}

/// Allows to automatically load a tokenizer from a Hugging Face Hub repository.
#[derive(Debug)]
pub struct AutoTokenizer {}

/// Implement the `from_pretrained` method for the `AutoTokenizer` struct.
#[macro_export]
macro_rules! impl_auto_tokenizer_from_pretrained_method {
    ($auto_tokenizer_struct:ident, $(($tokenizer_class:expr, $tokenizer_struct:ident, $tokenizer_builder_struct:ident)), *) => {
        impl $auto_tokenizer_struct {
            pub fn from_pretrained<S: AsRef<str>>(
                repo_id: S,
                params: Option<FromPretrainedParameters>
            ) -> Result<Box<dyn Tokenizer>> {
                let tokenizer_info = from_pretrained(repo_id, params)?;

                let tokenizer: Result<Box<dyn Tokenizer>> = match tokenizer_info.get_tokenizer_class() {
                    $(
                        $tokenizer_class => {
                            $tokenizer_builder_struct::new(tokenizer_info)
                                .build()
                                .map(|tokenizer| Box::new(tokenizer) as Box<dyn Tokenizer>)
                        }
                    )*
                    other => Err(Error::TokenizerNotImplemented(other.to_string())),
                };

                tokenizer
            }
        }
    };
}

impl_auto_tokenizer_from_pretrained_method!(
    AutoTokenizer,
    ("BertTokenizer", BertTokenizer, BertTokenizerBuilder),
    ("RobertaTokenizer", RobertaTokenizer, RobertaTokenizerBuilder)
);

// Implement `from_pretrained` method for each tokenizer
#[macro_export]
macro_rules! impl_tokenizer_from_pretrained_method {
    ($tokenizer_struct:ident, $tokenizer_builder_struct:ident) => {
        impl $tokenizer_struct {
            pub fn from_pretrained<S: AsRef<str>>(
                repo_id: S,
                params: Option<FromPretrainedParameters>,
            ) -> Result<Box<dyn Tokenizer>> {
                let tokenizer_info = from_pretrained(repo_id, params)?;
                let tokenizer = $tokenizer_builder_struct::new(tokenizer_info).build()?;
                Ok(Box::new(tokenizer))
            }
        }
    };
}

impl_tokenizer_from_pretrained_method!(BertTokenizer, BertTokenizerBuilder);
impl_tokenizer_from_pretrained_method!(RobertaTokenizer, RobertaTokenizerBuilder);
