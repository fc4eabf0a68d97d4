use polarity::{Error, Result};
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::{
    decoders::wordpiece::WordPiece as WordPieceDecoder, models::bpe::Vocab,
    pre_tokenizers::bert::BertPreTokenizer, processors::template::TemplateProcessing,
    Tokenizer as CoreTokenizer, TokenizerImpl,
};

use crate::config::TokenizerConfig;
use crate::from_pretrained::TokenizerInfo;
use crate::impl_tokenizer;
use crate::tokenizer::{Tokenizer, TokenizerBuilder};

const BERT_MAX_LENGTH: usize = 512;
const BERT_CLS_TOKEN: &str = "[CLS]";
const BERT_MASK_TOKEN: &str = "[MASK]";
const BERT_PAD_TOKEN: &str = "[PAD]";
const BERT_SEP_TOKEN: &str = "[SEP]";
const BERT_UNK_TOKEN: &str = "[UNK]";

/// A WordPiece tokenizer for BERT checkpoints.
#[derive(Debug)]
pub struct BertTokenizer {
    tokenizer: CoreTokenizer,
    max_length: usize,
    cls_token: Option<String>,
    mask_token: Option<String>,
    pad_token: Option<String>,
    sep_token: Option<String>,
    unk_token: Option<String>,
}

impl_tokenizer!(BertTokenizer);

/// `BertTokenizer` builder.
pub struct BertTokenizerBuilder {
    tokenizer_info: TokenizerInfo,
}

impl BertTokenizerBuilder {
    fn build_normalizer(&self, config: Option<&TokenizerConfig>) -> BertNormalizer {
        BertNormalizer::new(
            config
                .and_then(|c| c.clean_up_tokenization_spaces)
                .unwrap_or(true),
            config.and_then(|c| c.tokenize_chinese_chars).unwrap_or(true),
            config.and_then(|c| c.strip_accents),
            config.and_then(|c| c.do_lower_case).unwrap_or(true),
        )
    }

    fn build_pre_tokenizer(&self) -> BertPreTokenizer {
        BertPreTokenizer {}
    }

    fn build_model(&self, vocab: Vocab, unk_token: String) -> Result<WordPiece> {
        WordPiece::builder()
            .vocab(vocab)
            .unk_token(unk_token)
            .continuing_subword_prefix("##".to_string())
            .max_input_chars_per_word(100)
            .build()
            .map_err(|e| Error::TokenizerBuildError(e.to_string()))
    }

    fn build_post_processor(
        &self,
        sep_token: (String, u32),
        cls_token: (String, u32),
    ) -> Result<TemplateProcessing> {
        TemplateProcessing::builder()
            .try_single(format!("{} $A {}", cls_token.0, sep_token.0))
            .map_err(Error::TokenizerBuildError)?
            .try_pair(format!(
                "{} $A:0 {} $B:1 {}:1",
                cls_token.0, sep_token.0, sep_token.0
            ))
            .map_err(|e| Error::TokenizerBuildError(e.to_string()))?
            .special_tokens(vec![cls_token, sep_token])
            .build()
            .map_err(|e| Error::TokenizerBuildError(e.to_string()))
    }

    fn build_decoder(&self) -> WordPieceDecoder {
        WordPieceDecoder::new("##".to_string(), true)
    }
}

impl TokenizerBuilder<BertTokenizer> for BertTokenizerBuilder {
    fn new(tokenizer_info: TokenizerInfo) -> Self {
        BertTokenizerBuilder { tokenizer_info }
    }

    fn get_tokenizer_info(&self) -> &TokenizerInfo {
        &self.tokenizer_info
    }

    fn pad_token(&self) -> String {
        BERT_PAD_TOKEN.to_string()
    }

    fn build_tokenizer(&mut self) -> Result<CoreTokenizer> {
        let vocab = self.tokenizer_info.vocab.take().ok_or_else(|| {
            Error::TokenizerBuildError(
                "Cannot build BertTokenizer without 'vocab.txt'.".to_string(),
            )
        })?;
        let cls_token = self
            .tokenizer_info
            .get_cls_token()
            .unwrap_or(BERT_CLS_TOKEN.to_string());
        let sep_token = self
            .tokenizer_info
            .get_sep_token()
            .unwrap_or(BERT_SEP_TOKEN.to_string());
        let unk_token = self
            .tokenizer_info
            .get_unk_token()
            .unwrap_or(BERT_UNK_TOKEN.to_string());
        let cls_token_id = *vocab.get(&cls_token).unwrap_or(&101u32);
        let sep_token_id = *vocab.get(&sep_token).unwrap_or(&102u32);

        let mut tokenizer: TokenizerImpl<
            WordPiece,
            BertNormalizer,
            BertPreTokenizer,
            TemplateProcessing,
            WordPieceDecoder,
        > = TokenizerImpl::new(self.build_model(vocab, unk_token.clone())?);

        tokenizer
            .with_normalizer(Some(
                self.build_normalizer(self.tokenizer_info.get_config()),
            ))
            .with_pre_tokenizer(Some(self.build_pre_tokenizer()))
            .with_post_processor(Some(self.build_post_processor(
                (sep_token.clone(), sep_token_id),
                (cls_token.clone(), cls_token_id),
            )?))
            .with_decoder(Some(self.build_decoder()));

        Ok(CoreTokenizer::from(tokenizer))
    }

    fn build_with_tokenizer(&self, tokenizer: CoreTokenizer) -> Result<BertTokenizer> {
        let max_length = self
            .tokenizer_info
            .config
            .as_ref()
            .and_then(|config| config.model_max_length)
            .unwrap_or(BERT_MAX_LENGTH);
        let cls_token = self
            .tokenizer_info
            .get_cls_token()
            .unwrap_or(BERT_CLS_TOKEN.to_string());
        let mask_token = self
            .tokenizer_info
            .get_mask_token()
            .unwrap_or(BERT_MASK_TOKEN.to_string());
        let pad_token = self
            .tokenizer_info
            .get_pad_token()
            .unwrap_or(BERT_PAD_TOKEN.to_string());
        let sep_token = self
            .tokenizer_info
            .get_sep_token()
            .unwrap_or(BERT_SEP_TOKEN.to_string());
        let unk_token = self
            .tokenizer_info
            .get_unk_token()
            .unwrap_or(BERT_UNK_TOKEN.to_string());

        Ok(BertTokenizer {
            tokenizer,
            max_length,
            cls_token: Some(cls_token),
            mask_token: Some(mask_token),
            pad_token: Some(pad_token),
            sep_token: Some(sep_token),
            unk_token: Some(unk_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tiny_vocab() -> Vocab {
        let tokens = [
            "[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]", "hello", "world", "rust", "is", "fast",
        ];
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i as u32))
            .collect::<HashMap<String, u32>>()
    }

    fn build_tiny_tokenizer() -> BertTokenizer {
        let info = TokenizerInfo {
            vocab: Some(tiny_vocab()),
            ..Default::default()
        };
        BertTokenizerBuilder::new(info).build().unwrap()
    }

    #[test]
    fn builds_from_vocab_without_tokenizer_config() {
        let tokenizer = build_tiny_tokenizer();
        assert_eq!(tokenizer.get_pad_token(), Some("[PAD]"));
        assert_eq!(tokenizer.get_pad_token_id(), Some(0));
        assert_eq!(tokenizer.get_max_length(), 512);
    }

    #[test]
    fn encode_wraps_with_special_tokens() {
        let tokenizer = build_tiny_tokenizer();
        let batch = tokenizer.encode(vec!["hello world".to_string()], true).unwrap();
        let ids = batch.get_input_ids().to_vec2::<u32>().unwrap();
        assert_eq!(ids, vec![vec![2, 5, 6, 3]]);
    }

    #[test]
    fn encode_pads_ragged_batch_to_rectangular_tensors() {
        let tokenizer = build_tiny_tokenizer();
        let batch = tokenizer
            .encode(
                vec!["hello".to_string(), "rust is fast".to_string()],
                true,
            )
            .unwrap();
        let (rows, cols) = batch.get_input_ids().dims2().unwrap();
        assert_eq!(rows, 2);
        assert_eq!(cols, 5);
        let mask = batch.get_attention_mask().to_vec2::<u8>().unwrap();
        assert_eq!(mask[0], vec![1, 1, 1, 0, 0]);
        assert_eq!(mask[1], vec![1, 1, 1, 1, 1]);
    }
}
