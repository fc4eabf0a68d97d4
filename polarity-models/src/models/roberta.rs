use candle_core::{DType, IndexOp, Module, Tensor, D};
use candle_nn::{embedding, layer_norm, linear, Dropout, Embedding, LayerNorm, Linear, VarBuilder};
use polarity::Result;

use crate::config::{EncoderConfig, PretrainedConfig};
use crate::encoder::{expand_attention_mask, Encoder};
use crate::model::{ClassifierInput, SequenceClassificationModel};

pub struct RobertaEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    dropout: Dropout,
    padding_idx: usize,
}

impl RobertaEmbeddings {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let word_embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let layer_norm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;
        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            layer_norm,
            dropout: Dropout::new(config.hidden_dropout_prob),
            padding_idx: config.pad_token_id,
        })
    }

    /// RoBERTa position ids count non-padding tokens and are offset past the
    /// padding index; padding positions collapse onto the padding index.
    fn position_ids_from_mask(&self, attention_mask: &Tensor) -> Result<Tensor> {
        let mask = attention_mask.to_dtype(DType::F32)?;
        let position_ids = (mask.cumsum(D::Minus1)? * &mask)?;
        let position_ids = (position_ids + self.padding_idx as f64)?;
        let position_ids = position_ids.to_dtype(DType::U32)?;
        Ok(position_ids)
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let input_embeddings = self.word_embeddings.forward(input_ids)?;
        let token_type_embeddings = self.token_type_embeddings.forward(token_type_ids)?;
        let position_ids = self.position_ids_from_mask(attention_mask)?;
        let position_embeddings = self.position_embeddings.forward(&position_ids)?;
        let embeddings = ((&input_embeddings + token_type_embeddings)? + position_embeddings)?;
        let embeddings = self.layer_norm.forward(&embeddings)?;
        let embeddings = self.dropout.forward(&embeddings, false)?;
        Ok(embeddings)
    }
}

pub struct Roberta {
    embeddings: RobertaEmbeddings,
    encoder: Encoder,
}

impl Roberta {
    pub fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let embeddings = RobertaEmbeddings::load(vb.pp("embeddings"), config)?;
        let encoder = Encoder::load(vb.pp("encoder"), config)?;
        Ok(Self {
            embeddings,
            encoder,
        })
    }

    /// Returns the hidden states of every token in each sequence.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
        expanded_attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let embedding_output = self
            .embeddings
            .forward(input_ids, token_type_ids, attention_mask)?;
        let sequence_output = self
            .encoder
            .forward(&embedding_output, expanded_attention_mask)?;
        Ok(sequence_output)
    }
}

/// The RoBERTa classification head: `<s>` hidden state through a dense layer,
/// a tanh and an output projection. RoBERTa checkpoints carry no pooler.
pub struct RobertaClassificationHead {
    dense: Linear,
    dropout: Dropout,
    out_proj: Linear,
}

impl RobertaClassificationHead {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let dense = linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?;
        let dropout = Dropout::new(
            config
                .classifier_dropout
                .unwrap_or(config.hidden_dropout_prob),
        );
        let out_proj = linear(
            config.hidden_size,
            config.pretrained_config.num_labels(),
            vb.pp("out_proj"),
        )?;
        Ok(Self {
            dense,
            dropout,
            out_proj,
        })
    }

    fn forward(&self, sequence_output: &Tensor) -> Result<Tensor> {
        let first_token_tensor = sequence_output.i((.., 0))?;
        let x = self.dropout.forward(&first_token_tensor, false)?;
        let x = self.dense.forward(&x)?.tanh()?;
        let x = self.dropout.forward(&x, false)?;
        let logits = self.out_proj.forward(&x)?;
        Ok(logits)
    }
}

pub struct RobertaForSequenceClassification {
    model: Roberta,
    classifier: RobertaClassificationHead,
    dtype: DType,
    config: EncoderConfig,
}

impl SequenceClassificationModel for RobertaForSequenceClassification {
    fn load(vb: VarBuilder, config: serde_json::Value) -> Result<Self> {
        let config: EncoderConfig = serde_json::from_value(config)?;
        let dtype = vb.dtype();
        let model = Roberta::load(vb.pp("roberta"), &config)?;
        let classifier = RobertaClassificationHead::load(vb.pp("classifier"), &config)?;

        Ok(Self {
            model,
            classifier,
            dtype,
            config,
        })
    }

    fn forward(&self, input: ClassifierInput) -> Result<Tensor> {
        let expanded_attention_mask = expand_attention_mask(input.attention_mask, self.dtype)?;
        let token_type_ids = match input.token_type_ids {
            Some(token_type_ids) => token_type_ids.clone(),
            None => input.input_ids.zeros_like()?,
        };
        let sequence_output = self.model.forward(
            input.input_ids,
            &token_type_ids,
            input.attention_mask,
            Some(&expanded_attention_mask),
        )?;
        let logits = self.classifier.forward(&sequence_output)?;
        Ok(logits)
    }

    fn config(&self) -> &PretrainedConfig {
        &self.config.pretrained_config
    }
}
