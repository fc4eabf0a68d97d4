use candle_core::{DType, IndexOp, Module, Tensor};
use candle_nn::{embedding, layer_norm, linear, Dropout, Embedding, LayerNorm, Linear, VarBuilder};
use polarity::Result;

use crate::config::{EncoderConfig, PretrainedConfig};
use crate::encoder::{expand_attention_mask, Encoder};
use crate::model::{ClassifierInput, SequenceClassificationModel};

pub struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
    dropout: Dropout,
}

impl BertEmbeddings {
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
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor) -> Result<Tensor> {
        let (_bsize, seq_len) = input_ids.dims2()?;
        let input_embeddings = self.word_embeddings.forward(input_ids)?;
        let token_type_embeddings = self.token_type_embeddings.forward(token_type_ids)?;
        let embeddings = (&input_embeddings + token_type_embeddings)?;
        let position_ids = (0..seq_len as u32).collect::<Vec<_>>();
        let position_ids = Tensor::new(&position_ids[..], input_ids.device())?;
        let embeddings =
            embeddings.broadcast_add(&self.position_embeddings.forward(&position_ids)?)?;
        let embeddings = self.layer_norm.forward(&embeddings)?;
        let embeddings = self.dropout.forward(&embeddings, false)?;
        Ok(embeddings)
    }
}

pub struct BertPooler {
    dense: Linear,
}

impl BertPooler {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let dense = linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?;
        Ok(Self { dense })
    }
}

impl Module for BertPooler {
    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let first_token_tensor = hidden_states.i((.., 0))?;
        let pooled_output = self.dense.forward(&first_token_tensor)?;
        pooled_output.tanh()
    }
}

pub struct Bert {
    embeddings: BertEmbeddings,
    encoder: Encoder,
    pooler: BertPooler,
}

impl Bert {
    pub fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config)?;
        let encoder = Encoder::load(vb.pp("encoder"), config)?;
        let pooler = BertPooler::load(vb.pp("pooler"), config)?;
        Ok(Self {
            embeddings,
            encoder,
            pooler,
        })
    }

    /// Returns the pooled `[CLS]` representation of each sequence.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let embedding_output = self.embeddings.forward(input_ids, token_type_ids)?;
        let sequence_output = self.encoder.forward(&embedding_output, attention_mask)?;
        let pooled_output = self.pooler.forward(&sequence_output)?;
        Ok(pooled_output)
    }
}

pub struct BertForSequenceClassification {
    model: Bert,
    dropout: Dropout,
    classifier: Linear,
    dtype: DType,
    config: EncoderConfig,
}

impl SequenceClassificationModel for BertForSequenceClassification {
    fn load(vb: VarBuilder, config: serde_json::Value) -> Result<Self> {
        let config: EncoderConfig = serde_json::from_value(config)?;
        let dtype = vb.dtype();
        let model = Bert::load(vb.pp("bert"), &config)?;
        let dropout = Dropout::new(
            config
                .classifier_dropout
                .unwrap_or(config.hidden_dropout_prob),
        );
        let classifier = linear(
            config.hidden_size,
            config.pretrained_config.num_labels(),
            vb.pp("classifier"),
        )?;

        Ok(Self {
            model,
            dropout,
            classifier,
            dtype,
            config,
        })
    }

    fn forward(&self, input: ClassifierInput) -> Result<Tensor> {
        let attention_mask = expand_attention_mask(input.attention_mask, self.dtype)?;
        let token_type_ids = match input.token_type_ids {
            Some(token_type_ids) => token_type_ids.clone(),
            None => input.input_ids.zeros_like()?,
        };
        let pooled_output =
            self.model
                .forward(input.input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled_output = self.dropout.forward(&pooled_output, false)?;
        let logits = self.classifier.forward(&pooled_output)?;
        Ok(logits)
    }

    fn config(&self) -> &PretrainedConfig {
        &self.config.pretrained_config
    }
}
