//! The transformer encoder blocks shared by the BERT and RoBERTa
//! classification models. Weight names follow the Hugging Face checkpoint
//! layout so `VarBuilder` prefixes line up with the original files.

use candle_core::{DType, Module, Tensor, D};
use candle_nn::{
    layer_norm, linear, ops::softmax, Dropout, LayerNorm, Linear, VarBuilder,
};
use polarity::Result;

use crate::config::{EncoderConfig, HiddenAct};

pub struct HiddenActLayer {
    act: HiddenAct,
}

impl HiddenActLayer {
    fn new(act: HiddenAct) -> Self {
        Self { act }
    }

    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        match self.act {
            HiddenAct::Gelu => hidden_states.gelu_erf(),
            HiddenAct::Relu => hidden_states.relu(),
        }
    }
}

/// Expands a `(batch_size, seq_len)` attention mask into the broadcastable
/// additive form `(batch_size, 1, 1, seq_len)`: zero where tokens attend,
/// negative infinity at padding positions.
pub fn expand_attention_mask(attention_mask: &Tensor, dtype: DType) -> Result<Tensor> {
    let expanded = attention_mask.unsqueeze(1)?.unsqueeze(2)?;
    let on_true = expanded.zeros_like()?.to_dtype(dtype)?;
    let on_false = Tensor::new(f32::NEG_INFINITY, expanded.device())?
        .broadcast_as(expanded.shape())?
        .to_dtype(dtype)?;
    let expanded = expanded.where_cond(&on_true, &on_false)?;
    Ok(expanded)
}

pub struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    dropout: Dropout,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let attention_head_size = config.hidden_size / config.num_attention_heads;
        let all_head_size = config.num_attention_heads * attention_head_size;
        let dropout = Dropout::new(config.attention_probs_dropout_prob);
        let hidden_size = config.hidden_size;
        let query = linear(hidden_size, all_head_size, vb.pp("query"))?;
        let key = linear(hidden_size, all_head_size, vb.pp("key"))?;
        let value = linear(hidden_size, all_head_size, vb.pp("value"))?;
        Ok(Self {
            query,
            key,
            value,
            dropout,
            num_attention_heads: config.num_attention_heads,
            attention_head_size,
        })
    }

    fn transpose_for_scores(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let mut new_x_shape = xs.dims().to_vec();
        new_x_shape.pop();
        new_x_shape.push(self.num_attention_heads);
        new_x_shape.push(self.attention_head_size);
        let xs = xs.reshape(new_x_shape.as_slice())?.transpose(1, 2)?;
        xs.contiguous()
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: Option<&Tensor>) -> Result<Tensor> {
        let query_layer = self.query.forward(hidden_states)?;
        let key_layer = self.key.forward(hidden_states)?;
        let value_layer = self.value.forward(hidden_states)?;

        let query_layer = self.transpose_for_scores(&query_layer)?;
        let key_layer = self.transpose_for_scores(&key_layer)?;
        let value_layer = self.transpose_for_scores(&value_layer)?;

        let attention_scores = query_layer.matmul(&key_layer.t()?)?;
        let mut attention_scores =
            (attention_scores / (self.attention_head_size as f64).sqrt())?;
        if let Some(attention_mask) = attention_mask {
            attention_scores = attention_scores.broadcast_add(attention_mask)?;
        }
        let attention_probs = softmax(&attention_scores, D::Minus1)?;
        let attention_probs = self.dropout.forward(&attention_probs, false)?;

        let context_layer = attention_probs.matmul(&value_layer)?;
        let context_layer = context_layer.transpose(1, 2)?.contiguous()?;
        let context_layer = context_layer.flatten_from(D::Minus2)?;
        Ok(context_layer)
    }
}

pub struct SelfAttentionOutput {
    dense: Linear,
    layer_norm: LayerNorm,
    dropout: Dropout,
}

impl SelfAttentionOutput {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let dense = linear(config.hidden_size, config.hidden_size, vb.pp("dense"))?;
        let layer_norm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;
        let dropout = Dropout::new(config.hidden_dropout_prob);
        Ok(Self {
            dense,
            layer_norm,
            dropout,
        })
    }

    fn forward(&self, hidden_states: &Tensor, input_tensor: &Tensor) -> Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        let hidden_states = self.dropout.forward(&hidden_states, false)?;
        let hidden_states = self.layer_norm.forward(&(hidden_states + input_tensor)?)?;
        Ok(hidden_states)
    }
}

pub struct Attention {
    self_attention: SelfAttention,
    self_output: SelfAttentionOutput,
}

impl Attention {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let self_attention = SelfAttention::load(vb.pp("self"), config)?;
        let self_output = SelfAttentionOutput::load(vb.pp("output"), config)?;
        Ok(Self {
            self_attention,
            self_output,
        })
    }

    fn forward(&self, input_tensor: &Tensor, attention_mask: Option<&Tensor>) -> Result<Tensor> {
        let self_outputs = self.self_attention.forward(input_tensor, attention_mask)?;
        let attention_output = self.self_output.forward(&self_outputs, input_tensor)?;
        Ok(attention_output)
    }
}

pub struct Intermediate {
    dense: Linear,
    intermediate_act: HiddenActLayer,
}

impl Intermediate {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let dense = linear(config.hidden_size, config.intermediate_size, vb.pp("dense"))?;
        Ok(Self {
            dense,
            intermediate_act: HiddenActLayer::new(config.hidden_act),
        })
    }
}

impl Module for Intermediate {
    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        self.intermediate_act.forward(&hidden_states)
    }
}

pub struct FeedForwardOutput {
    dense: Linear,
    layer_norm: LayerNorm,
    dropout: Dropout,
}

impl FeedForwardOutput {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let dense = linear(config.intermediate_size, config.hidden_size, vb.pp("dense"))?;
        let layer_norm = layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;
        let dropout = Dropout::new(config.hidden_dropout_prob);
        Ok(Self {
            dense,
            layer_norm,
            dropout,
        })
    }

    fn forward(&self, hidden_states: &Tensor, input_tensor: &Tensor) -> Result<Tensor> {
        let hidden_states = self.dense.forward(hidden_states)?;
        let hidden_states = self.dropout.forward(&hidden_states, false)?;
        let hidden_states = self.layer_norm.forward(&(hidden_states + input_tensor)?)?;
        Ok(hidden_states)
    }
}

pub struct EncoderLayer {
    attention: Attention,
    intermediate: Intermediate,
    output: FeedForwardOutput,
}

impl EncoderLayer {
    fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let attention = Attention::load(vb.pp("attention"), config)?;
        let intermediate = Intermediate::load(vb.pp("intermediate"), config)?;
        let output = FeedForwardOutput::load(vb.pp("output"), config)?;
        Ok(Self {
            attention,
            intermediate,
            output,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: Option<&Tensor>) -> Result<Tensor> {
        let attention_output = self.attention.forward(hidden_states, attention_mask)?;
        let intermediate_output = self.intermediate.forward(&attention_output)?;
        let layer_output = self.output.forward(&intermediate_output, &attention_output)?;
        Ok(layer_output)
    }
}

pub struct Encoder {
    layers: Vec<EncoderLayer>,
}

impl Encoder {
    pub fn load(vb: VarBuilder, config: &EncoderConfig) -> Result<Self> {
        let layers = (0..config.num_hidden_layers)
            .map(|index| EncoderLayer::load(vb.pp(format!("layer.{index}")), config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { layers })
    }

    pub fn forward(
        &self,
        hidden_states: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let mut hidden_states = hidden_states.clone();
        for layer in self.layers.iter() {
            hidden_states = layer.forward(&hidden_states, attention_mask)?;
        }
        Ok(hidden_states)
    }
}
