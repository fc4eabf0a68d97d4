use std::{
    collections::{HashMap, HashSet},
    fs,
    path::PathBuf,
};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::ApiRepo;
use serde::{Deserialize, Serialize};

use polarity::{
    from_pretrained::{hub_repo, load_model_config, FromPretrainedParameters, MODEL_CONFIG_FILE},
    Error, Result,
};

const MODEL_SAFETENSORS_INDEX_FILE: &str = "model.safetensors.index.json";
const MODEL_SAFETENSORS_FILE: &str = "model.safetensors";
const MODEL_PYTORCH_FILE: &str = "pytorch_model.bin";

/// Everything required to load a model from the Hugging Face Hub.
pub struct ModelInfo {
    /// The model configuration loaded from the `config.json` file.
    config: Option<serde_json::Value>,
    /// The paths to the model weights files.
    weights_file_paths: Vec<PathBuf>,
    /// A flag indicating whether the model weights are stored in PyTorch format.
    from_pth: bool,
}

impl ModelInfo {
    /// Loads the model weights from the fetched paths into a `VarBuilder`.
    ///
    /// # Arguments
    ///
    /// - `dtype` - The data type of the model weights.
    /// - `device` - The device on which the model weights should be loaded.
    ///
    /// # Returns
    ///
    /// A `VarBuilder` containing the model weights.
    pub fn get_var_builder(&self, dtype: DType, device: &Device) -> Result<VarBuilder> {
        let vb = match self.from_pth {
            true => VarBuilder::from_pth(&self.weights_file_paths[0], dtype, device)?,
            false => unsafe {
                VarBuilder::from_mmaped_safetensors(&self.weights_file_paths, dtype, device)?
            },
        };
        Ok(vb)
    }

    /// Gets a reference to the model configuration.
    pub fn get_config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SafetensorsMetadata {
    total_size: usize,
}

/// Representation of the `model.safetensors.index.json` file which contains
/// the metadata and weight map of a sharded model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SafetensorsIndex {
    metadata: SafetensorsMetadata,
    /// A map from layer name to the `safetensors` file containing the weights
    /// of that layer.
    weight_map: HashMap<String, String>,
}

impl SafetensorsIndex {
    /// Gets the deduplicated list of `safetensors` files required to load the
    /// model.
    fn get_safetensors_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .weight_map
            .values()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        files.sort();
        files
    }
}

/// Fetches the model weights from the Hub repository. Tries the
/// `model.safetensors.index.json` file (and the corresponding `safetensors`
/// shards) first, then the single `model.safetensors` file, and finally the
/// `pytorch_model.bin` file.
fn fetch_model_weights(api: &ApiRepo) -> Result<(Vec<PathBuf>, bool)> {
    if let Ok(model_safetensors_index_file_path) = api.get(MODEL_SAFETENSORS_INDEX_FILE) {
        let safetensors_index = fs::read_to_string(model_safetensors_index_file_path)?;
        let safetensors_index: SafetensorsIndex = serde_json::from_str(&safetensors_index)?;
        let safetensors_files = safetensors_index
            .get_safetensors_files()
            .iter()
            .map(|file_name| api.get(file_name).map_err(Error::wrap))
            .collect::<Result<Vec<_>>>()?;
        return Ok((safetensors_files, false));
    }

    if let Ok(model_safetensor_file_path) = api.get(MODEL_SAFETENSORS_FILE) {
        return Ok((vec![model_safetensor_file_path], false));
    }

    if let Ok(model_pytorch_file_path) = api.get(MODEL_PYTORCH_FILE) {
        return Ok((vec![model_pytorch_file_path], true));
    }

    Err(Error::ModelWeightsNotFound)
}

/// Fetches all the files required to load a model from the Hugging Face Hub.
///
/// # Arguments
///
/// * `repo_id`: The Hugging Face Hub model repository id.
/// * `params`: Optional parameters to specify the revision and auth token.
///
/// # Returns
///
/// A `ModelInfo` struct containing all the information required to load the
/// model.
pub fn from_pretrained<I: AsRef<str>>(
    repo_id: I,
    params: Option<FromPretrainedParameters>,
) -> Result<ModelInfo> {
    let api = hub_repo(repo_id.as_ref(), params)?;

    // Get the model configuration from `config.json`
    let config = match api.get(MODEL_CONFIG_FILE) {
        Ok(model_config_file_path) => load_model_config(model_config_file_path).ok(),
        Err(_) => None,
    };

    // Fetch the model weights
    let (weights_file_paths, from_pth) = fetch_model_weights(&api)?;

    Ok(ModelInfo {
        config,
        weights_file_paths,
        from_pth,
    })
}
