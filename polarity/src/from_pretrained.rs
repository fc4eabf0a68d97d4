use hf_hub::{
    api::sync::{Api, ApiBuilder, ApiRepo},
    Repo, RepoType,
};

use crate::{Error, Result};
use std::{collections::HashMap, fs};

pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Parameters controlling how files are fetched from the Hugging Face Hub.
#[derive(Debug, Clone)]
pub struct FromPretrainedParameters {
    pub revision: String,
    pub user_agent: HashMap<String, String>,
    pub auth_token: Option<String>,
}

impl Default for FromPretrainedParameters {
    fn default() -> Self {
        Self {
            revision: "main".into(),
            user_agent: HashMap::new(),
            auth_token: None,
        }
    }
}

/// Gets an [`ApiRepo`] for the provided repository ID, checking that the
/// repository actually exists.
///
/// # Arguments
///
/// * `repo_id` - The repository ID.
/// * `params` - The parameters to use when creating the API instance.
///
/// # Returns
///
/// The API instance.
pub fn hub_repo(repo_id: &str, params: Option<FromPretrainedParameters>) -> Result<ApiRepo> {
    let params = params.unwrap_or_default();
    let repo = Repo::with_revision(repo_id.to_string(), RepoType::Model, params.revision);

    let api = match params.auth_token {
        Some(token) => ApiBuilder::new().with_token(Some(token)).build()?,
        None => Api::new()?,
    };
    let api = api.repo(repo);

    if api.info().is_err() && api.get(MODEL_CONFIG_FILE).is_err() {
        return Err(Error::RepositoryNotFound(repo_id.to_string()));
    }

    Ok(api)
}

/// Loads the model configuration from a local `config.json` file path.
pub fn load_model_config(file_path: std::path::PathBuf) -> Result<serde_json::Value> {
    let model_config = fs::read_to_string(file_path)?;
    let model_config = serde_json::from_str(&model_config)?;
    Ok(model_config)
}
