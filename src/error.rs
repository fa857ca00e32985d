use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Catalog search failed")]
    Catalog(#[from] reqwest::Error),

    #[error("Asset '{key}' not found in scene {item_id}")]
    AssetNotFound { item_id: String, key: String },

    #[error("Invalid settings: {0}")]
    Config(String),
}
