use std::path::PathBuf;

/// Runtime settings for a catalog instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Turtle file the store is hydrated from and persisted to
    pub data_file: PathBuf,
    /// Add the class and property declarations on startup
    pub seed_schema: bool,
    /// Persist after every mutating catalog operation
    pub autosave: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { data_file: PathBuf::from("data_gadget.ttl"), seed_schema: true, autosave: true }
    }
}

impl StoreConfig {
    pub fn with_data_file(data_file: impl Into<PathBuf>) -> Self {
        Self { data_file: data_file.into(), ..Default::default() }
    }
}
