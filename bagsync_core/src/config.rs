use crate::error::{BagsyncError, Result};
use crate::typesync::config::{BrowserConfig, ClassifierConfig, GenerationConfig, ManagedConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, trace, warn};

pub const CONFIG_FILE_NAME: &str = "bagsync.toml";

static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("Invalid environment variable regex")
});

/// Root configuration. Every section is optional in the TOML file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BagsyncConfig {
    pub classifier: ClassifierConfig,
    pub browser: BrowserConfig,
    pub managed: ManagedConfig,
    pub generation: GenerationConfig,
}

impl BagsyncConfig {
    /// Loads `.env` if present, then the nearest bagsync.toml at or above
    /// the working directory.
    pub fn new() -> Result<BagsyncConfig> {
        info!("Loading Bagsync configuration");
        dotenv::dotenv().ok();
        Self::discover(&env::current_dir()?)
    }

    /// Loads the nearest bagsync.toml found in `start` or one of its ancestors.
    pub fn discover(start: &Path) -> Result<BagsyncConfig> {
        let config_path = Self::find_config_file(start)?;
        info!(path = %config_path.display(), "Found configuration file");
        Self::from_path(&config_path)
    }

    pub fn from_path(path: &Path) -> Result<BagsyncConfig> {
        let contents = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read configuration file: {}", e);
            BagsyncError::from(e)
        })?;
        debug!("Configuration file size: {} bytes", contents.len());
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<BagsyncConfig> {
        let mut config: BagsyncConfig = toml::from_str(contents).map_err(|e| {
            error!("Failed to parse TOML configuration: {}", e);
            BagsyncError::config(e.to_string())
        })?;

        config.substitute_all()?;

        if config.generation.max_type_depth == 0 {
            return Err(BagsyncError::config(
                "generation.max_type_depth must be at least 1",
            ));
        }

        debug!(
            "Strictness: {:?}, max type depth: {}",
            config.generation.strictness, config.generation.max_type_depth
        );
        Ok(config)
    }

    fn substitute_all(&mut self) -> Result<()> {
        let classifier = &mut self.classifier;
        for value in [
            &mut classifier.enumerations_root,
            &mut classifier.view_model_root,
            &mut classifier.box_type_name,
            &mut classifier.domain_annotation,
        ] {
            *value = Self::substitute_env_vars(value)?;
        }

        let browser = &mut self.browser;
        for value in [
            &mut browser.identifier_import,
            &mut browser.reference_import,
            &mut browser.box_import,
            &mut browser.enumerations_import_root,
            &mut browser.view_models_import_root,
            &mut browser.domain_enumerations_import,
        ] {
            *value = Self::substitute_env_vars(value)?;
        }

        let managed = &mut self.managed;
        for value in [
            &mut managed.reference_namespace,
            &mut managed.identifier_namespace,
            &mut managed.box_namespace,
            &mut managed.bag_suffix,
        ] {
            *value = Self::substitute_env_vars(value)?;
        }
        Ok(())
    }

    fn find_config_file(start: &Path) -> Result<PathBuf> {
        debug!(start = %start.display(), "Searching for {}", CONFIG_FILE_NAME);

        if let Some(found) = start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .inspect(|candidate| trace!(candidate = %candidate.display(), "Checking"))
            .find(|candidate| candidate.is_file())
        {
            return Ok(found);
        }

        error!(start = %start.display(), "No {} in directory or ancestors", CONFIG_FILE_NAME);
        Err(BagsyncError::config(format!(
            "{} not found in {} or any parent directory",
            CONFIG_FILE_NAME,
            start.display()
        )))
    }

    /// Substitute environment variables in config strings
    /// Supports ${VAR_NAME:-default} syntax
    fn substitute_env_vars(value: &str) -> Result<String> {
        trace!("Substituting environment variables in: {}", value);
        let mut result = value.to_string();

        for cap in ENV_VAR_RE.captures_iter(value) {
            let var_name = &cap[1];
            let default_value = cap.get(2).map(|m| m.as_str());

            let replacement = match env::var(var_name) {
                Ok(val) => {
                    debug!("Resolved environment variable: {}", var_name);
                    val
                }
                Err(_) => match default_value {
                    Some(default) => {
                        warn!(
                            "Environment variable {} not set, using default: {}",
                            var_name, default
                        );
                        default.to_string()
                    }
                    None => {
                        error!(
                            "Environment variable {} not set and no default provided",
                            var_name
                        );
                        return Err(BagsyncError::EnvVarNotSet(var_name.to_string()));
                    }
                },
            };

            result = result.replace(&cap[0], &replacement);
        }

        Ok(result)
    }
}
