use super::ordering::{NoValueStrategy, OrderingConfig};
use super::query::format_query_elements;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the training every other training inherits unset attributes from
pub const FALLBACK_TRAINING: &str = "fallback";

/// Training duration used when neither the training nor the fallback sets one
pub const DEFAULT_DURATION_MINUTES: f64 = 60.0;

/// The whole training configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
    #[serde(default)]
    pub flavours: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub trainings: BTreeMap<String, TrainingConfig>,
}

/// A device or directory songs are exported to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    pub device_root: Option<String>,
    pub device_path: Option<String>,
    pub clean_target: Option<bool>,
    pub delete_from_device: Option<Vec<String>>,
    pub generate_playlist: Option<bool>,
    pub copy_files: Option<bool>,
}

/// One flavour name or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlavourList {
    One(String),
    Many(Vec<String>),
}

impl FlavourList {
    pub fn names(&self) -> Vec<String> {
        match self {
            FlavourList::One(name) => vec![name.clone()],
            FlavourList::Many(names) => names.clone(),
        }
    }
}

/// A training as written in the configuration file. Every attribute is
/// optional; unset ones are inherited from the fallback training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub query: Option<BTreeMap<String, serde_json::Value>>,
    pub use_flavours: Option<FlavourList>,
    /// Minutes
    pub duration: Option<f64>,
    pub target: Option<String>,
    pub ordering: Option<BTreeMap<String, f64>>,
    pub ordering_strategy: Option<String>,
    pub no_value_strategy: Option<NoValueStrategy>,
    pub pick_strategy: Option<String>,
    pub favour_unplayed: Option<bool>,
    pub increment_play_count: Option<bool>,
}

/// A training with every attribute resolved
#[derive(Debug, Clone)]
pub struct ResolvedTraining {
    pub name: String,
    /// Query elements from the training followed by those of its flavours
    pub training_query: Vec<String>,
    /// Names listed in `use_flavours`
    pub flavours: Vec<String>,
    pub flavour_query: Vec<String>,
    pub duration_minutes: f64,
    pub target: Option<String>,
    pub ordering: OrderingConfig,
    pub ordering_strategy: Option<String>,
    pub pick_strategy: Option<String>,
    pub favour_unplayed: bool,
    pub increment_play_count: bool,
}

impl ResolvedTraining {
    pub fn duration_seconds(&self) -> f64 {
        self.duration_minutes * 60.0
    }
}

/// Export target with defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub name: String,
    pub device_root: Option<String>,
    pub device_path: String,
    pub clean_target: bool,
    pub delete_from_device: Vec<String>,
    pub generate_playlist: bool,
    pub copy_files: bool,
}

impl ResolvedTarget {
    /// Expand `~` in the device root
    pub fn root_path(&self) -> Option<PathBuf> {
        self.device_root.as_deref().map(expand_home)
    }

    /// Absolute destination directory, validated to exist
    pub fn destination_path(&self) -> Result<PathBuf> {
        let root = self.root_path().ok_or_else(|| {
            anyhow!(
                "The target[{}] does not declare a device root path.",
                self.name
            )
        })?;

        let path = root.join(self.device_path.trim_matches('/'));
        if !path.is_dir() {
            return Err(anyhow!(
                "The target[{}] path does not exist: {}",
                self.name,
                path.display()
            ));
        }

        Ok(path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl TrainingSettings {
    /// Load the training configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read training configuration {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid training configuration {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let settings: TrainingSettings = serde_json::from_str(content)?;
        Ok(settings)
    }

    /// Look up an attribute on a training, then on the fallback training
    fn training_attribute<T, F>(&self, training: &TrainingConfig, get: F) -> Option<T>
    where
        F: Fn(&TrainingConfig) -> Option<T>,
    {
        get(training).or_else(|| self.trainings.get(FALLBACK_TRAINING).and_then(get))
    }

    /// Query elements of a flavour, in key order
    pub fn flavour_elements(&self, flavour_name: &str) -> Vec<String> {
        self.flavours
            .get(flavour_name)
            .map(|flavour| {
                flavour
                    .iter()
                    .flat_map(|(key, value)| format_query_elements(key, value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a named training against the fallback and the defaults
    pub fn resolve_training(&self, name: &str) -> Result<ResolvedTraining> {
        let training = self
            .trainings
            .get(name)
            .ok_or_else(|| anyhow!("There is no training[{name}] registered with this name!"))?;

        let training_query = self
            .training_attribute(training, |t| t.query.clone())
            .map(|query| {
                query
                    .iter()
                    .flat_map(|(key, value)| format_query_elements(key, value))
                    .collect()
            })
            .unwrap_or_default();

        let flavours = self
            .training_attribute(training, |t| t.use_flavours.clone())
            .map(|flavours| flavours.names())
            .unwrap_or_default();
        let flavour_query = flavours
            .iter()
            .flat_map(|flavour| self.flavour_elements(flavour))
            .collect();

        let ordering = OrderingConfig::new(
            self.training_attribute(training, |t| t.ordering.clone())
                .unwrap_or_default(),
            self.training_attribute(training, |t| t.no_value_strategy)
                .unwrap_or_default(),
        );

        Ok(ResolvedTraining {
            name: name.to_string(),
            training_query,
            flavours,
            flavour_query,
            duration_minutes: self
                .training_attribute(training, |t| t.duration)
                .unwrap_or(DEFAULT_DURATION_MINUTES),
            target: self.training_attribute(training, |t| t.target.clone()),
            ordering,
            ordering_strategy: self.training_attribute(training, |t| t.ordering_strategy.clone()),
            pick_strategy: self.training_attribute(training, |t| t.pick_strategy.clone()),
            favour_unplayed: self
                .training_attribute(training, |t| t.favour_unplayed)
                .unwrap_or(false),
            increment_play_count: self
                .training_attribute(training, |t| t.increment_play_count)
                .unwrap_or(false),
        })
    }

    /// Resolve the export target a training points at
    pub fn resolve_target(&self, training: &ResolvedTraining) -> Result<ResolvedTarget> {
        let target_name = training
            .target
            .as_deref()
            .ok_or_else(|| anyhow!("The training[{}] does not declare a target!", training.name))?;

        let target = self
            .targets
            .get(target_name)
            .ok_or_else(|| anyhow!("The target name[{target_name}] is not defined!"))?;

        Ok(ResolvedTarget {
            name: target_name.to_string(),
            device_root: target.device_root.clone(),
            device_path: target.device_path.clone().unwrap_or_default(),
            clean_target: target.clean_target.unwrap_or(false),
            delete_from_device: target.delete_from_device.clone().unwrap_or_default(),
            generate_playlist: target.generate_playlist.unwrap_or(true),
            copy_files: target.copy_files.unwrap_or(true),
        })
    }
}
