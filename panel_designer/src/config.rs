//! Weight and filter configuration.
//!
//! Both documents are JSON objects; YAML weight files need converting first.
//! Required keys are checked on the raw value before typed deserialisation so
//! a missing key is reported by name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{PanelError, Result};
use crate::models::ScoreSource;

const REQUIRED_WEIGHT_KEYS: [&str; 2] = ["type", "location"];

const REQUIRED_FILTER_KEYS: [&str; 5] = [
    "cosmic_rolling_min",
    "rolling_window_size",
    "cosmic_min",
    "cosmic_density_min",
    "padding",
];

/// Multipliers used by the ScoreEngine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    pub type_weight: HashMap<String, f64>,
    pub location_weight: HashMap<String, f64>,
    pub gene_multiplier: Option<HashMap<String, f64>>,
}

impl WeightTable {
    pub fn from_value(value: &Value, source_file: &str) -> Result<Self> {
        require_keys(value, &REQUIRED_WEIGHT_KEYS, source_file)?;

        let type_weight: HashMap<String, f64> = serde_json::from_value(value["type"].clone())?;
        let location_weight: HashMap<String, f64> =
            serde_json::from_value(value["location"].clone())?;
        let gene_multiplier = match value.get("genes") {
            Some(Value::Null) | None => None,
            Some(genes) => Some(serde_json::from_value::<HashMap<String, f64>>(genes.clone())?),
        };

        debug!(
            "Loaded {} type weights and {} location weights",
            type_weight.len(),
            location_weight.len()
        );

        Ok(Self {
            type_weight,
            location_weight,
            gene_multiplier,
        })
    }

    pub fn type_weight(&self, label: &str) -> f64 {
        self.type_weight.get(label).copied().unwrap_or(0.0)
    }

    pub fn location_weight(&self, label: Option<&str>) -> f64 {
        label
            .and_then(|l| self.location_weight.get(l))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Optional prefilter applied to the raw annotation table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnnotationFilter {
    pub exonic_list: Option<Vec<String>>,
    pub mut_list: Option<Vec<String>>,
    pub gnomad_max: Option<f64>,
}

impl AnnotationFilter {
    fn is_empty(&self) -> bool {
        self.exonic_list.is_none() && self.mut_list.is_none() && self.gnomad_max.is_none()
    }
}

/// Thresholds for the density, selection and collapse stages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterSettings {
    pub cosmic_rolling_min: f64,
    pub rolling_window_size: usize,
    pub cosmic_min: f64,
    pub cosmic_density_min: f64,
    pub padding: i64,
    #[serde(skip)]
    pub annotation: Option<AnnotationFilter>,
}

impl FilterSettings {
    pub fn from_value(value: &Value, source_file: &str) -> Result<Self> {
        require_keys(value, &REQUIRED_FILTER_KEYS, source_file)?;

        let mut settings: FilterSettings = serde_json::from_value(value.clone())?;
        if settings.rolling_window_size == 0 {
            return Err(PanelError::InvalidConfigValue {
                key: "rolling_window_size".into(),
                reason: "window must hold at least one record".into(),
            });
        }
        if settings.padding < 0 {
            return Err(PanelError::InvalidConfigValue {
                key: "padding".into(),
                reason: "padding cannot be negative".into(),
            });
        }

        let annotation: AnnotationFilter = serde_json::from_value(value.clone())?;
        settings.annotation = (!annotation.is_empty()).then_some(annotation);
        Ok(settings)
    }
}

/// How scores enter the pipeline, decided once by the caller.
#[derive(Debug, Clone)]
pub enum Scoring {
    FromType(WeightTable),
    Precomputed,
}

impl Scoring {
    pub fn source(&self) -> ScoreSource {
        match self {
            Scoring::FromType(_) => ScoreSource::FromType,
            Scoring::Precomputed => ScoreSource::Precomputed,
        }
    }
}

/// Everything a panel design run needs, passed by reference into every stage.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub scoring: Scoring,
    pub filters: FilterSettings,
    pub threads: usize,
}

fn require_keys(value: &Value, keys: &[&str], source_file: &str) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| PanelError::config(keys[0], source_file))?;
    for key in keys {
        if !object.contains_key(*key) {
            return Err(PanelError::config(key, source_file));
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| {
        let yaml = matches!(
            path.extension().and_then(|x| x.to_str()),
            Some("yaml" | "yml")
        );
        if yaml {
            PanelError::InvalidConfigValue {
                key: path.display().to_string(),
                reason: "only JSON configuration is read, convert the YAML document to JSON".into(),
            }
        } else {
            e.into()
        }
    })
}

pub fn load_weights(path: &Path) -> Result<WeightTable> {
    info!("Reading weight table from {}", path.display());
    WeightTable::from_value(&read_json(path)?, &path.display().to_string())
}

pub fn load_filter_settings(path: &Path) -> Result<FilterSettings> {
    info!("Reading filter settings from {}", path.display());
    FilterSettings::from_value(&read_json(path)?, &path.display().to_string())
}
