use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Edit-distance derived similarity ratios available to field mixtures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    Ratio,
    PartialRatio,
    TokenSortRatio,
    TokenSetRatio,
}

/// One component of a field-similarity mixture. Weights may sum to any
/// positive value; the kernel normalizes by the total.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MixtureComponent {
    pub method: SimilarityMethod,
    pub weight: f64,
}

impl MixtureComponent {
    pub fn new(method: SimilarityMethod, weight: f64) -> Self {
        Self { method, weight }
    }
}

/// Per-field weights for the record-level combiner. Only fields present
/// on both sides of a pair contribute; the combiner renormalizes over
/// the comparable subset.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub name: f64,
    pub email: f64,
    pub phone: f64,
    pub address: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 0.40,
            email: 0.30,
            phone: 0.20,
            address: 0.10,
        }
    }
}

impl FieldWeights {
    pub fn total(&self) -> f64 {
        self.name + self.email + self.phone + self.address
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Preprocessing {
    pub lowercase: bool,
    pub normalize_names: bool,
    pub standardize_phone: bool,
    pub extract_address_components: bool,
}

impl Default for Preprocessing {
    fn default() -> Self {
        Self {
            lowercase: true,
            normalize_names: true,
            standardize_phone: true,
            extract_address_components: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub name_weights: Vec<MixtureComponent>,
    pub address_weights: Vec<MixtureComponent>,
    pub field_weights: FieldWeights,
    pub merge_threshold: f64,
    pub block_size_cap: usize,
    pub business_suffix_tokens: Vec<String>,
    pub pep_tokens: Vec<String>,
    pub preprocessing: Preprocessing,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name_weights: vec![
                MixtureComponent::new(SimilarityMethod::TokenSortRatio, 0.6),
                MixtureComponent::new(SimilarityMethod::PartialRatio, 0.4),
            ],
            address_weights: vec![
                MixtureComponent::new(SimilarityMethod::TokenSetRatio, 0.6),
                MixtureComponent::new(SimilarityMethod::PartialRatio, 0.4),
            ],
            field_weights: FieldWeights::default(),
            merge_threshold: 0.70,
            block_size_cap: 1000,
            business_suffix_tokens: [
                "inc",
                "corp",
                "ltd",
                "llc",
                "company",
                "corporation",
                "limited",
                "co",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            pep_tokens: [
                "senator",
                "congress",
                "minister",
                "president",
                "governor",
                "mayor",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            preprocessing: Preprocessing::default(),
        }
    }
}

impl ResolverConfig {
    /// Parse a config from YAML. Missing keys fall back to defaults;
    /// the parsed value is validated before it is returned.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ResolveError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.merge_threshold) {
            return Err(ResolveError::ConfigInvalid(format!(
                "merge_threshold {} is outside [0, 1]",
                self.merge_threshold
            )));
        }
        validate_mixture("name_weights", &self.name_weights)?;
        validate_mixture("address_weights", &self.address_weights)?;
        for (field, weight) in [
            ("name", self.field_weights.name),
            ("email", self.field_weights.email),
            ("phone", self.field_weights.phone),
            ("address", self.field_weights.address),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ResolveError::ConfigInvalid(format!(
                    "field weight for {field} must be a non-negative number, got {weight}"
                )));
            }
        }
        if self.field_weights.total() <= 0.0 {
            return Err(ResolveError::ConfigInvalid(
                "field weights must sum to a positive value".to_string(),
            ));
        }
        if self.block_size_cap == 0 {
            return Err(ResolveError::ConfigInvalid(
                "block_size_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_mixture(label: &str, mixture: &[MixtureComponent]) -> Result<()> {
    if mixture.is_empty() {
        return Err(ResolveError::ConfigInvalid(format!(
            "{label} must contain at least one component"
        )));
    }
    let mut total = 0.0;
    for component in mixture {
        if !component.weight.is_finite() || component.weight < 0.0 {
            return Err(ResolveError::ConfigInvalid(format!(
                "{label} weight must be a non-negative number, got {}",
                component.weight
            )));
        }
        total += component.weight;
    }
    if total <= 0.0 {
        return Err(ResolveError::ConfigInvalid(format!(
            "{label} weights must sum to a positive value"
        )));
    }
    Ok(())
}
