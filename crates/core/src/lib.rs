use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod config;
pub mod error;

pub use config::{FieldWeights, MixtureComponent, Preprocessing, ResolverConfig, SimilarityMethod};
pub use error::{ResolveError, Result};

pub const PROJECT_NAME: &str = "partylink";
pub const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One party record as delivered by a source system. Missing fields are
/// represented by the empty string; `attributes` carries source-specific
/// indices and account references through the pipeline untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct PartyRecord {
    #[validate(length(min = 1))]
    pub party_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub source_system: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl PartyRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.address.is_empty()
            && self.country.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Individual,
    Business,
}

/// A resolved entity: one cluster of party records collapsed to its
/// canonical representative values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub party_ids: Vec<String>,
    pub resolved_name: String,
    pub resolved_email: String,
    pub resolved_phone: String,
    pub resolved_address: String,
    pub resolved_country: String,
    pub source_systems: Vec<String>,
    pub confidence: f64,
    pub kind: EntityKind,
    pub pep: bool,
}

impl Entity {
    pub fn record_count(&self) -> usize {
        self.party_ids.len()
    }
}
