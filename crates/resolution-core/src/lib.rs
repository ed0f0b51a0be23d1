use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use partylink_core::error::{ResolveError, Result};
use partylink_core::{Entity, PartyRecord, ResolverConfig};
use validator::Validate;

pub mod blocking;
pub mod canonical;
pub mod cluster;
pub mod exact;
pub mod normalize;
pub mod similarity;
pub mod summary;

pub use summary::{party_to_entity_index, ResolutionSummary};

use crate::normalize::{normalize_record, NormalizedRecord};
use crate::similarity::SimilarityKernel;

/// Replacement for the built-in PEP token heuristic: returns true when
/// the record belongs to a politically exposed person.
pub type PepPredicate = Arc<dyn Fn(&PartyRecord) -> bool + Send + Sync>;

/// Cooperative cancellation handle. Cloneable; `cancel` may be called
/// from any thread and takes effect at the next stage boundary.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The resolution engine. Construction validates the configuration;
/// `resolve` runs the whole batch pipeline and either returns the full
/// entity partition or nothing at all.
pub struct Resolver {
    config: ResolverConfig,
    kernel: SimilarityKernel,
    cancel: CancelToken,
    pep_predicate: Option<PepPredicate>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let kernel = SimilarityKernel::new(&config);
        Ok(Self {
            config,
            kernel,
            cancel: CancelToken::new(),
            pep_predicate: None,
        })
    }

    pub fn with_pep_predicate(mut self, predicate: PepPredicate) -> Self {
        self.pep_predicate = Some(predicate);
        self
    }

    /// Handle for cancelling a run in flight from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, records: &[PartyRecord]) -> Result<Vec<Entity>> {
        self.check_input(records)?;

        self.checkpoint("normalize")?;
        let normalized: Vec<NormalizedRecord> = records
            .iter()
            .enumerate()
            .map(|(i, r)| normalize_record(i, r, &self.config.preprocessing))
            .collect();
        tracing::info!(records = records.len(), "normalized party records");

        self.checkpoint("exact-match")?;
        let exact = exact::find_exact_matches(&normalized);
        tracing::info!(
            groups = exact.groups.len(),
            residual = exact.residual.len(),
            "indexed exact matches"
        );

        self.checkpoint("block")?;
        let blocks = blocking::build_blocks(&normalized, &exact.residual, self.config.block_size_cap);
        tracing::info!(blocks = blocks.len(), "built candidate blocks");

        self.checkpoint("cluster")?;
        let clusters = cluster::cluster(
            &normalized,
            &exact.groups,
            &blocks,
            &self.kernel,
            self.config.merge_threshold,
        )?;
        tracing::info!(clusters = clusters.len(), "merged records into clusters");

        self.checkpoint("canonicalize")?;
        let entities: Vec<Entity> = clusters
            .iter()
            .enumerate()
            .map(|(seq, members)| {
                canonical::build_entity(
                    seq + 1,
                    members,
                    records,
                    &normalized,
                    &self.kernel,
                    &self.config,
                    self.pep_predicate.as_ref(),
                )
            })
            .collect();
        tracing::info!(entities = entities.len(), "resolution complete");

        Ok(entities)
    }

    fn check_input(&self, records: &[PartyRecord]) -> Result<()> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            record
                .validate()
                .map_err(|e| ResolveError::MalformedInput {
                    party_id: record.party_id.clone(),
                    reason: e.to_string(),
                })?;
            if !seen.insert(record.party_id.as_str()) {
                return Err(ResolveError::MalformedInput {
                    party_id: record.party_id.clone(),
                    reason: "duplicate party identifier".to_string(),
                });
            }
            if record.is_empty() {
                tracing::warn!(party_id = %record.party_id, "record has no populated fields");
            }
        }
        Ok(())
    }

    fn checkpoint(&self, stage: &'static str) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::info!(stage, "run cancelled, discarding partial state");
            return Err(ResolveError::Cancelled { stage });
        }
        Ok(())
    }
}

/// One-shot entry point: validate the configuration, run the pipeline,
/// return the entities.
pub fn resolve(records: &[PartyRecord], config: ResolverConfig) -> Result<Vec<Entity>> {
    Resolver::new(config)?.resolve(records)
}
