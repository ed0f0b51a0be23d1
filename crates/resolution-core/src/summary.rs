use std::collections::BTreeMap;

use partylink_core::{Entity, EntityKind};
use serde::Serialize;

/// Aggregate view of one resolution run, for run reports and
/// reconciliation checks downstream.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResolutionSummary {
    pub total_entities: usize,
    pub individual_entities: usize,
    pub business_entities: usize,
    pub pep_entities: usize,
    pub total_records: usize,
    pub avg_confidence: f64,
    pub avg_records_per_entity: f64,
}

impl ResolutionSummary {
    pub fn from_entities(entities: &[Entity]) -> Self {
        if entities.is_empty() {
            return Self::default();
        }
        let total_records: usize = entities.iter().map(Entity::record_count).sum();
        let confidence_sum: f64 = entities.iter().map(|e| e.confidence).sum();
        Self {
            total_entities: entities.len(),
            individual_entities: entities
                .iter()
                .filter(|e| e.kind == EntityKind::Individual)
                .count(),
            business_entities: entities
                .iter()
                .filter(|e| e.kind == EntityKind::Business)
                .count(),
            pep_entities: entities.iter().filter(|e| e.pep).count(),
            total_records,
            avg_confidence: confidence_sum / entities.len() as f64,
            avg_records_per_entity: total_records as f64 / entities.len() as f64,
        }
    }
}

/// Lookup from member party id to owning entity id, for consumers that
/// join transactions or account references onto resolved entities.
pub fn party_to_entity_index(entities: &[Entity]) -> BTreeMap<&str, &str> {
    let mut index = BTreeMap::new();
    for entity in entities {
        for party_id in &entity.party_ids {
            index.insert(party_id.as_str(), entity.entity_id.as_str());
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, members: &[&str], kind: EntityKind, pep: bool, confidence: f64) -> Entity {
        Entity {
            entity_id: id.to_string(),
            party_ids: members.iter().map(|m| m.to_string()).collect(),
            resolved_name: String::new(),
            resolved_email: String::new(),
            resolved_phone: String::new(),
            resolved_address: String::new(),
            resolved_country: String::new(),
            source_systems: Vec::new(),
            confidence,
            kind,
            pep,
        }
    }

    #[test]
    fn summary_counts_and_averages() {
        let entities = vec![
            entity("E000001", &["P1", "P2"], EntityKind::Individual, false, 0.9),
            entity("E000002", &["P3"], EntityKind::Business, true, 0.7),
        ];
        let summary = ResolutionSummary::from_entities(&entities);
        assert_eq!(summary.total_entities, 2);
        assert_eq!(summary.individual_entities, 1);
        assert_eq!(summary.business_entities, 1);
        assert_eq!(summary.pep_entities, 1);
        assert_eq!(summary.total_records, 3);
        assert!((summary.avg_confidence - 0.8).abs() < 1e-9);
        assert!((summary.avg_records_per_entity - 1.5).abs() < 1e-9);
    }

    #[test]
    fn empty_run_summarizes_to_zeroes() {
        let summary = ResolutionSummary::from_entities(&[]);
        assert_eq!(summary.total_entities, 0);
        assert_eq!(summary.avg_confidence, 0.0);
    }

    #[test]
    fn index_maps_every_member_once() {
        let entities = vec![
            entity("E000001", &["P1", "P2"], EntityKind::Individual, false, 0.9),
            entity("E000002", &["P3"], EntityKind::Business, false, 0.7),
        ];
        let index = party_to_entity_index(&entities);
        assert_eq!(index.len(), 3);
        assert_eq!(index["P1"], "E000001");
        assert_eq!(index["P3"], "E000002");
    }
}
