use std::collections::BTreeSet;

use partylink_core::{Entity, EntityKind, PartyRecord};
use partylink_core::config::ResolverConfig;

use crate::normalize::{name_tokens, NormalizedRecord};
use crate::similarity::SimilarityKernel;
use crate::PepPredicate;

/// Collapse one cluster to its entity. `entity_seq` is the one-based
/// emission counter; `cluster` holds member indices in input order.
pub fn build_entity(
    entity_seq: usize,
    cluster: &[usize],
    records: &[PartyRecord],
    normalized: &[NormalizedRecord],
    kernel: &SimilarityKernel,
    config: &ResolverConfig,
    pep_predicate: Option<&PepPredicate>,
) -> Entity {
    let members: Vec<&PartyRecord> = cluster.iter().map(|&i| &records[i]).collect();

    let party_ids = members.iter().map(|r| r.party_id.clone()).collect();
    let source_systems: Vec<String> = members
        .iter()
        .filter(|r| !r.source_system.is_empty())
        .map(|r| r.source_system.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let kind = classify(&members, &config.business_suffix_tokens);
    let pep = match pep_predicate {
        Some(predicate) => members.iter().any(|&r| predicate(r)),
        None => members
            .iter()
            .any(|r| contains_token(&r.name, &config.pep_tokens)),
    };

    Entity {
        entity_id: format!("E{entity_seq:06}"),
        party_ids,
        resolved_name: longest_non_empty(members.iter().map(|r| r.name.as_str())),
        resolved_email: first_non_empty(members.iter().map(|r| r.email.as_str())),
        resolved_phone: first_non_empty(members.iter().map(|r| r.phone.as_str())),
        resolved_address: longest_non_empty(members.iter().map(|r| r.address.as_str())),
        resolved_country: modal_non_empty(members.iter().map(|r| r.country.as_str())),
        source_systems,
        confidence: confidence(cluster, normalized, kernel),
        kind,
        pep,
    }
}

/// Singletons sit at the 0.7 baseline. Larger clusters score the mean
/// pairwise record similarity plus a size bonus, clamped into
/// [0.7, 1.0]; the lower clamp keeps clusters joined purely by a strong
/// key (same phone, unrelated names) from scoring below a lone record.
fn confidence(cluster: &[usize], normalized: &[NormalizedRecord], kernel: &SimilarityKernel) -> f64 {
    if cluster.len() <= 1 {
        return 0.7;
    }
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..cluster.len() {
        for j in (i + 1)..cluster.len() {
            sum += kernel.record_similarity(&normalized[cluster[i]], &normalized[cluster[j]]);
            pairs += 1;
        }
    }
    let mean = sum / pairs as f64;
    let size_bonus = (0.05 * cluster.len() as f64).min(0.2);
    (mean + size_bonus).clamp(0.7, 1.0)
}

fn classify(members: &[&PartyRecord], suffix_tokens: &[String]) -> EntityKind {
    if members
        .iter()
        .any(|r| contains_token(&r.name, suffix_tokens))
    {
        return EntityKind::Business;
    }
    let single_token = members
        .iter()
        .filter(|r| name_tokens(&r.name).len() <= 1)
        .count();
    if single_token * 2 > members.len() {
        EntityKind::Business
    } else {
        EntityKind::Individual
    }
}

fn contains_token(name: &str, tokens: &[String]) -> bool {
    name_tokens(name)
        .iter()
        .any(|word| tokens.iter().any(|t| t == word))
}

fn first_non_empty<'a>(mut values: impl Iterator<Item = &'a str>) -> String {
    values
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn longest_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut best = "";
    let mut best_len = 0usize;
    for value in values {
        let len = value.chars().count();
        if len > best_len {
            best = value;
            best_len = len;
        }
    }
    best.to_string()
}

fn modal_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best = "";
    let mut best_count = 0usize;
    for (value, count) in counts {
        if count > best_count {
            best = value;
            best_count = count;
        }
    }
    best.to_string()
}
