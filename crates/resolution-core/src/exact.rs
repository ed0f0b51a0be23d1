use std::collections::BTreeMap;

use crate::normalize::NormalizedRecord;

/// First-pass grouping on strong identifiers. `groups` holds record
/// indices in input order; `residual` is everything left for blocking.
#[derive(Debug, Default)]
pub struct ExactMatches {
    pub groups: Vec<Vec<usize>>,
    pub residual: Vec<usize>,
}

/// Bucket records by normalized email, then by normalized phone; every
/// bucket with two or more members becomes an exact-match group. Empty
/// keys never group. A record can land in one group of each kind; the
/// clusterer's union-find merges overlaps, which is what makes
/// email/phone absorption hold across chains.
pub fn find_exact_matches(records: &[NormalizedRecord]) -> ExactMatches {
    let mut placed = vec![false; records.len()];
    let mut groups = Vec::new();

    let mut by_email: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        if !record.email.is_empty() {
            by_email.entry(record.email.as_str()).or_default().push(i);
        }
    }
    collect_groups(by_email, &mut placed, &mut groups);

    let mut by_phone: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        if !record.phone.is_empty() {
            by_phone.entry(record.phone.as_str()).or_default().push(i);
        }
    }
    collect_groups(by_phone, &mut placed, &mut groups);

    let residual = (0..records.len()).filter(|&i| !placed[i]).collect();
    ExactMatches { groups, residual }
}

fn collect_groups(
    buckets: BTreeMap<&str, Vec<usize>>,
    placed: &mut [bool],
    groups: &mut Vec<Vec<usize>>,
) {
    for (_, members) in buckets {
        if members.len() >= 2 {
            for &m in &members {
                placed[m] = true;
            }
            groups.push(members);
        }
    }
}
