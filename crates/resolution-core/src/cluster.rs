use std::collections::BTreeMap;

use partylink_core::error::{ResolveError, Result};

use crate::normalize::NormalizedRecord;
use crate::similarity::SimilarityKernel;

/// Union-find with path compression and union by rank. Rank ties attach
/// the larger index under the smaller one, so representatives depend
/// only on input order.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Result<Self> {
        let mut parent = Vec::new();
        parent
            .try_reserve_exact(n)
            .map_err(|e| ResolveError::ResourceExhausted {
                stage: "union-find",
                reason: e.to_string(),
            })?;
        parent.extend(0..n);

        let mut rank = Vec::new();
        rank.try_reserve_exact(n)
            .map_err(|e| ResolveError::ResourceExhausted {
                stage: "union-find",
                reason: e.to_string(),
            })?;
        rank.resize(n, 0);

        Ok(Self { parent, rank })
    }

    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = i;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        use std::cmp::Ordering;
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            Ordering::Less => self.parent[root_a] = root_b,
            Ordering::Greater => self.parent[root_b] = root_a,
            Ordering::Equal => {
                let (keep, absorb) = if root_a < root_b {
                    (root_a, root_b)
                } else {
                    (root_b, root_a)
                };
                self.parent[absorb] = keep;
                self.rank[keep] += 1;
            }
        }
    }
}

/// Merge records into clusters: seed the union-find with the
/// exact-match groups, then fuzzily compare every unordered pair inside
/// each block and union pairs at or above the merge threshold. The
/// final read-out partitions every record, with records touched by no
/// block or group coming out as singletons.
///
/// Clusters are ordered by their smallest member index and members keep
/// input order, so the partition is identical across runs.
pub fn cluster(
    records: &[NormalizedRecord],
    exact_groups: &[Vec<usize>],
    blocks: &BTreeMap<String, Vec<usize>>,
    kernel: &SimilarityKernel,
    threshold: f64,
) -> Result<Vec<Vec<usize>>> {
    let mut uf = UnionFind::new(records.len())?;

    for group in exact_groups {
        for pair in group.windows(2) {
            uf.union(pair[0], pair[1]);
        }
    }

    let mut compared = 0usize;
    for members in blocks.values() {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i], members[j]);
                if uf.find(a) == uf.find(b) {
                    continue;
                }
                compared += 1;
                if kernel.meets_threshold(&records[a], &records[b], threshold) {
                    uf.union(a, b);
                }
            }
        }
    }
    tracing::debug!(pairs = compared, "scored candidate pairs");

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..records.len() {
        components.entry(uf.find(i)).or_default().push(i);
    }
    let mut clusters: Vec<Vec<usize>> = components.into_values().collect();
    clusters.sort_by_key(|members| members[0]);
    Ok(clusters)
}
