use std::collections::BTreeSet;

use partylink_core::config::{FieldWeights, MixtureComponent, ResolverConfig, SimilarityMethod};
use strsim::normalized_levenshtein;

use crate::normalize::NormalizedRecord;

/// Character-level similarity in [0, 1], derived from edit distance.
pub fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Best ratio of the shorter string against every equal-length
/// character window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let (short, long) = if chars_a.len() <= chars_b.len() {
        (chars_a, chars_b)
    } else {
        (chars_b, chars_a)
    };

    if short.is_empty() {
        return if long.is_empty() { 1.0 } else { 0.0 };
    }
    let needle: String = short.iter().collect();
    if short.len() == long.len() {
        return ratio(&needle, &long.iter().collect::<String>());
    }

    let mut best = 0.0;
    for start in 0..=(long.len() - short.len()) {
        let window: String = long[start..start + short.len()].iter().collect();
        let score = ratio(&needle, &window);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    best
}

/// Ratio over whitespace tokens sorted and rejoined, making the score
/// insensitive to word order.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Fuzzywuzzy-style set ratio: scores the sorted token intersection
/// against each side's intersection-plus-remainder, taking the best of
/// the three pairings. Forgiving when one name embeds the other.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let common = set_a.intersection(&set_b).copied().collect::<Vec<_>>().join(" ");
    let only_a = set_a.difference(&set_b).copied().collect::<Vec<_>>().join(" ");
    let only_b = set_b.difference(&set_a).copied().collect::<Vec<_>>().join(" ");

    let combined_a = join_parts(&common, &only_a);
    let combined_b = join_parts(&common, &only_b);

    ratio(&common, &combined_a)
        .max(ratio(&common, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn join_parts(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base} {rest}"),
    }
}

fn sorted_tokens(value: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn apply_method(method: SimilarityMethod, a: &str, b: &str) -> f64 {
    match method {
        SimilarityMethod::Ratio => ratio(a, b),
        SimilarityMethod::PartialRatio => partial_ratio(a, b),
        SimilarityMethod::TokenSortRatio => token_sort_ratio(a, b),
        SimilarityMethod::TokenSetRatio => token_set_ratio(a, b),
    }
}

fn mixture_score(a: &str, b: &str, mixture: &[MixtureComponent]) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for component in mixture {
        if component.weight <= 0.0 {
            continue;
        }
        weighted += component.weight * apply_method(component.method, a, b);
        total += component.weight;
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Pairwise field and record scoring, parameterized by the configured
/// mixtures and field weights. Pure and deterministic: scores depend
/// only on the two inputs.
pub struct SimilarityKernel {
    name_mixture: Vec<MixtureComponent>,
    address_mixture: Vec<MixtureComponent>,
    weights: FieldWeights,
}

impl SimilarityKernel {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            name_mixture: config.name_weights.clone(),
            address_mixture: config.address_weights.clone(),
            weights: config.field_weights.clone(),
        }
    }

    pub fn name_similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        mixture_score(a, b, &self.name_mixture)
    }

    pub fn email_similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        let parts_a: Vec<&str> = a.split('@').collect();
        let parts_b: Vec<&str> = b.split('@').collect();
        if parts_a.len() == 2 && parts_b.len() == 2 {
            let domain_sim = if parts_a[1] == parts_b[1] { 1.0 } else { 0.0 };
            0.3 * ratio(parts_a[0], parts_b[0]) + 0.7 * domain_sim
        } else {
            ratio(a, b)
        }
    }

    pub fn phone_similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        if a.chars().count() >= 10 && b.chars().count() >= 10 {
            let tail_a: Vec<char> = a.chars().rev().take(10).collect();
            let tail_b: Vec<char> = b.chars().rev().take(10).collect();
            if tail_a == tail_b {
                return 0.9;
            }
        }
        ratio(a, b)
    }

    pub fn address_similarity(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        mixture_score(a, b, &self.address_mixture)
    }

    /// Record-level combiner: weighted sum over the fields populated on
    /// both sides, renormalized by the weight of that subset so sparse
    /// contact data never penalizes a pair that matches where data
    /// exists. No comparable fields at all scores 0.
    pub fn record_similarity(&self, a: &NormalizedRecord, b: &NormalizedRecord) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;

        if !a.name.is_empty() && !b.name.is_empty() {
            weighted += self.weights.name * self.name_similarity(&a.name, &b.name);
            total += self.weights.name;
        }
        if !a.email.is_empty() && !b.email.is_empty() {
            weighted += self.weights.email * self.email_similarity(&a.email, &b.email);
            total += self.weights.email;
        }
        if !a.phone.is_empty() && !b.phone.is_empty() {
            weighted += self.weights.phone * self.phone_similarity(&a.phone, &b.phone);
            total += self.weights.phone;
        }
        if !a.address.is_empty() && !b.address.is_empty() {
            weighted += self.weights.address * self.address_similarity(&a.address, &b.address);
            total += self.weights.address;
        }

        if total > 0.0 {
            weighted / total
        } else {
            0.0
        }
    }

    /// Threshold test used on the clustering hot path. Walks the fields
    /// in combiner order and stops as soon as the remaining fields
    /// cannot lift the weighted sum up to the threshold, so a weak name
    /// score usually skips the rest of the comparisons. Decides exactly
    /// like `record_similarity(a, b) >= threshold`.
    pub fn meets_threshold(
        &self,
        a: &NormalizedRecord,
        b: &NormalizedRecord,
        threshold: f64,
    ) -> bool {
        let name_cmp = !a.name.is_empty() && !b.name.is_empty();
        let email_cmp = !a.email.is_empty() && !b.email.is_empty();
        let phone_cmp = !a.phone.is_empty() && !b.phone.is_empty();
        let address_cmp = !a.address.is_empty() && !b.address.is_empty();

        let total = [
            (name_cmp, self.weights.name),
            (email_cmp, self.weights.email),
            (phone_cmp, self.weights.phone),
            (address_cmp, self.weights.address),
        ]
        .iter()
        .filter(|(comparable, _)| *comparable)
        .map(|(_, w)| w)
        .sum::<f64>();

        if total <= 0.0 {
            return 0.0 >= threshold;
        }
        let target = threshold * total;
        let mut acc = 0.0;
        let mut remaining = total;

        if name_cmp {
            acc += self.weights.name * self.name_similarity(&a.name, &b.name);
            remaining -= self.weights.name;
            if acc + remaining < target {
                return false;
            }
        }
        if email_cmp {
            acc += self.weights.email * self.email_similarity(&a.email, &b.email);
            remaining -= self.weights.email;
            if acc + remaining < target {
                return false;
            }
        }
        if phone_cmp {
            acc += self.weights.phone * self.phone_similarity(&a.phone, &b.phone);
            remaining -= self.weights.phone;
            if acc + remaining < target {
                return false;
            }
        }
        if address_cmp {
            acc += self.weights.address * self.address_similarity(&a.address, &b.address);
        }
        acc >= target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partylink_core::config::ResolverConfig;

    fn kernel() -> SimilarityKernel {
        SimilarityKernel::new(&ResolverConfig::default())
    }

    fn normalized(name: &str, email: &str, phone: &str, address: &str) -> NormalizedRecord {
        NormalizedRecord {
            idx: 0,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
        }
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        let mid = ratio("kitten", "sitten");
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(token_sort_ratio("john smith", "smith john"), 1.0);
        assert!(token_sort_ratio("john smith", "jane smith") < 1.0);
    }

    #[test]
    fn partial_matches_embedded_strings() {
        assert_eq!(partial_ratio("jane roe", "senator jane roe"), 1.0);
        assert_eq!(partial_ratio("", ""), 1.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn token_set_forgives_extra_tokens() {
        assert_eq!(token_set_ratio("12 elm st", "12 elm st apt 4"), 1.0);
        assert!(token_set_ratio("12 elm st", "99 oak ave") < 0.6);
    }

    #[test]
    fn email_same_domain_different_local() {
        let k = kernel();
        assert_eq!(k.email_similarity("js@x.com", "js@x.com"), 1.0);
        let sim = k.email_similarity("john1@x.com", "john2@x.com");
        // Domain match contributes 0.7, near-equal locals most of the rest.
        assert!(sim > 0.9 && sim < 1.0);
        assert!(k.email_similarity("john@x.com", "john@y.com") < 0.4);
        assert_eq!(k.email_similarity("", "js@x.com"), 0.0);
    }

    #[test]
    fn email_without_at_falls_back_to_ratio() {
        let k = kernel();
        let sim = k.email_similarity("johnsmith", "johnsmith");
        assert_eq!(sim, 1.0);
        assert!(k.email_similarity("a@b@c", "a@b") < 1.0);
    }

    #[test]
    fn phone_last_ten_digits_score() {
        let k = kernel();
        assert_eq!(k.phone_similarity("14155550100", "14155550100"), 1.0);
        assert_eq!(k.phone_similarity("14155550100", "4155550100"), 0.9);
        assert!(k.phone_similarity("4155550100", "4155550199") < 0.9);
        assert_eq!(k.phone_similarity("", "123"), 0.0);
    }

    #[test]
    fn combiner_renormalizes_over_comparable_fields() {
        let k = kernel();
        // Only phone comparable, and it matches exactly.
        let a = normalized("john smith", "", "4155550100", "");
        let b = normalized("", "", "4155550100", "");
        assert_eq!(k.record_similarity(&a, &b), 1.0);

        // No comparable fields at all.
        let a = normalized("john", "", "", "");
        let b = normalized("", "x@y.z", "", "");
        assert_eq!(k.record_similarity(&a, &b), 0.0);
    }

    #[test]
    fn combiner_weights_name_highest() {
        let k = kernel();
        let a = normalized("john smith", "js@x.com", "", "");
        let b = normalized("john smith", "other@else.org", "", "");
        let sim = k.record_similarity(&a, &b);
        assert!(sim > 0.5, "exact name should dominate, got {sim}");
    }

    #[test]
    fn threshold_test_agrees_with_full_combiner() {
        let k = kernel();
        let cases = [
            (
                normalized("john smith", "js@x.com", "4155550100", "12 elm st"),
                normalized("jon smith", "js@x.com", "4155550100", "12 elm street"),
            ),
            (
                normalized("mary johnson", "", "", ""),
                normalized("mary j johnson", "", "", ""),
            ),
            (
                normalized("alpha", "a@b.c", "", ""),
                normalized("omega", "z@y.x", "", ""),
            ),
            (
                normalized("", "", "", ""),
                normalized("", "", "", ""),
            ),
        ];
        for threshold in [0.0, 0.5, 0.7, 0.9, 1.0] {
            for (a, b) in &cases {
                assert_eq!(
                    k.meets_threshold(a, b, threshold),
                    k.record_similarity(a, b) >= threshold,
                    "disagreement at threshold {threshold}"
                );
            }
        }
    }
}
