use std::collections::BTreeMap;

use crate::normalize::NormalizedRecord;

/// Candidate-pair generation: map each residual record to cheap keys
/// and group records sharing a key. A record may appear in several
/// blocks; double coverage only raises recall because the clusterer
/// unions pairs idempotently.
pub fn build_blocks(
    records: &[NormalizedRecord],
    residual: &[usize],
    cap: usize,
) -> BTreeMap<String, Vec<usize>> {
    let mut blocks: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for &i in residual {
        for key in blocking_keys(&records[i]) {
            blocks.entry(key).or_default().push(i);
        }
    }

    let before = blocks.len();
    blocks.retain(|key, members| {
        if members.len() > cap {
            tracing::debug!(key = %key, size = members.len(), cap, "dropping oversized block");
            return false;
        }
        members.len() >= 2
    });
    tracing::debug!(kept = blocks.len(), dropped = before - blocks.len(), "built blocks");

    blocks
}

/// Blocking keys for one record. All prefixes are character-based.
pub fn blocking_keys(record: &NormalizedRecord) -> Vec<String> {
    let mut keys = Vec::new();

    let name_prefix: String = record.name.chars().take(5).collect();
    if name_prefix.chars().count() == 5 {
        keys.push(format!("name:{name_prefix}"));
    }

    for token in record.name.split_whitespace() {
        let word_prefix: String = token.chars().take(4).collect();
        if word_prefix.chars().count() == 4 {
            keys.push(format!("word:{word_prefix}"));
        }
    }

    if let Some((_, domain)) = record.email.split_once('@') {
        if domain.chars().count() >= 3 {
            let domain_prefix: String = domain.chars().take(6).collect();
            keys.push(format!("email:{domain_prefix}"));
        }
    }

    if record.phone.chars().count() >= 6 {
        let phone_prefix: String = record.phone.chars().take(6).collect();
        keys.push(format!("phone:{phone_prefix}"));
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(idx: usize, name: &str, email: &str, phone: &str) -> NormalizedRecord {
        NormalizedRecord {
            idx,
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            address: String::new(),
        }
    }

    #[test]
    fn name_key_requires_five_chars() {
        let keys = blocking_keys(&normalized(0, "alex", "", ""));
        assert!(keys.iter().all(|k| !k.starts_with("name:")));
        assert!(keys.contains(&"word:alex".to_string()));

        let keys = blocking_keys(&normalized(0, "alexis", "", ""));
        assert!(keys.contains(&"name:alexi".to_string()));
    }

    #[test]
    fn every_long_name_token_gets_a_word_key() {
        let keys = blocking_keys(&normalized(0, "senator jane doe", "", ""));
        assert!(keys.contains(&"word:sena".to_string()));
        assert!(keys.contains(&"word:jane".to_string()));
        // "doe" is below the four-char floor.
        assert!(!keys.iter().any(|k| k == "word:doe"));
    }

    #[test]
    fn email_key_uses_domain_prefix() {
        let keys = blocking_keys(&normalized(0, "", "user@example.com", ""));
        assert!(keys.contains(&"email:exampl".to_string()));

        // Domain shorter than six chars is taken whole; shorter than
        // three emits nothing.
        let keys = blocking_keys(&normalized(0, "", "u@x.co", ""));
        assert!(keys.contains(&"email:x.co".to_string()));
        let keys = blocking_keys(&normalized(0, "", "u@xy", ""));
        assert!(keys.is_empty());
    }

    #[test]
    fn phone_key_requires_six_digits() {
        let keys = blocking_keys(&normalized(0, "", "", "14155550100"));
        assert!(keys.contains(&"phone:141555".to_string()));
        assert!(blocking_keys(&normalized(0, "", "", "12345")).is_empty());
    }

    #[test]
    fn oversized_blocks_are_dropped() {
        let records: Vec<NormalizedRecord> = (0..10)
            .map(|i| normalized(i, "shared name", "", ""))
            .collect();
        let residual: Vec<usize> = (0..10).collect();

        let blocks = build_blocks(&records, &residual, 1000);
        assert!(blocks.contains_key("name:share"));

        let blocks = build_blocks(&records, &residual, 5);
        assert!(blocks.is_empty());
    }

    #[test]
    fn singleton_blocks_carry_no_pairs_and_are_dropped() {
        let records = vec![
            normalized(0, "alpha one", "", ""),
            normalized(1, "omega two", "", ""),
        ];
        let blocks = build_blocks(&records, &[0, 1], 1000);
        assert!(blocks.is_empty());
    }
}
