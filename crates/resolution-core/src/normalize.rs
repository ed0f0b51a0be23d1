use partylink_core::config::Preprocessing;
use partylink_core::PartyRecord;

/// A party record with its cleaned matching fields, tied back to the
/// input sequence by position. Empty string means the field is absent.
#[derive(Clone, Debug)]
pub struct NormalizedRecord {
    pub idx: usize,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

pub fn normalize_record(idx: usize, record: &PartyRecord, prep: &Preprocessing) -> NormalizedRecord {
    let name = if prep.normalize_names {
        if prep.lowercase {
            normalize_name(&record.name)
        } else {
            collapse_whitespace(&strip_punctuation(&record.name))
        }
    } else {
        record.name.clone()
    };

    let email = {
        let trimmed = record.email.trim();
        if prep.lowercase {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    };

    let phone = if prep.standardize_phone {
        normalize_phone(&record.phone)
    } else {
        record.phone.clone()
    };

    let address = if prep.extract_address_components {
        let collapsed = collapse_whitespace(&record.address);
        if prep.lowercase {
            collapsed.to_lowercase()
        } else {
            collapsed
        }
    } else {
        record.address.clone()
    };

    NormalizedRecord {
        idx,
        name,
        email,
        phone,
        address,
    }
}

/// Canonical name cleaning: punctuation becomes whitespace, whitespace
/// runs collapse to a single space, and the result is lower-cased.
/// Aggressive on purpose: the blocker's hit rate on noisy source data
/// depends on it.
pub fn normalize_name(raw: &str) -> String {
    collapse_whitespace(&strip_punctuation(raw)).to_lowercase()
}

pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whole-word tokens of a raw name, cleaned the same way the matcher
/// sees names. Used for business-suffix and PEP token screening.
pub fn name_tokens(raw: &str) -> Vec<String> {
    normalize_name(raw)
        .split_whitespace()
        .map(|t| t.to_string())
        .collect()
}

fn strip_punctuation(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
