#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence adapter for the craft spec store.
//!
//! Two representations are produced. The store document is a JSON map
//! keyed by `"{skill}_{item}"` whose values carry the observed costs,
//! recipe and observation time; entries are retained until the operator
//! clears them, never expired. The export string wraps the same
//! document in a versioned single-line `skills:v1:<count>:<payload>`
//! envelope suitable for clipboard transfer between sessions.
//!
//! The map key exists for compatibility with the external store shape;
//! decoding trusts the skill and item fields embedded in each value, so
//! names containing the separator character cannot corrupt a lookup.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use skill_advisor_core::{
    CraftItemSpec, CraftKey, CraftSpecEntry, ItemId, MaterialRequirement, SkillId, Timestamp,
};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const EXPORT_DOMAIN: &str = "skills";
const EXPORT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded export payload.
pub const EXPORT_HEADER: &str = "skills:v1";
/// Delimiter separating the prefix, entry count and payload.
const FIELD_DELIMITER: char = ':';

/// Single requirement line as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PersistedRequirement {
    #[serde(rename = "itemName")]
    item_name: String,
    #[serde(rename = "requiredQty")]
    required_qty: u32,
    #[serde(
        rename = "availableQty",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    available_qty: Option<u64>,
}

/// Store value persisted per `(skill, item)` pair.
///
/// `actionTime` and `observedAt` are whole milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PersistedSpec {
    #[serde(rename = "itemName")]
    item_name: String,
    skill: String,
    xp: f64,
    #[serde(rename = "actionTime")]
    action_time_millis: u64,
    requirements: Vec<PersistedRequirement>,
    #[serde(rename = "observedAt")]
    observed_at_millis: u64,
}

impl PersistedSpec {
    fn from_entry(entry: &CraftSpecEntry) -> Self {
        Self {
            item_name: entry.spec.item.as_str().to_owned(),
            skill: entry.spec.skill.as_str().to_owned(),
            xp: entry.spec.xp_per_action,
            action_time_millis: u64::try_from(entry.spec.time_per_action.as_millis())
                .unwrap_or(u64::MAX),
            requirements: entry
                .spec
                .requirements
                .iter()
                .map(|requirement| PersistedRequirement {
                    item_name: requirement.item.as_str().to_owned(),
                    required_qty: requirement.quantity_per_craft,
                    available_qty: requirement.available,
                })
                .collect(),
            observed_at_millis: entry.observed_at.as_millis(),
        }
    }

    fn into_entry(self) -> CraftSpecEntry {
        CraftSpecEntry {
            spec: CraftItemSpec {
                skill: SkillId::new(self.skill),
                item: ItemId::new(self.item_name),
                xp_per_action: self.xp,
                time_per_action: Duration::from_millis(self.action_time_millis),
                requirements: self
                    .requirements
                    .into_iter()
                    .map(|requirement| MaterialRequirement {
                        item: ItemId::new(requirement.item_name),
                        quantity_per_craft: requirement.required_qty,
                        available: requirement.available_qty,
                    })
                    .collect(),
            },
            observed_at: Timestamp::from_millis(self.observed_at_millis),
        }
    }
}

fn store_key(key: &CraftKey) -> String {
    format!("{}_{}", key.skill(), key.item())
}

fn persisted_map<'a, I>(entries: I) -> BTreeMap<String, PersistedSpec>
where
    I: IntoIterator<Item = (&'a CraftKey, &'a CraftSpecEntry)>,
{
    entries
        .into_iter()
        .map(|(key, entry)| (store_key(key), PersistedSpec::from_entry(entry)))
        .collect()
}

/// Serializes spec entries into the JSON store document.
#[must_use]
pub fn encode_store<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a CraftKey, &'a CraftSpecEntry)>,
{
    serde_json::to_string(&persisted_map(entries)).expect("store serialization never fails")
}

/// Deserializes a JSON store document back into spec entries.
///
/// Entries are returned in key order; the embedded value fields are
/// authoritative and the map keys are ignored.
pub fn decode_store(document: &str) -> Result<Vec<CraftSpecEntry>, StoreDecodeError> {
    let map: BTreeMap<String, PersistedSpec> =
        serde_json::from_str(document).map_err(StoreDecodeError::InvalidDocument)?;
    Ok(map.into_values().map(PersistedSpec::into_entry).collect())
}

/// Encodes spec entries into a single-line export string for clipboard
/// transfer.
#[must_use]
pub fn encode_export<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a CraftKey, &'a CraftSpecEntry)>,
{
    let map = persisted_map(entries);
    let json = serde_json::to_vec(&map).expect("export serialization never fails");
    let payload = STANDARD_NO_PAD.encode(json);
    format!("{EXPORT_HEADER}:{}:{payload}", map.len())
}

/// Decodes an export string produced by [`encode_export`].
pub fn decode_export(value: &str) -> Result<Vec<CraftSpecEntry>, ExportDecodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ExportDecodeError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(ExportDecodeError::MissingPrefix)?;
    let version = parts.next().ok_or(ExportDecodeError::MissingVersion)?;
    let count = parts.next().ok_or(ExportDecodeError::MissingCount)?;
    let payload = parts.next().ok_or(ExportDecodeError::MissingPayload)?;

    if domain != EXPORT_DOMAIN {
        return Err(ExportDecodeError::InvalidPrefix(domain.to_owned()));
    }
    if version != EXPORT_VERSION {
        return Err(ExportDecodeError::UnsupportedVersion(version.to_owned()));
    }

    let expected: usize = count
        .trim()
        .parse()
        .map_err(|_| ExportDecodeError::InvalidCount(count.to_owned()))?;

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ExportDecodeError::InvalidEncoding)?;
    let map: BTreeMap<String, PersistedSpec> =
        serde_json::from_slice(&bytes).map_err(ExportDecodeError::InvalidPayload)?;

    if map.len() != expected {
        return Err(ExportDecodeError::CountMismatch {
            expected,
            found: map.len(),
        });
    }

    Ok(map.into_values().map(PersistedSpec::into_entry).collect())
}

/// Errors that can occur while decoding the JSON store document.
#[derive(Debug, Error)]
pub enum StoreDecodeError {
    /// The document could not be parsed as a spec store map.
    #[error("could not parse spec store document: {0}")]
    InvalidDocument(#[source] serde_json::Error),
}

/// Errors that can occur while decoding export strings.
#[derive(Debug, Error)]
pub enum ExportDecodeError {
    /// The provided string was empty or contained only whitespace.
    #[error("export payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("export string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("export string is missing the version")]
    MissingVersion,
    /// The entry-count segment was missing.
    #[error("export string is missing the entry count")]
    MissingCount,
    /// The payload segment was missing.
    #[error("export string is missing the payload")]
    MissingPayload,
    /// The prefix segment was not recognized.
    #[error("export prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment was not recognized.
    #[error("export version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The entry count could not be parsed.
    #[error("could not parse export entry count '{0}'")]
    InvalidCount(String),
    /// The entry count did not match the decoded payload.
    #[error("export declares {expected} entries but payload carries {found}")]
    CountMismatch {
        /// Count declared in the envelope.
        expected: usize,
        /// Entries actually present in the payload.
        found: usize,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode export payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialized.
    #[error("could not parse export payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
