//! Envelope codec for persisted store roots.
//!
//! Layout: `{"version": 0, "state": {"dob", "profile", "blocks", "viewMode"}}`.
//! Decoding is lenient about the shape older clients wrote (empty-string
//! dob, blocks without tags, state nested under `userData`) and strict about
//! the version. A state object carrying none of the known fields is corrupt.

use chrono::NaiveDate;
use lifegrid_core::{
    parse_date_of_birth, Block, BlockId, Granularity, LifegridResult, StorageError, StoreRoot,
    UserProfile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest envelope version this build reads and the one it writes.
pub const ENVELOPE_VERSION: u32 = 0;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: u32,
    state: StateOut<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateOut<'a> {
    dob: Option<NaiveDate>,
    profile: &'a UserProfile,
    blocks: &'a BTreeMap<BlockId, Block>,
    view_mode: Granularity,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u32,
    state: serde_json::Value,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StateIn {
    dob: Option<String>,
    profile: UserProfile,
    blocks: BTreeMap<String, Block>,
    view_mode: Granularity,
}

/// Fields of the flat state object.
const STATE_FIELDS: [&str; 4] = ["dob", "profile", "blocks", "viewMode"];

/// Wrapper the browser client persists its state under.
const USER_DATA_FIELD: &str = "userData";

/// A decoded root plus the block keys that had to be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRoot {
    pub root: StoreRoot,
    pub dropped_keys: Vec<String>,
}

fn corrupt(store_key: &str, reason: impl Into<String>) -> StorageError {
    StorageError::Corrupt {
        store_key: store_key.to_string(),
        reason: reason.into(),
    }
}

/// Unwrap `userData` and refuse objects with no recognizable state in them.
fn state_object(
    store_key: &str,
    state: serde_json::Value,
) -> Result<serde_json::Value, StorageError> {
    let serde_json::Value::Object(mut fields) = state else {
        return Ok(state);
    };
    if let Some(user_data) = fields.remove(USER_DATA_FIELD) {
        return Ok(user_data);
    }
    if !fields.is_empty() && !STATE_FIELDS.iter().any(|f| fields.contains_key(*f)) {
        let found: Vec<&str> = fields.keys().map(String::as_str).collect();
        return Err(corrupt(
            store_key,
            format!("unrecognized state fields: {}", found.join(", ")),
        ));
    }
    Ok(serde_json::Value::Object(fields))
}

/// Serialize `root` into the current envelope.
pub fn encode_root(store_key: &str, root: &StoreRoot) -> LifegridResult<Vec<u8>> {
    let envelope = EnvelopeOut {
        version: ENVELOPE_VERSION,
        state: StateOut {
            dob: root.date_of_birth,
            profile: &root.profile,
            blocks: &root.blocks,
            view_mode: root.view_mode,
        },
    };
    serde_json::to_vec(&envelope).map_err(|e| {
        StorageError::PersistenceWrite {
            store_key: store_key.to_string(),
            reason: format!("encode failed: {}", e),
        }
        .into()
    })
}

/// Parse an envelope back into a root.
pub fn decode_root(store_key: &str, blob: &[u8]) -> LifegridResult<DecodedRoot> {
    let envelope: EnvelopeIn = serde_json::from_slice(blob)
        .map_err(|e| corrupt(store_key, format!("invalid envelope: {}", e)))?;

    if envelope.version > ENVELOPE_VERSION {
        return Err(corrupt(
            store_key,
            format!(
                "unsupported envelope version {} (newest known is {})",
                envelope.version, ENVELOPE_VERSION
            ),
        )
        .into());
    }

    let state = state_object(store_key, envelope.state)?;
    let state: StateIn = if state.is_null() {
        StateIn::default()
    } else {
        serde_json::from_value(state)
            .map_err(|e| corrupt(store_key, format!("invalid state: {}", e)))?
    };

    let date_of_birth = match state.dob.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_date_of_birth(raw).map_err(|e| corrupt(store_key, e.to_string()))?,
        ),
    };

    let mut blocks = BTreeMap::new();
    let mut dropped_keys = Vec::new();
    for (key, block) in state.blocks {
        match BlockId::parse(&key) {
            Ok(id) => {
                blocks.insert(id, block);
            }
            Err(_) => dropped_keys.push(key),
        }
    }

    Ok(DecodedRoot {
        root: StoreRoot {
            date_of_birth,
            profile: state.profile,
            blocks,
            view_mode: state.view_mode,
        },
        dropped_keys,
    })
}
