// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{AdeError, AdeResult};
use crate::repository::ResourceId;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

const HASH_SEPARATOR: char = '#';
const HASH_HEX_CHARS: usize = 8;

/// Element id as seen by the editor: the structure id, optionally suffixed
/// with a hash of the element-level properties (`<uuid>#<hash>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId {
    structure_id: ResourceId,
    property_hash: Option<String>,
}

impl ClientId {
    pub fn new(structure_id: ResourceId, properties: &BTreeMap<String, String>) -> Self {
        Self {
            structure_id,
            property_hash: property_hash(properties),
        }
    }

    pub fn plain(structure_id: ResourceId) -> Self {
        Self {
            structure_id,
            property_hash: None,
        }
    }

    pub fn parse(value: &str) -> AdeResult<Self> {
        let (id_part, hash_part) = match value.split_once(HASH_SEPARATOR) {
            Some((id, hash)) => (id, Some(hash)),
            None => (value, None),
        };
        let structure_id = Uuid::parse_str(id_part.trim())
            .map_err(|_| AdeError::bad_request(format!("Invalid element id '{}'", value)))?;
        let property_hash = match hash_part {
            Some(hash) if hash.is_empty() => {
                return Err(AdeError::bad_request(format!(
                    "Invalid element id '{}'",
                    value
                )));
            }
            Some(hash) => Some(hash.to_string()),
            None => None,
        };
        Ok(Self {
            structure_id,
            property_hash,
        })
    }

    pub fn structure_id(&self) -> ResourceId {
        self.structure_id
    }

    pub fn property_hash(&self) -> Option<&str> {
        self.property_hash.as_deref()
    }

    pub fn is_plain(&self) -> bool {
        self.property_hash.is_none()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.property_hash.as_deref() {
            Some(hash) => write!(f, "{}{}{}", self.structure_id, HASH_SEPARATOR, hash),
            None => write!(f, "{}", self.structure_id),
        }
    }
}

/// Short stable hash of a property map; `None` for an empty map.
pub fn property_hash(properties: &BTreeMap<String, String>) -> Option<String> {
    if properties.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    for (key, value) in properties {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_HEX_CHARS);
    Some(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_id_has_no_suffix() {
        let id = Uuid::new_v4();
        let client_id = ClientId::new(id, &BTreeMap::new());
        assert!(client_id.is_plain());
        assert_eq!(client_id.to_string(), id.to_string());
    }

    #[test]
    fn properties_add_stable_suffix() {
        let id = Uuid::new_v4();
        let first = ClientId::new(id, &props(&[("style", "wide"), ("color", "red")]));
        let second = ClientId::new(id, &props(&[("color", "red"), ("style", "wide")]));
        assert_eq!(first, second);
        assert_eq!(first.property_hash().map(str::len), Some(8));

        let other = ClientId::new(id, &props(&[("style", "narrow")]));
        assert_ne!(first, other);
    }

    #[test]
    fn parse_accepts_formatted_ids() {
        let id = ClientId::new(Uuid::new_v4(), &props(&[("a", "b")]));
        assert_eq!(ClientId::parse(&id.to_string()).expect("parse"), id);
    }

    #[test]
    fn parse_rejects_garbage_and_empty_hash() {
        assert!(ClientId::parse("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert!(ClientId::parse(&format!("{}#", id)).is_err());
    }
}
