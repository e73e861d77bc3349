// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::client_id::ClientId;
use crate::repository::{Resource, ResourceId, ResourceState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the editor needs to show and drag one content element.
#[derive(Debug, Clone, Serialize)]
pub struct ElementDescriptor {
    pub client_id: String,
    pub structure_id: ResourceId,
    pub site_path: String,
    pub type_name: String,
    pub title: String,
    pub state: ResourceState,
    pub date_last_modified: DateTime<Utc>,
    pub user_last_modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_edit_reason: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl ElementDescriptor {
    pub fn from_resource(
        resource: &Resource,
        client_id: &ClientId,
        properties: BTreeMap<String, String>,
        user: &str,
    ) -> Self {
        let locked_by = resource.lock.as_ref().map(|lock| lock.owner.clone());
        let no_edit_reason = if resource.state == ResourceState::Deleted {
            Some("The element has been deleted.".to_string())
        } else if resource.is_locked_by_other(user) {
            Some(format!(
                "The element is locked by {}.",
                locked_by.as_deref().unwrap_or_default()
            ))
        } else {
            None
        };

        Self {
            client_id: client_id.to_string(),
            structure_id: resource.id,
            site_path: resource.path.clone(),
            type_name: resource.type_name.clone(),
            title: resource.display_title().to_string(),
            state: resource.state,
            date_last_modified: resource.date_last_modified,
            user_last_modified: resource.user_last_modified.clone(),
            locked_by,
            no_edit_reason,
            properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::LockInfo;
    use uuid::Uuid;

    fn resource() -> Resource {
        Resource {
            id: Uuid::new_v4(),
            path: "/sites/default/article_1.json".to_string(),
            type_name: "article".to_string(),
            title: Some("First".to_string()),
            state: ResourceState::Changed,
            date_last_modified: Utc::now(),
            user_last_modified: "alice".to_string(),
            date_published: None,
            lock: None,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn descriptor_reports_foreign_lock() {
        let mut res = resource();
        res.lock = Some(LockInfo {
            owner: "bob".to_string(),
        });
        let id = ClientId::plain(res.id);
        let own = ElementDescriptor::from_resource(&res, &id, BTreeMap::new(), "bob");
        assert!(own.no_edit_reason.is_none());
        let other = ElementDescriptor::from_resource(&res, &id, BTreeMap::new(), "alice");
        assert_eq!(
            other.no_edit_reason.as_deref(),
            Some("The element is locked by bob.")
        );
    }

    #[test]
    fn descriptor_uses_client_id_with_properties() {
        let res = resource();
        let mut properties = BTreeMap::new();
        properties.insert("style".to_string(), "wide".to_string());
        let id = ClientId::new(res.id, &properties);
        let descriptor = ElementDescriptor::from_resource(&res, &id, properties, "alice");
        assert!(descriptor.client_id.contains('#'));
        assert_eq!(descriptor.title, "First");
    }
}
