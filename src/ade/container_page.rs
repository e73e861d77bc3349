// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::client_id::ClientId;
use super::errors::{AdeError, AdeResult};
use crate::repository::{ContentRepository, ResourceId};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

pub const CONTAINER_PAGE_TYPE: &str = "containerpage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elements: Option<usize>,
    #[serde(default)]
    pub elements: Vec<ContainerElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerPage {
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl ContainerPage {
    /// Parses stored page content. Blank content is an empty page.
    pub fn parse(content: &str) -> AdeResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content)
            .map_err(|e| AdeError::internal(format!("Invalid container page content: {}", e)))
    }

    pub fn to_json(&self) -> AdeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AdeError::internal(format!("Failed to serialize container page: {}", e)))
    }

    pub fn validate(&self) -> AdeResult<()> {
        let mut names = HashSet::new();
        for container in &self.containers {
            if container.name.trim().is_empty() {
                return Err(AdeError::bad_request("Container name must not be empty"));
            }
            if !names.insert(container.name.as_str()) {
                return Err(AdeError::bad_request(format!(
                    "Duplicate container name '{}'",
                    container.name
                )));
            }
            if let Some(max) = container.max_elements
                && container.elements.len() > max
            {
                return Err(AdeError::bad_request(format!(
                    "Container '{}' holds {} elements, at most {} allowed",
                    container.name,
                    container.elements.len(),
                    max
                )));
            }
            for element in &container.elements {
                ClientId::parse(&element.id)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CachedPage {
    date_last_modified: DateTime<Utc>,
    page: Arc<ContainerPage>,
}

/// Parsed container pages keyed by resource id.
///
/// An entry is stale once the resource's modification date moves past the
/// one it was parsed at.
#[derive(Debug, Default)]
pub struct ContainerPageCache {
    pages: RwLock<HashMap<ResourceId, CachedPage>>,
}

impl ContainerPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        repository: &dyn ContentRepository,
        id: ResourceId,
    ) -> AdeResult<Arc<ContainerPage>> {
        let resource = repository.read_resource(id)?;
        if resource.type_name != CONTAINER_PAGE_TYPE {
            return Err(AdeError::bad_request(format!(
                "{} is not a container page",
                resource.path
            )));
        }

        match self.pages.read() {
            Ok(pages) => {
                if let Some(cached) = pages.get(&id)
                    && cached.date_last_modified == resource.date_last_modified
                {
                    debug!("Container page cache hit for {}", resource.path);
                    return Ok(Arc::clone(&cached.page));
                }
            }
            Err(_) => error!("🚨 CRITICAL: ContainerPageCache read lock poisoned in get"),
        }

        let page = Arc::new(ContainerPage::parse(&repository.read_content(id)?)?);
        match self.pages.write() {
            Ok(mut pages) => {
                pages.insert(
                    id,
                    CachedPage {
                        date_last_modified: resource.date_last_modified,
                        page: Arc::clone(&page),
                    },
                );
            }
            Err(_) => error!("🚨 CRITICAL: ContainerPageCache write lock poisoned in get"),
        }
        Ok(page)
    }

    pub fn invalidate(&self, id: ResourceId) {
        match self.pages.write() {
            Ok(mut pages) => {
                pages.remove(&id);
            }
            Err(_) => error!("🚨 CRITICAL: ContainerPageCache write lock poisoned in invalidate"),
        }
    }

    /// Writes the page. A lock taken here is released afterwards; a lock the
    /// user already held is kept.
    pub fn save(
        &self,
        repository: &dyn ContentRepository,
        user: &str,
        id: ResourceId,
        page: &ContainerPage,
    ) -> AdeResult<()> {
        page.validate()?;
        let content = page.to_json()?;
        let resource = repository.read_resource(id)?;
        if resource.type_name != CONTAINER_PAGE_TYPE {
            return Err(AdeError::bad_request(format!(
                "{} is not a container page",
                resource.path
            )));
        }

        let acquired = if resource.is_locked_by(user) {
            false
        } else {
            repository.lock_resource(user, id)?;
            true
        };

        let written = repository.write_content(user, id, &content);
        if acquired && let Err(error) = repository.unlock_resource(user, id) {
            warn!("Failed to release lock on {}: {}", resource.path, error);
        }
        self.invalidate(id);
        written?;

        info!(
            "Saved container page {} ({} containers) for {}",
            resource.path,
            page.containers.len(),
            user
        );
        Ok(())
    }
}
