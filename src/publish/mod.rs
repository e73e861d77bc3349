// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod candidates;
pub mod groups;
pub mod handlers;
pub mod helper;

use crate::config::PublishConfig;
use crate::repository::{Resource, ResourceId, ResourceState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use candidates::PublishCandidateSet;
pub use groups::{GroupingPolicy, PublishGroup, PublishGroupKind, group_resources};
pub use helper::{PublishHelper, PublishList, PublishOutcome, PublishRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishInfoKind {
    Published,
    Permission,
    Locked,
    BrokenLink,
}

/// Why a listed resource cannot be published as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishInfo {
    pub kind: PublishInfoKind,
    pub message: String,
}

impl PublishInfo {
    pub fn published() -> Self {
        Self {
            kind: PublishInfoKind::Published,
            message: "The resource has already been published.".to_string(),
        }
    }

    pub fn permission() -> Self {
        Self {
            kind: PublishInfoKind::Permission,
            message: "You do not have the permission to publish this resource.".to_string(),
        }
    }

    pub fn locked(owner: &str) -> Self {
        Self {
            kind: PublishInfoKind::Locked,
            message: format!("The resource is locked by {}.", owner),
        }
    }

    pub fn broken_link(targets: &[String]) -> Self {
        Self {
            kind: PublishInfoKind::BrokenLink,
            message: format!(
                "Publishing would break links to unpublished resources: {}",
                targets.join(", ")
            ),
        }
    }
}

/// One entry of the publish list, decorated with its related resources.
#[derive(Debug, Clone, Serialize)]
pub struct PublishResource {
    pub id: ResourceId,
    pub path: String,
    pub title: String,
    pub type_name: String,
    pub state: ResourceState,
    pub date_last_modified: DateTime<Utc>,
    pub user_last_modified: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<PublishInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<PublishResource>,
}

impl PublishResource {
    pub fn from_resource(resource: &Resource, info: Option<PublishInfo>) -> Self {
        Self {
            id: resource.id,
            path: resource.path.clone(),
            title: resource.display_title().to_string(),
            type_name: resource.type_name.clone(),
            state: resource.state,
            date_last_modified: resource.date_last_modified,
            user_last_modified: resource.user_last_modified.clone(),
            info,
            related: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    pub include_related: bool,
    pub include_siblings: bool,
}

impl PublishOptions {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            include_related: config.include_related,
            include_siblings: config.include_siblings,
        }
    }

    /// Applies the fields the client sent; the rest keep their current value.
    pub fn overridden_by(self, overrides: PublishOptionsOverride) -> Self {
        Self {
            include_related: overrides.include_related.unwrap_or(self.include_related),
            include_siblings: overrides.include_siblings.unwrap_or(self.include_siblings),
        }
    }
}

/// Options as sent with `publish_list`; every field is optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PublishOptionsOverride {
    #[serde(default)]
    pub include_related: Option<bool>,
    #[serde(default)]
    pub include_siblings: Option<bool>,
}
