// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::candidates::{blocking_info, read_all, unpublished_new_targets};
use super::{
    GroupingPolicy, PublishCandidateSet, PublishGroup, PublishInfo, PublishOptions,
    PublishResource, group_resources,
};
use crate::config::PublishConfig;
use crate::repository::{ContentRepository, RepositoryResult, ResourceId, UserInfo};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct PublishList {
    pub groups: Vec<PublishGroup>,
    pub already_published: Vec<PublishResource>,
    pub skipped: usize,
}

impl PublishList {
    pub fn grouped_count(&self) -> usize {
        self.groups.iter().map(|group| group.resources().len()).sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub resources: Vec<ResourceId>,
    #[serde(default)]
    pub remove: Vec<ResourceId>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct PublishOutcome {
    pub executed: bool,
    pub published: Vec<ResourceId>,
    pub problems: Vec<PublishResource>,
    pub missing: Vec<ResourceId>,
}

/// Builds publish lists and runs publish requests on behalf of one user.
pub struct PublishHelper {
    repository: Arc<dyn ContentRepository>,
    policy: GroupingPolicy,
    defaults: PublishOptions,
}

impl PublishHelper {
    pub fn new(repository: Arc<dyn ContentRepository>, config: &PublishConfig) -> Self {
        Self {
            repository,
            policy: GroupingPolicy::from_config(config),
            defaults: PublishOptions::from_config(config),
        }
    }

    pub fn default_options(&self) -> PublishOptions {
        self.defaults
    }

    pub fn publish_list(
        &self,
        user: &UserInfo,
        options: PublishOptions,
    ) -> RepositoryResult<PublishList> {
        let candidates = self.repository.changed_resources(&user.name)?;
        let set =
            PublishCandidateSet::collect(self.repository.as_ref(), user, &candidates, options);
        let groups = group_resources(set.entries(), &self.policy);
        let list = PublishList {
            groups,
            already_published: set.published_entries(),
            skipped: set.skipped(),
        };
        info!(
            "Publish list for {}: {} candidates, {} grouped in {} groups, {} already published, {} skipped",
            user.name,
            candidates.len(),
            list.grouped_count(),
            list.groups.len(),
            list.already_published.len(),
            list.skipped
        );
        Ok(list)
    }

    pub fn remove_from_list(&self, user: &UserInfo, ids: &[ResourceId]) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.repository.remove_from_publish_list(&user.name, ids)?;
        info!("Removed {} resources from the publish list of {}", ids.len(), user.name);
        Ok(())
    }

    /// Publishes the requested resources. Already published, permission-blocked
    /// and lock-blocked resources are dropped and reported; a broken link
    /// stops the whole request unless `force` is set. `remove` is applied
    /// only when the request is not refused.
    pub fn publish(
        &self,
        user: &UserInfo,
        request: &PublishRequest,
    ) -> RepositoryResult<PublishOutcome> {
        let mut outcome = PublishOutcome::default();
        let mut publishable = Vec::new();
        let mut seen = HashSet::new();
        for id in &request.resources {
            if !seen.insert(*id) {
                continue;
            }
            let resource = match self.repository.read_resource(*id) {
                Ok(resource) => resource,
                Err(error) => {
                    warn!("Cannot publish {}: {}", id, error);
                    outcome.missing.push(*id);
                    continue;
                }
            };
            if resource.state.is_unchanged() {
                outcome.problems.push(PublishResource::from_resource(
                    &resource,
                    Some(PublishInfo::published()),
                ));
                continue;
            }
            match blocking_info(self.repository.as_ref(), user, &resource) {
                Ok(None) => publishable.push(resource),
                Ok(Some(info)) => outcome
                    .problems
                    .push(PublishResource::from_resource(&resource, Some(info))),
                Err(error) => {
                    warn!("Cannot publish {}: {}", resource.path, error);
                    outcome.missing.push(*id);
                }
            }
        }

        let publish_ids: HashSet<ResourceId> = publishable.iter().map(|r| r.id).collect();
        let mut broken = Vec::new();
        for resource in &publishable {
            let targets = read_all(
                self.repository.as_ref(),
                &resource.path,
                "relation",
                self.repository.relations(resource.id),
            );
            let paths = unpublished_new_targets(&targets, |target| publish_ids.contains(&target));
            if !paths.is_empty() {
                broken.push(PublishResource::from_resource(
                    resource,
                    Some(PublishInfo::broken_link(&paths)),
                ));
            }
        }

        if !broken.is_empty() && !request.force {
            warn!(
                "Publish request of {} refused: {} resources would break links",
                user.name,
                broken.len()
            );
            outcome.problems.extend(broken);
            return Ok(outcome);
        }
        outcome.problems.extend(broken);
        self.remove_from_list(user, &request.remove)?;

        if publishable.is_empty() {
            return Ok(outcome);
        }
        let ids: Vec<ResourceId> = publishable.iter().map(|r| r.id).collect();
        self.repository.publish_resources(&user.name, &ids)?;
        outcome.executed = true;
        outcome.published = ids;
        Ok(outcome)
    }
}
