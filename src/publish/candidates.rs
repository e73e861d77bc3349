// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{PublishInfo, PublishOptions, PublishResource};
use crate::repository::{
    ContentRepository, RepositoryResult, Resource, ResourceId, ResourceState, UserInfo,
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Request-scoped partition of a user's pending changes.
///
/// `resources` holds the candidates that still need publishing (some of
/// them blocked by permissions or locks), `related_resources` the extra
/// resources reached through relations or siblings. Candidates that were
/// published in the meantime end up in `published` and only ever show up
/// again as related context.
#[derive(Debug, Default)]
pub struct PublishCandidateSet {
    resources: Vec<Resource>,
    related_resources: Vec<Resource>,
    published: Vec<Resource>,
    infos: HashMap<ResourceId, PublishInfo>,
    links: HashMap<ResourceId, Vec<ResourceId>>,
    relation_targets: HashMap<ResourceId, Vec<Resource>>,
    skipped: usize,
}

impl PublishCandidateSet {
    pub fn collect(
        repository: &dyn ContentRepository,
        user: &UserInfo,
        candidates: &[ResourceId],
        options: PublishOptions,
    ) -> Self {
        let mut set = Self::default();
        let mut seen = HashSet::new();

        for id in candidates {
            if !seen.insert(*id) {
                continue;
            }
            let resource = match repository.read_resource(*id) {
                Ok(resource) => resource,
                Err(error) => {
                    warn!("Skipping publish candidate {}: {}", id, error);
                    set.skipped += 1;
                    continue;
                }
            };
            if resource.state.is_unchanged() {
                debug!("Publish candidate {} is already published", resource.path);
                set.published.push(resource);
                continue;
            }
            match blocking_info(repository, user, &resource) {
                Ok(Some(info)) => {
                    set.infos.insert(resource.id, info);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!("Skipping publish candidate {}: {}", resource.path, error);
                    set.skipped += 1;
                    continue;
                }
            }
            set.resources.push(resource);
        }

        set.collect_related(repository, user, options);
        set
    }

    fn collect_related(
        &mut self,
        repository: &dyn ContentRepository,
        user: &UserInfo,
        options: PublishOptions,
    ) {
        let top_ids: HashSet<ResourceId> = self.resources.iter().map(|r| r.id).collect();
        let published_ids: HashSet<ResourceId> = self.published.iter().map(|r| r.id).collect();
        let mut related_index: HashMap<ResourceId, usize> = HashMap::new();
        let owners: Vec<(ResourceId, String)> = self
            .resources
            .iter()
            .map(|r| (r.id, r.path.clone()))
            .collect();

        for (owner, owner_path) in owners {
            let targets = read_all(
                repository,
                &owner_path,
                "relation",
                repository.relations(owner),
            );
            let mut attached = Vec::new();
            if options.include_related {
                attached.extend(targets.iter().cloned());
            }
            self.relation_targets.insert(owner, targets);

            if options.include_siblings {
                let siblings = read_all(
                    repository,
                    &owner_path,
                    "sibling",
                    repository.siblings(owner),
                );
                attached.extend(siblings);
            }

            for target in attached {
                if target.id == owner || top_ids.contains(&target.id) {
                    continue;
                }
                let was_candidate = published_ids.contains(&target.id);
                if target.state.is_unchanged() && !was_candidate {
                    continue;
                }
                if !related_index.contains_key(&target.id) {
                    let info = if target.state.is_unchanged() {
                        Some(PublishInfo::published())
                    } else {
                        match blocking_info(repository, user, &target) {
                            Ok(info) => info,
                            Err(error) => {
                                warn!("Skipping related resource {}: {}", target.path, error);
                                continue;
                            }
                        }
                    };
                    if let Some(info) = info {
                        self.infos.insert(target.id, info);
                    }
                    related_index.insert(target.id, self.related_resources.len());
                    self.related_resources.push(target.clone());
                }
                let links = self.links.entry(owner).or_default();
                if !links.contains(&target.id) {
                    links.push(target.id);
                }
            }
        }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn related_resources(&self) -> &[Resource] {
        &self.related_resources
    }

    pub fn published(&self) -> &[Resource] {
        &self.published
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn info(&self, id: ResourceId) -> Option<&PublishInfo> {
        self.infos.get(&id)
    }

    /// Top-level entries with related resources attached and broken links flagged.
    pub fn entries(&self) -> Vec<PublishResource> {
        let publishable_top: HashSet<ResourceId> = self
            .resources
            .iter()
            .filter(|r| !self.infos.contains_key(&r.id))
            .map(|r| r.id)
            .collect();
        let related_by_id: HashMap<ResourceId, &Resource> = self
            .related_resources
            .iter()
            .map(|r| (r.id, r))
            .collect();

        self.resources
            .iter()
            .map(|resource| {
                let links = self.links.get(&resource.id);
                let mut info = self.infos.get(&resource.id).cloned();
                if info.is_none() {
                    let targets = self
                        .relation_targets
                        .get(&resource.id)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let broken = unpublished_new_targets(targets, |target| {
                        publishable_top.contains(&target)
                            || (links.is_some_and(|links| links.contains(&target))
                                && !self.infos.contains_key(&target))
                    });
                    if !broken.is_empty() {
                        info = Some(PublishInfo::broken_link(&broken));
                    }
                }

                let mut entry = PublishResource::from_resource(resource, info);
                entry.related = links
                    .map(|links| {
                        links
                            .iter()
                            .filter_map(|id| related_by_id.get(id))
                            .map(|related| {
                                PublishResource::from_resource(
                                    related,
                                    self.infos.get(&related.id).cloned(),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                entry
            })
            .collect()
    }

    pub fn published_entries(&self) -> Vec<PublishResource> {
        self.published
            .iter()
            .map(|resource| PublishResource::from_resource(resource, Some(PublishInfo::published())))
            .collect()
    }
}

/// Permission and lock check for a pending resource.
pub(crate) fn blocking_info(
    repository: &dyn ContentRepository,
    user: &UserInfo,
    resource: &Resource,
) -> RepositoryResult<Option<PublishInfo>> {
    if !repository.has_publish_permission(user, resource)? {
        return Ok(Some(PublishInfo::permission()));
    }
    if let Some(lock) = resource.lock.as_ref()
        && lock.owner != user.name
    {
        return Ok(Some(PublishInfo::locked(&lock.owner)));
    }
    Ok(None)
}

/// Paths of never-published relation targets that are not published together with their source.
pub(crate) fn unpublished_new_targets<F>(targets: &[Resource], published_with: F) -> Vec<String>
where
    F: Fn(ResourceId) -> bool,
{
    targets
        .iter()
        .filter(|target| target.state == ResourceState::New && !published_with(target.id))
        .map(|target| target.path.clone())
        .collect()
}

pub(crate) fn read_all(
    repository: &dyn ContentRepository,
    owner_path: &str,
    label: &str,
    ids: RepositoryResult<Vec<ResourceId>>,
) -> Vec<Resource> {
    let ids = match ids {
        Ok(ids) => ids,
        Err(error) => {
            warn!("Failed to read {} list of {}: {}", label, owner_path, error);
            return Vec::new();
        }
    };
    ids.into_iter()
        .filter_map(|id| match repository.read_resource(id) {
            Ok(resource) => Some(resource),
            Err(error) => {
                warn!("Skipping {} {} of {}: {}", label, id, owner_path, error);
                None
            }
        })
        .collect()
}
