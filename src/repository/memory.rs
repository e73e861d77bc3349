// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{
    ContentRepository, LockInfo, RepositoryError, RepositoryErrorKind, RepositoryResult, Resource,
    ResourceId, ResourceState, SearchIndex, SearchQuery, UserInfo,
};
use chrono::Utc;
use log::{error, info};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredResource {
    resource: Resource,
    content: String,
    relations: Vec<ResourceId>,
    siblings: Vec<ResourceId>,
}

#[derive(Debug, Default)]
struct RepositoryData {
    resources: HashMap<ResourceId, StoredResource>,
    paths: HashMap<String, ResourceId>,
    users: HashMap<String, UserInfo>,
    publish_exclusions: HashMap<String, HashSet<ResourceId>>,
}

impl RepositoryData {
    fn get(&self, id: ResourceId) -> RepositoryResult<&StoredResource> {
        self.resources
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Resource {} not found", id)))
    }

    fn get_mut(&mut self, id: ResourceId) -> RepositoryResult<&mut StoredResource> {
        self.resources
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Resource {} not found", id)))
    }

    fn insert(&mut self, stored: StoredResource) {
        self.paths
            .insert(stored.resource.path.clone(), stored.resource.id);
        self.resources.insert(stored.resource.id, stored);
    }

    fn remove(&mut self, id: ResourceId) {
        if let Some(stored) = self.resources.remove(&id) {
            self.paths.remove(&stored.resource.path);
        }
        for stored in self.resources.values_mut() {
            stored.relations.retain(|target| *target != id);
            stored.siblings.retain(|sibling| *sibling != id);
        }
        for excluded in self.publish_exclusions.values_mut() {
            excluded.remove(&id);
        }
    }
}

#[derive(Debug, Deserialize)]
struct SeedResource {
    #[serde(flatten)]
    resource: Resource,
    #[serde(default)]
    content: String,
    #[serde(default)]
    relations: Vec<ResourceId>,
    #[serde(default)]
    siblings: Vec<ResourceId>,
}

#[derive(Debug, Deserialize, Default)]
struct Seed {
    #[serde(default)]
    users: Vec<UserInfo>,
    #[serde(default)]
    resources: Vec<SeedResource>,
}

/// In-process repository keeping resources, locks, users and publish-list
/// exclusions behind a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    data: RwLock<RepositoryData>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed_file(path: &Path) -> RepositoryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::internal(format!(
                "Failed to read repository seed '{}': {}",
                path.display(),
                e
            ))
        })?;
        let repository = Self::from_seed_str(&content)?;
        info!(
            "Repository seeded from {} ({} resources)",
            path.display(),
            repository.resource_count()
        );
        Ok(repository)
    }

    pub fn from_seed_str(content: &str) -> RepositoryResult<Self> {
        let seed: Seed = serde_yaml::from_str(content).map_err(|e| {
            RepositoryError::internal(format!("Failed to parse repository seed: {}", e))
        })?;
        let repository = Self::new();
        for user in seed.users {
            repository.insert_user(user);
        }
        let mut links = Vec::new();
        {
            let mut data = repository.write()?;
            for entry in seed.resources {
                if data.paths.contains_key(&entry.resource.path) {
                    return Err(RepositoryError::new(
                        RepositoryErrorKind::Conflict,
                        format!("Duplicate resource path '{}' in seed", entry.resource.path),
                    ));
                }
                links.push((entry.resource.id, entry.relations, entry.siblings));
                data.insert(StoredResource {
                    resource: entry.resource,
                    content: entry.content,
                    relations: Vec::new(),
                    siblings: Vec::new(),
                });
            }
        }
        // Links are added once every resource exists so targets can be checked.
        for (id, relations, siblings) in links {
            for target in relations {
                repository.add_relation(id, target)?;
            }
            for sibling in siblings {
                repository.add_sibling(id, sibling)?;
            }
        }
        Ok(repository)
    }

    pub fn insert_user(&self, user: UserInfo) {
        match self.data.write() {
            Ok(mut data) => {
                data.users.insert(user.name.clone(), user);
            }
            Err(_) => error!("🚨 CRITICAL: MemoryRepository write lock poisoned in insert_user"),
        }
    }

    pub fn insert_resource(&self, resource: Resource, content: &str) {
        match self.data.write() {
            Ok(mut data) => data.insert(StoredResource {
                resource,
                content: content.to_string(),
                relations: Vec::new(),
                siblings: Vec::new(),
            }),
            Err(_) => {
                error!("🚨 CRITICAL: MemoryRepository write lock poisoned in insert_resource")
            }
        }
    }

    pub fn add_relation(&self, source: ResourceId, target: ResourceId) -> RepositoryResult<()> {
        let mut data = self.write()?;
        data.get(target)?;
        let stored = data.get_mut(source)?;
        if !stored.relations.contains(&target) {
            stored.relations.push(target);
        }
        Ok(())
    }

    pub fn add_sibling(&self, left: ResourceId, right: ResourceId) -> RepositoryResult<()> {
        let mut data = self.write()?;
        data.get(right)?;
        let stored = data.get_mut(left)?;
        if !stored.siblings.contains(&right) {
            stored.siblings.push(right);
        }
        let stored = data.get_mut(right)?;
        if !stored.siblings.contains(&left) {
            stored.siblings.push(left);
        }
        Ok(())
    }

    pub fn resource_count(&self) -> usize {
        self.data
            .read()
            .map(|data| data.resources.len())
            .unwrap_or(0)
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, RepositoryData>> {
        self.data.read().map_err(|_| {
            error!("🚨 CRITICAL: MemoryRepository read lock poisoned");
            RepositoryError::internal("Repository unavailable")
        })
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, RepositoryData>> {
        self.data.write().map_err(|_| {
            error!("🚨 CRITICAL: MemoryRepository write lock poisoned");
            RepositoryError::internal("Repository unavailable")
        })
    }
}

fn require_lock(resource: &Resource, user: &str) -> RepositoryResult<()> {
    match resource.lock.as_ref() {
        Some(lock) if lock.owner == user => Ok(()),
        Some(lock) => Err(RepositoryError::locked(format!(
            "{} is locked by {}",
            resource.path, lock.owner
        ))),
        None => Err(RepositoryError::new(
            RepositoryErrorKind::InvalidState,
            format!("{} must be locked before it is modified", resource.path),
        )),
    }
}

impl ContentRepository for MemoryRepository {
    fn read_resource(&self, id: ResourceId) -> RepositoryResult<Resource> {
        Ok(self.read()?.get(id)?.resource.clone())
    }

    fn read_resource_by_path(&self, path: &str) -> RepositoryResult<Resource> {
        let data = self.read()?;
        let id = data
            .paths
            .get(path)
            .copied()
            .ok_or_else(|| RepositoryError::not_found(format!("Resource {} not found", path)))?;
        Ok(data.get(id)?.resource.clone())
    }

    fn read_content(&self, id: ResourceId) -> RepositoryResult<String> {
        Ok(self.read()?.get(id)?.content.clone())
    }

    fn write_content(
        &self,
        user: &str,
        id: ResourceId,
        content: &str,
    ) -> RepositoryResult<Resource> {
        let mut data = self.write()?;
        let stored = data.get_mut(id)?;
        require_lock(&stored.resource, user)?;
        if stored.resource.state == ResourceState::Deleted {
            return Err(RepositoryError::new(
                RepositoryErrorKind::InvalidState,
                format!("{} is deleted", stored.resource.path),
            ));
        }
        stored.content = content.to_string();
        if stored.resource.state.is_unchanged() {
            stored.resource.state = ResourceState::Changed;
        }
        stored.resource.date_last_modified = Utc::now();
        stored.resource.user_last_modified = user.to_string();
        Ok(stored.resource.clone())
    }

    fn lock_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()> {
        let mut data = self.write()?;
        let stored = data.get_mut(id)?;
        if let Some(lock) = stored.resource.lock.as_ref() {
            if lock.owner == user {
                return Ok(());
            }
            return Err(RepositoryError::locked(format!(
                "{} is locked by {}",
                stored.resource.path, lock.owner
            )));
        }
        stored.resource.lock = Some(LockInfo {
            owner: user.to_string(),
        });
        Ok(())
    }

    fn unlock_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()> {
        let mut data = self.write()?;
        let stored = data.get_mut(id)?;
        match stored.resource.lock.as_ref() {
            None => Ok(()),
            Some(lock) if lock.owner == user => {
                stored.resource.lock = None;
                Ok(())
            }
            Some(lock) => Err(RepositoryError::locked(format!(
                "{} is locked by {}",
                stored.resource.path, lock.owner
            ))),
        }
    }

    fn copy_resource(
        &self,
        user: &str,
        source: ResourceId,
        target_path: &str,
    ) -> RepositoryResult<Resource> {
        let mut data = self.write()?;
        if data.paths.contains_key(target_path) {
            return Err(RepositoryError::new(
                RepositoryErrorKind::Conflict,
                format!("{} already exists", target_path),
            ));
        }
        let template = data.get(source)?.clone();
        let resource = Resource {
            id: Uuid::new_v4(),
            path: target_path.to_string(),
            type_name: template.resource.type_name.clone(),
            title: template.resource.title.clone(),
            state: ResourceState::New,
            date_last_modified: Utc::now(),
            user_last_modified: user.to_string(),
            date_published: None,
            lock: None,
            properties: template.resource.properties.clone(),
        };
        data.insert(StoredResource {
            resource: resource.clone(),
            content: template.content,
            relations: template.relations,
            siblings: Vec::new(),
        });
        Ok(resource)
    }

    fn delete_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()> {
        let mut data = self.write()?;
        let is_new = {
            let stored = data.get(id)?;
            require_lock(&stored.resource, user)?;
            stored.resource.state == ResourceState::New
        };
        if is_new {
            data.remove(id);
            return Ok(());
        }
        let stored = data.get_mut(id)?;
        stored.resource.state = ResourceState::Deleted;
        stored.resource.date_last_modified = Utc::now();
        stored.resource.user_last_modified = user.to_string();
        Ok(())
    }

    fn read_user(&self, name: &str) -> RepositoryResult<UserInfo> {
        self.read()?.users.get(name).cloned().ok_or_else(|| {
            RepositoryError::new(
                RepositoryErrorKind::PermissionDenied,
                format!("Unknown user {}", name),
            )
        })
    }

    fn changed_resources(&self, user: &str) -> RepositoryResult<Vec<ResourceId>> {
        let data = self.read()?;
        let excluded = data.publish_exclusions.get(user);
        let mut ids: Vec<ResourceId> = data
            .resources
            .values()
            .filter(|stored| !stored.resource.state.is_unchanged())
            .filter(|stored| {
                stored.resource.user_last_modified == user || stored.resource.is_locked_by(user)
            })
            .map(|stored| stored.resource.id)
            .filter(|id| excluded.is_none_or(|set| !set.contains(id)))
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn remove_from_publish_list(&self, user: &str, ids: &[ResourceId]) -> RepositoryResult<()> {
        let mut data = self.write()?;
        let excluded = data.publish_exclusions.entry(user.to_string()).or_default();
        excluded.extend(ids.iter().copied());
        Ok(())
    }

    fn relations(&self, id: ResourceId) -> RepositoryResult<Vec<ResourceId>> {
        Ok(self.read()?.get(id)?.relations.clone())
    }

    fn siblings(&self, id: ResourceId) -> RepositoryResult<Vec<ResourceId>> {
        Ok(self.read()?.get(id)?.siblings.clone())
    }

    fn has_publish_permission(
        &self,
        user: &UserInfo,
        resource: &Resource,
    ) -> RepositoryResult<bool> {
        Ok(user
            .publish_paths
            .iter()
            .any(|prefix| resource.path.starts_with(prefix.as_str())))
    }

    fn publish_resources(&self, user: &str, ids: &[ResourceId]) -> RepositoryResult<()> {
        let mut data = self.write()?;
        for id in ids {
            data.get(*id)?;
        }
        let now = Utc::now();
        for id in ids {
            let deleted = data
                .resources
                .get(id)
                .is_some_and(|stored| stored.resource.state == ResourceState::Deleted);
            if deleted {
                data.remove(*id);
                continue;
            }
            if let Some(stored) = data.resources.get_mut(id) {
                stored.resource.state = ResourceState::Unchanged;
                stored.resource.date_published = Some(now);
                stored.resource.lock = None;
            }
        }
        if let Some(excluded) = data.publish_exclusions.get_mut(user) {
            for id in ids {
                excluded.remove(id);
            }
        }
        info!("Published {} resources for {}", ids.len(), user);
        Ok(())
    }
}

impl SearchIndex for MemoryRepository {
    fn search(&self, query: &SearchQuery) -> RepositoryResult<Vec<ResourceId>> {
        let data = self.read()?;
        let terms: Vec<String> = query
            .text
            .split_whitespace()
            .map(|term| term.to_lowercase())
            .collect();
        let mut hits: Vec<&Resource> = data
            .resources
            .values()
            .map(|stored| &stored.resource)
            .filter(|resource| resource.state != ResourceState::Deleted)
            .filter(|resource| query.types.is_empty() || query.types.contains(&resource.type_name))
            .filter(|resource| {
                let haystack = format!(
                    "{} {}",
                    resource.title.as_deref().unwrap_or_default(),
                    resource.path
                )
                .to_lowercase();
                terms.iter().all(|term| haystack.contains(term.as_str()))
            })
            .collect();
        hits.sort_by(|a, b| {
            b.date_last_modified
                .cmp(&a.date_last_modified)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(hits.into_iter().map(|resource| resource.id).collect())
    }
}
