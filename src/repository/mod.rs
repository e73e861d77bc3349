// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Boundary to the content repository that owns resources, locks,
//! permissions, publish lists and the search index. Everything in the ADE
//! layer goes through these traits; `memory` provides the in-process
//! implementation used by the binary and the tests.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub use memory::MemoryRepository;

pub type ResourceId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Unchanged,
    New,
    Changed,
    Deleted,
}

impl ResourceState {
    pub fn is_unchanged(self) -> bool {
        matches!(self, ResourceState::Unchanged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub path: String,
    pub type_name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub state: ResourceState,
    pub date_last_modified: DateTime<Utc>,
    pub user_last_modified: String,
    #[serde(default)]
    pub date_published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock: Option<LockInfo>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Resource {
    pub fn is_locked_by_other(&self, user: &str) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.owner != user)
    }

    pub fn is_locked_by(&self, user: &str) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.owner == user)
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => self.name(),
        }
    }

    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(self.path.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    /// Per-user override of the recent list bound.
    #[serde(default)]
    pub recent_list_size: Option<usize>,
    /// Path prefixes below which the user may publish directly.
    #[serde(default)]
    pub publish_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    NotFound,
    Locked,
    PermissionDenied,
    InvalidState,
    Conflict,
    Internal,
}

#[derive(Debug, Clone)]
pub struct RepositoryError {
    kind: RepositoryErrorKind,
    message: String,
}

impl RepositoryError {
    pub fn new(kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::NotFound, message)
    }

    pub fn locked(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::Locked, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RepositoryErrorKind::Internal, message)
    }

    pub fn kind(&self) -> RepositoryErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RepositoryError {}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Synchronous access to the content repository.
pub trait ContentRepository: Send + Sync {
    fn read_resource(&self, id: ResourceId) -> RepositoryResult<Resource>;

    fn read_resource_by_path(&self, path: &str) -> RepositoryResult<Resource>;

    fn read_content(&self, id: ResourceId) -> RepositoryResult<String>;

    /// Replaces the content; the caller must hold the lock.
    fn write_content(&self, user: &str, id: ResourceId, content: &str)
    -> RepositoryResult<Resource>;

    /// Takes an exclusive lock. Succeeds without change when `user` already owns it.
    fn lock_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()>;

    fn unlock_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()>;

    /// Creates a new resource at `target_path` with the source's type and content.
    fn copy_resource(
        &self,
        user: &str,
        source: ResourceId,
        target_path: &str,
    ) -> RepositoryResult<Resource>;

    /// Marks the resource deleted; the caller must hold the lock.
    fn delete_resource(&self, user: &str, id: ResourceId) -> RepositoryResult<()>;

    fn read_user(&self, name: &str) -> RepositoryResult<UserInfo>;

    /// Pending changes of the user, minus resources the user removed from the publish list.
    fn changed_resources(&self, user: &str) -> RepositoryResult<Vec<ResourceId>>;

    fn remove_from_publish_list(&self, user: &str, ids: &[ResourceId]) -> RepositoryResult<()>;

    /// Outgoing relation targets of the resource.
    fn relations(&self, id: ResourceId) -> RepositoryResult<Vec<ResourceId>>;

    fn siblings(&self, id: ResourceId) -> RepositoryResult<Vec<ResourceId>>;

    fn has_publish_permission(&self, user: &UserInfo, resource: &Resource)
    -> RepositoryResult<bool>;

    fn publish_resources(&self, user: &str, ids: &[ResourceId]) -> RepositoryResult<()>;
}

pub trait SearchIndex: Send + Sync {
    /// Matching resource ids, newest first.
    fn search(&self, query: &SearchQuery) -> RepositoryResult<Vec<ResourceId>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(path: &str, title: Option<&str>) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            path: path.to_string(),
            type_name: "article".to_string(),
            title: title.map(str::to_string),
            state: ResourceState::Changed,
            date_last_modified: Utc::now(),
            user_last_modified: "editor".to_string(),
            date_published: None,
            lock: None,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn display_title_falls_back_to_name() {
        assert_eq!(
            resource("/sites/a/article_1.json", None).display_title(),
            "article_1.json"
        );
        assert_eq!(
            resource("/sites/a/article_1.json", Some("  ")).display_title(),
            "article_1.json"
        );
        assert_eq!(
            resource("/sites/a/article_1.json", Some("Hello")).display_title(),
            "Hello"
        );
    }

    #[test]
    fn lock_ownership_helpers() {
        let mut res = resource("/a", None);
        assert!(!res.is_locked_by_other("editor"));
        res.lock = Some(LockInfo {
            owner: "other".to_string(),
        });
        assert!(res.is_locked_by_other("editor"));
        assert!(res.is_locked_by("other"));
    }
}
