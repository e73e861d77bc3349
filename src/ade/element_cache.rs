// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::client_id::ClientId;
use super::element::ElementDescriptor;
use super::errors::AdeResult;
use crate::repository::{ContentRepository, ResourceId};
use log::{debug, error};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Per-session memo of client id -> resolved element.
///
/// Property hashes cannot be reversed, so an element placed with
/// element-level properties can only be resolved again through this cache.
#[derive(Debug, Default)]
pub struct SessionElementCache {
    entries: Mutex<HashMap<String, ElementDescriptor>>,
}

impl SessionElementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, client_id: &str) -> Option<ElementDescriptor> {
        match self.entries.lock() {
            Ok(entries) => entries.get(client_id).cloned(),
            Err(_) => {
                error!("🚨 CRITICAL: SessionElementCache lock poisoned in get");
                None
            }
        }
    }

    pub fn insert(&self, descriptor: ElementDescriptor) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(descriptor.client_id.clone(), descriptor);
            }
            Err(_) => error!("🚨 CRITICAL: SessionElementCache lock poisoned in insert"),
        }
    }

    /// Drops every cached variant of a structure id.
    pub fn invalidate(&self, structure_id: ResourceId) {
        match self.entries.lock() {
            Ok(mut entries) => entries.retain(|_, entry| entry.structure_id != structure_id),
            Err(_) => error!("🚨 CRITICAL: SessionElementCache lock poisoned in invalidate"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a client id, using the cached descriptor when present.
    pub fn resolve(
        &self,
        repository: &dyn ContentRepository,
        user: &str,
        client_id: &str,
    ) -> AdeResult<ElementDescriptor> {
        if let Some(descriptor) = self.get(client_id) {
            debug!("Element cache hit for {}", client_id);
            return Ok(descriptor);
        }

        let parsed = ClientId::parse(client_id)?;
        let resource = repository.read_resource(parsed.structure_id())?;
        let descriptor = ElementDescriptor::from_resource(&resource, &parsed, BTreeMap::new(), user);
        // A hashed fallback lacks its properties and must not shadow a later register.
        if parsed.is_plain() {
            self.insert(descriptor.clone());
        } else {
            debug!(
                "Element {} not cached; resolved without element properties",
                client_id
            );
        }
        Ok(descriptor)
    }

    /// Resolves a structure id with element-level properties and caches it
    /// under the derived client id.
    pub fn register(
        &self,
        repository: &dyn ContentRepository,
        user: &str,
        structure_id: ResourceId,
        properties: BTreeMap<String, String>,
    ) -> AdeResult<ElementDescriptor> {
        let client_id = ClientId::new(structure_id, &properties);
        if let Some(descriptor) = self.get(&client_id.to_string())
            && descriptor.properties == properties
        {
            return Ok(descriptor);
        }
        let resource = repository.read_resource(structure_id)?;
        let descriptor = ElementDescriptor::from_resource(&resource, &client_id, properties, user);
        self.insert(descriptor.clone());
        Ok(descriptor)
    }
}
