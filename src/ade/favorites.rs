// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::repository::ResourceId;
use log::error;
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-user favorite elements, kept in the order the editor sent them.
#[derive(Debug, Default)]
pub struct FavoriteListManager {
    lists: Mutex<HashMap<String, Vec<String>>>,
}

impl FavoriteListManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: &str) -> Vec<String> {
        match self.lists.lock() {
            Ok(lists) => lists.get(user).cloned().unwrap_or_default(),
            Err(_) => {
                error!("🚨 CRITICAL: FavoriteListManager lock poisoned in get");
                Vec::new()
            }
        }
    }

    pub fn set(&self, user: &str, client_ids: &[String]) -> Vec<String> {
        let mut list: Vec<String> = Vec::with_capacity(client_ids.len());
        for client_id in client_ids {
            if !list.contains(client_id) {
                list.push(client_id.clone());
            }
        }
        match self.lists.lock() {
            Ok(mut lists) => {
                lists.insert(user.to_string(), list.clone());
            }
            Err(_) => error!("🚨 CRITICAL: FavoriteListManager lock poisoned in set"),
        }
        list
    }

    pub fn remove_structure(&self, user: &str, structure_id: ResourceId) {
        let prefix = structure_id.to_string();
        match self.lists.lock() {
            Ok(mut lists) => {
                if let Some(list) = lists.get_mut(user) {
                    list.retain(|entry| !entry.starts_with(&prefix));
                }
            }
            Err(_) => error!("🚨 CRITICAL: FavoriteListManager lock poisoned in remove_structure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn set_keeps_order_and_drops_duplicates() {
        let manager = FavoriteListManager::new();
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(manager.set("alice", &ids), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(manager.get("alice").len(), 2);
        assert!(manager.get("bob").is_empty());
    }

    #[test]
    fn remove_structure_clears_matching_entries() {
        let manager = FavoriteListManager::new();
        let id = Uuid::new_v4();
        manager.set("alice", &[format!("{}#12345678", id), "keep".to_string()]);
        manager.remove_structure("alice", id);
        assert_eq!(manager.get("alice"), vec!["keep".to_string()]);
    }
}
