// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::repository::{ResourceId, UserInfo};
use log::error;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Per-user most recently used element list, newest first.
#[derive(Debug)]
pub struct RecentListManager {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    default_size: usize,
}

impl RecentListManager {
    pub fn new(default_size: usize) -> Self {
        Self {
            lists: Mutex::new(HashMap::new()),
            default_size: default_size.max(1),
        }
    }

    pub fn bound_for(&self, user: &UserInfo) -> usize {
        user.recent_list_size
            .filter(|size| *size > 0)
            .unwrap_or(self.default_size)
    }

    pub fn get(&self, user: &UserInfo) -> Vec<String> {
        match self.lists.lock() {
            Ok(lists) => lists
                .get(&user.name)
                .map(|list| list.iter().cloned().collect())
                .unwrap_or_default(),
            Err(_) => {
                error!("🚨 CRITICAL: RecentListManager lock poisoned in get");
                Vec::new()
            }
        }
    }

    /// Moves `client_id` to the front, evicting the oldest entries beyond the bound.
    pub fn touch(&self, user: &UserInfo, client_id: &str) {
        let bound = self.bound_for(user);
        match self.lists.lock() {
            Ok(mut lists) => {
                let list = lists.entry(user.name.clone()).or_default();
                list.retain(|entry| entry != client_id);
                list.push_front(client_id.to_string());
                list.truncate(bound);
            }
            Err(_) => error!("🚨 CRITICAL: RecentListManager lock poisoned in touch"),
        }
    }

    /// Replaces the list with the client's order, de-duplicated and bounded.
    pub fn set(&self, user: &UserInfo, client_ids: &[String]) -> Vec<String> {
        let bound = self.bound_for(user);
        let mut list: VecDeque<String> = VecDeque::new();
        for client_id in client_ids {
            if list.len() >= bound {
                break;
            }
            if !list.contains(client_id) {
                list.push_back(client_id.clone());
            }
        }
        let stored: Vec<String> = list.iter().cloned().collect();
        match self.lists.lock() {
            Ok(mut lists) => {
                lists.insert(user.name.clone(), list);
            }
            Err(_) => error!("🚨 CRITICAL: RecentListManager lock poisoned in set"),
        }
        stored
    }

    pub fn remove_structure(&self, user: &UserInfo, structure_id: ResourceId) {
        let prefix = structure_id.to_string();
        match self.lists.lock() {
            Ok(mut lists) => {
                if let Some(list) = lists.get_mut(&user.name) {
                    list.retain(|entry| !entry.starts_with(&prefix));
                }
            }
            Err(_) => error!("🚨 CRITICAL: RecentListManager lock poisoned in remove_structure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(size: Option<usize>) -> UserInfo {
        UserInfo {
            name: "alice".to_string(),
            recent_list_size: size,
            publish_paths: Vec::new(),
        }
    }

    #[test]
    fn touch_moves_entry_to_front_without_duplicates() {
        let manager = RecentListManager::new(10);
        let alice = user(None);
        manager.touch(&alice, "a");
        manager.touch(&alice, "b");
        manager.touch(&alice, "a");
        assert_eq!(manager.get(&alice), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn list_is_bounded_by_user_setting() {
        let manager = RecentListManager::new(10);
        let alice = user(Some(2));
        for id in ["a", "b", "c"] {
            manager.touch(&alice, id);
        }
        assert_eq!(manager.get(&alice), vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn default_bound_applies_without_user_setting() {
        let manager = RecentListManager::new(3);
        let alice = user(Some(0));
        let ids: Vec<String> = (0..6).map(|i| i.to_string()).collect();
        let stored = manager.set(&alice, &ids);
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0], "0");
    }

    #[test]
    fn set_deduplicates_in_client_order() {
        let manager = RecentListManager::new(10);
        let alice = user(None);
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(manager.set(&alice, &ids), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn remove_structure_drops_hashed_variants() {
        let manager = RecentListManager::new(10);
        let alice = user(None);
        let id = Uuid::new_v4();
        manager.touch(&alice, &id.to_string());
        manager.touch(&alice, &format!("{}#abcd1234", id));
        manager.touch(&alice, "other");
        manager.remove_structure(&alice, id);
        assert_eq!(manager.get(&alice), vec!["other".to_string()]);
    }

    #[test]
    fn lists_are_per_user() {
        let manager = RecentListManager::new(10);
        let alice = user(None);
        let bob = UserInfo {
            name: "bob".to_string(),
            ..user(None)
        };
        manager.touch(&alice, "a");
        assert!(manager.get(&bob).is_empty());
    }
}
