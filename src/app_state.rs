// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;
use std::time::Duration;

use crate::ade::{ContainerPageCache, FavoriteListManager, RecentListManager, SessionRegistry};
use crate::config::ValidatedConfig;
use crate::publish::PublishHelper;
use crate::repository::{ContentRepository, MemoryRepository, SearchIndex};

pub struct AppState {
    pub config: Arc<ValidatedConfig>,
    pub repository: Arc<dyn ContentRepository>,
    pub search_index: Arc<dyn SearchIndex>,
    pub sessions: SessionRegistry,
    pub recent: RecentListManager,
    pub favorites: FavoriteListManager,
    pub page_cache: ContainerPageCache,
    pub publish: PublishHelper,
}

impl AppState {
    pub fn new(
        config: Arc<ValidatedConfig>,
        repository: Arc<dyn ContentRepository>,
        search_index: Arc<dyn SearchIndex>,
    ) -> Self {
        let idle = Duration::from_secs(config.ade.session_idle_minutes.saturating_mul(60));
        Self {
            sessions: SessionRegistry::new(idle, config.ade.max_sessions),
            recent: RecentListManager::new(config.ade.recent_list_size),
            favorites: FavoriteListManager::new(),
            page_cache: ContainerPageCache::new(),
            publish: PublishHelper::new(repository.clone(), &config.publish),
            config,
            repository,
            search_index,
        }
    }

    /// Uses one in-memory repository for both content and search.
    pub fn with_memory_repository(
        config: Arc<ValidatedConfig>,
        repository: Arc<MemoryRepository>,
    ) -> Self {
        let search_index: Arc<dyn SearchIndex> = repository.clone();
        Self::new(config, repository, search_index)
    }
}
