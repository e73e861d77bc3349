// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{AdeError, AdeResult};
use crate::repository::{ResourceId, SearchIndex, SearchQuery};
use log::{debug, error};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct SearchState {
    query: SearchQuery,
    hits: Vec<ResourceId>,
    page_size: usize,
    next_page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub count: usize,
    pub page: usize,
    pub has_more: bool,
    #[serde(skip)]
    pub ids: Vec<ResourceId>,
}

/// Remembers the last search of a session so the editor can page through it.
#[derive(Debug, Default)]
pub struct SearchListManager {
    state: Mutex<Option<SearchState>>,
}

impl SearchListManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &self,
        index: &dyn SearchIndex,
        query: SearchQuery,
        page_size: usize,
    ) -> AdeResult<SearchPage> {
        let hits = index.search(&query)?;
        debug!("Search {:?} returned {} hits", query, hits.len());
        let mut state = SearchState {
            query,
            hits,
            page_size: page_size.max(1),
            next_page: 0,
        };
        let page = take_page(&mut state);
        self.store(Some(state))?;
        Ok(page)
    }

    pub fn next_page(&self) -> AdeResult<SearchPage> {
        let mut guard = self.state.lock().map_err(|_| {
            error!("🚨 CRITICAL: SearchListManager lock poisoned in next_page");
            AdeError::internal("Search state unavailable")
        })?;
        let state = guard
            .as_mut()
            .ok_or_else(|| AdeError::bad_request("No search in progress"))?;
        Ok(take_page(state))
    }

    fn store(&self, value: Option<SearchState>) -> AdeResult<()> {
        let mut guard = self.state.lock().map_err(|_| {
            error!("🚨 CRITICAL: SearchListManager lock poisoned in store");
            AdeError::internal("Search state unavailable")
        })?;
        *guard = value;
        Ok(())
    }
}

fn take_page(state: &mut SearchState) -> SearchPage {
    let start = state.next_page.saturating_mul(state.page_size);
    let end = start.saturating_add(state.page_size).min(state.hits.len());
    let ids = if start < state.hits.len() {
        state.hits[start..end].to_vec()
    } else {
        Vec::new()
    };
    let page = SearchPage {
        count: state.hits.len(),
        page: state.next_page,
        has_more: end < state.hits.len(),
        ids,
    };
    if !page.ids.is_empty() {
        state.next_page += 1;
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryResult;
    use uuid::Uuid;

    struct FixedIndex(Vec<ResourceId>);

    impl SearchIndex for FixedIndex {
        fn search(&self, _query: &SearchQuery) -> RepositoryResult<Vec<ResourceId>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn pages_through_hits() {
        let hits: Vec<ResourceId> = (0..5).map(|_| Uuid::new_v4()).collect();
        let index = FixedIndex(hits.clone());
        let manager = SearchListManager::new();

        let first = manager
            .start(&index, SearchQuery::default(), 2)
            .expect("start");
        assert_eq!(first.count, 5);
        assert_eq!(first.ids, hits[0..2].to_vec());
        assert!(first.has_more);

        let second = manager.next_page().expect("second");
        assert_eq!(second.page, 1);
        assert_eq!(second.ids, hits[2..4].to_vec());

        let third = manager.next_page().expect("third");
        assert_eq!(third.ids, hits[4..].to_vec());
        assert!(!third.has_more);

        let past_end = manager.next_page().expect("past end");
        assert!(past_end.ids.is_empty());
    }

    #[test]
    fn next_page_without_search_is_bad_request() {
        let manager = SearchListManager::new();
        assert!(manager.next_page().is_err());
    }

    #[test]
    fn new_search_replaces_previous() {
        let manager = SearchListManager::new();
        manager
            .start(&FixedIndex(vec![Uuid::new_v4()]), SearchQuery::default(), 1)
            .expect("first");
        let query = SearchQuery {
            text: "news".to_string(),
            types: Vec::new(),
        };
        let page = manager
            .start(&FixedIndex(Vec::new()), query, 1)
            .expect("second");
        assert_eq!(page.count, 0);
        let next = manager.next_page().expect("next");
        assert_eq!(next.count, 0);
        assert!(!next.has_more);
    }
}
