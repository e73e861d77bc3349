// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Splits a publish list into time-based groups for the review screen.
//!
//! Resources are ordered newest first. The first groups are "working
//! sessions", separated by gaps longer than the session gap. Once the session
//! budget is used up, groups follow calendar days. Once the day budget is
//! used up too, every remaining resource goes into one catch-all group.

use super::PublishResource;
use crate::config::PublishConfig;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use log::warn;
use serde::Serialize;

const SESSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DAY_FORMAT: &str = "%A, %d %B %Y";
const OTHER_GROUP_NAME: &str = "Older changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishGroupKind {
    Session,
    Day,
    Other,
}

#[derive(Debug, Clone)]
pub struct GroupingPolicy {
    pub session_gap: Duration,
    pub max_sessions: u32,
    pub max_days: u32,
    pub offset: FixedOffset,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self::from_config(&PublishConfig::default())
    }
}

impl GroupingPolicy {
    pub fn from_config(config: &PublishConfig) -> Self {
        let offset = match FixedOffset::east_opt(config.utc_offset_minutes * 60) {
            Some(offset) => offset,
            None => {
                warn!(
                    "Invalid publish.utc_offset_minutes {}; using UTC",
                    config.utc_offset_minutes
                );
                Utc.fix()
            }
        };
        Self {
            session_gap: Duration::hours(i64::from(config.session_gap_hours)),
            max_sessions: config.max_sessions,
            max_days: config.max_days,
            offset,
        }
    }

    fn day_of(&self, time: DateTime<Utc>) -> NaiveDate {
        time.with_timezone(&self.offset).date_naive()
    }

    fn format(&self, time: DateTime<Utc>, pattern: &str) -> String {
        time.with_timezone(&self.offset).format(pattern).to_string()
    }
}

/// A named bucket of publish entries. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct PublishGroup {
    name: String,
    kind: PublishGroupKind,
    resources: Vec<PublishResource>,
}

impl PublishGroup {
    fn build(
        kind: PublishGroupKind,
        resources: Vec<PublishResource>,
        policy: &GroupingPolicy,
    ) -> Self {
        let name = match kind {
            PublishGroupKind::Session => {
                let newest = resources.first().map(|r| r.date_last_modified);
                let oldest = resources.last().map(|r| r.date_last_modified);
                match (oldest, newest) {
                    (Some(oldest), Some(newest)) => format!(
                        "Session {} - {}",
                        policy.format(oldest, SESSION_TIME_FORMAT),
                        policy.format(newest, SESSION_TIME_FORMAT)
                    ),
                    _ => "Session".to_string(),
                }
            }
            PublishGroupKind::Day => resources
                .first()
                .map(|r| policy.format(r.date_last_modified, DAY_FORMAT))
                .unwrap_or_else(|| "Day".to_string()),
            PublishGroupKind::Other => OTHER_GROUP_NAME.to_string(),
        };
        Self {
            name,
            kind,
            resources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PublishGroupKind {
        self.kind
    }

    pub fn resources(&self) -> &[PublishResource] {
        &self.resources
    }
}

fn kind_for_budget(sessions_left: u32, days_left: u32) -> PublishGroupKind {
    if sessions_left > 0 {
        PublishGroupKind::Session
    } else if days_left > 0 {
        PublishGroupKind::Day
    } else {
        PublishGroupKind::Other
    }
}

pub fn group_resources(
    mut resources: Vec<PublishResource>,
    policy: &GroupingPolicy,
) -> Vec<PublishGroup> {
    resources.sort_by(|a, b| {
        b.date_last_modified
            .cmp(&a.date_last_modified)
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut groups = Vec::new();
    let mut sessions_left = policy.max_sessions;
    let mut days_left = policy.max_days;
    let mut kind = kind_for_budget(sessions_left, days_left);
    let mut current: Vec<PublishResource> = Vec::new();

    let mut iter = resources.into_iter().peekable();
    while let Some(resource) = iter.next() {
        let boundary = match (kind, iter.peek()) {
            (_, None) | (PublishGroupKind::Other, _) => false,
            (PublishGroupKind::Session, Some(next)) => {
                resource.date_last_modified - next.date_last_modified > policy.session_gap
            }
            (PublishGroupKind::Day, Some(next)) => {
                policy.day_of(resource.date_last_modified) != policy.day_of(next.date_last_modified)
            }
        };
        current.push(resource);
        if !boundary {
            continue;
        }

        groups.push(PublishGroup::build(
            kind,
            std::mem::take(&mut current),
            policy,
        ));
        match kind {
            PublishGroupKind::Session => sessions_left -= 1,
            PublishGroupKind::Day => days_left -= 1,
            PublishGroupKind::Other => {}
        }
        kind = kind_for_budget(sessions_left, days_left);
    }

    if !current.is_empty() {
        groups.push(PublishGroup::build(kind, current, policy));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ResourceState;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn entry(path: &str, time: DateTime<Utc>) -> PublishResource {
        PublishResource {
            id: Uuid::new_v4(),
            path: path.to_string(),
            title: path.to_string(),
            type_name: "article".to_string(),
            state: ResourceState::Changed,
            date_last_modified: time,
            user_last_modified: "editor".to_string(),
            info: None,
            related: Vec::new(),
        }
    }

    fn sizes(groups: &[PublishGroup]) -> Vec<(PublishGroupKind, usize)> {
        groups
            .iter()
            .map(|group| (group.kind(), group.resources().len()))
            .collect()
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_resources(Vec::new(), &GroupingPolicy::default()).is_empty());
    }

    #[test]
    fn single_resource_is_one_session() {
        let groups = group_resources(vec![entry("/a", at(10, 12))], &GroupingPolicy::default());
        assert_eq!(sizes(&groups), vec![(PublishGroupKind::Session, 1)]);
    }

    #[test]
    fn gaps_within_threshold_stay_in_one_session() {
        let input = vec![
            entry("/a", at(10, 12)),
            entry("/b", at(10, 6)),
            entry("/c", at(9, 23)),
        ];
        let groups = group_resources(input, &GroupingPolicy::default());
        assert_eq!(sizes(&groups), vec![(PublishGroupKind::Session, 3)]);
    }

    #[test]
    fn gap_of_exactly_session_gap_is_not_a_boundary() {
        let input = vec![entry("/a", at(10, 12)), entry("/b", at(10, 4))];
        let groups = group_resources(input, &GroupingPolicy::default());
        assert_eq!(sizes(&groups), vec![(PublishGroupKind::Session, 2)]);

        let input = vec![entry("/a", at(10, 12)), entry("/b", at(10, 3))];
        let groups = group_resources(input, &GroupingPolicy::default());
        assert_eq!(
            sizes(&groups),
            vec![(PublishGroupKind::Session, 1), (PublishGroupKind::Session, 1)]
        );
    }

    #[test]
    fn budgets_are_consumed_in_order() {
        // sessions: [20/12], [19/12, 19/10]; days: [17/..], [16/..], [14/..]; rest: other
        let input = vec![
            entry("/s1", at(20, 12)),
            entry("/s2a", at(19, 12)),
            entry("/s2b", at(19, 10)),
            entry("/d1a", at(17, 20)),
            entry("/d1b", at(17, 1)),
            entry("/d2", at(16, 12)),
            entry("/d3", at(14, 12)),
            entry("/o1", at(12, 12)),
            entry("/o2", at(5, 12)),
            entry("/o3", at(1, 12)),
        ];
        let groups = group_resources(input, &GroupingPolicy::default());
        assert_eq!(
            sizes(&groups),
            vec![
                (PublishGroupKind::Session, 1),
                (PublishGroupKind::Session, 2),
                (PublishGroupKind::Day, 2),
                (PublishGroupKind::Day, 1),
                (PublishGroupKind::Day, 1),
                (PublishGroupKind::Other, 3),
            ]
        );
        assert_eq!(groups[2].name(), "Tuesday, 17 March 2026");
        assert_eq!(groups[5].name(), "Older changes");
        assert_eq!(groups[1].name(), "Session 2026-03-19 10:00 - 2026-03-19 12:00");
    }

    #[test]
    fn unsorted_input_is_sorted_newest_first_and_groups_are_non_increasing() {
        let input = vec![
            entry("/old", at(1, 8)),
            entry("/new", at(20, 8)),
            entry("/mid", at(10, 8)),
            entry("/mid2", at(10, 7)),
            entry("/older", at(2, 8)),
        ];
        let total = input.len();
        let groups = group_resources(input, &GroupingPolicy::default());
        assert_eq!(groups[0].resources()[0].path, "/new");

        let times: Vec<_> = groups
            .iter()
            .filter_map(|group| group.resources().first().map(|r| r.date_last_modified))
            .collect();
        assert!(times.windows(2).all(|pair| pair[0] >= pair[1]));
        let grouped: usize = groups.iter().map(|group| group.resources().len()).sum();
        assert_eq!(grouped, total);
    }

    #[test]
    fn zero_budgets_put_everything_in_one_catch_all() {
        let policy = GroupingPolicy {
            max_sessions: 0,
            max_days: 0,
            ..GroupingPolicy::default()
        };
        let input = vec![entry("/a", at(20, 8)), entry("/b", at(2, 8)), entry("/c", at(1, 8))];
        let groups = group_resources(input, &policy);
        assert_eq!(sizes(&groups), vec![(PublishGroupKind::Other, 3)]);
    }

    #[test]
    fn day_boundaries_follow_configured_offset() {
        let policy = GroupingPolicy {
            max_sessions: 0,
            max_days: 5,
            offset: FixedOffset::east_opt(3 * 3600).unwrap(),
            ..GroupingPolicy::default()
        };
        // 22:00 UTC on the 9th is already the 10th at UTC+3.
        let input = vec![entry("/a", at(10, 8)), entry("/b", at(9, 22))];
        let groups = group_resources(input, &policy);
        assert_eq!(sizes(&groups), vec![(PublishGroupKind::Day, 2)]);
    }

    #[test]
    fn catch_all_appears_at_most_once() {
        let policy = GroupingPolicy {
            max_sessions: 1,
            max_days: 1,
            ..GroupingPolicy::default()
        };
        let input: Vec<_> = (1..=9).map(|day| entry(&format!("/{}", day), at(day, 8))).collect();
        let groups = group_resources(input, &policy);
        let other = groups
            .iter()
            .filter(|group| group.kind() == PublishGroupKind::Other)
            .count();
        assert_eq!(other, 1);
        assert_eq!(groups.last().map(PublishGroup::kind), Some(PublishGroupKind::Other));
        assert!(
            groups
                .iter()
                .filter(|group| group.kind() == PublishGroupKind::Session)
                .count()
                <= 1
        );
    }
}
