// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::test;
use ade::config::PublishConfig;
use ade::repository::{ContentRepository, ResourceState};
use ade::util::TestConfigBuilder;
use common::{
    ALPINE_ID, DRAFT_ID, LOCKED_ID, OUTSIDE_ID, TestHarness, action_request, id, read_json,
};
use serde_json::{Value, json};

fn group_ids(group: &Value) -> Vec<String> {
    group["resources"]
        .as_array()
        .expect("resources")
        .iter()
        .filter_map(|entry| entry["id"].as_str().map(str::to_string))
        .collect()
}

#[actix_web::test]
async fn publish_list_groups_pending_changes_by_session_and_day() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(&harness.publish_uri(), "alice", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["state"], "ok", "{}", json);
    assert_eq!(json["count"], 4);
    assert_eq!(json["skipped"], 0);

    let groups = json["groups"].as_array().expect("groups");
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0]["kind"], "session");
    assert_eq!(
        group_ids(&groups[0]),
        vec![ALPINE_ID.to_string(), DRAFT_ID.to_string()]
    );
    assert_eq!(groups[0]["name"], "Session 2026-03-02 09:00 - 2026-03-02 10:00");
    assert_eq!(groups[1]["kind"], "session");
    assert_eq!(group_ids(&groups[1]), vec![LOCKED_ID.to_string()]);
    assert_eq!(groups[2]["kind"], "day");
    assert_eq!(groups[2]["name"], "Saturday, 10 January 2026");
    assert_eq!(group_ids(&groups[2]), vec![OUTSIDE_ID.to_string()]);

    assert_eq!(groups[1]["resources"][0]["info"]["kind"], "locked");
    assert_eq!(groups[2]["resources"][0]["info"]["kind"], "permission");
    assert!(groups[0]["resources"][0].get("info").is_none());
}

#[actix_web::test]
async fn publish_list_honours_explicit_options() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish_list",
        Some(json!({ "include_related": false, "include_siblings": false })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    let alpine = &json["groups"][0]["resources"][0];
    assert_eq!(alpine["id"], ALPINE_ID);
    assert!(alpine.get("related").is_none());
}

#[actix_web::test]
async fn exhausted_budgets_collapse_into_one_group() {
    let config = TestConfigBuilder::new()
        .with_publish(PublishConfig {
            max_sessions: 0,
            max_days: 0,
            ..PublishConfig::default()
        })
        .build();
    let harness = TestHarness::with_config(config);
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(&harness.publish_uri(), "alice", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    let groups = json["groups"].as_array().expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["kind"], "other");
    assert_eq!(groups[0]["name"], "Older changes");
    assert_eq!(json["count"], 4);
}

#[actix_web::test]
async fn lock_holder_sees_locked_changes() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(&harness.publish_uri(), "bob", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["state"], "ok");
    // bob holds the lock on one of alice's changes and may not publish it.
    assert_eq!(json["count"], 1);
    assert_eq!(json["groups"][0]["resources"][0]["id"], LOCKED_ID);
    assert_eq!(json["groups"][0]["resources"][0]["info"]["kind"], "permission");
}

#[actix_web::test]
async fn publish_refuses_broken_links_unless_forced() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish",
        Some(json!({ "resources": [ALPINE_ID] })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["state"], "ok", "{}", json);
    assert_eq!(json["executed"], false);
    assert_eq!(json["problems"][0]["info"]["kind"], "broken_link");
    let alpine = harness
        .repository
        .read_resource(id(ALPINE_ID))
        .expect("alpine");
    assert_eq!(alpine.state, ResourceState::Changed);

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish",
        Some(json!({ "resources": [ALPINE_ID], "force": true })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["executed"], true);
    assert_eq!(json["published"], json!([ALPINE_ID]));
}

#[actix_web::test]
async fn publish_reports_blocked_resources_and_publishes_the_rest() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish",
        Some(json!({ "resources": [ALPINE_ID, DRAFT_ID, LOCKED_ID, OUTSIDE_ID] })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["executed"], true, "{}", json);
    assert_eq!(json["published"], json!([ALPINE_ID, DRAFT_ID]));
    assert_eq!(json["problems"].as_array().map(Vec::len), Some(2));

    let draft = harness
        .repository
        .read_resource(id(DRAFT_ID))
        .expect("draft");
    assert_eq!(draft.state, ResourceState::Unchanged);
    assert!(draft.date_published.is_some());

    let req = action_request(&harness.publish_uri(), "alice", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["count"], 2);
}

#[actix_web::test]
async fn remove_excludes_resources_from_the_list() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "remove",
        Some(json!({ "resources": [OUTSIDE_ID, LOCKED_ID] })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["removed"], json!([OUTSIDE_ID, LOCKED_ID]));

    let req = action_request(&harness.publish_uri(), "alice", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["groups"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn unknown_publish_action_is_an_error() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(&harness.publish_uri(), "alice", "all", None, None).to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["state"], "error");
}

#[actix_web::test]
async fn partial_options_keep_configured_defaults() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    // With the draft off alice's list it can only show up as a relation target.
    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "remove",
        Some(json!({ "resources": [DRAFT_ID] })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["state"], "ok", "{}", json);

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish_list",
        Some(json!({ "include_siblings": false })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    let alpine = &json["groups"][0]["resources"][0];
    assert_eq!(alpine["id"], ALPINE_ID);
    assert_eq!(alpine["related"][0]["id"], DRAFT_ID);

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish_list",
        Some(json!({ "include_related": false })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert!(json["groups"][0]["resources"][0].get("related").is_none());
}

#[actix_web::test]
async fn refused_publish_does_not_apply_removals() {
    let harness = TestHarness::new();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = action_request(
        &harness.publish_uri(),
        "alice",
        "publish",
        Some(json!({ "resources": [ALPINE_ID], "remove": [OUTSIDE_ID] })),
        None,
    )
    .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["executed"], false, "{}", json);

    let req = action_request(&harness.publish_uri(), "alice", "publish_list", None, None)
        .to_request();
    let json = read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["count"], 4);
}
