#![cfg(feature = "integration_tests")]

mod common;

use api::gql::build_schema;
use async_graphql::Variables;
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use uuid::Uuid;

const MY_XP_QUERY: &str = r#"
    query MyXp {
        myXp {
            totalXp
            level
            league
        }
    }
"#;

async fn create_single_match(
    schema: &api::gql::AppSchema,
    app_state: &api::AppState,
    organizer: api::auth::Claims,
    title: &str,
) -> serde_json::Value {
    let sport_id = seeded_sport(app_state).await;
    let variables = Variables::from_json(json!({
        "input": {
            "sportId": sport_id.to_string(),
            "title": title,
            "matchDate": (Utc::now() + Duration::days(2)).to_rfc3339(),
            "maxPlayers": 10
        }
    }));
    let mutation = r#"
        mutation CreateMatch($input: CreateMatchInput!) {
            createMatch(input: $input) {
                id
            }
        }
    "#;
    let response = execute_graphql(schema, mutation, Some(variables), Some(organizer)).await;
    assert!(
        response.errors.is_empty(),
        "Match creation should succeed: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()["createMatch"][0].clone()
}

async fn total_xp(schema: &api::gql::AppSchema, claims: &api::auth::Claims) -> i64 {
    let response = execute_graphql(schema, MY_XP_QUERY, None, Some(claims.clone())).await;
    assert!(
        response.errors.is_empty(),
        "myXp should succeed: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()["myXp"]["totalXp"]
        .as_i64()
        .unwrap()
}

async fn badge_slugs(
    schema: &api::gql::AppSchema,
    user_id: Uuid,
) -> Vec<String> {
    let query = r#"
        query PlayerBadges($userId: ID!) {
            playerBadges(userId: $userId) {
                badge {
                    slug
                }
            }
        }
    "#;
    let variables = Variables::from_json(json!({ "userId": user_id.to_string() }));
    let response = execute_graphql(schema, query, Some(variables), None).await;
    assert!(
        response.errors.is_empty(),
        "playerBadges should succeed: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()["playerBadges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["badge"]["slug"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_match_creation_awards_xp_and_organizer_badge() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, organizer) = create_test_player(&app_state, "organizer").await;
    create_single_match(&schema, &app_state, organizer.clone(), "Fut de quarta").await;

    // 50 for the match plus the 150 XP organizador badge reward.
    assert_eq!(total_xp(&schema, &organizer).await, 200);
    assert!(badge_slugs(&schema, organizer_id).await.contains(&"organizador".to_string()));

    let response = execute_graphql(&schema, MY_XP_QUERY, None, Some(organizer.clone())).await;
    let data = response.data.into_json().unwrap();
    assert_eq!(data["myXp"]["level"], 2);
    assert_eq!(data["myXp"]["league"], "BRONZE");

    // The badge is granted once; a second match only pays the base XP.
    create_single_match(&schema, &app_state, organizer.clone(), "Fut de sexta").await;
    assert_eq!(total_xp(&schema, &organizer).await, 250);
}

#[tokio::test]
async fn test_attendance_pays_xp_exactly_once() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, organizer) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 10, Duration::days(1)).await;

    let (player_id, player) = create_test_player(&app_state, "player").await;
    let join = r#"
        mutation JoinMatch($matchId: ID!) {
            joinMatch(matchId: $matchId) {
                participant {
                    id
                }
            }
        }
    "#;
    let response = execute_graphql(
        &schema,
        join,
        Some(Variables::from_json(json!({ "matchId": match_id.to_string() }))),
        Some(player.clone()),
    )
    .await;
    assert!(response.errors.is_empty());
    let data = response.data.into_json().unwrap();
    let participant_id = data["joinMatch"]["participant"]["id"].as_str().unwrap().to_string();

    rewind_match(&app_state, match_id, 2).await;

    let mark = r#"
        mutation MarkAttendance($participantId: ID!, $attended: Boolean!) {
            markAttendance(participantId: $participantId, attended: $attended) {
                status
            }
        }
    "#;
    let mark_vars = |attended: bool| {
        Variables::from_json(json!({
            "participantId": participant_id,
            "attended": attended
        }))
    };

    let response = execute_graphql(&schema, mark, Some(mark_vars(true)), Some(organizer.clone())).await;
    assert!(
        response.errors.is_empty(),
        "Attendance should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["markAttendance"]["status"], "ATTENDED");

    // 25 for playing plus the 100 XP estreante badge reward.
    assert_eq!(total_xp(&schema, &player).await, 125);
    assert!(badge_slugs(&schema, player_id).await.contains(&"estreante".to_string()));

    // Corrections flip the status but never pay again.
    let response = execute_graphql(&schema, mark, Some(mark_vars(false)), Some(organizer.clone())).await;
    assert!(response.errors.is_empty());
    let response = execute_graphql(&schema, mark, Some(mark_vars(true)), Some(organizer)).await;
    assert!(response.errors.is_empty());
    assert_eq!(total_xp(&schema, &player).await, 125);
}

#[tokio::test]
async fn test_attendance_before_kickoff_is_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, organizer) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 10, Duration::days(1)).await;

    let (_, player) = create_test_player(&app_state, "player").await;
    let join = r#"
        mutation JoinMatch($matchId: ID!) {
            joinMatch(matchId: $matchId) {
                participant {
                    id
                }
            }
        }
    "#;
    let response = execute_graphql(
        &schema,
        join,
        Some(Variables::from_json(json!({ "matchId": match_id.to_string() }))),
        Some(player),
    )
    .await;
    let data = response.data.into_json().unwrap();
    let participant_id = data["joinMatch"]["participant"]["id"].as_str().unwrap().to_string();

    let mark = r#"
        mutation MarkAttendance($participantId: ID!, $attended: Boolean!) {
            markAttendance(participantId: $participantId, attended: $attended) {
                status
            }
        }
    "#;
    let response = execute_graphql(
        &schema,
        mark,
        Some(Variables::from_json(json!({ "participantId": participant_id, "attended": true }))),
        Some(organizer),
    )
    .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Match has not started yet");
}

#[tokio::test]
async fn test_leaderboard_ranks_by_total_xp() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (busy_id, busy) = create_test_player(&app_state, "busy").await;
    let (casual_id, casual) = create_test_player(&app_state, "casual").await;

    create_single_match(&schema, &app_state, busy.clone(), "Racha um").await;
    create_single_match(&schema, &app_state, busy, "Racha dois").await;
    create_single_match(&schema, &app_state, casual, "Racha solitário").await;

    let query = r#"
        query Leaderboard {
            leaderboard(limit: 100) {
                rank
                userId
                totalXp
            }
        }
    "#;
    let response = execute_graphql(&schema, query, None, None).await;
    assert!(
        response.errors.is_empty(),
        "Leaderboard should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    let entries = data["leaderboard"].as_array().unwrap();

    let busy_entry = entries
        .iter()
        .find(|e| e["userId"] == busy_id.to_string())
        .expect("Busy organizer should be ranked");
    let casual_entry = entries
        .iter()
        .find(|e| e["userId"] == casual_id.to_string())
        .expect("Casual organizer should be ranked");

    assert_eq!(busy_entry["totalXp"], 250);
    assert_eq!(casual_entry["totalXp"], 200);
    assert!(
        busy_entry["rank"].as_i64().unwrap() < casual_entry["rank"].as_i64().unwrap(),
        "More XP should rank higher"
    );
}

#[tokio::test]
async fn test_xp_history_filters_by_kind() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (_, organizer) = create_test_player(&app_state, "organizer").await;
    create_single_match(&schema, &app_state, organizer.clone(), "Fut do histórico").await;

    let query = r#"
        query XpHistory($kind: XpReason) {
            xpHistory(kind: $kind) {
                amount
                kind
                reason
            }
        }
    "#;

    let response = execute_graphql(&schema, query, None, Some(organizer.clone())).await;
    assert!(response.errors.is_empty());
    let data = response.data.into_json().unwrap();
    assert_eq!(data["xpHistory"].as_array().unwrap().len(), 2);

    let response = execute_graphql(
        &schema,
        query,
        Some(Variables::from_json(json!({ "kind": "MATCH_CREATED" }))),
        Some(organizer),
    )
    .await;
    assert!(response.errors.is_empty());
    let data = response.data.into_json().unwrap();
    let entries = data["xpHistory"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["amount"], 50);
    assert_eq!(entries[0]["kind"], "MATCH_CREATED");
    assert_eq!(entries[0]["reason"], "Created match \"Fut do histórico\"");
}
