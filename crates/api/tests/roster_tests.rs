#![cfg(feature = "integration_tests")]

mod common;

use api::gql::build_schema;
use async_graphql::Variables;
use chrono::Duration;
use common::*;
use serde_json::json;

const JOIN_MUTATION: &str = r#"
    mutation JoinMatch($matchId: ID!) {
        joinMatch(matchId: $matchId) {
            participant {
                id
                status
            }
            waitlistPosition
            match {
                currentPlayers
                status
            }
        }
    }
"#;

const ROSTER_QUERY: &str = r#"
    query MatchRoster($matchId: ID!) {
        matchRoster(matchId: $matchId) {
            players {
                participant {
                    userId
                    status
                }
                needsConfirmation
            }
            waitlist {
                participant {
                    userId
                }
                position
            }
        }
    }
"#;

#[tokio::test]
async fn test_join_fills_seats_then_waitlists() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, _) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 2, Duration::days(3)).await;
    let variables = || Variables::from_json(json!({ "matchId": match_id.to_string() }));

    let (_, first) = create_test_player(&app_state, "first").await;
    let response = execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(first)).await;
    assert!(
        response.errors.is_empty(),
        "First join should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["joinMatch"]["participant"]["status"], "PENDING");
    assert_eq!(data["joinMatch"]["waitlistPosition"], json!(null));
    assert_eq!(data["joinMatch"]["match"]["currentPlayers"], 1);
    assert_eq!(data["joinMatch"]["match"]["status"], "OPEN");

    let (_, second) = create_test_player(&app_state, "second").await;
    let response = execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(second)).await;
    assert!(
        response.errors.is_empty(),
        "Second join should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["joinMatch"]["match"]["currentPlayers"], 2);
    assert_eq!(data["joinMatch"]["match"]["status"], "FULL");

    // Capacity reached; the third join queues up instead.
    let (_, third) = create_test_player(&app_state, "third").await;
    let response = execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(third)).await;
    assert!(
        response.errors.is_empty(),
        "Waitlist join should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["joinMatch"]["participant"]["status"], "WAITLIST");
    assert_eq!(data["joinMatch"]["waitlistPosition"], 1);
    assert_eq!(data["joinMatch"]["match"], json!(null));
}

#[tokio::test]
async fn test_duplicate_join_is_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, _) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 10, Duration::days(3)).await;
    let variables = Variables::from_json(json!({ "matchId": match_id.to_string() }));

    let (_, claims) = create_test_player(&app_state, "eager").await;
    let response =
        execute_graphql(&schema, JOIN_MUTATION, Some(variables.clone()), Some(claims.clone()))
            .await;
    assert!(
        response.errors.is_empty(),
        "First join should succeed: {:?}",
        response.errors
    );

    let response = execute_graphql(&schema, JOIN_MUTATION, Some(variables), Some(claims)).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Already joined this match");
}

#[tokio::test]
async fn test_leave_promotes_earliest_waitlisted() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, _) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 2, Duration::days(3)).await;
    let variables = || Variables::from_json(json!({ "matchId": match_id.to_string() }));

    let (_, alice) = create_test_player(&app_state, "alice").await;
    let (bruna_id, bruna) = create_test_player(&app_state, "bruna").await;
    let (carlos_id, carlos) = create_test_player(&app_state, "carlos").await;
    let (diego_id, diego) = create_test_player(&app_state, "diego").await;

    for claims in [alice.clone(), bruna, carlos, diego.clone()] {
        let response =
            execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(claims)).await;
        assert!(
            response.errors.is_empty(),
            "Join should succeed: {:?}",
            response.errors
        );
    }

    let leave = r#"
        mutation LeaveMatch($matchId: ID!) {
            leaveMatch(matchId: $matchId) {
                currentPlayers
                status
            }
        }
    "#;
    let response = execute_graphql(&schema, leave, Some(variables()), Some(alice)).await;
    assert!(
        response.errors.is_empty(),
        "Leave should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    // The freed seat went straight to the head of the waitlist.
    assert_eq!(data["leaveMatch"]["currentPlayers"], 2);
    assert_eq!(data["leaveMatch"]["status"], "FULL");

    let response = execute_graphql(&schema, ROSTER_QUERY, Some(variables()), None).await;
    assert!(
        response.errors.is_empty(),
        "Roster query should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    let players = data["matchRoster"]["players"].as_array().unwrap();
    let waitlist = data["matchRoster"]["waitlist"].as_array().unwrap();

    let seated: Vec<&str> = players
        .iter()
        .map(|p| p["participant"]["userId"].as_str().unwrap())
        .collect();
    assert!(seated.contains(&bruna_id.to_string().as_str()));
    assert!(seated.contains(&carlos_id.to_string().as_str()));

    let promoted = players
        .iter()
        .find(|p| p["participant"]["userId"] == carlos_id.to_string())
        .unwrap();
    // Promotion hands over the seat but still owes a confirmation.
    assert_eq!(promoted["participant"]["status"], "PENDING");

    assert_eq!(waitlist.len(), 1);
    assert_eq!(waitlist[0]["participant"]["userId"], diego_id.to_string());
    assert_eq!(waitlist[0]["position"], 1);

    // Leaving from the waitlist frees no seat and promotes nobody.
    let response = execute_graphql(&schema, leave, Some(variables()), Some(diego)).await;
    assert!(
        response.errors.is_empty(),
        "Waitlist leave should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["leaveMatch"]["currentPlayers"], 2);
    assert_eq!(data["leaveMatch"]["status"], "FULL");

    let response = execute_graphql(&schema, ROSTER_QUERY, Some(variables()), None).await;
    let data = response.data.into_json().unwrap();
    assert_eq!(data["matchRoster"]["players"].as_array().unwrap().len(), 2);
    assert!(data["matchRoster"]["waitlist"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_confirm_presence_is_idempotent() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, _) = create_test_player(&app_state, "organizer").await;
    // Kick-off within 48 hours, so confirmations are open.
    let match_id = create_test_match(&app_state, organizer_id, 10, Duration::hours(24)).await;
    let variables = || Variables::from_json(json!({ "matchId": match_id.to_string() }));

    let (_, claims) = create_test_player(&app_state, "punctual").await;
    let response =
        execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(claims.clone())).await;
    assert!(
        response.errors.is_empty(),
        "Join should succeed: {:?}",
        response.errors
    );

    let response = execute_graphql(&schema, ROSTER_QUERY, Some(variables()), None).await;
    let data = response.data.into_json().unwrap();
    assert_eq!(
        data["matchRoster"]["players"][0]["needsConfirmation"], true,
        "Pending seat inside the window should need confirmation"
    );

    let confirm = r#"
        mutation ConfirmPresence($matchId: ID!) {
            confirmPresence(matchId: $matchId) {
                status
                confirmedAt
            }
        }
    "#;
    let response =
        execute_graphql(&schema, confirm, Some(variables()), Some(claims.clone())).await;
    assert!(
        response.errors.is_empty(),
        "Confirm should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["confirmPresence"]["status"], "CONFIRMED");
    let first_confirmed_at = data["confirmPresence"]["confirmedAt"].clone();
    assert!(first_confirmed_at.is_string());

    // A repeat confirm succeeds and keeps the original timestamp.
    let response = execute_graphql(&schema, confirm, Some(variables()), Some(claims)).await;
    assert!(
        response.errors.is_empty(),
        "Repeat confirm should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["confirmPresence"]["confirmedAt"], first_confirmed_at);

    let response = execute_graphql(&schema, ROSTER_QUERY, Some(variables()), None).await;
    let data = response.data.into_json().unwrap();
    assert_eq!(data["matchRoster"]["players"][0]["needsConfirmation"], false);
}

#[tokio::test]
async fn test_waitlisted_player_cannot_confirm() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, _) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 2, Duration::hours(24)).await;
    let variables = || Variables::from_json(json!({ "matchId": match_id.to_string() }));

    for prefix in ["seated-one", "seated-two"] {
        let (_, claims) = create_test_player(&app_state, prefix).await;
        let response =
            execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(claims)).await;
        assert!(response.errors.is_empty());
    }

    let (_, queued) = create_test_player(&app_state, "queued").await;
    let response =
        execute_graphql(&schema, JOIN_MUTATION, Some(variables()), Some(queued.clone())).await;
    assert!(response.errors.is_empty());

    let confirm = r#"
        mutation ConfirmPresence($matchId: ID!) {
            confirmPresence(matchId: $matchId) {
                status
            }
        }
    "#;
    let response = execute_graphql(&schema, confirm, Some(variables()), Some(queued)).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Cannot confirm from the waitlist");
}

#[tokio::test]
async fn test_decline_requires_organizer() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, organizer) = create_test_player(&app_state, "organizer").await;
    let match_id = create_test_match(&app_state, organizer_id, 10, Duration::days(3)).await;

    let (joined_id, joined) = create_test_player(&app_state, "joined").await;
    let response = execute_graphql(
        &schema,
        JOIN_MUTATION,
        Some(Variables::from_json(json!({ "matchId": match_id.to_string() }))),
        Some(joined),
    )
    .await;
    assert!(response.errors.is_empty());
    let data = response.data.into_json().unwrap();
    let participant_id = data["joinMatch"]["participant"]["id"].as_str().unwrap().to_string();

    let decline = r#"
        mutation DeclineParticipant($participantId: ID!) {
            declineParticipant(participantId: $participantId) {
                currentPlayers
            }
        }
    "#;
    let variables = || Variables::from_json(json!({ "participantId": participant_id }));

    let (_, stranger) = create_test_player(&app_state, "stranger").await;
    let response = execute_graphql(&schema, decline, Some(variables()), Some(stranger)).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Only the organizer can do this");

    let response = execute_graphql(&schema, decline, Some(variables()), Some(organizer)).await;
    assert!(
        response.errors.is_empty(),
        "Organizer decline should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["declineParticipant"]["currentPlayers"], 0);

    let response = execute_graphql(
        &schema,
        ROSTER_QUERY,
        Some(Variables::from_json(json!({ "matchId": match_id.to_string() }))),
        None,
    )
    .await;
    let data = response.data.into_json().unwrap();
    let players = data["matchRoster"]["players"].as_array().unwrap();
    assert!(!players
        .iter()
        .any(|p| p["participant"]["userId"] == joined_id.to_string()));
}

#[tokio::test]
async fn test_cancelled_and_started_matches_reject_joins() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (organizer_id, organizer) = create_test_player(&app_state, "organizer").await;

    let cancelled_id = create_test_match(&app_state, organizer_id, 10, Duration::days(3)).await;
    let cancel = r#"
        mutation CancelMatch($id: ID!) {
            cancelMatch(id: $id) {
                status
            }
        }
    "#;
    let response = execute_graphql(
        &schema,
        cancel,
        Some(Variables::from_json(json!({ "id": cancelled_id.to_string() }))),
        Some(organizer),
    )
    .await;
    assert!(
        response.errors.is_empty(),
        "Cancel should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["cancelMatch"]["status"], "CANCELLED");

    let (_, late) = create_test_player(&app_state, "late").await;
    let response = execute_graphql(
        &schema,
        JOIN_MUTATION,
        Some(Variables::from_json(json!({ "matchId": cancelled_id.to_string() }))),
        Some(late.clone()),
    )
    .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Match is cancelled");

    let started_id = create_test_match(&app_state, organizer_id, 10, Duration::days(3)).await;
    rewind_match(&app_state, started_id, 1).await;
    let response = execute_graphql(
        &schema,
        JOIN_MUTATION,
        Some(Variables::from_json(json!({ "matchId": started_id.to_string() }))),
        Some(late),
    )
    .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Match already started");
}
