#![cfg(feature = "integration_tests")]

mod common;

use api::gql::build_schema;
use async_graphql::Variables;
use common::*;
use serde_json::json;
use uuid::Uuid;

const SIGN_UP_MUTATION: &str = r#"
    mutation SignUp($input: SignUpInput!) {
        signUp(input: $input) {
            token
            profile {
                id
                email
                name
            }
        }
    }
"#;

const SIGN_IN_MUTATION: &str = r#"
    mutation SignIn($input: SignInInput!) {
        signIn(input: $input) {
            token
            profile {
                email
            }
        }
    }
"#;

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.com", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
async fn test_sign_up_then_sign_in_roundtrip() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let email = unique_email("roundtrip");
    let variables = Variables::from_json(json!({
        "input": {
            "email": email,
            "password": "boladegude7",
            "name": "Marta Silva"
        }
    }));
    let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables), None).await;
    assert!(
        response.errors.is_empty(),
        "Sign up should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    let token = data["signUp"]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(data["signUp"]["profile"]["email"], email);
    assert_eq!(data["signUp"]["profile"]["name"], "Marta Silva");

    let claims = app_state
        .jwt_service()
        .verify_token(token)
        .expect("Issued token should verify");
    assert_eq!(claims.email, email);

    let variables = Variables::from_json(json!({
        "input": {
            "email": email,
            "password": "boladegude7"
        }
    }));
    let response = execute_graphql(&schema, SIGN_IN_MUTATION, Some(variables), None).await;
    assert!(
        response.errors.is_empty(),
        "Sign in should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert!(!data["signIn"]["token"].as_str().unwrap().is_empty());
    assert_eq!(data["signIn"]["profile"]["email"], email);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let email = unique_email("dup");
    let variables = || {
        Variables::from_json(json!({
            "input": {
                "email": email,
                "password": "boladegude7",
                "name": "Primeira Conta"
            }
        }))
    };

    let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables()), None).await;
    assert!(response.errors.is_empty());

    let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables()), None).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Email already registered");
}

#[tokio::test]
async fn test_weak_passwords_are_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let cases = [
        ("curta1", "Password must be at least 8 characters long"),
        ("somenteletras", "Password must contain at least one letter and one number"),
    ];
    for (password, message) in cases {
        let variables = Variables::from_json(json!({
            "input": {
                "email": unique_email("weak"),
                "password": password,
                "name": "Senha Fraca"
            }
        }));
        let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables), None).await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, message);
    }
}

#[tokio::test]
async fn test_wrong_credentials_are_rejected() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let email = unique_email("victim");
    let variables = Variables::from_json(json!({
        "input": {
            "email": email,
            "password": "boladegude7",
            "name": "Conta Alvo"
        }
    }));
    let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables), None).await;
    assert!(response.errors.is_empty());

    // Wrong password and unknown email come back with the same message.
    let attempts = [
        json!({ "input": { "email": email, "password": "chutecerto9" } }),
        json!({ "input": { "email": unique_email("nobody"), "password": "boladegude7" } }),
    ];
    for attempt in attempts {
        let response =
            execute_graphql(&schema, SIGN_IN_MUTATION, Some(Variables::from_json(attempt)), None)
                .await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "Invalid credentials");
    }
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let query = r#"
        query Me {
            me {
                email
            }
        }
    "#;
    let response = execute_graphql(&schema, query, None, None).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Authentication required");
}

#[tokio::test]
async fn test_update_profile_changes_own_fields() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let (_, claims) = create_test_player(&app_state, "editor").await;
    let mutation = r#"
        mutation UpdateProfile($input: UpdateProfileInput!) {
            updateProfile(input: $input) {
                name
                city
                bio
            }
        }
    "#;
    let variables = Variables::from_json(json!({
        "input": {
            "name": "Zagueira Nova",
            "city": "Recife",
            "bio": "Jogo às quintas"
        }
    }));
    let response = execute_graphql(&schema, mutation, Some(variables), Some(claims)).await;
    assert!(
        response.errors.is_empty(),
        "Profile update should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["updateProfile"]["name"], "Zagueira Nova");
    assert_eq!(data["updateProfile"]["city"], "Recife");
    assert_eq!(data["updateProfile"]["bio"], "Jogo às quintas");
}

#[tokio::test]
async fn test_password_reset_roundtrip() {
    let app_state = setup_test_db().await;
    let schema = build_schema(app_state.clone());

    let email = unique_email("reset");
    let variables = Variables::from_json(json!({
        "input": {
            "email": email,
            "password": "senhaantiga1",
            "name": "Esquecida"
        }
    }));
    let response = execute_graphql(&schema, SIGN_UP_MUTATION, Some(variables), None).await;
    assert!(response.errors.is_empty());
    let data = response.data.into_json().unwrap();
    let user_id: Uuid = data["signUp"]["profile"]["id"].as_str().unwrap().parse().unwrap();

    // Requesting a reset never reveals whether the email exists.
    let request = r#"
        mutation RequestReset($email: String!) {
            requestPasswordReset(email: $email)
        }
    "#;
    for candidate in [email.clone(), unique_email("ghost")] {
        let response = execute_graphql(
            &schema,
            request,
            Some(Variables::from_json(json!({ "email": candidate }))),
            None,
        )
        .await;
        assert!(response.errors.is_empty());
        let data = response.data.into_json().unwrap();
        assert_eq!(data["requestPasswordReset"], true);
    }

    let token = app_state.password_resets().issue(user_id).await;
    let reset = r#"
        mutation ResetPassword($token: String!, $newPassword: String!) {
            resetPassword(token: $token, newPassword: $newPassword)
        }
    "#;
    let response = execute_graphql(
        &schema,
        reset,
        Some(Variables::from_json(json!({ "token": token, "newPassword": "senhanova22" }))),
        None,
    )
    .await;
    assert!(
        response.errors.is_empty(),
        "Reset should succeed: {:?}",
        response.errors
    );
    let data = response.data.into_json().unwrap();
    assert_eq!(data["resetPassword"], true);

    // The token is single-use.
    let response = execute_graphql(
        &schema,
        reset,
        Some(Variables::from_json(json!({ "token": token, "newPassword": "outrasenha33" }))),
        None,
    )
    .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Invalid or expired reset token");

    let old = json!({ "input": { "email": email, "password": "senhaantiga1" } });
    let response =
        execute_graphql(&schema, SIGN_IN_MUTATION, Some(Variables::from_json(old)), None).await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "Invalid credentials");

    let new = json!({ "input": { "email": email, "password": "senhanova22" } });
    let response =
        execute_graphql(&schema, SIGN_IN_MUTATION, Some(Variables::from_json(new)), None).await;
    assert!(
        response.errors.is_empty(),
        "Sign in with the new password should succeed: {:?}",
        response.errors
    );
}
