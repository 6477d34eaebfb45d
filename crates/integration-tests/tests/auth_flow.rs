//! Registration, password login, and the emailed second factor.

#![allow(clippy::unwrap_used)]

use chrono::TimeDelta;

use gachadex_core::UserId;
use gachadex_integration_tests::{SINGLE_COMMON_CATALOG, STARTING_CREDITS, TestContext};
use gachadex_server::services::auth::{AuthError, LoginOutcome};

const EMAIL: &str = "ash@pallet.example";
const USERNAME: &str = "ash_ketchum";
const PASSWORD: &str = "pikachu25!";

async fn registered(ctx: &TestContext) -> UserId {
    ctx.auth()
        .register(EMAIL, USERNAME, PASSWORD)
        .await
        .unwrap()
        .id
}

fn expect_code_request(outcome: LoginOutcome) -> UserId {
    match outcome {
        LoginOutcome::TwoFactorRequired { user_id } => user_id,
        LoginOutcome::Authenticated(user) => panic!("expected a code request, got {user:?}"),
    }
}

#[tokio::test]
async fn test_register_emails_a_login_code() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);

    let user = ctx.auth().register(EMAIL, USERNAME, PASSWORD).await.unwrap();

    assert_eq!(user.credits.get(), STARTING_CREDITS);
    assert!(user.two_factor_enabled);
    assert_eq!(ctx.mailer.sent().len(), 1);
    assert_eq!(ctx.store.unused_code_count(user.id), 1);

    let code = ctx.mailer.last_code_for(EMAIL).unwrap();
    let verified = ctx
        .auth()
        .verify_two_factor(user.id, code.as_str())
        .await
        .unwrap();
    assert_eq!(verified.id, user.id);
}

#[tokio::test]
async fn test_duplicate_accounts_are_rejected() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    registered(&ctx).await;

    let err = ctx
        .auth()
        .register("misty@cerulean.example", USERNAME, PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists(ref field) if field == "username"));

    let err = ctx
        .auth()
        .register(EMAIL, "misty", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists(ref field) if field == "email"));
}

#[tokio::test]
async fn test_register_validates_input_before_storing() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);

    let err = ctx.auth().register("not-an-email", USERNAME, PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail(_)));

    let err = ctx.auth().register(EMAIL, "ab", PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidUsername(_)));

    let err = ctx.auth().register(EMAIL, USERNAME, "short1").await.unwrap_err();
    assert!(matches!(err, AuthError::WeakPassword(_)));

    assert!(ctx.mailer.sent().is_empty());
    assert_eq!(ctx.store.code_count(), 0);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    registered(&ctx).await;

    let wrong_password = ctx.auth().login(USERNAME, "charmander4").await.unwrap_err();
    let unknown_user = ctx.auth().login("gary_oak", PASSWORD).await.unwrap_err();
    let malformed_user = ctx.auth().login("no spaces allowed", PASSWORD).await.unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert!(matches!(malformed_user, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_login_code_is_single_use() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    registered(&ctx).await;

    let user_id = expect_code_request(ctx.auth().login(USERNAME, PASSWORD).await.unwrap());
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();

    ctx.clock.advance(TimeDelta::seconds(4 * 60 + 59));
    ctx.auth()
        .verify_two_factor(user_id, code.as_str())
        .await
        .unwrap();

    let err = ctx
        .auth()
        .verify_two_factor(user_id, code.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCode));
}

#[tokio::test]
async fn test_login_code_expires_after_five_minutes() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    registered(&ctx).await;

    let user_id = expect_code_request(ctx.auth().login(USERNAME, PASSWORD).await.unwrap());
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();

    ctx.clock.advance(TimeDelta::seconds(5 * 60 + 1));
    let err = ctx
        .auth()
        .verify_two_factor(user_id, code.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCode));
}

#[tokio::test]
async fn test_new_login_supersedes_previous_code() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    registered(&ctx).await;

    let user_id = expect_code_request(ctx.auth().login(USERNAME, PASSWORD).await.unwrap());
    let first = ctx.mailer.last_code_for(EMAIL).unwrap();
    expect_code_request(ctx.auth().login(USERNAME, PASSWORD).await.unwrap());
    let second = ctx.mailer.last_code_for(EMAIL).unwrap();

    assert_eq!(ctx.store.unused_code_count(user_id), 1);

    // Both codes may be equal by chance; only then does the first still work.
    if first != second {
        let err = ctx
            .auth()
            .verify_two_factor(user_id, first.as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));
    }
    ctx.auth()
        .verify_two_factor(user_id, second.as_str())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_malformed_code_leaves_pending_code_alone() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let user_id = registered(&ctx).await;
    let code = ctx.mailer.last_code_for(EMAIL).unwrap();

    for bad in ["", "12345", "1234567", "12a456"] {
        let err = ctx.auth().verify_two_factor(user_id, bad).await.unwrap_err();
        assert!(matches!(err, AuthError::MalformedCode(_)), "{bad:?}");
    }
    assert_eq!(ctx.store.unused_code_count(user_id), 1);

    ctx.auth()
        .verify_two_factor(user_id, code.as_str())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_code_is_bound_to_its_user() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let ash = registered(&ctx).await;
    let misty = ctx
        .auth()
        .register("misty@cerulean.example", "misty", "starmie120")
        .await
        .unwrap()
        .id;

    let ash_code = ctx.mailer.last_code_for(EMAIL).unwrap();
    let misty_code = ctx.mailer.last_code_for("misty@cerulean.example").unwrap();

    if ash_code != misty_code {
        let err = ctx
            .auth()
            .verify_two_factor(misty, ash_code.as_str())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCode));
    }
    ctx.auth()
        .verify_two_factor(ash, ash_code.as_str())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_disabling_two_factor_skips_the_code() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let user_id = registered(&ctx).await;
    let sent_before = ctx.mailer.sent().len();

    let user = ctx.auth().set_two_factor(user_id, false).await.unwrap();
    assert!(!user.two_factor_enabled);

    match ctx.auth().login(USERNAME, PASSWORD).await.unwrap() {
        LoginOutcome::Authenticated(user) => assert_eq!(user.id, user_id),
        LoginOutcome::TwoFactorRequired { .. } => panic!("two-factor was disabled"),
    }
    assert_eq!(ctx.mailer.sent().len(), sent_before);
}

#[tokio::test]
async fn test_delivery_failure_is_reported() {
    let ctx = TestContext::with_failing_mailer(SINGLE_COMMON_CATALOG);

    let err = ctx
        .auth()
        .register(EMAIL, USERNAME, PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Delivery(_)));
}

#[tokio::test]
async fn test_unknown_user_cannot_toggle_two_factor() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);

    let err = ctx
        .auth()
        .set_two_factor(UserId::new(404), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
}
