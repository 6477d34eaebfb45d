//! One-time code lifetime: issue, verify, expire, sweep.

#![allow(clippy::unwrap_used)]

use chrono::TimeDelta;

use gachadex_core::{OneTimeCode, UserId};
use gachadex_integration_tests::{SINGLE_COMMON_CATALOG, TestContext};

fn code(digits: &str) -> OneTimeCode {
    OneTimeCode::parse(digits).unwrap()
}

/// Register a user. The code emailed at registration is replaced by the
/// first `issue` in each scenario.
async fn user(ctx: &TestContext, name: &str) -> UserId {
    ctx.auth()
        .register(&format!("{name}@kanto.example"), name, "badges8x")
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_verified_just_before_expiry_then_spent() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let user_id = user(&ctx, "erika").await;

    ctx.codes().issue(user_id, &code("482913")).await.unwrap();

    ctx.clock.advance(TimeDelta::seconds(4 * 60 + 59));
    assert!(ctx.codes().verify(user_id, &code("482913")).await.unwrap());
    assert!(!ctx.codes().verify(user_id, &code("482913")).await.unwrap());
}

#[tokio::test]
async fn test_verified_just_after_expiry() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let user_id = user(&ctx, "sabrina").await;

    ctx.codes().issue(user_id, &code("482913")).await.unwrap();

    ctx.clock.advance(TimeDelta::seconds(5 * 60 + 1));
    assert!(!ctx.codes().verify(user_id, &code("482913")).await.unwrap());
}

#[tokio::test]
async fn test_wrong_guesses_do_not_burn_the_code() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let user_id = user(&ctx, "koga").await;

    ctx.codes().issue(user_id, &code("100200")).await.unwrap();

    for guess in ["100201", "999999", "000000"] {
        assert!(!ctx.codes().verify(user_id, &code(guess)).await.unwrap());
    }
    assert!(ctx.codes().verify(user_id, &code("100200")).await.unwrap());
}

#[tokio::test]
async fn test_sweep_removes_only_expired_codes() {
    let ctx = TestContext::with_catalog(SINGLE_COMMON_CATALOG);
    let old = user(&ctx, "blaine").await;
    let fresh = user(&ctx, "giovanni").await;

    ctx.codes().issue(old, &code("111111")).await.unwrap();
    ctx.clock.advance(TimeDelta::minutes(4));
    ctx.codes().issue(fresh, &code("222222")).await.unwrap();
    ctx.clock.advance(TimeDelta::minutes(2));

    assert_eq!(ctx.codes().cleanup_expired().await.unwrap(), 1);
    assert_eq!(ctx.codes().cleanup_expired().await.unwrap(), 0);

    assert_eq!(ctx.store.unused_code_count(old), 0);
    assert!(ctx.codes().verify(fresh, &code("222222")).await.unwrap());
}
