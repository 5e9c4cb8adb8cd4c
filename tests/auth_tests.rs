//! Credential service integration tests: signup, login, token lifecycle, and
//! request-context resolution across positive and negative paths.

use anyhow::Result;
use tempfile::tempdir;

use quillboard::error::AppError;
use quillboard::identity::{
    LoginRequest, RequestContext, SessionManager, SignupRequest, current_user, login, signup,
};
use quillboard::storage::SharedStore;

fn sessions() -> SessionManager {
    SessionManager::new("integration-test-secret-0123456789").expect("session manager")
}

fn signup_req(username: &str, email: &str, password: &str) -> SignupRequest {
    SignupRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn login_req(email: &str, password: &str) -> LoginRequest {
    LoginRequest { email: email.to_string(), password: password.to_string() }
}

#[tokio::test]
async fn signup_then_login_returns_same_identity() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = sessions();

    let created = signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
        .await
        .expect("signup");
    assert!(!created.token.is_empty());
    assert_eq!(created.user.username, "alice");
    assert_eq!(created.user.email, "alice@x.com");

    let logged = login(&store, &sm, &login_req("alice@x.com", "p@ss1"))
        .await
        .expect("login");
    assert_eq!(logged.user.id, created.user.id);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_do_not_reveal_which_factor_failed() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = sessions();

    signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
        .await
        .expect("signup");

    let wrong_password = login(&store, &sm, &login_req("alice@x.com", "nope"))
        .await
        .expect_err("wrong password must fail");
    let unknown_email = login(&store, &sm, &login_req("nobody@x.com", "p@ss1"))
        .await
        .expect_err("unknown email must fail");

    assert!(matches!(wrong_password, AppError::Auth { .. }));
    assert!(matches!(unknown_email, AppError::Auth { .. }));
    // Identical code and message for both failure modes.
    assert_eq!(wrong_password.code_str(), "invalid_credentials");
    assert_eq!(wrong_password.code_str(), unknown_email.code_str());
    assert_eq!(wrong_password.message(), unknown_email.message());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_or_username_is_rejected() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = sessions();

    signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
        .await
        .expect("first signup");

    let dup_email = signup(&store, &sm, &signup_req("alice2", "alice@x.com", "p@ss2"))
        .await
        .expect_err("duplicate email must fail");
    assert!(matches!(dup_email, AppError::Conflict { .. }));
    assert_eq!(dup_email.code_str(), "duplicate_identity");

    let dup_username = signup(&store, &sm, &signup_req("alice", "other@x.com", "p@ss2"))
        .await
        .expect_err("duplicate username must fail");
    assert!(matches!(dup_username, AppError::Conflict { .. }));
    Ok(())
}

#[tokio::test]
async fn signup_token_resolves_to_the_new_identity() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = sessions();

    let created = signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
        .await
        .expect("signup");

    let header = format!("Bearer {}", created.token);
    let ctx = RequestContext::resolve(&sm, Some(&header), None);
    assert!(!ctx.is_anonymous());

    let me = current_user(&store, &ctx).expect("current user");
    assert_eq!(me, created.user);
    Ok(())
}

#[tokio::test]
async fn token_for_a_missing_user_is_unauthenticated() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = sessions();

    // Valid signature, but the subject was never registered.
    let token = sm.issue("ghost-user")?;
    let header = format!("Bearer {token}");
    let ctx = RequestContext::resolve(&sm, Some(&header), None);
    assert!(!ctx.is_anonymous());

    let err = current_user(&store, &ctx).expect_err("missing subject must fail");
    assert!(matches!(err, AppError::Auth { .. }));
    Ok(())
}

#[tokio::test]
async fn expired_token_resolves_anonymous() -> Result<()> {
    let tmp = tempdir()?;
    let store = SharedStore::new(tmp.path())?;
    let sm = SessionManager::with_ttl("integration-test-secret-0123456789", -60)
        .expect("session manager");

    let created = signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
        .await
        .expect("signup");

    let header = format!("Bearer {}", created.token);
    let ctx = RequestContext::resolve(&sm, Some(&header), None);
    assert!(ctx.is_anonymous());
    Ok(())
}

#[tokio::test]
async fn token_minted_under_a_different_secret_is_anonymous() -> Result<()> {
    let sm_a = sessions();
    let sm_b = SessionManager::new("a-completely-different-secret").expect("session manager");

    let token = sm_a.issue("user-1")?;
    let header = format!("Bearer {token}");
    let ctx = RequestContext::resolve(&sm_b, Some(&header), None);
    assert!(ctx.is_anonymous());
    Ok(())
}

#[tokio::test]
async fn credentials_survive_a_store_restart() -> Result<()> {
    let tmp = tempdir()?;
    let sm = sessions();
    let user_id = {
        let store = SharedStore::new(tmp.path())?;
        signup(&store, &sm, &signup_req("alice", "alice@x.com", "p@ss1"))
            .await
            .expect("signup")
            .user
            .id
    };

    let reopened = SharedStore::new(tmp.path())?;
    let logged = login(&reopened, &sm, &login_req("alice@x.com", "p@ss1"))
        .await
        .expect("login after restart");
    assert_eq!(logged.user.id, user_id);
    Ok(())
}
