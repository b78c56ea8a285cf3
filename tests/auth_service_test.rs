mod common;

use estoque_api::auth::AuthService;
use estoque_api::errors::ServiceError;

#[tokio::test]
async fn register_login_logout_round_trip() {
    let db = common::setup_db().await;
    let auth = AuthService::new(db.clone(), 3600);

    let user = auth.register("ana", "segredo").await.unwrap();
    assert_eq!(user.username, "ana");
    assert_ne!(user.password_hash, "segredo");
    assert!(user.password_hash.starts_with("$argon2"));

    let session = auth.login("ana", "segredo").await.unwrap();
    let identity = auth.resolve_session(&session.token).unwrap();
    assert_eq!(identity.user_id, user.id);
    assert_eq!(identity.username, "ana");

    auth.logout(&session.token);
    assert!(auth.resolve_session(&session.token).is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected_exact_match() {
    let db = common::setup_db().await;
    let auth = AuthService::new(db.clone(), 3600);

    auth.register("ana", "segredo").await.unwrap();

    let err = auth.register("ana", "outra").await.expect_err("duplicate");
    assert!(matches!(err, ServiceError::DuplicateUsername(_)));

    // Comparison is case-sensitive: a differently-cased name is a new user.
    auth.register("Ana", "segredo").await.unwrap();
}

#[tokio::test]
async fn bad_credentials_share_one_error() {
    let db = common::setup_db().await;
    let auth = AuthService::new(db.clone(), 3600);

    auth.register("ana", "segredo").await.unwrap();

    let wrong_password = auth.login("ana", "errada").await.expect_err("wrong pw");
    let unknown_user = auth.login("bruno", "segredo").await.expect_err("no user");

    assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
    assert!(matches!(unknown_user, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn blank_registration_fields_are_rejected() {
    let db = common::setup_db().await;
    let auth = AuthService::new(db.clone(), 3600);

    assert!(matches!(
        auth.register("  ", "segredo").await,
        Err(ServiceError::ValidationError(_))
    ));
    assert!(matches!(
        auth.register("ana", "").await,
        Err(ServiceError::ValidationError(_))
    ));
}

#[tokio::test]
async fn unknown_tokens_do_not_resolve() {
    let db = common::setup_db().await;
    let auth = AuthService::new(db.clone(), 3600);

    assert!(auth.resolve_session("nao-existe").is_none());
    // Logging out an unknown token is a no-op.
    auth.logout("nao-existe");
    assert!(auth.resolve_session("nao-existe").is_none());
}
