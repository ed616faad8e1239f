// Regras de token contra um Postgres real. Rodar com
// `TEST_DATABASE_URL=... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use reservas_backend::{
    common::{error::AppError, tokens::hash_token},
    config::{AppState, Config},
    db::TokenRepository,
    models::{
        auth::AcceptTokenPayload,
        tokens::{TokenKind, TokenSubject},
    },
};

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL deve ser definida");
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

/// Restaurante + usuário pendente + membro, com nomes únicos por execução.
async fn seed_subject(pool: &PgPool) -> (TokenSubject, String) {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let email = format!("ana-{suffix}@example.com");

    let restaurant_id: i32 =
        sqlx::query_scalar("INSERT INTO restaurants (name, slug) VALUES ('Prueba', $1) RETURNING id")
            .bind(format!("prueba-{suffix}"))
            .fetch_one(pool)
            .await
            .unwrap();
    let user_id: i32 = sqlx::query_scalar("INSERT INTO bo_users (email, name) VALUES ($1, 'Ana') RETURNING id")
        .bind(&email)
        .fetch_one(pool)
        .await
        .unwrap();
    let member_id: i32 = sqlx::query_scalar(
        "INSERT INTO members (restaurant_id, first_name, email) VALUES ($1, 'Ana', $2) RETURNING id",
    )
    .bind(restaurant_id)
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap();

    (TokenSubject { restaurant_id, member_id, bo_user_id: user_id }, suffix)
}

async fn live_tokens(pool: &PgPool, subject: TokenSubject) -> i64 {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM bo_auth_tokens
        WHERE restaurant_id = $1 AND member_id = $2 AND bo_user_id = $3
          AND used_at IS NULL AND invalidated_at IS NULL AND expires_at > NOW()
        "#,
    )
    .bind(subject.restaurant_id)
    .bind(subject.member_id)
    .bind(subject.bo_user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requer Postgres em TEST_DATABASE_URL"]
async fn a_token_is_redeemed_exactly_once() {
    let pool = test_pool().await;
    let (subject, suffix) = seed_subject(&pool).await;

    let token = format!("tok-{suffix}");
    TokenRepository::new()
        .insert(&pool, subject, TokenKind::Invite, &hash_token(&token), Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let state = AppState::from_pool(Config::default(), pool.clone());
    let payload = AcceptTokenPayload { token: token.clone(), password: "contraseña-larga".into() };

    let (first, second) = tokio::join!(
        state.token_service.redeem(&payload),
        state.token_service.redeem(&payload)
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::InvalidOrExpiredToken))));

    // O membro ficou vinculado ao usuário
    let linked: Option<i32> = sqlx::query_scalar("SELECT bo_user_id FROM members WHERE id = $1")
        .bind(subject.member_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(linked, Some(subject.bo_user_id));
}

#[tokio::test]
#[ignore = "requer Postgres em TEST_DATABASE_URL"]
async fn a_new_token_of_another_kind_replaces_the_live_one() {
    let pool = test_pool().await;
    let (subject, suffix) = seed_subject(&pool).await;
    let repo = TokenRepository::new();
    let expires_at = Utc::now() + Duration::hours(1);

    let invite = format!("invite-{suffix}");
    repo.insert(&pool, subject, TokenKind::Invite, &hash_token(&invite), expires_at)
        .await
        .unwrap();

    // Mesmo fluxo do serviço: invalida e emite na mesma transação
    let reset = format!("reset-{suffix}");
    let mut tx = pool.begin().await.unwrap();
    assert_eq!(repo.invalidate_outstanding(&mut *tx, subject).await.unwrap(), 1);
    repo.insert(&mut *tx, subject, TokenKind::PasswordReset, &hash_token(&reset), expires_at)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(live_tokens(&pool, subject).await, 1);
    assert!(repo.redeem(&pool, &hash_token(&invite)).await.unwrap().is_none());

    let redeemed = repo.redeem(&pool, &hash_token(&reset)).await.unwrap().unwrap();
    assert_eq!(redeemed.kind, TokenKind::PasswordReset.as_str());
    assert_eq!(live_tokens(&pool, subject).await, 0);
}
