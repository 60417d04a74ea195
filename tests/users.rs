mod common;

use chrono::Duration;
use foodgram_sdk::{
    actions::{fetch_users, get_user_view, login_user, register_user, set_password},
    error::FoodgramError,
    import::{import_ingredients, import_tags, read_ingredients, read_tags},
    jwt::{SessionData, TokenIssuer},
    pagination::Pagination,
    schema::{Credentials, NewUser, PasswordChange},
};
use sqlx::PgPool;

use common::{count, user};

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_owned(),
        password: password.to_owned(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn duplicate_email_conflicts(pool: PgPool) {
    user(&pool, "cook").await;

    let result = register_user(
        &NewUser {
            email: "cook@example.com".to_owned(),
            username: "another".to_owned(),
            first_name: "Another".to_owned(),
            last_name: "Cook".to_owned(),
            password: "pass".to_owned(),
        },
        &pool,
    )
    .await;

    assert!(matches!(result, Err(FoodgramError::Conflict(_))));
    assert_eq!(count(&pool, "users").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn email_case_variants_are_one_account(pool: PgPool) {
    let id = user(&pool, "cook").await;
    let issuer = TokenIssuer::new(b"integration-secret", Duration::hours(1)).unwrap();

    let result = register_user(
        &NewUser {
            email: "Cook@Example.com".to_owned(),
            username: "shouting".to_owned(),
            first_name: "Shouting".to_owned(),
            last_name: "Cook".to_owned(),
            password: "other pass".to_owned(),
        },
        &pool,
    )
    .await;
    assert!(matches!(result, Err(FoodgramError::Conflict(_))));
    assert_eq!(count(&pool, "users").await, 1);

    for email in ["cook@example.com", "COOK@example.com"] {
        let token = login_user(&credentials(email, "correct horse"), &issuer, &pool)
            .await
            .unwrap();
        let session: SessionData = issuer.verify(&token.auth_token).unwrap().into();
        assert_eq!(session.user_id, id);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn login_issues_verifiable_token(pool: PgPool) {
    let id = user(&pool, "cook").await;
    let issuer = TokenIssuer::new(b"integration-secret", Duration::hours(1)).unwrap();

    let token = login_user(&credentials("cook@example.com", "correct horse"), &issuer, &pool)
        .await
        .unwrap();
    let session: SessionData = issuer.verify(&token.auth_token).unwrap().into();
    assert_eq!(session.user_id, id);

    assert!(matches!(
        login_user(&credentials("cook@example.com", "wrong"), &issuer, &pool).await,
        Err(FoodgramError::Validation(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn password_change_requires_current_password(pool: PgPool) {
    let id = user(&pool, "cook").await;
    let issuer = TokenIssuer::new(b"integration-secret", Duration::hours(1)).unwrap();

    let wrong = PasswordChange {
        new_password: "new pass".to_owned(),
        current_password: "guess".to_owned(),
    };
    assert!(matches!(
        set_password(id, &wrong, &pool).await,
        Err(FoodgramError::Validation(_))
    ));

    let change = PasswordChange {
        new_password: "new pass".to_owned(),
        current_password: "correct horse".to_owned(),
    };
    set_password(id, &change, &pool).await.unwrap();
    assert!(login_user(&credentials("cook@example.com", "new pass"), &issuer, &pool)
        .await
        .is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn user_views_are_relative_to_viewer(pool: PgPool) {
    let author = user(&pool, "author").await;
    let fan = user(&pool, "fan").await;
    foodgram_sdk::actions::Relation::Subscription
        .activate(fan, author, &pool)
        .await
        .unwrap();

    let seen_by_fan = get_user_view(author, Some(fan), &pool).await.unwrap().unwrap();
    assert!(seen_by_fan.is_subscribed);

    let seen_anonymously = get_user_view(author, None, &pool).await.unwrap().unwrap();
    assert!(!seen_anonymously.is_subscribed);

    let page = fetch_users(None, Pagination::default(), &pool).await.unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.results[0].id, fan);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn repeated_import_adds_nothing(pool: PgPool) {
    let ingredients = read_ingredients("flour,g\nmilk,ml\n".as_bytes()).unwrap();
    let tags = read_tags("Breakfast,#E26C2D,breakfast\n".as_bytes()).unwrap();

    assert_eq!(import_ingredients(&ingredients, &pool).await.unwrap(), 2);
    assert_eq!(import_tags(&tags, &pool).await.unwrap(), 1);

    assert_eq!(import_ingredients(&ingredients, &pool).await.unwrap(), 0);
    assert_eq!(import_tags(&tags, &pool).await.unwrap(), 0);
    assert_eq!(count(&pool, "ingredients").await, 2);
}
