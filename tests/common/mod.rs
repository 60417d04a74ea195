#![allow(dead_code)]

use foodgram_sdk::{
    actions::{create_recipe, register_user},
    schema::{Id, IngredientEntry, NewUser, NumericField, RecipeDraft},
};
use sqlx::PgPool;

pub async fn user(pool: &PgPool, name: &str) -> Id {
    register_user(
        &NewUser {
            email: format!("{name}@example.com"),
            username: name.to_owned(),
            first_name: name.to_owned(),
            last_name: "Tester".to_owned(),
            password: "correct horse".to_owned(),
        },
        pool,
    )
    .await
    .unwrap()
    .id
}

pub async fn ingredient(pool: &PgPool, name: &str, unit: &str) -> Id {
    let row: (Id,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(unit)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

pub async fn tag(pool: &PgPool, name: &str, color: &str) -> Id {
    let row: (Id,) =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING id")
            .bind(name)
            .bind(color)
            .bind(name.to_lowercase())
            .fetch_one(pool)
            .await
            .unwrap();
    row.0
}

pub fn draft(name: &str, tags: Vec<Id>, ingredients: &[(Id, i64)]) -> RecipeDraft {
    RecipeDraft {
        tags,
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientEntry {
                id: *id,
                amount: NumericField::Number(*amount),
            })
            .collect(),
        name: name.to_owned(),
        text: format!("How to make {name}"),
        cooking_time: NumericField::Number(30),
        image: None,
    }
}

pub async fn recipe(pool: &PgPool, author: Id, name: &str, ingredients: &[(Id, i64)]) -> Id {
    create_recipe(author, &draft(name, vec![], ingredients), pool)
        .await
        .unwrap()
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}
