use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::FoodgramError,
    pagination::{PageContext, Pagination},
    schema::{Id, RecipeShort, RecipeShortRow, SubscriptionView, UserRow, UserView},
};

use super::get_user_view;

pub async fn get_recipe_short(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeShort>, FoodgramError> {
    let row: Option<RecipeShort> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row)
}

/// Newest recipes of each author, at most `recipes_limit` per author.
async fn list_author_recipes(
    author_ids: &[Id],
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<RecipeShort>>, FoodgramError> {
    let rows: Vec<RecipeShortRow> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time FROM (
            SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(author_ids)
    .bind(recipes_limit)
    .fetch_all(pool)
    .await?;

    let mut recipes: HashMap<Id, Vec<RecipeShort>> = HashMap::new();
    for row in rows {
        recipes.entry(row.author_id).or_default().push(row.into());
    }

    Ok(recipes)
}

async fn count_author_recipes(
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, i64>, FoodgramError> {
    let rows: Vec<(Id, i64)> = sqlx::query_as(
        "SELECT author_id, COUNT(*) FROM recipes WHERE author_id = ANY($1) GROUP BY author_id",
    )
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

async fn attach_recipes(
    authors: Vec<UserView>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscriptionView>, FoodgramError> {
    let author_ids: Vec<Id> = authors.iter().map(|author| author.id).collect();
    let mut recipes = list_author_recipes(&author_ids, recipes_limit, pool).await?;
    let counts = count_author_recipes(&author_ids, pool).await?;

    Ok(authors
        .into_iter()
        .map(|author| SubscriptionView {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            id: author.id,
            email: author.email,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: author.is_subscribed,
        })
        .collect())
}

/// Author representation returned after subscribing.
pub async fn get_subscription_view(
    author_id: Id,
    viewer: Option<Id>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Option<SubscriptionView>, FoodgramError> {
    let author = match get_user_view(author_id, viewer, pool).await? {
        Some(author) => author,
        None => return Ok(None),
    };

    Ok(attach_recipes(vec![author], recipes_limit, pool)
        .await?
        .into_iter()
        .next())
}

/// Authors `user_id` is subscribed to, in subscription order.
pub async fn fetch_subscriptions(
    user_id: Id,
    recipes_limit: Option<i64>,
    pagination: Pagination,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionView>, FoodgramError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            TRUE AS is_subscribed, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(pagination.limit)
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None => count_subscriptions(user_id, pool).await?,
    };

    let authors = rows.into_iter().map(UserView::from).collect();
    let views = attach_recipes(authors, recipes_limit, pool).await?;

    Ok(PageContext::from_rows(views, total_count, pagination))
}

async fn count_subscriptions(user_id: Id, pool: &Pool<Postgres>) -> Result<i64, FoodgramError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}
