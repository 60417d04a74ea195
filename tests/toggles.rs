mod common;

use foodgram_sdk::{
    actions::{fetch_subscriptions, get_recipe_view, Relation, ToggleState},
    error::FoodgramError,
    pagination::Pagination,
};
use sqlx::PgPool;

use common::{count, ingredient, recipe, user};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn second_activation_conflicts(pool: PgPool) {
    let author = user(&pool, "baker").await;
    let fan = user(&pool, "fan").await;
    let flour = ingredient(&pool, "flour", "g").await;
    let id = recipe(&pool, author, "Bread", &[(flour, 500)]).await;

    for relation in [Relation::Favorite, Relation::ShoppingCart] {
        assert_eq!(
            relation.activate(fan, id, &pool).await.unwrap(),
            ToggleState::Present
        );
        assert!(matches!(
            relation.activate(fan, id, &pool).await,
            Err(FoodgramError::Conflict(_))
        ));
        assert_eq!(relation.state(fan, id, &pool).await.unwrap(), ToggleState::Present);
    }

    assert_eq!(count(&pool, "favorites").await, 1);
    assert_eq!(count(&pool, "shopping_cart").await, 1);

    let view = get_recipe_view(id, Some(fan), &pool).await.unwrap().unwrap();
    assert!(view.is_favorited);
    assert!(view.is_in_shopping_cart);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn concurrent_activations_store_one_row(pool: PgPool) {
    let author = user(&pool, "baker").await;
    let fan = user(&pool, "fan").await;
    let flour = ingredient(&pool, "flour", "g").await;
    let id = recipe(&pool, author, "Bread", &[(flour, 500)]).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { Relation::Favorite.activate(fan, id, &pool).await })
        })
        .collect();

    let mut activated = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(state) => {
                assert_eq!(state, ToggleState::Present);
                activated += 1;
            }
            Err(FoodgramError::Conflict(_)) => {}
            Err(e) => panic!("unexpected activation error: {e}"),
        }
    }

    assert_eq!(activated, 1);
    assert_eq!(count(&pool, "favorites").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn deactivating_absent_relation_conflicts(pool: PgPool) {
    let author = user(&pool, "baker").await;
    let fan = user(&pool, "fan").await;
    let flour = ingredient(&pool, "flour", "g").await;
    let id = recipe(&pool, author, "Bread", &[(flour, 500)]).await;

    assert!(matches!(
        Relation::Favorite.deactivate(fan, id, &pool).await,
        Err(FoodgramError::Conflict(_))
    ));

    Relation::Favorite.activate(fan, id, &pool).await.unwrap();
    assert_eq!(
        Relation::Favorite.deactivate(fan, id, &pool).await.unwrap(),
        ToggleState::Absent
    );
    assert_eq!(count(&pool, "favorites").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn missing_target_is_not_found(pool: PgPool) {
    let fan = user(&pool, "fan").await;

    assert!(matches!(
        Relation::ShoppingCart.activate(fan, 404, &pool).await,
        Err(FoodgramError::NotFound(_))
    ));
    assert!(matches!(
        Relation::Subscription.activate(fan, 404, &pool).await,
        Err(FoodgramError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn self_subscription_is_rejected(pool: PgPool) {
    let author = user(&pool, "baker").await;

    assert!(matches!(
        Relation::Subscription.activate(author, author, &pool).await,
        Err(FoodgramError::InvalidOperation(_))
    ));
    assert_eq!(count(&pool, "subscriptions").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn subscriptions_list_truncates_recipes(pool: PgPool) {
    let author = user(&pool, "baker").await;
    let fan = user(&pool, "fan").await;
    let flour = ingredient(&pool, "flour", "g").await;
    for name in ["Bread", "Rolls", "Bagels"] {
        recipe(&pool, author, name, &[(flour, 100)]).await;
    }

    Relation::Subscription.activate(fan, author, &pool).await.unwrap();

    let page = fetch_subscriptions(fan, Some(2), Pagination::default(), &pool)
        .await
        .unwrap();
    assert_eq!(page.count, 1);

    let subscription = &page.results[0];
    assert_eq!(subscription.id, author);
    assert!(subscription.is_subscribed);
    assert_eq!(subscription.recipes_count, 3);
    assert_eq!(subscription.recipes.len(), 2);
    assert_eq!(subscription.recipes[0].name, "Bagels");
}
