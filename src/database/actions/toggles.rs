use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{error::FoodgramError, schema::Id};

/// A binary relation between an actor (always a user) and a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Favorite,
    ShoppingCart,
    Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleState {
    Absent,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOp {
    Activate,
    Deactivate,
}

impl Relation {
    fn table(&self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "shopping_cart",
            Relation::Subscription => "subscriptions",
        }
    }

    fn target_column(&self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "recipe_id",
            Relation::Subscription => "author_id",
        }
    }

    fn target_table(&self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "recipes",
            Relation::Subscription => "users",
        }
    }

    /// Unique index guarding the (actor, target) pair.
    fn unique_constraint(&self) -> &'static str {
        match self {
            Relation::Favorite => "user_favorite_unique",
            Relation::ShoppingCart => "user_shoppingcart_unique",
            Relation::Subscription => "user_subscription_unique",
        }
    }

    fn target_missing(&self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "No recipe exists with specified id",
            Relation::Subscription => "No user exists with specified id",
        }
    }

    fn already_active(&self) -> &'static str {
        match self {
            Relation::Favorite => "Recipe is already in favorites",
            Relation::ShoppingCart => "Recipe is already in the shopping cart",
            Relation::Subscription => "You are already subscribed to this author",
        }
    }

    fn not_active(&self) -> &'static str {
        match self {
            Relation::Favorite => "Recipe is not in favorites",
            Relation::ShoppingCart => "Recipe is not in the shopping cart",
            Relation::Subscription => "You are not subscribed to this author",
        }
    }

    /// Pair invariants that hold regardless of the stored state.
    pub fn check_pair(&self, actor: Id, target: Id) -> Result<(), FoodgramError> {
        match self {
            Relation::Subscription if actor == target => Err(FoodgramError::InvalidOperation(
                "You can't subscribe to yourself".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    pub fn transition(&self, current: ToggleState, op: ToggleOp) -> Result<ToggleState, FoodgramError> {
        match (current, op) {
            (ToggleState::Absent, ToggleOp::Activate) => Ok(ToggleState::Present),
            (ToggleState::Present, ToggleOp::Deactivate) => Ok(ToggleState::Absent),
            (ToggleState::Present, ToggleOp::Activate) => {
                Err(FoodgramError::conflict(self.already_active()))
            }
            (ToggleState::Absent, ToggleOp::Deactivate) => {
                Err(FoodgramError::conflict(self.not_active()))
            }
        }
    }

    async fn ensure_target(&self, target: Id, pool: &Pool<Postgres>) -> Result<(), FoodgramError> {
        let row: Option<(Id,)> =
            sqlx::query_as(&format!("SELECT id FROM {} WHERE id = $1", self.target_table()))
                .bind(target)
                .fetch_optional(pool)
                .await?;

        match row {
            Some(_) => Ok(()),
            None => Err(FoodgramError::not_found(self.target_missing())),
        }
    }

    pub async fn state(
        &self,
        actor: Id,
        target: Id,
        pool: &Pool<Postgres>,
    ) -> Result<ToggleState, FoodgramError> {
        let row: Option<(Id,)> = sqlx::query_as(&format!(
            "SELECT id FROM {} WHERE user_id = $1 AND {} = $2",
            self.table(),
            self.target_column()
        ))
        .bind(actor)
        .bind(target)
        .fetch_optional(pool)
        .await?;

        Ok(match row {
            Some(_) => ToggleState::Present,
            None => ToggleState::Absent,
        })
    }

    /// Inserts the (actor, target) row. A concurrent duplicate that slips past
    /// the existence check is reported as `Conflict` by the unique index.
    pub async fn activate(
        &self,
        actor: Id,
        target: Id,
        pool: &Pool<Postgres>,
    ) -> Result<ToggleState, FoodgramError> {
        self.check_pair(actor, target)?;
        self.ensure_target(target, pool).await?;

        let current = self.state(actor, target, pool).await?;
        let next = self.transition(current, ToggleOp::Activate)?;

        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, {}) VALUES ($1, $2)",
            self.table(),
            self.target_column()
        ))
        .bind(actor)
        .bind(target)
        .execute(pool)
        .await;

        match result.map_err(FoodgramError::from) {
            Ok(_) => {}
            Err(FoodgramError::ConstraintViolation(constraint))
                if constraint == self.unique_constraint() =>
            {
                log::warn!("Lost {self:?} activation race for ({actor}, {target})");
                return Err(FoodgramError::conflict(self.already_active()));
            }
            Err(e) => return Err(e),
        }

        log::info!("{self:?} ({actor}, {target}) activated");

        Ok(next)
    }

    pub async fn deactivate(
        &self,
        actor: Id,
        target: Id,
        pool: &Pool<Postgres>,
    ) -> Result<ToggleState, FoodgramError> {
        self.ensure_target(target, pool).await?;

        let current = self.state(actor, target, pool).await?;
        let next = self.transition(current, ToggleOp::Deactivate)?;

        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            self.table(),
            self.target_column()
        ))
        .bind(actor)
        .bind(target)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FoodgramError::conflict(self.not_active()));
        }

        log::info!("{self:?} ({actor}, {target}) deactivated");

        Ok(next)
    }
}
