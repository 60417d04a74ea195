use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FoodgramError;

pub type Id = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Public user representation, `is_subscribed` is relative to the viewer.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq)]
pub struct UserView {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserRow {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,

    pub count: i64,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            is_subscribed: row.is_subscribed,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreatedUser {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PasswordChange {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthToken {
    pub auth_token: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRow {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,

    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeTagRow {
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<RecipeTagRow> for Tag {
    fn from(row: RecipeTagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct RecipeIngredient {
    #[serde(skip)]
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe used in favorite, cart and subscription payloads.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct RecipeShort {
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeShortRow {
    pub author_id: Id,
    pub id: Id,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<RecipeShortRow> for RecipeShort {
    fn from(row: RecipeShortRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
            cooking_time: row.cooking_time,
        }
    }
}

/// Integer that clients may send either as a JSON number or as a numeric string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum NumericField {
    Number(i64),
    Text(String),
}

impl NumericField {
    pub fn positive(&self, field: &str) -> Result<i32, FoodgramError> {
        let value = match self {
            NumericField::Number(value) => Some(*value),
            NumericField::Text(value) => value.trim().parse::<i64>().ok(),
        };

        match value.and_then(|value| i32::try_from(value).ok()) {
            Some(value) if value > 0 => Ok(value),
            _ => Err(FoodgramError::Validation(format!(
                "{field} has to be greater than 0"
            ))),
        }
    }
}

impl From<i64> for NumericField {
    fn from(value: i64) -> Self {
        NumericField::Number(value)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientEntry {
    pub id: Id,
    pub amount: NumericField,
}

/// Write shape of a recipe: tag ids and (ingredient id, amount) pairs.
#[derive(Deserialize, Debug, Clone)]
pub struct RecipeDraft {
    #[serde(default)]
    pub tags: Vec<Id>,
    pub ingredients: Vec<IngredientEntry>,
    pub name: String,
    pub text: String,
    pub cooking_time: NumericField,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct SubscriptionView {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_accept_numbers_and_numeric_strings() {
        let draft: RecipeDraft = serde_json::from_str(
            r#"{
                "tags": [1, 2],
                "ingredients": [{"id": 3, "amount": "200"}, {"id": 4, "amount": 5}],
                "name": "Pancakes",
                "text": "Mix and fry",
                "cooking_time": "15"
            }"#,
        )
        .unwrap();

        assert_eq!(draft.ingredients[0].amount.positive("amount").unwrap(), 200);
        assert_eq!(draft.ingredients[1].amount.positive("amount").unwrap(), 5);
        assert_eq!(draft.cooking_time.positive("cooking_time").unwrap(), 15);
        assert_eq!(draft.image, None);
    }

    #[test]
    fn non_positive_or_garbage_numbers_are_rejected() {
        assert!(NumericField::Number(0).positive("amount").is_err());
        assert!(NumericField::Number(-4).positive("amount").is_err());
        assert!(NumericField::Text("lots".to_owned()).positive("amount").is_err());
        assert!(NumericField::Number(i64::MAX).positive("amount").is_err());
    }

    #[test]
    fn recipe_ingredient_hides_recipe_id() {
        let value = serde_json::to_value(RecipeIngredient {
            recipe_id: 9,
            id: 1,
            name: "flour".to_owned(),
            measurement_unit: "g".to_owned(),
            amount: 200,
        })
        .unwrap();

        assert_eq!(
            value,
            serde_json::json!({"id": 1, "name": "flour", "measurement_unit": "g", "amount": 200})
        );
    }
}
