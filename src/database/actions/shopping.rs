use sqlx::{Pool, Postgres};

use crate::{
    constants::SHOPPING_LIST_HEADER,
    error::FoodgramError,
    schema::{Id, ShoppingListItem},
};

/// Sums the ingredient amounts of every recipe in the user's cart, one line
/// per (name, measurement unit) pair. Does not touch the cart.
pub async fn aggregate_shopping_list(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, FoodgramError> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount)::BIGINT AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut text = String::from(SHOPPING_LIST_HEADER);
    text.push('\n');

    for item in items {
        text.push_str(&format!(
            "{} - {} {}\n",
            item.name, item.amount, item.measurement_unit
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, amount: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            amount,
        }
    }

    #[test]
    fn lines_follow_header() {
        let text = render_shopping_list(&[item("flour", "g", 500), item("milk", "ml", 250)]);
        assert_eq!(text, "Shopping list:\nflour - 500 g\nmilk - 250 ml\n");
    }

    #[test]
    fn empty_cart_renders_header_only() {
        assert_eq!(render_shopping_list(&[]), "Shopping list:\n");
    }
}
