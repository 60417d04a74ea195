use std::collections::{HashMap, HashSet};

use crate::{
    authentication::permissions::may_modify_recipe,
    constants::RECIPE_NAME_MAX_LENGTH,
    error::FoodgramError,
    filters::RecipeFilter,
    jwt::SessionData,
    pagination::{PageContext, Pagination},
    schema::{Id, Recipe, RecipeDraft, RecipeIngredient, RecipeRow, RecipeView, Tag, UserView},
};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use super::{list_recipe_tags, list_user_views, set_recipe_tags};

/// A recipe draft that passed input validation; ids are not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<Id>,
    pub ingredients: Vec<(Id, i32)>,
}

impl RecipeDraft {
    pub fn validate(&self) -> Result<ValidatedRecipe, FoodgramError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FoodgramError::validation("Recipe name is required"));
        }
        if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
            return Err(FoodgramError::Validation(format!(
                "Recipe name can't be longer than {RECIPE_NAME_MAX_LENGTH} characters"
            )));
        }
        if self.text.trim().is_empty() {
            return Err(FoodgramError::validation("Recipe text is required"));
        }

        let cooking_time = self.cooking_time.positive("Cooking time")?;

        if self.ingredients.is_empty() {
            return Err(FoodgramError::validation(
                "Recipe needs at least one ingredient",
            ));
        }

        let mut seen = HashSet::new();
        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for entry in &self.ingredients {
            let amount = entry.amount.positive("Ingredients amount")?;
            if !seen.insert(entry.id) {
                return Err(FoodgramError::Validation(format!(
                    "Ingredients have to be unique: duplicate ingredient {}",
                    entry.id
                )));
            }
            ingredients.push((entry.id, amount));
        }

        let mut seen = HashSet::new();
        let tags = self
            .tags
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        Ok(ValidatedRecipe {
            name: name.to_owned(),
            text: self.text.to_owned(),
            cooking_time,
            image: self.image.to_owned().filter(|image| !image.is_empty()),
            tags,
            ingredients,
        })
    }
}

/// Fails with `NotFound` naming the first id missing from `table`.
async fn ensure_exist(
    table: &'static str,
    what: &str,
    ids: &[Id],
    conn: &mut PgConnection,
) -> Result<(), FoodgramError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<(Id,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
    let found: HashSet<Id> = found.into_iter().map(|row| row.0).collect();

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(FoodgramError::NotFound(format!(
            "{what} {missing} does not exist"
        ))),
        None => Ok(()),
    }
}

async fn resolve_references(
    recipe: &ValidatedRecipe,
    conn: &mut PgConnection,
) -> Result<(), FoodgramError> {
    ensure_exist("tags", "Tag", &recipe.tags, conn).await?;

    let ingredient_ids: Vec<Id> = recipe.ingredients.iter().map(|(id, _)| *id).collect();
    ensure_exist("ingredients", "Ingredient", &ingredient_ids, conn).await?;

    Ok(())
}

/// Replaces every ingredient row of a recipe inside the caller's transaction.
async fn set_recipe_ingredients(
    recipe_id: Id,
    ingredients: &[(Id, i32)],
    conn: &mut PgConnection,
) -> Result<(), FoodgramError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for chunk in ingredients.chunks(65535 / 3) {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );

        query_builder.push_values(chunk, |mut b, (ingredient_id, amount)| {
            b.push_bind(recipe_id)
                .push_bind(*ingredient_id)
                .push_bind(*amount);
        });

        query_builder.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Creates a recipe with its tag set and ingredient list in one transaction.
pub async fn create_recipe(
    author_id: Id,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<Id, FoodgramError> {
    let recipe = draft.validate()?;

    let mut tr = pool.begin().await?;
    resolve_references(&recipe, &mut tr).await?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .bind(&recipe.image)
    .fetch_one(&mut *tr)
    .await?;

    set_recipe_tags(id.0, &recipe.tags, &mut tr).await?;
    set_recipe_ingredients(id.0, &recipe.ingredients, &mut tr).await?;
    tr.commit().await?;

    log::info!(
        "User {author_id} created recipe {} with {} ingredients",
        id.0,
        recipe.ingredients.len()
    );

    Ok(id.0)
}

/// Overwrites scalar fields, tag set and ingredient list of a recipe in one
/// transaction. An omitted image keeps the stored one.
pub async fn replace_recipe(
    recipe_id: Id,
    draft: &RecipeDraft,
    pool: &Pool<Postgres>,
) -> Result<(), FoodgramError> {
    let recipe = draft.validate()?;

    let mut tr = pool.begin().await?;
    resolve_references(&recipe, &mut tr).await?;

    let result = sqlx::query(
        "
        UPDATE recipes
        SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image)
        WHERE id = $5
    ",
    )
    .bind(&recipe.name)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .bind(&recipe.image)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await?;

    if result.rows_affected() == 0 {
        return Err(FoodgramError::not_found("No recipe exists with specified id"));
    }

    set_recipe_tags(recipe_id, &recipe.tags, &mut tr).await?;
    set_recipe_ingredients(recipe_id, &recipe.ingredients, &mut tr).await?;
    tr.commit().await?;

    log::info!("Replaced recipe {recipe_id}");

    Ok(())
}

pub async fn delete_recipe(recipe_id: Id, pool: &Pool<Postgres>) -> Result<(), FoodgramError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(FoodgramError::not_found("No recipe exists with specified id"));
    }

    log::info!("Deleted recipe {recipe_id}");

    Ok(())
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, FoodgramError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Loads a recipe the session is allowed to modify.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, FoodgramError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| FoodgramError::not_found("No recipe exists with specified id"))?;

    if !may_modify_recipe(session, recipe.author_id) {
        return Err(FoodgramError::Forbidden);
    }

    Ok(recipe)
}

pub async fn list_recipe_ingredients(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, FoodgramError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ")
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Recipe columns plus the viewer-relative flags; anonymous viewers bind NULL
/// so both flags read false.
fn select_recipes(viewer: Option<Id>) -> QueryBuilder<'static, Postgres> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT r.*, EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    query_builder
        .push_bind(viewer)
        .push(") AS is_favorited, EXISTS(SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ")
        .push_bind(viewer)
        .push(") AS is_in_shopping_cart, COUNT(*) OVER() AS count FROM recipes r");

    query_builder
}

/// Attaches authors, tags and ingredients to recipe rows, keeping row order.
async fn compose_views(
    rows: Vec<RecipeRow>,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, FoodgramError> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Id> = rows.iter().map(|row| row.id).collect();
    let author_ids: Vec<Id> = rows
        .iter()
        .map(|row| row.author_id)
        .collect::<HashSet<Id>>()
        .into_iter()
        .collect();

    let authors: HashMap<Id, UserView> = list_user_views(&author_ids, viewer, pool)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let mut tags: HashMap<Id, Vec<Tag>> = HashMap::new();
    list_recipe_tags(&recipe_ids, pool)
        .await?
        .into_iter()
        .for_each(|row| tags.entry(row.recipe_id).or_default().push(row.into()));

    let mut ingredients: HashMap<Id, Vec<RecipeIngredient>> = HashMap::new();
    list_recipe_ingredients(&recipe_ids, pool)
        .await?
        .into_iter()
        .for_each(|row| ingredients.entry(row.recipe_id).or_default().push(row));

    rows.into_iter()
        .map(|row| {
            let author = authors.get(&row.author_id).cloned().ok_or_else(|| {
                FoodgramError::NotFound(format!("Author of recipe {} does not exist", row.id))
            })?;

            Ok(RecipeView {
                id: row.id,
                tags: tags.remove(&row.id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&row.id).unwrap_or_default(),
                is_favorited: row.is_favorited,
                is_in_shopping_cart: row.is_in_shopping_cart,
                name: row.name,
                image: row.image,
                text: row.text,
                cooking_time: row.cooking_time,
            })
        })
        .collect()
}

pub async fn get_recipe_view(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeView>, FoodgramError> {
    let mut query_builder = select_recipes(viewer);
    query_builder.push(" WHERE r.id = ").push_bind(id);

    let rows: Vec<RecipeRow> = query_builder.build_query_as().fetch_all(pool).await?;

    Ok(compose_views(rows, viewer, pool).await?.into_iter().next())
}

/// Filtered listing, newest first.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    pagination: Pagination,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeView>, FoodgramError> {
    let mut query_builder = select_recipes(viewer);
    filter.push_predicates(viewer, &mut query_builder);
    query_builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());

    let rows: Vec<RecipeRow> = query_builder.build_query_as().fetch_all(pool).await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None if pagination.page > 1 => count_recipes(filter, viewer, pool).await?,
        None => 0,
    };

    let views = compose_views(rows, viewer, pool).await?;
    Ok(PageContext::from_rows(views, total_count, pagination))
}

async fn count_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<i64, FoodgramError> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM recipes r");
    filter.push_predicates(viewer, &mut query_builder);

    let count: (i64,) = query_builder.build_query_as().fetch_one(pool).await?;

    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IngredientEntry, NumericField};

    fn entry(id: Id, amount: i64) -> IngredientEntry {
        IngredientEntry {
            id,
            amount: NumericField::Number(amount),
        }
    }

    fn draft(ingredients: Vec<IngredientEntry>) -> RecipeDraft {
        RecipeDraft {
            tags: vec![2, 1, 2],
            ingredients,
            name: " Bread ".to_owned(),
            text: "Knead and bake".to_owned(),
            cooking_time: NumericField::Number(90),
            image: None,
        }
    }

    #[test]
    fn valid_draft_is_normalised() {
        let recipe = draft(vec![entry(10, 500), entry(11, 7)]).validate().unwrap();

        assert_eq!(
            recipe,
            ValidatedRecipe {
                name: "Bread".to_owned(),
                text: "Knead and bake".to_owned(),
                cooking_time: 90,
                image: None,
                tags: vec![2, 1],
                ingredients: vec![(10, 500), (11, 7)],
            }
        );
    }

    #[test]
    fn duplicate_ingredient_is_rejected() {
        let result = draft(vec![entry(10, 500), entry(10, 100)]).validate();
        assert!(matches!(
            result,
            Err(FoodgramError::Validation(ref info)) if info.contains("duplicate ingredient")
        ));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let result = draft(vec![entry(10, 0)]).validate();
        assert!(matches!(result, Err(FoodgramError::Validation(_))));

        let result = draft(vec![IngredientEntry {
            id: 10,
            amount: NumericField::Text("-3".to_owned()),
        }])
        .validate();
        assert!(matches!(result, Err(FoodgramError::Validation(_))));
    }

    #[test]
    fn non_positive_cooking_time_is_rejected() {
        let mut draft = draft(vec![entry(10, 1)]);
        draft.cooking_time = NumericField::Number(0);
        assert!(matches!(draft.validate(), Err(FoodgramError::Validation(_))));
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        assert!(matches!(
            draft(vec![]).validate(),
            Err(FoodgramError::Validation(_))
        ));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut draft = draft(vec![entry(10, 1)]);
        draft.name = "x".repeat(RECIPE_NAME_MAX_LENGTH + 1);
        assert!(matches!(draft.validate(), Err(FoodgramError::Validation(_))));
    }

    #[test]
    fn anonymous_flags_bind_null_viewer() {
        let query_builder = select_recipes(None);
        let sql = query_builder.sql();
        assert!(sql.contains("f.user_id = $1"));
        assert!(sql.contains("sc.user_id = $2"));
        assert!(sql.ends_with("FROM recipes r"));
    }
}
