use sqlx::{Postgres, QueryBuilder};

use super::{error::TypeError, form::Form, schema::Id};

/// Conjunctive recipe listing filter; `tags` matches any of the given slugs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_form(form: &Form) -> Result<Self, TypeError> {
        Ok(Self {
            author: form.get_number::<Id>("author")?,
            tags: form.get_list("tags"),
            is_favorited: form.get_bool("is_favorited")?,
            is_in_shopping_cart: form.get_bool("is_in_shopping_cart")?,
        })
    }

    /// Appends the `WHERE` clause for a query selecting from `recipes r`.
    /// Viewer-relative flags are dropped for anonymous callers.
    pub fn push_predicates<'args>(
        &self,
        viewer: Option<Id>,
        query_builder: &mut QueryBuilder<'args, Postgres>,
    ) {
        query_builder.push(" WHERE TRUE");

        if let Some(author) = self.author {
            query_builder.push(" AND r.author_id = ").push_bind(author);
        }

        if !self.tags.is_empty() {
            query_builder
                .push(
                    " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(self.tags.clone())
                .push("))");
        }

        if let Some(viewer) = viewer {
            if self.is_favorited {
                query_builder
                    .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
            if self.is_in_shopping_cart {
                query_builder
                    .push(" AND EXISTS (SELECT 1 FROM shopping_cart sc WHERE sc.recipe_id = r.id AND sc.user_id = ")
                    .push_bind(viewer)
                    .push(")");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(filter: &RecipeFilter, viewer: Option<Id>) -> String {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT r.* FROM recipes r");
        filter.push_predicates(viewer, &mut query_builder);
        query_builder.sql().to_owned()
    }

    #[test]
    fn no_parameters_means_unrestricted_listing() {
        assert_eq!(
            sql(&RecipeFilter::default(), Some(1)),
            "SELECT r.* FROM recipes r WHERE TRUE"
        );
    }

    #[test]
    fn anonymous_viewer_ignores_personal_flags() {
        let filter = RecipeFilter {
            is_favorited: true,
            is_in_shopping_cart: true,
            ..Default::default()
        };
        assert_eq!(sql(&filter, None), sql(&RecipeFilter::default(), None));
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let filter = RecipeFilter {
            author: Some(4),
            tags: vec!["breakfast".to_owned(), "lunch".to_owned()],
            is_favorited: true,
            is_in_shopping_cart: false,
        };
        let sql = sql(&filter, Some(9));

        assert!(sql.contains("r.author_id = $1"));
        assert!(sql.contains("t.slug = ANY($2)"));
        assert!(sql.contains("f.user_id = $3"));
        assert!(!sql.contains("shopping_cart"));
    }

    #[test]
    fn parses_query_parameters() {
        let form = Form::from_data(vec![
            ("author".to_owned(), "2".to_owned()),
            ("tags".to_owned(), "dinner".to_owned()),
            ("tags".to_owned(), "lunch".to_owned()),
            ("is_in_shopping_cart".to_owned(), "1".to_owned()),
        ]);
        let filter = RecipeFilter::from_form(&form).unwrap();

        assert_eq!(
            filter,
            RecipeFilter {
                author: Some(2),
                tags: vec!["dinner".to_owned(), "lunch".to_owned()],
                is_favorited: false,
                is_in_shopping_cart: true,
            }
        );
    }

    #[test]
    fn non_numeric_author_is_rejected() {
        let form = Form::from_data(vec![("author".to_owned(), "me".to_owned())]);
        assert!(RecipeFilter::from_form(&form).is_err());
    }
}
