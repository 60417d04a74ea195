use serde::{Deserialize, Serialize};

use super::{error::TypeError, form::Form};
use crate::constants::RECIPE_COUNT_PER_PAGE;

/// Page-number window over a listing, `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: RECIPE_COUNT_PER_PAGE,
        }
    }
}

impl Pagination {
    pub fn from_form(form: &Form) -> Result<Self, TypeError> {
        let page = form.get_number::<i64>("page")?.unwrap_or(1);
        let limit = form
            .get_number::<i64>("limit")?
            .unwrap_or(RECIPE_COUNT_PER_PAGE);

        if page < 1 {
            return Err(TypeError::new("Invalid page"));
        }
        if limit < 1 {
            return Err(TypeError::new("Invalid limit"));
        }

        // The end of the window has to fit an i64 OFFSET
        (page - 1)
            .checked_mul(limit)
            .and_then(|offset| offset.checked_add(limit))
            .ok_or_else(|| TypeError::new("Invalid page"))?;

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, pagination: Pagination) -> Self {
        let next = if pagination.offset().saturating_add(pagination.limit) < total_rows {
            Some(pagination.page + 1)
        } else {
            None
        };
        let previous = if pagination.page > 1 {
            Some(pagination.page - 1)
        } else {
            None
        };

        Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        }
    }
}
