use std::io::Read;

use sqlx::{Pool, Postgres, QueryBuilder};
use thiserror::Error;

use super::error::QueryError;
use crate::constants::{INGREDIENT_NAME_MAX_LENGTH, MEASUREMENT_UNIT_MAX_LENGTH, TAG_NAME_MAX_LENGTH};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {reason}")]
    Record { line: u64, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] QueryError),
}

impl From<sqlx::Error> for ImportError {
    fn from(value: sqlx::Error) -> Self {
        log::error!("Import query failed: {value}");
        Self::Store(QueryError::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Trimmed fields of every non-empty record, paired with the source line.
fn read_records<R: Read>(
    source: R,
    width: usize,
) -> Result<Vec<(u64, Vec<String>)>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let fields: Vec<String> = record.iter().map(|f| f.trim().to_owned()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if fields.len() != width {
            return Err(ImportError::Record {
                line,
                reason: format!("expected {width} fields, found {}", fields.len()),
            });
        }
        if fields.iter().any(|f| f.is_empty()) {
            return Err(ImportError::Record {
                line,
                reason: "empty field".to_owned(),
            });
        }

        records.push((line, fields));
    }

    Ok(records)
}

fn check_length(line: u64, field: &str, value: &str, max: usize) -> Result<(), ImportError> {
    if value.chars().count() > max {
        return Err(ImportError::Record {
            line,
            reason: format!("{field} can't be longer than {max} characters"),
        });
    }
    Ok(())
}

/// Rows of `name,measurement_unit`.
pub fn read_ingredients<R: Read>(source: R) -> Result<Vec<IngredientRecord>, ImportError> {
    read_records(source, 2)?
        .into_iter()
        .map(|(line, mut fields)| {
            let measurement_unit = fields.pop().unwrap_or_default();
            let name = fields.pop().unwrap_or_default();

            check_length(line, "name", &name, INGREDIENT_NAME_MAX_LENGTH)?;
            check_length(
                line,
                "measurement unit",
                &measurement_unit,
                MEASUREMENT_UNIT_MAX_LENGTH,
            )?;

            Ok(IngredientRecord {
                name,
                measurement_unit,
            })
        })
        .collect()
}

/// Rows of `name,color,slug`.
pub fn read_tags<R: Read>(source: R) -> Result<Vec<TagRecord>, ImportError> {
    read_records(source, 3)?
        .into_iter()
        .map(|(line, mut fields)| {
            let slug = fields.pop().unwrap_or_default();
            let color = fields.pop().unwrap_or_default();
            let name = fields.pop().unwrap_or_default();

            check_length(line, "name", &name, TAG_NAME_MAX_LENGTH)?;
            if !is_hex_color(&color) {
                return Err(ImportError::Record {
                    line,
                    reason: format!("'{color}' is not a hex color"),
                });
            }
            if !is_slug(&slug) {
                return Err(ImportError::Record {
                    line,
                    reason: format!("'{slug}' is not a valid slug"),
                });
            }

            Ok(TagRecord { name, color, slug })
        })
        .collect()
}

/// Inserts ingredients that are not present yet; returns the number of new rows.
pub async fn import_ingredients(
    records: &[IngredientRecord],
    pool: &Pool<Postgres>,
) -> Result<u64, ImportError> {
    let mut tr = pool.begin().await?;
    let mut inserted = 0;

    for chunk in records.chunks(65535 / 2) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

        query_builder.push_values(chunk, |mut b, record| {
            b.push_bind(&record.name).push_bind(&record.measurement_unit);
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        inserted += query_builder
            .build()
            .execute(&mut *tr)
            .await?
            .rows_affected();
    }

    tr.commit().await?;
    log::info!(
        "Imported {inserted} of {} ingredients",
        records.len()
    );

    Ok(inserted)
}

/// Inserts tags that are not present yet; returns the number of new rows.
pub async fn import_tags(records: &[TagRecord], pool: &Pool<Postgres>) -> Result<u64, ImportError> {
    let mut tr = pool.begin().await?;
    let mut inserted = 0;

    for chunk in records.chunks(65535 / 3) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO tags (name, color, slug) ");

        query_builder.push_values(chunk, |mut b, record| {
            b.push_bind(&record.name)
                .push_bind(&record.color)
                .push_bind(&record.slug);
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        inserted += query_builder
            .build()
            .execute(&mut *tr)
            .await?
            .rows_affected();
    }

    tr.commit().await?;
    log::info!("Imported {inserted} of {} tags", records.len());

    Ok(inserted)
}
