use crate::{
    authentication::{
        cryptography::{hash_password, password_matches},
        jwt::TokenIssuer,
    },
    constants::{EMAIL_MAX_LENGTH, USER_NAME_MAX_LENGTH},
    error::FoodgramError,
    pagination::{PageContext, Pagination},
    schema::{
        AuthToken, CreatedUser, Credentials, Id, NewUser, PasswordChange, User, UserRow, UserView,
    },
};

use sqlx::{Pool, Postgres};

const USER_VIEW_COLUMNS: &str = "
    u.id, u.email, u.username, u.first_name, u.last_name,
    EXISTS(SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = $1) AS is_subscribed
";

pub async fn get_user(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, FoodgramError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Id) -> Result<Option<User>, FoodgramError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// User representation with `is_subscribed` relative to `viewer`.
pub async fn get_user_view(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserView>, FoodgramError> {
    let row: Option<UserView> = sqlx::query_as(&format!(
        "SELECT {USER_VIEW_COLUMNS} FROM users u WHERE u.id = $2"
    ))
    .bind(viewer)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn list_user_views(
    user_ids: &[Id],
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Vec<UserView>, FoodgramError> {
    let rows: Vec<UserView> = sqlx::query_as(&format!(
        "SELECT {USER_VIEW_COLUMNS} FROM users u WHERE u.id = ANY($2)"
    ))
    .bind(viewer)
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn fetch_users(
    viewer: Option<Id>,
    pagination: Pagination,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserView>, FoodgramError> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_VIEW_COLUMNS}, COUNT(*) OVER() AS count FROM users u ORDER BY u.id DESC LIMIT $2 OFFSET $3"
    ))
    .bind(viewer)
    .bind(pagination.limit)
    .bind(pagination.offset())
    .fetch_all(pool)
    .await?;

    let total_count = match rows.first() {
        Some(row) => row.count,
        None => count_users(pool).await?,
    };
    let rows = rows.into_iter().map(UserView::from).collect();

    Ok(PageContext::from_rows(rows, total_count, pagination))
}

async fn count_users(pool: &Pool<Postgres>) -> Result<i64, FoodgramError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

impl NewUser {
    pub fn validate(&self) -> Result<(), FoodgramError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.chars().count() > EMAIL_MAX_LENGTH {
            return Err(FoodgramError::validation("Enter a valid email address"));
        }

        for (field, value) in [
            ("username", &self.username),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            let value = value.trim();
            if value.is_empty() || value.chars().count() > USER_NAME_MAX_LENGTH {
                return Err(FoodgramError::Validation(format!(
                    "{field} has to contain 1 to {USER_NAME_MAX_LENGTH} characters"
                )));
            }
        }

        if self.password.is_empty() {
            return Err(FoodgramError::validation("Password is required"));
        }

        Ok(())
    }
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(
    new_user: &NewUser,
    pool: &Pool<Postgres>,
) -> Result<CreatedUser, FoodgramError> {
    new_user.validate()?;

    let password = hash_password(&new_user.password)?;

    let row: (Id,) = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(new_user.email.trim())
    .bind(new_user.username.trim())
    .bind(new_user.first_name.trim())
    .bind(new_user.last_name.trim())
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(|e| match FoodgramError::from(e) {
        FoodgramError::ConstraintViolation(_) => {
            FoodgramError::conflict("A user with that email already exists")
        }
        e => e,
    })?;

    log::info!("Registered user {}", row.0);

    Ok(CreatedUser {
        id: row.0,
        email: new_user.email.trim().to_owned(),
        username: new_user.username.trim().to_owned(),
        first_name: new_user.first_name.trim().to_owned(),
        last_name: new_user.last_name.trim().to_owned(),
    })
}

pub async fn login_user(
    credentials: &Credentials,
    issuer: &TokenIssuer,
    pool: &Pool<Postgres>,
) -> Result<AuthToken, FoodgramError> {
    let user = get_user(pool, credentials.email.trim())
        .await?
        .ok_or_else(|| FoodgramError::validation("Invalid credentials"))?;

    if !password_matches(&credentials.password, &user.password) {
        return Err(FoodgramError::validation("Invalid credentials"));
    }

    Ok(AuthToken {
        auth_token: issuer.issue(&user)?,
    })
}

pub async fn set_password(
    user_id: Id,
    change: &PasswordChange,
    pool: &Pool<Postgres>,
) -> Result<(), FoodgramError> {
    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| FoodgramError::not_found("User does not exist"))?;

    if !password_matches(&change.current_password, &user.password) {
        return Err(FoodgramError::validation("Invalid password"));
    }

    let password = hash_password(&change.new_password)?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
