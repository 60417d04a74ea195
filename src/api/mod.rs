use std::convert::Infallible;

use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{Filter, Rejection, Reply};

use crate::jwt::TokenIssuer;

mod recipes;
mod reference;
pub mod reply;
mod users;

const MAX_BODY_SIZE: u64 = 1024 * 1024;

/// Shared request state: the store pool and the token issuer.
#[derive(Clone)]
pub struct AppContext {
    pub pool: Pool<Postgres>,
    pub issuer: TokenIssuer,
}

impl AppContext {
    pub fn new(pool: Pool<Postgres>, issuer: TokenIssuer) -> Self {
        Self { pool, issuer }
    }
}

fn with_context(ctx: AppContext) -> impl Filter<Extract = (AppContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

/// Every endpoint under `/api`, with rejections rendered as JSON errors.
pub fn routes(ctx: AppContext) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    reference::routes(ctx.clone())
        .or(recipes::routes(ctx.clone()))
        .or(users::routes(ctx))
        .recover(reply::handle_rejection)
        .with(warp::log("foodgram_sdk::api"))
}
