use warp::{http::StatusCode, Filter, Rejection, Reply};

use crate::{
    actions::{
        fetch_subscriptions, fetch_users, get_subscription_view, get_user_view, login_user,
        register_user, set_password, Relation,
    },
    error::FoodgramError,
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Pagination,
    permissions::ActionType,
    schema::{Credentials, Id, NewUser, PasswordChange},
};

use super::{
    json_body,
    reply::{json_with_status, no_content, reject},
    with_context, AppContext,
};

/// Optional `recipes_limit`, which may not be negative.
fn recipes_limit(form: &Form) -> Result<Option<i64>, FoodgramError> {
    match form.get_number::<i64>("recipes_limit")? {
        Some(limit) if limit < 0 => Err(FoodgramError::validation("Invalid recipes_limit")),
        limit => Ok(limit),
    }
}

async fn user_list(
    data: FormData,
    session: Option<SessionData>,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let pagination = Pagination::from_form(&form).map_err(reject)?;

    let page = fetch_users(session.map(|s| s.user_id), pagination, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&page))
}

async fn user_register(new_user: NewUser, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let user = register_user(&new_user, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(json_with_status(&user, StatusCode::CREATED))
}

async fn user_detail(
    id: Id,
    session: Option<SessionData>,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let user = get_user_view(id, session.map(|s| s.user_id), &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No user exists with specified id")))?;

    Ok(warp::reply::json(&user))
}

async fn user_me(session: SessionData, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let user = get_user_view(session.user_id, Some(session.user_id), &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::Unauthorized))?;

    Ok(warp::reply::json(&user))
}

async fn user_set_password(
    session: SessionData,
    change: PasswordChange,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    set_password(session.user_id, &change, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

async fn subscription_list(
    data: FormData,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let pagination = Pagination::from_form(&form).map_err(reject)?;
    let limit = recipes_limit(&form).map_err(reject)?;

    let page = fetch_subscriptions(session.user_id, limit, pagination, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&page))
}

async fn subscribe(
    author_id: Id,
    data: FormData,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(reject)?;
    let limit = recipes_limit(&Form::from_data(data)).map_err(reject)?;

    Relation::Subscription
        .activate(session.user_id, author_id, &ctx.pool)
        .await
        .map_err(reject)?;

    let author = get_subscription_view(author_id, Some(session.user_id), limit, &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No user exists with specified id")))?;

    Ok(json_with_status(&author, StatusCode::CREATED))
}

async fn unsubscribe(
    author_id: Id,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageOwnSubscriptions)
        .map_err(reject)?;

    Relation::Subscription
        .deactivate(session.user_id, author_id, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

async fn token_login(credentials: Credentials, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let token = login_user(&credentials, &ctx.issuer, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&token))
}

/// Tokens are stateless, so logging out only confirms the caller was signed in.
async fn token_logout(session: SessionData) -> Result<impl Reply, Rejection> {
    log::info!("User {} logged out", session.user_id);
    Ok(no_content())
}

pub fn routes(ctx: AppContext) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_possible_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(user_list);

    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body::<NewUser>())
        .and(with_context(ctx.clone()))
        .and_then(user_register);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(user_me);

    let password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(with_session(ctx.issuer.clone()))
        .and(json_body::<PasswordChange>())
        .and(with_context(ctx.clone()))
        .and_then(user_set_password);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(subscription_list);

    let detail = warp::path!("api" / "users" / Id)
        .and(warp::get())
        .and(with_possible_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(user_detail);

    let follow = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::post())
        .and(warp::query::<FormData>())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(subscribe);

    let unfollow = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(unsubscribe);

    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(json_body::<Credentials>())
        .and(with_context(ctx.clone()))
        .and_then(token_login);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(ctx.issuer))
        .and_then(token_logout);

    list.or(register)
        .or(me)
        .or(password)
        .or(subscriptions)
        .or(detail)
        .or(follow)
        .or(unfollow)
        .or(login)
        .or(logout)
}
