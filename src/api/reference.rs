use warp::{Filter, Rejection, Reply};

use crate::{
    actions::{get_ingredient, get_tag, list_ingredients, list_tags},
    error::FoodgramError,
    form::{Form, FormData},
    schema::Id,
};

use super::{reply::reject, with_context, AppContext};

async fn ingredient_list(data: FormData, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let list = list_ingredients(form.get_str("name"), &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&list))
}

async fn ingredient_detail(id: Id, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let ingredient = get_ingredient(id, &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No ingredient exists with specified id")))?;

    Ok(warp::reply::json(&ingredient))
}

async fn tag_list(ctx: AppContext) -> Result<impl Reply, Rejection> {
    let list = list_tags(&ctx.pool).await.map_err(reject)?;
    Ok(warp::reply::json(&list))
}

async fn tag_detail(id: Id, ctx: AppContext) -> Result<impl Reply, Rejection> {
    let tag = get_tag(id, &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No tag exists with specified id")))?;

    Ok(warp::reply::json(&tag))
}

pub fn routes(ctx: AppContext) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_context(ctx.clone()))
        .and_then(ingredient_list);

    let ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(ingredient_detail);

    let tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(tag_list);

    let tag = warp::path!("api" / "tags" / Id)
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(tag_detail);

    ingredients.or(ingredient).or(tags).or(tag)
}
