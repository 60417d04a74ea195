use warp::{http::StatusCode, Filter, Rejection, Reply};

use crate::{
    actions::{
        aggregate_shopping_list, create_recipe, delete_recipe, fetch_recipes, get_recipe_mut,
        get_recipe_short, get_recipe_view, render_shopping_list, replace_recipe, Relation,
    },
    constants::SHOPPING_LIST_FILENAME,
    error::FoodgramError,
    filters::RecipeFilter,
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Pagination,
    permissions::ActionType,
    schema::{Id, RecipeDraft, RecipeView},
};

use super::{
    json_body,
    reply::{json_with_status, no_content, reject},
    with_context, AppContext,
};

async fn load_view(id: Id, viewer: Option<Id>, ctx: &AppContext) -> Result<RecipeView, Rejection> {
    get_recipe_view(id, viewer, &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No recipe exists with specified id")))
}

async fn recipe_list(
    data: FormData,
    session: Option<SessionData>,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let pagination = Pagination::from_form(&form).map_err(reject)?;
    let filter = RecipeFilter::from_form(&form).map_err(reject)?;
    let viewer = session.map(|s| s.user_id);

    let page = fetch_recipes(&filter, viewer, pagination, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&page))
}

async fn recipe_detail(
    id: Id,
    session: Option<SessionData>,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    let view = load_view(id, session.map(|s| s.user_id), &ctx).await?;
    Ok(warp::reply::json(&view))
}

async fn recipe_create(
    session: SessionData,
    draft: RecipeDraft,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::CreateRecipes)
        .map_err(reject)?;

    let id = create_recipe(session.user_id, &draft, &ctx.pool)
        .await
        .map_err(reject)?;
    let view = load_view(id, Some(session.user_id), &ctx).await?;

    Ok(json_with_status(&view, StatusCode::CREATED))
}

async fn recipe_update(
    id: Id,
    session: SessionData,
    draft: RecipeDraft,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    get_recipe_mut(id, &session, &ctx.pool)
        .await
        .map_err(reject)?;

    replace_recipe(id, &draft, &ctx.pool)
        .await
        .map_err(reject)?;
    let view = load_view(id, Some(session.user_id), &ctx).await?;

    Ok(warp::reply::json(&view))
}

async fn recipe_delete(
    id: Id,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    get_recipe_mut(id, &session, &ctx.pool)
        .await
        .map_err(reject)?;
    delete_recipe(id, &ctx.pool).await.map_err(reject)?;

    Ok(no_content())
}

fn relation_action(relation: Relation) -> ActionType {
    match relation {
        Relation::ShoppingCart => ActionType::ManageOwnShoppingCart,
        _ => ActionType::ManageOwnFavorites,
    }
}

async fn relation_add(
    id: Id,
    relation: Relation,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(relation_action(relation))
        .map_err(reject)?;

    relation
        .activate(session.user_id, id, &ctx.pool)
        .await
        .map_err(reject)?;

    let recipe = get_recipe_short(id, &ctx.pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(FoodgramError::not_found("No recipe exists with specified id")))?;

    Ok(json_with_status(&recipe, StatusCode::CREATED))
}

async fn relation_remove(
    id: Id,
    relation: Relation,
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(relation_action(relation))
        .map_err(reject)?;

    relation
        .deactivate(session.user_id, id, &ctx.pool)
        .await
        .map_err(reject)?;

    Ok(no_content())
}

async fn shopping_list_download(
    session: SessionData,
    ctx: AppContext,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageOwnShoppingCart)
        .map_err(reject)?;

    let items = aggregate_shopping_list(session.user_id, &ctx.pool)
        .await
        .map_err(reject)?;

    let reply = warp::reply::with_header(
        render_shopping_list(&items),
        "content-type",
        "text/plain; charset=utf-8",
    );
    Ok(warp::reply::with_header(
        reply,
        "content-disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    ))
}

fn relation_routes(
    path: impl Filter<Extract = (Id,), Error = Rejection> + Clone + Send + Sync + 'static,
    relation: Relation,
    ctx: AppContext,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let target = path.map(move |id: Id| (id, relation)).untuple_one();

    let add = target
        .clone()
        .and(warp::post())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(relation_add);

    let remove = target
        .and(warp::delete())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx))
        .and_then(relation_remove);

    add.or(remove)
}

pub fn routes(ctx: AppContext) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<FormData>())
        .and(with_possible_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(recipe_list);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session(ctx.issuer.clone()))
        .and(json_body::<RecipeDraft>())
        .and(with_context(ctx.clone()))
        .and_then(recipe_create);

    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(shopping_list_download);

    let detail = warp::path!("api" / "recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(recipe_detail);

    let update = warp::path!("api" / "recipes" / Id)
        .and(warp::patch())
        .and(with_session(ctx.issuer.clone()))
        .and(json_body::<RecipeDraft>())
        .and(with_context(ctx.clone()))
        .and_then(recipe_update);

    let delete = warp::path!("api" / "recipes" / Id)
        .and(warp::delete())
        .and(with_session(ctx.issuer.clone()))
        .and(with_context(ctx.clone()))
        .and_then(recipe_delete);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
        .or(relation_routes(
            warp::path!("api" / "recipes" / Id / "favorite"),
            Relation::Favorite,
            ctx.clone(),
        ))
        .or(relation_routes(
            warp::path!("api" / "recipes" / Id / "shopping_cart"),
            Relation::ShoppingCart,
            ctx,
        ))
}
