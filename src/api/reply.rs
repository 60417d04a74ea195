use std::convert::Infallible;

use serde::Serialize;
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{InvalidQuery, MethodNotAllowed, PayloadTooLarge, Reject, UnsupportedMediaType},
    Rejection, Reply,
};

use crate::error::FoodgramError;

impl Reject for FoodgramError {}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub detail: String,
}

pub fn reject<E: Into<FoodgramError>>(error: E) -> Rejection {
    warp::reject::custom(error.into())
}

pub fn json_with_status<T: Serialize>(value: &T, status: StatusCode) -> impl Reply {
    warp::reply::with_status(warp::reply::json(value), status)
}

pub fn no_content() -> impl Reply {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
}

fn classify(err: &Rejection) -> (StatusCode, String) {
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, "Not found".to_owned());
    }

    if let Some(e) = err.find::<FoodgramError>() {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            log::error!("Request failed: {e}");
            return (status, "Internal server error".to_owned());
        }
        return (status, e.to_string());
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    if let Some(e) = err.find::<InvalidQuery>() {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    if err.find::<PayloadTooLarge>().is_some() {
        return (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_owned());
    }
    if err.find::<UnsupportedMediaType>().is_some() {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type".to_owned(),
        );
    }
    if err.find::<MethodNotAllowed>().is_some() {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned());
    }

    log::error!("Unhandled rejection: {err:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_owned(),
    )
}

/// Turns every rejection into a `{"detail": ...}` JSON reply.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = classify(&err);
    Ok(json_with_status(&ErrorBody { detail }, status))
}
