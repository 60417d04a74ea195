use warp::{reject::Rejection, Filter};

use crate::{constants::TOKEN_PREFIX, error::FoodgramError};

use super::jwt::{SessionData, TokenIssuer};

fn session_from_header(issuer: &TokenIssuer, header: &str) -> Result<SessionData, FoodgramError> {
    let token = header
        .strip_prefix(TOKEN_PREFIX)
        .or_else(|| header.strip_prefix("Bearer "))
        .ok_or(FoodgramError::Unauthorized)?;

    issuer.verify(token.trim()).map(SessionData::from)
}

/// Anonymous callers resolve to `None`; a malformed or expired token is rejected.
pub fn with_possible_session(
    issuer: TokenIssuer,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let issuer = issuer.clone();
        async move {
            match header {
                Some(header) => session_from_header(&issuer, &header)
                    .map(Some)
                    .map_err(warp::reject::custom),
                None => Ok(None),
            }
        }
    })
}

pub fn with_session(
    issuer: TokenIssuer,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(issuer).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| warp::reject::custom(FoodgramError::Unauthorized))
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::schema::{User, UserRole};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"middleware-secret", Duration::hours(1)).unwrap()
    }

    fn token(issuer: &TokenIssuer) -> String {
        issuer
            .issue(&User {
                id: 3,
                email: "a@b.c".to_owned(),
                username: "a".to_owned(),
                first_name: "A".to_owned(),
                last_name: "B".to_owned(),
                password: String::new(),
                role: UserRole::User,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let session = warp::test::request()
            .filter(&with_possible_session(issuer()))
            .await
            .unwrap();
        assert_eq!(session, None);
    }

    #[tokio::test]
    async fn token_header_resolves_actor() {
        let issuer = issuer();
        let session = warp::test::request()
            .header("authorization", format!("Token {}", token(&issuer)))
            .filter(&with_session(issuer))
            .await
            .unwrap();
        assert_eq!(session.user_id, 3);
        assert!(!session.is_admin);
    }

    #[tokio::test]
    async fn required_session_rejects_anonymous_callers() {
        let result = warp::test::request()
            .filter(&with_session(issuer()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let result = warp::test::request()
            .header("authorization", "Token nonsense")
            .filter(&with_possible_session(issuer()))
            .await;
        assert!(result.is_err());
    }
}
