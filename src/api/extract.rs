//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::UserId;
use crate::error::RewardsError;

/// Header carrying the authenticated user id, set by the upstream
/// authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's identity, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = RewardsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| RewardsError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| RewardsError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;
        let uuid = uuid::Uuid::parse_str(raw.trim())
            .map_err(|_| RewardsError::Unauthorized(format!("{USER_ID_HEADER} is not a UUID")))?;
        Ok(Self(UserId::from_uuid(uuid)))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, RewardsError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request build failed");
        };
        let (mut parts, ()) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_uuid_header() {
        let id = uuid::Uuid::new_v4();
        let Ok(CurrentUser(user)) = extract(Some(&id.to_string())).await else {
            panic!("extraction failed");
        };
        assert_eq!(*user.as_uuid(), id);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthorized() {
        assert!(matches!(extract(None).await, Err(RewardsError::Unauthorized(_))));
        assert!(matches!(
            extract(Some("not-a-uuid")).await,
            Err(RewardsError::Unauthorized(_))
        ));
    }
}
