use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

// Authenticated principal attached to each request by the upstream identity
// service. Credentials are verified there, not here; this extractor only
// reads the forwarded identity headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_string();

        let role = match parts
            .headers
            .get("x-user-role")
            .and_then(|value| value.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::User,
        };

        Ok(AuthUser { user_id, role })
    }
}
