use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{error, info, warn};

use magus_db::models::UserRow;
use magus_types::api::{
    ActionResponse, CreateUserResponse, CreatedUser, DeleteUserQuery, UserListResponse, UserRequest,
};
use magus_types::models::User;

use crate::auth::AppState;
use crate::credentials::{
    MIN_PASSWORD_LEN, hash_password, normalize_email, normalize_password, password_too_short,
    required,
};
use crate::error::ApiError;

/// Validated `{email, password}` pair from a create or reset body.
fn validated(req: UserRequest) -> Result<(String, String), ApiError> {
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    };

    let password = normalize_password(&password).to_string();
    if password_too_short(&password) {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    Ok((normalize_email(&email), password))
}

fn parse_timestamp(raw: &str, email: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use its "YYYY-MM-DD HH:MM:SS" form.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on user '{}': {}", raw, email, e);
            DateTime::default()
        })
}

fn to_user(row: UserRow) -> User {
    User {
        created_at: parse_timestamp(&row.created_at, &row.email),
        updated_at: row.updated_at.as_deref().map(|t| parse_timestamp(t, &row.email)),
        email: row.email,
    }
}

/// GET /api/users — every user, without password hashes.
pub async fn list(State(state): State<AppState>) -> Response {
    let db = state.db.clone();
    match crate::blocking(move || db.list_users()).await {
        Ok(rows) => Json(UserListResponse {
            users: rows.into_iter().map(to_user).collect(),
            error: None,
        })
        .into_response(),
        Err(e) => {
            error!("Error fetching users: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UserListResponse {
                    users: vec![],
                    error: Some("Credential store unavailable".into()),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/users — create a user.
pub async fn create(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UserRequest>, ApiError>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let (email, password) = validated(req)?;
    let failed = |e: anyhow::Error| {
        error!("Error creating user {}: {}", email, e);
        ApiError::Internal(format!("Failed to create user: {}", e))
    };

    // Check first so the common duplicate case skips the hash.
    let db = state.db.clone();
    let key = email.clone();
    let exists = crate::blocking(move || Ok(db.get_user(&key)?.is_some()))
        .await
        .map_err(failed)?;
    if exists {
        info!("User {} already exists", email);
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let db = state.db.clone();
    let key = email.clone();
    let created = crate::blocking(move || {
        let hash = hash_password(&password)?;
        db.create_user(&key, &hash, &Utc::now().to_rfc3339())
    })
    .await
    .map_err(failed)?;

    // Lost a race with a concurrent create for the same email.
    if !created {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    info!("Created user {}", email);
    Ok(Json(CreateUserResponse {
        success: true,
        user: CreatedUser { email },
    }))
}

/// PUT /api/users — reset a user's password.
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UserRequest>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let (email, password) = validated(req)?;
    let failed = |e: anyhow::Error| {
        error!("Error resetting password for {}: {}", email, e);
        ApiError::Internal(format!("Failed to reset password: {}", e))
    };

    let db = state.db.clone();
    let key = email.clone();
    let exists = crate::blocking(move || Ok(db.get_user(&key)?.is_some()))
        .await
        .map_err(failed)?;
    if !exists {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let db = state.db.clone();
    let key = email.clone();
    let updated = crate::blocking(move || {
        let hash = hash_password(&password)?;
        db.update_password(&key, &hash, &Utc::now().to_rfc3339())
    })
    .await
    .map_err(failed)?;

    if !updated {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!("Password reset for {}", email);
    Ok(Json(ActionResponse {
        success: true,
        message: "Password reset successfully".into(),
    }))
}

/// DELETE /api/users?email= — remove a user. Deleting an absent user
/// still reports success.
pub async fn delete(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DeleteUserQuery>, ApiError>,
) -> Result<Json<ActionResponse>, ApiError> {
    let email = required(query.email)
        .map(|e| normalize_email(&e))
        .ok_or_else(|| ApiError::BadRequest("Email is required".into()))?;

    let db = state.db.clone();
    let key = email.clone();
    let existed = crate::blocking(move || db.delete_user(&key)).await.map_err(|e| {
        error!("Error deleting user {}: {}", email, e);
        ApiError::Internal(format!("Failed to delete user: {}", e))
    })?;

    if existed {
        info!("Deleted user {}", email);
    } else {
        info!("Delete requested for unknown user {}", email);
    }

    Ok(Json(ActionResponse {
        success: true,
        message: "User deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_normalizes_and_checks_length() {
        let (email, password) = validated(UserRequest {
            email: Some("  Ada@Example.com ".into()),
            password: Some("  secret1  ".into()),
        })
        .unwrap();
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "secret1");

        let short = validated(UserRequest {
            email: Some("ada@example.com".into()),
            password: Some(" 12345 ".into()),
        });
        assert_eq!(
            short.unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );

        let missing = validated(UserRequest {
            email: None,
            password: Some("secret1".into()),
        });
        assert_eq!(missing.unwrap_err().to_string(), "Email and password are required");
    }

    #[test]
    fn timestamps_from_either_format() {
        let rfc = parse_timestamp("2025-03-04T05:06:07+00:00", "a");
        let sqlite = parse_timestamp("2025-03-04 05:06:07", "a");
        assert_eq!(rfc, sqlite);
        assert_eq!(parse_timestamp("garbage", "a"), DateTime::<Utc>::default());
    }

    #[test]
    fn rows_map_without_hash() {
        let user = to_user(UserRow {
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: None,
        });
        let body = serde_json::to_value(&user).unwrap();
        assert_eq!(body["email"], "ada@example.com");
        assert!(body.get("createdAt").is_some());
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("updatedAt").is_none());
    }
}
