use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::entities::user::{self, Entity as UserEntity};
use crate::error::ApiError;

//ROUTERS
pub fn user_router() -> Router {
    Router::new()
        .route("/users", get(get_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

//ROUTES
async fn get_users(Extension(db): Extension<Arc<DatabaseConnection>>) -> Result<Response, ApiError> {
    let users = UserEntity::find()
        .order_by_asc(user::Column::Id)
        .all(&*db)
        .await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok((StatusCode::OK, Json(users)).into_response())
}

async fn get_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let user = UserEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))).into_response())
}

async fn create_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UserPayload>,
) -> Result<Response, ApiError> {
    let email = payload.validated_email()?;
    let password = payload
        .password
        .as_deref()
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::Validation("email and password required".to_owned()))?;
    let password_hash = hash_password(password)?;

    let new_user = user::ActiveModel {
        email: Set(email),
        phone: Set(payload.phone),
        address_line1: Set(payload.address_line1),
        address_line2: Set(payload.address_line2),
        city: Set(payload.city),
        postcode: Set(payload.postcode),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_user.insert(&*db).await.map_err(map_unique_violation)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))).into_response())
}

async fn update_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UserPayload>,
) -> Result<Response, ApiError> {
    let email = payload.validated_email()?;

    let existing = UserEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    let mut active: user::ActiveModel = existing.into();
    active.email = Set(email);
    active.phone = Set(payload.phone);
    active.address_line1 = Set(payload.address_line1);
    active.address_line2 = Set(payload.address_line2);
    active.city = Set(payload.city);
    active.postcode = Set(payload.postcode);
    // Password is optional on update: omitted means the stored hash stays.
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password(password)?);
    }
    let updated = active.update(&*db).await.map_err(map_unique_violation)?;

    Ok((StatusCode::OK, Json(UserResponse::from(updated))).into_response())
}

async fn delete_user(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let user = UserEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    user::ActiveModel::from(user.clone()).delete(&*db).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "id": user.id,
            "email": user.email
        })),
    )
        .into_response())
}

//Helpers
fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::PasswordHash(err.to_string()))
}

fn map_unique_violation(err: DbErr) -> ApiError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ApiError::Conflict("Email already in use".to_owned())
        }
        _ => ApiError::Db(err),
    }
}

//Structs
#[derive(Deserialize, Clone, Debug)]
struct UserPayload {
    email: Option<String>,
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    postcode: Option<String>,
    password: Option<String>,
}

impl UserPayload {
    fn validated_email(&self) -> Result<String, ApiError> {
        let email = match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => email.to_owned(),
            _ => return Err(ApiError::Validation("email is required".to_owned())),
        };
        if !email.validate_email() {
            return Err(ApiError::Validation("email is invalid".to_owned()));
        }
        Ok(email)
    }
}

#[derive(Serialize)]
struct UserResponse {
    id: i32,
    email: String,
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    postcode: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(value: user::Model) -> UserResponse {
        UserResponse {
            id: value.id,
            email: value.email,
            phone: value.phone,
            address_line1: value.address_line1,
            address_line2: value.address_line2,
            city: value.city,
            postcode: value.postcode,
            created_at: value.created_at,
        }
    }
}
