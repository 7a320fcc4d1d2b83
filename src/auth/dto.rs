use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form, Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

/// Typed registration request, assembled from the multipart payload in a
/// single validation stage.
#[derive(Debug)]
pub struct RegisterForm {
    pub dog_name: String,
    pub email: String,
    pub password: String,
    pub birthdate: String,
    pub description: String,
    pub image: UploadedFile,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Bytes,
}

impl RegisterForm {
    /// Collect the fixed multipart fields. Any missing or empty field,
    /// including the `dogImage` file, is a validation failure.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut dog_name = None;
        let mut email = None;
        let mut password = None;
        let mut birthdate = None;
        let mut description = None;
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "dogName" => dog_name = Some(field.text().await?),
                "email" => email = Some(field.text().await?),
                "password" => password = Some(field.text().await?),
                "birthdate" => birthdate = Some(field.text().await?),
                "description" => description = Some(field.text().await?),
                "dogImage" => {
                    let original_name = field
                        .file_name()
                        .unwrap_or("upload")
                        .to_string();
                    let bytes = field.bytes().await?;
                    image = Some(UploadedFile {
                        original_name,
                        bytes,
                    });
                }
                // Unknown parts are drained and ignored.
                _ => {
                    field.bytes().await?;
                }
            }
        }

        Ok(Self {
            dog_name: required(dog_name)?,
            email: required(email)?,
            password: required(password)?,
            birthdate: required(birthdate)?,
            description: required(description)?,
            image: image.ok_or(ApiError::MissingFields)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    email: Option<String>,
    password: Option<String>,
}

/// Login body extractor accepting either JSON or urlencoded form data,
/// dispatched on the Content-Type header.
pub struct LoginBody(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        let params = if is_json {
            let Json(params) = Json::<LoginParams>::from_request(req, state)
                .await
                .map_err(|_| ApiError::MalformedBody)?;
            params
        } else {
            let Form(params) = Form::<LoginParams>::from_request(req, state)
                .await
                .map_err(|_| ApiError::MalformedBody)?;
            params
        };

        Ok(LoginBody(LoginRequest {
            email: required(params.email)?,
            password: required(params.password)?,
        }))
    }
}

fn required(value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::MissingFields),
    }
}

/// Response returned by both register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: PublicUser,
}

/// Client-facing view of a user record; the password hash never appears.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub dog_name: String,
    pub email: String,
    pub birthdate: Date,
    pub description: String,
    pub image_path: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            dog_name: user.dog_name,
            email: user.email,
            birthdate: user.birthdate,
            description: user.description,
            image_path: user.image_path,
        }
    }
}
