//! Request body extractor accepting JSON, URL-encoded and multipart bodies
//!
//! Handlers validate a single JSON object regardless of how the client sent
//! it. Multipart file parts are kept aside as [`UploadedFile`]s.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, Method},
    Form,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use super::error::ApiError;

/// A file part from a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct RequestInput {
    fields: Map<String, Value>,
    files: Vec<UploadedFile>,
}

impl RequestInput {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// All non-file fields as a JSON object, the shape rule tables check
    pub fn values(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == field)
    }

    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(idx))
    }

    /// Method named by an HTML form's `_method` field
    pub fn method_override(&self) -> Option<Method> {
        self.fields
            .get("_method")
            .and_then(Value::as_str)
            .and_then(|m| Method::from_bytes(m.trim().to_uppercase().as_bytes()).ok())
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                warn!(error = %e, "Rejected multipart body");
                ApiError::BadRequest("Malformed multipart body".to_string())
            })?;
            return read_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form): Form<HashMap<String, String>> = Form::from_request(req, state)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Rejected form body");
                    ApiError::BadRequest("Malformed form body".to_string())
                })?;
            let fields = form
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            return Ok(Self::from_fields(fields));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "Failed to read request body");
            ApiError::BadRequest("Unreadable request body".to_string())
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(fields)) => Ok(Self::from_fields(fields)),
            Ok(_) => Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, "Rejected malformed JSON body");
                Err(ApiError::BadRequest("Malformed JSON body".to_string()))
            }
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RequestInput, ApiError> {
    let mut input = RequestInput::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read multipart field");
                return Err(ApiError::BadRequest("Malformed multipart body".to_string()));
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        match file_name {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(|e| {
                    warn!(error = %e, field = %name, "Failed to read uploaded file");
                    ApiError::BadRequest("Failed to read uploaded file".to_string())
                })?;

                // Browsers submit an empty part for an untouched file input
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                input.files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            }
            None => {
                let text = field.text().await.map_err(|e| {
                    warn!(error = %e, field = %name, "Failed to read multipart text field");
                    ApiError::BadRequest("Malformed multipart body".to_string())
                })?;
                input.fields.insert(name, Value::String(text));
            }
        }
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(content_type: &str, body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_object_body() {
        let input = RequestInput::from_request(
            request("application/json", r#"{"name":"Lamp","price":12}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(input.values()["name"], "Lamp");
        assert_eq!(input.values()["price"], 12);
    }

    #[tokio::test]
    async fn test_json_array_body_is_rejected() {
        let result = RequestInput::from_request(request("application/json", "[1,2]"), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let result = RequestInput::from_request(request("application/json", "{oops"), &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_object() {
        let input = RequestInput::from_request(request("application/json", ""), &())
            .await
            .unwrap();
        assert_eq!(input.values(), Value::Object(Map::new()));
    }

    #[tokio::test]
    async fn test_form_body_and_method_override() {
        let input = RequestInput::from_request(
            request(
                "application/x-www-form-urlencoded",
                "name=Desk+Lamp&price=10&_method=delete",
            ),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(input.values()["name"], "Desk Lamp");
        assert_eq!(input.method_override(), Some(Method::DELETE));
    }

    #[tokio::test]
    async fn test_multipart_separates_files() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"name\"\r\n\r\n",
            "Lamp\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"photo\"; filename=\"lamp.png\"\r\n",
            "Content-Type: image/png\r\n\r\n",
            "PNGDATA\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"manual\"; filename=\"\"\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "\r\n",
            "--XBOUNDARY--\r\n",
        );
        let input = RequestInput::from_request(
            request("multipart/form-data; boundary=XBOUNDARY", body),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(input.values()["name"], "Lamp");
        let photo = input.file("photo").unwrap();
        assert_eq!(photo.file_name, "lamp.png");
        assert_eq!(&photo.bytes[..], b"PNGDATA");
        assert!(input.file("manual").is_none());
    }
}
