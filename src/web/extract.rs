use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use std::convert::Infallible;
use std::sync::Arc;

use crate::web::error::AppError;
use crate::web::presenter::ResourceUrls;
use crate::web::AppState;

const FALLBACK_HOST: &str = "localhost";

/// JSON body extractor whose rejections render as [`AppError`] bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl FromRequestParts<Arc<AppState>> for ResourceUrls {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let config = &state.config;
        let host = config
            .public_host
            .clone()
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| FALLBACK_HOST.to_string());

        Ok(ResourceUrls::new(config.public_scheme.clone(), host))
    }
}

/// Parses a path identity. Anything that is not an integer can never match a
/// stored row, so callers map `None` to their not-found error.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

pub fn todo_id(raw: &str) -> Result<i32, AppError> {
    parse_id(raw).ok_or_else(|| AppError::todo_not_found(raw))
}

pub fn tag_id(raw: &str) -> Result<i32, AppError> {
    parse_id(raw).ok_or_else(|| AppError::tag_not_found(raw))
}
