//! Request extractors whose rejections use the JSON error format.
//!
//! axum's own `Json`, `Path` and `Query` answer bad input with plain text and
//! their own status codes. These wrappers route every rejection through
//! [`AppError::InvalidInput`], so a malformed request is always a 400 with the
//! standard `{"error": {...}}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
