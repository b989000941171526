use std::borrow::Cow;

use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection,
	},
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::store::StoreError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'e> {
	pub content: Cow<'e, str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'e, str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'e, Map>>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse<'e> {
	pub success: bool,
	pub errors: Vec<Message<'e>>,
}

/// How an error is presented to the client.
///
/// The Display impl is not sent to the client for 5xx errors, so it can
/// contain sensitive detail.
pub trait ErrorShape: std::fmt::Display {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message<'_>>;

	fn response(&self) -> Response<Body> {
		(
			self.status(),
			axum::Json(ErrorResponse {
				success: false,
				errors: self.errors(),
			}),
		)
			.into_response()
	}
}

/// Cross-cutting error type for the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("multipart rejection: {0}")]
	MultipartRejection(#[from] MultipartRejection),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("rate limited: {0}")]
	RateLimit(#[from] tower_governor::GovernorError),
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..)
			| Self::Query(..)
			| Self::Path(..)
			| Self::Multipart(..)
			| Self::MultipartRejection(..) => StatusCode::BAD_REQUEST,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(..) => StatusCode::TOO_MANY_REQUESTS,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| Message {
						content: error.code.clone(),
						field: Some(Cow::Borrowed(field)),
						details: None,
					})
				})
				.collect(),
			// Store failures are logged server side and never shown raw.
			Self::Store(..) => vec![Message {
				content: "internal server error".into(),
				field: None,
				details: None,
			}],
			other => vec![Message {
				content: other.to_string().into(),
				field: None,
				details: None,
			}],
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		if let Self::Store(error) = &self {
			tracing::error!(%error, "store error");
		}

		self.response()
	}
}

/// Error type returned from route handlers, combining route-specific
/// errors with [`AppError`].
#[derive(Debug)]
pub enum RouteError<T> {
	App(AppError),
	Route(T),
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<StoreError> for RouteError<T> {
	fn from(error: StoreError) -> Self {
		Self::App(AppError::Store(error))
	}
}

impl<T> From<MultipartError> for RouteError<T> {
	fn from(error: MultipartError) -> Self {
		Self::App(AppError::Multipart(error))
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => error.response(),
		}
	}
}

impl<T> aide::OperationOutput for RouteError<T> {
	type Inner = ErrorResponse<'static>;
}
