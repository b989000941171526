use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request, StatusCode},
};
use uuid::Uuid;

use crate::{
	error::{ErrorShape, Message, RouteError},
	model,
	openapi::{SECURITY_SCHEME_API_KEY, SECURITY_SCHEME_SESSION},
	session, SharedStore,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// An error that can occur while resolving the acting user.
///
/// The messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("no session cookie or api key")]
	NoSessionCookieOrApiKey,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("invalid api key")]
	InvalidApiKey,
}

impl ErrorShape for AuthError {
	fn status(&self) -> StatusCode {
		StatusCode::UNAUTHORIZED
	}

	fn errors(&self) -> Vec<Message<'_>> {
		vec![Message {
			content: self.to_string().into(),
			field: None,
			details: None,
		}]
	}
}

impl From<AuthError> for RouteError<AuthError> {
	fn from(error: AuthError) -> Self {
		Self::Route(error)
	}
}

/// Extracts the acting user from the request, via the session cookie or
/// an `Authorization: Bearer` api key.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	SharedStore: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<AuthError>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let store = SharedStore::from_ref(state);

		let user = if let Some(authorization) = parts.headers.get(header::AUTHORIZATION) {
			let api_key = authorization
				.to_str()
				.ok()
				.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
				.and_then(|key| Uuid::parse_str(key).ok())
				.ok_or(AuthError::InvalidApiKey)?;

			store
				.user_by_api_key(api_key)
				.await?
				.ok_or(AuthError::InvalidApiKey)?
		} else {
			let cookies = parts
				.headers
				.get_all(header::COOKIE)
				.into_iter()
				.filter_map(|value| value.to_str().ok());

			let session_id = cookies
				.flat_map(cookie::Cookie::split_parse)
				.filter_map(Result::ok)
				.find(|cookie| cookie.name() == session::COOKIE_NAME)
				.ok_or(AuthError::NoSessionCookieOrApiKey)?;

			let session_id = Uuid::parse_str(session_id.value())
				.map_err(|_| AuthError::InvalidSessionCookie)?;

			store
				.user_by_session(session_id)
				.await?
				.ok_or(AuthError::InvalidSessionCookie)?
		};

		Ok(Self { user })
	}
}

impl OperationInput for Session {
	/// Adds the session and api key security requirements to the
	/// operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_API_KEY.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}
