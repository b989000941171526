use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single post, owned by a user and attached to one of their
/// categories.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Post {
	pub id: Uuid,
	pub user_id: Uuid,
	pub category_id: Uuid,
	pub title: String,
	pub description: String,
	pub rating: i32,
	pub count: i32,
	/// Path of the attached image, relative to the public root. Empty when
	/// the post has no image.
	pub image: String,
	/// Freshness sort key, refreshed on every successful update.
	pub interaction_date: DateTime<Utc>,
}

/// A model representing a single user.
///
/// The acting identity is always resolved server side from the session
/// cookie or api key, never taken from client input.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: Uuid,
	pub email: String,
	pub username: String,
	pub created_at: DateTime<Utc>,
}

/// A user-owned grouping that posts reference.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
	pub id: Uuid,
	pub user_id: Uuid,
	pub title: String,
}
