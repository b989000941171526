pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{Category, Post, User};

/// Error produced by [`Store`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Filters applied to a post listing, always combined with the acting
/// user's id.
#[derive(Debug, Default)]
pub struct PostFilter {
	pub category_id: Option<Uuid>,
	/// Case-insensitive substring match on the title.
	pub search: Option<String>,
}

/// Field values for a new post, after defaults have been applied.
#[derive(Debug)]
pub struct NewPost {
	pub user_id: Uuid,
	pub category_id: Uuid,
	pub title: String,
	pub description: String,
	pub rating: i32,
	pub count: i32,
	pub image: String,
}

/// Partial update for a post.
///
/// `None` means "leave the field alone"; any `Some` value, including
/// zero or an empty string, is applied.
#[derive(Debug, Default)]
pub struct PostPatch {
	pub title: Option<String>,
	pub description: Option<String>,
	pub rating: Option<i32>,
	pub count: Option<i32>,
	pub image: Option<String>,
}

impl PostPatch {
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.description.is_none()
			&& self.rating.is_none()
			&& self.count.is_none()
			&& self.image.is_none()
	}
}

/// Persistence port for the service.
///
/// Handlers only see this trait; the Postgres implementation backs the
/// real service and the in-memory implementation backs the test suite.
#[async_trait]
pub trait Store: Send + Sync {
	async fn user_by_session(&self, session_id: Uuid) -> Result<Option<User>, StoreError>;
	async fn user_by_api_key(&self, api_key: Uuid) -> Result<Option<User>, StoreError>;

	async fn categories_of(&self, user_id: Uuid) -> Result<Vec<Category>, StoreError>;

	/// Posts owned by `user_id` matching `filter`, newest interaction
	/// first.
	async fn posts(&self, user_id: Uuid, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;

	async fn post(
		&self,
		user_id: Uuid,
		id: Uuid,
		category_id: Option<Uuid>,
	) -> Result<Option<Post>, StoreError>;

	async fn create_post(&self, new: NewPost) -> Result<Post, StoreError>;

	/// Applies `patch` and stamps `interaction_date`, returning the
	/// updated post. `None` when no post matched the user and id.
	async fn update_post(
		&self,
		user_id: Uuid,
		id: Uuid,
		patch: PostPatch,
	) -> Result<Option<Post>, StoreError>;

	/// Returns the number of rows removed.
	async fn delete_post(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError>;
}
