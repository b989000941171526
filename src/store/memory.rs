use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewPost, PostFilter, PostPatch, Store, StoreError};
use crate::model::{Category, Post, User};

#[derive(Default)]
struct Inner {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Uuid>,
	api_keys: HashMap<Uuid, Uuid>,
	categories: Vec<Category>,
	posts: Vec<Post>,
}

/// In-memory [`Store`], used as a fallback when no database is
/// configured and as the backing store for the test suite.
///
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[cfg(test)]
impl MemoryStore {
	pub async fn seed_user(&self, username: &str) -> User {
		let user = User {
			id: Uuid::new_v4(),
			email: format!("{username}@example.com"),
			username: username.to_owned(),
			created_at: Utc::now(),
		};

		self.inner
			.write()
			.await
			.users
			.insert(user.id, user.clone());

		user
	}

	pub async fn seed_category(&self, user_id: Uuid, title: &str) -> Category {
		let category = Category {
			id: Uuid::new_v4(),
			user_id,
			title: title.to_owned(),
		};

		self.inner.write().await.categories.push(category.clone());
		category
	}

	pub async fn seed_session(&self, user_id: Uuid) -> Uuid {
		let id = Uuid::new_v4();

		self.inner.write().await.sessions.insert(id, user_id);
		id
	}

	pub async fn seed_api_key(&self, user_id: Uuid) -> Uuid {
		let id = Uuid::new_v4();

		self.inner.write().await.api_keys.insert(id, user_id);
		id
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn user_by_session(&self, session_id: Uuid) -> Result<Option<User>, StoreError> {
		let inner = self.inner.read().await;

		Ok(inner
			.sessions
			.get(&session_id)
			.and_then(|user_id| inner.users.get(user_id))
			.cloned())
	}

	async fn user_by_api_key(&self, api_key: Uuid) -> Result<Option<User>, StoreError> {
		let inner = self.inner.read().await;

		Ok(inner
			.api_keys
			.get(&api_key)
			.and_then(|user_id| inner.users.get(user_id))
			.cloned())
	}

	async fn categories_of(&self, user_id: Uuid) -> Result<Vec<Category>, StoreError> {
		let inner = self.inner.read().await;

		Ok(inner
			.categories
			.iter()
			.filter(|category| category.user_id == user_id)
			.cloned()
			.collect())
	}

	async fn posts(&self, user_id: Uuid, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
		let inner = self.inner.read().await;
		let search = filter.search.as_deref().map(str::to_lowercase);

		let mut posts = inner
			.posts
			.iter()
			.filter(|post| post.user_id == user_id)
			.filter(|post| {
				filter
					.category_id
					.map_or(true, |category_id| post.category_id == category_id)
			})
			.filter(|post| {
				search
					.as_deref()
					.map_or(true, |search| post.title.to_lowercase().contains(search))
			})
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.interaction_date.cmp(&a.interaction_date));

		Ok(posts)
	}

	async fn post(
		&self,
		user_id: Uuid,
		id: Uuid,
		category_id: Option<Uuid>,
	) -> Result<Option<Post>, StoreError> {
		let inner = self.inner.read().await;

		Ok(inner
			.posts
			.iter()
			.find(|post| {
				post.user_id == user_id
					&& post.id == id
					&& category_id.map_or(true, |category_id| post.category_id == category_id)
			})
			.cloned())
	}

	async fn create_post(&self, new: NewPost) -> Result<Post, StoreError> {
		let post = Post {
			id: Uuid::new_v4(),
			user_id: new.user_id,
			category_id: new.category_id,
			title: new.title,
			description: new.description,
			rating: new.rating,
			count: new.count,
			image: new.image,
			interaction_date: Utc::now(),
		};

		self.inner.write().await.posts.push(post.clone());

		Ok(post)
	}

	async fn update_post(
		&self,
		user_id: Uuid,
		id: Uuid,
		patch: PostPatch,
	) -> Result<Option<Post>, StoreError> {
		let mut inner = self.inner.write().await;

		let Some(post) = inner
			.posts
			.iter_mut()
			.find(|post| post.user_id == user_id && post.id == id)
		else {
			return Ok(None);
		};

		if let Some(title) = patch.title {
			post.title = title;
		}

		if let Some(description) = patch.description {
			post.description = description;
		}

		if let Some(rating) = patch.rating {
			post.rating = rating;
		}

		if let Some(count) = patch.count {
			post.count = count;
		}

		if let Some(image) = patch.image {
			post.image = image;
		}

		post.interaction_date = Utc::now();

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
		let mut inner = self.inner.write().await;
		let before = inner.posts.len();

		inner
			.posts
			.retain(|post| !(post.user_id == user_id && post.id == id));

		Ok((before - inner.posts.len()) as u64)
	}
}
