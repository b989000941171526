use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{NewPost, PostFilter, PostPatch, Store, StoreError};
use crate::model::{Category, Post, User};

/// Postgres-backed [`Store`].
pub struct PostgresStore {
	pool: PgPool,
}

impl PostgresStore {
	/// Connects to the database and runs any pending migrations.
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let pool = PgPoolOptions::new().connect(url).await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

#[async_trait]
impl Store for PostgresStore {
	async fn user_by_session(&self, session_id: Uuid) -> Result<Option<User>, StoreError> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}

	async fn user_by_api_key(&self, api_key: Uuid) -> Result<Option<User>, StoreError> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id IN (
					SELECT user_id FROM api_key WHERE id = $1
				)
			"#,
		)
		.bind(api_key)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}

	async fn categories_of(&self, user_id: Uuid) -> Result<Vec<Category>, StoreError> {
		let categories =
			sqlx::query_as::<_, Category>("SELECT * FROM category WHERE user_id = $1")
				.bind(user_id)
				.fetch_all(&self.pool)
				.await?;

		Ok(categories)
	}

	async fn posts(&self, user_id: Uuid, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
		let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM post WHERE user_id = ");

		query.push_bind(user_id);

		if let Some(category_id) = filter.category_id {
			query.push(" AND category_id = ");
			query.push_bind(category_id);
		}

		if let Some(search) = &filter.search {
			query.push(" AND title ILIKE ");
			query.push_bind(format!("%{search}%"));
		}

		query.push(" ORDER BY interaction_date DESC");

		Ok(query.build_query_as().fetch_all(&self.pool).await?)
	}

	async fn post(
		&self,
		user_id: Uuid,
		id: Uuid,
		category_id: Option<Uuid>,
	) -> Result<Option<Post>, StoreError> {
		let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM post WHERE user_id = ");

		query.push_bind(user_id);
		query.push(" AND id = ");
		query.push_bind(id);

		if let Some(category_id) = category_id {
			query.push(" AND category_id = ");
			query.push_bind(category_id);
		}

		Ok(query.build_query_as().fetch_optional(&self.pool).await?)
	}

	async fn create_post(&self, new: NewPost) -> Result<Post, StoreError> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (user_id, category_id, title, description, rating, "count", image)
				VALUES ($1, $2, $3, $4, $5, $6, $7)
				RETURNING *
			"#,
		)
		.bind(new.user_id)
		.bind(new.category_id)
		.bind(new.title)
		.bind(new.description)
		.bind(new.rating)
		.bind(new.count)
		.bind(new.image)
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn update_post(
		&self,
		user_id: Uuid,
		id: Uuid,
		patch: PostPatch,
	) -> Result<Option<Post>, StoreError> {
		let mut query = QueryBuilder::<Postgres>::new("UPDATE post SET interaction_date = now()");

		if let Some(title) = patch.title {
			query.push(", title = ");
			query.push_bind(title);
		}

		if let Some(description) = patch.description {
			query.push(", description = ");
			query.push_bind(description);
		}

		if let Some(rating) = patch.rating {
			query.push(", rating = ");
			query.push_bind(rating);
		}

		if let Some(count) = patch.count {
			query.push(r#", "count" = "#);
			query.push_bind(count);
		}

		if let Some(image) = patch.image {
			query.push(", image = ");
			query.push_bind(image);
		}

		query.push(" WHERE user_id = ");
		query.push_bind(user_id);
		query.push(" AND id = ");
		query.push_bind(id);
		query.push(" RETURNING *");

		Ok(query.build_query_as().fetch_optional(&self.pool).await?)
	}

	async fn delete_post(&self, user_id: Uuid, id: Uuid) -> Result<u64, StoreError> {
		let result = sqlx::query("DELETE FROM post WHERE user_id = $1 AND id = $2")
			.bind(user_id)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}
}
