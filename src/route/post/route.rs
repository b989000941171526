use aide::transform::TransformOperation;
use axum::extract::State;

use crate::{
	extract::{Json, Multipart, Path, Query, Session},
	openapi::tag,
	store::{NewPost, PostFilter, PostPatch},
	AppState,
};

use super::{model, Error, RouteError};

/// Returns the authenticated user's posts, most recently interacted
/// first, optionally narrowed to a category or a title search.
pub async fn get_posts(
	State(state): State<AppState>,
	session: Session,
	Query(query): Query<model::ListPostsQuery>,
) -> Result<Json<model::PostList>, RouteError> {
	let filter = PostFilter {
		category_id: query.category_id,
		search: query.search.filter(|search| !search.is_empty()),
	};

	let posts = state.store.posts(session.user.id, &filter).await?;

	Ok(Json(model::PostList { posts }))
}

pub fn get_posts_docs(op: TransformOperation) -> TransformOperation {
	op.summary("List posts")
		.description("Returns the authenticated user's posts, most recently interacted first.")
		.tag(tag::POST)
}

/// Returns a single post by its unique id, or `null` when no post
/// matches the user, id and optional category filter.
pub async fn get_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::IdPath>,
	Query(query): Query<model::GetPostQuery>,
) -> Result<Json<Option<model::Post>>, RouteError> {
	let post = state
		.store
		.post(session.user.id, path.id, query.category)
		.await?;

	Ok(Json(post))
}

pub fn get_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Get a single post")
		.description("Returns a single post by its unique id, or null when no post matches.")
		.tag(tag::POST)
}

/// Creates a post from a `multipart/form-data` body, attaching the
/// first uploaded file as its image.
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Multipart(multipart): Multipart,
) -> Result<Json<model::PostCreated>, RouteError> {
	let form = model::PostForm::read(multipart).await?;

	let category_id = form.uuid("category")?.ok_or(Error::MissingCategory)?;
	let title = form
		.text("title")
		.filter(|title| !title.is_empty())
		.ok_or(Error::MissingTitle)?
		.to_owned();

	let categories = state.store.categories_of(session.user.id).await?;
	let category = categories
		.iter()
		.find(|category| category.id == category_id)
		.ok_or(Error::UnknownCategory(category_id))?;

	tracing::debug!(user = %session.user.id, category = %category.title, "creating post");

	let mut new = NewPost {
		user_id: session.user.id,
		category_id,
		title,
		description: form
			.text("description")
			.filter(|description| !description.is_empty())
			.unwrap_or("EMPTY")
			.to_owned(),
		rating: form.int("rating")?.unwrap_or(0),
		count: form.int("count")?.unwrap_or(1),
		image: String::new(),
	};

	// The image is written before the row so the two cannot diverge. An
	// existing file with the same name is kept and reused.
	if let Some(upload) = &form.upload {
		new.image = state
			.images
			.save_new(&upload.file_name, &upload.bytes)
			.await
			.map_err(Error::Save)?;
	}

	let post = state.store.create_post(new).await?;

	Ok(Json(model::PostCreated {
		message: "Post added successfully",
		response: post.clone(),
		post,
	}))
}

pub fn create_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Create a post")
		.description(
			"Creates a post in one of the user's categories, \
			optionally attaching an uploaded image.",
		)
		.tag(tag::POST)
}

/// Applies a partial update to a post. Only fields present in the form
/// change; an explicit zero or empty string is honored.
pub async fn change_post(
	State(state): State<AppState>,
	session: Session,
	Multipart(multipart): Multipart,
) -> Result<Json<model::PostChanged>, RouteError> {
	let form = model::PostForm::read(multipart).await?;

	let id = form.uuid("id")?.ok_or(Error::MissingId)?;

	let existing = state
		.store
		.post(session.user.id, id, None)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	let mut patch = PostPatch {
		title: form.text("title").map(str::to_owned),
		description: form.text("description").map(str::to_owned),
		rating: form.int("rating")?,
		count: form.int("count")?,
		image: None,
	};

	if let Some(upload) = &form.upload {
		// Removal failures are logged and swallowed; the replacement is
		// still written.
		if !existing.image.is_empty() {
			if let Err(error) = state.images.remove(&existing.image).await {
				tracing::warn!(%error, image = %existing.image, "failed to remove previous image");
			}
		}

		// Written before the row update; unlike create, a same-named file
		// is replaced.
		patch.image = Some(
			state
				.images
				.save(&upload.file_name, &upload.bytes)
				.await
				.map_err(Error::Save)?,
		);
	}

	if patch.is_empty() {
		return Err(Error::NothingToChange.into());
	}

	let post = state
		.store
		.update_post(session.user.id, id, patch)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	Ok(Json(model::PostChanged {
		message: "Post changed",
		post,
	}))
}

pub fn change_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Change a post")
		.description(
			"Applies a partial update to a post identified by the `id` form field, \
			refreshing its interaction date.",
		)
		.tag(tag::POST)
}

/// Deletes a post by its unique id, removing its image file from the
/// public directory when one is attached.
pub async fn delete_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<model::IdPath>,
) -> Result<Json<model::PostDeleted>, RouteError> {
	let post = state.store.post(session.user.id, path.id, None).await?;

	if let Some(post) = post {
		// Removal failures are logged and swallowed; the row is deleted
		// either way.
		if !post.image.is_empty() {
			if let Err(error) = state.images.remove(&post.image).await {
				tracing::warn!(%error, image = %post.image, "failed to remove image");
			}
		}
	}

	let affected = state.store.delete_post(session.user.id, path.id).await?;

	Ok(Json(model::PostDeleted {
		message: "Successfully deleted",
		response: model::DeleteResult { affected },
	}))
}

pub fn delete_post_docs(op: TransformOperation) -> TransformOperation {
	op.summary("Delete a post")
		.description(
			"Deletes a post and its image. Succeeds even when no post matches the id.",
		)
		.tag(tag::POST)
}
