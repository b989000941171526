use std::borrow::Cow;

use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur while operating on posts.
///
/// The messages are part of the client contract and are presented
/// verbatim.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Category id required")]
	MissingCategory,
	#[error("Title required")]
	MissingTitle,
	#[error("Id is not find, please add id.")]
	MissingId,
	#[error("User has no such category")]
	UnknownCategory(Uuid),
	#[error("No such post")]
	UnknownPost(Uuid),
	#[error("Nothing to change")]
	NothingToChange,
	#[error("invalid value for `{0}`")]
	InvalidField(&'static str),
	#[error("file save error")]
	Save(#[from] std::io::Error),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs)
				.post_with(create_post, create_post_docs)
				.put_with(change_post, change_post_docs)
				.patch_with(change_post, change_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs).delete_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::BAD_REQUEST
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		let details = match self {
			Self::UnknownCategory(id) | Self::UnknownPost(id) => Some(Cow::Owned({
				let mut map = error::Map::new();
				map.insert("id".into(), json!(id));
				map
			})),
			Self::Save(error) => Some(Cow::Owned({
				let mut map = error::Map::new();
				map.insert("error".into(), json!(error.to_string()));
				map
			})),
			_ => None,
		};

		vec![error::Message {
			content: self.to_string().into(),
			field: None,
			details,
		}]
	}
}

#[cfg(test)]
mod test {
	use axum_test::multipart::{MultipartForm, Part};
	use uuid::Uuid;

	use crate::{
		store::{NewPost, PostFilter, Store as _},
		test::*,
	};

	fn create_form(category: Uuid, title: &str) -> MultipartForm {
		MultipartForm::new()
			.add_text("category", category.to_string())
			.add_text("title", title)
	}

	fn image_part(bytes: &[u8], file_name: &str) -> Part {
		Part::bytes(bytes.to_vec())
			.file_name(file_name)
			.mime_type("image/png")
	}

	fn new_post(user_id: Uuid, category_id: Uuid, title: &str) -> NewPost {
		NewPost {
			user_id,
			category_id,
			title: title.to_owned(),
			description: "EMPTY".to_owned(),
			rating: 0,
			count: 1,
			image: String::new(),
		}
	}

	#[tokio::test]
	async fn test_create_applies_defaults() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(create_form(app.category.id, "T"))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Post added successfully");
		assert_eq!(body["post"]["title"], "T");
		assert_eq!(body["post"]["description"], "EMPTY");
		assert_eq!(body["post"]["rating"], 0);
		assert_eq!(body["post"]["count"], 1);
		assert_eq!(body["post"]["image"], "");
		assert_eq!(body["response"]["id"], body["post"]["id"]);
	}

	#[tokio::test]
	async fn test_create_requires_title_and_category() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(MultipartForm::new().add_text("category", app.category.id.to_string()))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Title required"
		);

		let response = app
			.server
			.post("/posts")
			.multipart(MultipartForm::new().add_text("title", "T"))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Category id required"
		);

		let posts = app
			.store
			.posts(app.user.id, &PostFilter::default())
			.await
			.unwrap();

		assert!(posts.is_empty());
	}

	#[tokio::test]
	async fn test_create_rejects_unowned_category() {
		let app = app().await;

		let other = app.store.seed_user("jane").await;
		let other_category = app.store.seed_category(other.id, "general").await;

		for category in [other_category.id, Uuid::new_v4()] {
			let response = app
				.server
				.post("/posts")
				.multipart(create_form(category, "T"))
				.await;

			assert_eq!(response.status_code(), 400);
			assert_eq!(
				response.json::<Value>()["errors"][0]["content"],
				"User has no such category"
			);
		}

		let posts = app
			.store
			.posts(app.user.id, &PostFilter::default())
			.await
			.unwrap();

		assert!(posts.is_empty());
	}

	#[tokio::test]
	async fn test_create_writes_image_and_reuses_existing_files() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(
				create_form(app.category.id, "With image")
					.add_part("image", image_part(b"first", "pic.png")),
			)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["post"]["image"],
			"assets/images/pic.png"
		);

		let path = app.public.path().join("assets/images/pic.png");

		assert_eq!(std::fs::read(&path).unwrap(), b"first");

		// A same-named upload does not overwrite the stored file, but the
		// new post still points at it.
		let response = app
			.server
			.post("/posts")
			.multipart(
				create_form(app.category.id, "Reuses image")
					.add_part("image", image_part(b"second", "pic.png")),
			)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["post"]["image"],
			"assets/images/pic.png"
		);
		assert_eq!(std::fs::read(&path).unwrap(), b"first");
	}

	#[tokio::test]
	async fn test_list_is_scoped_and_ordered() {
		let app = app().await;

		let first = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "Alphabet"))
			.await
			.unwrap();
		let second = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "beta"))
			.await
			.unwrap();
		let third = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "ALPHA dog"))
			.await
			.unwrap();

		let other = app.store.seed_user("jane").await;
		let other_category = app.store.seed_category(other.id, "general").await;

		app.store
			.create_post(new_post(other.id, other_category.id, "alpha"))
			.await
			.unwrap();

		let response = app.server.get("/posts").await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();
		let posts = body["posts"].as_array().unwrap();

		assert_eq!(posts.len(), 3);
		assert_eq!(posts[0]["id"], json!(third.id));
		assert_eq!(posts[1]["id"], json!(second.id));
		assert_eq!(posts[2]["id"], json!(first.id));

		let response = app
			.server
			.get("/posts")
			.add_query_param("search", "alpha")
			.await;

		let body = response.json::<Value>();
		let posts = body["posts"].as_array().unwrap();

		assert_eq!(posts.len(), 2);
		assert_eq!(posts[0]["id"], json!(third.id));
		assert_eq!(posts[1]["id"], json!(first.id));
	}

	#[tokio::test]
	async fn test_list_filters_by_category() {
		let app = app().await;

		let other_category = app.store.seed_category(app.user.id, "books").await;

		app.store
			.create_post(new_post(app.user.id, app.category.id, "General"))
			.await
			.unwrap();

		let book = app
			.store
			.create_post(new_post(app.user.id, other_category.id, "Book"))
			.await
			.unwrap();

		let response = app
			.server
			.get("/posts")
			.add_query_param("category_id", other_category.id.to_string())
			.await;

		let body = response.json::<Value>();
		let posts = body["posts"].as_array().unwrap();

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0]["id"], json!(book.id));
	}

	#[tokio::test]
	async fn test_get_returns_null_when_no_post_matches() {
		let app = app().await;

		let response = app.server.get(&format!("/posts/{}", Uuid::new_v4())).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), Value::Null);

		// Another user's post is invisible, not a 404.
		let other = app.store.seed_user("jane").await;
		let other_category = app.store.seed_category(other.id, "general").await;
		let post = app
			.store
			.create_post(new_post(other.id, other_category.id, "Hidden"))
			.await
			.unwrap();

		let response = app.server.get(&format!("/posts/{}", post.id)).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>(), Value::Null);
	}

	#[tokio::test]
	async fn test_get_honors_the_category_filter() {
		let app = app().await;

		let post = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "T"))
			.await
			.unwrap();

		let response = app
			.server
			.get(&format!("/posts/{}", post.id))
			.add_query_param("category", app.category.id.to_string())
			.await;

		assert_eq!(response.json::<Value>()["id"], json!(post.id));

		let response = app
			.server
			.get(&format!("/posts/{}", post.id))
			.add_query_param("category", Uuid::new_v4().to_string())
			.await;

		assert_eq!(response.json::<Value>(), Value::Null);
	}

	#[tokio::test]
	async fn test_change_updates_title_and_interaction_date() {
		let app = app().await;

		let post = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "Old"))
			.await
			.unwrap();

		let response = app
			.server
			.put("/posts")
			.multipart(
				MultipartForm::new()
					.add_text("id", post.id.to_string())
					.add_text("title", "New"),
			)
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Post changed");
		assert_eq!(body["post"]["title"], "New");

		let updated = app
			.store
			.post(app.user.id, post.id, None)
			.await
			.unwrap()
			.unwrap();

		assert_eq!(updated.title, "New");
		assert_eq!(updated.description, post.description);
		assert_eq!(updated.rating, post.rating);
		assert_eq!(updated.count, post.count);
		assert!(updated.interaction_date > post.interaction_date);
	}

	#[tokio::test]
	async fn test_change_honors_explicit_zero_values() {
		let app = app().await;

		let post = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "T"))
			.await
			.unwrap();

		let response = app
			.server
			.put("/posts")
			.multipart(
				MultipartForm::new()
					.add_text("id", post.id.to_string())
					.add_text("count", "0"),
			)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["post"]["count"], 0);
	}

	#[tokio::test]
	async fn test_change_with_an_empty_patch() {
		let app = app().await;

		let post = app
			.store
			.create_post(new_post(app.user.id, app.category.id, "T"))
			.await
			.unwrap();

		let response = app
			.server
			.put("/posts")
			.multipart(MultipartForm::new().add_text("id", post.id.to_string()))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Nothing to change"
		);
	}

	#[tokio::test]
	async fn test_change_requires_an_id() {
		let app = app().await;

		let response = app
			.server
			.put("/posts")
			.multipart(MultipartForm::new().add_text("title", "New"))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"Id is not find, please add id."
		);
	}

	#[tokio::test]
	async fn test_change_is_scoped_to_the_owner() {
		let app = app().await;

		let other = app.store.seed_user("jane").await;
		let other_category = app.store.seed_category(other.id, "general").await;
		let post = app
			.store
			.create_post(new_post(other.id, other_category.id, "Theirs"))
			.await
			.unwrap();

		for id in [post.id, Uuid::new_v4()] {
			let response = app
				.server
				.put("/posts")
				.multipart(
					MultipartForm::new()
						.add_text("id", id.to_string())
						.add_text("title", "Mine now"),
				)
				.await;

			assert_eq!(response.status_code(), 400);
			assert_eq!(
				response.json::<Value>()["errors"][0]["content"],
				"No such post"
			);
		}

		let untouched = app.store.post(other.id, post.id, None).await.unwrap().unwrap();

		assert_eq!(untouched.title, "Theirs");
	}

	#[tokio::test]
	async fn test_change_replaces_the_image() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(
				create_form(app.category.id, "T").add_part("image", image_part(b"old", "one.png")),
			)
			.await;

		let id = response.json::<Value>()["post"]["id"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.server
			.put("/posts")
			.multipart(
				MultipartForm::new()
					.add_text("id", id)
					.add_part("image", image_part(b"new", "two.png")),
			)
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["post"]["image"],
			"assets/images/two.png"
		);

		assert!(!app.public.path().join("assets/images/one.png").exists());
		assert_eq!(
			std::fs::read(app.public.path().join("assets/images/two.png")).unwrap(),
			b"new"
		);
	}

	#[tokio::test]
	async fn test_delete_removes_the_row_and_image() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(
				create_form(app.category.id, "T").add_part("image", image_part(b"img", "pic.png")),
			)
			.await;

		let id = response.json::<Value>()["post"]["id"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app.server.delete(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Successfully deleted");
		assert_eq!(body["response"]["affected"], 1);
		assert!(!app.public.path().join("assets/images/pic.png").exists());

		// Deleting again still succeeds, with nothing removed.
		let response = app.server.delete(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["response"]["affected"], 0);
	}

	#[tokio::test]
	async fn test_delete_succeeds_when_the_image_is_already_gone() {
		let app = app().await;

		let response = app
			.server
			.post("/posts")
			.multipart(
				create_form(app.category.id, "T").add_part("image", image_part(b"img", "pic.png")),
			)
			.await;

		let id = response.json::<Value>()["post"]["id"]
			.as_str()
			.unwrap()
			.to_owned();

		std::fs::remove_file(app.public.path().join("assets/images/pic.png")).unwrap();

		let response = app.server.delete(&format!("/posts/{id}")).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["response"]["affected"], 1);
	}

	#[tokio::test]
	async fn test_delete_is_scoped_to_the_owner() {
		let app = app().await;

		let other = app.store.seed_user("jane").await;
		let other_category = app.store.seed_category(other.id, "general").await;
		let post = app
			.store
			.create_post(new_post(other.id, other_category.id, "Theirs"))
			.await
			.unwrap();

		let response = app.server.delete(&format!("/posts/{}", post.id)).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["response"]["affected"], 0);
		assert!(app.store.post(other.id, post.id, None).await.unwrap().is_some());
	}

	#[tokio::test]
	async fn test_requires_authentication() {
		let app = app().await;
		let server = app.anonymous_server();

		let response = server.get("/posts").await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_api_key_authentication() {
		let app = app().await;
		let server = app.anonymous_server();

		let api_key = app.store.seed_api_key(app.user.id).await;

		let response = server
			.get("/posts")
			.authorization_bearer(api_key.to_string())
			.await;

		assert_eq!(response.status_code(), 200);

		let response = server
			.get("/posts")
			.authorization_bearer(Uuid::new_v4().to_string())
			.await;

		assert_eq!(response.status_code(), 401);
	}
}
