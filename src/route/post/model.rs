pub use crate::model::Post;

use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

use super::Error;

/// Query parameters accepted by the post listing.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ListPostsQuery {
	/// Narrow the listing to a single category.
	pub category_id: Option<Uuid>,
	/// Case-insensitive substring match on the title.
	#[validate(length(max = 256))]
	pub search: Option<String>,
}

/// Optional category filter when fetching a single post.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetPostQuery {
	pub category: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdPath {
	pub id: Uuid,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostList {
	pub posts: Vec<Post>,
}

/// Response for a created post. `response` and `post` both carry the
/// persisted entity; the duplication is part of the client contract.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostCreated {
	pub message: &'static str,
	pub response: Post,
	pub post: Post,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostChanged {
	pub message: &'static str,
	pub post: Post,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeleteResult {
	pub affected: u64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDeleted {
	pub message: &'static str,
	pub response: DeleteResult,
}

/// A single uploaded file.
#[derive(Debug)]
pub struct Upload {
	pub file_name: String,
	pub bytes: Bytes,
}

/// Text fields and the first file part of a `multipart/form-data` body.
///
/// Presence is tracked per field, so an explicit zero or empty string is
/// distinguishable from an absent field.
#[derive(Debug, Default)]
pub struct PostForm {
	values: HashMap<String, String>,
	pub upload: Option<Upload>,
}

impl PostForm {
	pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
		let mut form = Self::default();

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if let Some(file_name) = field.file_name().map(str::to_owned) {
				// Only the first file part is attached to the post.
				if form.upload.is_none() {
					form.upload = Some(Upload {
						file_name,
						bytes: field.bytes().await?,
					});
				}

				continue;
			}

			form.values.insert(name, field.text().await?);
		}

		Ok(form)
	}

	pub fn text(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	pub fn uuid(&self, name: &'static str) -> Result<Option<Uuid>, Error> {
		self.text(name)
			.map(|value| Uuid::parse_str(value).map_err(|_| Error::InvalidField(name)))
			.transpose()
	}

	pub fn int(&self, name: &'static str) -> Result<Option<i32>, Error> {
		self.text(name)
			.map(|value| value.parse().map_err(|_| Error::InvalidField(name)))
			.transpose()
	}
}
