use std::{
	io,
	path::{Path, PathBuf},
};

/// Directory under the public root where post images are written.
pub const IMAGE_DIR: &str = "assets/images";

/// Writes and removes post images under the public root.
///
/// Paths are resolved here, and only here, so the create, change and
/// delete flows agree on where an image lives. Stored `Post::image`
/// values are paths relative to the public root.
#[derive(Debug, Clone)]
pub struct ImageStore {
	public_root: PathBuf,
}

impl ImageStore {
	pub fn new(public_root: impl Into<PathBuf>) -> Self {
		Self {
			public_root: public_root.into(),
		}
	}

	/// Relative path for an upload, keeping only the file name component
	/// of the client-provided name.
	fn relative(file_name: &str) -> io::Result<String> {
		let name = Path::new(file_name)
			.file_name()
			.and_then(|name| name.to_str())
			.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid file name"))?;

		Ok(format!("{IMAGE_DIR}/{name}"))
	}

	fn resolve(&self, relative: &str) -> PathBuf {
		self.public_root.join(relative)
	}

	/// Writes an upload, leaving any existing file with the same name in
	/// place. Returns the relative path either way.
	pub async fn save_new(&self, file_name: &str, bytes: &[u8]) -> io::Result<String> {
		let relative = Self::relative(file_name)?;
		let destination = self.resolve(&relative);

		if !tokio::fs::try_exists(&destination).await? {
			Self::write(&destination, bytes).await?;
		}

		Ok(relative)
	}

	/// Writes an upload, replacing any existing file with the same name.
	pub async fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<String> {
		let relative = Self::relative(file_name)?;

		Self::write(&self.resolve(&relative), bytes).await?;
		Ok(relative)
	}

	/// Removes a previously stored image by its relative path.
	pub async fn remove(&self, relative: &str) -> io::Result<()> {
		tokio::fs::remove_file(self.resolve(relative)).await
	}

	async fn write(destination: &Path, bytes: &[u8]) -> io::Result<()> {
		if let Some(parent) = destination.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		tokio::fs::write(destination, bytes).await
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[tokio::test]
	async fn test_save_keeps_only_the_file_name() {
		let dir = tempfile::tempdir().unwrap();
		let images = ImageStore::new(dir.path());

		let relative = images.save("../../escape.png", b"data").await.unwrap();

		assert_eq!(relative, "assets/images/escape.png");
		assert!(dir.path().join("assets/images/escape.png").exists());
	}

	#[tokio::test]
	async fn test_save_new_keeps_existing_content() {
		let dir = tempfile::tempdir().unwrap();
		let images = ImageStore::new(dir.path());

		images.save_new("pic.png", b"first").await.unwrap();
		images.save_new("pic.png", b"second").await.unwrap();

		let content = tokio::fs::read(dir.path().join("assets/images/pic.png"))
			.await
			.unwrap();

		assert_eq!(content, b"first");
	}

	#[tokio::test]
	async fn test_remove_resolves_under_the_public_root() {
		let dir = tempfile::tempdir().unwrap();
		let images = ImageStore::new(dir.path());

		let relative = images.save("pic.png", b"data").await.unwrap();

		images.remove(&relative).await.unwrap();
		assert!(!dir.path().join("assets/images/pic.png").exists());
	}
}
