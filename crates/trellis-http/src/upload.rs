//! Uploaded files attached to a request by the transport.

use bytes::Bytes;

/// A file received as part of a multipart request.
///
/// Multipart parsing belongs to the transport; by the time a request reaches
/// the router, uploaded files are already available by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
	pub field_name: String,
	pub file_name: String,
	pub content_type: Option<String>,
	pub content: Bytes,
}

impl UploadedFile {
	/// Create an uploaded file
	///
	/// # Examples
	///
	/// ```
	/// use trellis_http::UploadedFile;
	///
	/// let file = UploadedFile::new("avatar", "me.png", "binary")
	///     .with_content_type("image/png");
	/// assert_eq!(file.size(), 6);
	/// assert_eq!(file.extension(), Some("png"));
	/// ```
	pub fn new(
		field_name: impl Into<String>,
		file_name: impl Into<String>,
		content: impl Into<Bytes>,
	) -> Self {
		Self {
			field_name: field_name.into(),
			file_name: file_name.into(),
			content_type: None,
			content: content.into(),
		}
	}

	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = Some(content_type.into());
		self
	}

	pub fn size(&self) -> usize {
		self.content.len()
	}

	pub fn extension(&self) -> Option<&str> {
		self.file_name
			.rsplit_once('.')
			.map(|(_, ext)| ext)
			.filter(|ext| !ext.is_empty())
	}
}
