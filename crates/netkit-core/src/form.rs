//! Form parameters and the form-data container.

use crate::upload::UploadFile;

/// Prefix of generated boundaries.
pub const BOUNDARY_PREFIX: &str = "Boundary-";

/// A text field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormParameter {
    key: String,
    value: String,
}

impl FormParameter {
    /// Create a parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The field name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The field value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for FormParameter {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Generate a fresh boundary of the form `Boundary-<UUID>`.
#[must_use]
pub fn generate_boundary() -> String {
    let id = uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase();
    format!("{BOUNDARY_PREFIX}{id}")
}

/// Everything needed to build one multipart request body.
///
/// The boundary lives here so the `Content-Type` header and the body are
/// always derived from the same value.
#[derive(Debug)]
pub struct FormData {
    boundary: String,
    parameters: Vec<FormParameter>,
    files: Vec<UploadFile>,
}

impl FormData {
    /// Create form data with a freshly generated boundary.
    #[must_use]
    pub fn new(parameters: Vec<FormParameter>, files: Vec<UploadFile>) -> Self {
        Self::with_boundary(generate_boundary(), parameters, files)
    }

    /// Create form data with a caller-chosen boundary.
    ///
    /// The boundary must not occur inside any parameter value or file
    /// content; this is not checked.
    #[must_use]
    pub fn with_boundary(
        boundary: impl Into<String>,
        parameters: Vec<FormParameter>,
        files: Vec<UploadFile>,
    ) -> Self {
        Self {
            boundary: boundary.into(),
            parameters,
            files,
        }
    }

    /// The boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// `multipart/form-data; boundary=...` for this form.
    #[must_use]
    pub fn content_type(&self) -> String {
        content_type_for(&self.boundary)
    }

    /// Text parameters, in order.
    #[must_use]
    pub fn parameters(&self) -> &[FormParameter] {
        &self.parameters
    }

    /// Files, in order.
    #[must_use]
    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    /// Returns true if the form has neither parameters nor files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.files.is_empty()
    }

    /// Split into boundary, parameters and files.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<FormParameter>, Vec<UploadFile>) {
        (self.boundary, self.parameters, self.files)
    }
}

/// The `Content-Type` header value for a multipart body with `boundary`.
#[must_use]
pub fn content_type_for(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}
