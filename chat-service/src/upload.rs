//! Filename-based upload validation.
//!
//! Only the extension after the last `.` is inspected. The bytes themselves are
//! checked later when the prompt assembler decodes the image.

use std::collections::BTreeSet;
use std::fmt;

/// Extensions accepted when no `ALLOWED_EXTENSIONS` override is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Case-insensitive set of permitted file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions(BTreeSet<String>);

impl AllowedExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        )
    }

    /// Parse a comma separated list such as `"png, .JPG,gif"`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.0.contains(&extension.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for an HTML file input's `accept` attribute, e.g. `.gif,.png`.
    pub fn accept_attribute(&self) -> String {
        self.0
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for AllowedExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS)
    }
}

impl fmt::Display for AllowedExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(String::as_str).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Returns true when `filename` has a `.` and its last extension is allow-listed.
pub fn allowed_file(filename: &str, allowed: &AllowedExtensions) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, extension)| allowed.contains(extension))
}
