use crate::Picture;

/// Resolves stored picture filenames to retrievable URLs.
#[derive(Debug, Clone, Default)]
pub struct Photos {
    pub base_url: String,
    pub prefix: String,
}

impl Photos {
    pub fn new(base_url: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            prefix: prefix.into(),
        }
    }

    pub fn url(&self, filename: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, filename)
    }

    /// Empty string for a missing picture.
    pub fn picture_url(&self, picture: &Picture) -> String {
        picture
            .filename()
            .map(|name| self.url(name))
            .unwrap_or_default()
    }
}
