/// Turns storage paths into public URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute `http(s)` URLs pass through unchanged; other paths are joined
    /// onto the base URL. Blank input resolves to an empty string.
    pub fn resolve(&self, path: &str) -> String {
        let path = path.trim();
        if path.is_empty() {
            return String::new();
        }
        if is_absolute_url(path) {
            return path.to_string();
        }
        if self.base_url.is_empty() {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn is_absolute_url(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
