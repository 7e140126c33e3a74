//! Store URL parsing and object key resolution
//!
//! A store URL looks like `s3://bucket/optional/prefix`. The host is the
//! bucket and the decoded path, with its leading and trailing `/` stripped,
//! is the prefix every object name is resolved under.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use url::Url;

const SEPARATOR: char = '/';

/// Parsed store URL: bucket plus optional key prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUrl {
    raw: String,
    bucket: String,
    prefix: String,
}

/// Fully resolved address of one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl StoreUrl {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Normalized prefix, empty when the URL has no path
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve `name` under this store's prefix
    pub fn resolve(&self, name: &str) -> ObjectLocation {
        ObjectLocation {
            bucket: self.bucket.clone(),
            key: join_key(&self.prefix, name),
        }
    }
}

impl FromStr for StoreUrl {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let url = Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid store URL '{}': {}", raw, e))?;

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Store URL '{}' does not name a bucket", raw))?
            .to_string();

        // Object keys are raw text, the URL path is percent-encoded
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|e| anyhow::anyhow!("Store URL '{}' has a path that is not UTF-8: {}", raw, e))?;

        Ok(Self {
            raw: raw.to_string(),
            bucket,
            prefix: path.trim_matches(SEPARATOR).to_string(),
        })
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Join key segments with a single separator, skipping blank ones
pub fn join_key(prefix: &str, name: &str) -> String {
    [prefix, name]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_prefix() {
        let store: StoreUrl = "https://example-bucket.s3.amazonaws.com/path/to/files".parse().unwrap();

        assert_eq!(store.bucket(), "example-bucket.s3.amazonaws.com");
        assert_eq!(store.prefix(), "path/to/files");

        let location = store.resolve("books.csv");
        assert_eq!(location.bucket, "example-bucket.s3.amazonaws.com");
        assert_eq!(location.key, "path/to/files/books.csv");
    }

    #[test]
    fn test_resolve_without_prefix() {
        let store: StoreUrl = "s3://books-bucket".parse().unwrap();

        assert_eq!(store.prefix(), "");
        assert_eq!(store.resolve("books.csv").key, "books.csv");
    }

    #[test]
    fn test_trailing_and_leading_separators_are_stripped() {
        let store: StoreUrl = "s3://books-bucket/incoming/".parse().unwrap();
        assert_eq!(store.prefix(), "incoming");
        assert_eq!(store.resolve("books.csv").key, "incoming/books.csv");

        let root: StoreUrl = "s3://books-bucket/".parse().unwrap();
        assert_eq!(root.resolve("books.csv").key, "books.csv");
    }

    #[test]
    fn test_prefix_with_non_ascii_is_decoded() {
        let store: StoreUrl = "s3://livros/período/entrada".parse().unwrap();

        assert_eq!(store.prefix(), "período/entrada");
        assert_eq!(store.resolve("books.csv").key, "período/entrada/books.csv");
    }

    #[test]
    fn test_prefix_with_escaped_space_is_decoded() {
        let store: StoreUrl = "s3://livros/my%20dir/".parse().unwrap();
        assert_eq!(store.resolve("books.csv").key, "my dir/books.csv");
    }

    #[test]
    fn test_prefix_that_decodes_to_invalid_utf8_is_rejected() {
        let err = "s3://livros/%FF".parse::<StoreUrl>().unwrap_err();
        assert!(err.to_string().contains("not UTF-8"));
    }

    #[test]
    fn test_join_key_omits_blank_segments() {
        assert_eq!(join_key("", "books.csv"), "books.csv");
        assert_eq!(join_key("incoming", ""), "incoming");
        assert_eq!(join_key("  ", "books.csv"), "books.csv");
        assert_eq!(join_key("a/b", "c.csv"), "a/b/c.csv");
    }

    #[test]
    fn test_rejects_unparseable_url() {
        assert!("not a url".parse::<StoreUrl>().is_err());
        assert!("".parse::<StoreUrl>().is_err());
    }

    #[test]
    fn test_rejects_url_without_bucket() {
        let err = "file:///tmp/books".parse::<StoreUrl>().unwrap_err();
        assert!(err.to_string().contains("does not name a bucket"));
    }

    #[test]
    fn test_display_keeps_original_text() {
        let store: StoreUrl = " s3://books-bucket/incoming ".parse().unwrap();
        assert_eq!(store.to_string(), "s3://books-bucket/incoming");
        assert_eq!(
            store.resolve("a.csv").to_string(),
            "s3://books-bucket/incoming/a.csv"
        );
    }
}
