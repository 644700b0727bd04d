//! Ordered, case-preserving header multimap.
//!
//! The serializer must reproduce caller-supplied header names byte for byte,
//! so headers are stored as written instead of being normalized the way
//! `http::HeaderMap` does. Lookups compare names ASCII-case-insensitively and
//! return the value written last.

use crate::protocol::ParseError;

/// An ordered multimap of header name/value pairs.
///
/// Iteration yields entries in insertion order; [`get`](Headers::get) is
/// last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Appends a header, keeping any existing entries with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replaces all entries with the given name by a single one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    /// Returns the value written last for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parses the `Content-Length` header, if present.
    pub fn content_length(&self) -> Result<Option<u64>, ParseError> {
        match self.get("Content-Length") {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ParseError::invalid_content_length(format!("value {value} is not u64"))),
        }
    }

    /// Returns whether the message uses chunked transfer encoding.
    ///
    /// Per RFC 7230 §3.3.3 only the final transfer coding matters.
    pub fn is_chunked(&self) -> bool {
        self.get("Transfer-Encoding")
            .and_then(|encodings| encodings.rsplit(',').next())
            .map(|last_encoding| last_encoding.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false)
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_last_write_wins() {
        let mut headers = Headers::new();
        headers.append("Accept", "foo");
        headers.append("accept", "bar");

        assert_eq!(headers.get("ACCEPT"), Some("bar"));
        assert_eq!(headers.len(), 2);

        headers.set("Accept", "baz");
        assert_eq!(headers.get("accept"), Some("baz"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn iteration_preserves_insertion_order_and_case() {
        let headers: Headers = [("Header1", "Value1"), ("Content-Length", "10")].into_iter().collect();

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries, vec![("Header1", "Value1"), ("Content-Length", "10")]);
    }

    #[test]
    fn check_is_chunked() {
        {
            let headers = Headers::new();
            assert!(!headers.is_chunked());
        }

        {
            let headers: Headers =
                [("Accept", "foo"), ("Transfer-Encoding", "gzip, chunked"), ("Host", "bar")].into_iter().collect();
            assert!(headers.is_chunked());
        }

        {
            let headers: Headers =
                [("Accept", "foo"), ("Transfer-Encoding", "chunked, gzip"), ("Host", "bar")].into_iter().collect();
            assert!(!headers.is_chunked());
        }

        {
            let headers: Headers = [("Transfer-Encoding", "gzip")].into_iter().collect();
            assert!(!headers.is_chunked());
        }
    }

    #[test]
    fn check_content_length() {
        let headers: Headers = [("Content-Length", "10")].into_iter().collect();
        assert_eq!(headers.content_length().unwrap(), Some(10));

        let headers: Headers = [("Content-Length", "ten")].into_iter().collect();
        assert!(headers.content_length().is_err());

        assert_eq!(Headers::new().content_length().unwrap(), None);
    }
}
