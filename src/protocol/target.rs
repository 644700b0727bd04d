//! Request-target composition and percent-escaping.
//!
//! Only the composing half of URI handling lives here: the request serializer
//! needs to render a path, query and fragment into a percent-encoded
//! request-target (RFC 3986). Parsing URIs is the caller's business.

use std::fmt;

const DEFAULT_PORT: u16 = 80;

/// Escaping rules for the different parts of a request-target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscapeMode {
    /// Escape everything outside the unreserved set
    Full,
    /// Additionally allow `/` (path segments)
    Path,
    /// Encode space as `+` (query strings)
    Query,
}

/// Percent-escapes `input`.
///
/// The unreserved set (alphanumerics and `-_.~`) is always passed through;
/// everything else becomes a lowercase `%xx` escape, except that
/// [`EscapeMode::Path`] keeps `/` and [`EscapeMode::Query`] turns space
/// into `+`.
pub fn escape(input: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let unreserved = b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~');
        if unreserved || (mode == EscapeMode::Path && b == b'/') {
            out.push(b as char);
        } else if mode == EscapeMode::Query && b == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push(char::from_digit((b >> 4) as u32, 16).unwrap());
            out.push(char::from_digit((b & 0x0f) as u32, 16).unwrap());
        }
    }
    out
}

/// The target of a request: where it goes and which resource it names.
///
/// `host` and `port` are used for `Host` header synthesis only; the
/// `Display` implementation renders the origin-form request-target
/// (`/path?query#fragment`) with all components percent-escaped. The parts
/// are stored unescaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub fragment: String,
}

impl Target {
    /// A relative target naming only a path.
    pub fn path(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// The port to connect to, defaulting to 80.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Returns whether the target names no host.
    pub fn is_relative(&self) -> bool {
        self.host.is_empty()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str("/")?;
        } else {
            f.write_str(&escape(&self.path, EscapeMode::Path))?;
        }

        for (i, (key, value)) in self.query.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            f.write_str(&escape(key, EscapeMode::Query))?;
            f.write_str("=")?;
            f.write_str(&escape(value, EscapeMode::Query))?;
        }

        if !self.fragment.is_empty() {
            f.write_str("#")?;
            f.write_str(&escape(&self.fragment, EscapeMode::Full))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_modes() {
        assert_eq!(escape("hello, /world", EscapeMode::Full), "hello%2c%20%2fworld");
        assert_eq!(escape("hello, /world", EscapeMode::Path), "hello%2c%20/world");
        assert_eq!(escape("hello, /world", EscapeMode::Query), "hello%2c+%2fworld");
    }

    #[test]
    fn escape_passes_unreserved_set() {
        let unreserved = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_.~";
        assert_eq!(escape(unreserved, EscapeMode::Full), unreserved);
        assert_eq!(escape("", EscapeMode::Full), "");
    }

    #[test]
    fn display_relative() {
        assert_eq!(Target::default().to_string(), "/");

        let target = Target { path: "/a".into(), query: vec![("k".into(), "v".into())], ..Default::default() };
        assert_eq!(target.to_string(), "/a?k=v");

        let target = Target { path: "/a".into(), fragment: "fragment".into(), ..Default::default() };
        assert_eq!(target.to_string(), "/a#fragment");

        let target = Target {
            path: "/a/b/c d".into(),
            query: vec![("key".into(), "value1".into()), ("key2/ ".into(), "value2/ ".into())],
            fragment: "frag/ ment".into(),
            ..Default::default()
        };
        assert!(target.is_relative());
        assert_eq!(target.to_string(), "/a/b/c%20d?key=value1&key2%2f+=value2%2f+#frag%2f%20ment");
    }

    #[test]
    fn display_escapes_path_spaces() {
        assert_eq!(Target::path("/file name").to_string(), "/file%20name");
    }
}
