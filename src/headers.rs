//! Ordered, case-insensitive header list.
//!
//! Header names compare case-insensitively but keep the spelling they were
//! first inserted with. Values are stored verbatim, including a leading space
//! when the header came from a raw `"Name: value"` line. Serialisation only
//! inserts a space after the colon when the value does not already start
//! with one, so both forms render identically on the wire.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderName, HeaderValue};

use crate::{Error, Result};

/// Ordered header list with display-preserving names.
///
/// # Examples
///
/// ```
/// use qengine_client::HeaderList;
///
/// let mut headers = HeaderList::new();
/// headers.insert("Accept", "application/json");
/// headers.insert_line("X-Trace: abc").unwrap();
/// assert_eq!(headers.get("accept"), Some("application/json"));
/// assert_eq!(headers.render(), "Accept: application/json\r\nX-Trace: abc\r\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw `"Name: value"` lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a line has no colon.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut headers = Self::new();
        for line in lines {
            headers.insert_line(line.as_ref())?;
        }
        Ok(headers)
    }

    /// Sets a header, replacing any existing header with the same name.
    ///
    /// A replaced header keeps its position and original name spelling.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Parses a raw `"Name: value"` line and inserts it.
    ///
    /// Everything after the first colon becomes the value, leading space
    /// included.
    pub fn insert_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (name, value) = line.split_once(':').ok_or_else(|| Error::InvalidHeader {
            name: line.to_string(),
            reason: "expected \"Name: value\"".to_string(),
        })?;
        self.insert(name.trim(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes a header, returning its stored value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Serialises every header as `Name: Value\r\n`.
    ///
    /// No space is inserted after the colon when the stored value already
    /// begins with one.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.entries {
            out.push_str(name);
            out.push(':');
            if !value.starts_with(' ') {
                out.push(' ');
            }
            out.push_str(value);
            out.push_str("\r\n");
        }
        out
    }

    /// Checks every header can be carried by the transport.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.entries {
            wire_pair(name, value)?;
        }
        Ok(())
    }

    /// Converts to an `http::HeaderMap`, trimming the stored leading space.
    pub fn to_header_map(&self) -> Result<http::HeaderMap> {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let (name, value) = wire_pair(name, value)?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// Stores an `Authorization` header built from user and password.
    ///
    /// The value is kept in its pre-formatted leading-space form,
    /// `" <scheme> <base64(user:pass)>"`.
    pub fn set_authentication(&mut self, user: &str, pass: &str, scheme: &str) {
        let token = STANDARD.encode(format!("{}:{}", user, pass));
        self.insert("Authorization", format!(" {} {}", scheme, token));
    }

    /// Decodes the `Authorization` header back into its parts.
    ///
    /// Returns `None` when no header is set or it is not `<scheme> <base64>`
    /// with a `user:pass` payload.
    pub fn authentication(&self) -> Option<Credentials> {
        let value = self.get("Authorization")?;
        let mut parts = value.split_whitespace();
        let scheme = parts.next()?;
        let decoded = STANDARD.decode(parts.next()?).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, pass) = decoded.split_once(':')?;
        Some(Credentials {
            user: user.to_string(),
            pass: pass.to_string(),
            scheme: scheme.to_string(),
        })
    }

    pub fn remove_authentication(&mut self) {
        self.remove("Authorization");
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// Credentials decoded from an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
    pub scheme: String,
}

impl<N, V> FromIterator<(N, V)> for HeaderList
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

fn wire_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value =
        HeaderValue::from_str(value.trim_start()).map_err(|e| Error::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok((header_name, header_value))
}
