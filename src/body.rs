//! Request body encoding.
//!
//! A [`Body`] is what the caller supplies: nothing, a JSON object, or a raw
//! pre-serialised string. Combined with the file attachments of a request it
//! becomes a [`BodyPayload`], which knows its content type and wire bytes:
//!
//! - no files and a non-empty object: the object as JSON
//! - no files and no content: an empty body
//! - files: `multipart/form-data` with one `file-{index}` part per file and
//!   a trailing `json` part holding the remaining fields
//!
//! String input goes through [`parse_body_input`], which accepts either a
//! JSON object or a strictly alternating `key=value&key=value` query string.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde_json::{Map, Value};

use crate::{mime, Error, Result};

const BOUNDARY_PREFIX: &str = "--------------------------";

/// Caller-supplied request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body content.
    #[default]
    Empty,
    /// Structured fields, serialised as a JSON object.
    Json(Map<String, Value>),
    /// Already-serialised content, sent untouched.
    Raw(String),
}

impl Body {
    /// Interprets a string as body input: JSON object first, then query string.
    ///
    /// An empty string yields [`Body::Empty`].
    ///
    /// # Examples
    ///
    /// ```
    /// use qengine_client::Body;
    /// use serde_json::json;
    ///
    /// let body = Body::parse("names=a&values=b").unwrap();
    /// assert_eq!(body, Body::Json(json!({"names": "a", "values": "b"}).as_object().unwrap().clone()));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self::from_map(parse_body_input(input)?))
    }

    /// Converts a JSON value into a body.
    ///
    /// Objects become [`Body::Json`], strings go through [`Body::parse`] and
    /// `null` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBodyType`] for arrays, numbers and booleans.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Body::Empty),
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::String(s) => Self::parse(&s),
            other => Err(Error::UnsupportedBodyType(type_name(&other))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Json(map) => map.is_empty(),
            Body::Raw(raw) => raw.is_empty(),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        if map.is_empty() {
            Body::Empty
        } else {
            Body::Json(map)
        }
    }

    fn json_text(&self) -> Result<String> {
        match self {
            Body::Empty => Ok("{}".to_string()),
            Body::Json(map) => {
                serde_json::to_string(map).map_err(|e| Error::SerializationFailed(e.to_string()))
            }
            Body::Raw(raw) => Ok(raw.clone()),
        }
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

/// Decodes string body input into fields.
///
/// JSON is attempted first. If that fails the input (minus a leading `?`) is
/// accepted as a URL-encoded query string only when it contains at least one
/// `=` and every `=` and `&` strictly alternate, starting with `=`.
///
/// # Errors
///
/// Returns [`Error::MalformedBodyInput`] when the input is neither, and
/// [`Error::UnsupportedBodyType`] for JSON that is not an object.
pub fn parse_body_input(input: &str) -> Result<Map<String, Value>> {
    if input.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(Value::Null) | Err(_) => {}
        Ok(other) => return Err(Error::UnsupportedBodyType(type_name(&other))),
    }

    let query = input.strip_prefix('?').unwrap_or(input);
    if !is_query_string(query) {
        return Err(Error::MalformedBodyInput(input.to_string()));
    }

    Ok(url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect())
}

/// Character-level query string check used by [`parse_body_input`].
pub fn is_query_string(input: &str) -> bool {
    if !input.contains('=') {
        return false;
    }
    let mut next = '=';
    for c in input.chars() {
        if c == '=' || c == '&' {
            if c != next {
                return false;
            }
            next = if c == '=' { '&' } else { '=' };
        }
    }
    true
}

/// A file to upload with a request.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    source: AttachmentSource,
    filename: String,
    mime_type: Option<String>,
}

/// Where attachment content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentSource {
    /// Read from disk when the request is built.
    Path(PathBuf),
    /// Supplied in memory.
    Bytes(Vec<u8>),
}

impl FileAttachment {
    /// Attaches a file on disk; the part's filename is the path's base name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source: AttachmentSource::Path(path),
            filename,
            mime_type: None,
        }
    }

    /// Attaches in-memory content under the given filename.
    pub fn from_bytes(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            source: AttachmentSource::Bytes(content.into()),
            filename: filename.into(),
            mime_type: None,
        }
    }

    /// Overrides MIME type resolution for this attachment.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn source(&self) -> &AttachmentSource {
        &self.source
    }

    /// Reads the content and resolves the MIME type.
    pub fn load(&self) -> Result<FilePart> {
        let content = match &self.source {
            AttachmentSource::Path(path) => read(path)?,
            AttachmentSource::Bytes(bytes) => bytes.clone(),
        };
        let mime_type = match &self.mime_type {
            Some(mime) => mime.clone(),
            None => mime::resolve(&self.filename, &content),
        };
        Ok(FilePart {
            filename: self.filename.clone(),
            mime_type,
            content,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// A loaded attachment ready to be written into a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// A multipart/form-data body with its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipart {
    boundary: String,
    files: Vec<FilePart>,
    json: String,
}

impl Multipart {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// The content of the trailing `json` part.
    pub fn json(&self) -> &str {
        &self.json
    }

    fn to_bytes(&self) -> Vec<u8> {
        let boundary = &self.boundary;
        let mut out = Vec::new();
        for (index, file) in self.files.iter().enumerate() {
            out.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file-{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    boundary,
                    index,
                    file.filename.replace('"', "%22"),
                    file.mime_type
                )
                .as_bytes(),
            );
            out.extend_from_slice(&file.content);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"json\"\r\nContent-Type: application/json\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        out.extend_from_slice(self.json.as_bytes());
        out.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        out
    }
}

/// A body combined with its attachments, ready for the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyPayload {
    #[default]
    Empty,
    Json(Map<String, Value>),
    Raw(String),
    Multipart(Multipart),
}

impl BodyPayload {
    /// Combines a body with attachments, loading every attachment.
    ///
    /// The multipart boundary is regenerated until it appears in neither
    /// the file contents nor the JSON part.
    pub fn new(body: Body, files: &[FileAttachment]) -> Result<Self> {
        if files.is_empty() {
            return Ok(match body {
                Body::Json(map) if !map.is_empty() => BodyPayload::Json(map),
                Body::Raw(raw) if !raw.is_empty() => BodyPayload::Raw(raw),
                _ => BodyPayload::Empty,
            });
        }

        let files = files
            .iter()
            .map(FileAttachment::load)
            .collect::<Result<Vec<_>>>()?;
        let json = body.json_text()?;

        let mut contents: Vec<&[u8]> = files.iter().map(|f| f.content.as_slice()).collect();
        contents.push(json.as_bytes());
        let boundary = choose_boundary(&contents, generate_boundary);

        Ok(BodyPayload::Multipart(Multipart {
            boundary,
            files,
            json,
        }))
    }

    /// The content type this payload forces on the request, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            BodyPayload::Json(_) => Some("application/json".to_string()),
            BodyPayload::Multipart(m) => Some(format!("multipart/form-data; boundary={}", m.boundary)),
            BodyPayload::Empty | BodyPayload::Raw(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BodyPayload::Empty)
    }

    /// Encodes the payload to wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            BodyPayload::Empty => Ok(Vec::new()),
            BodyPayload::Json(map) => {
                serde_json::to_vec(map).map_err(|e| Error::SerializationFailed(e.to_string()))
            }
            BodyPayload::Raw(raw) => Ok(raw.as_bytes().to_vec()),
            BodyPayload::Multipart(multipart) => Ok(multipart.to_bytes()),
        }
    }
}

/// Encodes a body and its attachments in one step.
pub fn encode(body: &Body, files: &[FileAttachment]) -> Result<Vec<u8>> {
    BodyPayload::new(body.clone(), files)?.to_bytes()
}

fn generate_boundary() -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let salt: u32 = rand::thread_rng().gen();
    format!("{}{}{:08x}", BOUNDARY_PREFIX, micros, salt)
}

fn choose_boundary(contents: &[&[u8]], mut candidate: impl FnMut() -> String) -> String {
    loop {
        let boundary = candidate();
        if !contents.iter().any(|c| contains(c, boundary.as_bytes())) {
            return boundary;
        }
        tracing::debug!(boundary = %boundary, "Multipart boundary collides with content, regenerating");
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn parse_body_input_accepts_query_strings() {
        let fields = parse_body_input("a=1&b=2").unwrap();
        assert_eq!(fields, object(json!({"a": "1", "b": "2"})));

        let fields = parse_body_input("?name=J%C3%BCrgen+K&empty=").unwrap();
        assert_eq!(fields, object(json!({"name": "Jürgen K", "empty": ""})));
    }

    #[test]
    fn parse_body_input_prefers_json() {
        let fields = parse_body_input("{\"a\":1}").unwrap();
        assert_eq!(fields, object(json!({"a": 1})));
    }

    #[test]
    fn parse_body_input_rejects_everything_else() {
        for input in ["not json & not query!!", "a=b=c", "a&b=c", "=&=&&", "null"] {
            let err = parse_body_input(input).unwrap_err();
            assert!(matches!(err, Error::MalformedBodyInput(_)), "{input}");
        }
    }

    #[test]
    fn parse_body_input_rejects_non_object_json() {
        let err = parse_body_input("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::UnsupportedBodyType("array")));
    }

    #[test]
    fn query_validator_requires_alternation() {
        assert!(is_query_string("a=1"));
        assert!(is_query_string("a=1&b"));
        assert!(is_query_string("a=1&b=2&"));
        assert!(!is_query_string("a"));
        assert!(!is_query_string("&a=1"));
        assert!(!is_query_string("a=1&&b=2"));
    }

    #[test]
    fn from_value_dispatches_on_type() {
        assert_eq!(Body::from_value(Value::Null).unwrap(), Body::Empty);
        assert_eq!(Body::from_value(json!({})).unwrap(), Body::Empty);
        assert_eq!(Body::from_value(json!("")).unwrap(), Body::Empty);
        assert_eq!(
            Body::from_value(json!("x=1")).unwrap(),
            Body::Json(object(json!({"x": "1"})))
        );
        assert!(matches!(
            Body::from_value(json!(42)).unwrap_err(),
            Error::UnsupportedBodyType("number")
        ));
        assert!(matches!(
            Body::from_value(json!(true)).unwrap_err(),
            Error::UnsupportedBodyType("boolean")
        ));
    }

    #[test]
    fn encode_empty_body_is_empty() {
        assert!(encode(&Body::Empty, &[]).unwrap().is_empty());
        assert!(encode(&Body::Json(Map::new()), &[]).unwrap().is_empty());
    }

    #[test]
    fn encode_object_is_json() {
        let fields = object(json!({"questionID": "q1", "initialParamNames": ["randomseed"]}));
        let bytes = encode(&Body::Json(fields.clone()), &[]).unwrap();
        let decoded: Map<String, Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn raw_body_is_untouched() {
        let envelope = "<soap:Envelope>  </soap:Envelope>";
        let payload = BodyPayload::new(Body::Raw(envelope.to_string()), &[]).unwrap();
        assert_eq!(payload.content_type(), None);
        assert_eq!(payload.to_bytes().unwrap(), envelope.as_bytes());
    }

    #[test]
    fn multipart_with_two_files() {
        let files = [
            FileAttachment::from_bytes("question.xml", "<question/>"),
            FileAttachment::from_bytes("diagram.png", b"\x89PNG\r\n\x1a\nrest".to_vec()),
        ];
        let body = Body::Json(object(json!({"passKey": "k"})));
        let payload = BodyPayload::new(body, &files).unwrap();

        let BodyPayload::Multipart(multipart) = &payload else {
            panic!("expected multipart, got {:?}", payload);
        };
        let boundary = multipart.boundary().to_string();
        assert!(boundary.starts_with(BOUNDARY_PREFIX));
        assert_eq!(
            payload.content_type().unwrap(),
            format!("multipart/form-data; boundary={}", boundary)
        );

        let bytes = payload.to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches(&format!("--{}\r\n", boundary)).count(), 3);
        assert_eq!(text.matches(&format!("--{}--\r\n", boundary)).count(), 1);
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"file-0\"; filename=\"question.xml\"\r\nContent-Type: application/xml\r\n\r\n<question/>\r\n"
        ));
        assert!(text.contains("name=\"file-1\"; filename=\"diagram.png\"\r\nContent-Type: image/png"));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"json\"\r\nContent-Type: application/json\r\n\r\n{\"passKey\":\"k\"}\r\n"
        ));
        assert!(!text.contains("file-2"));
    }

    #[test]
    fn multipart_without_fields_sends_empty_object() {
        let files = [FileAttachment::from_bytes("a.txt", "hello")];
        let BodyPayload::Multipart(multipart) = BodyPayload::new(Body::Empty, &files).unwrap() else {
            panic!("expected multipart");
        };
        assert_eq!(multipart.json(), "{}");
    }

    #[test]
    fn boundary_is_regenerated_on_collision() {
        let content = b"header --------------------------1 trailer".as_slice();
        let mut candidates = vec![
            format!("{}2", BOUNDARY_PREFIX),
            format!("{}1", BOUNDARY_PREFIX),
        ];
        let chosen = choose_boundary(&[content], || candidates.pop().unwrap());
        assert_eq!(chosen, format!("{}2", BOUNDARY_PREFIX));
    }

    #[test]
    fn boundary_never_appears_in_near_miss_content() {
        let near_miss = format!("{}{}", BOUNDARY_PREFIX, "123456789").into_bytes();
        let files = [FileAttachment::from_bytes("trap.bin", near_miss.clone())];
        let BodyPayload::Multipart(multipart) = BodyPayload::new(Body::Empty, &files).unwrap() else {
            panic!("expected multipart");
        };
        assert!(!contains(&near_miss, multipart.boundary().as_bytes()));
    }

    #[test]
    fn explicit_mime_type_wins() {
        let part = FileAttachment::from_bytes("data.bin", vec![0u8, 1, 2])
            .with_mime_type("application/x-qengine")
            .load()
            .unwrap();
        assert_eq!(part.mime_type, "application/x-qengine");
    }

    #[test]
    fn from_path_uses_base_name_and_reads_content() {
        let dir = std::env::temp_dir().join(format!("qengine-body-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("upload.json");
        std::fs::write(&path, "{\"k\":1}").unwrap();

        let part = FileAttachment::from_path(&path).load().unwrap();
        assert_eq!(part.filename, "upload.json");
        assert_eq!(part.mime_type, "application/json");
        assert_eq!(part.content, b"{\"k\":1}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = FileAttachment::from_path("/nonexistent/qengine/file.txt")
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
