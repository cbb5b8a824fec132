//! Extension to MIME type lookup for multipart attachments.
//!
//! A table derived from Apache's `mime.types` is bundled with the crate and
//! loaded into a process-wide [`OnceLock`] on first use. A custom table can be
//! installed with [`install`] before anything resolves a type. Unknown
//! extensions fall back to [`sniff`], which looks at the file content.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Content type used when neither extension nor content identify a file.
pub const OCTET_STREAM: &str = "application/octet-stream";

static TABLE: OnceLock<MimeTable> = OnceLock::new();

const BUNDLED: &[(&str, &str)] = &[
    ("7z", "application/x-7z-compressed"),
    ("aac", "audio/aac"),
    ("avi", "video/x-msvideo"),
    ("bmp", "image/bmp"),
    ("bz2", "application/x-bzip2"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("eot", "application/vnd.ms-fontobject"),
    ("epub", "application/epub+zip"),
    ("flac", "audio/x-flac"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("ics", "text/calendar"),
    ("jar", "application/java-archive"),
    ("jpe", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("m4a", "audio/mp4"),
    ("md", "text/markdown"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("otf", "font/otf"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("ps", "application/postscript"),
    ("rar", "application/x-rar-compressed"),
    ("rtf", "application/rtf"),
    ("svg", "image/svg+xml"),
    ("svgz", "image/svg+xml"),
    ("swf", "application/x-shockwave-flash"),
    ("tar", "application/x-tar"),
    ("tex", "application/x-tex"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain"),
    ("wav", "audio/x-wav"),
    ("weba", "audio/webm"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("xhtml", "application/xhtml+xml"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xml", "application/xml"),
    ("xsd", "application/xml"),
    ("xsl", "application/xml"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("zip", "application/zip"),
];

/// Extension to MIME type map. Extensions are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    /// Returns the table bundled with the crate.
    pub fn bundled() -> Self {
        BUNDLED.iter().copied().collect()
    }

    /// Parses a table in Apache `mime.types` format.
    ///
    /// Each non-comment line holds a type followed by its extensions.
    /// Lines without any extension are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use qengine_client::mime::MimeTable;
    ///
    /// let table = MimeTable::from_mime_types(
    ///     "# comment\napplication/x-moodle-question\tmqx qxml\ntext/x-empty\n",
    /// );
    /// assert_eq!(table.get("qxml"), Some("application/x-moodle-question"));
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_mime_types(text: &str) -> Self {
        let mut table = Self::default();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(mime) = tokens.next() else {
                continue;
            };
            for ext in tokens {
                table.insert(ext, mime);
            }
        }
        table
    }

    pub fn insert(&mut self, extension: &str, mime: &str) {
        self.types
            .insert(extension.to_ascii_lowercase(), mime.to_string());
    }

    pub fn get(&self, extension: &str) -> Option<&str> {
        self.types
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Looks up the type for a file name by its extension.
    pub fn for_filename(&self, filename: &str) -> Option<&str> {
        let ext = Path::new(filename).extension()?.to_str()?;
        self.get(ext)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for MimeTable {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut table = Self::default();
        for (ext, mime) in iter {
            table.insert(ext, mime);
        }
        table
    }
}

/// Installs a custom process-wide table.
///
/// The custom table replaces the bundled one entirely; it is not merged.
/// Start from [`MimeTable::bundled`] and [`MimeTable::insert`] to extend
/// the defaults instead. Succeeds only if no table has been loaded yet,
/// either by an earlier `install` or by a lookup; otherwise the rejected
/// table is handed back.
pub fn install(table: MimeTable) -> Result<(), MimeTable> {
    TABLE.set(table)
}

/// Returns the process-wide table, loading the bundled one on first use.
pub fn table() -> &'static MimeTable {
    TABLE.get_or_init(MimeTable::bundled)
}

/// Resolves the MIME type for an attachment.
///
/// The extension is tried first, then the content, then
/// [`OCTET_STREAM`].
pub fn resolve(filename: &str, content: &[u8]) -> String {
    match table().for_filename(filename) {
        Some(mime) => mime.to_string(),
        None => sniff(content).unwrap_or(OCTET_STREAM).to_string(),
    }
}

/// Guesses a MIME type from leading magic bytes.
///
/// Falls back to `text/plain` for content that is valid UTF-8 without
/// control characters.
pub fn sniff(content: &[u8]) -> Option<&'static str> {
    const MAGIC: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF-", "application/pdf"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"BM", "image/bmp"),
        (b"ID3", "audio/mpeg"),
        (b"OggS", "audio/ogg"),
        (b"<?xml", "application/xml"),
    ];

    if content.is_empty() {
        return None;
    }
    if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| content.starts_with(magic)) {
        return Some(*mime);
    }
    if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    let text = std::str::from_utf8(content).ok()?;
    let trimmed = text.trim_start();
    let head: String = trimmed.chars().take(15).collect::<String>().to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Some("text/html");
    }
    if text
        .chars()
        .all(|c| !c.is_control() || c.is_ascii_whitespace())
    {
        return Some("text/plain");
    }
    None
}
