// Property File Parser
// Parses simple key=value files used for step files and narrator.cfg

use std::fs;
use std::io;
use std::path::Path;

/// Parse property file content, invoking `handler` for each key-value pair.
///
/// Rules:
/// - blank lines are skipped
/// - `#` starts a comment (whole line or inline); `\#` is a literal `#`
/// - whitespace around keys and values is trimmed, key case is preserved
/// - a line without `=` is skipped with a warning
///
/// # Arguments
/// * `data` - The property file content to parse
/// * `handler` - Callback invoked with `(key, value)` for each entry
/// * `prefix` - Optional prefix prepended to all keys
pub fn parse_propfile(data: &str, handler: &mut dyn FnMut(&str, &str), prefix: Option<&str>) {
    for (line_no, raw) in data.lines().enumerate() {
        let line = strip_comment(raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("line {}: key without value: {:?}", line_no + 1, line);
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            log::warn!("line {}: value without key", line_no + 1);
            continue;
        }
        let value = value.trim();

        match prefix {
            Some(pfx) => handler(&format!("{}{}", pfx, key), value),
            None => handler(key, value),
        }
    }
}

/// Cut a line at the first unescaped `#`, unescaping `\#` on the way.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("property file not found: {0}")]
    FileNotFound(String),
    #[error("I/O error reading property file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Ordered collection of key-value pairs from a property file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyFile {
    entries: Vec<(String, String)>,
}

impl PropertyFile {
    /// Load a property file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PropertyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => PropertyError::FileNotFound(path.display().to_string()),
            _ => PropertyError::Io {
                path: path.display().to_string(),
                source: err,
            },
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse property file content
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        parse_propfile(
            content,
            &mut |key, value| entries.push((key.to_string(), value.to_string())),
            None,
        );
        Self { entries }
    }

    /// Get a value by key. A key given more than once resolves to its last value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
