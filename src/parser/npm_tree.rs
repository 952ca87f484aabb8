//! Parser for `npm ls --all --json` dependency trees.
//!
//! Converts the nested JSON tree into a flat, normalized sequence of
//! dependency tuples (see [`NormalizedTree`]). The walk is depth-first and
//! keeps the textual order of the input file, which is what makes table
//! and DOT output reproducible across runs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::types::{DependencyTuple, NormalizedTree, NpmTree, PackageRef};

/// Errors that can occur during lock-tree ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Failed to read the input file from disk.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid JSON.
    #[error("malformed JSON at byte {offset}: {source}")]
    Json {
        /// Byte offset of the first offending character.
        offset: usize,
        /// The underlying serde_json error.
        source: serde_json::Error,
    },

    /// An entry is structurally invalid (missing a required field).
    #[error("missing version for package `{package}` at {path}")]
    Schema {
        /// The package whose entry is invalid.
        package: String,
        /// JSON path of the entry, e.g. `dependencies.a.dependencies.b`.
        path: String,
    },
}

/// Result type alias for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Parses an `npm ls --json` dump from a file path.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use lockscope::parser::parse_file;
///
/// let tree = parse_file(Path::new("deps.json")).unwrap();
/// println!("{} relations", tree.tuples.len());
/// ```
pub fn parse_file(path: &Path) -> IngestResult<NormalizedTree> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses an `npm ls --json` dump from a string.
///
/// The top-level object may carry `name` and `version` for the project
/// itself and a `dependencies` map. Each dependency entry has a concrete
/// `version`, an optional nested `dependencies` map, and may be marked
/// `"deduped": true` when it repeats a package resolved elsewhere in the
/// tree. Deduped entries become edges to the already-seen package and are
/// not descended into.
///
/// # Example
///
/// ```
/// use lockscope::parser::parse_str;
///
/// let json = r#"{"dependencies": {"a": {"version": "1.0.0"}}}"#;
/// let tree = parse_str(json).unwrap();
/// assert_eq!(tree.tuples.len(), 1);
/// assert_eq!(tree.tuples[0].child.name, "a");
/// ```
pub fn parse_str(content: &str) -> IngestResult<NormalizedTree> {
    let raw: NpmTree = serde_json::from_str(content).map_err(|source| IngestError::Json {
        offset: byte_offset(content, source.line(), source.column()),
        source,
    })?;

    // Dumps without a top-level `name` describe only the package set;
    // no project node is synthesized for them.
    let root = raw
        .name
        .as_deref()
        .map(|name| PackageRef::new(name, raw.version.as_deref().unwrap_or("0.0.0")));

    let walk_parent = root
        .clone()
        .unwrap_or_else(|| PackageRef::new("root", "0.0.0"));
    let mut walker = Walker::new(content);
    walker.walk(&raw.dependencies, &walk_parent, 1, "dependencies")?;

    debug!(
        root = %walk_parent,
        tuples = walker.tuples.len(),
        "normalized lock tree"
    );

    Ok(NormalizedTree {
        root,
        root_line: 1,
        tuples: walker.tuples,
    })
}

/// Depth-first walk state: the tuple accumulator, the line cursor over the
/// raw input, and the last version seen for each package name (used to
/// resolve deduped entries).
struct Walker<'a> {
    tuples: Vec<DependencyTuple>,
    cursor: LineCursor<'a>,
    seen_versions: HashMap<String, String>,
}

impl<'a> Walker<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            tuples: Vec::new(),
            cursor: LineCursor::new(content),
            seen_versions: HashMap::new(),
        }
    }

    fn walk(
        &mut self,
        deps: &Map<String, Value>,
        parent: &PackageRef,
        depth: usize,
        path: &str,
    ) -> IngestResult<()> {
        for (name, entry) in deps {
            let entry_path = format!("{path}.{name}");
            let line = self.cursor.locate_key(name);

            let obj = entry.as_object().ok_or_else(|| IngestError::Schema {
                package: name.clone(),
                path: entry_path.clone(),
            })?;

            let deduped = obj
                .get("deduped")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let version = match obj.get("version").and_then(Value::as_str) {
                Some(v) => v.to_string(),
                // npm omits the version on some deduped entries; the
                // package was seen in full earlier in the walk.
                None if deduped => self
                    .seen_versions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| IngestError::Schema {
                        package: name.clone(),
                        path: entry_path.clone(),
                    })?,
                None => {
                    return Err(IngestError::Schema {
                        package: name.clone(),
                        path: entry_path,
                    })
                }
            };

            let child = PackageRef::new(name.clone(), version.clone());
            self.seen_versions.insert(name.clone(), version);
            self.tuples.push(DependencyTuple {
                parent: parent.clone(),
                child: child.clone(),
                child_line: line,
                depth,
            });

            if !deduped {
                if let Some(nested) = obj.get("dependencies").and_then(Value::as_object) {
                    let nested_path = format!("{entry_path}.dependencies");
                    self.walk(nested, &child, depth + 1, &nested_path)?;
                }
            }
        }
        Ok(())
    }
}

/// Forward-only cursor that maps package keys to line numbers in the raw
/// input.
///
/// `npm ls --json` emits each dependency key exactly where the walk visits
/// it, so searching forward from the previous match gives the exact first
/// occurrence without re-scanning the file.
struct LineCursor<'a> {
    text: &'a str,
    byte: usize,
    line: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            line: 1,
        }
    }

    /// Finds the next occurrence of `"key"` in key position (followed by
    /// a colon) and returns its line number, advancing the cursor past
    /// it. A string *value* that happens to equal a package name is
    /// skipped, otherwise it would steal the match and skew provenance
    /// for every later package. Returns 0 if the key cannot be found,
    /// which only happens on inputs that did not come from the walked
    /// JSON text.
    fn locate_key(&mut self, key: &str) -> usize {
        let needle = format!("\"{}\"", escape_json_key(key));
        let mut from = self.byte;
        while let Some(rel) = self.text[from..].find(&needle) {
            let start = from + rel;
            let after = start + needle.len();
            if self.text[after..].trim_start().starts_with(':') {
                self.line += self.text[self.byte..start].matches('\n').count();
                self.byte = after;
                return self.line;
            }
            from = after;
        }
        0
    }
}

/// Escapes a key the way serde_json would have serialized it, so the
/// cursor search matches the raw text.
fn escape_json_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Converts serde_json's (line, column) error position into a byte offset
/// in the original input.
fn byte_offset(content: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let mut offset = 0;
    for (i, l) in content.split('\n').enumerate() {
        if i + 1 == line {
            return offset + column.saturating_sub(1).min(l.len());
        }
        offset += l.len() + 1;
    }
    content.len()
}
