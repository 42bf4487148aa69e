//! Regrouping of flat key/value line streams into structured records.
//!
//! MPD list responses are flat: `file: a.mp3`, `Title: A`, `file: b.mp3`,
//! and so on. The grouper turns such a stream back into per-object records
//! using caller-supplied delimiter keys, either flat (one level) or
//! hierarchical (delimiters ordered parent to child, children collected
//! under a synthetic `children` field).
//!
//! All behavior is driven by an explicit [`GrouperConfig`] threaded through
//! each call; there is deliberately no process-wide parser state.

use bytes::Bytes;

use crate::response::ResponseLine;

/// Key under which hierarchical grouping collects nested records.
pub const CHILDREN_KEY: &str = "children";

/// A field value inside a grouped record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text value
    Text(String),
    /// Integer value (after typed coercion)
    Integer(i64),
    /// Floating-point value (after typed coercion)
    Float(f64),
    /// Boolean value (after typed coercion)
    Boolean(bool),
    /// Binary payload substituted from a `binary: <n>` record
    Binary(Bytes),
    /// Accumulated values of a repeated key
    List(Vec<Value>),
    /// Nested records under the `children` key
    Records(Vec<Record>),
}

impl Value {
    /// The text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One grouped record: an ordered key → value mapping.
///
/// Insertion order is preserved so records can be serialized back into the
/// line order they came from. Repeated keys accumulate into [`Value::List`]
/// instead of overwriting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields (a repeated key counts once).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable iteration, used by typed coercion.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert a field, accumulating repeated keys into a list.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, Value::List(items))) => items.push(value),
            Some((_, existing)) => {
                let prior = std::mem::replace(existing, Value::Text(String::new()));
                *existing = Value::List(vec![prior, value]);
            }
            None => self.fields.push((key, value)),
        }
    }

    /// Append a nested record to this record's `children` list.
    pub fn push_child(&mut self, child: Record) {
        match self.fields.iter_mut().find(|(k, _)| k == CHILDREN_KEY) {
            Some((_, Value::Records(records))) => records.push(child),
            Some((_, other)) => {
                // A literal field named "children" is displaced by the
                // synthetic grouping key.
                *other = Value::Records(vec![child]);
            }
            None => self
                .fields
                .push((CHILDREN_KEY.to_string(), Value::Records(vec![child]))),
        }
    }

    /// The nested records under `children`, if any.
    pub fn children(&self) -> Option<&[Record]> {
        match self.get(CHILDREN_KEY) {
            Some(Value::Records(records)) => Some(records),
            _ => None,
        }
    }
}

/// Configuration for one grouping pass.
#[derive(Debug, Clone)]
pub struct GrouperConfig {
    /// Delimiter keys; flat mode treats them as alternatives, hierarchical
    /// mode treats them as ordered parent → child levels
    pub delimiters: Vec<String>,
    /// Fold keys to canonical snake identifiers before matching and output
    /// Default: true
    pub normalize_keys: bool,
}

impl GrouperConfig {
    /// Create a config with the given delimiter keys and normalization on.
    pub fn new<I, S>(delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            delimiters: delimiters.into_iter().map(Into::into).collect(),
            normalize_keys: true,
        }
    }

    /// Toggle key normalization.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_keys = normalize;
        self
    }

    fn fold(&self, key: &str) -> String {
        if self.normalize_keys {
            normalize_key(key)
        } else {
            key.to_string()
        }
    }
}

/// Fold a wire key to a canonical snake identifier.
///
/// `Last-Modified` becomes `last_modified`, `Title` becomes `title`.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn parse_field(line: &ResponseLine, config: &GrouperConfig) -> Option<(String, Value)> {
    let (key, value) = line.split_field()?;
    let key = config.fold(key);
    let value = if key == "binary" {
        Value::Binary(line.binary.clone().unwrap_or_default())
    } else {
        Value::Text(value.to_string())
    };
    Some((key, value))
}

/// Group a line stream into flat records.
///
/// A line whose key matches any delimiter flushes the current non-empty
/// record and starts a new one. With no delimiters supplied, the first
/// line's key becomes the sole delimiter. Lines without a `": "` separator
/// are skipped.
pub fn group_flat(lines: &[ResponseLine], config: &GrouperConfig) -> Vec<Record> {
    let mut delimiters: Vec<String> = config.delimiters.iter().map(|d| config.fold(d)).collect();
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in lines {
        let Some((key, value)) = parse_field(line, config) else {
            continue;
        };
        if delimiters.is_empty() {
            delimiters.push(key.clone());
        }
        if delimiters.iter().any(|d| *d == key) && !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
        current.insert(key, value);
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

/// Group a line stream into hierarchical records.
///
/// Delimiters are ordered parent → child. A top-level delimiter line
/// flushes the previous completed top-level record; a deeper delimiter line
/// starts a child appended to the record one level up. Lines seen before
/// any top-level delimiter accumulate into leading flat records that keep
/// their stream position ahead of the grouped output.
pub fn group_hierarchical(lines: &[ResponseLine], config: &GrouperConfig) -> Vec<Record> {
    let delimiters: Vec<String> = config.delimiters.iter().map(|d| config.fold(d)).collect();
    let mut records = Vec::new();
    // stack[d] is the record currently open at depth d.
    let mut stack: Vec<Record> = Vec::new();
    let mut preamble = Record::new();

    for line in lines {
        let Some((key, value)) = parse_field(line, config) else {
            continue;
        };
        match delimiters.iter().position(|d| *d == key) {
            Some(depth) if depth == 0 || depth <= stack.len() => {
                if depth == 0 {
                    if !preamble.is_empty() {
                        records.push(std::mem::take(&mut preamble));
                    }
                    if let Some(done) = collapse_to(&mut stack, 0) {
                        records.push(done);
                    }
                } else {
                    // Returning to depth d discards any deeper ancestry.
                    collapse_to(&mut stack, depth);
                }
                let mut record = Record::new();
                record.insert(key, value);
                stack.push(record);
            }
            _ => {
                // Non-delimiter line, or a deep delimiter with no open
                // parent: merge into whatever record is current.
                match stack.last_mut() {
                    Some(top) => top.insert(key, value),
                    None => preamble.insert(key, value),
                }
            }
        }
    }

    if !preamble.is_empty() {
        records.push(preamble);
    }
    if let Some(done) = collapse_to(&mut stack, 0) {
        records.push(done);
    }
    records
}

/// Fold open records deeper than `depth` into their parents' children.
///
/// Returns the completed top-level record when collapsing to depth 0.
fn collapse_to(stack: &mut Vec<Record>, depth: usize) -> Option<Record> {
    while stack.len() > depth.max(1) {
        if let (Some(child), Some(parent)) = (stack.pop(), stack.last_mut()) {
            parent.push_child(child);
        }
    }
    if depth == 0 {
        stack.pop()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<ResponseLine> {
        input.iter().map(|l| ResponseLine::text(*l)).collect()
    }

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    #[test]
    fn test_flat_grouping_by_file() {
        let input = lines(&["file: a.mp3", "Title: A", "file: b.mp3", "Title: B"]);
        let records = group_flat(&input, &GrouperConfig::new(["file"]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("file"), Some(&text("a.mp3")));
        assert_eq!(records[0].get("title"), Some(&text("A")));
        assert_eq!(records[1].get("file"), Some(&text("b.mp3")));
        assert_eq!(records[1].get("title"), Some(&text("B")));
    }

    #[test]
    fn test_flat_without_delimiter_adopts_first_key() {
        let input = lines(&["playlist: one", "playlist: two", "playlist: three"]);
        let records = group_flat(&input, &GrouperConfig::new(Vec::<String>::new()));
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].get("playlist"), Some(&text("three")));
    }

    #[test]
    fn test_repeated_key_accumulates_into_list() {
        let input = lines(&[
            "file: a.mp3",
            "Artist: X",
            "Artist: Y",
            "Artist: Z",
        ]);
        let records = group_flat(&input, &GrouperConfig::new(["file"]));
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("artist"),
            Some(&Value::List(vec![text("X"), text("Y"), text("Z")]))
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = lines(&["file: a.mp3", "garbage", "Title: A"]);
        let records = group_flat(&input, &GrouperConfig::new(["file"]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn test_binary_key_substitutes_payload() {
        let mut input = lines(&["size: 3"]);
        input.push(ResponseLine::with_binary(
            "binary: 3",
            Bytes::from_static(b"\x01\x02\x03"),
        ));
        let records = group_flat(&input, &GrouperConfig::new(["size"]));
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("binary"),
            Some(&Value::Binary(Bytes::from_static(b"\x01\x02\x03")))
        );
    }

    #[test]
    fn test_normalization_folds_punctuation() {
        assert_eq!(normalize_key("Last-Modified"), "last_modified");
        assert_eq!(normalize_key("Title"), "title");
        assert_eq!(normalize_key("already_snake"), "already_snake");

        let input = lines(&["directory: Music", "Last-Modified: 2024-01-01"]);
        let records = group_flat(&input, &GrouperConfig::new(["directory"]));
        assert_eq!(
            records[0].get("last_modified"),
            Some(&text("2024-01-01"))
        );
    }

    #[test]
    fn test_normalization_can_be_disabled() {
        let input = lines(&["directory: Music", "Last-Modified: 2024-01-01"]);
        let config = GrouperConfig::new(["directory"]).with_normalization(false);
        let records = group_flat(&input, &config);
        assert_eq!(records[0].get("Last-Modified"), Some(&text("2024-01-01")));
        assert_eq!(records[0].get("last_modified"), None);
    }

    #[test]
    fn test_hierarchical_directories_with_files() {
        let input = lines(&[
            "directory: Music",
            "Last-Modified: D1",
            "file: Music/a.mp3",
            "Title: A",
            "directory: Pod",
            "Last-Modified: D2",
            "file: Pod/b.mp3",
            "Title: B",
        ]);
        let records = group_hierarchical(&input, &GrouperConfig::new(["directory", "file"]));
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.get("directory"), Some(&text("Music")));
        assert_eq!(first.get("last_modified"), Some(&text("D1")));
        assert!(matches!(
            first.get(crate::CHILDREN_KEY),
            Some(Value::Records(_))
        ));
        let children = first.children().expect("children present");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].get("file"), Some(&text("Music/a.mp3")));
        assert_eq!(children[0].get("title"), Some(&text("A")));

        let second = &records[1];
        assert_eq!(second.get("directory"), Some(&text("Pod")));
        let children = second.children().expect("children present");
        assert_eq!(children[0].get("file"), Some(&text("Pod/b.mp3")));
    }

    #[test]
    fn test_hierarchical_three_levels_and_shallower_return() {
        let input = lines(&[
            "a: 1",
            "b: 1.1",
            "c: 1.1.1",
            "b: 1.2",
            "a: 2",
        ]);
        let records = group_hierarchical(&input, &GrouperConfig::new(["a", "b", "c"]));
        assert_eq!(records.len(), 2);
        let children = records[0].children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get("b"), Some(&text("1.1")));
        assert_eq!(
            children[0].children().unwrap()[0].get("c"),
            Some(&text("1.1.1"))
        );
        // "b: 1.2" discarded the deeper "c" level and has no children.
        assert_eq!(children[1].get("b"), Some(&text("1.2")));
        assert!(children[1].children().is_none());
    }

    #[test]
    fn test_hierarchical_preamble_precedes_groups() {
        let input = lines(&[
            "updating_db: 5",
            "directory: Music",
            "file: Music/a.mp3",
        ]);
        let records = group_hierarchical(&input, &GrouperConfig::new(["directory", "file"]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("updating_db"), Some(&text("5")));
        assert!(records[0].children().is_none());
        assert_eq!(records[1].get("directory"), Some(&text("Music")));
    }

    #[test]
    fn test_flat_round_trip() {
        let input = lines(&[
            "file: a.mp3",
            "title: A",
            "artist: X",
            "artist: Y",
            "file: b.mp3",
            "title: B",
        ]);
        let config = GrouperConfig::new(["file"]);
        let records = group_flat(&input, &config);

        // Serialize grouped records back into lines and regroup them.
        let mut serialized = Vec::new();
        for record in &records {
            for (key, value) in record.iter() {
                match value {
                    Value::Text(v) => serialized.push(ResponseLine::text(format!("{key}: {v}"))),
                    Value::List(items) => {
                        for item in items {
                            if let Value::Text(v) = item {
                                serialized.push(ResponseLine::text(format!("{key}: {v}")));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        let regrouped = group_flat(&serialized, &config);
        assert_eq!(regrouped, records);
    }
}
