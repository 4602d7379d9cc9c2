//! Frontmatter extraction and field access.

use serde_yaml::{Mapping, Value};

/// Keys accepted as the publish flag, checked in order.
pub const PUBLISH_KEYS: [&str; 2] = ["published", "是否发布"];

/// String values that read as "not published".
const FALSY_STRINGS: [&str; 5] = ["false", "no", "off", "0", "否"];

/// Metadata block of a note.
///
/// Values are kept as raw YAML; the accessors normalize them the way the
/// exporter needs them. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Mapping,
}

impl FrontMatter {
    /// Wrap an already parsed mapping.
    pub fn from_mapping(fields: Mapping) -> Self {
        Self { fields }
    }

    /// True when the document had no metadata at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw value of a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Scalar value of a key rendered as a string.
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    pub fn title(&self) -> Option<String> {
        self.string("title")
    }

    pub fn slug(&self) -> Option<String> {
        self.string("slug")
    }

    pub fn date(&self) -> Option<String> {
        self.string("date")
    }

    pub fn summary(&self) -> Option<String> {
        self.string("summary")
    }

    /// Tags as an ordered list.
    ///
    /// Accepts a YAML sequence or a comma separated string.
    pub fn tags(&self) -> Vec<String> {
        match self.get("tags") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Cover value as written.
    ///
    /// An unquoted `cover: [[pic.png]]` parses as a nested sequence in YAML;
    /// it is turned back into the bracketed text the author meant.
    pub fn cover(&self) -> Option<String> {
        match self.get("cover")? {
            Value::Sequence(outer) => match outer.as_slice() {
                [Value::Sequence(inner)] => match inner.as_slice() {
                    [name] => scalar_to_string(name).map(|n| format!("[[{n}]]")),
                    _ => None,
                },
                _ => None,
            },
            other => scalar_to_string(other),
        }
    }

    /// Whether either publish key holds a truthy value.
    pub fn is_published(&self) -> bool {
        PUBLISH_KEYS
            .iter()
            .any(|key| self.get(key).is_some_and(is_truthy))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && !FALSY_STRINGS.iter().any(|f| s.eq_ignore_ascii_case(f))
        }
        Value::Sequence(_) | Value::Mapping(_) => true,
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Split raw note text into frontmatter and body.
///
/// The block opens with a `---` line at the very top and closes at the next
/// `---` (or `...`) line. The body is everything after the closing line,
/// untouched. Text without an opening line has empty metadata and is
/// returned whole.
pub fn split_frontmatter(source: &str) -> Result<(FrontMatter, &str), FrontmatterError> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((FrontMatter::default(), source));
    };
    if !first.ends_with('\n') || first.trim_end() != "---" {
        return Ok((FrontMatter::default(), source));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;

    for line in lines {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            let fields = parse_yaml(&text[yaml_start..offset])?;
            let body = &text[offset + line.len()..];
            return Ok((FrontMatter::from_mapping(fields), body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed)
}

fn parse_yaml(yaml: &str) -> Result<Mapping, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    match value {
        Value::Mapping(fields) => Ok(fields),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter is not a key/value mapping")]
    NotAMapping,
}
