use std::ops::Range;

/// Byte range into the source text.
pub type Span = Range<usize>;

/// A parsed property-list value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(Str),
    Data(Data),
    Dict(Dict),
    Array(Array),
}

/// A quoted or bare string, with the inline `/* comment */` that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Str {
    /// Unescaped contents.
    pub value: String,
    pub quoted: bool,
    pub comment: Option<String>,
    /// Covers the string token only, not its comment.
    pub span: Span,
}

/// A `<hex>` data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    pub bytes: Vec<u8>,
    pub span: Span,
}

/// A `{ key = value; }` dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict {
    pub entries: Vec<DictEntry>,
    /// From the opening `{` through the closing `}` inclusive.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub key: Str,
    pub value: Value,
}

/// A `( a, b, )` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
    pub items: Vec<Value>,
    /// From the opening `(` through the closing `)` inclusive.
    pub span: Span,
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::String(s) => s.span.clone(),
            Value::Data(d) => d.span.clone(),
            Value::Dict(d) => d.span.clone(),
            Value::Array(a) => a.span.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&s.value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&Str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Data(_) => "data",
            Value::Dict(_) => "dictionary",
            Value::Array(_) => "array",
        }
    }
}

impl Dict {
    /// Look up `key`. When a key repeats, the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key.value == key)
            .map(|entry| &entry.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(Value::as_dict)
    }

    pub fn get_array(&self, key: &str) -> Option<&Array> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte offset of the closing `}`.
    pub fn close_offset(&self) -> usize {
        self.span.end - 1
    }
}

impl Array {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// String items in order; non-string items are skipped.
    pub fn strings(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(Value::as_str)
    }

    /// Byte offset of the closing `)`.
    pub fn close_offset(&self) -> usize {
        self.span.end - 1
    }
}
