//! Data model (§3): `Document` and `Field`. Grounded on the teacher's
//! `doc.rs` (a `Doc = HashMap<String, FieldValue>`), generalized from an
//! unordered map of bare strings to an ordered list of flagged fields, as
//! required by the stored/indexed/tokenized distinctions of §3 and the
//! insertion-order requirement of §4.2.

/// One field within a `Document`. Value semantics: the value is copied
/// into the posting table and/or stored-field stream by the writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub stored: bool,
    pub indexed: bool,
    pub tokenized: bool,
}

impl Field {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Field {
        Field {
            name: name.into(),
            value: value.into(),
            stored: false,
            indexed: false,
            tokenized: false,
        }
    }

    pub fn stored(mut self, v: bool) -> Field {
        self.stored = v;
        self
    }

    pub fn indexed(mut self, v: bool) -> Field {
        self.indexed = v;
        self
    }

    pub fn tokenized(mut self, v: bool) -> Field {
        self.tokenized = v;
        self
    }

    /// A field that is stored verbatim and indexed as one untokenized
    /// (keyword) occurrence — the common case in §8's end-to-end scenarios.
    pub fn keyword<N: Into<String>, V: Into<String>>(name: N, value: V) -> Field {
        Field::new(name, value).stored(true).indexed(true)
    }

    /// A field that is stored and indexed through the analyzer, one
    /// occurrence per emitted token.
    pub fn text<N: Into<String>, V: Into<String>>(name: N, value: V) -> Field {
        Field::new(name, value).stored(true).indexed(true).tokenized(true)
    }
}

/// An ordered list of fields, with an optional boost. Belongs to the
/// caller; the writer only borrows it for the duration of `add_document`.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub fields: Vec<Field>,
    pub boost: Option<f32>,
}

impl Document {
    pub fn new() -> Document {
        Document {
            fields: Vec::new(),
            boost: None,
        }
    }

    pub fn add(mut self, field: Field) -> Document {
        self.fields.push(field);
        self
    }

    pub fn boost(mut self, boost: f32) -> Document {
        self.boost = Some(boost);
        self
    }
}
