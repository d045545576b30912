//! The analyzer collaborator (§1, §9 "tokenized path gap"): a pluggable
//! function mapping `(field, text)` to an ordered stream of tokens. Richer
//! analyzers are explicitly out of scope; this module keeps the teacher's
//! `Analyzer` trait shape (`analyzis.rs`) but only ships the two
//! implementations the spec actually needs.

use std::borrow::Cow;

pub trait Analyzer: Send + Sync {
    fn analyze<'a>(&self, value: &'a str) -> Box<dyn Iterator<Item = Cow<'a, str>> + 'a>;
}

/// The trivial analyzer required by §1: emits the whole field value as one
/// token. Used for untokenized (`tokenized == false`) fields, where the
/// posting accumulator bypasses the analyzer entirely per §4.4 — this type
/// exists so callers that want a uniform `Analyzer` interface have a
/// no-op implementation available.
#[derive(Clone, Debug, Default)]
pub struct KeywordAnalyzer;

impl Analyzer for KeywordAnalyzer {
    fn analyze<'a>(&self, value: &'a str) -> Box<dyn Iterator<Item = Cow<'a, str>> + 'a> {
        Box::new(std::iter::once(Cow::Borrowed(value)))
    }
}

/// Ported from the teacher's `WhiteSpaceAnalyzer`. Exercises the
/// tokenized code path end-to-end without pulling in full Unicode
/// segmentation, which is out of scope (§1 non-goals).
#[derive(Clone, Debug, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn analyze<'a>(&self, value: &'a str) -> Box<dyn Iterator<Item = Cow<'a, str>> + 'a> {
        Box::new(value.split_whitespace().map(Cow::Borrowed))
    }
}
