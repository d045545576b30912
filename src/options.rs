/// Process-wide configuration, reified as an immutable value instead of
/// global constants, passed into the writer and readers that need it.
#[derive(Clone, Debug)]
pub struct Options {
    /// How often a `.tis` entry is mirrored into the `.tii` skip index.
    pub index_interval: u32,
    /// Tier size ratio; a tier rolls up when it accumulates enough
    /// documents to reach the current target.
    pub merge_factor: i64,
    /// The largest document count `maybe_merge` will ever target.
    pub max_merge_docs: i64,
    /// Per-field occurrence cap applied when inverting tokenized fields.
    pub max_field_length: u64,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            index_interval: 128,
            merge_factor: 10,
            max_merge_docs: i64::MAX,
            max_field_length: 10_000,
        }
    }
}
