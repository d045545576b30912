/*!

# Strata

Strata is a library for building and reading a segment-oriented inverted
index, written in Rust and modeled closely on Lucene's classic file
format and merge design.

## Features

* Binary I/O primitives (`VInt`/`VLong`, fixed-width integers, length-
  prefixed strings) shared by every on-disk structure.
* A `FieldInfos` registry assigning stable field numbers in first-seen
  order, serialized to `.fnm`.
* Stored fields (`.fdt`/`.fdx`) for verbatim document retrieval.
* A prefix-compressed, sorted term dictionary (`.tis`) with a sparse
  skip index (`.tii`).
* Delta-coded frequency and position streams (`.frq`/`.prx`).
* Per-field length norms (`.fN`).
* A segment reader and an n-way priority-queue merger.
* An `IndexWriter` that flushes one document per segment and runs a
  tiered merge policy to keep the segment count low.

## Example

```ignore
let mut writer = IndexWriter::open("path/to/index", Box::new(WhitespaceAnalyzer), true)?;
writer.add_document(
    &Document::new()
        .add(Field::keyword("path", "/etc/test.txt"))
        .add(Field::text("body", "the quick brown fox")),
)?;
writer.close()?;
```

## Design

Strata is structured around indexes and segments, exactly as Lucene is:
a segment is an immutable collection of on-disk files, and an index is
an ordered set of segments recorded in a `segments` file. Adding a
document flushes it as a brand-new one-document segment; over time the
tiered merge policy folds small segments into larger ones so that a
long-running writer does not accumulate one segment per document.

Unlike a full search engine, Strata does not implement query execution,
scoring, or concurrent multi-writer indexing — it is the storage and
merge layer those features would be built on top of.

*/

#![allow(unknown_lints)]

pub mod analyzer;
pub mod dict;
pub mod directory;
pub mod document;
pub mod error;
pub mod fieldinfos;
pub mod freqpos;
pub mod io;
pub mod merger;
pub mod norms;
pub mod options;
pub mod postings;
pub mod segment;
pub mod segments_file;
pub mod stored;
pub mod term;
pub mod writer;

pub use document::{Document, Field};
pub use error::{Error, Result};
pub use options::Options;
pub use segment::SegmentReader;
pub use segments_file::{SegmentInfo, SegmentInfos};
pub use term::Term;
pub use writer::IndexWriter;
