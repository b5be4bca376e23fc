//! Recovers back-to-back JSON documents from a single dump.
//!
//! clang writes one document per invocation with nothing in between, so a
//! dump that was appended to (or produced by a driver that ran several
//! compile jobs) holds several top-level values. The decoder itself reports
//! where each value ends; no delimiter is needed.

use serde::{Deserialize, Deserializer};
use serde_json::de::{SliceRead, StreamDeserializer};

/// Decodes `T` on a stack that grows on demand, so nesting depth is bounded
/// by memory rather than by the calling thread's stack.
struct Stacked<T>(T);

impl<'de, T> Deserialize<'de> for Stacked<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(serde_stacker::Deserializer::new(deserializer)).map(Stacked)
    }
}

/// Lazy, single-pass sequence of decoded documents.
///
/// Yields nothing for an empty or whitespace-only blob. The first decode
/// error (including invalid UTF-8) is yielded once and ends the sequence,
/// so a truncated tail never produces a partial document.
pub struct DocumentSplitter<'a, T> {
    stream: StreamDeserializer<'a, SliceRead<'a>, Stacked<T>>,
    finished: bool,
}

impl<'a, T> DocumentSplitter<'a, T>
where
    T: Deserialize<'a>,
{
    pub fn new(blob: &'a [u8]) -> Self {
        let mut de = serde_json::Deserializer::from_slice(blob);
        de.disable_recursion_limit();
        Self {
            stream: de.into_iter(),
            finished: false,
        }
    }

    /// Bytes of the blob consumed by the documents decoded so far.
    pub fn byte_offset(&self) -> usize {
        self.stream.byte_offset()
    }
}

impl<'a, T> Iterator for DocumentSplitter<'a, T>
where
    T: Deserialize<'a>,
{
    type Item = serde_json::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let next = self.stream.next();
        if !matches!(next, Some(Ok(_))) {
            self.finished = true;
        }
        next.map(|document| document.map(|Stacked(value)| value))
    }
}

pub fn split_documents<'a, T>(blob: &'a [u8]) -> DocumentSplitter<'a, T>
where
    T: Deserialize<'a>,
{
    DocumentSplitter::new(blob)
}
