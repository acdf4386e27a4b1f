//! In-memory page buffers.

/// An uncompressed column page as handed to the sink or returned by the
/// source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub buf: Vec<u8>,
    pub n_elements: u32,
}

impl Page {
    pub fn new(buf: Vec<u8>, n_elements: u32) -> Self {
        Self { buf, n_elements }
    }
}

/// A column page after compression and framing, ready to be written to
/// (or as read back from) storage verbatim. Immutable between seal and
/// commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPage {
    pub buf: Vec<u8>,
    pub n_elements: u32,
}

impl SealedPage {
    pub fn new(buf: Vec<u8>, n_elements: u32) -> Self {
        Self { buf, n_elements }
    }

    /// Size in bytes on storage.
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}
