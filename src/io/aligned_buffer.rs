// Page-aligned byte buffers for direct I/O

/// Alignment requirements for Direct I/O
pub const SECTOR_SIZE: usize = 512;
pub const PAGE_SIZE: usize = 4096;

/// Heap buffer whose first byte sits on an `alignment` boundary.
///
/// The allocation is over-sized by one alignment unit and the visible window
/// starts at the first aligned address inside it. The heap block never moves
/// for the lifetime of the buffer, so the window stays aligned.
pub struct AlignedBuffer {
    storage: Vec<u8>,
    offset: usize,
    len: usize,
    alignment: usize,
}

impl AlignedBuffer {
    /// Zero-filled buffer of `len` bytes aligned to `alignment` (a power of two)
    pub fn new(len: usize, alignment: usize) -> Self {
        debug_assert!(alignment.is_power_of_two(), "alignment must be a power of two");

        let storage = vec![0u8; len + alignment];
        let addr = storage.as_ptr() as usize;
        let offset = (alignment - addr % alignment) % alignment;

        Self {
            storage,
            offset,
            len,
            alignment,
        }
    }

    /// Create buffer aligned to page boundary (4KB)
    pub fn page_aligned(len: usize) -> Self {
        Self::new(len, PAGE_SIZE)
    }

    /// Page-aligned copy of `data`
    pub fn from_slice(data: &[u8]) -> Self {
        let mut buffer = Self::page_aligned(data.len());
        buffer.as_mut_slice().copy_from_slice(data);
        buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Shorten the visible window; no-op if `len` is not smaller
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn fill(&mut self, byte: u8) {
        self.as_mut_slice().fill(byte);
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}
