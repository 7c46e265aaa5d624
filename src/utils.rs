//! Utility functions.

/// Granule the loader maps regions with.
pub const PAGE_SIZE: u64 = 0x1000;

/// Number of pages needed to cover `len` bytes.
pub fn pages_count(len: u64) -> u64 {
    len.div_ceil(PAGE_SIZE)
}
