use crate::params::BLOCKS_PER_BIT;

/// Returns bit `bit` of `data`, reading the most significant bit of each byte
/// first, or `None` when the bit lies past the end of `data`.
pub fn bit_at(data: &[u8], bit: usize) -> Option<u8> {
    let byte = data.get(bit / 8)?;
    Some((byte >> (7 - (bit % 8))) & 1)
}

/// Index of the key block committed to digest bit `bit` having value `value`.
pub(crate) fn block_index(bit: usize, value: u8) -> usize {
    BLOCKS_PER_BIT * bit + value as usize
}

/// Byte offset of block `index` in a key of `block_bytes`-sized blocks.
pub(crate) fn block_offset(index: usize, block_bytes: usize) -> u64 {
    (index as u64) * (block_bytes as u64)
}
