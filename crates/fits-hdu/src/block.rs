/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Signature every conforming FITS file starts with.
pub const MAGIC: &[u8; 6] = b"SIMPLE";

/// Returns the byte length of `num_bytes` rounded up to whole blocks.
///
/// Zero bytes occupy zero blocks; anything else occupies at least one.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Returns `true` if `block` begins with the FITS magic bytes.
///
/// Inputs shorter than the magic never match.
pub fn has_magic(block: &[u8]) -> bool {
    block.len() >= MAGIC.len() && &block[..MAGIC.len()] == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_relationships() {
        assert_eq!(BLOCK_SIZE, 2880);
        assert_eq!(CARD_SIZE, 80);
        assert_eq!(CARDS_PER_BLOCK, 36);
        assert_eq!(CARDS_PER_BLOCK * CARD_SIZE, BLOCK_SIZE);
    }

    #[test]
    fn padded_len_rounds_up() {
        assert_eq!(padded_byte_len(0), 0);
        assert_eq!(padded_byte_len(1), BLOCK_SIZE);
        assert_eq!(padded_byte_len(BLOCK_SIZE), BLOCK_SIZE);
        assert_eq!(padded_byte_len(BLOCK_SIZE + 1), 2 * BLOCK_SIZE);
        assert_eq!(padded_byte_len(400), BLOCK_SIZE);
    }

    #[test]
    fn magic_matches_prefix() {
        assert!(has_magic(b"SIMPLE  =                    T"));
        assert!(has_magic(b"SIMPLE"));
    }

    #[test]
    fn magic_rejects_others() {
        assert!(!has_magic(b"XTENSION= 'IMAGE   '"));
        assert!(!has_magic(b"SIMPL"));
        assert!(!has_magic(b"simple"));
        assert!(!has_magic(b""));
        assert!(!has_magic(b"\x89PNG\r\n\x1a\n"));
    }
}
