use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;

/// Largest digest size, in bytes, the scheme accepts. It bounds the
/// fixed-size digest buffers.
pub const MAX_DIGEST_BYTES: usize = 64;

/// Number of candidate preimages per digest bit.
pub const BLOCKS_PER_BIT: usize = 2;

/// Dimensions of keys and signatures, all derived from the digest size `h`
/// of the selected hash algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    algorithm: HashAlgorithm,
    digest_bytes: usize,
}

impl Params {
    pub fn new(algorithm: HashAlgorithm) -> Result<Self> {
        let digest_bytes = algorithm.digest_bytes();
        check_digest_bytes(algorithm.name(), digest_bytes)?;
        Ok(Self {
            algorithm,
            digest_bytes,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// `h`: size of a digest and of every block.
    pub fn digest_bytes(&self) -> usize {
        self.digest_bytes
    }

    /// `8h`: number of digest bits, and of signature blocks.
    pub fn digest_bits(&self) -> usize {
        self.digest_bytes * 8
    }

    /// `n = 16h`: number of blocks in a secret or public key.
    pub fn block_count(&self) -> usize {
        BLOCKS_PER_BIT * self.digest_bits()
    }

    pub fn secret_key_bytes(&self) -> usize {
        self.block_count() * self.digest_bytes
    }

    pub fn public_key_bytes(&self) -> usize {
        self.secret_key_bytes()
    }

    pub fn signature_blocks(&self) -> usize {
        self.digest_bits()
    }

    pub fn signature_bytes(&self) -> usize {
        self.signature_blocks() * self.digest_bytes
    }
}

impl TryFrom<HashAlgorithm> for Params {
    type Error = Error;

    fn try_from(algorithm: HashAlgorithm) -> Result<Self> {
        Self::new(algorithm)
    }
}

fn check_digest_bytes(algorithm: &'static str, digest_bytes: usize) -> Result<()> {
    if digest_bytes > MAX_DIGEST_BYTES {
        return Err(Error::DigestTooLarge {
            algorithm,
            bits: digest_bytes * 8,
            max_bits: MAX_DIGEST_BYTES * 8,
        });
    }
    Ok(())
}
