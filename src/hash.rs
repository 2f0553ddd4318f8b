//! Hash provider for the scheme.
//!
//! The algorithm is an explicit configuration value, selected by name and
//! passed into every operation through [`Params`](crate::params::Params).
//! Each algorithm is backed by a RustCrypto implementation and driven through
//! the object-safe [`DynDigest`] interface.

use crate::error::{io_error, Error, Result};
use crate::params::{Params, MAX_DIGEST_BYTES};
use crate::utils::bit_at;
use blake2::{Blake2b512, Blake2s256};
use sha2::digest::core_api::BlockSizeUser;
use sha2::digest::DynDigest;
use sha2::{Sha224, Sha256, Sha384, Sha512, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};
use std::fmt;
use std::io::{ErrorKind, Read};
use std::str::FromStr;
use std::sync::atomic::{compiler_fence, Ordering};

/// Chunk size used when streaming a message through the hash function.
const MESSAGE_CHUNK_BYTES: usize = 8192;

/// Largest input block of any supported algorithm (SHA3-224).
const MAX_BLOCK_BYTES: usize = 144;

const SCRUB_ZEROS: [u8; MAX_BLOCK_BYTES] = [0u8; MAX_BLOCK_BYTES];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake2b512,
    Blake2s256,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 12] = [
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha512_224,
        HashAlgorithm::Sha512_256,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
        HashAlgorithm::Blake2b512,
        HashAlgorithm::Blake2s256,
    ];

    /// Canonical lowercase name, as accepted by `--hash`.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha512_224 => "sha512-224",
            HashAlgorithm::Sha512_256 => "sha512-256",
            HashAlgorithm::Sha3_224 => "sha3-224",
            HashAlgorithm::Sha3_256 => "sha3-256",
            HashAlgorithm::Sha3_384 => "sha3-384",
            HashAlgorithm::Sha3_512 => "sha3-512",
            HashAlgorithm::Blake2b512 => "blake2b512",
            HashAlgorithm::Blake2s256 => "blake2s256",
        }
    }

    /// Digest size in bytes.
    pub fn digest_bytes(&self) -> usize {
        match self {
            HashAlgorithm::Sha224 | HashAlgorithm::Sha512_224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha256
            | HashAlgorithm::Sha512_256
            | HashAlgorithm::Sha3_256
            | HashAlgorithm::Blake2s256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 | HashAlgorithm::Blake2b512 => 64,
        }
    }

    /// Creates a fresh streaming state for this algorithm.
    pub fn hasher(&self) -> Hasher {
        self.new_hasher(false)
    }

    /// Creates a streaming state for hashing secret key blocks. The buffered
    /// input is overwritten after every digest, on [`Hasher::reset`] and when
    /// the state is dropped.
    pub fn secret_hasher(&self) -> Hasher {
        self.new_hasher(true)
    }

    fn new_hasher(&self, confidential: bool) -> Hasher {
        let (inner, block_bytes) = match self {
            HashAlgorithm::Sha224 => boxed::<Sha224>(),
            HashAlgorithm::Sha256 => boxed::<Sha256>(),
            HashAlgorithm::Sha384 => boxed::<Sha384>(),
            HashAlgorithm::Sha512 => boxed::<Sha512>(),
            HashAlgorithm::Sha512_224 => boxed::<Sha512_224>(),
            HashAlgorithm::Sha512_256 => boxed::<Sha512_256>(),
            HashAlgorithm::Sha3_224 => boxed::<Sha3_224>(),
            HashAlgorithm::Sha3_256 => boxed::<Sha3_256>(),
            HashAlgorithm::Sha3_384 => boxed::<Sha3_384>(),
            HashAlgorithm::Sha3_512 => boxed::<Sha3_512>(),
            HashAlgorithm::Blake2b512 => boxed::<Blake2b512>(),
            HashAlgorithm::Blake2s256 => boxed::<Blake2s256>(),
        };
        Hasher {
            inner,
            block_bytes,
            confidential,
        }
    }
}

fn boxed<D>() -> (Box<dyn DynDigest + Send>, usize)
where
    D: DynDigest + BlockSizeUser + Default + Send + 'static,
{
    (Box::new(D::default()), D::block_size())
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    /// Accepts the canonical names as well as libgcrypt-style spellings such
    /// as `SHA256`, `SHA3-256`, `SHA-256` or `BLAKE2B_512`.
    fn from_str(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let normalized = match normalized.strip_prefix("sha-") {
            Some(rest) => format!("sha{}", rest),
            None => normalized,
        };
        HashAlgorithm::ALL
            .iter()
            .copied()
            .find(|alg| {
                let canonical = alg.name();
                normalized == canonical || normalized == canonical.replace('-', "")
            })
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_owned()))
    }
}

/// Streaming digest state (init, update, finalize).
pub struct Hasher {
    inner: Box<dyn DynDigest + Send>,
    block_bytes: usize,
    confidential: bool,
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Writes the digest into `out` and resets the state, so the next block
    /// starts from a fresh hash.
    pub fn finalize_into_reset(&mut self, out: &mut [u8]) -> Result<()> {
        let expected = self.inner.output_size();
        let result = self
            .inner
            .finalize_into_reset(out)
            .map_err(|_| Error::BadLength(expected, out.len()));
        if self.confidential {
            self.scrub();
        }
        result
    }

    pub fn reset(&mut self) {
        if self.confidential {
            self.scrub();
        } else {
            self.inner.reset();
        }
    }

    pub fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    pub fn block_size(&self) -> usize {
        self.block_bytes
    }

    pub fn is_confidential(&self) -> bool {
        self.confidential
    }

    /// Resetting only rewinds the buffer position, so the bytes of a partial
    /// block stay behind. Buffering one byte short of a block overwrites
    /// every position a secret block shorter than that can occupy, in both
    /// eager and lazy buffers, without running the compression function.
    fn scrub(&mut self) {
        self.inner.reset();
        self.inner.update(&SCRUB_ZEROS[..self.block_bytes - 1]);
        self.inner.reset();
        compiler_fence(Ordering::SeqCst);
    }
}

impl Drop for Hasher {
    fn drop(&mut self) {
        if self.confidential {
            self.scrub();
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("output_size", &self.output_size())
            .field("block_size", &self.block_bytes)
            .field("confidential", &self.confidential)
            .finish_non_exhaustive()
    }
}

/// The `h`-byte digest of a whole message.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageDigest {
    bytes: [u8; MAX_DIGEST_BYTES],
    len: usize,
}

impl MessageDigest {
    /// Hashes everything `message` yields, in one pass.
    pub fn compute<R: Read>(params: &Params, mut message: R) -> Result<Self> {
        let mut hasher = params.algorithm().hasher();
        let mut chunk = [0u8; MESSAGE_CHUNK_BYTES];
        loop {
            let read = match message.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error("Failed to read message")(e)),
            };
            hasher.update(&chunk[..read]);
        }

        let mut digest = Self {
            bytes: [0u8; MAX_DIGEST_BYTES],
            len: params.digest_bytes(),
        };
        hasher.finalize_into_reset(&mut digest.bytes[..digest.len])?;
        Ok(digest)
    }

    /// Digest of an in-memory message.
    pub fn of(params: &Params, message: &[u8]) -> Result<Self> {
        Self::compute(params, message)
    }

    /// Wraps an already computed digest, which must be exactly `h` bytes.
    pub fn from_bytes(params: &Params, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != params.digest_bytes() {
            return Err(Error::BadLength(params.digest_bytes(), bytes.len()));
        }
        let mut digest = Self {
            bytes: [0u8; MAX_DIGEST_BYTES],
            len: bytes.len(),
        };
        digest.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(digest)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit `index`, most significant bit of byte 0 first.
    pub fn bit(&self, index: usize) -> Option<u8> {
        bit_at(self.as_bytes(), index)
    }

    /// All `8h` bits in signing order.
    pub fn bits(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len * 8).map_while(move |i| self.bit(i))
    }
}

impl AsRef<[u8]> for MessageDigest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for MessageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for MessageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageDigest({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_parse_names() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(alg.name().parse::<HashAlgorithm>().unwrap(), alg);
        }
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA3-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha3_512);
        assert_eq!("sha3512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha3_512);
        assert_eq!(
            "BLAKE2B_512".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Blake2b512
        );
        assert_eq!("sha512-224".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512_224);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(Error::UnknownAlgorithm(name)) if name == "md5"
        ));
        assert!("".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_digest_sizes_match_implementations() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(alg.hasher().output_size(), alg.digest_bytes(), "{}", alg);
        }
    }

    #[test]
    fn test_block_sizes_hold_a_digest() {
        for alg in HashAlgorithm::ALL {
            let hasher = alg.secret_hasher();
            assert!(hasher.is_confidential());
            assert!(hasher.block_size() <= MAX_BLOCK_BYTES, "{}", alg);
            assert!(alg.digest_bytes() < hasher.block_size() - 1, "{}", alg);
        }
        assert_eq!(HashAlgorithm::Sha256.hasher().block_size(), 64);
        assert_eq!(HashAlgorithm::Sha3_224.hasher().block_size(), 144);
        assert_eq!(HashAlgorithm::Blake2b512.hasher().block_size(), 128);
    }

    /// Raw bytes of the boxed digest state.
    fn state_bytes(hasher: &Hasher) -> Vec<u8> {
        let state: &dyn DynDigest = &*hasher.inner;
        let len = std::mem::size_of_val(state);
        let ptr = state as *const dyn DynDigest as *const u8;
        unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    fn secret_block(alg: HashAlgorithm) -> Vec<u8> {
        (0..alg.digest_bytes()).map(|i| 0xc3 ^ (i as u8).wrapping_mul(37)).collect()
    }

    #[test]
    fn test_plain_state_keeps_buffered_input() {
        for alg in [HashAlgorithm::Sha256, HashAlgorithm::Sha3_256, HashAlgorithm::Blake2b512] {
            let secret = secret_block(alg);
            let mut hasher = alg.hasher();
            hasher.update(&secret);
            let mut out = vec![0u8; alg.digest_bytes()];
            hasher.finalize_into_reset(&mut out).unwrap();
            assert!(contains(&state_bytes(&hasher), &secret), "{}", alg);
        }
    }

    #[test]
    fn test_secret_state_is_scrubbed_after_digest() {
        for alg in HashAlgorithm::ALL {
            let secret = secret_block(alg);
            let mut hasher = alg.secret_hasher();
            hasher.update(&secret);
            let mut out = vec![0u8; alg.digest_bytes()];
            hasher.finalize_into_reset(&mut out).unwrap();
            assert!(!contains(&state_bytes(&hasher), &secret), "{}", alg);

            let mut plain = alg.hasher();
            plain.update(&secret);
            let mut expected = vec![0u8; alg.digest_bytes()];
            plain.finalize_into_reset(&mut expected).unwrap();
            assert_eq!(out, expected, "{}", alg);
        }
    }

    #[test]
    fn test_secret_state_is_scrubbed_on_reset() {
        for alg in HashAlgorithm::ALL {
            let secret = secret_block(alg);
            let mut hasher = alg.secret_hasher();
            hasher.update(&secret);
            hasher.reset();
            assert!(!contains(&state_bytes(&hasher), &secret), "{}", alg);

            // The state is still usable afterwards.
            let mut out = vec![0u8; alg.digest_bytes()];
            hasher.finalize_into_reset(&mut out).unwrap();
            let mut empty = vec![0u8; alg.digest_bytes()];
            alg.hasher().finalize_into_reset(&mut empty).unwrap();
            assert_eq!(out, empty, "{}", alg);
        }
    }

    #[test]
    fn test_secret_state_is_scrubbed_on_failed_digest() {
        let alg = HashAlgorithm::Sha512;
        let secret = secret_block(alg);
        let mut hasher = alg.secret_hasher();
        hasher.update(&secret);
        let mut short = [0u8; 8];
        assert!(matches!(
            hasher.finalize_into_reset(&mut short),
            Err(Error::BadLength(64, 8))
        ));
        assert!(!contains(&state_bytes(&hasher), &secret));
    }

    #[test]
    fn test_known_sha256_digest() {
        let params = Params::new(HashAlgorithm::Sha256).unwrap();
        let digest = MessageDigest::of(&params, b"").unwrap();
        assert_eq!(
            digest.to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let digest = MessageDigest::of(&params, b"abc").unwrap();
        assert_eq!(
            digest.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_independent_of_chunking() {
        let params = Params::new(HashAlgorithm::Sha3_256).unwrap();
        let message: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

        // A reader that hands out at most 7 bytes per call.
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = buf.len().min(7).min(self.0.len());
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let whole = MessageDigest::of(&params, &message).unwrap();
        let trickled = MessageDigest::compute(&params, Trickle(&message)).unwrap();
        assert_eq!(whole, trickled);
    }

    #[test]
    fn test_message_read_failure_is_fatal() {
        let params = Params::new(HashAlgorithm::Sha256).unwrap();
        let result = MessageDigest::compute(&params, FailingReader);
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_digest_bits_order() {
        let params = Params::new(HashAlgorithm::Sha256).unwrap();
        let mut raw = [0u8; 32];
        raw[0] = 0x80;
        raw[31] = 0x01;
        let digest = MessageDigest::from_bytes(&params, &raw).unwrap();
        let bits: Vec<u8> = digest.bits().collect();
        assert_eq!(bits.len(), 256);
        assert_eq!(bits[0], 1);
        assert!(bits[1..255].iter().all(|b| *b == 0));
        assert_eq!(bits[255], 1);
        assert_eq!(digest.bit(256), None);

        assert!(matches!(
            MessageDigest::from_bytes(&params, &raw[..31]),
            Err(Error::BadLength(32, 31))
        ));
    }
}
