use crate::blocks::{check_len, expect_end, read_block_from, write_context};
use crate::error::{io_error, Result, Stream};
use crate::params::{Params, MAX_DIGEST_BYTES};
use crate::secmem::SecretBuffer;
use rayon::prelude::*;
use std::io::{Read, Write};
use tracing::debug;

/// Streams a secret key from `secret` and writes the matching public key to
/// `public`, one block at a time.
///
/// Every block is hashed with a freshly reset state, which is scrubbed again
/// once the digest is out. The secret key must end exactly after its `n`-th
/// block; a short final block or trailing bytes are reported as format
/// errors.
pub fn derive_public_key<R, W>(params: &Params, mut secret: R, mut public: W) -> Result<()>
where
    R: Read,
    W: Write,
{
    let h = params.digest_bytes();
    let mut hasher = params.algorithm().secret_hasher();
    let mut block = SecretBuffer::new(h);
    let mut commitment = [0u8; MAX_DIGEST_BYTES];

    for _ in 0..params.block_count() {
        read_block_from(&mut secret, &mut block, Stream::SecretKey)?;
        hasher.reset();
        hasher.update(&block);
        hasher.finalize_into_reset(&mut commitment[..h])?;
        public
            .write_all(&commitment[..h])
            .map_err(io_error(write_context(Stream::PublicKey)))?;
    }
    expect_end(&mut secret, Stream::SecretKey)?;

    public
        .flush()
        .map_err(io_error(write_context(Stream::PublicKey)))?;
    debug!(
        algorithm = %params.algorithm(),
        blocks = params.block_count(),
        "derived public key"
    );
    Ok(())
}

/// Derives a public key from an in-memory secret key, hashing blocks in
/// parallel. Each worker owns its own scrubbed hash state and writes a
/// disjoint output block.
pub fn derive_public_key_bytes(params: &Params, secret: &[u8]) -> Result<Vec<u8>> {
    check_len(
        secret.len() as u64,
        params.secret_key_bytes() as u64,
        Stream::SecretKey,
    )?;

    let h = params.digest_bytes();
    let algorithm = params.algorithm();
    let mut public = vec![0u8; params.public_key_bytes()];
    public
        .par_chunks_exact_mut(h)
        .zip(secret.par_chunks_exact(h))
        .try_for_each_init(
            || algorithm.secret_hasher(),
            |hasher, (commitment, block)| {
                hasher.update(block);
                hasher.finalize_into_reset(commitment)
            },
        )?;
    Ok(public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::hash::HashAlgorithm;
    use crate::keygen;

    fn setup(alg: HashAlgorithm) -> (Params, Vec<u8>) {
        let params = Params::new(alg).unwrap();
        let key = keygen::generate(&params).unwrap();
        (params, key.as_bytes().to_vec())
    }

    #[test]
    fn test_each_block_is_hash_of_secret_block() {
        let (params, secret) = setup(HashAlgorithm::Sha256);
        let mut public = Vec::new();
        derive_public_key(&params, &secret[..], &mut public).unwrap();
        assert_eq!(public.len(), params.public_key_bytes());

        let h = params.digest_bytes();
        for index in [0, 1, params.block_count() / 2, params.block_count() - 1] {
            let mut hasher = params.algorithm().hasher();
            hasher.update(&secret[index * h..(index + 1) * h]);
            let mut expected = vec![0u8; h];
            hasher.finalize_into_reset(&mut expected).unwrap();
            assert_eq!(&public[index * h..(index + 1) * h], &expected[..]);
        }
    }

    #[test]
    fn test_streaming_and_parallel_agree() {
        for alg in [HashAlgorithm::Sha384, HashAlgorithm::Blake2b512, HashAlgorithm::Sha3_256] {
            let (params, secret) = setup(alg);
            let mut streamed = Vec::new();
            derive_public_key(&params, &secret[..], &mut streamed).unwrap();
            let parallel = derive_public_key_bytes(&params, &secret).unwrap();
            assert_eq!(streamed, parallel, "{}", alg);
        }
    }

    #[test]
    fn test_deterministic() {
        let (params, secret) = setup(HashAlgorithm::Sha256);
        let mut first = Vec::new();
        let mut second = Vec::new();
        derive_public_key(&params, &secret[..], &mut first).unwrap();
        derive_public_key(&params, &secret[..], &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_identical_blocks_give_identical_commitments() {
        // A reused hash state would make the second commitment differ.
        let params = Params::new(HashAlgorithm::Sha256).unwrap();
        let secret = vec![0x42u8; params.secret_key_bytes()];
        let public = derive_public_key_bytes(&params, &secret).unwrap();
        let h = params.digest_bytes();
        let first = &public[..h];
        assert!(public.chunks_exact(h).all(|block| block == first));

        let mut streamed = Vec::new();
        derive_public_key(&params, &secret[..], &mut streamed).unwrap();
        assert_eq!(streamed, public);
    }

    #[test]
    fn test_size_mismatch() {
        let (params, secret) = setup(HashAlgorithm::Sha256);
        let h = params.digest_bytes();

        let short = &secret[..secret.len() - h];
        assert!(matches!(
            derive_public_key(&params, short, Vec::new()),
            Err(Error::Format(FormatError::Truncated(Stream::SecretKey)))
        ));
        assert!(matches!(
            derive_public_key_bytes(&params, short),
            Err(Error::Format(FormatError::Truncated(Stream::SecretKey)))
        ));

        let partial = &secret[..secret.len() - 1];
        assert!(matches!(
            derive_public_key(&params, partial, Vec::new()),
            Err(Error::Format(FormatError::Truncated(Stream::SecretKey)))
        ));

        let mut long = secret.clone();
        long.extend_from_slice(&secret[..h]);
        assert!(matches!(
            derive_public_key(&params, &long[..], Vec::new()),
            Err(Error::Format(FormatError::TrailingData(Stream::SecretKey)))
        ));
        assert!(matches!(
            derive_public_key_bytes(&params, &long),
            Err(Error::Format(FormatError::TrailingData(Stream::SecretKey)))
        ));

        let mut one_extra = secret.clone();
        one_extra.push(0);
        assert!(matches!(
            derive_public_key(&params, &one_extra[..], Vec::new()),
            Err(Error::Format(FormatError::TrailingData(Stream::SecretKey)))
        ));
    }

    #[test]
    fn test_key_for_other_algorithm_rejected() {
        let (_, secret) = setup(HashAlgorithm::Sha256);
        let params = Params::new(HashAlgorithm::Sha512).unwrap();
        assert!(matches!(
            derive_public_key(&params, &secret[..], Vec::new()),
            Err(Error::Format(FormatError::Truncated(Stream::SecretKey)))
        ));
    }
}
