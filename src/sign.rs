use crate::blocks::{write_context, BlockSource};
use crate::error::{io_error, Error, Result, Stream};
use crate::hash::MessageDigest;
use crate::params::Params;
use crate::secmem::SecretBuffer;
use crate::utils::block_index;
use std::io::Write;
use tracing::debug;

/// Writes the signature of `digest` to `signature`: for each digest bit `i`,
/// the secret block `2i + bit(i)`.
///
/// The secret key is addressed in an order governed by the digest, so it is
/// taken as a [`BlockSource`]. Only half of its blocks are read, but after
/// the last bit the whole key must still be exactly `n` blocks long.
pub fn sign_blocks<S, W>(
    params: &Params,
    secret: &mut S,
    digest: &MessageDigest,
    mut signature: W,
) -> Result<()>
where
    S: BlockSource + ?Sized,
    W: Write,
{
    let h = params.digest_bytes();
    if digest.len() != h {
        return Err(Error::BadLength(h, digest.len()));
    }

    let mut block = SecretBuffer::new(h);
    for (bit, value) in digest.bits().enumerate() {
        secret.read_block(block_index(bit, value), &mut block)?;
        signature
            .write_all(&block)
            .map_err(io_error(write_context(Stream::Signature)))?;
    }
    secret.finish()?;

    signature
        .flush()
        .map_err(io_error(write_context(Stream::Signature)))?;
    debug!(
        algorithm = %params.algorithm(),
        blocks = params.signature_blocks(),
        "signed digest"
    );
    Ok(())
}
