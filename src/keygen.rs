use crate::error::{io_error, Result};
use crate::params::Params;
use crate::scheme::SecretKey;
use crate::secmem::SecretBuffer;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::io::Write;
use tracing::debug;

/// Generates a fresh secret key of `n = 16h` random blocks from the
/// operating system's CSPRNG.
pub fn generate(params: &Params) -> Result<SecretKey> {
    generate_from_rng(params, &mut OsRng)
}

/// Generates a secret key from the given cryptographically secure generator.
pub fn generate_from_rng<R>(params: &Params, rng: &mut R) -> Result<SecretKey>
where
    R: RngCore + CryptoRng,
{
    let mut bytes = SecretBuffer::new(params.secret_key_bytes());
    rng.try_fill_bytes(&mut bytes)?;
    debug!(
        algorithm = %params.algorithm(),
        blocks = params.block_count(),
        bytes = bytes.len(),
        "generated secret key"
    );
    SecretKey::from_buffer(*params, bytes)
}

/// Writes `key` in a single pass. `out` should be unbuffered so that no copy
/// of the key is left behind in a write buffer.
pub fn write_secret_key<W: Write>(key: &SecretKey, mut out: W) -> Result<()> {
    out.write_all(key.as_bytes())
        .map_err(io_error("Failed to write secret key"))?;
    out.flush().map_err(io_error("Failed to write secret key"))
}
