use crate::blocks::{expect_end, read_block_from, BlockSource};
use crate::error::{Error, FormatError, Result, Stream, VerificationError};
use crate::hash::MessageDigest;
use crate::params::{Params, MAX_DIGEST_BYTES};
use crate::utils::block_index;
use std::io::Read;
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;

/// Outcome of a completed verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every signature block hashes to the selected public-key block.
    Valid,
    /// All blocks were compared and at least one did not match.
    Invalid,
    /// An input was shorter or longer than its fixed size, so the signature
    /// could not be checked.
    Malformed(FormatError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Verdict::Valid => Ok(()),
            Verdict::Invalid => Err(VerificationError::InvalidSignature.into()),
            Verdict::Malformed(e) => Err(VerificationError::Malformed(e).into()),
        }
    }
}

/// Verifies `signature` over `digest` against `public`.
///
/// Each signature block is hashed and compared with public-key block
/// `2i + bit(i)`. The comparison runs in constant time and covers all `8h`
/// positions even after a mismatch. I/O failures are returned as errors;
/// inputs of the wrong size yield [`Verdict::Malformed`].
pub fn verify_blocks<P, R>(
    params: &Params,
    public: &mut P,
    mut signature: R,
    digest: &MessageDigest,
) -> Result<Verdict>
where
    P: BlockSource + ?Sized,
    R: Read,
{
    let h = params.digest_bytes();
    if digest.len() != h {
        return Err(Error::BadLength(h, digest.len()));
    }

    let verdict = match compare_blocks(params, public, &mut signature, digest) {
        Ok(mismatch) if bool::from(mismatch) => Verdict::Invalid,
        Ok(_) => Verdict::Valid,
        Err(Error::Format(e)) => Verdict::Malformed(e),
        Err(e) => return Err(e),
    };
    debug!(algorithm = %params.algorithm(), ?verdict, "verified signature");
    Ok(verdict)
}

fn compare_blocks<P, R>(
    params: &Params,
    public: &mut P,
    signature: &mut R,
    digest: &MessageDigest,
) -> Result<Choice>
where
    P: BlockSource + ?Sized,
    R: Read,
{
    let h = params.digest_bytes();
    let mut hasher = params.algorithm().hasher();
    let mut revealed = [0u8; MAX_DIGEST_BYTES];
    let mut candidate = [0u8; MAX_DIGEST_BYTES];
    let mut commitment = [0u8; MAX_DIGEST_BYTES];
    let mut mismatch = Choice::from(0);

    for (bit, value) in digest.bits().enumerate() {
        read_block_from(signature, &mut revealed[..h], Stream::Signature)?;
        hasher.update(&revealed[..h]);
        hasher.finalize_into_reset(&mut candidate[..h])?;

        public.read_block(block_index(bit, value), &mut commitment[..h])?;
        mismatch |= !candidate[..h].ct_eq(&commitment[..h]);
    }

    public.finish()?;
    expect_end(signature, Stream::Signature)?;
    Ok(mismatch)
}
