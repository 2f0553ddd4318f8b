mod blocks;
mod error;
mod secmem;
mod utils;

pub mod command;
pub mod hash;
pub mod keygen;
pub mod params;
pub mod pubkey;
pub mod scheme;
pub mod sign;
pub mod stream;
pub mod verify;

pub use crate::blocks::{expect_end, read_block_from, BlockSource, SeekBlocks, SliceBlocks};
pub use crate::command::{Operation, Outcome};
pub use crate::error::{Error, FormatError, Result, Stream, VerificationError};
pub use crate::hash::{HashAlgorithm, MessageDigest};
pub use crate::params::{Params, MAX_DIGEST_BYTES};
pub use crate::scheme::{Lamport, PublicKey, SecretKey, Signature};
pub use crate::secmem::SecretBuffer;
pub use crate::utils::bit_at;
pub use crate::verify::Verdict;
