//! # Lamport–Diffie one-time signatures
//!
//! This module is the in-memory face of the scheme. A [`Lamport`] instance is
//! bound to one [`Params`] value, i.e. one hash function with digest size `h`,
//! and every key and signature it handles carries the same parameters.
//!
//! ## Keys and Signatures
//! - [`SecretKey`]: `n = 16h` random blocks of `h` bytes, arranged as pairs
//!   `[bit0_if0, bit0_if1, bit1_if0, bit1_if1, ...]`. It lives in a locked,
//!   zeroized-on-drop buffer and cannot be cloned.
//! - [`PublicKey`]: the hash of every secret block, same layout.
//! - [`Signature`]: `8h` blocks; block `i` is the secret block selected by bit
//!   `i` of the message digest.
//!
//! ## One-time use
//! Each signature reveals half of the secret key. Two signatures under the
//! same key reveal both halves wherever the two digests differ, and anyone
//! holding them can assemble signatures for every digest built from the
//! revealed blocks. [`Lamport::sign`] therefore consumes the secret key.
//! Nothing stops a caller from persisting the key and loading it again; using
//! a key once is the caller's obligation.
//!
//! ## Example
//!
//! ```rust
//! use lamport_ots::{HashAlgorithm, Lamport, Params, Verdict};
//!
//! let params = Params::new(HashAlgorithm::Sha256).expect("supported algorithm");
//! let lamport = Lamport::new(params);
//!
//! let secret = lamport.keygen().expect("key generation failed");
//! let public = lamport.public_key(&secret).expect("public key derivation failed");
//!
//! let message = b"Hello Lamport!";
//! let signature = lamport.sign(secret, message).expect("signing failed");
//!
//! let verdict = lamport.verify(&public, &signature, message).expect("verification failed");
//! assert_eq!(verdict, Verdict::Valid);
//! ```

use crate::blocks::{check_len, expect_end, read_block_from, SliceBlocks};
use crate::error::{Error, Result, Stream};
use crate::hash::MessageDigest;
use crate::keygen;
use crate::params::Params;
use crate::pubkey::derive_public_key_bytes;
use crate::secmem::SecretBuffer;
use crate::sign::sign_blocks;
use crate::verify::{verify_blocks, Verdict};
use std::fmt;
use std::io::Read;

/// Secret key material. Wiped from memory when dropped.
pub struct SecretKey {
    params: Params,
    bytes: SecretBuffer,
}

impl SecretKey {
    pub(crate) fn from_buffer(params: Params, bytes: SecretBuffer) -> Result<Self> {
        check_len(
            bytes.len() as u64,
            params.secret_key_bytes() as u64,
            Stream::SecretKey,
        )?;
        Ok(Self { params, bytes })
    }

    /// Copies a serialized secret key, which must be exactly `n*h` bytes.
    pub fn from_bytes(params: Params, bytes: &[u8]) -> Result<Self> {
        check_len(
            bytes.len() as u64,
            params.secret_key_bytes() as u64,
            Stream::SecretKey,
        )?;
        Ok(Self {
            params,
            bytes: SecretBuffer::from_slice(bytes),
        })
    }

    /// Reads a secret key from a sequential stream straight into locked
    /// memory. The stream must end right after the last block.
    pub fn read_from<R: Read>(params: Params, mut reader: R) -> Result<Self> {
        let mut bytes = SecretBuffer::new(params.secret_key_bytes());
        read_block_from(&mut reader, &mut bytes, Stream::SecretKey)?;
        expect_end(&mut reader, Stream::SecretKey)?;
        Ok(Self { params, bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// The key as a random-access block store.
    pub fn blocks(&self) -> SliceBlocks<'_> {
        SliceBlocks::new(
            &self.bytes,
            self.params.digest_bytes(),
            self.params.block_count(),
            Stream::SecretKey,
        )
    }

    /// Derives the public key, hashing blocks in parallel.
    pub fn public_key(&self) -> Result<PublicKey> {
        let bytes = derive_public_key_bytes(&self.params, &self.bytes)?;
        Ok(PublicKey {
            params: self.params,
            bytes,
        })
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("algorithm", &self.params.algorithm())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    params: Params,
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn from_bytes(params: Params, bytes: &[u8]) -> Result<Self> {
        check_len(
            bytes.len() as u64,
            params.public_key_bytes() as u64,
            Stream::PublicKey,
        )?;
        Ok(Self {
            params,
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn params(&self) -> Params {
        self.params
    }

    pub fn blocks(&self) -> SliceBlocks<'_> {
        SliceBlocks::new(
            &self.bytes,
            self.params.digest_bytes(),
            self.params.block_count(),
            Stream::PublicKey,
        )
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.params.algorithm())
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    params: Params,
    bytes: Vec<u8>,
}

impl Signature {
    pub fn from_bytes(params: Params, bytes: &[u8]) -> Result<Self> {
        check_len(
            bytes.len() as u64,
            params.signature_bytes() as u64,
            Stream::Signature,
        )?;
        Ok(Self {
            params,
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// Block `index`, i.e. the secret block revealed for digest bit `index`.
    pub fn block(&self, index: usize) -> Option<&[u8]> {
        let h = self.params.digest_bytes();
        self.bytes.get(index * h..(index + 1) * h)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("algorithm", &self.params.algorithm())
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lamport {
    params: Params,
}

impl Lamport {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> Params {
        self.params
    }

    pub fn keygen(&self) -> Result<SecretKey> {
        keygen::generate(&self.params)
    }

    pub fn public_key(&self, secret: &SecretKey) -> Result<PublicKey> {
        self.check_params(secret.params())?;
        secret.public_key()
    }

    pub fn digest(&self, message: &[u8]) -> Result<MessageDigest> {
        MessageDigest::of(&self.params, message)
    }

    /// Signs `message`, consuming the one-time secret key.
    pub fn sign(&self, secret: SecretKey, message: &[u8]) -> Result<Signature> {
        let digest = self.digest(message)?;
        self.sign_digest(secret, &digest)
    }

    pub fn sign_digest(&self, secret: SecretKey, digest: &MessageDigest) -> Result<Signature> {
        self.check_params(secret.params())?;
        let mut bytes = Vec::with_capacity(self.params.signature_bytes());
        sign_blocks(&self.params, &mut secret.blocks(), digest, &mut bytes)?;
        Ok(Signature {
            params: self.params,
            bytes,
        })
    }

    pub fn verify(
        &self,
        public: &PublicKey,
        signature: &Signature,
        message: &[u8],
    ) -> Result<Verdict> {
        let digest = self.digest(message)?;
        self.verify_digest(public, signature, &digest)
    }

    pub fn verify_digest(
        &self,
        public: &PublicKey,
        signature: &Signature,
        digest: &MessageDigest,
    ) -> Result<Verdict> {
        self.check_params(public.params())?;
        self.check_params(signature.params())?;
        verify_blocks(
            &self.params,
            &mut public.blocks(),
            signature.as_bytes(),
            digest,
        )
    }

    fn check_params(&self, found: Params) -> Result<()> {
        if found != self.params {
            return Err(Error::AlgorithmMismatch {
                expected: self.params.algorithm(),
                found: found.algorithm(),
            });
        }
        Ok(())
    }
}
