//! The four operations of the command-line tool, each with its own
//! endpoints, dispatched through [`Operation::run`].

use crate::blocks::{read_context, write_context, BlockSource, SeekBlocks, SliceBlocks};
use crate::error::{io_error, Error, Result, Stream};
use crate::hash::MessageDigest;
use crate::keygen::{self, write_secret_key};
use crate::params::Params;
use crate::pubkey::derive_public_key;
use crate::scheme::SecretKey;
use crate::sign::sign_blocks;
use crate::stream::{Input, Output};
use crate::verify::{verify_blocks, Verdict};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    GenKey {
        output: Output,
    },
    PubKey {
        secret: Input,
        public: Output,
    },
    Sign {
        message: Input,
        secret: Input,
        signature: Output,
    },
    Verify {
        message: Input,
        public: Input,
        signature: Input,
    },
}

/// What a successful run produced. A completed verification is a success
/// even when the signature turned out to be invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Verified(Verdict),
}

impl Outcome {
    pub fn into_result(self) -> Result<()> {
        match self {
            Outcome::Done => Ok(()),
            Outcome::Verified(verdict) => verdict.into_result(),
        }
    }
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GenKey { .. } => "genkey",
            Operation::PubKey { .. } => "pubkey",
            Operation::Sign { .. } => "sign",
            Operation::Verify { .. } => "verify",
        }
    }

    /// Refuses endpoint combinations that cannot work, before any input is
    /// read or hashed: implicit use of a terminal, and more than one input
    /// on standard input.
    pub fn check_endpoints(&self) -> Result<()> {
        match self {
            Operation::GenKey { output } => refuse_terminal_output(output),
            Operation::PubKey { secret, public } => {
                refuse_terminal_input(secret)?;
                refuse_terminal_output(public)
            }
            Operation::Sign {
                message,
                secret,
                signature,
            } => {
                refuse_terminal_output(signature)?;
                if message.is_stdin() && secret.is_stdin() {
                    return Err(Error::StdinConflict("both message and secret key"));
                }
                Ok(())
            }
            Operation::Verify {
                message,
                public,
                signature,
            } => {
                refuse_terminal_input(signature)?;
                let on_stdin = [message, public, signature]
                    .iter()
                    .filter(|input| input.is_stdin())
                    .count();
                if on_stdin > 1 {
                    return Err(Error::StdinConflict("multiple files"));
                }
                Ok(())
            }
        }
    }

    pub fn run(&self, params: &Params) -> Result<Outcome> {
        self.check_endpoints()?;
        info!("Hash algorithm: {}", params.algorithm());
        debug!(operation = self.name(), endpoints = ?self, "running");

        match self {
            Operation::GenKey { output } => {
                let out = output.create(Stream::SecretKey)?;
                let key = keygen::generate(params)?;
                write_secret_key(&key, out)?;
                Ok(Outcome::Done)
            }
            Operation::PubKey { secret, public } => {
                let source = secret.open(Stream::SecretKey)?;
                let mut out = public.create(Stream::PublicKey)?;
                if secret.is_stdin() {
                    let key = SecretKey::read_from(*params, source)?;
                    let derived = key.public_key()?;
                    out.write_all(derived.as_bytes())
                        .map_err(io_error(write_context(Stream::PublicKey)))?;
                } else {
                    derive_public_key(params, source, BufWriter::new(out))?;
                }
                Ok(Outcome::Done)
            }
            Operation::Sign {
                message,
                secret,
                signature,
            } => {
                let digest = message_digest(params, message)?;
                let source = secret.open(Stream::SecretKey)?;
                if secret.is_stdin() {
                    let key = SecretKey::read_from(*params, source)?;
                    let out = signature.create(Stream::Signature)?;
                    sign_blocks(params, &mut key.blocks(), &digest, out)?;
                } else {
                    let mut blocks = seek_blocks(params, source, Stream::SecretKey);
                    let out = signature.create(Stream::Signature)?;
                    sign_blocks(params, &mut blocks, &digest, out)?;
                }
                Ok(Outcome::Done)
            }
            Operation::Verify {
                message,
                public,
                signature,
            } => {
                let digest = message_digest(params, message)?;
                let source = public.open(Stream::PublicKey)?;
                let sig = BufReader::new(signature.open(Stream::Signature)?);
                let verdict = if public.is_stdin() {
                    let bytes = read_bounded(source, params.public_key_bytes(), Stream::PublicKey)?;
                    let mut blocks = SliceBlocks::new(
                        &bytes,
                        params.digest_bytes(),
                        params.block_count(),
                        Stream::PublicKey,
                    );
                    verify(params, &mut blocks, sig, &digest)?
                } else {
                    let mut blocks = seek_blocks(params, source, Stream::PublicKey);
                    verify(params, &mut blocks, sig, &digest)?
                };
                Ok(Outcome::Verified(verdict))
            }
        }
    }
}

fn refuse_terminal_input(input: &Input) -> Result<()> {
    if input.is_implicit_terminal() {
        return Err(Error::TerminalRefused("read from"));
    }
    Ok(())
}

fn refuse_terminal_output(output: &Output) -> Result<()> {
    if output.is_implicit_terminal() {
        return Err(Error::TerminalRefused("write to"));
    }
    Ok(())
}

fn message_digest(params: &Params, message: &Input) -> Result<MessageDigest> {
    let digest = MessageDigest::compute(params, message.open(Stream::Message)?)?;
    info!("Message digest: {}", digest);
    Ok(digest)
}

fn seek_blocks(params: &Params, file: File, stream: Stream) -> SeekBlocks<File> {
    SeekBlocks::new(file, params.digest_bytes(), params.block_count(), stream)
}

/// Reads a non-seekable stream into memory, keeping at most one byte past
/// `expected` so that oversized input is still detected.
fn read_bounded<R: Read>(reader: R, expected: usize, stream: Stream) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(expected + 1);
    reader
        .take(expected as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(io_error(read_context(stream)))?;
    Ok(bytes)
}

fn verify<P, R>(params: &Params, public: &mut P, signature: R, digest: &MessageDigest) -> Result<Verdict>
where
    P: BlockSource + ?Sized,
    R: Read,
{
    let verdict = verify_blocks(params, public, signature, digest)?;
    if verdict.is_valid() {
        info!("Signature is valid");
    }
    Ok(verdict)
}
