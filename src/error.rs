use crate::hash::HashAlgorithm;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The flat binary streams handled by the scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Message,
    SecretKey,
    PublicKey,
    Signature,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stream::Message => "message",
            Stream::SecretKey => "secret key",
            Stream::PublicKey => "public key",
            Stream::Signature => "signature",
        };
        f.write_str(name)
    }
}

/// A stream whose length is not exactly the number of blocks the selected
/// hash function requires.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    #[error("Failed to read from {0} file (hash size mismatch?)")]
    Truncated(Stream),
    #[error("Partial read from {0} file (hash size mismatch?)")]
    TrailingData(Stream),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Malformed input: {0}")]
    Malformed(FormatError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid length: expected {0} bytes, found {1} bytes")]
    BadLength(usize, usize),
    #[error("Unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Input was made with {found}, but {expected} is selected")]
    AlgorithmMismatch {
        expected: HashAlgorithm,
        found: HashAlgorithm,
    },
    #[error(
        "Hash function {algorithm} produces {bits} bits, but the maximum length on your system is {max_bits} bits"
    )]
    DigestTooLarge {
        algorithm: &'static str,
        bits: usize,
        max_bits: usize,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open {stream} file {}: {source}", .path.display())]
    Open {
        stream: Stream,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Failed to generate key: {0}")]
    Random(#[from] rand::Error),
    #[error("Signature verification failed: {0}")]
    VerificationFailed(#[from] VerificationError),
    #[error("Refusing implicit {0} terminal")]
    TerminalRefused(&'static str),
    #[error("Unable to read {0} from standard input")]
    StdinConflict(&'static str),
    #[error("The {0} command does not accept the --{1} option")]
    OptionRejected(&'static str, &'static str),
}

impl Error {
    /// True for the outcome "checked and it's forged", as opposed to
    /// "couldn't check".
    pub fn is_invalid_signature(&self) -> bool {
        matches!(
            self,
            Error::VerificationFailed(VerificationError::InvalidSignature)
        )
    }
}

/// Builds a `map_err` adapter that tags an I/O failure with what was being
/// attempted.
pub(crate) fn io_error(context: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |source| Error::Io { context, source }
}

pub type Result<T> = std::result::Result<T, Error>;
