use clap::{Parser, Subcommand};
use lamport_ots::stream::{Input, Output};
use lamport_ots::{Error, HashAlgorithm, Operation};
use std::path::PathBuf;

/// Lamport-Diffie one-time signatures.
///
/// Keys and signatures are flat binary files. A secret key must sign at most
/// one message. Use `-` for standard input or output.
#[derive(Parser, Debug)]
#[command(name = "lamport-ots", version)]
pub struct Cli {
    /// Hash function, e.g. sha256, sha3-512, blake2b512
    #[arg(
        short = 'H',
        long = "hash",
        global = true,
        env = "LAMPORT_OTS_HASH",
        default_value = "sha256",
        value_name = "ALGORITHM"
    )]
    pub hash: HashAlgorithm,

    /// Message file to sign or verify [default: standard input]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub message: Option<PathBuf>,

    /// Print the hash algorithm and message digest to standard error
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a secret key
    Genkey {
        #[arg(value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Derive the public key of a secret key
    ///
    /// With a single argument, the secret key is read from standard input and
    /// the argument names the public key file.
    Pubkey {
        #[arg(value_name = "SECRET_KEY_FILE")]
        first: Option<PathBuf>,
        #[arg(value_name = "PUBLIC_KEY_FILE")]
        second: Option<PathBuf>,
    },
    /// Sign a message with a one-time secret key
    Sign {
        #[arg(value_name = "SECRET_KEY_FILE")]
        secret: PathBuf,
        #[arg(value_name = "SIGNATURE_FILE")]
        signature: Option<PathBuf>,
    },
    /// Verify a signature against a public key
    Verify {
        #[arg(value_name = "PUBLIC_KEY_FILE")]
        public: PathBuf,
        #[arg(value_name = "SIGNATURE_FILE")]
        signature: Option<PathBuf>,
    },
    /// List the supported hash functions
    ListHashes,
}

impl Cli {
    /// The operation to run, or `None` for commands that only print
    /// information.
    pub fn operation(&self) -> Result<Option<Operation>, Error> {
        let message = Input::from_arg(self.message.as_ref());
        let operation = match &self.command {
            Command::Genkey { output } => Operation::GenKey {
                output: Output::from_arg(output.as_ref()),
            },
            Command::Pubkey { first, second } => {
                if self.message.is_some() {
                    return Err(Error::OptionRejected("pubkey", "message"));
                }
                let (secret, public) = match second {
                    Some(public) => (first.as_ref(), Some(public)),
                    None => (None, first.as_ref()),
                };
                Operation::PubKey {
                    secret: Input::from_arg(secret),
                    public: Output::from_arg(public),
                }
            }
            Command::Sign { secret, signature } => Operation::Sign {
                message,
                secret: Input::from_arg(Some(secret)),
                signature: Output::from_arg(signature.as_ref()),
            },
            Command::Verify { public, signature } => Operation::Verify {
                message,
                public: Input::from_arg(Some(public)),
                signature: Input::from_arg(signature.as_ref()),
            },
            Command::ListHashes => return Ok(None),
        };
        Ok(Some(operation))
    }
}
