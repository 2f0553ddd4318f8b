//! Where the command-line operations read from and write to.
//!
//! An endpoint is either a named file or a standard stream. A standard
//! stream is *implicit* when the argument was omitted and explicit when it
//! was given as `-`; only implicit use of a terminal is refused.

use crate::error::{io_error, Error, Result, Stream};
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

const SECRET_FILE_MODE: u32 = 0o600;
const PUBLIC_FILE_MODE: u32 = 0o644;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Stdin { implicit: bool },
    File(PathBuf),
}

impl Input {
    /// Maps an optional command-line argument to an endpoint; `-` and an
    /// omitted argument both select standard input.
    pub fn from_arg<S: AsRef<OsStr> + ?Sized>(arg: Option<&S>) -> Self {
        let arg: Option<&OsStr> = arg.map(|arg| arg.as_ref());
        match arg {
            None => Input::Stdin { implicit: true },
            Some(arg) if arg == "-" => Input::Stdin { implicit: false },
            Some(arg) => Input::File(PathBuf::from(arg)),
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Input::Stdin { .. })
    }

    /// Implicit standard input attached to a terminal.
    pub fn is_implicit_terminal(&self) -> bool {
        matches!(self, Input::Stdin { implicit: true }) && io::stdin().is_terminal()
    }

    /// Opens the endpoint as an unbuffered file handle. Standard input is
    /// duplicated so that nothing read from it passes through std's buffer.
    pub fn open(&self, stream: Stream) -> Result<File> {
        match self {
            Input::Stdin { .. } => {
                duplicate_stdin().map_err(io_error(stdin_context(stream)))
            }
            Input::File(path) => File::open(path).map_err(|source| Error::Open {
                stream,
                path: path.clone(),
                source,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Stdout { implicit: bool },
    File(PathBuf),
}

impl Output {
    pub fn from_arg<S: AsRef<OsStr> + ?Sized>(arg: Option<&S>) -> Self {
        let arg: Option<&OsStr> = arg.map(|arg| arg.as_ref());
        match arg {
            None => Output::Stdout { implicit: true },
            Some(arg) if arg == "-" => Output::Stdout { implicit: false },
            Some(arg) => Output::File(PathBuf::from(arg)),
        }
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, Output::Stdout { .. })
    }

    pub fn is_implicit_terminal(&self) -> bool {
        matches!(self, Output::Stdout { implicit: true }) && io::stdout().is_terminal()
    }

    /// Opens the endpoint for writing as an unbuffered file handle.
    ///
    /// Files receiving a secret key are created with mode `0600`, and an
    /// existing file has its mode reset to `0600` before it is truncated.
    /// Other files are created with mode `0644`.
    pub fn create(&self, stream: Stream) -> Result<File> {
        match self {
            Output::Stdout { .. } => {
                duplicate_stdout().map_err(io_error(stdout_context(stream)))
            }
            Output::File(path) => {
                let open_error = |source| Error::Open {
                    stream,
                    path: path.clone(),
                    source,
                };
                let mut options = OpenOptions::new();
                options.write(true).create(true);
                #[cfg(unix)]
                options.mode(file_mode(stream));

                let file = options.open(path).map_err(open_error)?;
                if stream == Stream::SecretKey {
                    restrict_permissions(&file).map_err(open_error)?;
                }
                file.set_len(0).map_err(open_error)?;
                Ok(file)
            }
        }
    }
}

fn file_mode(stream: Stream) -> u32 {
    match stream {
        Stream::SecretKey => SECRET_FILE_MODE,
        _ => PUBLIC_FILE_MODE,
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> io::Result<()> {
    file.set_permissions(std::fs::Permissions::from_mode(SECRET_FILE_MODE))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn duplicate_stdin() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

#[cfg(unix)]
fn duplicate_stdout() -> io::Result<File> {
    use std::os::fd::AsFd;
    Ok(File::from(io::stdout().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
fn duplicate_stdin() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    Ok(File::from(io::stdin().as_handle().try_clone_to_owned()?))
}

#[cfg(windows)]
fn duplicate_stdout() -> io::Result<File> {
    use std::os::windows::io::AsHandle;
    Ok(File::from(io::stdout().as_handle().try_clone_to_owned()?))
}

#[cfg(not(any(unix, windows)))]
fn duplicate_stdin() -> io::Result<File> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "raw standard input"))
}

#[cfg(not(any(unix, windows)))]
fn duplicate_stdout() -> io::Result<File> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "raw standard output"))
}

fn stdin_context(stream: Stream) -> &'static str {
    match stream {
        Stream::Message => "Failed to open standard input for the message",
        Stream::SecretKey => "Failed to open standard input for the secret key",
        Stream::PublicKey => "Failed to open standard input for the public key",
        Stream::Signature => "Failed to open standard input for the signature",
    }
}

fn stdout_context(stream: Stream) -> &'static str {
    match stream {
        Stream::SecretKey => "Failed to open standard output for the secret key",
        Stream::PublicKey => "Failed to open standard output for the public key",
        _ => "Failed to open standard output for the signature",
    }
}
