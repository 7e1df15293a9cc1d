//! # hashsync-ftp
//!
//! [`RemoteStore`] over FTP with explicit TLS (`AUTH TLS`, `PBSZ 0`,
//! `PROT P`). One [`FtpsStore`] is one control session; commands are issued
//! strictly one at a time.
//!
//! FTP folds most failures into reply 550. The meaning depends on the
//! command, so each call site says how a 550 should be read.

use std::io::Read;

use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{FtpError, NativeTlsConnector, NativeTlsFtpStream, Status};

use hashsync_core::DeployConfig;
use hashsync_sync::{Connector, EntryKind, RemoteError, RemoteStore};

/// How to read a 550 reply for a given command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply550 {
    NotFound,
    AlreadyExists,
    NotEmpty,
}

impl Reply550 {
    fn into_error(self, path: &str) -> RemoteError {
        let path = path.to_string();
        match self {
            Self::NotFound => RemoteError::NotFound { path },
            Self::AlreadyExists => RemoteError::AlreadyExists { path },
            Self::NotEmpty => RemoteError::NotEmpty { path },
        }
    }
}

fn is_unavailable(err: &FtpError) -> bool {
    matches!(err, FtpError::UnexpectedResponse(resp) if resp.status == Status::FileUnavailable)
}

fn transport(context: &str, err: FtpError) -> RemoteError {
    RemoteError::transport(format!("{context}: {err}"))
}

fn classify(err: FtpError, path: &str, meaning: Reply550) -> RemoteError {
    if is_unavailable(&err) {
        meaning.into_error(path)
    } else {
        transport(path, err)
    }
}

/// Reduce an NLST line to a bare entry name. Servers differ on whether they
/// echo the listed directory as a prefix.
fn entry_name(line: &str) -> Option<&str> {
    let trimmed = line.trim_end_matches(['\r', '\n']).trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// An authenticated FTPS session positioned at the deploy root.
pub struct FtpsStore {
    stream: NativeTlsFtpStream,
    /// Absolute deploy root as reported by `PWD`.
    root: String,
    closed: bool,
}

impl FtpsStore {
    /// Connect, secure the channel, log in, switch to binary mode and `CWD`
    /// into `config.remote_dir`.
    pub fn connect(config: &DeployConfig) -> Result<Self, RemoteError> {
        let remote = &config.remote;
        let addr = format!("{}:{}", remote.host, remote.port);

        let stream =
            NativeTlsFtpStream::connect(addr.as_str()).map_err(|e| transport(&addr, e))?;
        let tls = TlsConnector::new()
            .map_err(|e| RemoteError::transport(format!("TLS setup failed: {e}")))?;
        let mut stream = stream
            .into_secure(NativeTlsConnector::from(tls), &remote.host)
            .map_err(|e| transport("secure channel negotiation", e))?;
        tracing::debug!("secured control channel to {addr}");

        stream
            .login(remote.username.as_str(), remote.password.as_str())
            .map_err(|e| transport("login", e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| transport("TYPE I", e))?;
        stream
            .cwd(config.remote_dir.as_str())
            .map_err(|e| transport(&config.remote_dir, e))?;
        let root = stream.pwd().map_err(|e| transport("PWD", e))?;
        tracing::info!("connected to {addr}, deploy root {root}");

        Ok(Self {
            stream,
            root,
            closed: false,
        })
    }
}

impl RemoteStore for FtpsStore {
    fn kind_of(&mut self, path: &str) -> Result<EntryKind, RemoteError> {
        match self.stream.size(path) {
            Ok(_) => return Ok(EntryKind::File),
            Err(e) if is_unavailable(&e) => {}
            Err(e) => return Err(transport(path, e)),
        }
        match self.stream.cwd(path) {
            Ok(()) => {
                self.stream
                    .cwd(self.root.as_str())
                    .map_err(|e| transport(&self.root, e))?;
                Ok(EntryKind::Directory)
            }
            Err(e) if is_unavailable(&e) => Ok(EntryKind::Missing),
            Err(e) => Err(transport(path, e)),
        }
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream
            .mkdir(path)
            .map_err(|e| classify(e, path, Reply550::AlreadyExists))
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream
            .rmdir(path)
            .map_err(|e| classify(e, path, Reply550::NotEmpty))
    }

    fn remove_file(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream
            .rm(path)
            .map_err(|e| classify(e, path, Reply550::NotFound))
    }

    fn list_dir(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let lines = self
            .stream
            .nlst(Some(path))
            .map_err(|e| classify(e, path, Reply550::NotFound))?;
        Ok(lines
            .iter()
            .filter_map(|line| entry_name(line))
            .map(str::to_string)
            .collect())
    }

    fn put(&mut self, path: &str, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        let mut reader = reader;
        self.stream
            .put_file(path, &mut reader)
            .map_err(|e| transport(path, e))
    }

    fn get(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.stream
            .retr_as_buffer(path)
            .map(|cursor| cursor.into_inner())
            .map_err(|e| classify(e, path, Reply550::NotFound))
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.quit().map_err(|e| transport("QUIT", e))
    }
}

impl Drop for FtpsStore {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.stream.quit() {
                tracing::debug!("QUIT on drop failed: {e}");
            }
        }
    }
}

/// [`Connector`] that opens an [`FtpsStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpsConnector;

impl Connector for FtpsConnector {
    type Store = FtpsStore;

    fn connect(&self, config: &DeployConfig) -> Result<FtpsStore, RemoteError> {
        FtpsStore::connect(config)
    }
}
