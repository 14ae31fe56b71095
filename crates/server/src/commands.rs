//! Per-session command execution.
//!
//! Every connection gets its own storage namespace rooted at
//! `<root>/<session-id>/`, where the session id is derived from the session
//! key digest. All four file operations resolve names inside that directory
//! and nowhere else; a name that would escape it is an application error,
//! answered with a failure response while the connection stays open.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use protocol::{Chunk, Command, CommandKind, FrameType, Response, SessionKey};
use tracing::{debug, info, warn};

/// Files below this size are chunked at 64 KiB.
const SMALL_FILE_THRESHOLD: u64 = 256 * 1024;

/// Files below this size (and at least the small threshold) use 128 KiB.
const MEDIUM_FILE_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Chunk size for small files.
const SMALL_CHUNK_SIZE: u32 = 64 * 1024;

/// Chunk size for medium files.
const MEDIUM_CHUNK_SIZE: u32 = 128 * 1024;

/// Chunk size for large files.
const LARGE_CHUNK_SIZE: u32 = 256 * 1024;

const MSG_INVALID_FILENAME: &str = "Invalid filename";

/// One outbound message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A response message.
    Response(Response),
    /// One chunk of a chunked download.
    Data(Chunk),
}

impl Reply {
    fn ok(message: &str) -> Self {
        Reply::Response(Response::ok(message))
    }

    fn failure(message: &str) -> Self {
        Reply::Response(Response::failure(message))
    }

    /// The frame tag this reply travels under.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Reply::Response(_) => FrameType::Response,
            Reply::Data(_) => FrameType::Data,
        }
    }

    /// Encode the reply's payload bytes.
    pub fn encode_payload(&self) -> protocol::Result<Vec<u8>> {
        match self {
            Reply::Response(response) => response.encode(),
            Reply::Data(chunk) => chunk.encode(),
        }
    }
}

/// Executor for one session's file operations.
pub struct CommandExecutor {
    root: PathBuf,
    session_id: String,
}

impl CommandExecutor {
    /// Create an executor for the session identified by `key`.
    ///
    /// The session directory itself is created lazily on first use.
    pub fn new(root: &Path, key: &SessionKey) -> Self {
        Self {
            root: root.to_path_buf(),
            session_id: key.session_id(),
        }
    }

    /// The session id this executor serves.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Execute a command, producing the replies to send in order.
    ///
    /// Application failures are folded into failure responses; this method
    /// never errors, so the connection survives every command.
    pub fn execute(&self, command: &Command) -> Vec<Reply> {
        debug!(
            session = %self.session_id,
            command = ?command.kind,
            filename = %command.filename,
            "command received"
        );
        match command.kind {
            CommandKind::Upload => self.upload(&command.filename, &command.data),
            CommandKind::Download => self.download(&command.filename),
            CommandKind::List => self.list(),
            CommandKind::Delete => self.delete(&command.filename),
        }
    }

    /// Resolve (and create if necessary) the session's storage directory.
    fn session_root(&self) -> std::io::Result<PathBuf> {
        let dir = self.root.join(&self.session_id);
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(&dir)?;
        Ok(dir)
    }

    /// Resolve a client-supplied name to a path inside the session root.
    ///
    /// Returns `None` for names that are empty, absolute, or that escape
    /// the root after lexical normalization.
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let relative = normalize_filename(filename)?;
        match self.session_root() {
            Ok(root) => Some(root.join(relative)),
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to create session root");
                None
            }
        }
    }

    fn upload(&self, filename: &str, data: &[u8]) -> Vec<Reply> {
        let Some(path) = self.resolve(filename) else {
            warn!(session = %self.session_id, filename, "upload rejected: invalid filename");
            return vec![Reply::failure(MSG_INVALID_FILENAME)];
        };

        match write_file(&path, data) {
            Ok(()) => {
                info!(
                    session = %self.session_id,
                    filename,
                    size = data.len(),
                    "file uploaded"
                );
                vec![Reply::ok("File uploaded successfully")]
            }
            Err(e) => {
                warn!(session = %self.session_id, filename, error = %e, "upload failed");
                vec![Reply::failure("Failed to write file")]
            }
        }
    }

    fn download(&self, filename: &str) -> Vec<Reply> {
        let Some(path) = self.resolve(filename) else {
            warn!(session = %self.session_id, filename, "download rejected: invalid filename");
            return vec![Reply::failure(MSG_INVALID_FILENAME)];
        };

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(session = %self.session_id, filename, error = %e, "download failed");
                return vec![Reply::failure("File not found or failed to read")];
            }
        };

        let chunks = build_chunks(filename, &data);
        info!(
            session = %self.session_id,
            filename,
            total_size = data.len(),
            total_chunks = chunks.len(),
            "starting chunked download"
        );

        let mut replies = Vec::with_capacity(1 + chunks.len());
        replies.push(Reply::ok("Starting chunked download"));
        replies.extend(chunks.into_iter().map(Reply::Data));
        replies
    }

    fn list(&self) -> Vec<Reply> {
        let root = match self.session_root() {
            Ok(root) => root,
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "list failed");
                return vec![Reply::failure("Failed to read directory")];
            }
        };

        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "list failed");
                return vec![Reply::failure("Failed to read directory")];
            }
        };

        let mut filenames: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        filenames.sort();

        debug!(session = %self.session_id, count = filenames.len(), "listing files");
        vec![Reply::ok(&filenames.join("\n"))]
    }

    fn delete(&self, filename: &str) -> Vec<Reply> {
        let Some(path) = self.resolve(filename) else {
            warn!(session = %self.session_id, filename, "delete rejected: invalid filename");
            return vec![Reply::failure(MSG_INVALID_FILENAME)];
        };

        match fs::symlink_metadata(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return vec![Reply::failure("File not found")];
            }
            Err(e) => {
                warn!(session = %self.session_id, filename, error = %e, "delete failed");
                return vec![Reply::failure("Failed to delete file")];
            }
            Ok(metadata) if metadata.is_dir() => {
                // Delete never recurses.
                return vec![Reply::failure("Failed to delete file")];
            }
            Ok(_) => {}
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info!(session = %self.session_id, filename, "file deleted");
                vec![Reply::ok("File deleted successfully")]
            }
            Err(e) => {
                warn!(session = %self.session_id, filename, error = %e, "delete failed");
                vec![Reply::failure("Failed to delete file")]
            }
        }
    }
}

/// Lexically normalize a client-supplied filename.
///
/// Rejects empty names, absolute paths, and any `..` that would climb past
/// the namespace root. The result is a relative path safe to join under
/// the session root.
fn normalize_filename(filename: &str) -> Option<PathBuf> {
    if filename.is_empty() {
        return None;
    }

    let candidate = Path::new(filename);
    if candidate.is_absolute() {
        return None;
    }

    let mut normalized = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if normalized.as_os_str().is_empty() {
        return None;
    }
    Some(normalized)
}

/// Pick the nominal chunk size for a file of the given total size.
fn nominal_chunk_size(total_size: u64) -> u32 {
    if total_size < SMALL_FILE_THRESHOLD {
        SMALL_CHUNK_SIZE
    } else if total_size < MEDIUM_FILE_THRESHOLD {
        MEDIUM_CHUNK_SIZE
    } else {
        LARGE_CHUNK_SIZE
    }
}

/// Split file data into self-describing chunks in index order.
///
/// A zero-byte file still yields one empty chunk so the receiver's
/// count-driven loop terminates.
fn build_chunks(filename: &str, data: &[u8]) -> Vec<Chunk> {
    let total_size = data.len() as u64;
    let chunk_size = nominal_chunk_size(total_size) as usize;
    let total_chunks = data.len().div_ceil(chunk_size).max(1);

    (0..total_chunks)
        .map(|index| {
            let start = index * chunk_size;
            let end = usize::min(start + chunk_size, data.len());
            let piece = &data[start..end];
            Chunk {
                filename: filename.to_string(),
                index: index as u32,
                total_chunks: total_chunks as u32,
                chunk_size: piece.len() as u32,
                total_size,
                data: piece.to_vec(),
            }
        })
        .collect()
}

/// Write file data, truncating any existing file, with mode 0644 on unix.
fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options.open(path)?;
    file.write_all(data)
}
