use rfs_proto::{classify, segments, PathKind, Request, Response};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Directory all targets are resolved under.
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Use `root` as the sandbox, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a validated target onto the filesystem.
    ///
    /// Targets accepted by [`classify`] only contain alphanumeric segments,
    /// so the result always stays below the root.
    pub fn resolve(&self, target: &str) -> PathBuf {
        segments(target).fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

pub async fn process_request(sandbox: &Sandbox, request: Request) -> Response {
    debug!(
        "Processing request: operation={}, target={:?}",
        request.operation(),
        request.target()
    );

    match request {
        Request::Get { target } => handle_get(sandbox, &target).await,
        Request::Put { target, content } => handle_put(sandbox, &target, &content).await,
        Request::Delete { target } => handle_delete(sandbox, &target).await,
        // Sessions close on DISCONNECT instead of dispatching it.
        Request::Disconnect => Response::bad_request(),
    }
}

async fn handle_get(sandbox: &Sandbox, target: &str) -> Response {
    if classify(target) != PathKind::File {
        return Response::bad_request();
    }
    let path = sandbox.resolve(target);

    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Response::not_found(),
        Err(e) => return missing_or_fault("GET", &path, e),
    }

    match fs::read_to_string(&path).await {
        Ok(content) => Response::success(content),
        Err(e) => missing_or_fault("GET", &path, e),
    }
}

async fn handle_put(sandbox: &Sandbox, target: &str, content: &str) -> Response {
    if classify(target) != PathKind::File {
        return Response::bad_request();
    }
    let path = sandbox.resolve(target);

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            return fault("PUT", parent, e);
        }
    }

    match write_file(&path, content).await {
        Ok(WriteOutcome::Created) => {
            debug!("Created {}", path.display());
            Response::created()
        }
        Ok(WriteOutcome::Replaced) => {
            debug!("Modified {}", path.display());
            Response::modified()
        }
        Err(e) => fault("PUT", &path, e),
    }
}

async fn handle_delete(sandbox: &Sandbox, target: &str) -> Response {
    match classify(target) {
        PathKind::File => delete_file(&sandbox.resolve(target)).await,
        PathKind::Directory => delete_directory(&sandbox.resolve(target)).await,
        PathKind::Invalid => Response::bad_request(),
    }
}

async fn delete_file(path: &Path) -> Response {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Response::not_found(),
        Err(e) => return missing_or_fault("DELETE", path, e),
    }

    match fs::remove_file(path).await {
        Ok(()) => Response::deleted(),
        Err(e) => missing_or_fault("DELETE", path, e),
    }
}

// Only the named directory is removed, and only when it is empty.
async fn delete_directory(path: &Path) -> Response {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Response::not_found(),
        Err(e) => return missing_or_fault("DELETE", path, e),
    }

    match fs::remove_dir(path).await {
        Ok(()) => Response::deleted(),
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
            debug!("Refusing to delete non-empty directory {}", path.display());
            Response::not_found()
        }
        Err(e) => missing_or_fault("DELETE", path, e),
    }
}

enum WriteOutcome {
    Created,
    Replaced,
}

async fn write_file(path: &Path, content: &str) -> io::Result<WriteOutcome> {
    let (mut file, outcome) = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => (file, WriteOutcome::Created),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(path)
                .await?;
            (file, WriteOutcome::Replaced)
        }
        Err(e) => return Err(e),
    };

    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(outcome)
}

// A regular file standing in for a parent directory means the target does
// not exist.
fn missing_or_fault(operation: &str, path: &Path, err: io::Error) -> Response {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Response::not_found(),
        _ => fault(operation, path, err),
    }
}

fn fault(operation: &str, path: &Path, err: io::Error) -> Response {
    warn!("{} failed on {}: {}", operation, path.display(), err);
    Response::unknown_error()
}
