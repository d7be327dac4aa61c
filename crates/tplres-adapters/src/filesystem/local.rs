//! Directory-backed template store.
//!
//! Templates are regular files below a root directory; a template name maps
//! to the relative path with `/` separators. Directories are not templates.
//! A name that resolves (through symlinks) to a file outside the root is
//! answered with `NotFound` and a warning, never with the file.
//!
//! Versions are `"<mtime-nanos>-<len>"`. On platforms without modification
//! times the version is absent and every load opens the file.

use std::{
    fmt,
    fs::{self, File, Metadata},
    io::{self, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};

use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

use tplres_core::{
    application::{
        ports::{Session, Source},
        services::KeyedCell,
        session::SessionHandle,
    },
    domain::{Content, DomainError, LoadingResult, SourceId, TemplateName, Version},
    error::{SourceError, SourceResult},
};

/// Store that serves files below `root`.
pub struct FileSystemSource {
    id: SourceId,
    root: PathBuf,
    /// Canonical root, keyed by the symlink target of `root` (if it is one),
    /// so repointing a symlinked root is picked up by the next session.
    canonical: KeyedCell<Option<PathBuf>, PathBuf>,
}

impl FileSystemSource {
    /// Serve templates below `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSource`] if `root` does not exist or is
    /// not a directory.
    pub fn new(root: impl Into<PathBuf>) -> SourceResult<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| {
            DomainError::InvalidSource(format!("cannot read '{}': {e}", root.display()))
        })?;
        if !metadata.is_dir() {
            return Err(DomainError::InvalidSource(format!(
                "'{}' is not a directory",
                root.display()
            ))
            .into());
        }

        let source = Self {
            id: SourceId::allocate("fs"),
            root,
            canonical: KeyedCell::new(),
        };
        debug!(source = %source.id, root = %source.root.display(), "filesystem source ready");
        Ok(source)
    }

    /// Root directory as configured.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn canonical_root(&self) -> SourceResult<Arc<PathBuf>> {
        let link = fs::read_link(&self.root).ok();
        self.canonical
            .get_or_try_init(link, |_| fs::canonicalize(&self.root))
            .map_err(|e| SourceError::io(&self.id, self.root.display().to_string(), e))
    }

    fn session<'s>(&self, session: &'s mut SessionHandle) -> SourceResult<&'s mut FsSession> {
        let fs_session = session.downcast_for::<FsSession>(&self.id)?;
        if fs_session.owner != self.id {
            return Err(SourceError::SessionMismatch {
                source_id: self.id.clone(),
            });
        }
        Ok(fs_session)
    }
}

impl fmt::Display for FileSystemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSystemSource({})", self.root.display())
    }
}

impl fmt::Debug for FileSystemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemSource")
            .field("id", &self.id)
            .field("root", &self.root)
            .finish()
    }
}

/// Session of a [`FileSystemSource`]: the canonical root, fixed for the
/// lifetime of the session.
struct FsSession {
    owner: SourceId,
    root: Arc<PathBuf>,
}

impl Session for FsSession {
    fn close(&mut self) -> SourceResult<()> {
        Ok(())
    }
}

/// Result of resolving a name against the root.
enum Located {
    File(PathBuf, Metadata),
    Missing,
}

/// Resolve `path` and check it is a regular file inside `root`.
fn locate(root: &Path, path: &Path) -> io::Result<Located> {
    let canonical = match fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(e) if is_missing(&e) => return Ok(Located::Missing),
        Err(e) => return Err(e),
    };
    if !canonical.starts_with(root) {
        warn!(
            path = %path.display(),
            target = %canonical.display(),
            "template resolves outside the source root, ignoring"
        );
        return Ok(Located::Missing);
    }
    let metadata = fs::metadata(&canonical)?;
    if !metadata.is_file() {
        trace!(path = %canonical.display(), "not a regular file");
        return Ok(Located::Missing);
    }
    Ok(Located::File(canonical, metadata))
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn version_of(metadata: &Metadata) -> Option<Version> {
    let modified = metadata.modified().ok()?;
    let nanos = modified.duration_since(UNIX_EPOCH).ok()?.as_nanos();
    Some(Version::new(format!("{nanos}-{}", metadata.len())))
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

impl Source for FileSystemSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn open_session(&self) -> SourceResult<SessionHandle> {
        Ok(SessionHandle::new(FsSession {
            owner: self.id.clone(),
            root: self.canonical_root()?,
        }))
    }

    #[instrument(skip_all, fields(source = %self.id, name = %name))]
    fn load(
        &self,
        name: &TemplateName,
        previous_source: Option<&SourceId>,
        previous_version: Option<&Version>,
        session: &mut SessionHandle,
    ) -> SourceResult<LoadingResult> {
        let root = Arc::clone(&self.session(session)?.root);
        let path = name
            .segments()
            .fold(root.to_path_buf(), |path, segment| path.join(segment));

        let io_err = |e| SourceError::io(&self.id, name.as_str(), e);

        let (canonical, metadata) = match locate(&root, &path).map_err(io_err)? {
            Located::File(canonical, metadata) => (canonical, metadata),
            Located::Missing => {
                trace!("no such template file");
                return Ok(LoadingResult::NotFound);
            }
        };

        let version = version_of(&metadata);
        if let (Some(current), Some(previous)) = (&version, previous_version) {
            if previous_source == Some(&self.id) && current == previous {
                debug!(version = %current, "not modified");
                return Ok(LoadingResult::NotModified(self.id.clone()));
            }
        }

        let file = match File::open(&canonical) {
            Ok(file) => file,
            Err(e) if is_missing(&e) => {
                debug!("template removed while loading");
                return Ok(LoadingResult::NotFound);
            }
            Err(e) => return Err(io_err(e)),
        };

        Ok(LoadingResult::opened(
            self.id.clone(),
            version,
            Content::Reader(Box::new(BufReader::new(file))),
        ))
    }

    /// Every regular file below the root whose relative path is a valid
    /// template name.
    #[instrument(skip(self), fields(source = %self.id))]
    fn list(&self) -> SourceResult<Option<Vec<TemplateName>>> {
        let root = self.canonical_root()?;
        let mut names = Vec::new();

        for entry in WalkDir::new(root.as_path()).min_depth(1) {
            let entry = entry.map_err(|e| {
                SourceError::io(&self.id, root.display().to_string(), io::Error::from(e))
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.file_type().is_symlink() {
                let inside = locate(&root, entry.path())
                    .map_err(|e| SourceError::io(&self.id, entry.path().display().to_string(), e))?;
                if matches!(inside, Located::Missing) {
                    continue;
                }
            }

            let Ok(relative) = entry.path().strip_prefix(root.as_path()) else {
                continue;
            };
            match TemplateName::new(normalize_path(&relative.to_string_lossy())) {
                Ok(name) => names.push(name),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping file"),
            }
        }

        names.sort();
        debug!(count = names.len(), "listed templates");
        Ok(Some(names))
    }
}
