//! Ephemeral session namespaces for batch-serving invocations.
//!
//! A session groups one batch's outputs under an isolated, addressable
//! directory: `{output_root}/{session_id}/{policy}/{identity}-{w}.{ext}`.
//! After the batch completes, the whole tree is packaged exactly once
//! into a single `images.tar.zst` archive at the session root, and the
//! namespace is reclaimed unconditionally after a fixed retention window.
//!
//! ## Lifecycle
//!
//! `Created → Populating → Archived → Expired`, strictly forward. Files
//! may be served at any point before expiry; a read racing the expiry
//! deletion observes not-found, which is accepted — retention is best
//! effort, not a durability guarantee, and no locking defends the window.
//!
//! The expiry task is fire-and-forget: it runs on a detached thread,
//! independent of any request/response lifecycle, and deletion failures
//! are logged, never retried, never surfaced.

use crate::policy::PolicyName;
use crate::types::Variant;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Single archive per session, placed inside the session root.
pub const ARCHIVE_FILE_NAME: &str = "images.tar.zst";

/// How long a session's namespace outlives its creation.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10 * 60);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("archive already built for session {0}")]
    AlreadyArchived(String),
}

/// Forward-only session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Created,
    Populating,
    Archived,
    /// Terminal: the namespace has been deleted. The expiry task's
    /// `remove_dir_all` is this transition; it owns only the session's id
    /// and root, so a `Session` handle still alive at that point keeps
    /// reporting its last in-memory state while reads against the root
    /// observe not-found.
    Expired,
}

/// One batch invocation's isolated, time-bounded output namespace.
#[derive(Debug)]
pub struct Session {
    id: String,
    root: PathBuf,
    created_at: SystemTime,
    state: SessionState,
    archive: Option<PathBuf>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Output root; exclusively owned by this session for writes until
    /// expiry.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    /// Download path for a variant, relative to the session root. This is
    /// the layout contract the serving layer builds URLs from.
    pub fn relative_variant_path(policy: PolicyName, variant: &Variant) -> String {
        format!("{}/{}", policy.dir_name(), variant.file)
    }

    /// Mark the session as receiving variant writes. Transitions are
    /// strictly forward; marking an already-archived session is a no-op.
    pub fn begin_population(&mut self) {
        if self.state == SessionState::Created {
            self.state = SessionState::Populating;
        }
    }
}

/// Allocates session namespaces and owns their lifecycle.
///
/// Explicit configuration injected at startup — the output root and
/// retention window are construction parameters, not process globals.
pub struct SessionStore {
    output_root: PathBuf,
    retention: Duration,
    counter: AtomicU64,
}

impl SessionStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self::with_retention(output_root, DEFAULT_RETENTION)
    }

    pub fn with_retention(output_root: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            output_root: output_root.into(),
            retention,
            counter: AtomicU64::new(0),
        }
    }

    /// Allocate a fresh session and create its isolated directory before
    /// any variant is written into it.
    ///
    /// The id combines a millisecond timestamp with a process-monotonic
    /// counter, so concurrent requests within the same instant still get
    /// distinct namespaces.
    pub fn create_session(&self) -> Result<Session, SessionError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let id = format!("{millis}-{seq:04}");
        let root = self.output_root.join(&id);
        std::fs::create_dir_all(&root)?;
        Ok(Session {
            id,
            root,
            created_at: SystemTime::now(),
            state: SessionState::Created,
            archive: None,
        })
    }

    /// Package every file currently under the session root into one
    /// archive placed inside that root. Built exactly once per session,
    /// after the batch completes — never incrementally updated.
    pub fn build_archive(&self, session: &mut Session) -> Result<PathBuf, SessionError> {
        if session.archive.is_some() {
            return Err(SessionError::AlreadyArchived(session.id.clone()));
        }

        let archive_path = session.root.join(ARCHIVE_FILE_NAME);
        let file = std::fs::File::create(&archive_path)?;
        let encoder = zstd::Encoder::new(BufWriter::new(file), 0)?;
        let mut builder = tar::Builder::new(encoder);

        // Sorted entries keep bundles deterministic; the in-progress
        // archive file itself is excluded from the snapshot.
        let mut entries: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&session.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path() == archive_path {
                continue;
            }
            entries.push(entry.into_path());
        }
        for path in &entries {
            let Ok(rel) = path.strip_prefix(&session.root) else {
                continue;
            };
            let mut reader = BufReader::new(std::fs::File::open(path)?);
            builder.append_data(&mut plain_header(path)?, rel, &mut reader)?;
        }

        let encoder = builder.into_inner()?;
        let mut writer = encoder.finish()?;
        writer.flush()?;

        session.state = SessionState::Archived;
        session.archive = Some(archive_path.clone());
        Ok(archive_path)
    }

    /// Register the deferred, unconditional deletion of the session's
    /// output root. Fires on a detached thread regardless of whether the
    /// results were ever downloaded; failures are logged and the
    /// namespace is considered best-effort-reclaimed.
    ///
    /// The deletion is the [`SessionState::Expired`] transition. The
    /// thread holds no `Session` handle — by the time it fires, the
    /// handle has normally been dropped, so expiry is observable only
    /// through the filesystem.
    pub fn schedule_expiry(&self, session: &Session) {
        let id = session.id.clone();
        let root = session.root.clone();
        let retention = self.retention;
        std::thread::spawn(move || {
            std::thread::sleep(retention);
            match std::fs::remove_dir_all(&root) {
                Ok(()) => debug!(session = %id, "session namespace reclaimed"),
                Err(e) => warn!(session = %id, error = %e, "session cleanup failed"),
            }
        });
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

/// Tar header for a regular file with a normalized mode, so bundles are
/// byte-identical across umasks.
fn plain_header(path: &Path) -> Result<tar::Header, SessionError> {
    let meta = std::fs::metadata(path)?;
    let mut header = tar::Header::new_gnu();
    header.set_size(meta.len());
    header.set_mode(0o644);
    header.set_entry_type(tar::EntryType::Regular);
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn store(tmp: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(tmp.path())
    }

    fn write_variant(session: &Session, policy_dir: &str, name: &str, contents: &[u8]) {
        let dir = session.root().join(policy_dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn archive_entries(path: &Path) -> BTreeSet<String> {
        let file = std::fs::File::open(path).unwrap();
        let decoder = zstd::Decoder::new(BufReader::new(file)).unwrap();
        let mut archive = tar::Archive::new(decoder);
        archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn create_session_allocates_distinct_namespaces() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let a = store.create_session().unwrap();
        let b = store.create_session().unwrap();

        assert_ne!(a.id(), b.id());
        assert!(a.root().exists());
        assert!(b.root().exists());
        assert_eq!(a.state(), SessionState::Created);
    }

    #[test]
    fn session_ids_are_unique_within_one_instant() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let ids: BTreeSet<String> = (0..64)
            .map(|_| store.create_session().unwrap().id().to_string())
            .collect();
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn archive_snapshots_all_files_and_nothing_else() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let mut session = store.create_session().unwrap();
        session.begin_population();
        write_variant(&session, "hero", "a-400.avif", b"aaaa");
        write_variant(&session, "hero", "a-720.avif", b"bbbb");
        write_variant(&session, "icon", "b-16.ico", b"cccc");

        // A sibling session must not leak into the bundle.
        let other = store.create_session().unwrap();
        write_variant(&other, "card", "z-320.avif", b"zzzz");

        let archive = store.build_archive(&mut session).unwrap();
        assert_eq!(archive, session.root().join(ARCHIVE_FILE_NAME));
        assert_eq!(session.state(), SessionState::Archived);

        let entries = archive_entries(&archive);
        let expected: BTreeSet<String> = [
            "hero/a-400.avif",
            "hero/a-720.avif",
            "icon/b-16.ico",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(entries, expected);
    }

    #[test]
    fn archive_is_built_exactly_once() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let mut session = store.create_session().unwrap();
        write_variant(&session, "general", "p-320.avif", b"data");

        store.build_archive(&mut session).unwrap();
        let second = store.build_archive(&mut session);
        assert!(matches!(second, Err(SessionError::AlreadyArchived(_))));
    }

    #[test]
    fn archive_of_empty_session_is_valid_and_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let mut session = store.create_session().unwrap();
        let archive = store.build_archive(&mut session).unwrap();
        assert!(archive_entries(&archive).is_empty());
    }

    #[test]
    fn expiry_reclaims_the_namespace_unattended() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SessionStore::with_retention(tmp.path(), Duration::from_millis(50));

        let mut session = store.create_session().unwrap();
        write_variant(&session, "logo", "l-128.avif", b"data");
        store.build_archive(&mut session).unwrap();
        store.schedule_expiry(&session);

        assert!(session.root().exists(), "not reclaimed before retention");
        std::thread::sleep(Duration::from_millis(400));
        assert!(!session.root().exists(), "namespace should be deleted");
    }

    #[test]
    fn expiry_of_missing_root_is_swallowed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = SessionStore::with_retention(tmp.path(), Duration::from_millis(10));

        let session = store.create_session().unwrap();
        std::fs::remove_dir_all(session.root()).unwrap();
        // Must not panic the expiry thread; failure is logged only.
        store.schedule_expiry(&session);
        std::thread::sleep(Duration::from_millis(100));
    }

    #[test]
    fn states_only_move_forward() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = store(&tmp);

        let mut session = store.create_session().unwrap();
        assert!(SessionState::Created < SessionState::Populating);
        assert!(SessionState::Populating < SessionState::Archived);
        assert!(SessionState::Archived < SessionState::Expired);

        session.begin_population();
        assert_eq!(session.state(), SessionState::Populating);
        store.build_archive(&mut session).unwrap();
        // No path back to Populating once archived.
        session.begin_population();
        assert_eq!(session.state(), SessionState::Archived);
    }

    #[test]
    fn relative_variant_paths_follow_the_layout_contract() {
        let v = Variant::generated("app_icon", PolicyName::Icon, 16, "app_icon-16.ico".into(), 9);
        assert_eq!(
            Session::relative_variant_path(PolicyName::Icon, &v),
            "icon/app_icon-16.ico"
        );
    }
}
