//! Loaded save files and the editor's open/close lifecycle.
//!
//! A [`Session`] is a fully parsed document bound to the file it came from.
//! Sessions are built completely before anyone can see them: [`Session::load`]
//! either returns a finished session or an error, and
//! [`Session::load_in_background`] hands the finished value over through the
//! thread's join handle. [`Editor`] holds at most one published session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::backup::{self, BackupError};
use crate::crypto::{self, CryptoError};
use crate::item::{Item, ItemId};
use crate::save::{AddOutcome, Location, MoveOutcome, SaveDocument, SaveError, Selection};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("Backup failed: {0}")]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Background load panicked")]
    LoadThreadPanicked,
}

/// A decrypted, parsed save plus the editor state around it
pub struct Session {
    path: PathBuf,
    original: Vec<u8>,
    document: SaveDocument,
    selection: Selection,
    active_view: Location,
    saved_revision: AtomicU64,
    save_guard: Mutex<()>,
}

impl Session {
    /// Read, decrypt and parse a save file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let session = Self::from_bytes(path, bytes)?;
        info!(path = %path.display(), "Loaded save");
        Ok(session)
    }

    /// Build a session from container bytes already in memory
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self, SessionError> {
        let text = crypto::decode_save(&bytes)?;
        let document = SaveDocument::from_json(&text)?;
        Ok(Session {
            path: path.into(),
            original: bytes,
            saved_revision: AtomicU64::new(document.revision()),
            document,
            selection: Selection::new(),
            active_view: Location::Inventory,
            save_guard: Mutex::new(()),
        })
    }

    /// Load on a worker thread.
    ///
    /// The handle yields the finished session; use [`Session::join`] to
    /// fold a panicked worker into [`SessionError::LoadThreadPanicked`].
    pub fn load_in_background(
        path: impl Into<PathBuf>,
    ) -> JoinHandle<Result<Session, SessionError>> {
        let path = path.into();
        thread::spawn(move || Session::load(&path))
    }

    pub fn join(
        handle: JoinHandle<Result<Session, SessionError>>,
    ) -> Result<Session, SessionError> {
        handle
            .join()
            .map_err(|_| SessionError::LoadThreadPanicked)?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container bytes as they were read from disk
    pub fn original_bytes(&self) -> &[u8] {
        &self.original
    }

    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut SaveDocument {
        &mut self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// List the user is currently looking at
    pub fn active_view(&self) -> Location {
        self.active_view
    }

    pub fn set_active_view(&mut self, view: Location) {
        self.active_view = view;
    }

    /// Whether the document changed since it was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.document.revision() != self.saved_revision.load(Ordering::Acquire)
    }

    pub fn export(&self) -> Result<Value, SessionError> {
        Ok(self.document.export()?)
    }

    // Collection operations bound to this session's selection and view

    /// Add a new item to the list currently in view
    pub fn add_item(&mut self, item: Item) -> AddOutcome {
        self.document
            .add_item(self.active_view, item, None, &mut self.selection)
    }

    pub fn duplicate_item(&mut self, id: ItemId) -> Option<AddOutcome> {
        self.document.duplicate_item(id, &mut self.selection)
    }

    pub fn delete_item(&mut self, id: ItemId) -> Option<Item> {
        self.document.delete_item(id, &mut self.selection)
    }

    pub fn transfer(&mut self, id: ItemId) -> MoveOutcome {
        self.document
            .transfer(id, self.active_view, &mut self.selection)
    }

    // Saving

    /// Write the document back to the file it was loaded from
    pub fn save(&self) -> Result<PathBuf, SessionError> {
        self.save_as(&self.path)
    }

    /// Back up the loaded bytes next to `dest`, then replace `dest`.
    ///
    /// Returns the backup path. Only one save runs at a time per session;
    /// a concurrent call fails with [`SessionError::SaveInProgress`].
    pub fn save_as(&self, dest: impl AsRef<Path>) -> Result<PathBuf, SessionError> {
        let _guard = self.lock_save()?;
        let dest = dest.as_ref();

        let revision = self.document.revision();
        let encoded = crypto::encode_save(&self.document.to_json()?)?;
        let backup = backup::save_with_backup(dest, &self.original, &encoded)?;

        if dest == self.path {
            self.saved_revision.store(revision, Ordering::Release);
        }
        Ok(backup)
    }

    fn lock_save(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        match self.save_guard.try_lock() {
            Ok(guard) => Ok(guard),
            // A panic mid-save leaves no state behind the guard
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                warn!(path = %self.path.display(), "Save rejected, another save is running");
                Err(SessionError::SaveInProgress)
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("original_len", &self.original.len())
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("active_view", &self.active_view)
            .finish()
    }
}

/// Holder for the editor's current session.
///
/// Empty until a load succeeds. A failed [`Editor::open`] leaves whatever
/// was open before in place.
#[derive(Default)]
pub struct Editor {
    current: Mutex<Option<Session>>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load `path` and make it the current session
    pub fn open(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let session = Session::load(path)?;
        self.publish(session);
        Ok(())
    }

    /// Make a fully built session current, returning the one it replaces
    pub fn publish(&self, session: Session) -> Option<Session> {
        self.slot().replace(session)
    }

    /// Discard the current session without saving
    pub fn close(&self) -> Option<Session> {
        self.slot().take()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot().is_some()
    }

    pub fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.slot().as_ref().map(f)
    }

    pub fn with_session_mut<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.slot().as_mut().map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Rarity;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_save(dir: &TempDir, name: &str) -> PathBuf {
        let text = json!({
            "version": 3,
            "items": [
                {"type": "Sword", "power": 10.0, "rarity": "Common", "upgraded": false,
                 "equipmentSlot": "MeleeGear"},
                {"type": "Axe", "power": 8.0, "rarity": "Rare", "upgraded": false,
                 "inventoryIndex": 0}
            ],
            "storageChestItems": [
                {"type": "Bow", "power": 4.0, "rarity": "Common", "upgraded": false,
                 "inventoryIndex": 0}
            ],
            "currency": [{"type": "Emerald", "count": 50}],
            "xp": 500
        })
        .to_string();
        let path = dir.path().join(name);
        fs::write(&path, crypto::encode_save(&text).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_and_save() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let original = fs::read(&path).unwrap();

        let mut session = Session::load(&path).unwrap();
        assert!(!session.is_dirty());
        session.document_mut().set_currency("Emerald", 999);
        assert!(session.is_dirty());

        let backup = session.save().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(fs::read(&backup).unwrap(), original);

        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.document().currency("Emerald"), 999);
        assert_eq!(reloaded.document().original()["version"], json!(3));
    }

    #[test]
    fn test_save_as_keeps_dirty_state() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let mut session = Session::load(&path).unwrap();
        session.document_mut().set_xp(1000);

        let copy = dir.path().join("copy.dat");
        session.save_as(&copy).unwrap();
        assert!(session.is_dirty());
        assert_eq!(Session::load(&copy).unwrap().document().xp(), 1000);
        assert_eq!(Session::load(&path).unwrap().document().xp(), 500);
    }

    #[test]
    fn test_second_save_rejected_while_first_runs() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let session = Session::load(&path).unwrap();

        let guard = session.save_guard.lock().unwrap();
        assert!(matches!(session.save(), Err(SessionError::SaveInProgress)));
        drop(guard);
        assert!(session.save().is_ok());
    }

    #[test]
    fn test_load_bad_container() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.dat");
        fs::write(&path, b"NOPE0000garbagegarbage").unwrap();
        assert!(matches!(
            Session::load(&path),
            Err(SessionError::Crypto(CryptoError::BadMagic(_)))
        ));
    }

    #[test]
    fn test_load_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noxp.dat");
        let bytes = crypto::encode_save(r#"{"items": []}"#).unwrap();
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            Session::load(&path),
            Err(SessionError::Save(SaveError::Schema { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Session::load(dir.path().join("absent.dat")),
            Err(SessionError::Io(_))
        ));
    }

    #[test]
    fn test_load_in_background() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let session = Session::join(Session::load_in_background(&path)).unwrap();
        assert_eq!(session.document().items().len(), 2);
        assert_eq!(session.path(), path.as_path());
    }

    #[test]
    fn test_session_collection_ops_use_active_view() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let mut session = Session::load(&path).unwrap();

        session.set_active_view(Location::Storage);
        let AddOutcome::Added(id) = session.add_item(Item::new("Crossbow", 2.0, Rarity::Common))
        else {
            panic!("expected item to be added");
        };
        assert_eq!(session.selection().primary(), Some(id));
        assert_eq!(
            session.document().location_of(id),
            Some((Location::Storage, 0))
        );

        let bow = session.document().storage_items()[1].id();
        assert!(matches!(session.transfer(bow), MoveOutcome::Moved { .. }));
        assert!(session.delete_item(id).is_some());
        assert_eq!(session.selection().primary(), None);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_editor_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = write_save(&dir, "slot1.dat");
        let editor = Editor::new();
        assert!(!editor.is_loaded());
        assert!(editor.with_session(|s| s.document().xp()).is_none());

        editor.open(&path).unwrap();
        assert_eq!(editor.with_session(|s| s.document().xp()), Some(500));

        // A failed open leaves the current session alone
        assert!(editor.open(dir.path().join("absent.dat")).is_err());
        assert!(editor.is_loaded());

        editor.with_session_mut(|s| s.document_mut().set_xp(42));
        assert_eq!(editor.with_session(|s| s.is_dirty()), Some(true));

        let closed = editor.close().unwrap();
        assert_eq!(closed.document().xp(), 42);
        assert!(!editor.is_loaded());
    }

    #[test]
    fn test_editor_publish_background_load() {
        let dir = TempDir::new().unwrap();
        let first = write_save(&dir, "a.dat");
        let second = write_save(&dir, "b.dat");
        let editor = Editor::new();

        editor.open(&first).unwrap();
        let handle = Session::load_in_background(second.clone());
        let replaced = editor.publish(Session::join(handle).unwrap());

        assert_eq!(replaced.map(|s| s.path().to_path_buf()), Some(first));
        assert_eq!(
            editor.with_session(|s| s.path().to_path_buf()),
            Some(second)
        );
    }
}
