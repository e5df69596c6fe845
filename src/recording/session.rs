//! Recording session: the shared context behind every recorder instance

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Config, Mode};
use crate::matcher::{RecordMatcher, SimpleMatcher};
use crate::replay::{Records, ReplayStats};
use crate::storage;
use crate::{RecorderError, Result};

use super::{Names, RecordEntry, ASSET_NAME_ATTEMPTS};

/// Explicitly opened and closed recording/playback context
///
/// Holds the mode, the interaction store, the asset names and the records
/// captured so far. Share it between recorders with `Arc`.
pub struct Session {
    config: Config,
    matcher: Arc<dyn RecordMatcher>,
    records: Records,
    names: Names,
    pending: Mutex<Vec<RecordEntry>>,
    closed: AtomicBool,
}

impl Session {
    /// Open a session using a matcher built from `config.matching_headers`
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or, in playback mode, the
    /// recording cannot be loaded
    pub fn open(config: Config) -> Result<Self> {
        let matcher = Arc::new(SimpleMatcher::with_headers(
            config.matching_headers.iter().cloned(),
        ));
        Self::open_with_matcher(config, matcher)
    }

    /// Open a session with a custom matcher
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or, in playback mode, the
    /// recording cannot be loaded
    pub fn open_with_matcher(config: Config, matcher: Arc<dyn RecordMatcher>) -> Result<Self> {
        config.validate()?;

        let mut names = Names::new();
        let records = Records::new();

        if config.mode.is_playback() {
            let members = storage::read_archive(&config.records_path())?;
            for member in members {
                debug!(
                    "Loading {} entries from {}",
                    member.entries.len(),
                    member.name
                );
                for entry in member.entries {
                    records.add(entry, matcher.as_ref());
                }
            }

            names = Names::from_map(storage::read_names(&config.names_path())?);

            info!(
                "Playback session '{}' loaded {} records under {} keys",
                config.session_name,
                records.len(),
                records.key_count()
            );
        } else {
            info!(
                "Opened {} session '{}'",
                config.mode, config.session_name
            );
        }

        Ok(Self {
            config,
            matcher,
            records,
            names,
            pending: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Session mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Matcher used to key loaded and injected records
    #[must_use]
    pub fn matcher(&self) -> Arc<dyn RecordMatcher> {
        Arc::clone(&self.matcher)
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(RecorderError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Serve the next recorded entry for a match-key
    ///
    /// # Errors
    ///
    /// Returns error if the session is closed, not in playback mode, or the
    /// key is unknown or exhausted
    pub fn take(&self, key: &str) -> Result<RecordEntry> {
        self.ensure_open()?;
        if !self.mode().is_playback() {
            return Err(RecorderError::ModeMismatch {
                operation: "take",
                mode: self.mode(),
            });
        }

        let entry = self.records.take(key)?;
        debug!("Served '{key}' -> {}", entry.status_code);
        Ok(entry)
    }

    /// Append a captured entry to the records flushed at close
    ///
    /// # Errors
    ///
    /// Returns error if the session is closed or not in record mode
    pub async fn capture(&self, entry: RecordEntry) -> Result<()> {
        if !self.mode().is_record() {
            return Err(RecorderError::ModeMismatch {
                operation: "capture",
                mode: self.mode(),
            });
        }

        // `close` flips the flag while holding this lock
        let mut pending = self.pending.lock().await;
        self.ensure_open()?;
        debug!(
            "Captured {} {} -> {} (pending: {})",
            entry.request_method,
            entry.request_uri,
            entry.status_code,
            pending.len() + 1
        );
        pending.push(entry);
        Ok(())
    }

    /// Asset name for a test
    ///
    /// Playback returns the names recorded for the test in order. Other modes
    /// generate `{asset_prefix}{NNNN}`, avoiding names already issued to the
    /// test when possible, and remember it for the names file.
    ///
    /// # Errors
    ///
    /// Returns error if the session is closed or, in playback mode, no
    /// recorded names remain for the test
    pub fn get_asset_name(&self, test_name: &str) -> Result<String> {
        self.ensure_open()?;

        if self.mode().is_playback() {
            return self.names.dequeue(test_name);
        }

        let mut rng = rand::thread_rng();
        let mut name = self.random_name(&mut rng);
        for _ in 1..ASSET_NAME_ATTEMPTS {
            if !self.names.contains(test_name, &name) {
                break;
            }
            name = self.random_name(&mut rng);
        }

        self.names.enqueue(test_name, name.clone());
        Ok(name)
    }

    fn random_name(&self, rng: &mut impl Rng) -> String {
        format!("{}{}", self.config.asset_prefix, rng.gen_range(1000..=9999))
    }

    /// Seed an extra entry into the playback store
    ///
    /// # Errors
    ///
    /// Returns error if the session is closed or not in playback mode
    pub fn inject_record_entry(&self, entry: RecordEntry) -> Result<()> {
        self.ensure_open()?;
        if !self.mode().is_playback() {
            return Err(RecorderError::ModeMismatch {
                operation: "inject_record_entry",
                mode: self.mode(),
            });
        }

        self.records.add(entry, self.matcher.as_ref());
        Ok(())
    }

    /// Number of entries captured and not yet flushed
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Playback counters
    #[must_use]
    pub fn stats(&self) -> ReplayStats {
        self.records.stats()
    }

    /// Close the session
    ///
    /// In record mode every captured entry and generated name is written out;
    /// in playback mode unconsumed records are reported. Closing twice is a
    /// no-op.
    ///
    /// A failed flush leaves the session open with its captured entries
    /// intact, so `close` can be retried.
    ///
    /// # Errors
    ///
    /// Returns error if the recording cannot be written
    pub async fn close(&self) -> Result<()> {
        let mut pending = self.pending.lock().await;
        if self.is_closed() {
            return Ok(());
        }

        match self.mode() {
            Mode::Record => {
                storage::write_archive(
                    &self.config.records_path(),
                    &self.config.session_name,
                    &pending,
                )?;
                storage::write_names(&self.config.names_path(), &self.names.to_map())?;
                info!(
                    "Flushed {} records for session '{}' to {}",
                    pending.len(),
                    self.config.session_name,
                    self.config.records_path().display()
                );
                pending.clear();
            }
            Mode::Playback => {
                let remaining = self.records.remaining();
                if !remaining.is_empty() {
                    warn!(
                        "Playback session '{}' closed with {} unconsumed keys: {:?}",
                        self.config.session_name,
                        remaining.len(),
                        remaining
                    );
                }
            }
            Mode::None => {}
        }

        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(mode: Mode, dir: &TempDir) -> Config {
        Config {
            mode,
            recording_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn entry(uri: &str, body: &str) -> RecordEntry {
        RecordEntry {
            request_method: "GET".to_string(),
            request_uri: uri.to_string(),
            response_body: body.to_string(),
            status_code: 200,
            ..RecordEntry::default()
        }
    }

    #[tokio::test]
    async fn test_record_close_writes_files() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::Record, &dir)).unwrap();

        session.capture(entry("/a", "1")).await.unwrap();
        session.capture(entry("/a", "2")).await.unwrap();
        assert_eq!(session.pending_count().await, 2);

        session.close().await.unwrap();

        assert!(dir.path().join("records.zip").exists());
        assert!(dir.path().join("names.json").exists());
        let members = storage::read_archive(&dir.path().join("records.zip")).unwrap();
        assert_eq!(members[0].entries.len(), 2);
    }

    #[tokio::test]
    async fn test_playback_missing_files_is_fatal() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Session::open(config(Mode::Playback, &dir)),
            Err(RecorderError::FileNotFound(_))
        ));

        // Archive present but names file missing
        storage::write_archive(&dir.path().join("records.zip"), "default", &[]).unwrap();
        assert!(matches!(
            Session::open(config(Mode::Playback, &dir)),
            Err(RecorderError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_playback_serves_in_order() {
        let dir = TempDir::new().unwrap();
        {
            let session = Session::open(config(Mode::Record, &dir)).unwrap();
            session.capture(entry("/a", "A")).await.unwrap();
            session.capture(entry("/a", "B")).await.unwrap();
            session.close().await.unwrap();
        }

        let session = Session::open(config(Mode::Playback, &dir)).unwrap();
        assert_eq!(session.take("GET /a").unwrap().response_body, "A");
        assert_eq!(session.take("GET /a").unwrap().response_body, "B");
        assert!(matches!(
            session.take("GET /a"),
            Err(RecorderError::QueueExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_outside_record_mode() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::None, &dir)).unwrap();
        assert!(matches!(
            session.capture(entry("/a", "1")).await,
            Err(RecorderError::ModeMismatch { .. })
        ));
        assert!(matches!(
            session.take("GET /a"),
            Err(RecorderError::ModeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_inject_requires_playback() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::Record, &dir)).unwrap();
        assert!(matches!(
            session.inject_record_entry(entry("/a", "1")),
            Err(RecorderError::ModeMismatch { mode: Mode::Record, .. })
        ));
    }

    #[tokio::test]
    async fn test_inject_in_playback() {
        let dir = TempDir::new().unwrap();
        storage::write_archive(&dir.path().join("records.zip"), "default", &[]).unwrap();
        storage::write_names(&dir.path().join("names.json"), &Default::default()).unwrap();

        let session = Session::open(config(Mode::Playback, &dir)).unwrap();
        assert!(session.take("GET /stub").is_err());

        session.inject_record_entry(entry("/stub", "stubbed")).unwrap();
        assert_eq!(session.take("GET /stub").unwrap().response_body, "stubbed");
    }

    #[tokio::test]
    async fn test_asset_name_format() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::None, &dir)).unwrap();

        let name = session.get_asset_name("testX").unwrap();
        assert!(name.starts_with("onesdk"));
        let suffix = &name["onesdk".len()..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_asset_names_replayed() {
        let dir = TempDir::new().unwrap();
        let recorded: Vec<String> = {
            let session = Session::open(config(Mode::Record, &dir)).unwrap();
            let names = (0..3)
                .map(|_| session.get_asset_name("testX").unwrap())
                .collect();
            session.close().await.unwrap();
            names
        };

        let session = Session::open(config(Mode::Playback, &dir)).unwrap();
        let replayed: Vec<String> = (0..3)
            .map(|_| session.get_asset_name("testX").unwrap())
            .collect();
        assert_eq!(recorded, replayed);
        assert!(matches!(
            session.get_asset_name("testX"),
            Err(RecorderError::NamesExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_use() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::Record, &dir)).unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();

        assert!(session.is_closed());
        assert!(matches!(
            session.capture(entry("/a", "1")).await,
            Err(RecorderError::SessionClosed)
        ));
        assert!(matches!(
            session.get_asset_name("t"),
            Err(RecorderError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn test_none_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::None, &dir)).unwrap();
        session.get_asset_name("t").unwrap();
        session.close().await.unwrap();

        assert!(!dir.path().join("records.zip").exists());
        assert!(!dir.path().join("names.json").exists());
    }

    #[tokio::test]
    async fn test_failed_close_keeps_pending() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let session = Session::open(Config {
            mode: Mode::Record,
            recording_dir: blocker.join("records"),
            ..Config::default()
        })
        .unwrap();
        session.capture(entry("/a", "1")).await.unwrap();

        assert!(session.close().await.is_err());
        assert!(!session.is_closed());
        assert_eq!(session.pending_count().await, 1);

        // Still open: the retry fails again instead of reporting success
        assert!(session.close().await.is_err());
        session.capture(entry("/a", "2")).await.unwrap();
        assert_eq!(session.pending_count().await, 2);
    }

    #[tokio::test]
    async fn test_retried_close_flushes_everything() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("recordings");
        std::fs::write(&blocker, b"").unwrap();

        let session = Session::open(Config {
            mode: Mode::Record,
            recording_dir: blocker.clone(),
            ..Config::default()
        })
        .unwrap();
        session.capture(entry("/a", "1")).await.unwrap();
        assert!(session.close().await.is_err());

        std::fs::remove_file(&blocker).unwrap();
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert_eq!(session.pending_count().await, 0);

        let playback = Session::open(Config {
            mode: Mode::Playback,
            recording_dir: blocker,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(playback.take("GET /a").unwrap().response_body, "1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_capture_racing_close_is_never_lost() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(Session::open(config(Mode::Record, &dir)).unwrap());

        let mut captures = Vec::new();
        for i in 0..32 {
            let session = Arc::clone(&session);
            captures.push(tokio::spawn(async move {
                session.capture(entry(&format!("/r/{i}"), "x")).await
            }));
        }
        session.close().await.unwrap();

        let mut accepted = 0;
        for capture in captures {
            match capture.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(RecorderError::SessionClosed) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // Every accepted capture made it into the archive; nothing lingers
        assert_eq!(session.pending_count().await, 0);
        let playback = Session::open(config(Mode::Playback, &dir)).unwrap();
        assert_eq!(playback.stats().remaining, accepted);
    }

    #[tokio::test]
    async fn test_capture_after_close_is_rejected() {
        let dir = TempDir::new().unwrap();
        let session = Session::open(config(Mode::Record, &dir)).unwrap();
        session.close().await.unwrap();

        assert!(matches!(
            session.capture(entry("/late", "1")).await,
            Err(RecorderError::SessionClosed)
        ));
        assert_eq!(session.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_keep_each_others_names() {
        let dir = TempDir::new().unwrap();
        let named = |mode, session_name: &str| Config {
            session_name: session_name.to_string(),
            ..config(mode, &dir)
        };

        let storage_name = {
            let session = Session::open(named(Mode::Record, "storage")).unwrap();
            let name = session.get_asset_name("createAccount").unwrap();
            session.close().await.unwrap();
            name
        };
        let compute_name = {
            let session = Session::open(named(Mode::Record, "compute")).unwrap();
            let name = session.get_asset_name("createVm").unwrap();
            session.close().await.unwrap();
            name
        };

        let playback = Session::open(named(Mode::Playback, "storage")).unwrap();
        assert_eq!(playback.get_asset_name("createAccount").unwrap(), storage_name);
        assert_eq!(playback.get_asset_name("createVm").unwrap(), compute_name);
    }
}
