//! The single owner of albums, runtime and app settings.
//!
//! Every mutation goes through [`StateManager`] and is persisted before the
//! call returns. When a save fails the in-memory change is kept and the
//! `ConfigIo` error is handed back to the caller.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::album::{Album, AlbumStore, ImageList};
use crate::config::{self, AppSettings, ConfigKind, ConfigStore, RuntimeSettings};
use crate::error::{Error, Result};
use crate::night::{self, ClockTime};
use crate::pool;
use crate::queue;
use crate::scan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub album: String,
    pub added: usize,
    pub active: usize,
    pub inactive: usize,
}

/// A folder walk detached from the state, so it can run without holding it.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub album: String,
    folder: PathBuf,
    recursive: bool,
}

pub type ScanResult = (String, Result<Vec<String>>);

impl ScanJob {
    pub fn run(&self) -> Result<Vec<String>> {
        let files = scan::list_files(&self.folder, self.recursive)?;
        Ok(scan::filter_by_image_extension(files))
    }

    pub fn run_all(jobs: Vec<ScanJob>) -> Vec<ScanResult> {
        jobs.into_iter()
            .map(|job| {
                let found = job.run();
                (job.album, found)
            })
            .collect()
    }
}

pub struct StateManager {
    albums: AlbumStore,
    runtime: RuntimeSettings,
    app: AppSettings,
    store: Box<dyn ConfigStore>,
    rng: StdRng,
}

impl StateManager {
    pub fn load(store: Box<dyn ConfigStore>) -> Result<Self> {
        let albums: AlbumStore = config::load(store.as_ref(), ConfigKind::Album)?;
        let runtime: RuntimeSettings = config::load(store.as_ref(), ConfigKind::Runtime)?;
        let app: AppSettings = config::load(store.as_ref(), ConfigKind::App)?;
        log::info!(
            "loaded {} album(s), {} queued wallpaper(s)",
            albums.len(),
            runtime.current_queue.len()
        );

        Ok(Self {
            albums,
            runtime,
            app,
            store,
            rng: StdRng::from_entropy(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn persist(&self, kind: ConfigKind) -> Result<()> {
        let store = self.store.as_ref();
        let result = match kind {
            ConfigKind::Album => config::save(store, kind, &self.albums),
            ConfigKind::Runtime => config::save(store, kind, &self.runtime),
            ConfigKind::App => config::save(store, kind, &self.app),
        };
        if let Err(e) = &result {
            log::error!("{}", e);
        }
        result
    }

    /// Saves every kind even if an earlier one fails; reports the first failure.
    fn persist_all(&self, kinds: &[ConfigKind]) -> Result<()> {
        kinds
            .iter()
            .map(|kind| self.persist(*kind))
            .fold(Ok(()), |acc, res| acc.and(res))
    }

    pub fn save_runtime(&self) -> Result<()> {
        self.persist(ConfigKind::Runtime)
    }

    pub fn albums(&self) -> &AlbumStore {
        &self.albums
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub fn app(&self) -> &AppSettings {
        &self.app
    }

    pub fn settings_json(&self, kind: ConfigKind) -> Result<serde_json::Value> {
        let value = match kind {
            ConfigKind::Album => serde_json::to_value(&self.albums),
            ConfigKind::Runtime => serde_json::to_value(&self.runtime),
            ConfigKind::App => serde_json::to_value(&self.app),
        };
        value.map_err(|e| Error::config_io(kind, e))
    }

    pub fn shuffle_interval_secs(&self) -> u64 {
        self.runtime.shuffle_interval_secs()
    }

    // ---- app settings ----

    pub fn save_app_settings(&mut self, settings: AppSettings) -> Result<()> {
        if settings.auto_rescan && settings.rescan_interval == 0 {
            return Err(Error::InvalidConfiguration(
                "rescan interval must be at least one hour".into(),
            ));
        }
        self.app = settings;
        self.persist(ConfigKind::App)?;
        log::info!("app settings saved");
        Ok(())
    }

    pub fn reset_app_settings(&mut self) -> Result<AppSettings> {
        self.app = AppSettings::default();
        self.persist(ConfigKind::App)?;
        log::info!("app settings reset to defaults");
        Ok(self.app.clone())
    }

    // ---- queue ----

    pub fn add_to_queue(&mut self, path: &str) -> Result<()> {
        self.runtime
            .current_queue
            .push_back(scan::normalize_path(path));
        self.persist(ConfigKind::Runtime)
    }

    /// Removes the first occurrence of `path`.
    pub fn remove_from_queue(&mut self, path: &str) -> Result<()> {
        let path = scan::normalize_path(path);
        let queue = &mut self.runtime.current_queue;
        let pos = queue
            .iter()
            .position(|p| *p == path)
            .ok_or(Error::QueueItemNotFound(path))?;
        queue.remove(pos);
        self.persist(ConfigKind::Runtime)
    }

    /// Removes every occurrence of `path`, returning how many were dropped.
    pub fn purge_from_queue(&mut self, path: &str) -> Result<usize> {
        let path = scan::normalize_path(path);
        let before = self.runtime.current_queue.len();
        self.runtime.current_queue.retain(|p| *p != path);
        let removed = before - self.runtime.current_queue.len();
        self.persist(ConfigKind::Runtime)?;
        Ok(removed)
    }

    pub fn clear_queue(&mut self) -> Result<()> {
        self.runtime.current_queue.clear();
        self.persist(ConfigKind::Runtime)
    }

    pub fn pop_queue_head(&mut self) -> Result<String> {
        let head = self
            .runtime
            .current_queue
            .pop_front()
            .ok_or(Error::EmptyQueue)?;
        self.persist(ConfigKind::Runtime)?;
        Ok(head)
    }

    // ---- albums ----

    pub fn album(&self, name: Option<&str>) -> Result<&Album> {
        match name {
            Some(name) => self.albums.get(name),
            None => {
                let first = self
                    .runtime
                    .current_album
                    .first()
                    .ok_or_else(|| Error::InvalidConfiguration("no album is selected".into()))?;
                self.albums.get(first)
            }
        }
    }

    pub fn add_album(&mut self, mut album: Album) -> Result<()> {
        album.base_folder = scan::normalize_path(&album.base_folder);
        album.merge_scanned(Vec::new());
        let name = album.name.clone();
        self.albums.add(album)?;
        self.persist(ConfigKind::Album)?;
        log::info!("album added: {}", name);
        Ok(())
    }

    /// Replaces an album, carrying a rename into both album selections.
    pub fn update_album(&mut self, old_name: &str, mut album: Album) -> Result<()> {
        album.base_folder = scan::normalize_path(&album.base_folder);
        album.merge_scanned(Vec::new());
        let new_name = album.name.clone();
        self.albums.update(old_name, album)?;

        if new_name == old_name {
            return self.persist(ConfigKind::Album);
        }
        for selection in [
            &mut self.runtime.current_album,
            &mut self.runtime.current_night_mode_album,
        ] {
            for name in selection.iter_mut().filter(|n| n.as_str() == old_name) {
                *name = new_name.clone();
            }
        }
        log::info!("album renamed: {} -> {}", old_name, new_name);
        self.persist_all(&[ConfigKind::Album, ConfigKind::Runtime])
    }

    /// Deletes an album and drops it from both album selections.
    pub fn delete_album(&mut self, name: &str) -> Result<()> {
        self.albums.remove(name)?;
        self.runtime.current_album.retain(|n| n != name);
        self.runtime.current_night_mode_album.retain(|n| n != name);
        log::info!("album deleted: {}", name);
        self.persist_all(&[ConfigKind::Album, ConfigKind::Runtime])
    }

    pub fn activate_image(&mut self, album: &str, path: &str) -> Result<()> {
        self.albums.get_mut(album)?.activate(path)?;
        self.persist(ConfigKind::Album)
    }

    pub fn deactivate_image(&mut self, album: &str, path: &str) -> Result<()> {
        self.albums.get_mut(album)?.deactivate(path)?;
        self.persist(ConfigKind::Album)
    }

    pub fn delete_image(&mut self, album: &str, path: &str, list: ImageList) -> Result<()> {
        self.albums.get_mut(album)?.remove_image(path, list)?;
        self.persist(ConfigKind::Album)
    }

    pub fn delete_all_images(&mut self, album: &str) -> Result<()> {
        self.albums.get_mut(album)?.clear_images();
        self.persist(ConfigKind::Album)
    }

    pub fn add_images(&mut self, album: &str, paths: &[String]) -> Result<Vec<String>> {
        let added = self.albums.get_mut(album)?.add_images(paths);
        self.persist(ConfigKind::Album)?;
        log::info!("added {} image(s) to {}", added.len(), album);
        Ok(added)
    }

    /// Describes the folder walk for one album without touching the filesystem.
    pub fn scan_job(&self, name: &str) -> Result<ScanJob> {
        let album = self.albums.get(name)?;
        if album.base_folder.trim().is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "album {name} has no base folder"
            )));
        }
        Ok(ScanJob {
            album: album.name.clone(),
            folder: PathBuf::from(&album.base_folder),
            recursive: self.app.scan_subfolders,
        })
    }

    /// Walks for every album that has a base folder.
    pub fn scan_jobs(&self) -> Vec<ScanJob> {
        self.albums
            .iter()
            .filter_map(|album| match self.scan_job(&album.name) {
                Ok(job) => Some(job),
                Err(_) => {
                    log::debug!("skipping rescan of {}: no base folder", album.name);
                    None
                }
            })
            .collect()
    }

    fn merge_scan(&mut self, name: &str, found: Vec<String>) -> Result<SyncReport> {
        let album = self.albums.get_mut(name)?;
        let added = album.merge_scanned(found);
        Ok(SyncReport {
            album: album.name.clone(),
            added,
            active: album.active_wp.len(),
            inactive: album.inactive_wp.len(),
        })
    }

    /// Merges the result of one album's walk and saves.
    pub fn finish_sync(&mut self, name: &str, found: Vec<String>) -> Result<SyncReport> {
        let report = self.merge_scan(name, found)?;
        self.persist(ConfigKind::Album)?;
        log::info!(
            "album synced: {} (+{}, {} active)",
            report.album,
            report.added,
            report.active
        );
        Ok(report)
    }

    /// Merges the results of a multi-album walk, saving once at the end.
    /// Albums whose walk failed, or that vanished meanwhile, are logged and skipped.
    pub fn finish_rescan(&mut self, results: Vec<ScanResult>) -> Result<Vec<SyncReport>> {
        let mut reports = Vec::new();
        for (name, found) in results {
            match found.and_then(|found| self.merge_scan(&name, found)) {
                Ok(report) => reports.push(report),
                Err(e) => log::error!("failed to sync {}: {}", name, e),
            }
        }
        self.persist(ConfigKind::Album)?;
        log::info!("rescanned {} album(s)", reports.len());
        Ok(reports)
    }

    /// Rescans the album's base folder for new images.
    pub fn sync_album(&mut self, name: &str) -> Result<SyncReport> {
        let found = self.scan_job(name)?.run()?;
        self.finish_sync(name, found)
    }

    /// Syncs every album that has a base folder.
    pub fn sync_all(&mut self) -> Result<Vec<SyncReport>> {
        let results = ScanJob::run_all(self.scan_jobs());
        self.finish_rescan(results)
    }

    // ---- runtime settings ----

    pub fn set_current_albums(&mut self, names: Vec<String>) -> Result<()> {
        let mut selection: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            self.albums.get(&name)?;
            if !selection.contains(&name) {
                selection.push(name);
            }
        }
        self.runtime.current_album = selection;
        self.persist(ConfigKind::Runtime)
    }

    fn toggle(selection: &mut Vec<String>, albums: &AlbumStore, name: &str) -> Result<bool> {
        if selection.iter().any(|n| n == name) {
            selection.retain(|n| n != name);
            Ok(false)
        } else {
            albums.get(name)?;
            selection.push(name.to_string());
            Ok(true)
        }
    }

    /// Flips `name` in the normal selection. Returns whether it is now selected.
    pub fn toggle_active_album(&mut self, name: &str) -> Result<bool> {
        let selected = Self::toggle(&mut self.runtime.current_album, &self.albums, name)?;
        self.persist(ConfigKind::Runtime)?;
        Ok(selected)
    }

    pub fn toggle_night_mode_album(&mut self, name: &str) -> Result<bool> {
        let selected =
            Self::toggle(&mut self.runtime.current_night_mode_album, &self.albums, name)?;
        self.persist(ConfigKind::Runtime)?;
        Ok(selected)
    }

    pub fn set_random(&mut self, random: bool) -> Result<()> {
        self.runtime.current_random = random;
        self.persist(ConfigKind::Runtime)
    }

    pub fn set_shuffle_interval(&mut self, minutes: u64) -> Result<()> {
        if minutes == 0 {
            return Err(Error::InvalidConfiguration(
                "shuffle interval must be at least one minute".into(),
            ));
        }
        self.runtime.current_shuffle_interval = minutes;
        self.persist(ConfigKind::Runtime)
    }

    pub fn set_night_mode(&mut self, enabled: bool) -> Result<()> {
        self.runtime.current_night_mode = enabled;
        self.persist(ConfigKind::Runtime)
    }

    pub fn set_night_mode_start(&mut self, time: &str) -> Result<()> {
        let time: ClockTime = time.parse()?;
        self.runtime.current_night_mode_start = time.to_string();
        self.persist(ConfigKind::Runtime)
    }

    pub fn set_night_mode_end(&mut self, time: &str) -> Result<()> {
        let time: ClockTime = time.parse()?;
        self.runtime.current_night_mode_end = time.to_string();
        self.persist(ConfigKind::Runtime)
    }

    // ---- rotation ----

    pub fn night_active(&self, now: ClockTime) -> bool {
        if !self.runtime.current_night_mode {
            return false;
        }
        match night::is_night_now(
            now,
            &self.runtime.current_night_mode_start,
            &self.runtime.current_night_mode_end,
        ) {
            Ok(night) => night,
            Err(e) => {
                log::warn!("night mode ignored: {}", e);
                false
            }
        }
    }

    pub fn current_pool(&self, now: ClockTime) -> Vec<String> {
        pool::build_pool(&self.albums, &self.runtime, self.night_active(now))
    }

    /// Replaces the queue with a fresh bulk draw. An empty pool leaves the
    /// queue empty and reports `EmptyPool`.
    pub fn fill_queue(&mut self, now: ClockTime) -> Result<usize> {
        let pool = self.current_pool(now);
        let drawn = queue::fill(&pool, &mut self.rng);
        self.runtime.current_queue = drawn.into();
        self.persist(ConfigKind::Runtime)?;

        if self.runtime.current_queue.is_empty() {
            return Err(Error::EmptyPool);
        }
        log::debug!("queue filled with {} wallpaper(s)", self.runtime.current_queue.len());
        Ok(self.runtime.current_queue.len())
    }

    /// Appends one draw to the end of the queue and returns it.
    pub fn fill_queue_one(&mut self, now: ClockTime) -> Result<String> {
        let pool = self.current_pool(now);
        let drawn = queue::draw_one(&pool, &mut self.rng).ok_or(Error::EmptyPool)?;
        self.runtime.current_queue.push_back(drawn.clone());
        self.persist(ConfigKind::Runtime)?;
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::MemoryStore;

    fn at(hour: u8) -> ClockTime {
        ClockTime::new(hour, 0).unwrap()
    }

    fn manager() -> (StateManager, MemoryStore) {
        let store = MemoryStore::default();
        let manager = StateManager::load(Box::new(store.clone()))
            .unwrap()
            .with_seed(3);
        (manager, store)
    }

    fn album(name: &str, active: &[&str]) -> Album {
        Album {
            name: name.into(),
            active_wp: active.iter().map(|s| s.to_string()).collect(),
            ..Album::default()
        }
    }

    #[test]
    fn nature_album_fills_a_full_queue() {
        let (mut state, _) = manager();
        state.add_album(album("Nature", &["a", "b", "c"])).unwrap();
        state.set_current_albums(vec!["Nature".into()]).unwrap();

        assert_eq!(state.current_pool(at(12)), vec!["a", "b", "c"]);
        assert_eq!(state.fill_queue(at(12)).unwrap(), queue::QUEUE_LENGTH);

        let queue: Vec<&String> = state.runtime().current_queue.iter().collect();
        assert!(queue.iter().all(|p| ["a", "b", "c"].contains(&p.as_str())));
        assert!(queue.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn night_window_switches_the_pool() {
        let (mut state, _) = manager();
        state.add_album(album("Day", &["sun"])).unwrap();
        state.add_album(album("Night", &["moon"])).unwrap();
        state.toggle_active_album("Day").unwrap();
        state.toggle_night_mode_album("Night").unwrap();
        state.set_night_mode_start("22:00").unwrap();
        state.set_night_mode_end("06:00").unwrap();

        assert_eq!(state.current_pool(at(23)), vec!["sun"]);

        state.set_night_mode(true).unwrap();
        assert_eq!(state.current_pool(at(23)), vec!["moon"]);
        assert_eq!(state.current_pool(at(6)), vec!["moon"]);
        assert_eq!(state.current_pool(at(12)), vec!["sun"]);
    }

    #[test]
    fn broken_night_window_falls_back_to_day() {
        let (mut state, _) = manager();
        state.set_night_mode(true).unwrap();
        state.runtime.current_night_mode_start = "late".into();
        assert!(!state.night_active(at(23)));
        assert!(state.set_night_mode_start("late").is_err());
    }

    #[test]
    fn empty_pool_clears_the_queue() {
        let (mut state, _) = manager();
        state.add_to_queue("/stale.png").unwrap();
        assert!(matches!(state.fill_queue(at(12)), Err(Error::EmptyPool)));
        assert!(state.runtime().current_queue.is_empty());

        assert!(matches!(state.fill_queue_one(at(12)), Err(Error::EmptyPool)));
        assert!(state.runtime().current_queue.is_empty());
    }

    #[test]
    fn fill_one_appends_to_the_tail() {
        let (mut state, _) = manager();
        state.add_album(album("Nature", &["a", "b"])).unwrap();
        state.toggle_active_album("Nature").unwrap();
        state.add_to_queue("first").unwrap();

        let drawn = state.fill_queue_one(at(12)).unwrap();
        assert!(drawn == "a" || drawn == "b");
        assert_eq!(state.runtime().current_queue.len(), 2);
        assert_eq!(state.runtime().current_queue.back(), Some(&drawn));
        assert_eq!(state.pop_queue_head().unwrap(), "first");
    }

    #[test]
    fn delete_album_drops_dangling_selections() {
        let (mut state, _) = manager();
        state.add_album(album("A", &["a"])).unwrap();
        state.add_album(album("B", &["b"])).unwrap();
        state.set_current_albums(vec!["A".into(), "B".into()]).unwrap();
        state.toggle_night_mode_album("A").unwrap();

        state.delete_album("A").unwrap();
        assert_eq!(state.runtime().current_album, vec!["B"]);
        assert!(state.runtime().current_night_mode_album.is_empty());
        assert!(matches!(state.delete_album("A"), Err(Error::AlbumNotFound(_))));
    }

    #[test]
    fn rename_follows_into_both_selections() {
        let (mut state, _) = manager();
        state.add_album(album("Old", &["a"])).unwrap();
        state.toggle_active_album("Old").unwrap();
        state.toggle_night_mode_album("Old").unwrap();

        state.update_album("Old", album("New", &["a"])).unwrap();
        assert_eq!(state.runtime().current_album, vec!["New"]);
        assert_eq!(state.runtime().current_night_mode_album, vec!["New"]);
        assert_eq!(state.current_pool(at(12)), vec!["a"]);
    }

    #[test]
    fn selecting_unknown_albums_is_rejected() {
        let (mut state, _) = manager();
        assert!(matches!(
            state.set_current_albums(vec!["Ghost".into()]),
            Err(Error::AlbumNotFound(_))
        ));
        assert!(state.toggle_active_album("Ghost").is_err());

        // a dangling name can still be toggled off
        state.runtime.current_album.push("Ghost".into());
        assert!(!state.toggle_active_album("Ghost").unwrap());
        assert!(state.runtime().current_album.is_empty());
    }

    #[test]
    fn queue_edits() {
        let (mut state, _) = manager();
        for path in ["a", "b", "a", "c"] {
            state.add_to_queue(path).unwrap();
        }
        state.remove_from_queue("a").unwrap();
        assert_eq!(state.runtime().current_queue, ["b", "a", "c"]);
        assert!(matches!(
            state.remove_from_queue("zzz"),
            Err(Error::QueueItemNotFound(_))
        ));

        state.add_to_queue("a").unwrap();
        assert_eq!(state.purge_from_queue("a").unwrap(), 2);
        assert_eq!(state.runtime().current_queue, ["b", "c"]);

        state.clear_queue().unwrap();
        assert!(matches!(state.pop_queue_head(), Err(Error::EmptyQueue)));
    }

    #[test]
    fn sync_is_idempotent_and_keeps_inactive_images() {
        let dir = crate::scan::tests::scratch_dir("state-sync");
        for file in ["one.png", "two.JPG", "three.txt"] {
            std::fs::write(dir.join(file), b"").unwrap();
        }
        let base = dir.to_string_lossy().to_string();
        let two = format!("{}/two.JPG", base);

        let (mut state, _) = manager();
        state.add_album(Album::new("Disk", base.clone())).unwrap();

        let report = state.sync_album("Disk").unwrap();
        assert_eq!(report.added, 2);
        state.deactivate_image("Disk", &two).unwrap();

        let first = state.sync_album("Disk").unwrap();
        let snapshot = state.albums().get("Disk").unwrap().clone();
        let second = state.sync_album("Disk").unwrap();
        assert_eq!(first.added, 0);
        assert_eq!(second, first);
        assert_eq!(state.albums().get("Disk").unwrap(), &snapshot);
        assert_eq!(snapshot.inactive_wp, vec![two]);
        assert_eq!(snapshot.active_wp, vec![format!("{}/one.png", base)]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn queue_lookups_normalize_separators() {
        let (mut state, _) = manager();
        state.add_to_queue(r"C:\pics\a.png").unwrap();
        state.add_to_queue(r"C:\pics\b.png").unwrap();
        state.add_to_queue(r"C:\pics\b.png").unwrap();
        state.remove_from_queue(r"C:\pics\a.png").unwrap();
        assert_eq!(state.purge_from_queue(r"C:\pics\b.png").unwrap(), 2);
        assert!(state.runtime().current_queue.is_empty());
    }

    #[test]
    fn rescan_merge_skips_albums_removed_during_the_walk() {
        let dir = crate::scan::tests::scratch_dir("state-rescan");
        std::fs::write(dir.join("one.png"), b"").unwrap();
        let base = dir.to_string_lossy().to_string();

        let (mut state, _) = manager();
        state.add_album(Album::new("Disk", base.clone())).unwrap();
        state.add_album(Album::new("Gone", base.clone())).unwrap();
        state.add_album(album("Loose", &[])).unwrap();

        let jobs = state.scan_jobs();
        assert_eq!(jobs.iter().map(|j| j.album.as_str()).collect::<Vec<_>>(), ["Disk", "Gone"]);
        let results = ScanJob::run_all(jobs);
        state.delete_album("Gone").unwrap();

        let reports = state.finish_rescan(results).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].album, "Disk");
        assert_eq!(
            state.albums().get("Disk").unwrap().active_wp,
            vec![format!("{}/one.png", base)]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn sync_requires_a_base_folder() {
        let (mut state, _) = manager();
        state.add_album(album("Loose", &[])).unwrap();
        assert!(matches!(
            state.sync_album("Loose"),
            Err(Error::InvalidConfiguration(_))
        ));
        // rescans skip it quietly
        assert!(state.sync_all().unwrap().is_empty());
    }

    #[test]
    fn failed_save_keeps_memory_state() {
        let (mut state, store) = manager();
        *store.fail_writes.lock() = true;

        let err = state.add_album(album("Nature", &["a"])).unwrap_err();
        assert!(matches!(err, Error::ConfigIo { kind: ConfigKind::Album, .. }));
        assert!(state.albums().contains("Nature"));
        assert!(store.files.lock().get(&ConfigKind::Album).is_none());
    }

    #[test]
    fn mutations_are_persisted_immediately() {
        let (mut state, store) = manager();
        state.add_album(album("Nature", &["a"])).unwrap();
        state.toggle_active_album("Nature").unwrap();
        state.set_shuffle_interval(5).unwrap();

        let reloaded = StateManager::load(Box::new(store)).unwrap();
        assert_eq!(reloaded.albums(), state.albums());
        assert_eq!(reloaded.runtime().current_album, vec!["Nature"]);
        assert_eq!(reloaded.shuffle_interval_secs(), 300);
    }

    #[test]
    fn setters_validate_input() {
        let (mut state, _) = manager();
        assert!(state.set_shuffle_interval(0).is_err());
        state.set_night_mode_end("7:05").unwrap();
        assert_eq!(state.runtime().current_night_mode_end, "07:05");

        let settings = AppSettings {
            auto_rescan: true,
            rescan_interval: 0,
            ..AppSettings::default()
        };
        assert!(state.save_app_settings(settings).is_err());
        assert_eq!(state.reset_app_settings().unwrap(), AppSettings::default());
    }

    #[test]
    fn album_lookup_defaults_to_first_selection() {
        let (mut state, _) = manager();
        assert!(state.album(None).is_err());
        state.add_album(album("A", &[])).unwrap();
        state.add_album(album("B", &[])).unwrap();
        state.set_current_albums(vec!["B".into(), "A".into()]).unwrap();
        assert_eq!(state.album(None).unwrap().name, "B");
        assert_eq!(state.album(Some("A")).unwrap().name, "A");
    }
}
