//! Albums and the in-memory album store.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::normalize_path;

/// A named group of images. A path lives in at most one of the two lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Album {
    pub name: String,

    #[serde(rename = "baseFolder", default)]
    pub base_folder: String,

    #[serde(default)]
    pub active_wp: Vec<String>,

    #[serde(default)]
    pub inactive_wp: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageList {
    Active,
    Inactive,
}

impl Album {
    pub fn new(name: impl Into<String>, base_folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_folder: normalize_path(&base_folder.into()),
            active_wp: Vec::new(),
            inactive_wp: Vec::new(),
        }
    }

    fn not_found(&self, path: &str) -> Error {
        Error::ImageNotFound {
            album: self.name.clone(),
            path: path.to_string(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.active_wp.iter().any(|p| p == path) || self.inactive_wp.iter().any(|p| p == path)
    }

    /// Moves `path` from the inactive list to the end of the active list.
    pub fn activate(&mut self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let pos = self
            .inactive_wp
            .iter()
            .position(|p| *p == path)
            .ok_or_else(|| self.not_found(&path))?;
        let image = self.inactive_wp.remove(pos);
        self.active_wp.push(image);
        Ok(())
    }

    pub fn deactivate(&mut self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let pos = self
            .active_wp
            .iter()
            .position(|p| *p == path)
            .ok_or_else(|| self.not_found(&path))?;
        let image = self.active_wp.remove(pos);
        self.inactive_wp.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, path: &str, list: ImageList) -> Result<()> {
        let path = normalize_path(path);
        let images = match list {
            ImageList::Active => &mut self.active_wp,
            ImageList::Inactive => &mut self.inactive_wp,
        };
        match images.iter().position(|p| *p == path) {
            Some(pos) => {
                images.remove(pos);
                Ok(())
            }
            None => Err(self.not_found(&path)),
        }
    }

    pub fn clear_images(&mut self) {
        self.active_wp.clear();
        self.inactive_wp.clear();
    }

    /// Appends new paths to the active list, returning the ones actually added.
    pub fn add_images<I, S>(&mut self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        for path in paths {
            let path = normalize_path(path.as_ref());
            if path.is_empty() || self.contains(&path) {
                continue;
            }
            self.active_wp.push(path.clone());
            added.push(path);
        }
        added
    }

    /// Merges a folder scan into the active list. Inactive entries win.
    pub fn merge_scanned(&mut self, found: Vec<String>) -> usize {
        let before = self.active_wp.len();
        let mut seen = std::collections::HashSet::new();
        let mut merged: Vec<String> = Vec::with_capacity(before + found.len());
        for path in self.active_wp.drain(..).chain(found) {
            if seen.insert(path.clone()) {
                merged.push(path);
            }
        }
        merged.retain(|p| !self.inactive_wp.contains(p));
        self.active_wp = merged;
        self.active_wp.len().saturating_sub(before)
    }
}

/// Albums in insertion order, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumStore {
    albums: Vec<Album>,
}

impl AlbumStore {
    pub fn new(albums: Vec<Album>) -> Self {
        Self { albums }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Album> {
        self.albums.iter()
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.albums.iter().any(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&Album> {
        self.albums
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AlbumNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Album> {
        self.albums
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AlbumNotFound(name.to_string()))
    }

    pub fn add(&mut self, album: Album) -> Result<()> {
        if album.name.trim().is_empty() {
            return Err(Error::InvalidConfiguration("album name must not be empty".into()));
        }
        if self.contains(&album.name) {
            return Err(Error::InvalidConfiguration(format!(
                "album already exists: {}",
                album.name
            )));
        }
        self.albums.push(album);
        Ok(())
    }

    /// Replaces the album called `old_name` in place, keeping its position.
    pub fn update(&mut self, old_name: &str, album: Album) -> Result<()> {
        if album.name.trim().is_empty() {
            return Err(Error::InvalidConfiguration("album name must not be empty".into()));
        }
        if album.name != old_name && self.contains(&album.name) {
            return Err(Error::InvalidConfiguration(format!(
                "album already exists: {}",
                album.name
            )));
        }
        let slot = self.get_mut(old_name)?;
        *slot = album;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Album> {
        let pos = self
            .albums
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::AlbumNotFound(name.to_string()))?;
        Ok(self.albums.remove(pos))
    }

    pub fn names(&self) -> Vec<String> {
        self.albums.iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album(active: &[&str], inactive: &[&str]) -> Album {
        Album {
            name: "Nature".into(),
            base_folder: String::new(),
            active_wp: active.iter().map(|s| s.to_string()).collect(),
            inactive_wp: inactive.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn activate_and_deactivate_move_between_lists() {
        let mut a = album(&["a", "b"], &["c"]);
        a.deactivate("a").unwrap();
        assert_eq!(a.active_wp, vec!["b"]);
        assert_eq!(a.inactive_wp, vec!["c", "a"]);

        a.activate("c").unwrap();
        assert_eq!(a.active_wp, vec!["b", "c"]);
        assert_eq!(a.inactive_wp, vec!["a"]);
    }

    #[test]
    fn moving_a_missing_image_reports_not_found() {
        let mut a = album(&["a"], &[]);
        let err = a.activate("a").unwrap_err();
        assert!(matches!(err, Error::ImageNotFound { .. }));
        let err = a.deactivate("zzz").unwrap_err();
        assert!(matches!(err, Error::ImageNotFound { .. }));
        assert_eq!(a, album(&["a"], &[]));
    }

    #[test]
    fn lookups_normalize_separators_like_adds() {
        let mut a = album(&[], &[]);
        a.add_images([r"\p\a.png", r"\p\b.png"]);
        a.deactivate(r"\p\a.png").unwrap();
        a.activate("/p/a.png").unwrap();
        a.remove_image(r"\p\b.png", ImageList::Active).unwrap();
        assert_eq!(a.active_wp, vec!["/p/a.png"]);
    }

    #[test]
    fn remove_image_targets_one_list() {
        let mut a = album(&["a"], &["b"]);
        assert!(a.remove_image("b", ImageList::Active).is_err());
        a.remove_image("b", ImageList::Inactive).unwrap();
        assert!(a.inactive_wp.is_empty());
        assert_eq!(a.active_wp, vec!["a"]);
    }

    #[test]
    fn add_images_skips_known_and_repeated_paths() {
        let mut a = album(&["/p/a.png"], &["/p/b.png"]);
        let added = a.add_images([r"\p\a.png", "/p/b.png", "/p/c.png", r"\p\c.png", ""]);
        assert_eq!(added, vec!["/p/c.png"]);
        assert_eq!(a.active_wp, vec!["/p/a.png", "/p/c.png"]);
    }

    #[test]
    fn merge_scanned_dedupes_and_respects_inactive() {
        let mut a = album(&["x", "a"], &["b"]);
        let added = a.merge_scanned(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(added, 1);
        assert_eq!(a.active_wp, vec!["x", "a", "c"]);
        assert_eq!(a.inactive_wp, vec!["b"]);

        let snapshot = a.clone();
        a.merge_scanned(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(a, snapshot);
    }

    #[test]
    fn store_rejects_duplicate_and_empty_names() {
        let mut store = AlbumStore::default();
        store.add(Album::new("Nature", "")).unwrap();
        assert!(matches!(
            store.add(Album::new("Nature", "")),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            store.add(Album::new("  ", "")),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn update_keeps_position_and_blocks_name_collisions() {
        let mut store = AlbumStore::new(vec![Album::new("A", ""), Album::new("B", "")]);
        store.update("A", Album::new("C", "/pics")).unwrap();
        assert_eq!(store.names(), vec!["C", "B"]);
        assert_eq!(store.get("C").unwrap().base_folder, "/pics");

        assert!(store.update("C", Album::new("B", "")).is_err());
        assert!(matches!(
            store.update("missing", Album::new("D", "")),
            Err(Error::AlbumNotFound(_))
        ));
    }
}
