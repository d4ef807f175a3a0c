//! Folder scanning for album sync.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif"];

/// Album paths are always stored with forward slashes.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lists regular files below `folder`. Only direct children unless `recursive`.
pub fn list_files(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>, std::io::Error> {
    if !folder.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", folder.display()),
        ));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub fn filter_by_image_extension(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .filter(|path| is_image(path))
        .map(|path| normalize_path(&path.to_string_lossy()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh empty directory under the system temp dir.
    pub(crate) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "album-wallpaper-test-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        let paths = vec![
            PathBuf::from("/pics/a.JPG"),
            PathBuf::from("/pics/b.tif"),
            PathBuf::from("/pics/notes.txt"),
            PathBuf::from("/pics/noext"),
            PathBuf::from("/pics/c.webp"),
        ];
        assert_eq!(
            filter_by_image_extension(paths),
            vec!["/pics/a.JPG".to_string(), "/pics/b.tif".to_string()]
        );
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_path(r"C:\Users\me\a.png"), "C:/Users/me/a.png");
    }

    #[test]
    fn lists_direct_children_unless_recursive() {
        let dir = scratch_dir("list");
        std::fs::write(dir.join("a.png"), b"").unwrap();
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub/b.jpg"), b"").unwrap();

        let flat = list_files(&dir, false).unwrap();
        assert_eq!(flat, vec![dir.join("a.png")]);

        let deep = list_files(&dir, true).unwrap();
        assert_eq!(deep.len(), 2);
        assert!(deep.contains(&dir.join("sub/b.jpg")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = std::env::temp_dir().join("album-wallpaper-test-definitely-missing");
        assert!(list_files(&dir, false).is_err());
    }
}
