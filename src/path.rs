use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "album-wallpaper";

pub fn get_home_relative_path(path: impl AsRef<Path>) -> Result<PathBuf, std::io::Error> {
    let home = std::env::var_os("HOME")
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME is not set"))?;
    Ok(Path::new(&home).join(path))
}

/// Directory holding `album.json`, `runtime.json` and `app.json`.
pub fn config_dir() -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = std::env::var_os("ALBUM_WALLPAPER_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(Path::new(&dir).join(APP_DIR_NAME));
    }

    #[cfg(target_os = "macos")]
    return get_home_relative_path(Path::new("Library/Application Support").join(APP_DIR_NAME));

    #[cfg(not(target_os = "macos"))]
    get_home_relative_path(Path::new(".config").join(APP_DIR_NAME))
}

pub fn socket_path() -> Result<PathBuf, std::io::Error> {
    if let Some(path) = std::env::var_os("ALBUM_WALLPAPER_SOCKET") {
        return Ok(PathBuf::from(path));
    }
    if let Some(dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        return Ok(Path::new(&dir).join(format!("{APP_DIR_NAME}.sock")));
    }

    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    Ok(std::env::temp_dir().join(format!("{APP_DIR_NAME}-{uid}.sock")))
}
