use crate::album::AlbumStore;
use crate::config::RuntimeSettings;

/// Candidate images for the current mode, in album-store order.
///
/// Paths shared by two selected albums appear twice.
pub fn build_pool(albums: &AlbumStore, runtime: &RuntimeSettings, night_active: bool) -> Vec<String> {
    let selected = if night_active {
        &runtime.current_night_mode_album
    } else {
        &runtime.current_album
    };

    albums
        .iter()
        .filter(|album| selected.contains(&album.name))
        .flat_map(|album| album.active_wp.iter().cloned())
        .collect()
}
