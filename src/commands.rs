//! Request handlers that only touch configuration state.
//!
//! Wallpaper changes and timer control live in [`crate::daemon`].

use crate::error::{Error, Result};
use crate::night::ClockTime;
use crate::protocol::{NotifyLevel, Request, Response};
use crate::state::StateManager;

pub fn execute(state: &mut StateManager, request: Request) -> Result<Response> {
    let response = match request {
        Request::GetSettings { kind } => Response::Data(state.settings_json(kind)?),
        Request::SaveAppSettings { settings } => {
            state.save_app_settings(settings)?;
            Response::OkMsg("Settings saved successfully".into())
        }
        Request::ResetAppSettings => Response::data(&state.reset_app_settings()?),

        Request::QueueShow => Response::data(&state.runtime().current_queue),
        Request::QueueAdd { path } => {
            state.add_to_queue(&path)?;
            Response::Ok
        }
        Request::QueueRemove { path } => {
            state.remove_from_queue(&path)?;
            Response::Ok
        }
        Request::QueuePurge { path } => {
            let removed = state.purge_from_queue(&path)?;
            Response::OkMsg(format!("removed {removed} queued entr{}", if removed == 1 { "y" } else { "ies" }))
        }
        Request::QueueClear => {
            state.clear_queue()?;
            Response::Ok
        }
        Request::FillQueue => {
            let len = state.fill_queue(ClockTime::now())?;
            Response::OkMsg(format!("queued {len} wallpaper(s)"))
        }
        Request::FillQueueOne => Response::data(&state.fill_queue_one(ClockTime::now())?),

        Request::ListAlbums => Response::data(state.albums()),
        Request::GetAlbum { name } => Response::data(state.album(name.as_deref())?),
        Request::AddAlbum { album } => {
            state.add_album(album)?;
            Response::OkMsg("Album added successfully".into())
        }
        Request::UpdateAlbum { old_name, album } => {
            state.update_album(&old_name, album)?;
            Response::OkMsg("Album updated successfully".into())
        }
        Request::DeleteAlbum { name } => {
            state.delete_album(&name)?;
            Response::OkMsg("Album deleted successfully".into())
        }
        Request::SyncAlbum { name } => Response::data(&state.sync_album(&name)?),
        Request::SyncAllAlbums => Response::data(&state.sync_all()?),

        Request::ActivateImage { album, path } => {
            state.activate_image(&album, &path)?;
            Response::Ok
        }
        Request::DeactivateImage { album, path } => {
            state.deactivate_image(&album, &path)?;
            Response::Ok
        }
        Request::DeleteImage { album, path, list } => {
            state.delete_image(&album, &path, list)?;
            Response::OkMsg("Image deleted successfully".into())
        }
        Request::DeleteAllImages { album } => {
            state.delete_all_images(&album)?;
            Response::OkMsg("All images removed from the album".into())
        }
        Request::AddImages { album, paths } => Response::data(&state.add_images(&album, &paths)?),

        Request::SetCurrentAlbums { names } => {
            state.set_current_albums(names)?;
            Response::Ok
        }
        Request::ToggleActiveAlbum { name } => Response::data(&state.toggle_active_album(&name)?),
        Request::ToggleNightModeAlbum { name } => {
            Response::data(&state.toggle_night_mode_album(&name)?)
        }
        Request::SetRandom { enabled } => {
            state.set_random(enabled)?;
            Response::Ok
        }
        Request::SetShuffleInterval { minutes } => {
            state.set_shuffle_interval(minutes)?;
            Response::Ok
        }
        Request::SetNightMode { enabled } => {
            state.set_night_mode(enabled)?;
            Response::Ok
        }
        Request::SetNightModeStart { time } => {
            state.set_night_mode_start(&time)?;
            Response::Ok
        }
        Request::SetNightModeEnd { time } => {
            state.set_night_mode_end(&time)?;
            Response::Ok
        }

        Request::Notify { level, message } => {
            match level {
                NotifyLevel::Info => log::info!("{}", message),
                NotifyLevel::Warning => log::warn!("{}", message),
                NotifyLevel::Error => log::error!("{}", message),
            }
            Response::Ok
        }
        Request::Version => Response::OkMsg(env!("CARGO_PKG_VERSION").to_string()),

        Request::ChangeWallpaper
        | Request::TimerStart
        | Request::TimerPause
        | Request::TimerStop
        | Request::TimerReset
        | Request::TimerStatus => return Err(Error::DaemonUnavailable),
    };
    Ok(response)
}
