//! Newline-delimited JSON requests and responses spoken over the daemon socket.

use serde::{Deserialize, Serialize};

use crate::album::{Album, ImageList};
use crate::config::{AppSettings, ConfigKind};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Request {
    GetSettings { kind: ConfigKind },
    SaveAppSettings { settings: AppSettings },
    ResetAppSettings,

    QueueShow,
    QueueAdd { path: String },
    QueueRemove { path: String },
    QueuePurge { path: String },
    QueueClear,
    FillQueue,
    FillQueueOne,

    ListAlbums,
    GetAlbum { name: Option<String> },
    AddAlbum { album: Album },
    UpdateAlbum { old_name: String, album: Album },
    DeleteAlbum { name: String },
    SyncAlbum { name: String },
    SyncAllAlbums,

    ActivateImage { album: String, path: String },
    DeactivateImage { album: String, path: String },
    DeleteImage { album: String, path: String, list: ImageList },
    DeleteAllImages { album: String },
    AddImages { album: String, paths: Vec<String> },

    SetCurrentAlbums { names: Vec<String> },
    ToggleActiveAlbum { name: String },
    ToggleNightModeAlbum { name: String },
    SetRandom { enabled: bool },
    SetShuffleInterval { minutes: u64 },
    SetNightMode { enabled: bool },
    SetNightModeStart { time: String },
    SetNightModeEnd { time: String },

    ChangeWallpaper,

    TimerStart,
    TimerPause,
    TimerStop,
    TimerReset,
    TimerStatus,

    Notify { level: NotifyLevel, message: String },
    Version,
}

impl Request {
    /// Requests that only make sense against a running daemon.
    pub fn needs_daemon(&self) -> bool {
        matches!(
            self,
            Request::TimerStart
                | Request::TimerPause
                | Request::TimerStop
                | Request::TimerReset
                | Request::TimerStatus
        )
    }

    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).map_err(|e| Error::Ipc(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        serde_json::from_str(line).map_err(|e| Error::Ipc(format!("bad request: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "kebab-case")]
pub enum Response {
    Ok,
    OkMsg(String),
    Data(serde_json::Value),
    Err(String),
}

impl Response {
    pub fn data<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Response::Data(value),
            Err(e) => Response::Err(e.to_string()),
        }
    }

    pub fn to_line(&self) -> String {
        // Serializing a Value-backed enum cannot fail.
        let mut line = serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"status":"err","body":{:?}}}"#, e.to_string()));
        line.push('\n');
        line
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        serde_json::from_str(line).map_err(|e| Error::Ipc(format!("bad response: {e}")))
    }
}

impl From<Result<Response>> for Response {
    fn from(result: Result<Response>) -> Self {
        result.unwrap_or_else(|e| Response::Err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_tagged_by_command() {
        let line = Request::SetShuffleInterval { minutes: 5 }.to_line().unwrap();
        assert_eq!(line, "{\"command\":\"set-shuffle-interval\",\"minutes\":5}\n");

        let parsed = Request::parse_line("{\"command\":\"delete-image\",\"album\":\"A\",\"path\":\"/a.png\",\"list\":\"inactive\"}\r\n").unwrap();
        assert_eq!(
            parsed,
            Request::DeleteImage {
                album: "A".into(),
                path: "/a.png".into(),
                list: ImageList::Inactive,
            }
        );
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(matches!(
            Request::parse_line("{\"command\":\"format-disk\"}"),
            Err(Error::Ipc(_))
        ));
        assert!(Request::parse_line("PING").is_err());
    }

    #[test]
    fn responses_survive_the_wire() {
        let resp = Response::Data(serde_json::json!({ "remaining": 12 }));
        assert_eq!(Response::parse_line(&resp.to_line()).unwrap(), resp);
        assert_eq!(Response::Ok.to_line(), "{\"status\":\"ok\"}\n");
    }

    #[test]
    fn only_timer_requests_need_the_daemon() {
        assert!(Request::TimerStatus.needs_daemon());
        assert!(!Request::ChangeWallpaper.needs_daemon());
        assert!(!Request::Version.needs_daemon());
    }
}
