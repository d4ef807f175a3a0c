
mod album;
mod client;
mod commands;
mod config;
mod daemon;
mod error;
mod night;
mod path;
mod pool;
mod protocol;
mod queue;
mod scan;
mod state;
mod timer;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
mod gnu_linux;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;

use crate::album::{Album, ImageList};
use crate::config::{AppSettings, ConfigKind, JsonFileStore};
use crate::error::{Error, Result};
use crate::protocol::{NotifyLevel, Request, Response};
use crate::state::StateManager;

#[derive(Debug, Parser)]
#[command(version, about = "Rotate desktop wallpapers from local image albums", long_about = None)]
struct Args {
    #[command(subcommand)]
    subcmd: Command,
}

#[non_exhaustive]
#[derive(Debug, Subcommand)]
enum Command {
    /// Run the wallpaper rotation daemon
    #[command()]
    Run {
        /// Start with the rotation timer stopped
        #[arg(long)]
        paused: bool,
    },

    /// Install the rotation daemon as a service for the current user
    #[command()]
    Install,

    /// Show the rotation timer
    Status,

    /// Apply the next queued wallpaper now
    Next,

    /// Print the version of the running daemon (or of this binary)
    Version,

    /// Manage albums
    #[command(subcommand)]
    Album(AlbumCommand),

    /// Activate, deactivate or delete images of an album
    #[command(subcommand)]
    Image(ImageCommand),

    /// Inspect and edit the rotation queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Control the rotation timer of the running daemon
    #[command(subcommand)]
    Timer(TimerCommand),

    /// Change rotation settings
    #[command(subcommand)]
    Set(SetCommand),

    /// Show or change application settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Log a message through the daemon
    Notify {
        #[arg(value_enum)]
        level: LevelArg,
        message: String,
    },
}

#[derive(Debug, Subcommand)]
enum AlbumCommand {
    /// List all albums
    List,
    /// Show one album (the first selected album by default)
    Show { name: Option<String> },
    /// Create an album
    Add {
        name: String,
        /// Folder scanned by `album sync`
        #[arg(short, long, default_value = "")]
        folder: String,
    },
    /// Rename an album or change its folder
    Update {
        name: String,
        #[arg(long = "name")]
        new_name: Option<String>,
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Delete an album
    Delete { name: String },
    /// Rescan the album folder for new images
    Sync {
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Sync every album that has a folder
        #[arg(long)]
        all: bool,
    },
    /// Add image files to an album
    AddImages {
        name: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove every image from an album
    Clear { name: String },
    /// Replace the set of albums used for rotation
    Select { names: Vec<String> },
    /// Add or remove an album from rotation
    Toggle { name: String },
    /// Add or remove an album from night-mode rotation
    ToggleNight { name: String },
}

#[derive(Debug, Subcommand)]
enum ImageCommand {
    /// Include an image in rotation again
    Activate { album: String, path: String },
    /// Exclude an image from rotation but keep it in the album
    Deactivate { album: String, path: String },
    /// Remove an image from the album
    Delete {
        album: String,
        path: String,
        /// Delete from the inactive list instead of the active one
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Debug, Subcommand)]
enum QueueCommand {
    Show,
    Add { path: String },
    /// Remove the first queued occurrence of a path
    Remove { path: String },
    /// Remove every queued occurrence of a path
    Purge { path: String },
    Clear,
    /// Rebuild the queue from the selected albums
    Fill,
    /// Append a single random pick to the queue
    FillOne,
}

#[derive(Debug, Subcommand)]
enum TimerCommand {
    Start,
    Pause,
    Stop,
    Reset,
    Status,
}

#[derive(Debug, Subcommand)]
enum SetCommand {
    Random {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Minutes between wallpaper changes
    Interval { minutes: u64 },
    NightMode {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Night mode start, HH:MM
    NightStart { time: String },
    /// Night mode end, HH:MM
    NightEnd { time: String },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show {
        #[arg(value_enum, default_value = "app")]
        kind: KindArg,
    },
    App {
        #[arg(long)]
        rescan_every_start: Option<bool>,
        #[arg(long)]
        auto_rescan: Option<bool>,
        /// Hours between automatic rescans
        #[arg(long)]
        rescan_interval: Option<u64>,
        #[arg(long)]
        scan_subfolders: Option<bool>,
    },
    Reset,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Album,
    Runtime,
    App,
}

impl From<KindArg> for ConfigKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Album => ConfigKind::Album,
            KindArg::Runtime => ConfigKind::Runtime,
            KindArg::App => ConfigKind::App,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LevelArg {
    Info,
    Warning,
    Error,
}

impl From<LevelArg> for NotifyLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Info => NotifyLevel::Info,
            LevelArg::Warning => NotifyLevel::Warning,
            LevelArg::Error => NotifyLevel::Error,
        }
    }
}

pub trait PlatformInstaller {
    fn install(&self) -> Result<(), std::io::Error>;
}

pub trait PlatformProvider: Send + Sync {
    fn set_desktop_wallpaper(&self, path: &Path) -> Result<(), std::io::Error>;
}

fn build_provider() -> Result<Arc<dyn PlatformProvider>> {
    #[cfg(target_os = "macos")]
    return Ok(Arc::new(macos::MacosProvider));

    #[cfg(not(target_os = "macos"))]
    {
        #[cfg(target_os = "linux")]
        return Ok(Arc::new(gnu_linux::GnuLinuxProvider));

        #[cfg(not(target_os = "linux"))]
        Err(Error::InvalidConfiguration("unsupported platform".into()))
    }
}

fn build_installer() -> Result<Box<dyn PlatformInstaller>> {
    #[cfg(target_os = "macos")]
    return Ok(Box::new(macos::MacosInstaller));

    #[cfg(not(target_os = "macos"))]
    {
        #[cfg(target_os = "linux")]
        return Ok(Box::new(gnu_linux::GnuLinuxInstaller));

        #[cfg(not(target_os = "linux"))]
        Err(Error::InvalidConfiguration("unsupported platform".into()))
    }
}

fn install() -> Result<()> {
    let installer = build_installer()?;
    installer.install()?;
    log::info!("installed; the daemon now starts with your session");
    Ok(())
}

fn load_state() -> Result<StateManager> {
    let store = JsonFileStore::new(path::config_dir()?);
    log::debug!("config directory: {}", store.dir().display());
    StateManager::load(Box::new(store))
}

/// Turns a CLI invocation into the request(s) it stands for.
fn build_request(subcmd: Command, socket: &Path) -> Result<Request> {
    let request = match subcmd {
        Command::Status => Request::TimerStatus,
        Command::Next => Request::ChangeWallpaper,
        Command::Version => Request::Version,
        Command::Notify { level, message } => Request::Notify {
            level: level.into(),
            message,
        },

        Command::Album(cmd) => match cmd {
            AlbumCommand::List => Request::ListAlbums,
            AlbumCommand::Show { name } => Request::GetAlbum { name },
            AlbumCommand::Add { name, folder } => Request::AddAlbum {
                album: Album::new(name, absolutize(folder)),
            },
            AlbumCommand::Update {
                name,
                new_name,
                folder,
            } => {
                let mut album = fetch_album(socket, &name)?;
                if let Some(new_name) = new_name {
                    album.name = new_name;
                }
                if let Some(folder) = folder {
                    album.base_folder = absolutize(folder);
                }
                Request::UpdateAlbum {
                    old_name: name,
                    album,
                }
            }
            AlbumCommand::Delete { name } => Request::DeleteAlbum { name },
            AlbumCommand::Sync { name, all } => match name {
                Some(name) if !all => Request::SyncAlbum { name },
                _ => Request::SyncAllAlbums,
            },
            AlbumCommand::AddImages { name, paths } => Request::AddImages {
                album: name,
                paths: paths.into_iter().map(absolutize).collect(),
            },
            AlbumCommand::Clear { name } => Request::DeleteAllImages { album: name },
            AlbumCommand::Select { names } => Request::SetCurrentAlbums { names },
            AlbumCommand::Toggle { name } => Request::ToggleActiveAlbum { name },
            AlbumCommand::ToggleNight { name } => Request::ToggleNightModeAlbum { name },
        },

        Command::Image(cmd) => match cmd {
            ImageCommand::Activate { album, path } => Request::ActivateImage {
                album,
                path: absolutize(path),
            },
            ImageCommand::Deactivate { album, path } => Request::DeactivateImage {
                album,
                path: absolutize(path),
            },
            ImageCommand::Delete {
                album,
                path,
                inactive,
            } => Request::DeleteImage {
                album,
                path: absolutize(path),
                list: if inactive {
                    ImageList::Inactive
                } else {
                    ImageList::Active
                },
            },
        },

        Command::Queue(cmd) => match cmd {
            QueueCommand::Show => Request::QueueShow,
            QueueCommand::Add { path } => Request::QueueAdd {
                path: absolutize(path),
            },
            QueueCommand::Remove { path } => Request::QueueRemove {
                path: absolutize(path),
            },
            QueueCommand::Purge { path } => Request::QueuePurge {
                path: absolutize(path),
            },
            QueueCommand::Clear => Request::QueueClear,
            QueueCommand::Fill => Request::FillQueue,
            QueueCommand::FillOne => Request::FillQueueOne,
        },

        Command::Timer(cmd) => match cmd {
            TimerCommand::Start => Request::TimerStart,
            TimerCommand::Pause => Request::TimerPause,
            TimerCommand::Stop => Request::TimerStop,
            TimerCommand::Reset => Request::TimerReset,
            TimerCommand::Status => Request::TimerStatus,
        },

        Command::Set(cmd) => match cmd {
            SetCommand::Random { enabled } => Request::SetRandom { enabled },
            SetCommand::Interval { minutes } => Request::SetShuffleInterval { minutes },
            SetCommand::NightMode { enabled } => Request::SetNightMode { enabled },
            SetCommand::NightStart { time } => Request::SetNightModeStart { time },
            SetCommand::NightEnd { time } => Request::SetNightModeEnd { time },
        },

        Command::Settings(cmd) => match cmd {
            SettingsCommand::Show { kind } => Request::GetSettings { kind: kind.into() },
            SettingsCommand::Reset => Request::ResetAppSettings,
            SettingsCommand::App {
                rescan_every_start,
                auto_rescan,
                rescan_interval,
                scan_subfolders,
            } => {
                let mut settings = fetch_app_settings(socket)?;
                if let Some(v) = rescan_every_start {
                    settings.rescan_every_start = v;
                }
                if let Some(v) = auto_rescan {
                    settings.auto_rescan = v;
                }
                if let Some(v) = rescan_interval {
                    settings.rescan_interval = v;
                }
                if let Some(v) = scan_subfolders {
                    settings.scan_subfolders = v;
                }
                Request::SaveAppSettings { settings }
            }
        },

        Command::Run { .. } | Command::Install => {
            return Err(Error::InvalidConfiguration("not a client command".into()));
        }
    };
    Ok(request)
}

/// Album and image paths are stored absolute, resolved against the caller's
/// working directory rather than the daemon's. Empty stays empty.
fn absolutize(path: String) -> String {
    let p = Path::new(&path);
    if path.is_empty() || p.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(p).to_string_lossy().into_owned(),
        Err(_) => path,
    }
}

fn send(socket: &Path, request: Request) -> Result<Response> {
    client::dispatch(socket, request, load_state, build_provider)
}

fn fetch_data<T: serde::de::DeserializeOwned>(socket: &Path, request: Request) -> Result<T> {
    match send(socket, request)? {
        Response::Data(value) => serde_json::from_value(value).map_err(|e| Error::Ipc(e.to_string())),
        Response::Err(msg) => Err(Error::Ipc(msg)),
        other => Err(Error::Ipc(format!("unexpected response: {:?}", other))),
    }
}

fn fetch_album(socket: &Path, name: &str) -> Result<Album> {
    fetch_data(
        socket,
        Request::GetAlbum {
            name: Some(name.to_string()),
        },
    )
}

fn fetch_app_settings(socket: &Path) -> Result<AppSettings> {
    fetch_data(socket, Request::GetSettings { kind: ConfigKind::App })
}

fn print_response(response: Response) -> Result<()> {
    match response {
        Response::Ok => {}
        Response::OkMsg(msg) => println!("{}", msg),
        Response::Data(value) => {
            let text = serde_json::to_string_pretty(&value).map_err(|e| Error::Ipc(e.to_string()))?;
            println!("{}", text);
        }
        Response::Err(msg) => return Err(Error::Ipc(msg)),
    }
    Ok(())
}

fn real_main() -> Result<()> {
    let args = Args::parse();
    let subcmd = args.subcmd;

    match subcmd {
        Command::Run { paused } => {
            let state = load_state()?;
            let provider = build_provider()?;
            daemon::run(state, provider, path::socket_path()?, paused)
        }
        Command::Install => install(),
        subcmd => {
            let socket = path::socket_path()?;
            let request = build_request(subcmd, &socket)?;
            print_response(send(&socket, request)?)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = real_main() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subcmd: Command) -> Request {
        build_request(subcmd, Path::new("/nonexistent/album-wallpaper.sock")).unwrap()
    }

    #[test]
    fn relative_queue_paths_resolve_the_same_way_for_add_and_remove() {
        let added = request(Command::Queue(QueueCommand::Add { path: "pics/a.png".into() }));
        let removed = request(Command::Queue(QueueCommand::Remove { path: "pics/a.png".into() }));
        let purged = request(Command::Queue(QueueCommand::Purge { path: "pics/a.png".into() }));

        let (Request::QueueAdd { path: added }, Request::QueueRemove { path: removed }, Request::QueuePurge { path: purged }) =
            (added, removed, purged)
        else {
            panic!("unexpected requests");
        };
        assert!(Path::new(&added).is_absolute());
        assert!(added.ends_with("pics/a.png"));
        assert_eq!(added, removed);
        assert_eq!(added, purged);
    }

    #[test]
    fn album_folders_and_image_paths_are_absolute() {
        let Request::AddAlbum { album } = request(Command::Album(AlbumCommand::Add {
            name: "Nature".into(),
            folder: "pics".into(),
        })) else {
            panic!("expected an add-album request");
        };
        assert!(Path::new(&album.base_folder).is_absolute());
        assert!(album.base_folder.ends_with("/pics"));

        let Request::AddAlbum { album } = request(Command::Album(AlbumCommand::Add {
            name: "Loose".into(),
            folder: String::new(),
        })) else {
            panic!("expected an add-album request");
        };
        assert_eq!(album.base_folder, "");

        let Request::DeactivateImage { path, .. } = request(Command::Image(ImageCommand::Deactivate {
            album: "Nature".into(),
            path: "pics/a.png".into(),
        })) else {
            panic!("expected a deactivate request");
        };
        assert!(Path::new(&path).is_absolute());

        let Request::AddImages { paths, .. } = request(Command::Album(AlbumCommand::AddImages {
            name: "Nature".into(),
            paths: vec!["/abs/b.png".into()],
        })) else {
            panic!("expected an add-images request");
        };
        assert_eq!(paths, vec!["/abs/b.png".to_string()]);
    }
}
