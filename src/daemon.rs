//! The long-running rotation service and its socket server.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

use crate::commands;
use crate::error::{Error, Result};
use crate::night::ClockTime;
use crate::protocol::{Request, Response};
use crate::state::{ScanJob, StateManager, SyncReport};
use crate::timer::{RotationTimer, Tick, TimerState};
use crate::PlatformProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    pub applied: String,
    /// Entry appended to the queue tail, if the pool was not empty.
    pub queued: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub remaining: u64,
}

#[derive(Clone)]
pub struct Daemon {
    state: Arc<Mutex<StateManager>>,
    timer: Arc<Mutex<RotationTimer>>,
    provider: Arc<dyn PlatformProvider>,
    apply_gate: Arc<tokio::sync::Mutex<()>>,
    rescan: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Daemon {
    pub fn new(state: StateManager, provider: Arc<dyn PlatformProvider>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            timer: Arc::new(Mutex::new(RotationTimer::new())),
            provider,
            apply_gate: Arc::new(tokio::sync::Mutex::new(())),
            rescan: Arc::new(Mutex::new(None)),
        }
    }

    fn interval_secs(&self) -> u64 {
        self.state.lock().shuffle_interval_secs()
    }

    /// Pops the queue head, applies it, then refills the queue by one.
    ///
    /// An empty queue is bulk-filled from the current pool first, so rotation
    /// recovers once albums are selected or after failed applies drained it.
    /// Only one change runs at a time. A failed apply leaves the head consumed.
    pub async fn change_wallpaper(&self) -> Result<ChangeOutcome> {
        let _gate = self.apply_gate.lock().await;

        let head = {
            let mut state = self.state.lock();
            if state.runtime().current_queue.is_empty() {
                let len = state.fill_queue(ClockTime::now())?;
                log::info!("queue was empty, refilled with {} wallpaper(s)", len);
            }
            state.pop_queue_head()?
        };
        let provider = self.provider.clone();
        let target = PathBuf::from(&head);
        let applied = tokio::task::spawn_blocking(move || provider.set_desktop_wallpaper(&target))
            .await
            .map_err(|e| Error::ExternalActionFailure {
                path: head.clone(),
                message: e.to_string(),
            })?;
        if let Err(e) = applied {
            let err = Error::ExternalActionFailure {
                path: head,
                message: e.to_string(),
            };
            log::error!("{}", err);
            return Err(err);
        }
        log::info!("wallpaper set: {}", head);

        let queued = match self.state.lock().fill_queue_one(ClockTime::now()) {
            Ok(path) => Some(path),
            Err(Error::EmptyPool) => {
                log::warn!("nothing left to queue: the selected albums have no active images");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(ChangeOutcome {
            applied: head,
            queued,
        })
    }

    /// Advances the rotation timer by one second.
    pub async fn on_tick(&self) {
        let interval = self.interval_secs();
        let tick = self.timer.lock().tick(interval);
        match tick {
            Tick::Idle => {}
            Tick::Remaining(remaining) => log::trace!("next wallpaper in {}s", remaining),
            Tick::Expired => {
                if let Err(e) = self.change_wallpaper().await {
                    log::error!("scheduled wallpaper change failed: {}", e);
                }
            }
        }
    }

    async fn run_timer(self) {
        let period = Duration::from_secs(1);
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.on_tick().await;
        }
    }

    /// Syncs one album. The folder walk runs on the blocking pool with the
    /// state unlocked.
    pub async fn sync_album(&self, name: &str) -> Result<SyncReport> {
        let job = self.state.lock().scan_job(name)?;
        let found = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(join_error)??;
        self.state.lock().finish_sync(name, found)
    }

    /// Syncs every album with a base folder, walking off the runtime thread.
    pub async fn rescan_all(&self) -> Result<Vec<SyncReport>> {
        let jobs = self.state.lock().scan_jobs();
        let results = tokio::task::spawn_blocking(move || ScanJob::run_all(jobs))
            .await
            .map_err(join_error)?;
        self.state.lock().finish_rescan(results)
    }

    /// Re-arms the periodic folder rescan from the current app settings.
    pub fn restart_rescan(&self) {
        if let Some(handle) = self.rescan.lock().take() {
            handle.abort();
        }

        let (enabled, hours) = {
            let state = self.state.lock();
            (state.app().auto_rescan, state.app().rescan_interval)
        };
        if !enabled || hours == 0 {
            log::debug!("automatic rescan disabled");
            return;
        }

        let period = Duration::from_secs(hours * 60 * 60);
        let daemon = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if let Err(e) = daemon.rescan_all().await {
                    log::error!("automatic rescan failed: {}", e);
                }
            }
        });
        *self.rescan.lock() = Some(handle);
        log::info!("automatic rescan every {} hour(s)", hours);
    }

    pub fn timer_status(&self) -> TimerStatus {
        let timer = self.timer.lock();
        TimerStatus {
            state: timer.state(),
            remaining: timer.remaining(),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::ChangeWallpaper => self
                .change_wallpaper()
                .await
                .map(|outcome| Response::data(&outcome)),
            Request::SyncAlbum { name } => self
                .sync_album(&name)
                .await
                .map(|report| Response::data(&report)),
            Request::SyncAllAlbums => self
                .rescan_all()
                .await
                .map(|reports| Response::data(&reports)),
            request => self.handle_sync(request),
        };

        result.unwrap_or_else(|e| {
            log::error!("{}", e);
            Response::Err(e.to_string())
        })
    }

    fn handle_sync(&self, request: Request) -> Result<Response> {
        match request {
            Request::TimerStart => {
                let interval = self.interval_secs();
                if self.timer.lock().start(interval) {
                    log::info!("rotation timer started");
                }
            }
            Request::TimerPause => {
                self.timer.lock().pause();
                log::info!("rotation timer paused");
            }
            Request::TimerStop => {
                let interval = self.interval_secs();
                self.timer.lock().stop(interval);
                log::info!("rotation timer stopped");
            }
            Request::TimerReset => {
                let interval = self.interval_secs();
                self.timer.lock().reset(interval);
            }
            Request::TimerStatus => {}
            request @ (Request::SaveAppSettings { .. } | Request::ResetAppSettings) => {
                let response = commands::execute(&mut self.state.lock(), request)?;
                self.restart_rescan();
                return Ok(response);
            }
            request => return commands::execute(&mut self.state.lock(), request),
        }
        Ok(Response::data(&self.timer_status()))
    }

    async fn handle_client(&self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = match Request::parse_line(&line) {
                Ok(request) => self.handle(request).await,
                Err(e) => Response::Err(e.to_string()),
            };
            writer.write_all(response.to_line().as_bytes()).await?;
            writer.flush().await?;
        }
        Ok(())
    }

    pub async fn serve(self, listener: UnixListener) -> Result<()> {
        loop {
            let (stream, _addr) = listener.accept().await?;
            let daemon = self.clone();
            tokio::spawn(async move {
                if let Err(e) = daemon.handle_client(stream).await {
                    log::warn!("client connection failed: {}", e);
                }
            });
        }
    }

    /// Startup housekeeping: optional rescan, then make sure the queue is primed.
    async fn prepare(&self) {
        let rescan_on_start = self.state.lock().app().rescan_every_start;
        if rescan_on_start {
            if let Err(e) = self.rescan_all().await {
                log::error!("startup rescan failed: {}", e);
            }
        }
        let mut state = self.state.lock();
        if state.runtime().current_queue.is_empty() {
            match state.fill_queue(ClockTime::now()) {
                Ok(len) => log::info!("queue primed with {} wallpaper(s)", len),
                Err(e) => log::warn!("queue not primed: {}", e),
            }
        }
    }

    fn shutdown(&self) {
        if let Some(handle) = self.rescan.lock().take() {
            handle.abort();
        }
        if let Err(e) = self.state.lock().save_runtime() {
            log::error!("failed to save runtime settings on exit: {}", e);
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

fn bind(socket: &Path) -> Result<UnixListener> {
    if socket.exists() {
        if std::os::unix::net::UnixStream::connect(socket).is_ok() {
            return Err(Error::Ipc(format!(
                "another daemon is already listening on {}",
                socket.display()
            )));
        }
        std::fs::remove_file(socket)?;
    }
    if let Some(dir) = socket.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let listener = UnixListener::bind(socket)?;

    if let Err(e) = std::fs::set_permissions(socket, std::fs::Permissions::from_mode(0o600)) {
        log::warn!("could not restrict socket permissions: {}", e);
    }
    Ok(listener)
}

/// Runs the daemon until interrupted.
pub fn run(state: StateManager, provider: Arc<dyn PlatformProvider>, socket: PathBuf, paused: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let listener = bind(&socket)?;
        log::info!("listening on {}", socket.display());

        let daemon = Daemon::new(state, provider);
        daemon.prepare().await;
        daemon.restart_rescan();
        if !paused {
            let interval = daemon.interval_secs();
            daemon.timer.lock().start(interval);
            log::info!("rotation timer started ({}s interval)", interval);
        }

        let timer_task = tokio::spawn(daemon.clone().run_timer());
        let result = tokio::select! {
            result = daemon.clone().serve(listener) => result,
            signal = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                signal.map_err(Error::from)
            }
        };

        timer_task.abort();
        daemon.shutdown();
        if let Err(e) = std::fs::remove_file(&socket) {
            log::debug!("socket not removed: {}", e);
        }
        result
    })
}
