//! Sends requests to the daemon, or runs them in-process when it is not running.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::daemon::Daemon;
use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use crate::state::StateManager;
use crate::PlatformProvider;

async fn send(socket: &Path, request: &Request) -> Result<Option<Response>> {
    let stream = match UnixStream::connect(socket).await {
        Ok(stream) => stream,
        Err(e) => {
            log::debug!("daemon not reachable at {}: {}", socket.display(), e);
            return Ok(None);
        }
    };
    let (reader, mut writer) = stream.into_split();
    writer.write_all(request.to_line()?.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line).await?;
    if line.is_empty() {
        return Err(Error::Ipc("daemon closed the connection".into()));
    }
    Response::parse_line(&line).map(Some)
}

/// `load_state` and `provider` are only used when no daemon answers.
pub fn dispatch<S, P>(socket: &Path, request: Request, load_state: S, provider: P) -> Result<Response>
where
    S: FnOnce() -> Result<StateManager>,
    P: FnOnce() -> Result<Arc<dyn PlatformProvider>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        if let Some(response) = send(socket, &request).await? {
            return Ok(response);
        }
        if request.needs_daemon() {
            return Err(Error::DaemonUnavailable);
        }

        log::debug!("running {:?} in-process", request);
        let daemon = Daemon::new(load_state()?, provider()?);
        Ok(daemon.handle(request).await)
    })
}
