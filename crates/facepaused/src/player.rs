//! Media playback control over MPRIS.

use std::future::Future;
use thiserror::Error;

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("no MPRIS media player on the session bus")]
    NoPlayer,
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),
    #[error("D-Bus error: {0}")]
    Fdo(#[from] zbus::fdo::Error),
}

/// The video element being paused and resumed.
pub trait MediaPlayer: Send + Sync + 'static {
    fn play(&self) -> impl Future<Output = Result<(), PlayerError>> + Send;

    fn pause(&self) -> impl Future<Output = Result<(), PlayerError>> + Send;
}

#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Player {
    async fn play(&self) -> zbus::Result<()>;

    async fn pause(&self) -> zbus::Result<()>;
}

/// Controls an MPRIS player on the session bus.
///
/// The target is resolved on every command, so a player started after the
/// daemon is picked up without a restart.
pub struct MprisPlayer {
    connection: zbus::Connection,
    name: Option<String>,
}

impl MprisPlayer {
    /// `name` is either a full bus name or the suffix after
    /// `org.mpris.MediaPlayer2.` (e.g. "vlc").
    pub fn new(connection: zbus::Connection, name: Option<String>) -> Self {
        Self { connection, name }
    }

    async fn proxy(&self) -> Result<PlayerProxy<'static>, PlayerError> {
        let destination = match &self.name {
            Some(name) => bus_name_for(name),
            None => {
                let names = zbus::fdo::DBusProxy::new(&self.connection)
                    .await?
                    .list_names()
                    .await?;
                let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
                pick_mpris_name(&names).ok_or(PlayerError::NoPlayer)?
            }
        };
        tracing::debug!(player = %destination, "resolved media player");

        Ok(PlayerProxy::builder(&self.connection)
            .destination(destination)?
            .cache_properties(zbus::proxy::CacheProperties::No)
            .build()
            .await?)
    }
}

impl MediaPlayer for MprisPlayer {
    async fn play(&self) -> Result<(), PlayerError> {
        self.proxy().await?.play().await?;
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        self.proxy().await?.pause().await?;
        Ok(())
    }
}

/// Expand a configured player name to its MPRIS bus name.
fn bus_name_for(name: &str) -> String {
    if name.starts_with(MPRIS_PREFIX) {
        name.to_string()
    } else {
        format!("{MPRIS_PREFIX}{name}")
    }
}

/// First MPRIS bus name in lexical order.
fn pick_mpris_name(names: &[String]) -> Option<String> {
    names
        .iter()
        .filter(|n| n.starts_with(MPRIS_PREFIX))
        .min()
        .cloned()
}
