use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::memory::write_json_atomic;

pub const OFFLINE_FILE: &str = "offline.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineState {
    pub offline: bool,
    pub manual_override: bool,
}

/// Offline flag shared by every resolution.
///
/// Two writers: an explicit toggle, which latches `manual_override`, and the
/// network-status listener, which is ignored while the latch is set.
pub struct OfflineMode {
    offline: AtomicBool,
    manual_override: AtomicBool,
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl OfflineMode {
    pub fn in_memory() -> Self {
        Self::with_state(OfflineState::default(), None)
    }

    fn with_state(state: OfflineState, path: Option<PathBuf>) -> Self {
        Self {
            offline: AtomicBool::new(state.offline),
            manual_override: AtomicBool::new(state.manual_override),
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Load persisted state from `path`, starting online when there is none.
    pub async fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<OfflineState>(&content).unwrap_or_else(|e| {
                warn!("Failed to parse offline state {}: {}", path.display(), e);
                OfflineState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => OfflineState::default(),
            Err(e) => {
                warn!("Failed to read offline state {}: {}", path.display(), e);
                OfflineState::default()
            }
        };

        if state.offline {
            info!("Starting in offline mode (manual override: {})", state.manual_override);
        }
        Self::with_state(state, Some(path))
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    pub fn is_manual(&self) -> bool {
        self.manual_override.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> OfflineState {
        OfflineState {
            offline: self.is_offline(),
            manual_override: self.is_manual(),
        }
    }

    /// Explicit toggle. Latches the manual override.
    pub async fn set_manual(&self, offline: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.offline.store(offline, Ordering::Relaxed);
        self.manual_override.store(true, Ordering::Relaxed);
        info!("Offline mode set manually: {}", offline);
        self.persist().await
    }

    /// Release the manual latch so network-status updates apply again.
    pub async fn clear_manual(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.manual_override.store(false, Ordering::Relaxed);
        info!("Offline mode returned to automatic");
        self.persist().await
    }

    /// Network-status listener. Returns whether the update was applied.
    pub async fn on_network_status(&self, online: bool) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.is_manual() {
            return Ok(false);
        }

        let was_offline = self.offline.swap(!online, Ordering::Relaxed);
        if was_offline == online {
            info!("Network is {}, offline mode {}", if online { "up" } else { "down" }, !online);
            self.persist().await?;
        }
        Ok(true)
    }

    async fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.state()).await,
            None => Ok(()),
        }
    }
}
