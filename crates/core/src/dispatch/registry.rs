use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct TrackedChild {
    pid: Option<u32>,
    path: PathBuf,
    kill: CancellationToken,
}

/// Live external processes spawned by the dispatcher.
///
/// Each entry carries a kill token watched by the task that owns the child
/// handle; [`terminate_all`](Self::terminate_all) fires every token.
#[derive(Debug, Default)]
pub struct ChildRegistry {
    live: DashMap<u64, TrackedChild>,
    next_key: AtomicU64,
}

impl ChildRegistry {
    pub fn register(
        self: &Arc<Self>,
        pid: Option<u32>,
        path: &Path,
        parent: &CancellationToken,
    ) -> Registration {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let kill = parent.child_token();
        self.live.insert(
            key,
            TrackedChild {
                pid,
                path: path.to_path_buf(),
                kill: kill.clone(),
            },
        );
        Registration {
            registry: Arc::clone(self),
            key,
            pid,
            kill,
        }
    }

    pub fn snapshot(&self) -> Vec<(Option<u32>, PathBuf)> {
        self.live
            .iter()
            .map(|entry| (entry.pid, entry.path.clone()))
            .collect()
    }

    /// Signals every live child to be killed; returns how many were signalled.
    pub fn terminate_all(&self) -> usize {
        let mut signalled = 0;
        for entry in self.live.iter() {
            entry.kill.cancel();
            signalled += 1;
        }
        signalled
    }
}

/// Removes its entry from the registry when dropped.
pub struct Registration {
    registry: Arc<ChildRegistry>,
    key: u64,
    pid: Option<u32>,
    kill: CancellationToken,
}

impl Registration {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn kill_token(&self) -> CancellationToken {
        self.kill.clone()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.live.remove(&self.key);
    }
}
