// Blocking inference that notices when its caller has gone away.
//
// Dropping a future that awaits spawn_blocking does not stop the blocking
// closure. Jobs started here get a handle that reports whether anyone is
// still waiting, so they can skip work nobody will read.

use anyhow::{Context, Result};
use tokio::sync::oneshot;

/// Held by a blocking job; tells it whether the awaiting caller still exists.
pub struct Caller(oneshot::Sender<()>);

impl Caller {
    /// True once the future awaiting this job has been dropped.
    pub fn is_gone(&self) -> bool {
        self.0.is_closed()
    }
}

/// Run `job` on the blocking pool and wait for it.
///
/// If this future is dropped (a timeout, a disconnected client) the job
/// keeps running, but `Caller::is_gone` turns true.
pub async fn spawn_abandonable<T, F>(job: F) -> Result<T>
where
    F: FnOnce(&Caller) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::task::spawn_blocking(move || job(&Caller(tx)));

    // Lives in this future's state; dropping the future closes the channel
    let _waiting = rx;
    handle.await.context("Blocking inference task panicked")?
}
