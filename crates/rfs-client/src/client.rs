//! The generic client: slot dispatch, connection lifecycle, watch hosting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use rfs_core::{
    Capability, ClientError, ClientIdentity, ConnectionParams, DirEntry, FileMeta, PoolConfig,
    WatchConfig, path,
};
use rfs_pool::{IdleTimers, ReleaseMode, SlotControl, SlotQueue};
use rfs_watcher::{DiffScanner, DirLister, WatchEvent, default_ignore};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::stream::ReadStream;

/// Buffered watch events before the scan loop backpressures.
const EVENT_BUFFER: usize = 64;

/// Signals the watch loop to wind down.
#[derive(Debug, Default)]
struct WatchStop {
    stopped: AtomicBool,
    notify: Notify,
}

impl WatchStop {
    fn signal(&self) {
        self.stopped.store(true, Ordering::Release);
        // notify_one stores a permit, so a signal landing while the
        // loop is mid-scan still wakes the very next wait.
        self.notify.notify_one();
    }

    fn is_signalled(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// One running watch loop.
struct ActiveWatch {
    stop: Arc<WatchStop>,
    handle: JoinHandle<()>,
}

/// A protocol-agnostic client over one backend endpoint.
///
/// Every operation is dispatched onto one of `parallel` connection
/// slots: the dispatcher cancels the slot's idle-disconnect timer,
/// connects lazily (the backend's `connect` is idempotent), runs the
/// operation, and re-arms the timer. Submissions beyond the limit
/// queue FIFO. A connection-level failure tears the slot down so the
/// next task dispatched onto it reconnects from scratch.
///
/// Clients are handed out as `Arc` by the
/// [`ClientRegistry`](crate::ClientRegistry) so concurrent users of
/// the same endpoint share one pool. A running watch holds a clone of
/// that `Arc`; call [`stop_watch`](Self::stop_watch) before expecting
/// the client to drop.
pub struct RemoteClient {
    backend: Arc<dyn Backend>,
    identity: ClientIdentity,
    queue: SlotQueue,
    timers: Arc<IdleTimers>,
    watch_config: Mutex<WatchConfig>,
    scanner: Arc<DiffScanner>,
    watch: Mutex<Option<ActiveWatch>>,
}

impl RemoteClient {
    /// Creates a client over `backend` with the tuning in `params`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        identity: ClientIdentity,
        params: &ConnectionParams,
    ) -> Arc<Self> {
        info!(
            protocol = backend.protocol(),
            identity = identity.as_str(),
            parallel = params.pool.parallel,
            "creating client"
        );
        Arc::new(Self {
            backend,
            identity,
            queue: SlotQueue::new(params.pool.parallel),
            timers: Arc::new(IdleTimers::new(Duration::from_millis(
                params.pool.idle_timeout_ms,
            ))),
            watch_config: Mutex::new(params.watch),
            scanner: Arc::new(DiffScanner::new()),
            watch: Mutex::new(None),
        })
    }

    /// Canonical identity of the endpoint this client serves.
    #[must_use]
    pub fn id(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Protocol name of the wrapped backend.
    #[must_use]
    pub fn protocol(&self) -> &str {
        self.backend.protocol()
    }

    /// Returns `true` when the backend overrides `capability`.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.backend.supports(capability)
    }

    /// Current concurrency limit.
    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.queue.size()
    }

    /// Applies new tuning to a live client.
    ///
    /// The concurrency limit changes immediately for future dispatch
    /// (nothing in flight is aborted), the idle window applies to
    /// timers armed from now on, and the watch settings apply to the
    /// next [`start_watch`](Self::start_watch).
    pub fn update_settings(&self, pool: PoolConfig, watch: WatchConfig) {
        debug!(
            identity = self.identity.as_str(),
            parallel = pool.parallel,
            idle_timeout_ms = pool.idle_timeout_ms,
            "updating client settings"
        );
        self.queue.set_size(pool.parallel);
        self.timers
            .set_delay(Duration::from_millis(pool.idle_timeout_ms));
        *self.watch_config.lock() = watch;
    }

    fn require(&self, capability: Capability) -> Result<(), ClientError> {
        if self.backend.supports(capability) {
            Ok(())
        } else {
            Err(ClientError::not_implemented(
                self.backend.protocol(),
                capability,
            ))
        }
    }

    /// Runs `op` on the next free slot with the connection up.
    async fn dispatch<T, F, Fut>(&self, mode: ReleaseMode, op: F) -> Result<T, ClientError>
    where
        F: FnOnce(usize, SlotControl) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        self.queue
            .run(mode, |slot, control| async move {
                self.timers.cancel(slot);
                if let Err(err) = self.backend.connect(slot).await {
                    warn!(slot, error = %err, "connect failed");
                    self.teardown(slot).await;
                    return Err(err);
                }
                let result = op(slot, control.clone()).await;
                let clear = result
                    .as_ref()
                    .err()
                    .is_some_and(ClientError::is_connection_error);
                if clear {
                    // The slot is still held here, so the teardown
                    // cannot race a successor's fresh connection.
                    self.teardown(slot).await;
                } else {
                    self.arm_idle(slot, &control);
                }
                result
            })
            .await
    }

    /// Tears down a slot's connection after a connection-level failure.
    async fn teardown(&self, slot: usize) {
        if let Err(err) = self.backend.disconnect(slot).await {
            debug!(slot, error = %err, "teardown after failure also failed");
        }
    }

    /// Arms the idle-disconnect timer for a finished slot. Arming is
    /// deferred past release when the task retained the slot.
    fn arm_idle(&self, slot: usize, control: &SlotControl) {
        let backend = Arc::clone(&self.backend);
        let timers = Arc::clone(&self.timers);
        let arm = move || {
            timers.arm(slot, move || async move {
                debug!(slot, "idle window elapsed, disconnecting");
                if let Err(err) = backend.disconnect(slot).await {
                    warn!(slot, error = %err, "idle disconnect failed");
                }
            });
        };
        if control.is_retained() {
            let control = control.clone();
            tokio::spawn(async move {
                control.released().await;
                arm();
            });
        } else {
            arm();
        }
    }

    /// Lists the immediate entries of `dir`.
    pub async fn list_dir(&self, dir: &str) -> Result<Vec<DirEntry>, ClientError> {
        self.require(Capability::List)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.list_dir(slot, dir).await
        })
        .await
    }

    /// Returns metadata for `path`.
    pub async fn stat(&self, p: &str) -> Result<FileMeta, ClientError> {
        self.require(Capability::Stat)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.stat(slot, p).await
        })
        .await
    }

    /// Reads the full contents of `path`.
    pub async fn read(&self, p: &str) -> Result<Vec<u8>, ClientError> {
        self.require(Capability::Read)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.read(slot, p).await
        })
        .await
    }

    /// Reads `path` and decodes it as UTF-8 text.
    pub async fn read_to_string(&self, p: &str) -> Result<String, ClientError> {
        let bytes = self.read(p).await?;
        String::from_utf8(bytes).map_err(|_| ClientError::NonUtf8Contents(p.to_owned()))
    }

    /// Writes `contents` to `path`, replacing any existing file.
    pub async fn write(&self, p: &str, contents: &[u8]) -> Result<(), ClientError> {
        self.require(Capability::Write)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.write(slot, p, contents).await
        })
        .await
    }

    /// Writes a live stream to `dest`, returning bytes written.
    ///
    /// The source side of a copy is always a stream (typically from
    /// [`read_stream`](Self::read_stream), possibly on a different
    /// client); copying between two at-rest paths is not an operation
    /// any backend implements. When the source stream comes from this
    /// same client, its slot stays busy until the stream drains, so
    /// the pool must have room for both sides.
    pub async fn copy(&self, source: ReadStream, dest: &str) -> Result<u64, ClientError> {
        self.require(Capability::Copy)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.copy(slot, Box::pin(source), dest).await
        })
        .await
    }

    /// Creates `dir`, transparently creating missing ancestors.
    ///
    /// An existing directory is silent success; an existing file at
    /// the path is [`ClientError::NotADirectory`]. The backend only
    /// ever creates one level; when it signals
    /// [`ClientError::MissingParent`], the client walks up, creates
    /// the ancestors oldest-first, and retries, all on one slot.
    pub async fn mkdir(&self, dir: &str) -> Result<(), ClientError> {
        self.require(Capability::Mkdir)?;
        let target = path::normalize(dir);
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            if self.supports(Capability::Stat) {
                match self.backend.stat(slot, &target).await {
                    Ok(meta) if meta.is_dir() => return Ok(()),
                    Ok(_) => return Err(ClientError::NotADirectory(target)),
                    Err(ClientError::NotFound(_)) => {}
                    Err(err) if err.is_connection_error() => return Err(err),
                    Err(err) => {
                        debug!(dir = %target, error = %err, "pre-mkdir stat inconclusive");
                    }
                }
            }
            let mut todo = vec![target];
            while let Some(current) = todo.pop() {
                match self.backend.mkdir(slot, &current).await {
                    Ok(()) => {}
                    Err(err) if err.is_missing_parent() => {
                        let parent = path::parent(&current).to_owned();
                        if path::is_bare_root(&parent) || parent == current {
                            return Err(err);
                        }
                        todo.push(current);
                        todo.push(parent);
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        })
        .await
    }

    /// Moves `from` to `to`.
    pub async fn rename(&self, from: &str, to: &str) -> Result<(), ClientError> {
        self.require(Capability::Move)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.rename(slot, from, to).await
        })
        .await
    }

    /// Removes the file or empty directory at `path`.
    pub async fn remove(&self, p: &str) -> Result<(), ClientError> {
        self.require(Capability::Remove)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.remove(slot, p).await
        })
        .await
    }

    /// Creates a hard link at `link` pointing to `target`.
    pub async fn hard_link(&self, target: &str, link: &str) -> Result<(), ClientError> {
        self.require(Capability::Link)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.hard_link(slot, target, link).await
        })
        .await
    }

    /// Creates a symbolic link at `link` pointing to `target`.
    pub async fn symlink(&self, target: &str, link: &str) -> Result<(), ClientError> {
        self.require(Capability::Symlink)?;
        self.dispatch(ReleaseMode::OnCompletion, |slot, _control| async move {
            self.backend.symlink(slot, target, link).await
        })
        .await
    }

    /// Opens `path` for chunked reading.
    ///
    /// The returned stream keeps its slot busy until fully consumed or
    /// dropped; the idle-disconnect timer for that slot only starts
    /// once the stream finishes.
    pub async fn read_stream(&self, p: &str) -> Result<ReadStream, ClientError> {
        self.require(Capability::ReadStream)?;
        self.dispatch(ReleaseMode::Explicit, |slot, control| async move {
            let inner = self.backend.read_stream(slot, p).await?;
            control.retain();
            Ok(ReadStream::new(inner, control))
        })
        .await
    }

    /// Starts watching `root`, streaming [`WatchEvent`]s to the
    /// returned receiver.
    ///
    /// With polling enabled the tree is rescanned at the configured
    /// interval until [`stop_watch`](Self::stop_watch); without it a
    /// single scan runs and the watch ends on its own. A cycle-fatal
    /// scan failure also ends the watch; no further passes are
    /// scheduled after one. While a watch is running, starting
    /// another fails without disturbing it. After a watch ends on its
    /// own the file records are kept, so the next watch only reports
    /// changes since the last scan. `ignore` defaults to skipping
    /// dotfiles and dot-directories.
    pub fn start_watch(
        self: &Arc<Self>,
        root: &str,
        ignore: Option<Regex>,
    ) -> Result<mpsc::Receiver<WatchEvent>, ClientError> {
        self.require(Capability::List)?;
        let mut watch = self.watch.lock();
        if watch.as_ref().is_some_and(|active| !active.handle.is_finished()) {
            return Err(ClientError::backend(
                self.backend.protocol(),
                "watch already active",
            ));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let stop = Arc::new(WatchStop::default());
        let client = Arc::clone(self);
        let root = root.to_owned();
        let ignored = ignore.unwrap_or_else(|| default_ignore().clone());
        let interval = self.watch_config.lock().interval();

        info!(
            identity = self.identity.as_str(),
            root = %root,
            polling = interval.is_some(),
            "starting watch"
        );
        let loop_stop = Arc::clone(&stop);
        let handle = tokio::spawn(async move {
            let _ = tx.send(WatchEvent::Started).await;
            loop {
                if loop_stop.is_signalled() {
                    break;
                }
                match client.scanner.scan(&*client, &root, &ignored, &tx).await {
                    Ok(summary) => {
                        debug!(cycle = %summary.cycle, added = summary.added, removed = summary.removed, "watch pass");
                        let _ = tx.send(WatchEvent::Completed).await;
                    }
                    Err(err) => {
                        // cycle-fatal: report and stop scheduling passes
                        warn!(root = %root, error = %err, "watch pass failed");
                        let _ = tx.send(WatchEvent::scan_error(err.to_string())).await;
                        break;
                    }
                }
                let Some(delay) = interval else { break };
                tokio::select! {
                    () = loop_stop.notify.notified() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
            let _ = tx.send(WatchEvent::Stopped).await;
        });

        *watch = Some(ActiveWatch { stop, handle });
        Ok(rx)
    }

    /// Stops the running watch, if any, and forgets the file records,
    /// so the next watch re-reports the full tree.
    ///
    /// A scan pass already in flight finishes on its own; the loop
    /// winds down instead of starting another.
    pub fn stop_watch(&self) {
        self.halt_watch();
        self.scanner.clear();
    }

    /// Returns `true` while a watch loop is running.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watch
            .lock()
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Signals the watch loop without touching the file records.
    fn halt_watch(&self) {
        if let Some(active) = self.watch.lock().take() {
            active.stop.signal();
        }
    }

    /// Cancels all idle timers and closes every slot's connection.
    pub async fn disconnect_all(&self) {
        self.timers.cancel_all();
        for slot in 0..self.queue.size() {
            if let Err(err) = self.backend.disconnect(slot).await {
                debug!(slot, error = %err, "disconnect failed");
            }
        }
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("protocol", &self.backend.protocol())
            .field("identity", &self.identity)
            .field("parallel", &self.queue.size())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DirLister for RemoteClient {
    async fn list_dir(&self, dir: &str) -> Result<Vec<DirEntry>, ClientError> {
        RemoteClient::list_dir(self, dir).await
    }
}
