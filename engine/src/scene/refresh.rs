//! Background record refresh.
//!
//! Fetching the record set and building a layer happen on a named worker
//! thread so the frame loop never blocks on I/O. The worker publishes the
//! finished layer first and builds its collision index afterwards, handing
//! the index over through a [`Deferred`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::deferred::{Deferred, deferred};
use super::source::{RecordSource, SourceError};
use crate::physics::SpatialIndex;
use crate::render::{InstanceRef, LayerBuilder, YardLayer, index_from_entries};
use crate::world::RecordRef;

pub enum RefreshCommand {
    Refresh { generation: u64 },
    Shutdown,
}

pub enum RefreshEvent {
    Layer {
        generation: u64,
        layer: YardLayer,
        index: Deferred<SpatialIndex<InstanceRef>>,
    },
    Failed {
        generation: u64,
        error: SourceError,
    },
}

impl RefreshEvent {
    pub fn generation(&self) -> u64 {
        match self {
            RefreshEvent::Layer { generation, .. } | RefreshEvent::Failed { generation, .. } => {
                *generation
            }
        }
    }
}

pub struct RefreshWorker {
    tx_cmd: Sender<RefreshCommand>,
    rx_evt: Receiver<RefreshEvent>,
    alive: Arc<AtomicBool>,
    /// Set while the worker is inside a fetch or a layer build
    busy: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshWorker {
    pub fn spawn(
        source: Box<dyn RecordSource>,
        builder: LayerBuilder,
        index_cell_size: f32,
    ) -> io::Result<Self> {
        let (tx_cmd, rx_cmd) = mpsc::channel::<RefreshCommand>();
        let (tx_evt, rx_evt) = mpsc::channel::<RefreshEvent>();
        let alive = Arc::new(AtomicBool::new(true));
        let busy = Arc::new(AtomicBool::new(false));

        let flags = WorkerFlags {
            alive: Arc::clone(&alive),
            busy: Arc::clone(&busy),
        };
        let thread = thread::Builder::new()
            .name("yard-refresh-worker".to_string())
            .spawn(move || worker_loop(source, builder, index_cell_size, rx_cmd, tx_evt, flags))?;

        Ok(Self {
            tx_cmd,
            rx_evt,
            alive,
            busy,
            thread: Some(thread),
        })
    }

    /// Ask for a fresh layer tagged `generation`. False once the worker is gone.
    pub fn request(&self, generation: u64) -> bool {
        self.tx_cmd.send(RefreshCommand::Refresh { generation }).is_ok()
    }

    pub fn try_recv(&self) -> Option<RefreshEvent> {
        self.rx_evt.try_recv().ok()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Drop for RefreshWorker {
    /// An idle worker is joined. A worker stuck in a slow fetch is detached
    /// instead: it sees the cleared liveness flag afterwards, publishes
    /// nothing and exits on its own.
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        let _ = self.tx_cmd.send(RefreshCommand::Shutdown);
        let Some(thread) = self.thread.take() else {
            return;
        };
        if self.busy.load(Ordering::SeqCst) {
            log::debug!("Refresh worker busy at shutdown, detaching");
            return;
        }
        if thread.join().is_err() {
            log::warn!("Refresh worker panicked during shutdown");
        }
    }
}

struct WorkerFlags {
    alive: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
}

fn worker_loop(
    source: Box<dyn RecordSource>,
    builder: LayerBuilder,
    index_cell_size: f32,
    rx_cmd: Receiver<RefreshCommand>,
    tx_evt: Sender<RefreshEvent>,
    flags: WorkerFlags,
) {
    let WorkerFlags { alive, busy } = flags;
    while let Ok(cmd) = rx_cmd.recv() {
        let mut generation = match cmd {
            RefreshCommand::Refresh { generation } => generation,
            RefreshCommand::Shutdown => break,
        };

        // Requests that piled up while we were busy collapse into the newest
        let mut shutdown = false;
        while let Ok(next) = rx_cmd.try_recv() {
            match next {
                RefreshCommand::Refresh { generation: g } => generation = generation.max(g),
                RefreshCommand::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }
        if shutdown {
            break;
        }

        // Marked busy before the liveness check, so a concurrent drop either
        // sees busy and detaches or this loop sees the shutdown
        busy.store(true, Ordering::SeqCst);
        if !alive.load(Ordering::SeqCst) {
            break;
        }
        let records = match source.fetch() {
            Ok(records) => records,
            Err(error) => {
                busy.store(false, Ordering::SeqCst);
                log::warn!("Refresh {} from {} failed: {}", generation, source.describe(), error);
                if alive.load(Ordering::Acquire) {
                    let _ = tx_evt.send(RefreshEvent::Failed { generation, error });
                }
                continue;
            }
        };

        let records: Vec<RecordRef> = records.into_iter().map(RecordRef::new).collect();
        let layer = builder.build(&records, generation);
        let entries = layer.collision_entries();
        busy.store(false, Ordering::SeqCst);

        if !alive.load(Ordering::Acquire) {
            break;
        }
        let (resolver, index) = deferred();
        if tx_evt
            .send(RefreshEvent::Layer {
                generation,
                layer,
                index,
            })
            .is_err()
        {
            break;
        }

        // The scene may already have moved on to a newer layer; that is fine
        resolver.resolve(index_from_entries(entries, index_cell_size));
    }
}
