//! Dedicated processing thread
//!
//! One thread owns the `Session`; everything else talks to it through a
//! command channel. After each frame tick (and after start/recalibrate) the
//! thread publishes a fresh `Snapshot` by swapping an `Arc` behind a lock, so
//! readers always see a whole frame and never block the writer for long.
//! Game events are forwarded on a second, bounded channel; when nobody drains
//! it, events past its capacity are dropped.
//!
//! Time-dependent commands carry the time they were sent, so a thread that
//! falls behind the stream still sees frame times in stream order.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::game::GameEvent;
use crate::session::Session;
use crate::snapshot::Snapshot;
use crate::tracker::BodyId;

/// Messages accepted by the processing thread
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// One body's pose, orientation in the configured raw layout
    Pose {
        id: BodyId,
        position: [f64; 3],
        orientation: [f64; 4],
    },
    /// All poses for the current stream frame have been sent, at `now`
    FrameTick { now: f64 },
    /// User start input at `now`
    StartRound { now: f64 },
    /// Drop calibration and re-capture reference poses
    Recalibrate { now: f64 },
    /// Stop the thread
    Shutdown,
}

/// Events buffered for the owner before new ones are dropped
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Session time source, in seconds; read by whoever sends a command
pub type Clock = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Clock counting seconds since it was created
pub fn monotonic_clock() -> Clock {
    let start = Instant::now();
    Arc::new(move || start.elapsed().as_secs_f64())
}

/// Cloneable producer end for the pose-stream adapter
#[derive(Clone)]
pub struct StreamSink {
    tx: Sender<Command>,
    clock: Clock,
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink").finish_non_exhaustive()
    }
}

impl StreamSink {
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::EngineStopped)
    }

    /// Current time on the session clock
    pub fn now(&self) -> f64 {
        (self.clock)()
    }

    /// Forward one rigid-body update
    pub fn pose(&self, id: BodyId, position: [f64; 3], orientation: [f64; 4]) -> Result<()> {
        self.send(Command::Pose {
            id,
            position,
            orientation,
        })
    }

    /// Mark the end of a stream frame, stamped with the session clock
    pub fn frame_tick(&self) -> Result<()> {
        self.frame_tick_at(self.now())
    }

    /// Mark the end of a stream frame captured at `now`
    pub fn frame_tick_at(&self, now: f64) -> Result<()> {
        self.send(Command::FrameTick { now })
    }
}

/// Spawns the processing thread
pub struct Engine;

impl Engine {
    /// Start a session on its own thread using wall-clock time
    pub fn spawn(config: Config, seed: u64) -> Result<EngineHandle> {
        Self::spawn_with_clock(config, seed, monotonic_clock())
    }

    /// Start a session on its own thread with a custom time source
    pub fn spawn_with_clock(config: Config, seed: u64, clock: Clock) -> Result<EngineHandle> {
        let mut session = Session::new(config, seed)?;
        let started = clock();
        let snapshot = Arc::new(RwLock::new(Arc::new(session.snapshot(started))));
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::sync_channel::<GameEvent>(EVENT_QUEUE_CAPACITY);

        let published = Arc::clone(&snapshot);
        let thread = thread::Builder::new()
            .name("goal-chase-core".into())
            .spawn(move || {
                run(&mut session, command_rx, event_tx, published);
            })
            .map_err(Error::Spawn)?;

        log::info!("Engine started");
        Ok(EngineHandle {
            sink: StreamSink {
                tx: command_tx,
                clock,
            },
            events: event_rx,
            snapshot,
            thread: Some(thread),
        })
    }
}

fn run(
    session: &mut Session,
    commands: Receiver<Command>,
    events: SyncSender<GameEvent>,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
) {
    let publish = |session: &Session, now: f64| {
        *snapshot.write() = Arc::new(session.snapshot(now));
    };
    let forward = |batch: Vec<GameEvent>| {
        for event in batch {
            match events.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    log::trace!("Event queue full, dropping {:?}", event);
                }
                // Handle dropped
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    };

    for command in commands {
        match command {
            Command::Pose {
                id,
                position,
                orientation,
            } => session.on_raw_pose_update(id, position, orientation),
            Command::FrameTick { now } => {
                forward(session.on_frame_tick(now));
                publish(&*session, now);
            }
            Command::StartRound { now } => {
                forward(vec![session.start_round(now)]);
                publish(&*session, now);
            }
            Command::Recalibrate { now } => {
                forward(session.recalibrate().into_iter().collect());
                publish(&*session, now);
            }
            Command::Shutdown => break,
        }
    }
    log::info!("Engine stopped");
}

/// Owner's handle to a running engine; dropping it stops the thread
pub struct EngineHandle {
    sink: StreamSink,
    events: Receiver<GameEvent>,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Producer end to hand to the stream adapter
    pub fn sink(&self) -> StreamSink {
        self.sink.clone()
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.sink.send(command)
    }

    /// Start input, stamped with the session clock
    pub fn start_round(&self) -> Result<()> {
        self.start_round_at(self.sink.now())
    }

    pub fn start_round_at(&self, now: f64) -> Result<()> {
        self.send(Command::StartRound { now })
    }

    pub fn recalibrate(&self) -> Result<()> {
        self.send(Command::Recalibrate {
            now: self.sink.now(),
        })
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Events published so far, without blocking
    ///
    /// At most `EVENT_QUEUE_CAPACITY` are buffered between drains.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.events.try_iter().collect()
    }

    /// Blocking access to the event stream
    pub fn events(&self) -> &Receiver<GameEvent> {
        &self.events
    }

    /// Stop the thread and wait for it, returning the last snapshot
    pub fn shutdown(mut self) -> Arc<Snapshot> {
        self.stop();
        self.snapshot()
    }

    fn stop(&mut self) {
        let _ = self.sink.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
