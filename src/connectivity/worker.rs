//! Background connection generation
//!
//! Slow generators (kernels over large layouts, scripts) run on a
//! dedicated thread. The UI thread submits [`GenerationJob`]s and drains
//! [`GenerationEvent`]s once per frame; the generated list itself is
//! exchanged through the job's [`ExplicitConnections`] lock, never through
//! the channel.
//!
//! Jobs are not deduplicated. A job whose list is already current when it
//! reaches the front of the queue finds the changed flag cleared and
//! reports [`GenerationEvent::Unchanged`].

use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use glam::Vec3;

use crate::connectivity::generator::ExplicitConnections;
use crate::error::{Result, SpikeVizError};
use crate::model::EntityId;

/// Channel capacity for events (worker → UI)
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Regenerate one connection's list against copies of its layouts
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub connection: EntityId,
    pub connections: ExplicitConnections,
    pub src_layout: Vec<Vec3>,
    pub dst_layout: Vec<Vec3>,
}

/// Outcome reported back to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// The list was replaced; cached geometry for the connection is stale
    Completed { connection: EntityId, version: u64 },
    /// The list was already current
    Unchanged { connection: EntityId },
    /// The generator failed; the previous list is still in place
    Failed { connection: EntityId, error: String },
}

impl GenerationEvent {
    pub fn connection(&self) -> EntityId {
        match self {
            GenerationEvent::Completed { connection, .. }
            | GenerationEvent::Unchanged { connection }
            | GenerationEvent::Failed { connection, .. } => *connection,
        }
    }
}

enum WorkerCommand {
    Generate(GenerationJob),
    Shutdown,
}

/// Handle to the generation thread
pub struct GenerationWorker {
    job_tx: Sender<WorkerCommand>,
    event_rx: Receiver<GenerationEvent>,
    handle: Option<JoinHandle<()>>,
}

impl GenerationWorker {
    /// Spawn the worker thread with a job queue of `capacity`
    pub fn spawn(capacity: usize) -> Result<Self> {
        let (job_tx, job_rx) = bounded(capacity.max(1));
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("connection-generator".to_string())
            .spawn(move || run(job_rx, event_tx))?;
        Ok(Self {
            job_tx,
            event_rx,
            handle: Some(handle),
        })
    }

    /// Queue a job without blocking
    pub fn submit(&self, job: GenerationJob) -> Result<()> {
        let connection = job.connection;
        match self.job_tx.try_send(WorkerCommand::Generate(job)) {
            Ok(()) => {
                tracing::debug!("Queued regeneration for {}", connection);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SpikeVizError::Channel(format!(
                "generation queue full, dropped job for {}",
                connection
            ))),
            Err(TrySendError::Disconnected(_)) => {
                Err(SpikeVizError::Channel("generation worker stopped".to_string()))
            }
        }
    }

    /// All events produced since the last drain
    pub fn drain(&self) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }

    /// Block until the next event arrives or the worker stops
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<GenerationEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the thread after the queued jobs and wait for it
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.job_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Connection generator thread panicked");
            }
        }
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(job_rx: Receiver<WorkerCommand>, event_tx: Sender<GenerationEvent>) {
    tracing::info!("Connection generator started");
    for cmd in job_rx.iter() {
        let job = match cmd {
            WorkerCommand::Generate(job) => job,
            WorkerCommand::Shutdown => break,
        };
        let event = process(&job);
        match event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => {
                tracing::warn!("Event queue full, dropping {:?}", ev);
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    tracing::info!("Connection generator stopped");
}

fn process(job: &GenerationJob) -> GenerationEvent {
    let mut guard = job.connections.lock();
    match guard.regenerate_if_stale(&job.src_layout, &job.dst_layout) {
        Ok(true) => GenerationEvent::Completed {
            connection: job.connection,
            version: guard.version(),
        },
        Ok(false) => GenerationEvent::Unchanged {
            connection: job.connection,
        },
        Err(e) => {
            tracing::warn!("Generation failed for {}: {}", job.connection, e);
            GenerationEvent::Failed {
                connection: job.connection,
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::generator::ListGenerator;
    use std::time::Duration;

    fn job(connections: &ExplicitConnections) -> GenerationJob {
        GenerationJob {
            connection: EntityId::new(1, 0),
            connections: connections.clone(),
            src_layout: vec![Vec3::ZERO; 2],
            dst_layout: vec![Vec3::ZERO; 2],
        }
    }

    #[test]
    fn test_worker_regenerates_then_reports_unchanged() {
        let worker = GenerationWorker::spawn(8).expect("spawns");
        let list = ExplicitConnections::new(ListGenerator::from_text("0,1\n1,0"));

        worker.submit(job(&list)).expect("queued");
        worker.submit(job(&list)).expect("queued");

        let first = worker.recv_timeout(Duration::from_secs(5)).expect("first event");
        let second = worker.recv_timeout(Duration::from_secs(5)).expect("second event");
        assert_eq!(
            first,
            GenerationEvent::Completed {
                connection: EntityId::new(1, 0),
                version: 1
            }
        );
        assert_eq!(
            second,
            GenerationEvent::Unchanged {
                connection: EntityId::new(1, 0)
            }
        );
        assert_eq!(list.snapshot().0.len(), 2);
        worker.shutdown();
    }

    #[test]
    fn test_worker_reports_failure() {
        let worker = GenerationWorker::spawn(1).expect("spawns");
        let list = ExplicitConnections::new(ListGenerator::from_text("not a link"));
        worker.submit(job(&list)).expect("queued");
        let event = worker.recv_timeout(Duration::from_secs(5)).expect("event");
        assert!(matches!(event, GenerationEvent::Failed { .. }));
        assert_eq!(event.connection(), EntityId::new(1, 0));
        assert!(list.is_stale());
    }
}
