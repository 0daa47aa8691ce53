use crate::domain::payment::PaymentRecord;
use crate::error::PaymentError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, Mutex};

pub const PRIMARY_QUEUE_CAPACITY: usize = 10_000;
pub const RETRY_QUEUE_CAPACITY: usize = 1_000;

/// Bounded FIFO hand-off of owned payment records.
///
/// Producers never wait: a full queue rejects the record. Closing drops the
/// only sender, so consumers still drain what is buffered and then observe
/// `None`.
#[derive(Clone)]
pub struct PaymentQueue {
    name: &'static str,
    capacity: usize,
    // counted outside the channel so buffered records stay visible after close
    depth: Arc<AtomicUsize>,
    tx: Arc<RwLock<Option<mpsc::Sender<PaymentRecord>>>>,
    rx: Arc<Mutex<mpsc::Receiver<PaymentRecord>>>,
}

impl PaymentQueue {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            name,
            capacity: capacity.max(1),
            depth: Arc::new(AtomicUsize::new(0)),
            tx: Arc::new(RwLock::new(Some(tx))),
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn try_enqueue(&self, record: PaymentRecord) -> Result<(), PaymentError> {
        let guard = self.tx.read().unwrap_or_else(|e| e.into_inner());
        let Some(tx) = guard.as_ref() else {
            return Err(PaymentError::QueueClosed(self.name));
        };

        self.depth.fetch_add(1, Ordering::SeqCst);
        let sent = tx.try_send(record);
        if sent.is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }

        match sent {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(record)) => {
                tracing::warn!(
                    "{} queue is full, dropping payment {}",
                    self.name,
                    record.correlation_id
                );
                Err(PaymentError::QueueFull(self.name))
            }
            Err(TrySendError::Closed(_)) => Err(PaymentError::QueueClosed(self.name)),
        }
    }

    /// Waits for the next record. Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<PaymentRecord> {
        let record = self.rx.lock().await.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(record)
    }

    pub async fn try_dequeue(&self) -> Option<PaymentRecord> {
        match self.rx.lock().await.try_recv() {
            Ok(record) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                Some(record)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Records buffered and not yet taken by a consumer, including after close.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn close(&self) {
        let mut guard = self.tx.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            tracing::info!("{} queue closed", self.name);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.read().unwrap_or_else(|e| e.into_inner()).is_none()
    }
}

/// The primary work queue and the delayed-retry queue, created once per process.
#[derive(Clone)]
pub struct PaymentQueues {
    pub primary: PaymentQueue,
    pub retry: PaymentQueue,
}

impl PaymentQueues {
    pub fn new(primary_capacity: usize, retry_capacity: usize) -> Self {
        Self {
            primary: PaymentQueue::new("payment", primary_capacity),
            retry: PaymentQueue::new("retry", retry_capacity),
        }
    }

    pub fn close(&self) {
        self.primary.close();
        self.retry.close();
    }
}

impl Default for PaymentQueues {
    fn default() -> Self {
        Self::new(PRIMARY_QUEUE_CAPACITY, RETRY_QUEUE_CAPACITY)
    }
}
