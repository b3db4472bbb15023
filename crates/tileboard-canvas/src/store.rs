//! Pixel grid, snapshot, and subscriber registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Rejected pixel writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("color {color} is outside the palette of {palette} colors")]
    InvalidColor { color: i64, palette: u16 },
}

/// Token posted to every subscriber whenever a write call returns.
///
/// Carries no payload: subscribers pull their own [`CanvasStore::snapshot`].
#[derive(Debug, Clone, Copy)]
pub struct CanvasChanged;

/// Identifies one subscription in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    /// Row-major, one byte per cell.
    cells: Vec<u8>,
    subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<CanvasChanged>>,
    next_id: u64,
}

/// The shared canvas: a fixed-size grid of palette colors plus the
/// registry of sessions to notify on mutation.
///
/// Grid mutation, snapshot, and registry changes all go through one
/// mutex; the lock is never held across an await point, and fan-out is a
/// non-blocking channel send, so subscriber sinks must never call back
/// into the store.
pub struct CanvasStore {
    width: u32,
    height: u32,
    palette: u16,
    inner: Mutex<Inner>,
}

impl CanvasStore {
    /// Allocate the grid, filling every cell with `default_color`.
    /// Called once at startup; dimensions are fixed for the process.
    pub fn new(width: u32, height: u32, default_color: u8, palette: u16) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert!(palette as usize <= 256);
        Self {
            width,
            height,
            palette,
            inner: Mutex::new(Inner {
                cells: vec![default_color; width as usize * height as usize],
                subscribers: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Validate and apply a single-pixel write, then notify every
    /// subscriber that the write call returned.
    ///
    /// A rejected write mutates nothing but still fans out — subscribers
    /// are re-sent the unchanged canvas. Each subscription sees tokens in
    /// the order writes were committed; no order is guaranteed across
    /// different subscriptions.
    pub fn write_pixel(&self, x: i64, y: i64, color: i64) -> Result<(), CanvasError> {
        let checked = self
            .cell_index(x, y)
            .and_then(|index| Ok((index, self.check_color(color)?)));

        let mut inner = self.inner.lock();
        if let Ok((index, color)) = checked {
            inner.cells[index] = color;
        }
        inner
            .subscribers
            .retain(|_, tx| tx.send(CanvasChanged).is_ok());

        checked.map(|_| ())
    }

    /// A consistent copy of the whole grid, row-major, one byte per cell.
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.lock().cells.clone()
    }

    /// Register a notification sink for this canvas. The subscription
    /// unsubscribes itself when dropped.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.insert(id, tx);
        debug!(?id, subscribers = inner.subscribers.len(), "subscribed");
        Subscription {
            id,
            store: Arc::clone(self),
            rx,
        }
    }

    /// Remove a subscription. Idempotent: removing an unknown or
    /// already-removed id is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock();
        if inner.subscribers.remove(&id).is_some() {
            debug!(?id, subscribers = inner.subscribers.len(), "unsubscribed");
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    fn cell_index(&self, x: i64, y: i64) -> Result<usize, CanvasError> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    fn check_color(&self, color: i64) -> Result<u8, CanvasError> {
        if color < 0 || color >= i64::from(self.palette) {
            return Err(CanvasError::InvalidColor {
                color,
                palette: self.palette,
            });
        }
        Ok(color as u8)
    }
}

/// A live registration against a [`CanvasStore`]. Owned by exactly one
/// session; dropping it unsubscribes, so release is guaranteed on every
/// exit path.
pub struct Subscription {
    id: SubscriptionId,
    store: Arc<CanvasStore>,
    rx: mpsc::UnboundedReceiver<CanvasChanged>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The next change notification. Returns `None` once the sender side
    /// is gone, which only happens after this subscription was removed
    /// from the registry.
    pub async fn changed(&mut self) -> Option<CanvasChanged> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.unsubscribe(self.id);
    }
}
