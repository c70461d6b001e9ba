//! Driver plumbing: attach handles and the fire-and-forget event queue.
//!
//! Each driver gets its own bounded queue. The coordinator never stalls for
//! a slow driver: when a queue is full the oldest notification is evicted
//! to make room. A disconnected queue marks the driver dead; it is reaped
//! on the next coordinator pass with no impact on other drivers.

use crate::theme::Theme;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;
use slate_core::GraphId;
use std::fmt;

/// Coordinator-assigned driver identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriverId(pub(crate) u32);

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver-{}", self.0)
    }
}

/// Notifications pushed from the viewport to a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// These scripts changed; re-read them from the registry.
    ScriptsUpdated(Vec<GraphId>),
    ScriptsDeleted(Vec<GraphId>),
    Theme(Theme),
    Resize(f64, f64),
    /// The root scene was replaced; drop cached per-scene state.
    ResetScene,
}

/// What `attach_driver` hands back: the driver consumes `events` on its own
/// thread and reads scripts from the registry on demand.
#[derive(Debug)]
pub struct DriverConn {
    pub id: DriverId,
    pub events: Receiver<DriverEvent>,
}

/// Coordinator-side seat for one attached driver.
#[derive(Debug, Clone)]
pub(crate) struct DriverSeat {
    pub id: DriverId,
    pub name: String,
    tx: Sender<DriverEvent>,
    /// Second receiver on the same queue, used only to evict the oldest
    /// entry when the queue is full.
    evict: Receiver<DriverEvent>,
}

impl DriverSeat {
    pub fn new(id: DriverId, name: &str, capacity: usize) -> (Self, DriverConn) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        let seat = Self {
            id,
            name: name.to_string(),
            tx,
            evict: rx.clone(),
        };
        (seat, DriverConn { id, events: rx })
    }

    /// Fire-and-forget send with oldest-drop. Returns `false` when the
    /// driver side has disconnected.
    pub fn send(&self, event: DriverEvent) -> bool {
        let mut event = event;
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Full(e)) => {
                    warn!("driver {} queue full, dropping oldest notification", self.name);
                    let _ = self.evict.try_recv();
                    event = e;
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!("driver {} disconnected, discarding notification", self.name);
                    return false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_oldest() {
        let (seat, conn) = DriverSeat::new(DriverId(0), "test", 2);
        assert!(seat.send(DriverEvent::Resize(1.0, 1.0)));
        assert!(seat.send(DriverEvent::Resize(2.0, 2.0)));
        assert!(seat.send(DriverEvent::Resize(3.0, 3.0)));

        // Note: the driver's own receiver also drains, so eviction only
        // happens when the driver is genuinely behind.
        let got: Vec<_> = conn.events.try_iter().collect();
        assert_eq!(
            got,
            vec![DriverEvent::Resize(2.0, 2.0), DriverEvent::Resize(3.0, 3.0)]
        );
    }

    #[test]
    fn disconnected_driver_reports_dead() {
        let (seat, conn) = DriverSeat::new(DriverId(1), "gone", 2);
        drop(conn);
        assert!(!seat.send(DriverEvent::ResetScene));
    }
}
