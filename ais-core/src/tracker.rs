//! TTL-bounded vessel tracking with lazy-deletion expiry.
//!
//! Pure logic, no I/O. `record()` folds a decoded `Vessel` into the map and
//! returns `TrackEvent`s for the presentation layer.
//!
//! Every sighting pushes an expiry ticket onto a min-heap keyed by time.
//! Tickets are never removed from the middle of the heap: when one reaches
//! the top and is older than the TTL, the map entry decides whether the
//! vessel really expired or was seen again since (stale ticket).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::types::*;

/// Seconds without a sighting before a vessel is dropped.
pub const DEFAULT_TTL: Timestamp = 20;

// ---------------------------------------------------------------------------
// Track events (output)
// ---------------------------------------------------------------------------

/// Notifications emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackEvent {
    /// First sighting of this MMSI.
    Added {
        mmsi: Mmsi,
        lat: f64,
        lon: f64,
        timestamp: Timestamp,
    },
    /// Latest position for a tracked vessel (also sent right after `Added`).
    Updated {
        mmsi: Mmsi,
        lat: f64,
        lon: f64,
        timestamp: Timestamp,
    },
    /// Vessel not refreshed within the TTL and removed.
    Expired { mmsi: Mmsi, timestamp: Timestamp },
}

impl TrackEvent {
    pub fn mmsi(&self) -> Mmsi {
        match self {
            TrackEvent::Added { mmsi, .. }
            | TrackEvent::Updated { mmsi, .. }
            | TrackEvent::Expired { mmsi, .. } => *mmsi,
        }
    }

    /// Route this event to an observer. `Added` carries no callback of its own;
    /// the `Updated` that follows it delivers the position.
    pub fn dispatch(&self, observer: &mut dyn VesselObserver) {
        match *self {
            TrackEvent::Added { .. } => {}
            TrackEvent::Updated { mmsi, lat, lon, .. } => observer.on_vessel_updated(mmsi, lat, lon),
            TrackEvent::Expired { mmsi, .. } => observer.on_vessel_expired(mmsi),
        }
    }
}

/// Presentation-side sink for tracker notifications.
pub trait VesselObserver {
    fn on_vessel_updated(&mut self, mmsi: Mmsi, lat: f64, lon: f64);
    fn on_vessel_expired(&mut self, mmsi: Mmsi);
}

// ---------------------------------------------------------------------------
// Vessel state
// ---------------------------------------------------------------------------

/// Latest known state of one tracked vessel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedVessel {
    pub mmsi: Mmsi,
    pub lat: f64,
    pub lon: f64,
    pub message_type: u32,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub message_count: u64,
}

impl TrackedVessel {
    fn new(vessel: &Vessel, now: Timestamp) -> Self {
        TrackedVessel {
            mmsi: vessel.mmsi,
            lat: vessel.latitude,
            lon: vessel.longitude,
            message_type: vessel.message_type,
            first_seen: now,
            last_seen: now,
            message_count: 1,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    pub fn age(&self, now: Timestamp) -> Timestamp {
        now.saturating_sub(self.last_seen)
    }
}

/// Pending expiry check for one sighting. Ordered by time, then MMSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ExpiryTicket {
    enqueued_at: Timestamp,
    mmsi: Mmsi,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Currently-visible vessels, bounded by a TTL.
pub struct Tracker {
    ttl: Timestamp,
    positions: HashMap<Mmsi, TrackedVessel>,
    expiry: BinaryHeap<Reverse<ExpiryTicket>>,

    // Counters
    pub total_records: u64,
    pub total_expired: u64,
    pub stale_tickets: u64,
}

impl Tracker {
    pub fn new(ttl: Timestamp) -> Self {
        Tracker {
            ttl,
            positions: HashMap::new(),
            expiry: BinaryHeap::new(),
            total_records: 0,
            total_expired: 0,
            stale_tickets: 0,
        }
    }

    pub fn ttl(&self) -> Timestamp {
        self.ttl
    }

    /// Fold one sighting into the cache, then purge anything that expired.
    pub fn record(&mut self, vessel: &Vessel, now: Timestamp) -> Vec<TrackEvent> {
        self.total_records += 1;
        let mut events = Vec::new();

        match self.positions.get_mut(&vessel.mmsi) {
            Some(tracked) => {
                tracked.lat = vessel.latitude;
                tracked.lon = vessel.longitude;
                tracked.message_type = vessel.message_type;
                // last_seen never moves backwards on a late clock reading
                tracked.last_seen = tracked.last_seen.max(now);
                tracked.message_count += 1;
            }
            None => {
                self.positions
                    .insert(vessel.mmsi, TrackedVessel::new(vessel, now));
                events.push(TrackEvent::Added {
                    mmsi: vessel.mmsi,
                    lat: vessel.latitude,
                    lon: vessel.longitude,
                    timestamp: now,
                });
            }
        }
        events.push(TrackEvent::Updated {
            mmsi: vessel.mmsi,
            lat: vessel.latitude,
            lon: vessel.longitude,
            timestamp: now,
        });

        self.expiry.push(Reverse(ExpiryTicket {
            enqueued_at: now,
            mmsi: vessel.mmsi,
        }));

        events.extend(self.purge(now));
        events
    }

    /// Drop vessels not seen within the TTL. Returns one `Expired` per removal.
    pub fn purge(&mut self, now: Timestamp) -> Vec<TrackEvent> {
        let mut events = Vec::new();
        let Some(cutoff) = now.checked_sub(self.ttl) else {
            // Nothing can be older than the TTL yet
            return events;
        };

        while let Some(Reverse(top)) = self.expiry.peek() {
            if top.enqueued_at >= cutoff {
                break;
            }
            let ticket = *top;
            self.expiry.pop();

            let expired = self
                .positions
                .get(&ticket.mmsi)
                .is_some_and(|tracked| tracked.last_seen < cutoff);

            if expired {
                self.positions.remove(&ticket.mmsi);
                self.total_expired += 1;
                tracing::debug!(mmsi = ticket.mmsi, now, "vessel expired");
                events.push(TrackEvent::Expired {
                    mmsi: ticket.mmsi,
                    timestamp: now,
                });
            } else {
                self.stale_tickets += 1;
            }
        }
        events
    }

    pub fn get(&self, mmsi: Mmsi) -> Option<&TrackedVessel> {
        self.positions.get(&mmsi)
    }

    pub fn contains(&self, mmsi: Mmsi) -> bool {
        self.positions.contains_key(&mmsi)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Tickets still waiting in the expiry heap, stale ones included.
    pub fn pending_tickets(&self) -> usize {
        self.expiry.len()
    }

    /// All tracked vessels, most recently seen first.
    pub fn active(&self) -> Vec<&TrackedVessel> {
        let mut active: Vec<_> = self.positions.values().collect();
        active.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then(a.mmsi.cmp(&b.mmsi)));
        active
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker::new(DEFAULT_TTL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
