//! Planning session: owns what the map currently shows and decides which
//! planning results are allowed to replace it.
//!
//! Every invocation takes a ticket with a sequence number from
//! [`PlanningSession::begin`]. A result is applied only if its ticket is
//! still the latest one when it completes, so a slow stale response can
//! never overwrite a newer selection. Failures never touch the displayed
//! state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::PlanError;
use crate::model::{Address, Coordinate};
use crate::planner::{PlanPhase, PlannedRoute, RoutePlanner};
use crate::traits::{DirectionsProvider, RouteOptimizer};

/// A labelled stop pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub label: String,
}

/// What the map surface should render after an applied result or a clear.
#[derive(Debug, Clone, PartialEq)]
pub struct MapUpdate {
    pub seq: u64,
    pub markers: Vec<Marker>,
    pub polyline: Vec<Coordinate>,
}

impl MapUpdate {
    fn from_planned(seq: u64, planned: &PlannedRoute) -> Self {
        let markers = planned
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| Marker {
                coordinate: stop.coordinate,
                label: stop
                    .address
                    .as_ref()
                    .map(Address::label)
                    .unwrap_or_else(|| format!("Stop {}", index + 1)),
            })
            .collect();

        Self {
            seq,
            markers,
            polyline: planned.route.coordinates.clone(),
        }
    }

    fn cleared(seq: u64) -> Self {
        Self {
            seq,
            markers: Vec::new(),
            polyline: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.polyline.is_empty()
    }
}

/// Addresses and route currently on display. They are always replaced or
/// cleared together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    pub addresses: Vec<Address>,
    pub planned: PlannedRoute,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Idle,
    Planning { seq: u64 },
    Ready { seq: u64 },
    /// Shown as an error indicator; the display keeps its previous content.
    Failed { seq: u64, error: PlanError },
}

/// Identifies one planning invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied(PlannedRoute),
    Failed(PlanError),
    /// A newer invocation (or a clear) started first; the result was dropped.
    Superseded,
}

#[derive(Debug)]
struct Shared {
    latest: u64,
    display: DisplayState,
    status: SessionStatus,
    subscribers: Vec<Sender<MapUpdate>>,
}

impl Shared {
    fn publish(&mut self, update: MapUpdate) {
        self.subscribers
            .retain(|subscriber| subscriber.send(update.clone()).is_ok());
    }
}

pub struct PlanningSession<O, D> {
    planner: Arc<RoutePlanner<O, D>>,
    depot: Coordinate,
    shared: Arc<Mutex<Shared>>,
}

impl<O, D> Clone for PlanningSession<O, D> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            depot: self.depot,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O, D> PlanningSession<O, D>
where
    O: RouteOptimizer,
    D: DirectionsProvider,
{
    pub fn new(planner: RoutePlanner<O, D>, depot: Coordinate) -> Self {
        Self {
            planner: Arc::new(planner),
            depot,
            shared: Arc::new(Mutex::new(Shared {
                latest: 0,
                display: DisplayState::default(),
                status: SessionStatus::Idle,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Receives a [`MapUpdate`] for every applied result and every clear.
    pub fn subscribe(&self) -> Receiver<MapUpdate> {
        let (tx, rx) = mpsc::channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Starts a new invocation. Any invocation still in flight is superseded.
    pub fn begin(&self) -> Ticket {
        let mut shared = self.lock();
        shared.latest += 1;
        shared.status = SessionStatus::Planning { seq: shared.latest };
        Ticket { seq: shared.latest }
    }

    /// Runs the invocation identified by `ticket` on the calling thread.
    pub fn run(
        &self,
        ticket: Ticket,
        addresses: Vec<Address>,
        vehicle_start: Coordinate,
    ) -> Outcome {
        let span = tracing::info_span!("plan_route", seq = ticket.seq);
        let _enter = span.enter();

        tracing::info!(addresses = addresses.len(), "planning started");
        let still_latest = || self.lock().latest == ticket.seq;
        let result = self.planner.plan_route_while(
            &addresses,
            vehicle_start,
            self.depot,
            &|_: PlanPhase| {},
            &still_latest,
        );
        match result {
            Ok(Some(planned)) => self.complete(ticket, addresses, Ok(planned)),
            Ok(None) => {
                tracing::debug!("superseded before directions");
                Outcome::Superseded
            }
            Err(err) => self.complete(ticket, addresses, Err(err)),
        }
    }

    /// Begins and runs an invocation on the calling thread.
    pub fn plan(&self, addresses: Vec<Address>, vehicle_start: Coordinate) -> Outcome {
        let ticket = self.begin();
        self.run(ticket, addresses, vehicle_start)
    }

    /// Discards the selection and the route together and supersedes any
    /// invocation in flight.
    pub fn clear(&self) {
        let mut shared = self.lock();
        shared.latest += 1;
        shared.display = DisplayState::default();
        shared.status = SessionStatus::Idle;
        let update = MapUpdate::cleared(shared.latest);
        shared.publish(update);
        tracing::debug!(seq = shared.latest, "selection cleared");
    }

    pub fn display(&self) -> DisplayState {
        self.lock().display.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status.clone()
    }

    pub fn latest_seq(&self) -> u64 {
        self.lock().latest
    }

    fn complete(
        &self,
        ticket: Ticket,
        addresses: Vec<Address>,
        result: Result<PlannedRoute, PlanError>,
    ) -> Outcome {
        let mut shared = self.lock();

        if shared.latest != ticket.seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = shared.latest,
                "discarding superseded result"
            );
            return Outcome::Superseded;
        }

        match result {
            Ok(planned) => {
                tracing::info!(
                    stops = planned.stops.len(),
                    points = planned.route.coordinates.len(),
                    "route applied"
                );
                let update = MapUpdate::from_planned(ticket.seq, &planned);
                shared.display = DisplayState {
                    addresses,
                    planned: planned.clone(),
                };
                shared.status = SessionStatus::Ready { seq: ticket.seq };
                shared.publish(update);
                Outcome::Applied(planned)
            }
            Err(error) => {
                shared.status = SessionStatus::Failed {
                    seq: ticket.seq,
                    error: error.clone(),
                };
                Outcome::Failed(error)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<O, D> PlanningSession<O, D>
where
    O: RouteOptimizer + Send + Sync + 'static,
    D: DirectionsProvider + Send + Sync + 'static,
{
    /// Begins an invocation and runs it on a background thread.
    pub fn spawn(&self, addresses: Vec<Address>, vehicle_start: Coordinate) -> JoinHandle<Outcome> {
        let ticket = self.begin();
        let session = self.clone();
        thread::spawn(move || session.run(ticket, addresses, vehicle_start))
    }
}
