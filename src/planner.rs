//! Two-stage route planning: optimize the visiting order, then fetch the
//! drivable path through it.

use crate::directions::DirectionsClient;
use crate::error::{ConfigError, PlanError};
use crate::model::{Address, Coordinate, OptimizedStop, Route};
use crate::optimization::OptimizationClient;
use crate::ors::{OrsConfig, OrsTransport};
use crate::traits::{DirectionsProvider, RouteOptimizer};

/// Progress of a single planning invocation.
///
/// `Ready` and `Failed` are terminal; a retry is a new invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    Idle,
    Optimizing,
    RoutingDirections,
    Ready,
    Failed,
}

/// Receives phase transitions of a planning invocation.
pub trait PlanObserver {
    fn on_phase(&self, phase: PlanPhase);
}

impl<F> PlanObserver for F
where
    F: Fn(PlanPhase),
{
    fn on_phase(&self, phase: PlanPhase) {
        self(phase)
    }
}

/// A stop in visiting order, linked back to the address it delivers to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStop {
    pub job_id: Option<u64>,
    /// `None` if the optimizer returned a job id we did not send.
    pub address: Option<Address>,
    pub coordinate: Coordinate,
}

/// Outcome of a planning invocation: ordered stops plus the path through them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedRoute {
    pub stops: Vec<PlannedStop>,
    pub route: Route,
}

impl PlannedRoute {
    /// Result for an empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() && self.route.is_empty()
    }

    /// Stop coordinates in visiting order.
    pub fn ordered_stops(&self) -> Vec<Coordinate> {
        self.stops.iter().map(|stop| stop.coordinate).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RoutePlanner<O, D> {
    optimizer: O,
    directions: D,
}

impl RoutePlanner<OptimizationClient<OrsTransport>, DirectionsClient<OrsTransport>> {
    /// Planner backed by openrouteservice for both stages.
    pub fn from_config(config: &OrsConfig) -> Result<Self, ConfigError> {
        let transport = OrsTransport::new(config)?;
        Ok(Self::new(
            OptimizationClient::new(transport.clone(), config),
            DirectionsClient::new(transport, config),
        ))
    }
}

impl<O, D> RoutePlanner<O, D>
where
    O: RouteOptimizer,
    D: DirectionsProvider,
{
    pub fn new(optimizer: O, directions: D) -> Self {
        Self {
            optimizer,
            directions,
        }
    }

    /// Plans a delivery round from `vehicle_start` through every selected
    /// address to `depot`.
    ///
    /// An empty selection yields [`PlannedRoute::empty`] without touching the
    /// network.
    pub fn plan_route(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        depot: Coordinate,
    ) -> Result<PlannedRoute, PlanError> {
        self.plan_route_observed(addresses, vehicle_start, depot, &|_: PlanPhase| {})
    }

    pub fn plan_route_observed(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        depot: Coordinate,
        observer: &dyn PlanObserver,
    ) -> Result<PlannedRoute, PlanError> {
        self.plan_route_while(addresses, vehicle_start, depot, observer, &|| true)
            .map(Option::unwrap_or_default)
    }

    /// Plans like [`plan_route_observed`](Self::plan_route_observed), but asks
    /// `keep_going` once the visiting order is known. If it answers `false`
    /// the directions service is not called and `Ok(None)` is returned.
    pub fn plan_route_while(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        depot: Coordinate,
        observer: &dyn PlanObserver,
        keep_going: &dyn Fn() -> bool,
    ) -> Result<Option<PlannedRoute>, PlanError> {
        observer.on_phase(PlanPhase::Idle);
        let result = self.run(addresses, vehicle_start, depot, observer, keep_going);
        match &result {
            Ok(Some(_)) => observer.on_phase(PlanPhase::Ready),
            Ok(None) => tracing::debug!("planning abandoned after optimization"),
            Err(err) => {
                tracing::warn!(error = %err, "route planning failed");
                observer.on_phase(PlanPhase::Failed);
            }
        }
        result
    }

    fn run(
        &self,
        addresses: &[Address],
        vehicle_start: Coordinate,
        depot: Coordinate,
        observer: &dyn PlanObserver,
        keep_going: &dyn Fn() -> bool,
    ) -> Result<Option<PlannedRoute>, PlanError> {
        if addresses.is_empty() {
            return Ok(Some(PlannedRoute::empty()));
        }

        tracing::debug!(addresses = addresses.len(), "validating selection");
        validate(vehicle_start)?;
        validate(depot)?;
        for address in addresses {
            validate(address.coordinate())?;
        }

        observer.on_phase(PlanPhase::Optimizing);
        let optimized = self.optimizer.optimize(addresses, vehicle_start, depot)?;
        if !keep_going() {
            return Ok(None);
        }

        observer.on_phase(PlanPhase::RoutingDirections);
        let mut waypoints = Vec::with_capacity(optimized.len() + 2);
        waypoints.push(vehicle_start);
        waypoints.extend(optimized.iter().map(|stop| stop.location));
        waypoints.push(depot);
        let route = self.directions.route(&waypoints)?;

        Ok(Some(PlannedRoute {
            stops: label_stops(&optimized, addresses),
            route,
        }))
    }
}

fn validate(coordinate: Coordinate) -> Result<(), PlanError> {
    if coordinate.is_valid() {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate(coordinate))
    }
}

/// Resolves each job id (the 1-based selection index) to its address.
fn label_stops(optimized: &[OptimizedStop], addresses: &[Address]) -> Vec<PlannedStop> {
    optimized
        .iter()
        .map(|stop| {
            let address = stop
                .job_id
                .and_then(|id| id.checked_sub(1))
                .and_then(|index| addresses.get(index as usize))
                .cloned();
            PlannedStop {
                job_id: stop.job_id,
                address,
                coordinate: stop.location,
            }
        })
        .collect()
}
