//! Pipeline control: scan toggling, surface passes and observation intake.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use surface_planes::{MeshId, PlaneLabel, classify, find_planes};
use tracing::{debug, info, warn};

use crate::collector::collect_fragments;
use crate::config::ScannerConfig;
use crate::error::{ScanError, ScanResult};
use crate::provider::{
    DisplayMode, FixedReferenceHeight, ObservationEvent, ReferenceHeightProvider, ScanProvider,
};
use crate::registry::{SurfaceGeneration, SurfaceInstance, SurfaceRegistry, SurfaceVisibility};
use crate::session::{CancelToken, PassGuard, ScanSession, SessionState};
use crate::sync::lock;
use crate::tracker::{ObservationTracker, TrackedMesh, Transition};

/// Why a pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The provider reported no mesh observer.
    ProviderUnavailable,
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// A new generation was published.
    Completed {
        /// Number of the published generation.
        generation: u64,
    },
    /// Nothing ran; the registry is untouched.
    Skipped(SkipReason),
}

/// Summary of one surface pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Outcome.
    pub status: PassStatus,
    /// Fragments handed to extraction.
    pub fragments: usize,
    /// Provider entries skipped for missing geometry.
    pub skipped_meshes: usize,
    /// Triangles that took part in clustering.
    pub triangles: usize,
    /// Planes published.
    pub planes: usize,
    /// Planes labelled floor, ceiling, wall and table.
    pub label_counts: [usize; 4],
    /// World height of the dominant floor.
    pub floor_height: Option<f64>,
    /// World height of the dominant ceiling.
    pub ceiling_height: Option<f64>,
    /// Wall-clock time of the pass.
    pub elapsed: Duration,
}

impl PassReport {
    fn skipped(reason: SkipReason, elapsed: Duration) -> Self {
        Self {
            status: PassStatus::Skipped(reason),
            fragments: 0,
            skipped_meshes: 0,
            triangles: 0,
            planes: 0,
            label_counts: [0; 4],
            floor_height: None,
            ceiling_height: None,
            elapsed,
        }
    }

    /// Check whether the pass published a generation.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.status, PassStatus::Completed { .. })
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            PassStatus::Skipped(reason) => write!(f, "Pass skipped: {reason:?}"),
            PassStatus::Completed { generation } => {
                let [floors, ceilings, walls, tables] = self.label_counts;
                write!(
                    f,
                    "Generation {generation}: {} planes ({floors} floor, {ceilings} ceiling, \
                     {walls} wall, {tables} table) from {} fragments in {:.1?}",
                    self.planes, self.fragments, self.elapsed
                )
            }
        }
    }
}

/// Result of [`SurfaceScanner::toggle_scanning`].
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// Scanning started and a pass ran.
    Started(PassReport),
    /// Scanning stopped; any running pass was asked to cancel.
    Stopped,
}

/// Drives surface passes over a scan provider.
///
/// All methods take `&self`, so one scanner can be shared between a
/// control thread and a worker. Only one pass runs at a time.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use surface_planes::{MeshId, PlaneLabel};
/// use surface_scan::{FixedReferenceHeight, MemoryScanProvider, ScannerConfig, SurfaceScanner};
///
/// let provider = MemoryScanProvider::new();
/// provider.insert(
///     MeshId(1),
///     IndexedMesh::from_parts(
///         vec![
///             Vertex::from_coords(0.0, -1.5, 0.0),
///             Vertex::from_coords(0.0, -1.5, 3.0),
///             Vertex::from_coords(4.0, -1.5, 3.0),
///             Vertex::from_coords(4.0, -1.5, 0.0),
///         ],
///         vec![[0, 1, 2], [0, 2, 3]],
///     ),
/// );
///
/// let scanner =
///     SurfaceScanner::new(provider, FixedReferenceHeight(0.0), ScannerConfig::default()).unwrap();
/// let report = scanner.run_pass().unwrap();
/// assert!(report.is_completed());
///
/// let surfaces = scanner.surface_instances();
/// assert_eq!(surfaces[0].label, PlaneLabel::Floor);
/// ```
#[derive(Debug)]
pub struct SurfaceScanner<P, H = FixedReferenceHeight> {
    provider: P,
    reference: H,
    config: ScannerConfig,
    session: ScanSession,
    busy: AtomicBool,
    active_pass: Mutex<Option<CancelToken>>,
    tracker: Mutex<ObservationTracker>,
    events: Mutex<Option<Receiver<ObservationEvent>>>,
    registry: SurfaceRegistry,
}

impl<P: ScanProvider, H: ReferenceHeightProvider> SurfaceScanner<P, H> {
    /// Create a scanner and subscribe to the provider's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(provider: P, reference: H, config: ScannerConfig) -> ScanResult<Self> {
        config.validate()?;
        let events = provider.subscribe();
        if events.is_none() {
            debug!("Scan provider unavailable; will subscribe later");
        }
        Ok(Self {
            provider,
            reference,
            config,
            session: ScanSession::new(),
            busy: AtomicBool::new(false),
            active_pass: Mutex::new(None),
            tracker: Mutex::new(ObservationTracker::new()),
            events: Mutex::new(events),
            registry: SurfaceRegistry::new(),
        })
    }

    /// The scan provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// The surface registry.
    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    /// Current session state.
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Check whether a pass is running.
    pub fn is_pass_running(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Flip the session.
    ///
    /// Starting runs a pass right away. Stopping asks a running pass to
    /// cancel.
    ///
    /// # Errors
    ///
    /// Starting while a pass is already running returns
    /// [`ScanError::PassInFlight`] and leaves the session idle. Errors from
    /// the started pass are passed through; the session stays scanning.
    pub fn toggle_scanning(&self) -> ScanResult<ToggleOutcome> {
        let token = CancelToken::new();
        let guard = {
            let mut active = lock(&self.active_pass, "active pass");
            if self.session.is_scanning() {
                self.session.stop();
                cancel_active(active.as_ref());
                info!("Scanning stopped");
                return Ok(ToggleOutcome::Stopped);
            }
            let guard = self.claim(&mut active, &token)?;
            self.session.start();
            guard
        };

        info!("Scanning started");
        let outcome = self.execute(&token);
        self.finish_pass(guard, outcome).map(ToggleOutcome::Started)
    }

    /// Stop scanning, cancel any running pass, and hide both the raw scan
    /// mesh and the generated surfaces.
    ///
    /// Use [`show_scan_mesh`](Self::show_scan_mesh) and
    /// [`set_surface_visibility`](Self::set_surface_visibility) to bring
    /// them back.
    pub fn stop_and_hide(&self) {
        {
            let active = lock(&self.active_pass, "active pass");
            self.session.stop();
            cancel_active(active.as_ref());
        }
        self.provider.set_display_mode(DisplayMode::None);
        self.registry.set_visibility(SurfaceVisibility::Hidden);
        info!("Scanning stopped, scan mesh and surfaces hidden");
    }

    /// Show the raw scan mesh.
    pub fn show_scan_mesh(&self) {
        self.provider.set_display_mode(DisplayMode::Visible);
    }

    /// Show or hide generated surfaces.
    pub fn set_surface_visibility(&self, visibility: SurfaceVisibility) {
        self.registry.set_visibility(visibility);
    }

    /// Ask the running pass, if any, to cancel. Returns whether one was
    /// running.
    pub fn cancel_pass(&self) -> bool {
        cancel_active(lock(&self.active_pass, "active pass").as_ref())
    }

    /// Run one surface pass.
    ///
    /// # Errors
    ///
    /// See [`run_pass_with`](Self::run_pass_with).
    pub fn run_pass(&self) -> ScanResult<PassReport> {
        self.run_pass_with(&CancelToken::new())
    }

    /// Run one surface pass that also stops when `token` is cancelled.
    ///
    /// Collects a snapshot of the provider's meshes, extracts and
    /// classifies planes, and publishes them as a new generation. When the
    /// provider has no observer the pass is skipped and the registry left
    /// alone.
    ///
    /// # Errors
    ///
    /// - [`ScanError::PassInFlight`] if another pass is running
    /// - [`ScanError::Cancelled`] if cancelled; the previous generation stays
    /// - [`ScanError::Plane`] if extraction rejects its parameters
    pub fn run_pass_with(&self, token: &CancelToken) -> ScanResult<PassReport> {
        let guard = self.begin_pass(token)?;
        let outcome = self.execute(token);
        self.finish_pass(guard, outcome)
    }

    fn begin_pass(&self, token: &CancelToken) -> ScanResult<PassGuard<'_>> {
        let mut active = lock(&self.active_pass, "active pass");
        self.claim(&mut active, token)
    }

    /// Take the busy flag and register `token`; the caller holds the
    /// active-pass lock so a concurrent stop sees either no pass or this one.
    fn claim(
        &self,
        active: &mut Option<CancelToken>,
        token: &CancelToken,
    ) -> ScanResult<PassGuard<'_>> {
        let Some(guard) = PassGuard::try_acquire(&self.busy) else {
            warn!("Surface pass rejected: another pass in flight");
            return Err(ScanError::PassInFlight);
        };
        *active = Some(token.clone());
        Ok(guard)
    }

    fn finish_pass(
        &self,
        guard: PassGuard<'_>,
        outcome: ScanResult<PassReport>,
    ) -> ScanResult<PassReport> {
        *lock(&self.active_pass, "active pass") = None;
        drop(guard);
        if let Err(ScanError::Cancelled) = outcome {
            info!("Surface pass cancelled");
        }
        outcome
    }

    fn execute(&self, token: &CancelToken) -> ScanResult<PassReport> {
        let started = Instant::now();
        info!("Surface pass started");

        let Some(meshes) = self.provider.meshes() else {
            info!("Scan provider unavailable, pass skipped");
            return Ok(PassReport::skipped(
                SkipReason::ProviderUnavailable,
                started.elapsed(),
            ));
        };

        let collected = collect_fragments(&meshes);
        drop(meshes);
        token.check()?;

        let found = find_planes(&collected.fragments, &self.config.planes)?;
        token.check()?;

        let reference = self.reference.reference_height();
        let classification = classify(found.planes, reference, &self.config.classification);
        token.check()?;

        let label_counts = [
            classification.count(PlaneLabel::Floor),
            classification.count(PlaneLabel::Ceiling),
            classification.count(PlaneLabel::Wall),
            classification.count(PlaneLabel::Table),
        ];
        let planes = classification.len();
        let floor_height = classification.floor_height;
        let ceiling_height = classification.ceiling_height;
        let generation = self.registry.replace_all(classification);

        let report = PassReport {
            status: PassStatus::Completed { generation },
            fragments: collected.fragments.len(),
            skipped_meshes: collected.skipped,
            triangles: found.triangles_considered,
            planes,
            label_counts,
            floor_height,
            ceiling_height,
            elapsed: started.elapsed(),
        };
        info!(
            generation,
            fragments = report.fragments,
            planes,
            reference,
            elapsed = ?report.elapsed,
            "Surface pass complete"
        );
        Ok(report)
    }

    /// Feed every pending provider notification to the tracker.
    ///
    /// Subscribes first if the provider was unavailable at construction.
    /// Returns the number of events applied.
    pub fn process_observations(&self) -> usize {
        let mut events = lock(&self.events, "observation events");
        if events.is_none() {
            *events = self.provider.subscribe();
        }
        let Some(receiver) = events.as_ref() else {
            return 0;
        };
        lock(&self.tracker, "observation tracker").drain(receiver)
    }

    /// Apply one notification to the tracker directly.
    pub fn handle_observation(&self, event: ObservationEvent) -> Transition {
        lock(&self.tracker, "observation tracker").apply(event)
    }

    /// Tracked meshes in ascending id order.
    pub fn tracked_meshes(&self) -> Vec<TrackedMesh> {
        lock(&self.tracker, "observation tracker").iter().collect()
    }

    /// Update counter of a tracked mesh.
    pub fn update_count(&self, id: MeshId) -> Option<u32> {
        lock(&self.tracker, "observation tracker").update_count(id)
    }

    /// Snapshot of the current surfaces.
    pub fn surfaces(&self) -> Arc<SurfaceGeneration> {
        self.registry.current()
    }

    /// Render-facing slabs at the configured thickness.
    pub fn surface_instances(&self) -> Vec<SurfaceInstance> {
        self.registry.instances(self.config.plane_thickness)
    }
}

fn cancel_active(active: Option<&CancelToken>) -> bool {
    match active {
        Some(token) => {
            token.cancel();
            debug!("Cancellation requested");
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryScanProvider;
    use mesh_types::{IndexedMesh, Vertex};

    fn floor_mesh() -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, -1.5, 0.0),
                Vertex::from_coords(0.0, -1.5, 3.0),
                Vertex::from_coords(4.0, -1.5, 3.0),
                Vertex::from_coords(4.0, -1.5, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    fn scanner() -> SurfaceScanner<MemoryScanProvider> {
        let provider = MemoryScanProvider::new();
        provider.insert(MeshId(1), floor_mesh());
        SurfaceScanner::new(provider, FixedReferenceHeight(0.0), ScannerConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ScannerConfig::default().with_plane_thickness(f64::NAN);
        let result = SurfaceScanner::new(
            MemoryScanProvider::new(),
            FixedReferenceHeight(0.0),
            config,
        );
        assert!(matches!(result, Err(ScanError::InvalidParameter { .. })));
    }

    #[test]
    fn toggle_starts_and_stops() {
        let scanner = scanner();
        let outcome = scanner.toggle_scanning().unwrap();
        let ToggleOutcome::Started(report) = outcome else {
            panic!("expected a started pass");
        };
        assert_eq!(report.status, PassStatus::Completed { generation: 1 });
        assert_eq!(report.label_counts, [1, 0, 0, 0]);
        assert_eq!(scanner.session_state(), SessionState::Scanning);

        assert_eq!(scanner.toggle_scanning().unwrap(), ToggleOutcome::Stopped);
        assert_eq!(scanner.session_state(), SessionState::Idle);
        // Surfaces survive stopping
        assert_eq!(scanner.surfaces().planes().len(), 1);
    }

    #[test]
    fn unavailable_provider_skips_pass() {
        let scanner = scanner();
        scanner.run_pass().unwrap();
        scanner.provider().set_available(false);

        let report = scanner.run_pass().unwrap();
        assert_eq!(
            report.status,
            PassStatus::Skipped(SkipReason::ProviderUnavailable)
        );
        assert_eq!(scanner.registry().generation(), 1);
        assert_eq!(report.to_string(), "Pass skipped: ProviderUnavailable");
    }

    #[test]
    fn pre_cancelled_token_keeps_previous_generation() {
        let scanner = scanner();
        scanner.run_pass().unwrap();

        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            scanner.run_pass_with(&token),
            Err(ScanError::Cancelled)
        ));
        assert_eq!(scanner.registry().generation(), 1);
        assert!(!scanner.is_pass_running());
    }

    #[test]
    fn busy_flag_rejects_second_pass() {
        let scanner = scanner();
        let _held = PassGuard::try_acquire(&scanner.busy);
        assert!(matches!(scanner.run_pass(), Err(ScanError::PassInFlight)));
        assert!(matches!(
            scanner.toggle_scanning(),
            Err(ScanError::PassInFlight)
        ));
        assert_eq!(scanner.session_state(), SessionState::Idle);
    }

    #[test]
    fn stop_and_hide_hides_scan_mesh_and_surfaces() {
        let scanner = scanner();
        scanner.toggle_scanning().unwrap();
        scanner.stop_and_hide();

        assert_eq!(scanner.session_state(), SessionState::Idle);
        assert_eq!(scanner.provider().display_mode(), DisplayMode::None);
        assert_eq!(scanner.registry().visibility(), SurfaceVisibility::Hidden);
        assert!(!scanner.surface_instances()[0].visible);

        scanner.show_scan_mesh();
        assert_eq!(scanner.provider().display_mode(), DisplayMode::Visible);
        scanner.set_surface_visibility(SurfaceVisibility::Shown);
        assert!(scanner.surface_instances()[0].visible);
    }

    #[test]
    fn claimed_pass_is_cancellable_before_it_runs() {
        let scanner = scanner();
        let token = CancelToken::new();
        let guard = scanner.begin_pass(&token).unwrap();

        // Stop lands between claiming the slot and collecting meshes
        scanner.stop_and_hide();
        assert!(token.is_cancelled());

        let outcome = scanner.finish_pass(guard, scanner.execute(&token));
        assert!(matches!(outcome, Err(ScanError::Cancelled)));
        assert_eq!(scanner.registry().generation(), 0);
        assert!(!scanner.is_pass_running());
        assert!(!scanner.cancel_pass());
    }

    #[test]
    fn toggle_against_claimed_pass_stays_idle() {
        let scanner = scanner();
        let token = CancelToken::new();
        let guard = scanner.begin_pass(&token).unwrap();

        assert!(matches!(
            scanner.toggle_scanning(),
            Err(ScanError::PassInFlight)
        ));
        assert_eq!(scanner.session_state(), SessionState::Idle);
        assert!(scanner.cancel_pass());
        drop(guard);
    }

    #[test]
    fn observations_reach_tracker() {
        let scanner = scanner();
        // The insert in `scanner()` happened before subscribing
        assert_eq!(scanner.process_observations(), 0);

        scanner.provider().insert(MeshId(1), floor_mesh());
        scanner.provider().insert(MeshId(2), floor_mesh());
        assert_eq!(scanner.process_observations(), 2);
        assert_eq!(scanner.update_count(MeshId(1)), None);
        assert_eq!(scanner.update_count(MeshId(2)), Some(0));

        assert_eq!(
            scanner.handle_observation(ObservationEvent::Added(MeshId(1))),
            Transition::Tracked(MeshId(1))
        );
        assert_eq!(scanner.tracked_meshes().len(), 2);
    }
}
