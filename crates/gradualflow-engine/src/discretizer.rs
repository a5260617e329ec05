//! Flow discretization
//!
//! Splits each path into sub-paths of constant flow so that the flow moves
//! from the carried-in value to the path's target in steps no larger than
//! `flow_acceleration * discretized_duration`.
//!
//! A ramp is planned in time and then laid onto the path by arc length:
//! each step covers the distance the nozzle travels in that step's
//! duration at the path's nominal speed. When the ramp would run past the
//! end of the path, all step windows shrink proportionally so the path
//! still ends on its target flow.
//!
//! Window edges inside a segment are moved onto integer coordinates. Each
//! one may lengthen the path a little, so the engine tracks the added
//! length and re-plans the ramp with fewer, evenly spaced levels whenever
//! it would exceed [`MAX_LENGTH_DRIFT`].

use crate::state::FlowState;
use gradualflow_core::{GeometricPath, GeometryError, Point, PointF, RampedSubPath, MICRONS_PER_MM};

/// Upper bound on the number of steps a single ramp may produce
pub const MAX_RAMP_STEPS: usize = 10_000;

/// Default shortest sub-path the engine emits, in geometry units
pub const DEFAULT_MIN_STEP_LENGTH: f64 = 5.0;

/// Most length the rounded window edges of one path may add, in geometry units
pub const MAX_LENGTH_DRIFT: f64 = 0.5;

/// A window must survive rounding to integer coordinates
const MIN_STEP_FLOOR: f64 = 2.0;

/// Boundaries closer than this to an original vertex land on the vertex
const SNAP_DISTANCE: f64 = 1.0;

/// Absorbs division noise such as 1.1 / 0.1 = 11.000000000000002
const STEP_COUNT_EPSILON: f64 = 1e-9;

/// One discrete flow level and the arc-length window it covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStep {
    pub flow: f64,
    /// Arc length from the start of the path where the step begins
    pub start: f64,
    /// Arc length from the start of the path where the step ends
    pub end: f64,
}

impl RampStep {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Plan the flow levels that take `state.current_flow()` to `target`
/// along a path of `path_length` travelled at `speed` mm/s.
///
/// The windows of the returned steps tile `[0, path_length]` in order.
/// If any window would be shorter than `min_step_length`, the ramp is
/// re-planned with fewer levels of equal duration and equal flow change,
/// as many as still keep every window at least `min_step_length` long.
/// Consecutive levels then differ by `|target - from| / count`, which is
/// more than `a·dt` but the same for every step.
pub fn plan_ramp(
    state: &FlowState,
    target: f64,
    path_length: f64,
    speed: f64,
    min_step_length: f64,
) -> Vec<RampStep> {
    match Ramp::new(state, target, path_length, speed) {
        Some(ramp) => ramp.plan(min_step_length),
        None => single_step(target, path_length),
    }
}

fn single_step(target: f64, path_length: f64) -> Vec<RampStep> {
    vec![RampStep {
        flow: target,
        start: 0.0,
        end: path_length.max(0.0),
    }]
}

/// A flow change laid out in time, before it is cut into windows
struct Ramp {
    from: f64,
    target: f64,
    /// (flow, duration) per step; the last one lands exactly on the target
    levels: Vec<(f64, f64)>,
    total_duration: f64,
    path_length: f64,
    speed_units: f64,
    fits: bool,
}

impl Ramp {
    fn new(state: &FlowState, target: f64, path_length: f64, speed: f64) -> Option<Self> {
        let from = state.current_flow();
        let delta = target - from;
        if delta == 0.0 || path_length <= 0.0 {
            return None;
        }

        let magnitude = delta.abs();
        let sign = delta.signum();
        let mut step_delta = state.max_step_delta();
        let ratio = magnitude / step_delta;
        let count = if ratio > MAX_RAMP_STEPS as f64 {
            tracing::warn!(
                "Flow change {:.4} needs {:.0} steps; clamping to {} steps",
                magnitude,
                ratio.ceil(),
                MAX_RAMP_STEPS
            );
            step_delta = magnitude / MAX_RAMP_STEPS as f64;
            MAX_RAMP_STEPS
        } else {
            ((ratio - STEP_COUNT_EPSILON).ceil() as usize).max(1)
        };

        let levels: Vec<(f64, f64)> = (1..=count)
            .map(|i| {
                if i < count {
                    (from + sign * step_delta * i as f64, step_delta / state.flow_acceleration())
                } else {
                    let remaining = magnitude - step_delta * (count - 1) as f64;
                    (target, remaining / state.flow_acceleration())
                }
            })
            .collect();

        let total_duration: f64 = levels.iter().map(|(_, duration)| duration).sum();
        let speed_units = speed * MICRONS_PER_MM;
        let fits = speed_units.is_finite()
            && speed_units > 0.0
            && total_duration * speed_units <= path_length;

        Some(Self {
            from,
            target,
            levels,
            total_duration,
            path_length,
            speed_units,
            fits,
        })
    }

    /// Arc length over which the flow is still changing
    fn span(&self) -> f64 {
        if self.fits {
            (self.total_duration * self.speed_units).min(self.path_length)
        } else {
            self.path_length
        }
    }

    fn plan(&self, min_step_length: f64) -> Vec<RampStep> {
        let steps = self.steps();
        if steps.iter().all(|step| step.length() >= min_step_length) {
            return steps;
        }
        let count = ((self.span() / min_step_length).floor() as usize).clamp(1, self.levels.len());
        self.even_steps(count)
    }

    /// One window per planned level, sized by the level's duration
    fn steps(&self) -> Vec<RampStep> {
        let count = self.levels.len();
        // Windows are cut at absolute positions so they tile the path exactly
        let mut steps = Vec::with_capacity(count);
        let mut elapsed = 0.0;
        let mut start = 0.0;
        for (i, &(flow, duration)) in self.levels.iter().enumerate() {
            elapsed += duration;
            let end = if i + 1 == count {
                self.path_length
            } else if self.fits {
                (elapsed * self.speed_units).min(self.path_length)
            } else {
                (self.path_length * elapsed / self.total_duration).min(self.path_length)
            };
            steps.push(RampStep { flow, start, end });
            start = end;
        }
        steps
    }

    /// `count` windows of equal duration with equal flow changes between them
    fn even_steps(&self, count: usize) -> Vec<RampStep> {
        let count = count.max(1);
        let span = self.span();
        let delta = self.target - self.from;
        let mut steps = Vec::with_capacity(count);
        let mut start = 0.0;
        for i in 1..=count {
            let (flow, end) = if i == count {
                (self.target, self.path_length)
            } else {
                let fraction = i as f64 / count as f64;
                (self.from + delta * fraction, span * fraction)
            };
            steps.push(RampStep { flow, start, end });
            start = end;
        }
        steps
    }
}

/// Rewrites paths into acceleration-limited sub-paths
#[derive(Debug, Clone)]
pub struct DiscretizationEngine {
    min_step_length: f64,
}

impl Default for DiscretizationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscretizationEngine {
    pub fn new() -> Self {
        Self {
            min_step_length: DEFAULT_MIN_STEP_LENGTH,
        }
    }

    /// Shortest sub-path to emit; ramps that would need shorter steps are
    /// re-planned with fewer of them.
    pub fn with_min_step_length(mut self, length: f64) -> Self {
        self.min_step_length = if length.is_finite() {
            length.max(MIN_STEP_FLOOR)
        } else {
            DEFAULT_MIN_STEP_LENGTH
        };
        self
    }

    pub fn min_step_length(&self) -> f64 {
        self.min_step_length
    }

    /// Discretize `paths` in order, advancing `state` as each path is done
    ///
    /// Every input path yields at least one sub-path, and the sub-paths of a
    /// path cover its geometry in travel order. On success `state` holds the
    /// flow at the end of the last path.
    pub fn process(
        &self,
        state: &mut FlowState,
        paths: &[GeometricPath],
    ) -> Result<Vec<RampedSubPath>, GeometryError> {
        let mut output = Vec::with_capacity(paths.len());
        for path in paths {
            self.process_path(state, path, &mut output)?;
        }

        tracing::debug!(
            "Discretized {} path(s) into {} sub-path(s), final flow {:.4}",
            paths.len(),
            output.len(),
            state.current_flow()
        );
        Ok(output)
    }

    fn process_path(
        &self,
        state: &mut FlowState,
        path: &GeometricPath,
        output: &mut Vec<RampedSubPath>,
    ) -> Result<(), GeometryError> {
        let current = state.current_flow();
        let polyline = WorkingPolyline::new(&path.points);
        let ramp = if path.is_degenerate() {
            None
        } else {
            Ramp::new(state, path.target_flow, polyline.length(), path.speed)
        };

        let Some(ramp) = ramp else {
            if path.target_flow != current && !path.is_empty() {
                tracing::debug!(
                    "Path {} has no length; holding flow {:.4} instead of {:.4}",
                    path.source,
                    current,
                    path.target_flow
                );
            }
            output.push(RampedSubPath {
                points: path.points.clone(),
                flow: current,
                source: path.source,
                continues_previous: path.prefixed,
            });
            return Ok(());
        };

        let mut steps = ramp.plan(self.min_step_length);
        let mut edges = polyline.edges(&steps)?;
        while edges.drift > MAX_LENGTH_DRIFT && steps.len() > 1 {
            // Added length grows with the square of the number of edges
            let scale = (MAX_LENGTH_DRIFT / edges.drift).sqrt() * 0.9;
            let count = ((steps.len() as f64 * scale) as usize).clamp(1, steps.len() - 1);
            tracing::debug!(
                "Path {}: rounding {} window edge(s) adds {:.3} units; re-planning with {} step(s)",
                path.source,
                steps.len() - 1,
                edges.drift,
                count
            );
            steps = ramp.even_steps(count);
            edges = polyline.edges(&steps)?;
        }

        tracing::trace!(
            "Path {}: flow {:.4} -> {:.4} in {} step(s), {:.3} units added by rounding",
            path.source,
            current,
            path.target_flow,
            steps.len(),
            edges.drift
        );

        for (i, (step, window)) in steps.iter().zip(edges.boundaries.windows(2)).enumerate() {
            output.push(RampedSubPath {
                points: polyline.cut(&window[0], &window[1]),
                flow: step.flow,
                source: path.source,
                continues_previous: i > 0 || path.prefixed,
            });
        }

        state.set_current_flow(path.target_flow);
        Ok(())
    }
}

/// Floating-point copy of a path with its cumulative arc length
struct WorkingPolyline<'a> {
    vertices: &'a [Point],
    working: Vec<PointF>,
    cumulative: Vec<f64>,
}

impl<'a> WorkingPolyline<'a> {
    fn new(vertices: &'a [Point]) -> Self {
        let working: Vec<PointF> = vertices.iter().map(|p| p.to_f64()).collect();
        let mut cumulative = Vec::with_capacity(working.len());
        let mut total = 0.0;
        for (i, point) in working.iter().enumerate() {
            if i > 0 {
                total += working[i - 1].distance_to(point);
            }
            cumulative.push(total);
        }
        Self {
            vertices,
            working,
            cumulative,
        }
    }

    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Where arc length `s` falls, snapped onto nearby original vertices
    fn anchor(&self, s: f64) -> Anchor {
        let last = self.vertices.len() - 1;
        if s <= 0.0 {
            return Anchor::Vertex(0);
        }
        if s >= self.length() {
            return Anchor::Vertex(last);
        }

        let segment = self
            .cumulative
            .partition_point(|&c| c <= s)
            .saturating_sub(1)
            .min(last - 1);
        let (seg_start, seg_end) = (self.cumulative[segment], self.cumulative[segment + 1]);

        if s - seg_start < SNAP_DISTANCE {
            return Anchor::Vertex(segment);
        }
        if seg_end - s < SNAP_DISTANCE {
            return Anchor::Vertex(segment + 1);
        }

        let t = (s - seg_start) / (seg_end - seg_start);
        Anchor::Segment {
            segment,
            exact: self.working[segment].lerp(&self.working[segment + 1], t),
        }
    }

    /// Window edges for `steps`, from the first vertex to the last
    ///
    /// An edge inside a segment goes to whichever corner of its unit grid
    /// cell lengthens the emitted line least, measured as the detour from
    /// the previous emitted point to the segment's end vertex. Those
    /// detours add up to exactly the length the edges add to the path.
    fn edges(&self, steps: &[RampStep]) -> Result<Edges, GeometryError> {
        let mut boundaries = Vec::with_capacity(steps.len() + 1);
        boundaries.push(Boundary::Vertex(0));
        let mut drift = 0.0;

        for step in &steps[..steps.len().saturating_sub(1)] {
            let boundary = match self.anchor(step.end) {
                Anchor::Vertex(index) => Boundary::Vertex(index),
                Anchor::Segment { segment, exact } => {
                    let previous = match boundaries.last() {
                        Some(&Boundary::Inner { segment: s, point }) if s == segment => point,
                        _ => self.vertices[segment],
                    };
                    let (point, added) =
                        least_detour(previous, self.vertices[segment + 1], exact)?;
                    drift += added;
                    Boundary::Inner { segment, point }
                }
            };
            boundaries.push(boundary);
        }

        boundaries.push(Boundary::Vertex(self.vertices.len() - 1));
        Ok(Edges { boundaries, drift })
    }

    fn boundary_point(&self, boundary: &Boundary) -> Point {
        match *boundary {
            Boundary::Vertex(index) => self.vertices[index],
            Boundary::Inner { point, .. } => point,
        }
    }

    /// Points between two window edges in travel order
    ///
    /// Every original vertex inside the window appears exactly once, so
    /// repeated input points survive the cut.
    fn cut(&self, from: &Boundary, to: &Boundary) -> Vec<Point> {
        let first_inside = match *from {
            Boundary::Vertex(index) => index + 1,
            Boundary::Inner { segment, .. } => segment + 1,
        };
        let past_inside = match *to {
            Boundary::Vertex(index) => index,
            Boundary::Inner { segment, .. } => segment + 1,
        };

        let mut points = Vec::with_capacity(past_inside.saturating_sub(first_inside) + 2);
        points.push(self.boundary_point(from));
        if first_inside < past_inside {
            points.extend_from_slice(&self.vertices[first_inside..past_inside]);
        }
        points.push(self.boundary_point(to));
        points
    }
}

/// Grid corner around `exact` that adds the least length to the line
/// `previous -> end`, nearest to `exact` on ties, with the length it adds
fn least_detour(previous: Point, end: Point, exact: PointF) -> Result<(Point, f64), GeometryError> {
    let direct = previous.distance_to(&end);
    let score = |corner: &Point| {
        (
            previous.distance_to(corner) + corner.distance_to(&end) - direct,
            corner.to_f64().distance_to(&exact),
        )
    };

    let corners = exact.grid_corners()?;
    let mut best = corners[0];
    let mut best_score = score(&best);
    for corner in &corners[1..] {
        let candidate = score(corner);
        if candidate < best_score {
            best = *corner;
            best_score = candidate;
        }
    }
    Ok((best, best_score.0.max(0.0)))
}

/// Where an arc-length position falls before rounding
#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    Vertex(usize),
    Segment { segment: usize, exact: PointF },
}

/// A window edge: either an original vertex or a point inside a segment
#[derive(Debug, Clone, Copy, PartialEq)]
enum Boundary {
    Vertex(usize),
    Inner { segment: usize, point: Point },
}

/// Window edges of one path and the length they add to it
struct Edges {
    boundaries: Vec<Boundary>,
    drift: f64,
}
