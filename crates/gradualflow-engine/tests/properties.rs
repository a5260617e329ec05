use gradualflow_core::{polyline_length, GeometricPath, Point, RampedSubPath};
use gradualflow_engine::{plan_ramp, stitch_segments, DiscretizationEngine, FlowState, RawSegment};
use proptest::prelude::*;

/// Most the sub-paths of a path may differ in length from the path
const LENGTH_TOLERANCE: f64 = 1.0;

fn polyline() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-20_000i64..20_000, -20_000i64..20_000), 2..8)
        .prop_map(|coords| {
            let mut points: Vec<Point> = coords.into_iter().map(|(x, y)| Point::new(x, y)).collect();
            points.dedup();
            points
        })
        .prop_filter("needs two distinct points", |points| points.len() >= 2)
}

/// A single long segment at an arbitrary slope, up to about 140 mm
fn long_diagonal() -> impl Strategy<Value = Vec<Point>> {
    (1_000i64..100_000, 1_000i64..100_000, -1i64..=1, -1i64..=1)
        .prop_map(|(dx, dy, sx, sy)| {
            let sx = if sx == 0 { 1 } else { sx };
            vec![Point::new(-3, 11), Point::new(-3 + sx * dx, 11 + sy * dy)]
        })
}

fn segment_points() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-1_000i64..1_000, -1_000i64..1_000), 0..5)
        .prop_map(|coords| coords.into_iter().map(|(x, y)| Point::new(x, y)).collect())
}

fn is_subsequence(needle: &[Point], haystack: &[Point]) -> bool {
    let mut remaining = haystack.iter();
    needle.iter().all(|p| remaining.any(|q| q == p))
}

fn run(path: &GeometricPath, state: &mut FlowState) -> Vec<RampedSubPath> {
    DiscretizationEngine::new()
        .process(state, std::slice::from_ref(path))
        .unwrap()
}

proptest! {
    #[test]
    fn prop_length_is_conserved(
        points in polyline(),
        start_flow in 0.0f64..20.0,
        target in 0.0f64..20.0,
        acceleration in 0.5f64..10.0,
        step in 0.05f64..1.0,
        speed in 0.0f64..200.0,
    ) {
        let path = GeometricPath::new(points, target, speed, 0);
        let mut state = FlowState::new(acceleration, step).unwrap().with_current_flow(start_flow);
        let subs = run(&path, &mut state);

        let original = path.length();
        let total: f64 = subs.iter().map(RampedSubPath::length).sum();
        prop_assert!(
            (total - original).abs() <= LENGTH_TOLERANCE,
            "length {} differs from {} over {} sub-paths", total, original, subs.len()
        );
    }

    #[test]
    fn prop_length_is_conserved_over_many_steps(
        points in long_diagonal(),
        target in 2.0f64..20.0,
        acceleration in 0.1f64..2.0,
        step in 0.0005f64..0.01,
    ) {
        // a·dt down to 5e-5 asks for thousands of steps before the cap
        let path = GeometricPath::new(points, target, 0.0, 0);
        let mut state = FlowState::new(acceleration, step).unwrap();
        let subs = run(&path, &mut state);

        let original = path.length();
        let total: f64 = subs.iter().map(RampedSubPath::length).sum();
        prop_assert!(
            (total - original).abs() <= LENGTH_TOLERANCE,
            "length {} differs from {} over {} sub-paths", total, original, subs.len()
        );
        prop_assert_eq!(subs.last().unwrap().flow, target);
    }

    #[test]
    fn prop_windows_tile_the_path(
        length in 1.0f64..1e6,
        start_flow in 0.0f64..20.0,
        target in 0.0f64..20.0,
        acceleration in 0.5f64..10.0,
        step in 0.05f64..1.0,
        speed in 0.0f64..200.0,
    ) {
        let state = FlowState::new(acceleration, step).unwrap().with_current_flow(start_flow);
        let steps = plan_ramp(&state, target, length, speed, 5.0);

        prop_assert_eq!(steps[0].start, 0.0);
        prop_assert_eq!(steps.last().unwrap().end, length);
        for pair in steps.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        let total: f64 = steps.iter().map(|s| s.length()).sum();
        prop_assert!((total - length).abs() < 1.0);
    }

    #[test]
    fn prop_flow_is_monotonic_without_overshoot(
        points in polyline(),
        start_flow in 0.0f64..20.0,
        target in 0.0f64..20.0,
        acceleration in 0.5f64..10.0,
        step in 0.05f64..1.0,
        speed in 0.0f64..200.0,
    ) {
        let path = GeometricPath::new(points, target, speed, 0);
        let mut state = FlowState::new(acceleration, step).unwrap().with_current_flow(start_flow);
        let subs = run(&path, &mut state);

        let (low, high) = if start_flow <= target { (start_flow, target) } else { (target, start_flow) };
        let mut previous = start_flow;
        for sub in &subs {
            prop_assert!(sub.flow >= low - 1e-9 && sub.flow <= high + 1e-9);
            if target >= start_flow {
                prop_assert!(sub.flow >= previous - 1e-9);
            } else {
                prop_assert!(sub.flow <= previous + 1e-9);
            }
            previous = sub.flow;
        }
        prop_assert_eq!(subs.last().unwrap().flow, target);
        prop_assert_eq!(state.current_flow(), target);
    }

    /// Without a minimum window every level is kept, so consecutive levels
    /// differ by exactly `a·dt` apart from the clamped last one.
    #[test]
    fn prop_acceleration_is_bounded(
        start_flow in 0.0f64..20.0,
        target in 0.0f64..20.0,
        acceleration in 0.5f64..10.0,
        step in 0.05f64..1.0,
    ) {
        let state = FlowState::new(acceleration, step).unwrap().with_current_flow(start_flow);
        // No minimum window, so every planned level is kept
        let steps = plan_ramp(&state, target, 1e7, 0.0, 0.0);
        let bound = acceleration * step;
        let tolerance = bound * 1e-9 + 1e-12;

        let mut previous = start_flow;
        for (i, level) in steps.iter().enumerate() {
            let change = (level.flow - previous).abs();
            prop_assert!(change / step <= acceleration + tolerance / step);
            if i + 1 < steps.len() {
                prop_assert!((change - bound).abs() <= 1e-9 * (1.0 + bound + previous.abs()));
            }
            previous = level.flow;
        }
    }

    /// Ramps merged to respect the minimum window change in equal jumps of
    /// `|Δ| / steps`, which may exceed `a·dt` on short paths.
    #[test]
    fn prop_merged_steps_change_evenly(
        length in 1.0f64..500.0,
        start_flow in 0.0f64..20.0,
        target in 0.0f64..20.0,
        acceleration in 0.5f64..10.0,
        step in 0.05f64..1.0,
        speed in 0.0f64..200.0,
    ) {
        let state = FlowState::new(acceleration, step).unwrap().with_current_flow(start_flow);
        let steps = plan_ramp(&state, target, length, speed, 5.0);
        let bound = acceleration * step;
        let even = (target - start_flow).abs() / steps.len() as f64;
        let tolerance = 1e-9 * (1.0 + bound + start_flow.abs() + target.abs());

        let mut previous = start_flow;
        for (i, level) in steps.iter().enumerate() {
            let change = (level.flow - previous).abs();
            prop_assert!(change <= bound.max(even) + tolerance);
            if i + 1 < steps.len() {
                prop_assert!((change - bound).abs() <= tolerance || (change - even).abs() <= tolerance);
            }
            previous = level.flow;
        }
        if steps.len() > 1 {
            prop_assert!(steps.iter().all(|s| s.length() >= 5.0 - 1e-9));
        }
    }

    #[test]
    fn prop_unchanged_flow_is_identity(
        paths in prop::collection::vec((polyline(), 0.0f64..100.0), 1..6),
        flow in 0.0f64..20.0,
    ) {
        let input: Vec<GeometricPath> = paths
            .into_iter()
            .enumerate()
            .map(|(i, (points, speed))| GeometricPath::new(points, flow, speed, i))
            .collect();
        let mut state = FlowState::new(1.0, 0.2).unwrap().with_current_flow(flow);
        let output = DiscretizationEngine::new().process(&mut state, &input).unwrap();

        prop_assert_eq!(output.len(), input.len());
        for (sub, path) in output.iter().zip(&input) {
            prop_assert_eq!(&sub.points, &path.points);
            prop_assert_eq!(sub.flow, flow);
            prop_assert_eq!(sub.source, path.source);
        }
    }

    #[test]
    fn prop_stitching_reconstructs_line_string(
        segments in prop::collection::vec(segment_points(), 1..8),
    ) {
        let raw: Vec<RawSegment> = segments.iter().map(|p| RawSegment::new(p, 1.0, 30.0)).collect();
        let paths = stitch_segments(&raw);
        prop_assert_eq!(paths.len(), segments.len());

        let flat: Vec<Point> = segments.iter().flatten().copied().collect();
        let rebuilt: Vec<Point> = paths
            .iter()
            .flat_map(|path| {
                let skip = usize::from(path.prefixed);
                path.points[skip..].to_vec()
            })
            .collect();
        prop_assert_eq!(rebuilt, flat);

        for (i, path) in paths.iter().enumerate().skip(1) {
            if path.prefixed {
                prop_assert_eq!(Some(&path.points[0]), segments[i - 1].last());
            }
        }
    }

    #[test]
    fn prop_wire_geometry_keeps_every_input_point(
        segments in prop::collection::vec(polyline(), 1..5),
        flows in prop::collection::vec(0.0f64..15.0, 5),
        speed in 0.0f64..150.0,
    ) {
        let raw: Vec<RawSegment> = segments
            .iter()
            .enumerate()
            .map(|(i, p)| RawSegment::new(p, flows[i], speed))
            .collect();
        let paths = stitch_segments(&raw);
        let mut state = FlowState::new(2.0, 0.25).unwrap();
        let output = DiscretizationEngine::new().process(&mut state, &paths).unwrap();

        for (index, original) in segments.iter().enumerate() {
            let emitted: Vec<Point> = output
                .iter()
                .filter(|sub| sub.source == index)
                .flat_map(|sub| sub.wire_points().to_vec())
                .collect();
            prop_assert!(is_subsequence(original, &emitted));
            prop_assert_eq!(emitted.last(), original.last());
            prop_assert!(polyline_length(&emitted) + 1e-6 >= polyline_length(original));
        }
    }
}
