//! Evolving poly-line curves.
//!
//! A curve is an ordered run of samples, open or closed. Structural
//! mutations (insert, remove, resample) immediately reconcile each
//! sample's back-reference so the force pipeline can rely on
//! `samples[i].index_in_curve == i` at all times.

use glam::Vec2;

use super::sample::Sample;

/// Role of a curve inside a maze layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveKind {
    /// Outer walls, typically locked
    Boundary,
    /// Openings carved through walls
    Gap,
    /// The growing maze body
    #[default]
    Labyrinth,
    /// A marked path through the maze
    Solution,
}

/// Per-curve evolution parameters.
///
/// The gain factors scale the sampled parameter-field values; 1.0 leaves
/// the field untouched.
#[derive(Debug, Clone)]
pub struct CurveParams {
    /// Brownian force gain
    pub brownian_gain: f32,
    /// Fairing force gain
    pub fairing_gain: f32,
    /// Attraction-repulsion force gain
    pub attraction_gain: f32,
    /// Global sampling density D; desired segment lengths scale with it
    pub density: f32,
    /// Merge threshold factor: segments shorter than k_min * D * delta merge
    pub k_min: f32,
    /// Split threshold factor: segments longer than k_max * D * delta split
    pub k_max: f32,
    /// Segments within this topological distance are excluded from
    /// attraction-repulsion against their own curve
    pub n_min: usize,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            brownian_gain: 1.0,
            fairing_gain: 1.0,
            attraction_gain: 1.0,
            density: 10.0,
            k_min: 0.2,
            k_max: 1.2,
            n_min: 2,
        }
    }
}

/// An ordered sequence of samples forming an open or closed poly-line.
#[derive(Debug, Clone)]
pub struct Curve {
    pub id: u32,
    pub samples: Vec<Sample>,
    pub closed: bool,
    pub kind: CurveKind,
    pub params: CurveParams,
}

impl Curve {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            samples: Vec::new(),
            closed: false,
            kind: CurveKind::default(),
            params: CurveParams::default(),
        }
    }

    /// A closed circle of `count` evenly spaced samples.
    pub fn circle(id: u32, center: Vec2, radius: f32, count: usize) -> Self {
        let mut curve = Self::new(id);
        curve.closed = true;
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let pos = center + Vec2::new(angle.cos(), angle.sin()) * radius;
            curve.add_sample(Sample::new(pos));
        }
        curve
    }

    /// An open line of `count` samples from `start` to `end`.
    pub fn line(id: u32, start: Vec2, end: Vec2, count: usize) -> Self {
        let mut curve = Self::new(id);
        for i in 0..count {
            let t = i as f32 / (count - 1) as f32;
            curve.add_sample(Sample::new(start.lerp(end, t)));
        }
        curve
    }

    /// Append a sample, fixing up its back-references.
    pub fn add_sample(&mut self, mut sample: Sample) {
        sample.curve_id = self.id;
        sample.index_in_curve = self.samples.len();
        self.samples.push(sample);
    }

    /// Insert a sample at `index`, re-indexing everything after it.
    pub fn insert_sample(&mut self, index: usize, mut sample: Sample) {
        sample.curve_id = self.id;
        self.samples.insert(index, sample);
        self.reconcile_indices();
    }

    /// Remove the sample at `index` if it exists.
    pub fn remove_sample(&mut self, index: usize) {
        if index < self.samples.len() {
            self.samples.remove(index);
            self.reconcile_indices();
        }
    }

    /// Restore `samples[i].index_in_curve == i` and the curve id on every
    /// sample.
    pub fn reconcile_indices(&mut self) {
        let id = self.id;
        for (i, sample) in self.samples.iter_mut().enumerate() {
            sample.index_in_curve = i;
            sample.curve_id = id;
        }
    }

    /// Every sample's back-references are consistent.
    pub fn indices_consistent(&self) -> bool {
        self.samples
            .iter()
            .enumerate()
            .all(|(i, s)| s.index_in_curve == i && s.curve_id == self.id)
    }

    /// Number of segments, including the wrap-around segment of a closed
    /// curve with more than two samples.
    pub fn segment_count(&self) -> usize {
        let n = self.samples.len();
        if n < 2 {
            0
        } else if self.closed && n > 2 {
            n
        } else {
            n - 1
        }
    }

    /// Endpoints of segment `i`; the last segment of a closed curve wraps
    /// back to the first sample.
    pub fn segment(&self, i: usize) -> (Vec2, Vec2) {
        let n = self.samples.len();
        let a = self.samples[i].pos;
        let b = self.samples[(i + 1) % n].pos;
        (a, b)
    }

    /// Consecutive sample pairs plus the wrap-around pair when closed.
    pub fn segments(&self) -> Vec<(Vec2, Vec2)> {
        (0..self.segment_count()).map(|i| self.segment(i)).collect()
    }

    /// Total poly-line length.
    pub fn length(&self) -> f32 {
        (0..self.segment_count())
            .map(|i| {
                let (a, b) = self.segment(i);
                a.distance(b)
            })
            .sum()
    }

    /// Closest point on the curve to `point`, or `None` for a curve with no
    /// segments.
    pub fn closest_point(&self, point: Vec2) -> Option<Vec2> {
        let mut best: Option<(f32, Vec2)> = None;
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let candidate = closest_point_on_segment(point, a, b);
            let distance = point.distance(candidate);
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, p)| p)
    }

    /// Index of the segment nearest to `point`, with the distance.
    pub fn nearest_segment(&self, point: Vec2) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let distance = point.distance(closest_point_on_segment(point, a, b));
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best
    }

    /// Index of the sample nearest to `point`, with the distance.
    pub fn nearest_sample(&self, point: Vec2) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, sample) in self.samples.iter().enumerate() {
            let distance = point.distance(sample.pos);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best
    }

    /// Adaptive resampling pass: split over-long segments, then merge
    /// over-short ones.
    ///
    /// Both passes walk from the tail toward the head so that freshly
    /// inserted midpoints are not re-examined within the same pass. Split
    /// runs before merge; the reverse order oscillates across ticks.
    pub fn resample(&mut self) {
        let density = self.params.density;
        let k_max = self.params.k_max;
        let k_min = self.params.k_min;

        // Split pass over interior segments
        let mut i = self.samples.len().saturating_sub(1);
        while i > 0 {
            let current = &self.samples[i - 1];
            let next = &self.samples[i];
            let avg_delta = (current.delta + next.delta) * 0.5;
            let d_max = k_max * density * avg_delta;

            if current.distance_to(next) > d_max {
                let mid = current.pos.lerp(next.pos, 0.5);
                self.insert_sample(i, Sample::with_delta(mid, avg_delta));
            }
            i -= 1;
        }

        // Split the wrap-around segment of a closed curve
        if self.closed && self.samples.len() > 2 {
            let last = &self.samples[self.samples.len() - 1];
            let first = &self.samples[0];
            let avg_delta = (last.delta + first.delta) * 0.5;
            let d_max = k_max * density * avg_delta;

            if last.distance_to(first) > d_max {
                let mid = last.pos.lerp(first.pos, 0.5);
                self.add_sample(Sample::with_delta(mid, avg_delta));
            }
        }

        // Merge pass over interior samples
        let mut i = self.samples.len().saturating_sub(2);
        while i > 0 {
            let prev = &self.samples[i - 1];
            let current = &self.samples[i];
            let next = &self.samples[i + 1];
            let avg_delta = (prev.delta + current.delta + next.delta) / 3.0;
            let d_min = k_min * density * avg_delta;

            if !current.locked
                && (current.distance_to(prev) < d_min || current.distance_to(next) < d_min)
            {
                self.remove_sample(i);
            }
            i -= 1;
        }
    }
}

/// Project `point` onto the segment `(a, b)` and return the closest point.
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq == 0.0 {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sample_sets_back_references() {
        let mut curve = Curve::new(7);
        curve.add_sample(Sample::new(Vec2::ZERO));
        curve.add_sample(Sample::new(Vec2::new(10.0, 0.0)));

        assert!(curve.indices_consistent());
        assert_eq!(curve.samples[1].curve_id, 7);
    }

    #[test]
    fn test_insert_and_remove_reconcile_indices() {
        let mut curve = Curve::line(0, Vec2::ZERO, Vec2::new(30.0, 0.0), 4);
        curve.insert_sample(2, Sample::new(Vec2::new(15.0, 5.0)));
        assert!(curve.indices_consistent());
        assert_eq!(curve.samples.len(), 5);

        curve.remove_sample(2);
        assert!(curve.indices_consistent());
        assert_eq!(curve.samples.len(), 4);
    }

    #[test]
    fn test_segment_count_open_vs_closed() {
        let open = Curve::line(0, Vec2::ZERO, Vec2::new(30.0, 0.0), 4);
        assert_eq!(open.segment_count(), 3);

        let closed = Curve::circle(1, Vec2::ZERO, 10.0, 4);
        assert_eq!(closed.segment_count(), 4);

        // A closed two-sample "curve" has no wrap segment
        let mut tiny = Curve::new(2);
        tiny.closed = true;
        tiny.add_sample(Sample::new(Vec2::ZERO));
        tiny.add_sample(Sample::new(Vec2::new(5.0, 0.0)));
        assert_eq!(tiny.segment_count(), 1);
    }

    #[test]
    fn test_circle_generator_radius() {
        let curve = Curve::circle(0, Vec2::new(50.0, 50.0), 25.0, 16);
        for sample in &curve.samples {
            let r = sample.pos.distance(Vec2::new(50.0, 50.0));
            assert!((r - 25.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_segments_enumeration_includes_wrap() {
        let closed = Curve::circle(0, Vec2::ZERO, 10.0, 4);
        let segments = closed.segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[3].1, closed.samples[0].pos, "wrap segment closes the loop");
    }

    #[test]
    fn test_closest_point_on_curve() {
        let curve = Curve::line(0, Vec2::ZERO, Vec2::new(100.0, 0.0), 5);
        let closest = curve.closest_point(Vec2::new(40.0, 30.0)).unwrap();
        assert!((closest - Vec2::new(40.0, 0.0)).length() < 1e-4);

        let empty = Curve::new(1);
        assert!(empty.closest_point(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_closest_point_on_segment_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(Vec2::new(-5.0, 3.0), a, b), a);
        assert_eq!(closest_point_on_segment(Vec2::new(50.0, 3.0), a, b), b);
        assert_eq!(
            closest_point_on_segment(Vec2::new(4.0, 3.0), a, b),
            Vec2::new(4.0, 0.0)
        );
    }

    #[test]
    fn test_closest_point_handles_degenerate_segment() {
        let a = Vec2::new(5.0, 5.0);
        assert_eq!(closest_point_on_segment(Vec2::new(9.0, 9.0), a, a), a);
    }

    #[test]
    fn test_resample_splits_long_segment() {
        // Segment of length 50 with delta 1, D=10, k_max=1.2 -> d_max=12
        let mut curve = Curve::line(0, Vec2::ZERO, Vec2::new(50.0, 0.0), 2);
        curve.resample();
        assert!(
            curve.samples.len() > 2,
            "50px segment must split, still {} samples",
            curve.samples.len()
        );
        assert!(curve.indices_consistent());
    }

    #[test]
    fn test_resample_merges_short_segments() {
        // Samples 1px apart with d_min = 0.2 * 10 * 1 = 2
        let mut curve = Curve::new(0);
        for i in 0..5 {
            curve.add_sample(Sample::new(Vec2::new(i as f32, 0.0)));
        }
        curve.resample();
        assert!(
            curve.samples.len() < 5,
            "1px segments must merge, still {} samples",
            curve.samples.len()
        );
        assert!(curve.indices_consistent());
    }

    #[test]
    fn test_resample_never_removes_locked_samples() {
        let mut curve = Curve::new(0);
        for i in 0..5 {
            let mut sample = Sample::new(Vec2::new(i as f32, 0.0));
            sample.locked = true;
            curve.add_sample(sample);
        }
        curve.resample();
        assert_eq!(curve.samples.len(), 5);
    }

    #[test]
    fn test_resample_leaves_equilibrium_curve_alone() {
        // Circle of radius 100 with 40 samples: segment length ~15.7,
        // inside (k_min*D, k_max*D) = (4, 24) for D=20
        let mut curve = Curve::circle(0, Vec2::ZERO, 100.0, 40);
        curve.params.density = 20.0;
        let before: Vec<Vec2> = curve.samples.iter().map(|s| s.pos).collect();

        curve.resample();
        let after: Vec<Vec2> = curve.samples.iter().map(|s| s.pos).collect();
        assert_eq!(before, after, "equilibrium circle must not resample");
    }
}
