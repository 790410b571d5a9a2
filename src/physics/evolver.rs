//! Curve-evolution engine.
//!
//! Per tick, every sample of every curve receives three forces in order:
//! Brownian noise, weighted-Laplacian fairing, and a Lennard-Jones
//! attraction-repulsion against nearby curve segments, the last warped by
//! the anisotropy field gradient. Forces are applied to positions
//! immediately (later samples in the pass see earlier corrections), then a
//! Verlet pass advances every sample, then each curve resamples
//! adaptively.
//!
//! Force strengths are read from parameter fields sampled at the sample's
//! position and scaled by per-curve gains, so evolution behavior can vary
//! across the world rectangle.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::config::{EngineConfig, EvolutionConfig};
use crate::field::ParameterField;
use crate::geometry::{closest_point_on_segment, Curve};
use crate::spatial::SpatialIndex;

/// Drives the evolution of all curves; owns the parameter fields and the
/// noise RNG.
pub struct CurveEvolver {
    pub config: EvolutionConfig,
    /// Brownian strength field fB
    pub brownian_field: ParameterField,
    /// Fairing strength field fF
    pub fairing_field: ParameterField,
    /// Attraction-repulsion strength field fA
    pub attraction_field: ParameterField,
    /// Local scale field delta
    pub delta_field: ParameterField,
    /// Anisotropy field fg; its gradient steers curve growth
    pub anisotropy_field: ParameterField,
    rng: StdRng,
    index: SpatialIndex<usize>,
    index_dirty: bool,
    query_scratch: Vec<(Vec2, usize)>,
}

impl CurveEvolver {
    pub fn new(engine: &EngineConfig, config: EvolutionConfig) -> Self {
        let res = config.field_resolution;
        let (w, h) = (engine.width, engine.height);
        let field = |value: f32| ParameterField::new(res, res, 0.0, 0.0, w, h, value);

        Self {
            brownian_field: field(config.default_brownian),
            fairing_field: field(config.default_fairing),
            attraction_field: field(config.default_attraction),
            delta_field: field(config.default_delta),
            anisotropy_field: field(config.default_anisotropy),
            rng: StdRng::seed_from_u64(engine.rng_seed),
            index: SpatialIndex::new(engine.cell_size),
            index_dirty: false,
            query_scratch: Vec::new(),
            config,
        }
    }

    /// Reseed the noise source, resetting the random sequence.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// The spatial index no longer reflects sample positions.
    pub fn index_dirty(&self) -> bool {
        self.index_dirty
    }

    /// Advance every curve by one fixed timestep.
    pub fn evolve(&mut self, curves: &mut [Curve], dt: f32) {
        self.rebuild_index(curves);

        // Force pass: sequential, in curve and sample order
        for ci in 0..curves.len() {
            for si in 0..curves[ci].samples.len() {
                if curves[ci].samples[si].locked {
                    continue;
                }
                let force = self.total_force(curves, ci, si);
                curves[ci].samples[si].apply_force(force * dt);
            }
        }

        // Verlet pass
        for curve in curves.iter_mut() {
            for sample in curve.samples.iter_mut() {
                sample.verlet();
            }
        }

        // Resample pass; topology may change, so the index goes stale
        for curve in curves.iter_mut() {
            curve.resample();
        }
        self.index_dirty = true;
    }

    /// Rebuild the sample index from current positions.
    pub fn rebuild_index(&mut self, curves: &[Curve]) {
        self.index.clear();
        for (ci, curve) in curves.iter().enumerate() {
            for sample in &curve.samples {
                self.index.insert(sample.pos, ci);
            }
        }
        self.index_dirty = false;
    }

    fn total_force(&mut self, curves: &[Curve], ci: usize, si: usize) -> Vec2 {
        let brownian = self.brownian_force(curves, ci, si);
        let fairing = self.fairing_force(curves, ci, si);
        let attraction = self.attraction_repulsion_force(curves, ci, si);
        let warped = self.apply_anisotropy(curves[ci].samples[si].pos, attraction);
        brownian + fairing + warped
    }

    /// Brownian force: per-component Gaussian noise scaled by the Brownian
    /// field and the local scale.
    fn brownian_force(&mut self, curves: &[Curve], ci: usize, si: usize) -> Vec2 {
        let pos = curves[ci].samples[si].pos;
        let f_b = self.brownian_field.sample_at(pos) * curves[ci].params.brownian_gain;
        if f_b <= 0.0 {
            return Vec2::ZERO;
        }

        let delta = self.delta_field.sample_at(pos);
        let sigma = self.config.sigma;
        let dx: f32 = self.rng.sample::<f32, _>(StandardNormal) * sigma;
        let dy: f32 = self.rng.sample::<f32, _>(StandardNormal) * sigma;
        Vec2::new(dx, dy) * f_b * delta
    }

    /// Weighted-Laplacian fairing force.
    ///
    /// The target point is the delta-weighted mean of the two neighbors;
    /// the cross-weighting (previous neighbor weighted by the next
    /// neighbor's delta and vice versa) biases the pull toward the
    /// neighbor with the smaller scale, contracting high-detail regions.
    fn fairing_force(&self, curves: &[Curve], ci: usize, si: usize) -> Vec2 {
        let curve = &curves[ci];
        let pos = curve.samples[si].pos;
        let f_f = self.fairing_field.sample_at(pos) * curve.params.fairing_gain;
        if f_f <= 0.0 {
            return Vec2::ZERO;
        }

        let n = curve.samples.len();
        let (prev, next) = if curve.closed {
            if n < 3 {
                return Vec2::ZERO;
            }
            (&curve.samples[(si + n - 1) % n], &curve.samples[(si + 1) % n])
        } else {
            // Endpoints of an open curve contribute no fairing
            if si == 0 || si + 1 >= n {
                return Vec2::ZERO;
            }
            (&curve.samples[si - 1], &curve.samples[si + 1])
        };

        let delta_prev = self.delta_field.sample_at(prev.pos);
        let delta_next = self.delta_field.sample_at(next.pos);
        let delta_sum = delta_prev + delta_next;
        if delta_sum <= 0.0 {
            return Vec2::ZERO;
        }

        let target = (prev.pos * delta_next + next.pos * delta_prev) / delta_sum;
        (target - pos) * f_f
    }

    /// Lennard-Jones attraction-repulsion against nearby curve segments.
    fn attraction_repulsion_force(&mut self, curves: &[Curve], ci: usize, si: usize) -> Vec2 {
        let curve = &curves[ci];
        let sample = &curve.samples[si];
        if sample.ignore_neighbors {
            return Vec2::ZERO;
        }

        let pos = sample.pos;
        let f_a = self.attraction_field.sample_at(pos) * curve.params.attraction_gain;
        if f_a <= 0.0 {
            return Vec2::ZERO;
        }

        let delta = self.delta_field.sample_at(pos);
        let r1 = self.config.k1 * delta;

        // Curves with any sample inside the query radius, first-seen order
        let mut scratch = std::mem::take(&mut self.query_scratch);
        self.index.query_radius(pos.x, pos.y, r1, &mut scratch);
        let mut nearby: Vec<usize> = Vec::new();
        for &(_, slot) in &scratch {
            if !nearby.contains(&slot) {
                nearby.push(slot);
            }
        }
        self.query_scratch = scratch;

        let sigma_lj = self.config.sigma_lj;
        let clamp = self.config.kernel_clamp;
        let epsilon = self.config.singularity_epsilon;
        let n_min = curve.params.n_min;

        let mut total = Vec2::ZERO;
        for &slot in &nearby {
            let other = &curves[slot];
            let same_curve = slot == ci;
            let sample_count = other.samples.len();

            for seg in 0..other.segment_count() {
                if same_curve {
                    let raw = seg.abs_diff(si);
                    let topo = if other.closed {
                        raw.min(sample_count - raw)
                    } else {
                        raw
                    };
                    if topo <= n_min {
                        continue;
                    }
                }

                let (a, b) = other.segment(seg);
                let closest = closest_point_on_segment(pos, a, b);
                let r = pos.distance(closest);
                if r >= r1 || r < epsilon {
                    continue;
                }

                // w(r) = (sigma/r)^12 - (sigma/r)^6, clamped
                let s_over_r = sigma_lj / r;
                let s6 = s_over_r.powi(6);
                let w = (s6 * s6 - s6).clamp(-clamp, clamp);

                total += (pos - closest) / r * (w * f_a);
            }
        }
        total
    }

    /// Double the component of `force` aligned with the anisotropy
    /// gradient.
    fn apply_anisotropy(&self, pos: Vec2, force: Vec2) -> Vec2 {
        let gradient = self.anisotropy_field.gradient_at(pos);
        if gradient.length() < self.config.gradient_epsilon {
            return force;
        }
        let g_hat = gradient.normalize();
        force + g_hat * g_hat.dot(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Sample;

    fn quiet_config() -> EvolutionConfig {
        EvolutionConfig {
            default_brownian: 0.0,
            default_fairing: 0.0,
            default_attraction: 0.0,
            ..EvolutionConfig::default()
        }
    }

    fn evolver_with(config: EvolutionConfig) -> CurveEvolver {
        CurveEvolver::new(&EngineConfig::default(), config)
    }

    #[test]
    fn test_all_forces_off_leaves_curve_unchanged() {
        let mut evolver = evolver_with(quiet_config());
        let mut curve = Curve::circle(0, Vec2::new(600.0, 400.0), 100.0, 40);
        curve.params.density = 20.0;
        let before: Vec<Vec2> = curve.samples.iter().map(|s| s.pos).collect();

        let mut curves = vec![curve];
        evolver.evolve(&mut curves, 1.0 / 60.0);

        let after: Vec<Vec2> = curves[0].samples.iter().map(|s| s.pos).collect();
        assert_eq!(before, after);
        assert!(curves[0].indices_consistent());
    }

    #[test]
    fn test_fairing_pulls_toward_neighbor_midpoint() {
        let config = EvolutionConfig {
            default_fairing: 1.0,
            ..quiet_config()
        };
        let mut evolver = evolver_with(config);

        let mut curve = Curve::new(0);
        curve.closed = true;
        curve.add_sample(Sample::new(Vec2::new(0.0, 0.0)));
        curve.add_sample(Sample::new(Vec2::new(10.0, 0.0)));
        curve.add_sample(Sample::new(Vec2::new(5.0, 10.0)));
        // Keep resampling out of the picture
        curve.params.density = 100.0;

        let perimeter_before = curve.length();
        let mut curves = vec![curve];
        evolver.evolve(&mut curves, 1.0 / 60.0);

        let perimeter_after = curves[0].length();
        assert!(
            perimeter_after < perimeter_before,
            "fairing must shrink the triangle: {} -> {}",
            perimeter_before,
            perimeter_after
        );
    }

    #[test]
    fn test_brownian_jitters_samples() {
        let config = EvolutionConfig {
            default_brownian: 5.0,
            ..quiet_config()
        };
        let mut evolver = evolver_with(config);
        let mut curves = vec![Curve::circle(0, Vec2::new(600.0, 400.0), 100.0, 20)];
        let before: Vec<Vec2> = curves[0].samples.iter().map(|s| s.pos).collect();

        evolver.evolve(&mut curves, 1.0);
        let moved = curves[0]
            .samples
            .iter()
            .zip(&before)
            .any(|(s, b)| s.pos.distance(*b) > 1e-6);
        assert!(moved, "Brownian noise must perturb at least one sample");
    }

    #[test]
    fn test_identical_seeds_give_identical_runs() {
        let config = EvolutionConfig {
            default_brownian: 1.0,
            default_fairing: 0.5,
            ..EvolutionConfig::default()
        };
        let run = || {
            let mut evolver = evolver_with(config.clone());
            let mut curves = vec![Curve::circle(0, Vec2::new(600.0, 400.0), 100.0, 30)];
            for _ in 0..20 {
                evolver.evolve(&mut curves, 1.0 / 60.0);
            }
            curves[0].samples.iter().map(|s| s.pos).collect::<Vec<_>>()
        };

        assert_eq!(run(), run(), "same seed, same state, same history");
    }

    #[test]
    fn test_evolve_marks_index_dirty() {
        let mut evolver = evolver_with(quiet_config());
        let mut curves = vec![Curve::circle(0, Vec2::new(600.0, 400.0), 100.0, 20)];
        assert!(!evolver.index_dirty());
        evolver.evolve(&mut curves, 1.0 / 60.0);
        assert!(evolver.index_dirty());

        evolver.rebuild_index(&curves);
        assert!(!evolver.index_dirty());
    }

    #[test]
    fn test_locked_samples_do_not_move() {
        let config = EvolutionConfig {
            default_brownian: 5.0,
            default_fairing: 1.0,
            ..quiet_config()
        };
        let mut evolver = evolver_with(config);
        let mut curve = Curve::circle(0, Vec2::new(600.0, 400.0), 100.0, 20);
        let pinned = curve.samples[3].pos;
        curve.samples[3].locked = true;
        let mut curves = vec![curve];

        for _ in 0..10 {
            evolver.evolve(&mut curves, 1.0 / 60.0);
        }
        assert_eq!(curves[0].samples[3].pos, pinned);
    }

    #[test]
    fn test_anisotropy_doubles_aligned_component() {
        let mut config = quiet_config();
        config.default_anisotropy = 0.0;
        let mut evolver = evolver_with(config);
        // Ramp in x: gradient points along +x
        evolver.anisotropy_field.fill_procedural(|x, _| x);

        let force = Vec2::new(2.0, 3.0);
        let warped = evolver.apply_anisotropy(Vec2::new(600.0, 400.0), force);
        assert!((warped.x - 4.0).abs() < 1e-3, "x component doubled, got {}", warped.x);
        assert!((warped.y - 3.0).abs() < 1e-3, "y component untouched, got {}", warped.y);
    }
}
