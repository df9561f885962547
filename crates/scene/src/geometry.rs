use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// Number of particles in the star cloud.
pub const PARTICLE_COUNT: usize = 5000;

/// Spread factor of the particle sampler; coordinates stay within ±spread/2.
pub const PARTICLE_SPREAD: f32 = 5.0;

/// Generate the vertices of a torus lying in the XY plane.
///
/// Emits `(radial_segments + 1) * (tubular_segments + 1)` points; the seam
/// rows and columns are duplicated, as a mesh generator would.
pub fn torus_points(
    radius: f32,
    tube: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> Vec<Vec3> {
    let mut points =
        Vec::with_capacity((radial_segments as usize + 1) * (tubular_segments as usize + 1));

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        let (sin_v, cos_v) = v.sin_cos();
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let (sin_u, cos_u) = u.sin_cos();
            let ring = radius + tube * cos_v;
            points.push(Vec3::new(ring * cos_u, ring * sin_u, tube * sin_v));
        }
    }
    points
}

/// Sample one particle coordinate as `(u1 - 0.5) * (u2 * spread)`.
///
/// The product of two uniforms clusters values near zero.
pub fn sample_coordinate<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.random();
    let u2: f32 = rng.random();
    (u1 - 0.5) * (u2 * PARTICLE_SPREAD)
}

/// Scatter `count` particles, each axis sampled independently.
pub fn particle_cloud<R: Rng>(rng: &mut R, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            let x = sample_coordinate(rng);
            let y = sample_coordinate(rng);
            let z = sample_coordinate(rng);
            Vec3::new(x, y, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn torus_point_count() {
        let points = torus_points(0.7, 0.2, 16, 100);
        assert_eq!(points.len(), 17 * 101);
    }

    #[test]
    fn torus_points_lie_on_surface() {
        for p in torus_points(0.7, 0.2, 16, 100) {
            let ring = (p.x * p.x + p.y * p.y).sqrt();
            let d = ((ring - 0.7).powi(2) + p.z * p.z).sqrt();
            assert!((d - 0.2).abs() < 1e-4, "point {p} is {d} from the tube centre");
            assert!((0.5 - 1e-4..=0.9 + 1e-4).contains(&ring));
        }
    }

    #[test]
    fn torus_seam_is_duplicated() {
        let points = torus_points(1.0, 0.25, 4, 8);
        // first and last point of each ring coincide
        for ring in points.chunks(9) {
            assert!(ring[0].abs_diff_eq(ring[8], 1e-5));
        }
    }

    #[test]
    fn particle_count_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let stars = particle_cloud(&mut rng, PARTICLE_COUNT);
        assert_eq!(stars.len(), 5000);
        for p in &stars {
            for c in p.to_array() {
                assert!(c > -2.5 && c < 2.5, "coordinate {c} out of range");
            }
        }
    }

    #[test]
    fn particles_cluster_near_origin() {
        let mut rng = StdRng::seed_from_u64(11);
        let stars = particle_cloud(&mut rng, PARTICLE_COUNT);
        let near = stars
            .iter()
            .flat_map(|p| p.to_array())
            .filter(|c| c.abs() < 0.5)
            .count();
        // a uniform spread over (-2.5, 2.5) would put 20% here
        assert!(near as f32 / (PARTICLE_COUNT * 3) as f32 > 0.4);
    }

    #[test]
    fn seeded_clouds_are_reproducible() {
        let a = particle_cloud(&mut StdRng::seed_from_u64(3), 100);
        let b = particle_cloud(&mut StdRng::seed_from_u64(3), 100);
        assert_eq!(a, b);
    }
}
