//! Tests for hotspot seeding and the flood-fill spread rule

#[cfg(test)]
mod tests {
    use avgphoto::artifact::FrequencyField;
    use avgphoto::artifact::flood::{
        flood_fill, grid_positions, hotspot_seeds, magnitude_ratio, mirror,
    };
    use avgphoto::artifact::spectrum::{forward, inverse};
    use avgphoto::io::configuration::ArtifactSettings;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rustfft::num_complex::Complex;
    use std::collections::HashSet;

    fn uniform_field(size: usize, magnitude: f64) -> FrequencyField {
        Array3::from_elem((size, size, 3), Complex::new(magnitude, 0.0))
    }

    fn settings(blocks: usize, ratio_threshold: f64) -> ArtifactSettings {
        ArtifactSettings {
            blocks,
            ratio_threshold,
        }
    }

    // Tests grid spacing is length / blocks starting from zero
    // Verified by starting the grid at one spacing
    #[test]
    fn test_grid_positions_spacing() {
        assert_eq!(grid_positions(16, 8), vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_eq!(grid_positions(1024, 8).get(1), Some(&128));
    }

    // Tests short axes collapse duplicate positions and stay in bounds
    // Verified by removing the dedup
    #[test]
    fn test_grid_positions_short_axis() {
        assert_eq!(grid_positions(3, 8), vec![0, 1, 2]);
        assert!(grid_positions(0, 8).is_empty());
        assert!(grid_positions(5, 0).is_empty());
    }

    // Tests DC is excluded from the seeds while axis points are kept
    // Verified by seeding DC as well
    #[test]
    fn test_hotspot_seeds_exclude_dc() {
        let seeds = hotspot_seeds(16, 16, 2);
        assert_eq!(seeds, vec![(0, 8), (8, 0), (8, 8)]);
        assert_eq!(hotspot_seeds(16, 16, 8).len(), 63);
    }

    // Tests the ratio takes the strongest channel and handles zero magnitudes
    // Verified by averaging channels
    #[test]
    fn test_magnitude_ratio() {
        assert!((magnitude_ratio(&[1.0, 3.0, 2.0], &[4.0, 4.0, 4.0]) - 0.75).abs() < 1e-12);
        assert_eq!(magnitude_ratio(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(magnitude_ratio(&[1.0, 0.0], &[0.0, 2.0]), f64::INFINITY);
    }

    // Tests equal neighbors stop the fill at the seeds
    // Verified by comparing with <= instead of <
    #[test]
    fn test_uniform_field_nulls_only_seeds() {
        let mut field = uniform_field(16, 1.0);
        let report = flood_fill(&mut field, &settings(8, 0.5));

        assert_eq!(report.seeds, 63);
        let mut nulled = report.nulled.clone();
        nulled.sort_unstable();
        assert_eq!(nulled, hotspot_seeds(16, 16, 8));
        assert_eq!(field[[0, 0, 0]], Complex::new(1.0, 0.0));
        assert_eq!(field[[1, 1, 2]], Complex::new(1.0, 0.0));
        assert_eq!(field[[2, 2, 2]], Complex::new(0.0, 0.0));
    }

    // Tests axis seeds are zeroed but never spread while interior seeds spread
    // Verified by expanding from axis coordinates
    #[test]
    fn test_axis_seeds_do_not_spread() {
        let mut field = uniform_field(16, 1.0);
        for channel in 0..3 {
            field[[1, 8, channel]] = Complex::new(0.1, 0.0);
            field[[7, 8, channel]] = Complex::new(0.0, 0.1);
        }

        let report = flood_fill(&mut field, &settings(2, 0.5));

        let nulled: HashSet<_> = report.nulled.iter().copied().collect();
        let expected: HashSet<_> = [(0, 8), (8, 0), (8, 8), (7, 8), (9, 8)].into_iter().collect();
        assert_eq!(nulled, expected);
        assert_eq!(field[[1, 8, 0]], Complex::new(0.1, 0.0));
        assert_eq!(field[[7, 8, 1]], Complex::new(0.0, 0.0));
        assert_eq!(field[[9, 8, 2]], Complex::new(0.0, 0.0));
    }

    // Tests a spreading fill visits each coordinate once and never touches DC
    // Verified by marking visited on dequeue instead of enqueue
    #[test]
    fn test_random_field_visits_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field: FrequencyField = Array3::from_shape_fn((32, 24, 3), |_| {
            Complex::new(rng.random::<f64>(), rng.random::<f64>())
        });
        let dc = field[[0, 0, 1]];

        let report = flood_fill(&mut field, &settings(8, 2.0));

        let unique: HashSet<_> = report.nulled.iter().copied().collect();
        assert_eq!(unique.len(), report.nulled.len());
        assert!(report.nulled.len() > report.seeds);
        assert!(!unique.contains(&(0, 0)));
        for &(row, col) in &report.nulled {
            for channel in 0..3 {
                assert_eq!(field[[row, col, channel]], Complex::new(0.0, 0.0));
            }
        }
        assert_eq!(field[[0, 0, 1]], dc);
    }

    // Tests the mirror pairs each frequency with its negation and fixes DC
    // Verified by mirroring without the modulo
    #[test]
    fn test_mirror() {
        assert_eq!(mirror(0, 0, 16, 12), (0, 0));
        assert_eq!(mirror(3, 5, 16, 12), (13, 7));
        assert_eq!(mirror(0, 6, 16, 12), (0, 6));
        assert_eq!(mirror(8, 0, 16, 12), (8, 0));
    }

    // Tests filling the spectrum of a real image keeps it conjugate symmetric
    // Verified by zeroing coordinates without their mirrors
    #[test]
    fn test_real_spectrum_stays_symmetric() {
        let (height, width) = (32, 24);
        let mut rng = StdRng::seed_from_u64(11);
        let image = Array3::from_shape_fn((height, width, 3), |_| rng.random::<f64>());
        let mut field = forward(&image);

        let report = flood_fill(&mut field, &settings(8, 2.0));

        let nulled: HashSet<_> = report.nulled.iter().copied().collect();
        assert!(nulled.len() > report.seeds);
        for &(row, col) in &nulled {
            assert!(nulled.contains(&mirror(row, col, height, width)));
        }
        for ((row, col, channel), value) in field.indexed_iter() {
            let (mirror_row, mirror_col) = mirror(row, col, height, width);
            let partner = field[[mirror_row, mirror_col, channel]].conj();
            assert!((value - partner).norm() < 1e-9, "asymmetric at ({row}, {col})");
        }

        // Dropping imaginary parts loses nothing, so the round trip is exact
        let restored = forward(&inverse(&field));
        for (a, b) in field.iter().zip(restored.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    // Tests a zero threshold never spreads
    // Verified by spreading on equality
    #[test]
    fn test_zero_threshold_only_seeds() {
        let mut field = uniform_field(8, 0.0);
        let report = flood_fill(&mut field, &settings(4, 0.0));
        assert_eq!(report.nulled.len(), report.seeds);
    }
}
