//! Tests for the round loop, merging and crash-consistent persistence

#[cfg(test)]
mod tests {
    use crate::support::{write_corrupt, write_solid_png};
    use avgphoto::AverageError;
    use avgphoto::accumulate::coordinator::merge_partials;
    use avgphoto::accumulate::{
        Coordinator, FailedItem, PartialResult, Phase, RoundReport, zeroed_buffer,
    };
    use avgphoto::io::configuration::{AccumulateSettings, LINEAR_FULL_SCALE};
    use avgphoto::io::progress::RoundProgress;
    use avgphoto::io::storage::BufferStore;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn settings(base: &Path, workers: usize, batch_size: usize) -> AccumulateSettings {
        let mut settings = AccumulateSettings::rooted_at(base);
        settings.suffix = ".png".to_string();
        settings.canvas_size = 2;
        settings.workers = workers;
        settings.batch_size = batch_size;
        settings
    }

    fn partial(value: u64, completed: &[&str], failed: &[&str]) -> PartialResult {
        PartialResult {
            buffer: zeroed_buffer(2).mapv(|_: u64| value),
            completed: completed.iter().map(ToString::to_string).collect(),
            failed: failed
                .iter()
                .map(|name| FailedItem {
                    name: (*name).to_string(),
                    reason: "corrupt".to_string(),
                })
                .collect(),
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    // Tests merging sums every partial and concatenates the name lists
    // Verified by keeping only the last partial
    #[test]
    fn test_merge_partials_sums() {
        let mut global = zeroed_buffer(2).mapv(|_: u64| 1);
        let merged = merge_partials(
            &mut global,
            vec![partial(2, &["a"], &[]), partial(3, &["b"], &["c"])],
        )
        .unwrap();

        assert!(global.iter().all(|&v| v == 6));
        assert_eq!(merged.completed, vec!["a", "b"]);
        assert_eq!(merged.failed.len(), 1);
    }

    // Tests a partial buffer of the wrong shape is rejected
    // Verified by broadcasting instead of checking shape
    #[test]
    fn test_merge_partials_shape_mismatch() {
        let mut global = zeroed_buffer(3);
        let error = merge_partials(&mut global, vec![partial(1, &["a"], &[])]).unwrap_err();
        assert!(matches!(error, AverageError::BufferShape { .. }));
    }

    // Tests overflow is reported rather than wrapped
    // Verified by using wrapping_add
    #[test]
    fn test_merge_partials_overflow() {
        let mut global = zeroed_buffer(2).mapv(|_: u64| u64::MAX);
        let error = merge_partials(&mut global, vec![partial(1, &[], &[])]).unwrap_err();
        assert!(matches!(error, AverageError::Computation { .. }));
    }

    // Tests invalid settings are rejected before touching the filesystem
    // Verified by creating directories before validation
    #[test]
    fn test_open_rejects_invalid_settings() {
        let dir = TempDir::new().unwrap();
        let result = Coordinator::open(settings(dir.path(), 0, 1), RoundProgress::hidden());

        assert!(matches!(result, Err(AverageError::InvalidParameter { .. })));
        assert!(!dir.path().join("downloads").exists());
    }

    // Tests a persisted buffer of another canvas size is refused
    // Verified by resizing the loaded buffer silently
    #[test]
    fn test_open_rejects_foreign_buffer() {
        let dir = TempDir::new().unwrap();
        let store = BufferStore::new(dir.path().join("sum.npy"));
        store.save(&zeroed_buffer(4)).unwrap();

        let result = Coordinator::open(settings(dir.path(), 1, 1), RoundProgress::hidden());

        assert!(matches!(result, Err(AverageError::BufferShape { .. })));
    }

    // Tests an empty input directory finishes immediately with a zero buffer
    // Verified by running one empty round
    #[test]
    fn test_run_on_empty_input() {
        let dir = TempDir::new().unwrap();
        let mut coordinator =
            Coordinator::open(settings(dir.path(), 2, 4), RoundProgress::hidden()).unwrap();

        let summary = coordinator.run().unwrap();

        assert_eq!(summary.rounds, 0);
        assert_eq!(coordinator.phase(), Phase::Done);
        assert!(coordinator.buffer().iter().all(|&v| v == 0));
    }

    // Tests one round sums, persists and relocates every dispatched file
    // Verified by relocating before the buffer is saved
    #[test]
    fn test_round_persists_then_relocates() {
        let dir = TempDir::new().unwrap();
        let config = settings(dir.path(), 2, 1);
        let input = config.input_dir.clone();
        fs::create_dir_all(&input).unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            write_solid_png(&input, name, 2, 2, [255, 255, 255]);
        }
        fs::write(input.join("notes.txt"), b"skip").unwrap();

        let mut coordinator = Coordinator::open(config, RoundProgress::hidden()).unwrap();
        let report = coordinator.run_round().unwrap().unwrap();

        assert_eq!(
            report,
            RoundReport {
                round: 1,
                dispatched: 2,
                summed: 2,
                failed: 0,
            }
        );
        assert_eq!(coordinator.phase(), Phase::Draining);
        assert_eq!(file_names(&input), vec!["c.png", "notes.txt"]);
        assert_eq!(
            file_names(&dir.path().join("completed")),
            vec!["a.png", "b.png"]
        );

        let persisted = BufferStore::new(dir.path().join("sum.npy"))
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(&persisted, coordinator.buffer());
        assert!(persisted.iter().all(|&v| v == 2 * LINEAR_FULL_SCALE));
    }

    // Tests corrupt inputs move to the failed directory and do not abort the run
    // Verified by propagating decode errors from workers
    #[test]
    fn test_run_moves_corrupt_files_aside() {
        let dir = TempDir::new().unwrap();
        let config = settings(dir.path(), 2, 8);
        let input = config.input_dir.clone();
        fs::create_dir_all(&input).unwrap();
        write_solid_png(&input, "good.png", 2, 2, [0, 255, 0]);
        write_corrupt(&input, "bad.png");

        let mut coordinator = Coordinator::open(config, RoundProgress::hidden()).unwrap();
        let summary = coordinator.run().unwrap();

        assert_eq!((summary.rounds, summary.summed, summary.failed), (1, 1, 1));
        assert!(file_names(&input).is_empty());
        assert_eq!(file_names(&dir.path().join("failed")), vec!["bad.png"]);
        assert_eq!(file_names(&dir.path().join("completed")), vec!["good.png"]);
    }

    // Tests a failed save leaves every file pending and the buffer unchanged
    // Verified by swapping in the staged buffer before saving
    #[test]
    fn test_persist_failure_keeps_files_pending() {
        let dir = TempDir::new().unwrap();
        let mut config = settings(dir.path(), 1, 4);
        config.buffer_path = dir.path().join("missing").join("sum.npy");
        let input = config.input_dir.clone();
        fs::create_dir_all(&input).unwrap();
        write_solid_png(&input, "a.png", 2, 2, [255, 255, 255]);

        let mut coordinator = Coordinator::open(config, RoundProgress::hidden()).unwrap();
        let error = coordinator.run_round().unwrap_err();

        assert!(matches!(error, AverageError::FileSystem { .. }));
        assert_eq!(coordinator.phase(), Phase::Persisting);
        assert_eq!(file_names(&input), vec!["a.png"]);
        assert!(coordinator.buffer().iter().all(|&v| v == 0));
    }

    // Tests a later run resumes from the persisted buffer
    // Verified by starting each run from zero
    #[test]
    fn test_resume_adds_to_persisted_buffer() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("downloads");
        fs::create_dir_all(&input).unwrap();

        write_solid_png(&input, "a.png", 2, 2, [255, 255, 255]);
        let mut first =
            Coordinator::open(settings(dir.path(), 1, 4), RoundProgress::hidden()).unwrap();
        first.run().unwrap();

        write_solid_png(&input, "b.png", 2, 2, [255, 255, 255]);
        let mut second =
            Coordinator::open(settings(dir.path(), 1, 4), RoundProgress::hidden()).unwrap();
        let summary = second.run().unwrap();

        assert_eq!(summary.summed, 1);
        assert!(
            second
                .into_buffer()
                .iter()
                .all(|&v| v == 2 * LINEAR_FULL_SCALE)
        );
    }

    // Tests a rerun with nothing pending leaves the buffer unchanged
    // Verified by re-summing the completed directory
    #[test]
    fn test_rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("downloads");
        fs::create_dir_all(&input).unwrap();
        write_solid_png(&input, "a.png", 2, 2, [10, 20, 30]);

        let mut first =
            Coordinator::open(settings(dir.path(), 2, 2), RoundProgress::hidden()).unwrap();
        first.run().unwrap();
        let before = first.into_buffer();

        let mut second =
            Coordinator::open(settings(dir.path(), 2, 2), RoundProgress::hidden()).unwrap();
        let summary = second.run().unwrap();

        assert_eq!(summary.rounds, 0);
        assert_eq!(second.buffer(), &before);
    }

    // Tests the final buffer is independent of worker count and batch size
    // Verified by merging only the first partial of each round
    #[test]
    fn test_result_independent_of_partitioning() {
        let colors = [[255, 0, 0], [0, 128, 0], [7, 7, 200], [90, 45, 3], [1, 2, 3]];
        let mut results = Vec::new();

        for (workers, batch_size) in [(1, 10), (2, 1), (3, 2)] {
            let dir = TempDir::new().unwrap();
            let input = dir.path().join("downloads");
            fs::create_dir_all(&input).unwrap();
            for (i, color) in colors.iter().enumerate() {
                write_solid_png(&input, &format!("{i}.png"), 2, 2, *color);
            }

            let mut coordinator = Coordinator::open(
                settings(dir.path(), workers, batch_size),
                RoundProgress::hidden(),
            )
            .unwrap();
            let summary = coordinator.run().unwrap();
            assert_eq!(summary.summed, colors.len());
            results.push(coordinator.into_buffer());
        }

        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }
}
