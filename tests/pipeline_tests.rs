//! End-to-end tests: file on disk → analysis report → exported table.

use std::io::Write;

use approx::assert_relative_eq;

use emission_surface::analysis::InterpolationMethod;
use emission_surface::color::ColorScaleKind;
use emission_surface::data::{load_file, MissingValuePolicy, Pollutant, COLUMN_NAMES};
use emission_surface::pipeline::NoProgress;
use emission_surface::{analyze, AnalysisConfig, ProgressEvent, SurfaceOutcome};

// ============================================================================
// Helpers
// ============================================================================

/// A 10 Hz run over a spread of (flow, temperature) points.
fn write_run(dir: &std::path::Path, rows: usize) -> std::path::PathBuf {
    let path = dir.join("run.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{}", COLUMN_NAMES.join(",")).unwrap();
    for i in 0..rows {
        let t = i as f64 / 10.0;
        let flow = 50.0 + (i % 17) as f64 * 20.0;
        let temp = 100.0 + (i % 23) as f64 * 15.0;
        // CO conversion climbs with temperature; THC sits at a constant 50 %.
        let co_down = 1000.0 * (1.0 - ((temp - 100.0) / 330.0).min(1.0));
        writeln!(
            file,
            "{t},1.0,{temp},1000,{co_down},400,200,600,600,{flow}"
        )
        .unwrap();
    }
    path
}

// ============================================================================
// Full pass
// ============================================================================

#[test]
fn test_csv_to_report_all_methods() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_run(dir.path(), 500);
    let series = load_file(&path, MissingValuePolicy::Zero).unwrap();
    assert_eq!(series.len(), 500);

    for method in InterpolationMethod::ALL {
        let config = AnalysisConfig {
            method,
            grid_size: 20,
            ..Default::default()
        };
        let report = analyze(&series, &config, &mut NoProgress);

        assert_eq!(report.total_samples, 500);
        assert_eq!(report.samples.len(), 50);
        assert_eq!(report.results.len(), 3);

        let thc = report.result(Pollutant::Thc).unwrap();
        assert!(thc.efficiency.iter().all(|&e| e == 50.0));
        assert_relative_eq!(thc.stats.mean, 50.0);

        let nox = report.result(Pollutant::Nox).unwrap();
        assert_eq!(nox.stats.max, 0.0);

        for result in &report.results {
            let surface = result
                .surface
                .surface()
                .unwrap_or_else(|| panic!("{method} surface for {}", result.pollutant));
            assert_eq!(surface.grid.size(), 20);
            for v in surface.grid.z().iter().flatten() {
                assert!((0.0..=100.0).contains(v), "{method}: {v}");
            }
        }
    }
}

#[test]
fn test_degenerate_cloud_still_exports() {
    // Constant flow: every (flow, temp) point is on one vertical line.
    let rows = [
        [0.0, 1.0, 200.0, 100.0, 20.0, 10.0, 5.0, 10.0, 10.0, 40.0],
        [0.1, 1.0, 250.0, 100.0, 50.0, 10.0, 5.0, 10.0, 10.0, 40.0],
        [0.2, 1.0, 300.0, 0.0, 10.0, 10.0, 5.0, 10.0, 10.0, 40.0],
    ];
    let series = emission_surface::data::SampleSeries::new(
        rows.iter()
            .map(emission_surface::data::Sample::from_row)
            .collect(),
    );

    let config = AnalysisConfig {
        stride: 1,
        method: InterpolationMethod::Cubic,
        ..Default::default()
    };
    let report = analyze(&series, &config, &mut NoProgress);

    assert!(report
        .results
        .iter()
        .all(|r| matches!(r.surface, SurfaceOutcome::Unavailable { .. })));

    let mut out = Vec::new();
    report.write_csv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with("CO efficiency (%),THC efficiency (%),NOx efficiency (%)"));
    assert!(text.lines().nth(1).unwrap().contains(",80.000,50.000,0.000"));
}

#[test]
fn test_idw_survives_where_triangulation_fails() {
    let rows = [
        [0.0, 1.0, 200.0, 100.0, 20.0, 10.0, 5.0, 10.0, 10.0, 40.0],
        [0.1, 1.0, 200.0, 100.0, 50.0, 10.0, 5.0, 10.0, 10.0, 40.0],
    ];
    let series = emission_surface::data::SampleSeries::new(
        rows.iter()
            .map(emission_surface::data::Sample::from_row)
            .collect(),
    );
    let config = AnalysisConfig {
        stride: 1,
        grid_size: 5,
        ..Default::default()
    };
    let report = analyze(&series, &config, &mut NoProgress);
    let co = report.result(Pollutant::Co).unwrap();
    let surface = co.surface.surface().unwrap();

    // Coincident points: IDW gives their average everywhere.
    for v in surface.grid.z().iter().flatten() {
        assert_relative_eq!(*v, 65.0, epsilon = 1e-9);
    }
}

#[test]
fn test_color_scale_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let series = load_file(&write_run(dir.path(), 200), MissingValuePolicy::Zero).unwrap();
    let config = AnalysisConfig {
        color_scale: ColorScaleKind::EmissionRamp,
        ..Default::default()
    };
    let report = analyze(&series, &config, &mut NoProgress);
    let surface = report.result(Pollutant::Co).unwrap().surface.surface().unwrap();
    assert_eq!(surface.color_scale, ColorScaleKind::EmissionRamp.scale());
    assert_eq!(surface.z_range, (0.0, 100.0));
}

#[test]
fn test_cloud_cap_bounds_work_not_output() {
    let dir = tempfile::tempdir().unwrap();
    let series = load_file(&write_run(dir.path(), 2000), MissingValuePolicy::Zero).unwrap();
    let config = AnalysisConfig {
        stride: 1,
        max_cloud_points: Some(100),
        grid_size: 10,
        ..Default::default()
    };
    let a = analyze(&series, &config, &mut NoProgress);
    let b = analyze(&series, &config, &mut NoProgress);

    // Full-length efficiency columns; identical grids for the same seed.
    assert_eq!(a.result(Pollutant::Co).unwrap().efficiency.len(), 2000);
    assert_eq!(a, b);
    // Subsampling is recorded per pollutant.
    for result in &a.results {
        assert_eq!(result.subsampled_from, Some(2000));
    }

    let uncapped = AnalysisConfig {
        max_cloud_points: None,
        ..config.clone()
    };
    let c = analyze(&series, &uncapped, &mut NoProgress);
    assert!(c.results.iter().all(|r| r.subsampled_from.is_none()));

    let roomy = AnalysisConfig {
        max_cloud_points: Some(2000),
        ..config
    };
    let d = analyze(&series, &roomy, &mut NoProgress);
    assert!(d.results.iter().all(|r| r.subsampled_from.is_none()));
}

#[test]
fn test_progress_reaches_completion() {
    let dir = tempfile::tempdir().unwrap();
    let series = load_file(&write_run(dir.path(), 100), MissingValuePolicy::Zero).unwrap();
    let mut last = None;
    analyze(&series, &AnalysisConfig::default(), &mut |e: &ProgressEvent| {
        last = Some(e.clone())
    });
    let last = last.unwrap();
    assert_eq!(last, ProgressEvent::Finished { cancelled: false });
    assert_eq!(last.fraction(), 1.0);
}
