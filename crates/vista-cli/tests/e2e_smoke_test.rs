use std::{fs, path::PathBuf};

use tempfile::tempdir;

use vista_cli::{Args, run};

/// Root of the scenario demos, relative to the workspace not the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .toml files from a directory
fn collect_scenarios(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args_for(input: &PathBuf, output: &PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_scenarios(demos_path());

    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let output = temp_dir.path().join(format!(
            "{}.report.toml",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        match run(&args_for(demo, &output)) {
            Ok(()) => {
                let report = fs::read_to_string(&output).expect("report written");
                assert!(report.contains("[[diagrams]]"), "{} has no diagrams", demo.display());
            }
            Err(e) => failed.push((demo.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let error_demos = collect_scenarios(demos_path().join("errors"));

    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &error_demos {
        let output = temp_dir.path().join(format!(
            "error_{}.report.toml",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args_for(demo, &output)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_fullscreen_demo_ends_with_scroll_restored() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = demos_path().join("fullscreen.toml");
    let output = temp_dir.path().join("fullscreen.report.toml");

    run(&args_for(&input, &output)).expect("fullscreen demo replays");

    let report = fs::read_to_string(&output).expect("report written");
    assert!(report.contains("body_overflow = \"auto\""));
    assert!(report.contains("scroll_locked = false"));
    assert!(!report.contains("fullscreen = true"));
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[selectors]\ndiagram_class = \"diagram\"\n").expect("config written");
    let input = demos_path().join("basic.toml");
    let output = temp_dir.path().join("basic.report.toml");

    let mut args = args_for(&input, &output);
    args.config = Some(config.to_string_lossy().to_string());
    run(&args).expect("basic demo replays");

    let report = fs::read_to_string(&output).expect("report written");
    assert!(report.contains("initialized = true"));
}

#[test]
fn e2e_missing_explicit_config_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = demos_path().join("basic.toml");
    let output = temp_dir.path().join("basic.report.toml");

    let mut args = args_for(&input, &output);
    args.config = Some(temp_dir.path().join("absent.toml").to_string_lossy().to_string());

    assert!(run(&args).is_err());
    assert!(!output.exists());
}
