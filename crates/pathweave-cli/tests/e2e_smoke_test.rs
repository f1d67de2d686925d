use std::{fs, path::PathBuf};

use tempfile::tempdir;

use pathweave::model::DiagramDocument;
use pathweave_cli::{Args, run};

/// Collects all .json files from a directory
fn collect_json_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args_for(input: &PathBuf, output: &PathBuf, graph: Option<&PathBuf>) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        graph: graph.map(|path| path.to_string_lossy().to_string()),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_json_files(PathBuf::from("demos"));
    assert!(!demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();
    for demo in &demos {
        let stem = demo.file_stem().unwrap().to_string_lossy().to_string();
        let output = temp_dir.path().join(format!("{stem}.out.json"));
        let graph = temp_dir.path().join(format!("{stem}.graph.json"));

        match run(&args_for(demo, &output, Some(&graph))) {
            Ok(summary) if summary.warnings.is_empty() => {
                // The exported document is the input document
                let input: DiagramDocument =
                    serde_json::from_str(&fs::read_to_string(demo).unwrap()).unwrap();
                let exported: DiagramDocument =
                    serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
                if exported != input {
                    failed.push((demo.clone(), "export differs from input".to_string()));
                }
                assert!(graph.exists());
            }
            Ok(summary) => failed.push((demo.clone(), format!("{} warnings", summary.warnings.len()))),
            Err(e) => failed.push((demo.clone(), e.to_string())),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, reason) in &failed {
            eprintln!("  - {}: {}", path.display(), reason);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_warning_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_json_files(PathBuf::from("demos/warnings"));
    assert!(!demos.is_empty(), "No demos found in demos/warnings/");

    for demo in &demos {
        let output = temp_dir.path().join("out.json");
        let summary = run(&args_for(demo, &output, None))
            .unwrap_or_else(|e| panic!("{} failed: {e}", demo.display()));

        assert!(
            !summary.warnings.is_empty(),
            "{} reported no warnings",
            demo.display()
        );
        assert!(output.exists());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_json_files(PathBuf::from("demos/errors"));
    assert!(!demos.is_empty(), "No demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for demo in &demos {
        let output = temp_dir.path().join("error.json");
        if run(&args_for(demo, &output, None)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    assert!(
        unexpectedly_succeeded.is_empty(),
        "error demos succeeded: {unexpectedly_succeeded:?}"
    );
}

#[test]
fn e2e_graph_counts() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("out.json");

    let summary = run(&args_for(
        &PathBuf::from("demos/glycolysis_step.json"),
        &output,
        None,
    ))
    .expect("Failed to convert demo");

    // Three data nodes plus the anchor; two segments plus the catalysis edge
    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.edges, 3);
    assert_eq!(summary.annotations, 1);
}
