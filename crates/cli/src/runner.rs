use std::path::{Path, PathBuf};
use std::sync::Arc;

use astguard_rules::{Collector, Report, RuleEngine, RunSummary, Target, TraceEntry};
use astguard_syntax::CheckedFile;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

/// Everything one file produced.
#[derive(Debug, Default)]
pub struct FileOutput {
    pub reports: Vec<Report>,
    pub traces: Vec<TraceEntry>,
    pub summary: RunSummary,
}

/// The result of checking one file. Errors are kept as text, prefixed with
/// the file they concern, so that one bad file does not stop the others.
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Result<FileOutput, String>,
}

/// Parse, type-check and match one source text.
pub fn check_source(engine: &RuleEngine, name: &str, text: &str) -> Result<FileOutput, String> {
    let file = CheckedFile::parse(name, text).map_err(|e| e.to_string())?;
    let reports = Collector::new();
    let traces = Collector::new();
    let summary = engine.run(Target::from(&file), &reports, &traces);
    Ok(FileOutput {
        reports: reports.take(),
        traces: traces.take(),
        summary,
    })
}

fn check_path(engine: &RuleEngine, path: &Path) -> Result<FileOutput, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: cannot read file: {e}", path.display()))?;
    check_source(engine, &path.display().to_string(), &text)
}

/// Check files in parallel, at most `jobs` at a time. Results come back in
/// the order of `paths`.
#[instrument(skip_all, fields(files = paths.len(), jobs))]
pub async fn check_files(engine: Arc<RuleEngine>, paths: Vec<PathBuf>, jobs: usize) -> Vec<FileResult> {
    let permits = Arc::new(Semaphore::new(jobs.max(1)));
    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        let engine = Arc::clone(&engine);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            let worker_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || check_path(&engine, &worker_path))
                .await
                .unwrap_or_else(|e| Err(format!("{}: worker failed: {e}", path.display())));
            FileResult { path, outcome }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => {
                debug!(path = %result.path.display(), ok = result.outcome.is_ok(), "file checked");
                results.push(result);
            }
            Err(e) => results.push(FileResult {
                path: PathBuf::new(),
                outcome: Err(format!("task failed: {e}")),
            }),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use astguard_rules::{Predicate, RuleSet, RuleSpec};
    use astguard_syntax::Location;

    use super::*;

    fn engine() -> Arc<RuleEngine> {
        let mut spec = RuleSpec {
            name: "const-add".into(),
            patterns: vec!["$x + $y".into()],
            filter: Some(
                Predicate::IsConst {
                    capture: "x".into(),
                }
                .into(),
            ),
            report: "constant sum $$".into(),
            location: Location::new("rules.yaml", 3),
            ..RuleSpec::default()
        };
        spec.debug = true;
        Arc::new(RuleEngine::new(RuleSet::compile(vec![spec]).unwrap()))
    }

    #[test]
    fn check_source_reports_and_traces() {
        let text = "package p\n\nfunc g(v int) int {\n\treturn v + 1 + (2 + 3)\n}\n";
        let output = check_source(&engine(), "p.go", text).unwrap();
        let reports: Vec<String> = output.reports.iter().map(ToString::to_string).collect();
        assert_eq!(reports, vec!["p.go:4: constant sum 2 + 3"]);
        assert_eq!(output.traces.len(), 2);
        assert_eq!(output.summary.fired, 1);
        assert_eq!(output.summary.rejected, 2);
    }

    #[test]
    fn check_source_surfaces_syntax_errors() {
        let err = check_source(&engine(), "bad.go", "package p\nfunc g() { return x }\n").unwrap_err();
        assert!(err.contains("bad.go"), "{err}");
    }

    #[tokio::test]
    async fn files_are_checked_in_order_and_failures_are_isolated() {
        let dir = std::env::temp_dir().join(format!("astguard-runner-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut paths = Vec::new();
        for i in 0..6 {
            let path = dir.join(format!("f{i}.go"));
            std::fs::write(&path, format!("package p\n\nvar s = {i} + 1\n")).unwrap();
            paths.push(path);
        }
        paths.insert(2, dir.join("missing.go"));

        let results = check_files(engine(), paths.clone(), 2).await;
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(results.len(), 7);
        for (result, path) in results.iter().zip(&paths) {
            assert_eq!(&result.path, path);
        }
        assert!(results[2].outcome.is_err());
        let messages: Vec<String> = results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|o| o.reports[0].message.clone())
            .collect();
        assert_eq!(
            messages,
            vec![
                "constant sum 0 + 1",
                "constant sum 1 + 1",
                "constant sum 2 + 1",
                "constant sum 3 + 1",
                "constant sum 4 + 1",
                "constant sum 5 + 1",
            ]
        );
    }
}
