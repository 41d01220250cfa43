//! Build the corpus and write it to the public directory

use anyhow::Result;
use notify::Watcher;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::pipeline::Build;
use crate::Site;

/// Build the site and write the output.
///
/// Documents with problems are left out of the output; the call fails after
/// writing if any of them had errors, so every problem is reported in one run.
pub fn run(site: &Site) -> Result<Build> {
    let start = Instant::now();

    let build = site.build()?;
    Generator::new(&site.public_dir, site.config.latest).generate(&build)?;

    if !build.report.is_empty() {
        eprintln!("{}", build.report);
    }

    tracing::info!("Built in {:.2}s", start.elapsed().as_secs_f64());

    let errors = build.report.errors().count();
    if errors > 0 {
        anyhow::bail!("build finished with {} error(s)", errors);
    }

    Ok(build)
}

/// Watch for file changes and rebuild the whole corpus
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    // Watch source directory
    watcher.watch(site.source_dir.as_ref(), notify::RecursiveMode::Recursive)?;

    // Watch config file
    let config_path = site.base_dir.join("_config.yml");
    if config_path.exists() {
        watcher.watch(Path::new(&config_path), notify::RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    // Debounce events
    let mut last_rebuild = Instant::now();
    let mut site = site.clone();
    let cancelled = site.cancel_handle();

    loop {
        if cancelled.load(Ordering::Relaxed) {
            tracing::info!("Stopped watching");
            break;
        }

        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(_event) => {
                // Only rebuild if more than 500ms since last rebuild
                if last_rebuild.elapsed() > Duration::from_millis(500) {
                    tracing::info!("File changed, rebuilding...");
                    match Site::new(&site.base_dir) {
                        Ok(reloaded) => site = reloaded.with_cancel_flag(cancelled.clone()),
                        Err(e) => tracing::error!("Failed to reload config: {:#}", e),
                    }
                    if let Err(e) = run(&site) {
                        tracing::error!("Build failed: {:#}", e);
                    }
                    last_rebuild = Instant::now();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_post(site: &Site, name: &str, front: &str, body: &str) {
        fs::create_dir_all(&site.source_dir).unwrap();
        fs::write(
            site.source_dir.join(name),
            format!("---\n{}---\n{}", front, body),
        )
        .unwrap();
    }

    #[test]
    fn test_build_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        write_post(
            &site,
            "auto.mdx",
            "title: auto\nsummary: S\ndate: 2024-03-24\ntags: [cpp]\n",
            "```cpp\nauto a = 10;\n```\n",
        );

        let build = run(&site).unwrap();
        assert_eq!(build.outputs.len(), 1);
        assert!(site.public_dir.join("posts/auto.json").exists());
        assert!(site.public_dir.join("index.json").exists());
    }

    #[test]
    fn test_rebuild_drops_deleted_documents() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let front = "title: t\nsummary: S\ndate: 2024-01-01\n";
        write_post(&site, "keep.md", front, "");
        write_post(&site, "gone.md", front, "");
        run(&site).unwrap();
        assert!(site.public_dir.join("posts/gone.json").exists());

        fs::remove_file(site.source_dir.join("gone.md")).unwrap();
        run(&site).unwrap();
        assert!(site.public_dir.join("posts/keep.json").exists());
        assert!(!site.public_dir.join("posts/gone.json").exists());
    }

    #[test]
    fn test_build_reports_errors_after_writing() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        write_post(&site, "good.md", "title: g\nsummary: S\ndate: 2024-01-01\n", "");
        write_post(&site, "bad.md", "summary: S\ndate: 2024-01-01\n", "");

        let err = run(&site).unwrap_err();
        assert!(err.to_string().contains("1 error"));
        assert!(site.public_dir.join("posts/good.json").exists());
        assert!(!site.public_dir.join("posts/bad.json").exists());
    }
}
