#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use astref_core::compdb::CompileCommand;
use astref_core::config::GenAstConfig;
use astref_core::dispatch::{dispatch_with_diagnostics, run_dispatch};
use astref_ingest::CancellationToken;
use tempfile::TempDir;

/// Echoes its arguments as a JSON document. Sources named `bad*` fail,
/// `slow*` sleep after recording their pid under `pids/`.
fn fake_clang(root: &Path) -> PathBuf {
    let pids = root.join("pids");
    std::fs::create_dir_all(&pids).unwrap();
    let script = format!(
        r#"#!/bin/sh
for source; do :; done
case "${{source##*/}}" in
  bad*) echo "error: cannot compile $*" >&2; exit 1 ;;
  slow*) echo $$ > "{pids}/$$"; exec sleep 30 ;;
esac
printf '{{"kind":"TranslationUnitDecl","args":"%s"}}' "$*"
"#,
        pids = pids.display()
    );
    let path = root.join("fake-clang");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

struct Fixture {
    root: TempDir,
    out: PathBuf,
    clang: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let clang = fake_clang(root.path());
        Self { root, out, clang }
    }

    fn command(&self, file: &str) -> CompileCommand {
        CompileCommand {
            directory: self.root.path().to_path_buf(),
            file: file.to_string(),
            arguments: vec!["cc".into(), "-c".into(), file.into()],
        }
    }

    fn config(&self, jobs: usize) -> GenAstConfig {
        GenAstConfig {
            clang_binary: self.clang.clone(),
            output_dir: self.out.clone(),
            jobs,
            ..GenAstConfig::default()
        }
    }

    fn dump(&self, name: &str) -> String {
        std::fs::read_to_string(self.out.join(name)).unwrap()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_command_is_dumped_exactly_once() {
    let fx = Fixture::new();
    let commands: Vec<_> = (0..8).map(|i| fx.command(&format!("f{i}.c"))).collect();

    let (report, diagnostics) = dispatch_with_diagnostics(
        &fx.config(3),
        commands,
        CancellationToken::new(),
        Vec::new(),
    )
    .await
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.dispatched, 8);
    assert_eq!(report.succeeded, 8);
    assert_eq!(report.written, 8);
    assert!(diagnostics.is_empty());

    let mut names: Vec<_> = std::fs::read_dir(&fx.out)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    let expected: Vec<_> = (0..8).map(|i| format!("f{i}.c.json")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn source_argument_is_replaced_with_absolute_path() {
    let fx = Fixture::new();
    let command = CompileCommand {
        directory: fx.root.path().join("build"),
        file: "../src/a.c".to_string(),
        arguments: vec!["gcc".into(), "-DX=1".into(), "-c".into(), "../src/a.c".into()],
    };
    std::fs::create_dir_all(fx.root.path().join("build")).unwrap();

    let report = run_dispatch(&fx.config(1), vec![command], CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success());
    let absolute = fx.root.path().join("src").join("a.c");
    let dump = fx.dump(".._src_a.c.json");
    assert_eq!(
        dump,
        format!(
            r#"{{"kind":"TranslationUnitDecl","args":"-Xclang -ast-dump=json -fsyntax-only -DX=1 -c {}"}}"#,
            absolute.display()
        )
    );
}

#[tokio::test]
async fn failing_items_are_reported_and_still_written() {
    let fx = Fixture::new();
    let commands = vec![fx.command("good.c"), fx.command("bad.c"), fx.command("fine.c")];

    let (report, diagnostics) = dispatch_with_diagnostics(
        &fx.config(2),
        commands,
        CancellationToken::new(),
        Vec::new(),
    )
    .await
    .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed, vec![fx.root.path().join("bad.c")]);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.written, 3);
    assert_eq!(fx.dump("bad.c.json"), "");
    assert!(fx.dump("good.c.json").contains("good.c"));

    let diagnostics = String::from_utf8(diagnostics).unwrap();
    assert!(diagnostics.starts_with("error: cannot compile"));
    assert!(diagnostics.ends_with("\n\n"));
}

#[tokio::test]
async fn patterns_select_matching_paths_only() {
    let fx = Fixture::new();
    let commands = vec![fx.command("keep_me.c"), fx.command("other.c")];
    let config = GenAstConfig {
        patterns: vec!["nothing".into(), "keep".into()],
        ..fx.config(2)
    };

    let report = run_dispatch(&config, commands, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.dispatched, 1);
    assert!(fx.out.join("keep_me.c.json").is_file());
    assert!(!fx.out.join("other.c.json").exists());
}

#[tokio::test]
async fn missing_tool_fails_each_item_without_aborting() {
    let fx = Fixture::new();
    let config = GenAstConfig {
        clang_binary: fx.root.path().join("no-such-clang"),
        ..fx.config(2)
    };

    let (report, diagnostics) = dispatch_with_diagnostics(
        &config,
        vec![fx.command("a.c"), fx.command("b.c")],
        CancellationToken::new(),
        Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.written, 2);
    assert_eq!(fx.dump("a.c.json"), "");
    assert!(String::from_utf8(diagnostics).unwrap().contains("failed to run"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancellation_kills_running_tools() {
    let fx = Fixture::new();
    let commands: Vec<_> = (0..4).map(|i| fx.command(&format!("slow{i}.c"))).collect();
    let cancel = CancellationToken::new();

    let pids_dir = fx.root.path().join("pids");
    let trigger = cancel.clone();
    let watched = pids_dir.clone();
    tokio::spawn(async move {
        for _ in 0..200 {
            if std::fs::read_dir(&watched).map(|d| d.count()).unwrap_or(0) >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(20),
        run_dispatch(&fx.config(2), commands, cancel),
    )
    .await
    .expect("cancelled dispatch should finish promptly")
    .unwrap_err();

    assert!(err.is_cancelled(), "unexpected error: {err}");

    let pids: Vec<String> = std::fs::read_dir(&pids_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert!(!pids.is_empty());
    for pid in pids {
        let alive = std::process::Command::new("kill")
            .args(["-0", &pid])
            .stderr(std::process::Stdio::null())
            .status()
            .unwrap()
            .success();
        assert!(!alive, "tool process {pid} survived cancellation");
    }
}
