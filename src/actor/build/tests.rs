use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::*;
use crate::actor::messages::ChangeKind;
use crate::config::{BuildSection, test_site_config};
use crate::generator::BuildError;

/// Writes fixed pages and reports a fixed subset as changed.
struct FakeGenerator {
    calls: Arc<AtomicUsize>,
    writes: Vec<&'static str>,
    changed: Vec<&'static str>,
    delay: Duration,
    fail: bool,
}

impl FakeGenerator {
    fn new(calls: &Arc<AtomicUsize>) -> Self {
        Self {
            calls: Arc::clone(calls),
            writes: Vec::new(),
            changed: Vec::new(),
            delay: Duration::ZERO,
            fail: false,
        }
    }
}

impl Generator for FakeGenerator {
    fn process(&mut self, config: &BuildConfig) -> Result<(), BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail {
            return Err(anyhow::anyhow!("Liquid syntax error in a.md").into());
        }
        for page in &self.writes {
            let path = config.destination.join(page.trim_start_matches('/'));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<html><head></head></html>").unwrap();
        }
        Ok(())
    }

    fn regenerate(&self, page: &str) -> bool {
        self.changed.iter().any(|c| *c == page)
    }
}

fn make_config(dir: &TempDir) -> BuildConfig {
    let site = test_site_config(dir.path());
    fs::create_dir_all(&site.build.destination).unwrap();
    BuildConfig::resolve(&site, None).unwrap()
}

fn changes(entries: &[(&str, ChangeKind)]) -> ChangeSet {
    let mut set = ChangeSet::default();
    for (path, kind) in entries {
        set.record(*path, *kind);
    }
    set
}

fn content() -> regex::Regex {
    BuildSection::default().content_pattern().unwrap()
}

// =============================================================================
// plan
// =============================================================================

#[test]
fn test_plan_static_only() {
    let set = changes(&[
        ("css/site.css", ChangeKind::Modified),
        ("img/new.png", ChangeKind::Created),
        ("img/old.png", ChangeKind::Removed),
        ("_sass/base.scss", ChangeKind::Modified),
    ]);
    assert_eq!(
        plan(&set, &content()),
        Plan::Passthrough {
            copy: vec!["css/site.css".into(), "img/new.png".into()],
            remove: vec!["img/old.png".into()],
        }
    );
}

#[test]
fn test_plan_renderable_wins() {
    let set = changes(&[
        ("css/site.css", ChangeKind::Modified),
        ("about.md", ChangeKind::Modified),
    ]);
    assert_eq!(plan(&set, &content()), Plan::Rebuild);
}

#[test]
fn test_plan_flags_rebuild() {
    let set = ChangeSet {
        scope: true,
        ..Default::default()
    };
    assert_eq!(plan(&set, &content()), Plan::Rebuild);
}

#[test]
fn test_plan_ignored_only() {
    let set = changes(&[("_data/nav.yml", ChangeKind::Modified)]);
    assert_eq!(plan(&set, &content()), Plan::Nothing);
}

// =============================================================================
// BuildRunner
// =============================================================================

#[test]
fn test_static_changes_never_invoke_generator() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("css/site.css"), "body{}").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut runner = BuildRunner::new(FakeGenerator::new(&calls));

    let set = changes(&[("css/site.css", ChangeKind::Modified)]);
    let result = runner.dispatch(&config, plan(&set, &config.content));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!result.failed);
    assert_eq!(result.changed_pages, vec!["/css/site.css"]);
    assert_eq!(
        fs::read_to_string(config.destination.join("css/site.css")).unwrap(),
        "body{}"
    );
}

#[test]
fn test_one_invocation_for_many_renderables() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut runner = BuildRunner::new(FakeGenerator::new(&calls));

    let set = changes(&[
        ("a.md", ChangeKind::Modified),
        ("b.md", ChangeKind::Created),
        ("_posts/c.markdown", ChangeKind::Removed),
        ("css/site.css", ChangeKind::Modified),
    ]);
    let result = runner.dispatch(&config, plan(&set, &config.content));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!result.failed);
}

#[test]
fn test_trigger_reports_changed_pages() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut generator = FakeGenerator::new(&calls);
    generator.writes = vec!["/a/index.html", "/b/index.html"];
    generator.changed = vec!["/a/index.html"];

    let result = BuildRunner::new(generator).trigger(&config);
    assert_eq!(result.changed_pages, vec!["/a/index.html"]);
    assert!(!result.failed);
}

#[test]
fn test_trigger_failure() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut generator = FakeGenerator::new(&calls);
    generator.fail = true;

    let result = BuildRunner::new(generator).trigger(&config);
    assert!(result.failed);
    assert!(result.changed_pages.is_empty());
}

#[test]
fn test_copy_skips_out_of_scope() {
    let dir = TempDir::new().unwrap();
    let mut config = make_config(&dir);
    config.include = vec!["*.css".into()];
    config.exclude = vec!["img".into(), "css".into()];
    fs::create_dir_all(dir.path().join("img")).unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("img/a.jpg"), "jpg").unwrap();
    fs::write(dir.path().join("css/site.css"), "css").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let runner = BuildRunner::new(FakeGenerator::new(&calls));
    let copied = runner
        .copy(&config, &["img/a.jpg".into(), "css/site.css".into()])
        .unwrap();

    assert_eq!(copied, vec!["/css/site.css"]);
    assert!(!config.destination.join("img/a.jpg").exists());
}

#[test]
fn test_copy_survives_bad_scope_patterns() {
    let dir = TempDir::new().unwrap();
    let mut config = make_config(&dir);
    config.include = vec!["a[b.*".into(), crate::isolation::page_pattern("/c[d")];
    config.exclude = vec!["[draft] notes.txt".into()];
    fs::write(dir.path().join("[draft] notes.txt"), "draft").unwrap();
    fs::write(dir.path().join("d notes.txt"), "d").unwrap();
    fs::write(dir.path().join("c[d.txt"), "cd").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut runner = BuildRunner::new(FakeGenerator::new(&calls));
    let result = runner.dispatch(
        &config,
        Plan::Passthrough {
            copy: vec!["[draft] notes.txt".into(), "d notes.txt".into(), "c[d.txt".into()],
            remove: vec![],
        },
    );

    assert!(!result.failed);
    assert_eq!(result.changed_pages, vec!["/d notes.txt", "/c[d.txt"]);
    assert!(!config.destination.join("[draft] notes.txt").exists());
}

#[test]
fn test_copy_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut runner = BuildRunner::new(FakeGenerator::new(&calls));

    let result = runner.dispatch(
        &config,
        Plan::Passthrough {
            copy: vec!["gone.png".into()],
            remove: vec![],
        },
    );
    assert!(result.failed);
}

#[test]
fn test_remove_prunes_empty_parents() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let nested = config.destination.join("assets/img/deep");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("a.png"), "png").unwrap();
    fs::write(config.destination.join("assets/keep.css"), "css").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let runner = BuildRunner::new(FakeGenerator::new(&calls));
    let removed = runner
        .remove(&config, &["assets/img/deep/a.png".into(), "never/there.png".into()])
        .unwrap();

    assert_eq!(removed, 1);
    assert!(!config.destination.join("assets/img").exists());
    assert!(config.destination.join("assets/keep.css").exists());
    assert!(config.destination.exists());
}

#[test]
fn test_remove_directory() {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    fs::create_dir_all(config.destination.join("fonts")).unwrap();
    fs::write(config.destination.join("fonts/a.woff"), "w").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let runner = BuildRunner::new(FakeGenerator::new(&calls));
    runner.remove(&config, &["fonts".into()]).unwrap();
    assert!(!config.destination.join("fonts").exists());
}

// =============================================================================
// BuildActor
// =============================================================================

struct Harness {
    _dir: TempDir,
    build_tx: mpsc::Sender<BuildMsg>,
    hub_rx: mpsc::Receiver<HubMsg>,
    calls: Arc<AtomicUsize>,
}

fn spawn_actor(configure: impl FnOnce(&mut FakeGenerator)) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = make_config(&dir);
    let scope = Arc::new(ScopeStore::new(dir.path().join(".isolation.toml")));

    let calls = Arc::new(AtomicUsize::new(0));
    let mut generator = FakeGenerator::new(&calls);
    configure(&mut generator);

    let (build_tx, build_rx) = mpsc::channel(8);
    let (hub_tx, hub_rx) = mpsc::channel(8);
    let actor = BuildActor::new(
        build_rx,
        hub_tx,
        BuildRunner::new(generator),
        Arc::new(config),
        scope,
    );
    tokio::spawn(actor.run());

    Harness {
        _dir: dir,
        build_tx,
        hub_rx,
        calls,
    }
}

async fn next_reload(rx: &mut mpsc::Receiver<HubMsg>) -> Vec<String> {
    match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(HubMsg::Reload { pages })) => pages,
        other => panic!("expected reload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_modified_page_reaches_hub() {
    let mut h = spawn_actor(|g| {
        g.writes = vec!["/a/index.html"];
        g.changed = vec!["/a/index.html"];
    });

    let set = changes(&[("a.md", ChangeKind::Modified)]);
    h.build_tx.send(BuildMsg::Changes(set)).await.unwrap();

    assert_eq!(next_reload(&mut h.hub_rx).await, vec!["/a/index.html"]);
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_changes_during_build_coalesce() {
    let mut h = spawn_actor(|g| {
        g.writes = vec!["/index.html"];
        g.changed = vec!["/index.html"];
        g.delay = Duration::from_millis(300);
    });

    for path in ["a.md", "b.md", "c.md"] {
        let set = changes(&[(path, ChangeKind::Modified)]);
        h.build_tx.send(BuildMsg::Changes(set)).await.unwrap();
    }

    next_reload(&mut h.hub_rx).await;
    next_reload(&mut h.hub_rx).await;
    // b.md and c.md ran as one cycle after a.md
    assert_eq!(h.calls.load(Ordering::SeqCst), 2);

    let extra = tokio::time::timeout(Duration::from_millis(500), h.hub_rx.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_unchanged_build_sends_nothing() {
    let mut h = spawn_actor(|g| g.writes = vec!["/index.html"]);

    let set = changes(&[("index.md", ChangeKind::Modified)]);
    h.build_tx.send(BuildMsg::Changes(set)).await.unwrap();

    let got = tokio::time::timeout(Duration::from_millis(500), h.hub_rx.recv()).await;
    assert!(got.is_err());
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}
