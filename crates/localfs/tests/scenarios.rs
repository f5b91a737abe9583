//! End-to-end scenarios through the public tool surface.

use std::fs;
use std::path::PathBuf;

use localfs::tools::names;
use localfs::{FsConfig, FsSession, ToolSet};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    session: FsSession,
    tools: ToolSet,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(|config| config)
    }

    fn with_config(configure: impl FnOnce(FsConfig) -> FsConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let config = configure(FsConfig::new([&root]));
        let session = config.build_session().unwrap();
        let tools = config.build_tool_set(&session);
        Self {
            _dir: dir,
            root,
            session,
            tools,
        }
    }

    fn write(&self, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    async fn call(&self, name: &str, args: Value) -> Value {
        let out = self.tools.execute(name, &args.to_string()).await;
        serde_json::from_str(&out).unwrap_or_else(|_| panic!("{name} returned {out}"))
    }

    async fn call_err(&self, name: &str, args: Value) -> String {
        let out = self.tools.execute(name, &args.to_string()).await;
        assert!(out.starts_with("Error ["), "{name} unexpectedly succeeded: {out}");
        out
    }
}

fn names_of(result: &Value) -> Vec<String> {
    let mut names: Vec<String> = result["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn create_write_read_scenario() {
    let fx = Fixture::new();
    let created = fx.call(names::CREATE_FOLDER, json!({"path": "notes"})).await;
    assert_eq!(created["created"], true);

    let written = fx
        .call(
            names::WRITE_FILE,
            json!({"path": "notes/a.txt", "content": "hello"}),
        )
        .await;
    assert_eq!(written["action"], "created");
    assert_eq!(written["bytes_written"], 5);

    let read = fx
        .call(names::READ_FILE, json!({"path": "notes/a.txt", "max_bytes": 3}))
        .await;
    assert_eq!(read["content"], "hel");
    assert_eq!(read["truncated"], true);
    assert_eq!(read["total_bytes"], 5);
}

#[tokio::test]
async fn write_without_flags_never_clobbers() {
    let fx = Fixture::new();
    let path = fx.write("keep.txt", "original");
    let err = fx
        .call_err(names::WRITE_FILE, json!({"path": "keep.txt", "content": "x"}))
        .await;
    assert!(err.starts_with("Error [already_exists]"), "{err}");
    assert_eq!(fs::read_to_string(&path).unwrap(), "original");

    fx.call(
        names::WRITE_FILE,
        json!({"path": "keep.txt", "content": "new", "overwrite": true}),
    )
    .await;
    fx.call(names::APPEND_TO_FILE, json!({"path": "keep.txt", "content": "er"}))
        .await;
    assert_eq!(fs::read_to_string(&path).unwrap(), "newer");
}

#[tokio::test]
async fn queries_before_the_first_build_say_so() {
    let fx = Fixture::new();
    fx.write("a.txt", "a");
    let result = fx
        .call(names::SEARCH_FILE_BY_NAME, json!({"name": "a"}))
        .await;
    assert_eq!(result["generation"], 0);
    assert_eq!(result["count"], 0);
    assert!(result["note"].as_str().unwrap().contains("build_file_index"));
}

#[tokio::test]
async fn name_and_extension_queries() {
    let fx = Fixture::new();
    fx.write("reports/Report_Final.PDF", "pdf");
    fx.write("reports/summary.pdf", "pdf2");
    fx.write("notes/todo.txt", "t");
    fx.write("Makefile", "all:");
    fx.call(names::BUILD_FILE_INDEX, json!({})).await;

    let found = fx
        .call(names::SEARCH_FILE_BY_NAME, json!({"name": "report"}))
        .await;
    assert_eq!(names_of(&found), vec!["Report_Final.PDF"]);

    let upper = fx.call(names::FIND_BY_EXTENSION, json!({"ext": "PDF"})).await;
    let dotted = fx.call(names::FIND_BY_EXTENSION, json!({"ext": ".pdf"})).await;
    assert_eq!(names_of(&upper), names_of(&dotted));
    assert_eq!(upper["count"], 2);

    let bare = fx.call(names::FIND_BY_EXTENSION, json!({"ext": ""})).await;
    assert_eq!(names_of(&bare), vec!["Makefile"]);

    let typed = fx
        .call(names::FIND_BY_TYPE, json!({"types": ["txt", ".pdf"]}))
        .await;
    assert_eq!(typed["count"], 3);

    let folder = fx
        .call(names::FILES_IN_FOLDER, json!({"folder": "notes"}))
        .await;
    assert_eq!(names_of(&folder), vec!["todo.txt"]);

    let top = fx.call(names::TOP_EXTENSIONS, json!({"n": 1})).await;
    assert_eq!(top["extensions"][0]["extension"], ".pdf");
    assert_eq!(top["extensions"][0]["count"], 2);
}

#[tokio::test]
async fn size_and_time_queries() {
    let fx = Fixture::new();
    fx.write("exact.bin", vec![0u8; 1_048_576]);
    fx.write("just_under.bin", vec![0u8; 1_048_575]);
    fx.write("tiny.txt", "x");
    fx.call(names::BUILD_FILE_INDEX, json!({})).await;

    let large = fx.call(names::LARGE_FILES, json!({"min_size_mb": 1})).await;
    assert_eq!(names_of(&large), vec!["exact.bin"]);

    let small = fx.call(names::SMALL_FILES, json!({"max_size_kb": 1})).await;
    assert_eq!(names_of(&small), vec!["tiny.txt"]);

    let negative = fx
        .call_err(names::LARGE_FILES, json!({"min_size_mb": -1}))
        .await;
    assert!(negative.starts_with("Error [invalid_argument]"), "{negative}");

    let after = fx
        .call(names::FILES_MODIFIED_AFTER, json!({"timestamp": 0}))
        .await;
    assert_eq!(after["count"], 3);

    let recent = fx.call(names::RECENT_FILES, json!({"n": 10})).await;
    assert_eq!(recent["count"], 3);
}

#[tokio::test]
async fn duplicates_share_the_first_seen_canonical() {
    let fx = Fixture::new();
    fx.write("a/one.txt", "same bytes");
    fx.write("b/two.txt", "same bytes");
    fx.write("c/three.txt", "same bytes");
    fx.write("d/other.txt", "diff bytes");
    fx.call(names::BUILD_FILE_INDEX, json!({})).await;

    let report = fx.call(names::FIND_DUPLICATES, json!({})).await;
    let pairs = report["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0]["canonical"]["path"], pairs[1]["canonical"]["path"]);
    assert_ne!(pairs[0]["duplicate"]["path"], pairs[1]["duplicate"]["path"]);
    assert_eq!(report["wasted_bytes"], 20);
}

#[tokio::test]
async fn mutations_are_invisible_until_refresh() {
    let fx = Fixture::new();
    fx.write("old.txt", "o");
    fx.call(names::BUILD_FILE_INDEX, json!({})).await;

    fx.call(names::WRITE_FILE, json!({"path": "fresh.txt", "content": "f"}))
        .await;
    let stale = fx
        .call(names::SEARCH_FILE_BY_NAME, json!({"name": "fresh"}))
        .await;
    assert_eq!(stale["count"], 0);

    let refreshed = fx.call(names::REFRESH_INDEX, json!({})).await;
    assert_eq!(refreshed["generation"], 2);
    let seen = fx
        .call(names::SEARCH_FILE_BY_NAME, json!({"name": "fresh"}))
        .await;
    assert_eq!(seen["count"], 1);
}

#[tokio::test]
async fn move_respects_overwrite_flag() {
    let fx = Fixture::new();
    let src = fx.write("src.txt", "source");
    let dst = fx.write("dst.txt", "destination");

    let err = fx
        .call_err(names::MOVE_FILE, json!({"src": "src.txt", "dst": "dst.txt"}))
        .await;
    assert!(err.starts_with("Error [overwrite_denied]"), "{err}");
    assert!(src.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "destination");

    let moved = fx
        .call(
            names::MOVE_FILE,
            json!({"src": "src.txt", "dst": "dst.txt", "overwrite": true}),
        )
        .await;
    assert_eq!(moved["replaced"], true);
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "source");
}

#[tokio::test]
async fn copy_rename_and_delete() {
    let fx = Fixture::new();
    fx.write("docs/a.txt", "alpha");
    fx.call(names::CREATE_FOLDER, json!({"path": "backup"})).await;

    let copied = fx
        .call(names::COPY_FILE, json!({"src": "docs/a.txt", "dst": "backup"}))
        .await;
    assert!(copied["destination"].as_str().unwrap().ends_with("a.txt"));
    assert_eq!(
        fs::read_to_string(fx.root.join("backup/a.txt")).unwrap(),
        "alpha"
    );

    fx.call(
        names::RENAME_FILE,
        json!({"path": "backup/a.txt", "new_name": "b.txt"}),
    )
    .await;
    assert!(fx.root.join("backup/b.txt").exists());

    let bad = fx
        .call_err(
            names::RENAME_FILE,
            json!({"path": "backup/b.txt", "new_name": "../c.txt"}),
        )
        .await;
    assert!(bad.starts_with("Error [invalid_argument]"), "{bad}");

    let wrong = fx
        .call_err(names::DELETE_FILE, json!({"path": "backup"}))
        .await;
    assert!(wrong.starts_with("Error [wrong_type]"), "{wrong}");

    let removed = fx
        .call(names::DELETE_FOLDER, json!({"path": "backup"}))
        .await;
    assert_eq!(removed["kind"], "directory");
    assert!(!fx.root.join("backup").exists());

    fx.call(names::DELETE_FILE, json!({"path": "docs/a.txt"})).await;
    let gone = fx
        .call_err(names::READ_FILE, json!({"path": "docs/a.txt"}))
        .await;
    assert!(gone.starts_with("Error [not_found]"), "{gone}");
}

#[tokio::test]
async fn paths_outside_the_roots_are_denied() {
    let fx = Fixture::new();
    let outside = tempfile::tempdir().unwrap();
    let secret = outside.path().join("secret.txt");
    fs::write(&secret, "secret").unwrap();

    let absolute = fx
        .call_err(names::READ_FILE, json!({"path": secret}))
        .await;
    assert!(absolute.starts_with("Error [access_denied]"), "{absolute}");

    let escape = fx
        .call_err(
            names::WRITE_FILE,
            json!({"path": "../escape.txt", "content": "x"}),
        )
        .await;
    assert!(escape.starts_with("Error [access_denied]"), "{escape}");
    assert!(!fx.root.parent().unwrap().join("escape.txt").exists());

    let root = fx
        .call_err(names::DELETE_FOLDER, json!({"path": fx.root}))
        .await;
    assert!(root.starts_with("Error [access_denied]"), "{root}");
    assert!(fx.root.exists());

    let copy_out = fx
        .call_err(
            names::COPY_FILE,
            json!({"src": fx.write("in.txt", "i"), "dst": outside.path()}),
        )
        .await;
    assert!(copy_out.starts_with("Error [access_denied]"), "{copy_out}");
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_cannot_escape_the_roots() {
    let fx = Fixture::new();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.txt"), fx.root.join("link.txt"))
        .unwrap();
    std::os::unix::fs::symlink(outside.path(), fx.root.join("linkdir")).unwrap();

    let via_file = fx
        .call_err(names::READ_FILE, json!({"path": "link.txt"}))
        .await;
    assert!(via_file.starts_with("Error [access_denied]"), "{via_file}");

    let via_dir = fx
        .call_err(
            names::WRITE_FILE,
            json!({"path": "linkdir/planted.txt", "content": "x"}),
        )
        .await;
    assert!(via_dir.starts_with("Error [access_denied]"), "{via_dir}");
    assert!(!outside.path().join("planted.txt").exists());

    let built = fx.call(names::BUILD_FILE_INDEX, json!({})).await;
    assert_eq!(built["count"], 0);
    assert_eq!(built["skipped"], 2);

    // Removing the links leaves what they point at untouched.
    fx.call(names::DELETE_FILE, json!({"path": "link.txt"})).await;
    let refused = fx
        .call_err(names::DELETE_FOLDER, json!({"path": "linkdir"}))
        .await;
    assert!(refused.starts_with("Error [wrong_type]"), "{refused}");
    fx.call(names::DELETE_FILE, json!({"path": "linkdir"})).await;
    assert_eq!(
        fs::read_to_string(outside.path().join("secret.txt")).unwrap(),
        "secret"
    );
    assert!(!fx.root.join("link.txt").exists());
}

#[tokio::test]
async fn read_only_sessions_refuse_mutations() {
    let fx = Fixture::with_config(|config| config.with_read_only(true));
    let path = fx.write("a.txt", "a");

    let err = fx
        .call_err(names::DELETE_FILE, json!({"path": "a.txt"}))
        .await;
    assert!(err.starts_with("Error [disabled]"), "{err}");
    assert!(path.exists());

    let read = fx.call(names::READ_FILE, json!({"path": "a.txt"})).await;
    assert_eq!(read["content"], "a");
}

#[tokio::test]
async fn bad_arguments_are_reported_not_panicked() {
    let fx = Fixture::new();
    let missing = fx.call_err(names::FIND_BY_EXTENSION, json!({})).await;
    assert!(missing.starts_with("Error [invalid_argument]"), "{missing}");

    let unknown = fx.call_err("format_disk", json!({})).await;
    assert!(unknown.starts_with("Error [unknown_tool]"), "{unknown}");

    let outside_scope = fx
        .call_err(names::BUILD_FILE_INDEX, json!({"roots": ["/"]}))
        .await;
    assert!(
        outside_scope.starts_with("Error [access_denied]"),
        "{outside_scope}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queries_during_refresh_see_one_whole_generation() {
    let fx = Fixture::new();
    for i in 0..200 {
        fx.write(&format!("batch1/file_{i:03}.dat"), i.to_string());
    }
    fx.call(names::BUILD_FILE_INDEX, json!({})).await;
    for i in 0..300 {
        fx.write(&format!("batch2/file_{i:03}.dat"), i.to_string());
    }

    let query = json!({"name": "file_"}).to_string();
    let mut calls = vec![(names::REFRESH_INDEX, "{}")];
    calls.extend(std::iter::repeat_n((names::SEARCH_FILE_BY_NAME, query.as_str()), 16));
    let results = fx.tools.execute_batch(&calls).await;

    let report: Value = serde_json::from_str(&results[0]).unwrap();
    assert_eq!(report["generation"], 2);
    assert_eq!(report["count"], 500);

    for result in &results[1..] {
        let value: Value = serde_json::from_str(result).unwrap();
        match value["generation"].as_u64().unwrap() {
            1 => assert_eq!(value["count"], 200),
            2 => assert_eq!(value["count"], 500),
            other => panic!("unexpected generation {other}"),
        }
    }
    assert_eq!(fx.session.snapshot().len(), 500);
}

#[tokio::test]
async fn status_reports_scope() {
    let fx = Fixture::new();
    fx.write("docs/a.txt", "a");
    fx.write("top.txt", "t");
    let docs = fx.root.join("docs");
    fx.call(names::BUILD_FILE_INDEX, json!({"roots": [docs]}))
        .await;

    let status = fx.call(names::INDEX_STATUS, json!({})).await;
    assert_eq!(status["files"], 1);
    assert_eq!(status["roots"][0], json!(docs));
    assert_eq!(status["configured_roots"][0], json!(fx.root));
    assert!(status["built_at"].is_string());
}
