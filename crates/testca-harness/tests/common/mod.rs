#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use testca_harness::loader::shared_library_file_name;
use uuid::Uuid;

/// 夹具动态库路径。
///
/// 查找顺序：
/// - 环境变量 `TESTCA_FIXTURE`
/// - 测试可执行文件所在的 cargo 目标目录（`target/<profile>` 及其 `deps`）
/// - 以独立 target 目录执行 `cargo build -p testca`
pub fn fixture_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        if let Some(p) = std::env::var_os("TESTCA_FIXTURE") {
            let p = PathBuf::from(p);
            return p.canonicalize().unwrap_or(p);
        }
        let exe = std::env::current_exe().expect("current exe");
        let deps = exe.parent().expect("deps dir");
        let profile = deps.parent().expect("profile dir");
        for dir in [profile, deps] {
            if let Some(found) = find_library(dir) {
                return found;
            }
        }
        build_fixture(profile)
    })
}

fn find_library(dir: &Path) -> Option<PathBuf> {
    let exact = dir.join(shared_library_file_name("TestCA"));
    if exact.is_file() {
        return Some(exact);
    }
    let prefix = format!("{}TestCA-", std::env::consts::DLL_PREFIX);
    let suffix = std::env::consts::DLL_SUFFIX;
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(suffix))
        })
}

fn build_fixture(profile: &Path) -> PathBuf {
    let target_dir = profile
        .parent()
        .expect("target dir")
        .join("testca-fixture");
    let out = Command::new(env!("CARGO"))
        .arg("build")
        .arg("-p")
        .arg("testca")
        .arg("--target-dir")
        .arg(&target_dir)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("run cargo build -p testca");
    assert!(
        out.status.success(),
        "building fixture failed: stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let path = target_dir
        .join("debug")
        .join(shared_library_file_name("TestCA"));
    assert!(path.is_file(), "fixture not found at {}", path.display());
    path
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content)
        .unwrap_or_else(|e| panic!("write {} failed: {e}", path.display()));
}

pub struct CleanupDir(pub PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
