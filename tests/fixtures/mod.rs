//! Fixture repositories for generation tests

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A plugin checkout with a hand-edited .travis.yml and extension fragments
pub fn plugin_repo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/plugin_repo")
}

/// Copy a fixture directory below `dest`
pub fn copy_fixture(fixture: &Path, dest: &Path) {
    for entry in WalkDir::new(fixture) {
        let entry = entry.unwrap();
        let target = dest.join(entry.path().strip_prefix(fixture).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}
