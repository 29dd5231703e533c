//! Theme directory fixtures for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use themecfg::ThemeLayout;

/// A throwaway theme tree in a temp directory
pub struct ThemeFixture {
    dir: TempDir,
    layout: ThemeLayout,
}

impl ThemeFixture {
    /// Empty theme with only the root marker
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(themecfg::layout::THEME_ROOT_MARKER), "").unwrap();
        let layout = ThemeLayout::new(dir.path());
        Self { dir, layout }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> &ThemeLayout {
        &self.layout
    }

    pub fn with_main(self, value: Value) -> Self {
        write_json(self.layout.main_config_file(), &value);
        self
    }

    pub fn with_fragment(self, file_name: &str, value: Value) -> Self {
        write_json(&self.layout.groups_dir().join(file_name), &value);
        self
    }

    pub fn with_raw_fragment(self, file_name: &str, text: &str) -> Self {
        let path = self.layout.groups_dir().join(file_name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
        self
    }

    pub fn with_order(self, names: &[&str]) -> Self {
        write_json(self.layout.order_file(), &serde_json::json!(names));
        self
    }

    pub fn read_output(&self) -> Value {
        read_json(self.layout.output_file())
    }

    pub fn read_order(&self) -> Vec<String> {
        serde_json::from_value(read_json(self.layout.order_file())).unwrap()
    }

    pub fn read_group(&self, group: &str) -> Value {
        read_json(&self.layout.groups_dir().join(format!("{group}.json")))
    }

    /// File names in the groups directory, sorted
    pub fn group_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.layout.groups_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Every file under the theme root with its bytes
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        collect(self.root(), self.root(), &mut files);
        files
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(rel, fs::read(&path).unwrap());
        }
    }
}

pub fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
