//! Project configuration (`amalgam.toml`).
//!
//! Every field is optional; a missing file means all defaults. Relative paths
//! are resolved against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::amalgamate::{AmalgamOptions, DEFAULT_LOCAL_PREFIX};
use crate::directive::DEFAULT_GUARD;
use crate::error::{AmalgamError, Result};
use crate::smoke::SmokeTest;

pub const CONFIG_FILE_NAME: &str = "amalgam.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AmalgamConfig {
    /// Root header, relative to `include_root`.
    pub entry: String,
    pub include_root: PathBuf,
    pub output: PathBuf,
    pub local_prefix: String,
    /// Single-line include guard, matched against whole trimmed lines.
    pub guard: String,
    pub markers: bool,
    pub banner: BannerConfig,
    pub smoke: SmokeConfig,
}

impl Default for AmalgamConfig {
    fn default() -> Self {
        Self {
            entry: "json-cpp.hpp".to_owned(),
            include_root: PathBuf::from("include"),
            output: PathBuf::from("single_include/json-cpp.hpp"),
            local_prefix: DEFAULT_LOCAL_PREFIX.to_owned(),
            guard: DEFAULT_GUARD.to_owned(),
            markers: true,
            banner: BannerConfig::default(),
            smoke: SmokeConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BannerConfig {
    pub title: String,
    pub url: String,
    pub version: String,
    pub license: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: "JSON for C++".to_owned(),
            url: "https://github.com/ascheglov/json-cpp".to_owned(),
            version: "0.1 alpha".to_owned(),
            license: "Belongs to the public domain".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SmokeConfig {
    pub compiler: String,
    pub flags: Vec<String>,
    pub sources: Vec<PathBuf>,
    pub run: bool,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            compiler: "g++".to_owned(),
            flags: ["-std=c++11", "-Wall", "-Werror", "-Wno-parentheses"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            sources: ["tests/tests_main.cpp", "tests/examples.cpp", "tests/variant_example.cpp"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            run: true,
        }
    }
}

impl SmokeConfig {
    pub fn to_smoke_test(&self, base: &Path) -> SmokeTest {
        SmokeTest {
            compiler: self.compiler.clone(),
            flags: self.flags.clone(),
            sources: self.sources.iter().map(|s| base.join(s)).collect(),
            run: self.run,
        }
    }
}

impl AmalgamConfig {
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|err| AmalgamError::Config {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AmalgamError::io(path, err)),
        }
    }

    pub fn options(&self) -> AmalgamOptions {
        AmalgamOptions {
            local_prefix: self.local_prefix.clone(),
            guard: self.guard.clone(),
            markers: self.markers,
        }
    }

    pub fn include_root_in(&self, base: &Path) -> PathBuf {
        base.join(&self.include_root)
    }

    pub fn output_in(&self, base: &Path) -> PathBuf {
        base.join(&self.output)
    }
}
