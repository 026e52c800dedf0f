use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::tempdir;

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, text) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write fixture");
    }
}

fn json_cpp_project(root: &Path) {
    write_tree(
        root,
        &[
            (
                "include/json-cpp.hpp",
                "// JSON for C++\n// Belongs to the public domain\n\n#pragma once\n\n#include <json-cpp/parse.hpp>\n#include <json-cpp/generate.hpp>\n",
            ),
            (
                "include/json-cpp/parse.hpp",
                "// parser\n#pragma once\n\n#include <string>\n#include <json-cpp/details/parser_utility.hpp>\n\nnamespace jsoncpp { void parse(); }\n",
            ),
            (
                "include/json-cpp/generate.hpp",
                "#pragma once\n#include <json-cpp/details/parser_utility.hpp>\n\n\nnamespace jsoncpp { void generate(); }\n",
            ),
            (
                "include/json-cpp/details/parser_utility.hpp",
                "#pragma once\n\nnamespace jsoncpp { namespace details { int utility; } }\n",
            ),
            (
                "include/json-cpp/unused.hpp",
                "#pragma once\nint unused;\n",
            ),
        ],
    );
}

fn amalgam(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_amalgam"))
        .args(args)
        .current_dir(dir)
        .env("SOURCE_DATE_EPOCH", "0")
        .env_remove("AMALGAM_CONFIG")
        .env("RUST_LOG", "warn")
        .env("GIT_DIR", dir.join("no-such-git-dir"))
        .output()
        .expect("run amalgam")
}

#[test]
fn default_invocation_writes_single_include() {
    let tmp = tempdir().expect("tempdir");
    json_cpp_project(tmp.path());

    let output = amalgam(tmp.path(), &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let merged =
        fs::read_to_string(tmp.path().join("single_include/json-cpp.hpp")).expect("merged header");
    assert!(merged.starts_with("//\n// DO NOT EDIT !!!"));
    assert!(merged.contains("// Version 0.1 alpha, rev. unknown\n"));
    assert!(merged.contains("// Generated 1970-01-01 00:00:00 UTC\n"));
    assert_eq!(merged.matches("#pragma once").count(), 1);
    assert_eq!(merged.matches("int utility;").count(), 1);
    assert!(merged.contains("#include <string>"));
    assert!(!merged.contains("#include <json-cpp"));
    assert!(!merged.contains("int unused;"));
    assert!(!merged.contains("\n\n\n"));

    let parse = merged.find("void parse();").expect("parse");
    let generate = merged.find("void generate();").expect("generate");
    let utility = merged.find("int utility;").expect("utility");
    assert!(utility < parse && parse < generate);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("json-cpp/unused.hpp"), "stderr: {stderr}");
}

#[test]
fn repeated_runs_are_byte_identical() {
    let tmp = tempdir().expect("tempdir");
    json_cpp_project(tmp.path());
    let dest = tmp.path().join("single_include/json-cpp.hpp");

    assert!(amalgam(tmp.path(), &["build", "--revision", "r"]).status.success());
    let first = fs::read(&dest).expect("first");
    assert!(amalgam(tmp.path(), &["build", "--revision", "r"]).status.success());
    let second = fs::read(&dest).expect("second");

    assert_eq!(first, second);
}

#[test]
fn missing_header_fails_without_output() {
    let tmp = tempdir().expect("tempdir");
    write_tree(
        tmp.path(),
        &[(
            "include/json-cpp.hpp",
            "#pragma once\n#include <json-cpp/absent.hpp>\n",
        )],
    );

    let output = amalgam(tmp.path(), &["build", "--revision", "r"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("json-cpp/absent.hpp"), "stderr: {stderr}");
    assert!(!tmp.path().join("single_include/json-cpp.hpp").exists());
}

#[test]
fn config_file_drives_a_custom_library() {
    let tmp = tempdir().expect("tempdir");
    write_tree(
        tmp.path(),
        &[
            (
                "amalgam.toml",
                "entry = \"mylib.hpp\"\ninclude_root = \"src\"\noutput = \"dist/mylib.hpp\"\nlocal_prefix = \"mylib\"\nmarkers = false\n\n[banner]\ntitle = \"My Lib\"\nurl = \"\"\nversion = \"3.1\"\nlicense = \"MIT\"\n",
            ),
            ("src/mylib.hpp", "#pragma once\n#include <mylib/core.hpp>\n"),
            ("src/mylib/core.hpp", "#pragma once\nint core;\n"),
        ],
    );

    let output = amalgam(tmp.path(), &["build", "--revision", "abc"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let merged = fs::read_to_string(tmp.path().join("dist/mylib.hpp")).expect("merged");
    assert!(merged.contains("// My Lib\n// Version 3.1, rev. abc\n"));
    assert!(merged.contains("int core;"));
    assert!(!merged.contains(" begin\n"));
}

#[test]
fn list_json_reports_traversal_order() {
    let tmp = tempdir().expect("tempdir");
    json_cpp_project(tmp.path());

    let output = amalgam(tmp.path(), &["list", "--json"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed: Value = serde_json::from_slice(&output.stdout).expect("json");
    let ids: Vec<&str> = parsed
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|doc| doc["id"].as_str())
        .collect();
    assert_eq!(
        ids,
        [
            "json-cpp.hpp",
            "json-cpp/parse.hpp",
            "json-cpp/details/parser_utility.hpp",
            "json-cpp/generate.hpp",
        ]
    );
    assert!(!tmp.path().join("single_include").exists());
}

#[test]
fn list_unreached_names_orphans() {
    let tmp = tempdir().expect("tempdir");
    json_cpp_project(tmp.path());

    let output = amalgam(tmp.path(), &["list", "--unreached"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["json-cpp/unused.hpp"]);
}
