//! Generated-file banner and the metadata it carries.

use std::env;
use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Revision written when the VCS query yields nothing.
pub const UNKNOWN_REVISION: &str = "unknown";

/// Environment variable that pins the generation timestamp.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Metadata stamped at the top of every generated header. Computed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub title: String,
    pub url: String,
    pub license: String,
    pub version: String,
    pub revision: String,
    pub generated: DateTime<Utc>,
}

impl Banner {
    /// Render the comment block, then the single include guard, then a blank line.
    pub fn render(&self, guard: &str) -> String {
        let mut out = String::new();
        out.push_str("//\n");
        out.push_str("// DO NOT EDIT !!! This file was generated with a script.\n");
        out.push_str("//\n");
        let _ = writeln!(out, "// {}", self.title);
        if !self.url.is_empty() {
            let _ = writeln!(out, "// {}", self.url);
        }
        let _ = writeln!(out, "// Version {}, rev. {}", self.version, self.revision);
        let _ = writeln!(
            out,
            "// Generated {} UTC",
            self.generated.format("%Y-%m-%d %H:%M:%S")
        );
        out.push_str("//\n");
        let _ = writeln!(out, "// {}", self.license);
        out.push('\n');
        let _ = writeln!(out, "{guard}");
        out.push('\n');
        out
    }
}

/// Current commit of the working tree containing `dir`, via `git rev-parse HEAD`.
///
/// Any failure (git missing, not a repository, empty output) returns `None`.
pub fn query_revision(dir: &Path) -> Option<String> {
    let output = match Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            warn!(error = %err, "revision query could not start git");
            return None;
        }
    };

    if !output.status.success() {
        warn!(
            status = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "revision query failed"
        );
        return None;
    }

    let rev = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if rev.is_empty() {
        warn!("revision query returned no output");
        return None;
    }
    debug!(%rev, "resolved revision");
    Some(rev)
}

/// Generation timestamp, pinned by `SOURCE_DATE_EPOCH` when set.
pub fn generation_time() -> DateTime<Utc> {
    let pinned = env::var(SOURCE_DATE_EPOCH).ok();
    generation_time_from(pinned.as_deref()).unwrap_or_else(Utc::now)
}

fn generation_time_from(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0)) {
        Some(ts) => Some(ts),
        None => {
            warn!(value = raw, "ignoring unparsable SOURCE_DATE_EPOCH");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Banner {
        Banner {
            title: "JSON for C++".to_string(),
            url: "https://github.com/ascheglov/json-cpp".to_string(),
            license: "Belongs to the public domain".to_string(),
            version: "0.1 alpha".to_string(),
            revision: "abc123".to_string(),
            generated: DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp"),
        }
    }

    #[test]
    fn renders_banner_then_guard() {
        let text = sample().render("#pragma once");
        let expected = "//\n\
// DO NOT EDIT !!! This file was generated with a script.\n\
//\n\
// JSON for C++\n\
// https://github.com/ascheglov/json-cpp\n\
// Version 0.1 alpha, rev. abc123\n\
// Generated 2023-11-14 22:13:20 UTC\n\
//\n\
// Belongs to the public domain\n\
\n\
#pragma once\n\
\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_url_line_is_omitted() {
        let mut banner = sample();
        banner.url.clear();
        let text = banner.render("#pragma once");
        assert!(!text.contains("// \n"));
        assert_eq!(text.matches("#pragma once").count(), 1);
    }

    #[test]
    fn pinned_epoch_parses() {
        let ts = generation_time_from(Some("0")).expect("epoch");
        assert_eq!(ts.timestamp(), 0);
        assert!(generation_time_from(Some("yesterday")).is_none());
        assert!(generation_time_from(Some("")).is_none());
        assert!(generation_time_from(None).is_none());
    }

    #[test]
    fn revision_query_in_missing_directory_is_none() {
        let tmp = tempfile::tempdir().expect("tempdir");
        // git cannot even be spawned with a nonexistent working directory.
        assert_eq!(query_revision(&tmp.path().join("gone")), None);
    }
}
