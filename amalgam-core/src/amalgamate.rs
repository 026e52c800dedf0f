//! Depth-first inlining of local headers into a single document.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::banner::Banner;
use crate::directive::{is_local, validate_identifier, Directive, DirectiveParser, DEFAULT_GUARD};
use crate::error::{AmalgamError, Result};
use crate::output::write_atomic;
use crate::source::{DocumentSource, FsSource};

/// Namespace prefix of the library's own headers.
pub const DEFAULT_LOCAL_PREFIX: &str = "json-cpp";

const RULE_WIDTH: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmalgamOptions {
    /// Include targets starting with this prefix are inlined; all others pass through.
    pub local_prefix: String,
    /// Include-guard literal stripped from every document and written once at the top.
    /// Must be a single-line guard such as `#pragma once`; `#ifndef`/`#define`/`#endif`
    /// guards would leave their other lines unbalanced in the output.
    pub guard: String,
    /// Surround each inlined document with begin/end comment markers.
    pub markers: bool,
}

impl Default for AmalgamOptions {
    fn default() -> Self {
        Self {
            local_prefix: DEFAULT_LOCAL_PREFIX.to_string(),
            guard: DEFAULT_GUARD.to_string(),
            markers: true,
        }
    }
}

/// One document emitted into the merged output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitedDocument {
    pub id: String,
    #[serde(default)]
    pub included_from: Option<String>,
    pub depth: usize,
}

/// Result of a successful amalgamation.
#[derive(Debug, Clone)]
pub struct Amalgamation {
    /// Banner, guard, and merged body.
    pub text: String,
    /// Documents in first-encounter depth-first order.
    pub documents: Vec<VisitedDocument>,
    /// External include targets passed through, in order of first appearance.
    pub external_includes: Vec<String>,
}

impl Amalgamation {
    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }
}

pub struct Amalgamator<S> {
    source: S,
    options: AmalgamOptions,
    parser: DirectiveParser,
}

impl<S: DocumentSource> Amalgamator<S> {
    pub fn new(source: S, options: AmalgamOptions) -> Self {
        let parser = DirectiveParser::new(options.guard.clone());
        Self {
            source,
            options,
            parser,
        }
    }

    pub fn options(&self) -> &AmalgamOptions {
        &self.options
    }

    /// Merge `entry` and everything it transitively includes into one document.
    pub fn amalgamate(&self, entry: &str, banner: &Banner) -> Result<Amalgamation> {
        validate_identifier(entry).map_err(|bad| AmalgamError::InvalidEntry {
            document: entry.to_string(),
            reason: bad.reason,
        })?;

        let mut walk = Walk::default();
        walk.sink.push_raw(&banner.render(&self.options.guard));
        self.process(entry, None, 0, &mut walk)?;

        let mut externals = Vec::new();
        let mut seen = HashSet::new();
        for target in walk.external_includes {
            if seen.insert(target.clone()) {
                externals.push(target);
            }
        }

        Ok(Amalgamation {
            text: walk.sink.finish(),
            documents: walk.documents,
            external_includes: externals,
        })
    }

    fn process(
        &self,
        id: &str,
        included_from: Option<&str>,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<()> {
        if walk.visited.contains(id) {
            debug!(document = id, "already included");
            return Ok(());
        }

        let text = self
            .source
            .load(id)?
            .ok_or_else(|| AmalgamError::DocumentNotFound {
                document: id.to_string(),
                included_from: included_from.map(str::to_string),
            })?;

        walk.visited.insert(id.to_string());
        walk.documents.push(VisitedDocument {
            id: id.to_string(),
            included_from: included_from.map(str::to_string),
            depth,
        });
        info!(document = id, "processing");

        let rule = format!("//{}", "-".repeat(RULE_WIDTH));
        if self.options.markers {
            walk.sink.push(&rule);
            walk.sink.push(&format!("// {id} begin"));
            walk.sink.push("");
        }

        let mut guard_seen = false;
        let mut body: Vec<(usize, &str)> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if !guard_seen && self.parser.classify(line) == Ok(Directive::Guard) {
                guard_seen = true;
                body.clear();
                continue;
            }
            body.push((idx + 1, line));
        }
        if !guard_seen {
            warn!(document = id, guard = %self.options.guard, "no include guard; emitting whole document");
        }

        for (line_number, line) in body {
            let directive =
                self.parser
                    .classify(line)
                    .map_err(|bad| AmalgamError::MalformedDirective {
                        document: id.to_string(),
                        line_number,
                        line: line.to_string(),
                        reason: bad.reason,
                    })?;

            match directive {
                Directive::Include { target } if is_local(target, &self.options.local_prefix) => {
                    validate_identifier(target).map_err(|bad| {
                        AmalgamError::MalformedDirective {
                            document: id.to_string(),
                            line_number,
                            line: line.to_string(),
                            reason: bad.reason,
                        }
                    })?;
                    self.process(target, Some(id), depth + 1, walk)?;
                }
                Directive::Include { target } => {
                    walk.external_includes.push(target.to_string());
                    walk.sink.push(line);
                }
                Directive::Guard => {}
                Directive::Text => walk.sink.push(line),
            }
        }

        walk.sink.ensure_blank();
        if self.options.markers {
            walk.sink.push(&format!("// {id} end"));
            walk.sink.push(&rule);
            walk.sink.push("");
        }

        Ok(())
    }
}

/// State owned by a single amalgamation run.
#[derive(Default)]
struct Walk {
    visited: HashSet<String>,
    documents: Vec<VisitedDocument>,
    external_includes: Vec<String>,
    sink: Sink,
}

/// Append-only output that never emits two consecutive blank lines.
#[derive(Default)]
struct Sink {
    buf: String,
    last_blank: bool,
}

impl Sink {
    /// Pre-rendered text (the banner); must end with a newline.
    fn push_raw(&mut self, text: &str) {
        self.buf.push_str(text);
        self.last_blank = text.ends_with("\n\n") || text == "\n";
    }

    fn push(&mut self, line: &str) {
        let blank = line.trim().is_empty();
        if blank && self.last_blank {
            return;
        }
        if blank {
            self.buf.push('\n');
        } else {
            self.buf.push_str(line);
            self.buf.push('\n');
        }
        self.last_blank = blank;
    }

    fn ensure_blank(&mut self) {
        self.push("");
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Amalgamate `entry` from the files under `include_root` and write the merged
/// header to `output_path`. Nothing is written unless every document resolves.
pub fn run(
    entry: &str,
    include_root: &Path,
    output_path: &Path,
    banner: &Banner,
    options: &AmalgamOptions,
) -> Result<Amalgamation> {
    let amalgamator = Amalgamator::new(FsSource::new(include_root), options.clone());
    let merged = amalgamator.amalgamate(entry, banner)?;
    write_atomic(output_path, &merged.text)?;
    info!(
        output = %output_path.display(),
        documents = merged.documents.len(),
        "wrote amalgamated header"
    );
    Ok(merged)
}
