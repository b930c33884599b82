//! Turns a stored course package into a document a sandboxed context can
//! play without network access.
//!
//! The entry document's literal `src`/`href` attributes that point at files
//! inside the package are replaced by resource handles, and a small script
//! is injected that lets the content find the runtime API in an ancestor
//! context. Only the entry document is rewritten: references made from
//! stylesheets, scripts or documents it links to are not.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use scorm_core::media;
use scorm_core::{CoursePackage, Encoding, FileRecord, FileTable};

use crate::error::VirtualizeError;
use crate::resources::{ResourceHandle, ResourceRegistry};

/// Ancestor contexts the discovery script climbs before giving up.
pub const DISCOVERY_MAX_DEPTH: usize = 7;

/// Capabilities granted to the sandboxed context.
///
/// `allow-scripts` combined with `allow-same-origin` lets framed content
/// remove its own `sandbox` attribute, so this isolates packaged files from
/// the network, not from the embedding page.
pub const SANDBOX_FLAGS: [&str; 4] = [
    "allow-scripts",
    "allow-same-origin",
    "allow-forms",
    "allow-popups",
];

const DISCOVERY_SCRIPT: &str = r#"<script>
(function () {
  function findApi(win, name) {
    for (var depth = 0; win && depth <= 7; depth++) {
      try {
        if (win[name]) { return win[name]; }
      } catch (e) {
        return null;
      }
      if (!win.parent || win.parent === win) { break; }
      win = win.parent;
    }
    return null;
  }
  var api = findApi(window, "API");
  var api2004 = findApi(window, "API_1484_11");
  if (api) { window.API = api; }
  if (api2004) { window.API_1484_11 = api2004; }
})();
</script>"#;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\b(src|href)=(?:"([^"]+)"|'([^']+)')"#).expect("valid reference pattern")
    })
}

fn head_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid head pattern"))
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("valid html pattern"))
}

/// A course's entry document, ready to hand to a playback host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDocument {
    pub course_id: String,
    pub entry_path: String,
    /// Processed markup. For a non-HTML entry document this is the stored
    /// text unchanged, or empty when the document is binary.
    pub html: String,
    /// Handle serving the processed entry document.
    pub handle: ResourceHandle,
    /// Number of references replaced by resource handles.
    pub rewritten: usize,
    /// Value for the sandboxed frame's `sandbox` attribute.
    pub sandbox: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContentVirtualizer {
    registry: ResourceRegistry,
}

impl ContentVirtualizer {
    pub fn new(registry: ResourceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn prepare(&self, course: &CoursePackage) -> Result<PreparedDocument, VirtualizeError> {
        let course_id = course.id().to_string();
        let entry_path = course
            .record
            .entry_path
            .clone()
            .ok_or_else(|| VirtualizeError::NoEntryPoint(course_id.clone()))?;
        let entry = course
            .entry_document()
            .ok_or_else(|| VirtualizeError::MissingEntryDocument {
                course_id: course_id.clone(),
                path: entry_path.clone(),
            })?;

        let (html, handle, rewritten) = if media::is_html(&entry.path) {
            let (rewritten_html, rewritten) = self.rewrite_references(entry, &course.files);
            let html = inject_discovery(&rewritten_html);
            let handle = self
                .registry
                .create(html.clone().into_bytes(), "text/html");
            (html, handle, rewritten)
        } else {
            tracing::debug!(course_id = %course_id, entry_path = %entry.path, "Entry document is not HTML, serving as-is");
            let bytes = self.decode(entry).unwrap_or_default();
            let html = match entry.encoding {
                Encoding::Text => entry.content.clone(),
                Encoding::Base64 => String::new(),
            };
            let handle = self.registry.create(bytes, &entry.media_type);
            (html, handle, 0)
        };

        tracing::info!(
            course_id = %course_id,
            entry_path = %entry_path,
            rewritten,
            handle = %handle.url,
            "Course document prepared"
        );

        Ok(PreparedDocument {
            course_id,
            entry_path,
            html,
            handle,
            rewritten,
            sandbox: SANDBOX_FLAGS.join(" "),
        })
    }

    /// Replace in-package `src`/`href` targets with resource handles.
    fn rewrite_references(&self, entry: &FileRecord, files: &FileTable) -> (String, usize) {
        let base_dir = match entry.path.rfind('/') {
            Some(pos) => &entry.path[..=pos],
            None => "",
        };
        let mut rewritten = 0;

        let html = reference_pattern().replace_all(&entry.content, |caps: &Captures| {
            let attribute = &caps[1];
            let (reference, quote) = match caps.get(2) {
                Some(value) => (value.as_str(), '"'),
                None => (&caps[3], '\''),
            };

            if is_absolute(reference) {
                return caps[0].to_string();
            }
            let Some(target) = lookup(files, base_dir, reference) else {
                tracing::trace!(reference, "Reference not in package, left as-is");
                return caps[0].to_string();
            };
            let Some(bytes) = self.decode(target) else {
                return caps[0].to_string();
            };

            let handle = self.registry.create(bytes, &target.media_type);
            rewritten += 1;
            tracing::trace!(reference, url = %handle.url, "Reference rewritten");
            format!("{attribute}={quote}{}{quote}", handle.url)
        });

        (html.into_owned(), rewritten)
    }

    fn decode(&self, record: &FileRecord) -> Option<Vec<u8>> {
        match record.bytes() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %record.path, error = %e, "Stored file is not valid base64");
                None
            }
        }
    }
}

/// Scheme-qualified, protocol-relative, or inline data.
fn is_absolute(reference: &str) -> bool {
    if reference.starts_with("//") {
        return true;
    }
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve a relative reference against the entry document's directory,
/// falling back to the reference as written.
fn lookup<'a>(files: &'a FileTable, base_dir: &str, reference: &str) -> Option<&'a FileRecord> {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    if path.is_empty() {
        return None;
    }

    let resolved = match path.strip_prefix('/') {
        Some(rooted) => normalize(rooted),
        None => normalize(&format!("{base_dir}{path}")),
    };
    files.get(&resolved).or_else(|| files.get(path))
}

/// Collapse `.` and `..` segments. `..` above the package root is dropped.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Insert the discovery script after `<head>`, else after `<html>`, else
/// at the very start.
fn inject_discovery(html: &str) -> String {
    let position = head_tag_pattern()
        .find(html)
        .or_else(|| html_tag_pattern().find(html))
        .map(|tag| tag.end())
        .unwrap_or(0);

    let mut out = String::with_capacity(html.len() + DISCOVERY_SCRIPT.len());
    out.push_str(&html[..position]);
    out.push_str(DISCOVERY_SCRIPT);
    out.push_str(&html[position..]);
    out
}
