use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::media;
use crate::package::{FileTable, Manifest, default_version};

/// Entry documents tried, in order, when the manifest does not name one.
pub const FALLBACK_ENTRY_POINTS: &[&str] = &["index.html", "index.htm", "launch.html", "start.html"];

/// Parse the parts of `imsmanifest.xml` the player uses.
///
/// Malformed XML is not an error: it is logged and `None` is returned, and
/// entry resolution falls back to filename heuristics.
pub fn parse_manifest(xml: &str) -> Option<Manifest> {
    match read_manifest(xml) {
        Ok(manifest) => Some(manifest),
        Err(reason) => {
            tracing::warn!(%reason, "Manifest unreadable, using fallback entry resolution");
            None
        }
    }
}

#[derive(Default)]
struct ManifestFields {
    title: Option<String>,
    launch_path: Option<String>,
    version: Option<String>,
}

fn read_manifest(xml: &str) -> Result<Manifest, String> {
    let mut reader = Reader::from_str(xml);
    let mut fields = ManifestFields::default();
    let mut saw_element = false;

    // Text of the first <title>, collected across nested elements. Only the
    // first one counts, even if it turns out empty.
    let mut title_text: Option<String> = None;
    let mut title_depth = 0usize;
    let mut title_seen = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                saw_element = true;
                if title_text.is_some() {
                    title_depth += 1;
                    continue;
                }
                inspect_element(&e, &mut fields)?;
                if !title_seen && e.local_name().as_ref() == b"title" {
                    title_seen = true;
                    title_text = Some(String::new());
                    title_depth = 0;
                }
            }
            Event::Empty(e) => {
                saw_element = true;
                if title_text.is_none() {
                    inspect_element(&e, &mut fields)?;
                    if e.local_name().as_ref() == b"title" {
                        title_seen = true;
                    }
                }
            }
            Event::Text(t) => {
                if let Some(text) = title_text.as_mut() {
                    text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(c) => {
                if let Some(text) = title_text.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if title_depth > 0 {
                    title_depth -= 1;
                } else if let Some(text) = title_text.take() {
                    let text = text.trim();
                    if !text.is_empty() {
                        fields.title = Some(text.to_string());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_element {
        return Err("document has no elements".into());
    }

    Ok(Manifest {
        title: fields.title,
        launch_path: fields.launch_path,
        description: String::new(),
        version: fields.version.unwrap_or_else(default_version),
    })
}

fn inspect_element(element: &BytesStart<'_>, fields: &mut ManifestFields) -> Result<(), String> {
    match element.local_name().as_ref() {
        b"manifest" if fields.version.is_none() => {
            fields.version = attribute(element, b"version")?;
        }
        b"resource" if fields.launch_path.is_none() => {
            let is_webcontent = attribute(element, b"type")?
                .is_some_and(|t| t.to_ascii_lowercase().contains("webcontent"));
            if is_webcontent {
                fields.launch_path = attribute(element, b"href")?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Pick the document to launch.
///
/// Order: the manifest's launch path when it exists in the package, then the
/// first of [`FALLBACK_ENTRY_POINTS`] present, then the first `.html`/`.htm`
/// file in archive order. `None` is not an error here; playback rejects the
/// course later.
pub fn resolve_entry_point(manifest: Option<&Manifest>, files: &FileTable) -> Option<String> {
    if let Some(launch) = manifest.and_then(|m| m.launch_path.as_deref()) {
        let without_query = launch.split(['?', '#']).next().unwrap_or(launch);
        if let Some(record) = files.get(launch).or_else(|| files.get(without_query)) {
            return Some(record.path.clone());
        }
        tracing::debug!(launch, "Manifest launch path not in package");
    }

    for candidate in FALLBACK_ENTRY_POINTS {
        if let Some(record) = files.get(candidate) {
            return Some(record.path.clone());
        }
    }

    files
        .iter()
        .find(|record| media::is_html(&record.path))
        .map(|record| record.path.clone())
}
