use std::io::{Cursor, Read};

use sha2::{Digest, Sha256};
use zip::ZipArchive;

use crate::error::IngestionError;
use crate::media;
use crate::package::{FileRecord, FileTable};

pub const MANIFEST_PATH: &str = "imsmanifest.xml";

/// Result of unpacking a course archive.
#[derive(Debug, Clone)]
pub struct IngestedArchive {
    pub files: FileTable,
    /// Raw text of the root `imsmanifest.xml`, when the archive has one
    pub manifest_document: Option<String>,
    /// SHA-256 hex of the archive bytes
    pub sha256: String,
}

/// Unpack a ZIP course archive into a [`FileTable`].
///
/// Directory entries are skipped. Files on the binary extension allowlist
/// are stored base64-encoded; everything else is decoded as (lossy) UTF-8.
/// The root manifest is matched case-insensitively and kept both in the file
/// table and as `manifest_document`.
pub fn ingest_archive(bytes: &[u8]) -> Result<IngestedArchive, IngestionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = FileTable::new();
    let mut manifest_document = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let path = normalize_path(entry.name());
        if path.is_empty() {
            continue;
        }

        let mut raw = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut raw).map_err(|e| {
            IngestionError::CorruptArchive(format!("cannot read entry {path}: {e}"))
        })?;

        if path.eq_ignore_ascii_case(MANIFEST_PATH) {
            let text = String::from_utf8_lossy(&raw).into_owned();
            manifest_document = Some(text.clone());
            files.insert(FileRecord::text(path, text));
        } else if media::is_binary(&path) {
            files.insert(FileRecord::binary(path, &raw));
        } else {
            files.insert(FileRecord::text(path, String::from_utf8_lossy(&raw)));
        }
    }

    let sha256 = hex::encode(Sha256::digest(bytes));

    tracing::debug!(
        files = files.len(),
        has_manifest = manifest_document.is_some(),
        "Archive ingested"
    );

    Ok(IngestedArchive {
        files,
        manifest_document,
        sha256,
    })
}

/// Normalize an archive member name to a `/`-separated relative path.
pub fn normalize_path(name: &str) -> String {
    let mut path = name.replace('\\', "/");
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest.to_string();
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest.to_string();
        } else {
            break;
        }
    }
    path
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::package::Encoding;

    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn classifies_text_and_binary_entries() {
        let zip = build_zip(&[
            ("index.html", b"<html></html>"),
            ("img/", b""),
            ("img/logo.png", &[0x89, b'P', b'N', b'G']),
        ]);

        let ingested = ingest_archive(&zip).unwrap();

        assert_eq!(ingested.files.len(), 2);
        let html = ingested.files.get("index.html").unwrap();
        assert_eq!(html.encoding, Encoding::Text);
        assert_eq!(html.content, "<html></html>");
        let png = ingested.files.get("img/logo.png").unwrap();
        assert_eq!(png.encoding, Encoding::Base64);
        assert_eq!(png.bytes().unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert!(ingested.manifest_document.is_none());
        assert_eq!(ingested.sha256.len(), 64);
    }

    #[test]
    fn finds_manifest_case_insensitively() {
        let zip = build_zip(&[("IMSManifest.XML", b"<manifest/>"), ("a.html", b"a")]);

        let ingested = ingest_archive(&zip).unwrap();

        assert_eq!(ingested.manifest_document.as_deref(), Some("<manifest/>"));
        assert!(ingested.files.contains("imsmanifest.xml"));
    }

    #[test]
    fn nested_manifest_is_not_the_package_manifest() {
        let zip = build_zip(&[("sub/imsmanifest.xml", b"<manifest/>")]);

        let ingested = ingest_archive(&zip).unwrap();

        assert!(ingested.manifest_document.is_none());
        assert!(ingested.files.contains("sub/imsmanifest.xml"));
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = ingest_archive(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, IngestionError::CorruptArchive(_)));
    }

    #[test]
    fn normalizes_member_names() {
        assert_eq!(normalize_path("./content\\page.html"), "content/page.html");
        assert_eq!(normalize_path("/index.html"), "index.html");
    }
}
