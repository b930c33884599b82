/// Extensions whose content is stored base64-encoded rather than as text.
const BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "ico", "mp3", "mp4", "wav", "avi", "mov", "pdf",
    "swf", "woff", "woff2", "ttf", "eot", "zip", "exe",
];

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Lowercased extension of a package path, without the dot.
///
/// Only the final path segment is considered, so `media.v2/readme` has no
/// extension.
pub fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn is_binary(path: &str) -> bool {
    extension(path).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_html(path: &str) -> bool {
    matches!(extension(path).as_deref(), Some("html" | "htm"))
}

/// Media type served for a packaged file.
pub fn media_type(path: &str) -> &'static str {
    let Some(ext) = extension(path) else {
        return DEFAULT_MEDIA_TYPE;
    };
    match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "pdf" => "application/pdf",
        "swf" => "application/x-shockwave-flash",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => DEFAULT_MEDIA_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_binary_by_extension() {
        assert!(is_binary("images/LOGO.PNG"));
        assert!(is_binary("fonts/icons.woff2"));
        assert!(!is_binary("style.css"));
        assert!(!is_binary("README"));
    }

    #[test]
    fn extension_ignores_directory_dots() {
        assert_eq!(extension("media.v2/readme"), None);
        assert_eq!(extension("a/b.c/page.HTM"), Some("htm".into()));
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(media_type("data.bin"), "application/octet-stream");
        assert_eq!(media_type("Makefile"), "application/octet-stream");
        assert_eq!(media_type("index.html"), "text/html");
        assert_eq!(media_type("logo.png"), "image/png");
    }
}
