//! Local image embedding.
//!
//! Mail recipients cannot resolve paths on the sender's disk, so `img`
//! elements pointing at existing local files are rewritten to base64 data
//! URIs. This is the only filesystem access in the crate; hosts call it
//! before handing the tree to the pure pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};

use md2outlook_markup::Node;

/// Media type for an image file, from its extension
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn is_local(src: &str) -> bool {
    !(src.is_empty()
        || src.contains("://")
        || src.starts_with("//")
        || src.starts_with("data:")
        || src.starts_with("cid:")
        || src.starts_with("mailto:"))
}

/// Filesystem path of a local `src`: query and fragment dropped, percent
/// escapes decoded. Undecodable escapes are kept as written.
fn local_path(base_dir: &Path, src: &str) -> PathBuf {
    let src = src.split(['?', '#']).next().unwrap_or(src);
    match urlencoding::decode(src) {
        Ok(decoded) => base_dir.join(decoded.as_ref()),
        Err(_) => base_dir.join(src),
    }
}

/// Inline every local image below `root` that exists relative to `base_dir`.
/// Returns the number of images embedded.
pub fn embed_local_images(root: &mut Node, base_dir: &Path) -> usize {
    let mut embedded = 0;
    root.for_each_element_mut(&mut |element| {
        if element.tag != "img" {
            return;
        }
        let Some(src) = element.attr("src").filter(|src| is_local(src)) else {
            return;
        };

        let path = local_path(base_dir, src);
        if !path.is_file() {
            debug!("Image not found, leaving reference: {}", path.display());
            return;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                let uri = format!("data:{};base64,{}", mime_type(&path), STANDARD.encode(bytes));
                element.set_attr("src", &uri);
                embedded += 1;
            }
            Err(e) => warn!("Could not read image {}: {}", path.display(), e),
        }
    });
    embedded
}
