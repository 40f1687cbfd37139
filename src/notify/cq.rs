//! CQ code helpers for embedding media in chat messages.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Escape a value for use inside a CQ code parameter.
pub fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
        .replace(',', "&#44;")
}

/// `[CQ:image,file=...]` for a URL or a `base64://` payload.
pub fn image(file: &str) -> String {
    format!("[CQ:image,file={}]", escape(file))
}

/// Embed raw PNG bytes as an inline image.
pub fn image_bytes(png: &[u8]) -> String {
    image(&format!("base64://{}", STANDARD.encode(png)))
}

/// GitHub's generated social preview card for a repository path.
pub fn opengraph(path: &str) -> String {
    image(&format!("https://opengraph.githubassets.com/0/{}", path))
}
