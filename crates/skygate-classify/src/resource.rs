//! Resource kind detection.
//!
//! Decides whether a request path is a full document view, the unit counted
//! for analytics, or a static asset. Assets skip the blocklist gate and are
//! never tracked, which bounds analytics cost per page load.

/// Kind of resource a request path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A document page (html and friends).
    Document,
    Stylesheet,
    Script,
    Image,
    Font,
    Media,
    /// Anything else, including extension-less paths.
    Other,
}

impl ResourceKind {
    /// Classify a request path by its file extension.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let name = path.rsplit('/').next().unwrap_or(path);

        let Some((stem, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        if stem.is_empty() {
            // Dotfiles like `.well-known` have no extension.
            return Self::Other;
        }

        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" => Self::Document,
            "css" => Self::Stylesheet,
            "js" | "mjs" => Self::Script,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif" => Self::Image,
            "woff" | "woff2" | "ttf" | "otf" => Self::Font,
            "mp4" | "webm" | "mp3" | "ogg" | "wav" => Self::Media,
            _ => Self::Other,
        }
    }

    /// Whether a request for this kind counts as a trackable page view.
    pub fn is_trackable(&self) -> bool {
        matches!(self, Self::Document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_extensions() {
        assert_eq!(ResourceKind::from_path("/index.html"), ResourceKind::Document);
        assert_eq!(ResourceKind::from_path("/a/b/page.HTM"), ResourceKind::Document);
        assert!(ResourceKind::from_path("/index.html").is_trackable());
    }

    #[test]
    fn test_asset_extensions() {
        assert_eq!(ResourceKind::from_path("/logo.png"), ResourceKind::Image);
        assert_eq!(ResourceKind::from_path("/app.js"), ResourceKind::Script);
        assert_eq!(ResourceKind::from_path("/style.css"), ResourceKind::Stylesheet);
        assert_eq!(ResourceKind::from_path("/font.woff2"), ResourceKind::Font);
        assert_eq!(ResourceKind::from_path("/clip.webm"), ResourceKind::Media);
        assert!(!ResourceKind::from_path("/logo.png").is_trackable());
    }

    #[test]
    fn test_extension_less_paths_are_not_tracked() {
        assert_eq!(ResourceKind::from_path("/"), ResourceKind::Other);
        assert_eq!(ResourceKind::from_path("/about"), ResourceKind::Other);
        assert_eq!(ResourceKind::from_path("/a/b/"), ResourceKind::Other);
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        assert_eq!(
            ResourceKind::from_path("/index.html?utm_source=x"),
            ResourceKind::Document
        );
        assert_eq!(ResourceKind::from_path("/logo.png#top"), ResourceKind::Image);
    }

    #[test]
    fn test_dotfiles_and_unknown_extensions() {
        assert_eq!(ResourceKind::from_path("/.well-known"), ResourceKind::Other);
        assert_eq!(ResourceKind::from_path("/data.bin"), ResourceKind::Other);
    }
}
