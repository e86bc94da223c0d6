//! Change Classification
//!
//! Pure functions sorting changed source paths into the work they need.
//! No actor machinery, no side effects.

use regex::Regex;

/// What a changed source file needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Goes through the generator (full site pass).
    Renderable,
    /// Copied to or removed from the destination file-for-file.
    Passthrough,
    /// Private generator input (`_includes/x.rb`, `_notes.txt`).
    Ignored,
}

/// Classify one slash-separated, source-relative path.
///
/// Renderable wins: `_layouts/default.html` rebuilds the site even though
/// its directory is private.
pub fn classify_path(rel_path: &str, content: &Regex) -> PathClass {
    if content.is_match(rel_path) {
        PathClass::Renderable
    } else if rel_path.split('/').any(|part| part.starts_with('_')) {
        PathClass::Ignored
    } else {
        PathClass::Passthrough
    }
}

/// Paths grouped by [`PathClass`], each group in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classified {
    pub renderable: Vec<String>,
    pub passthrough: Vec<String>,
    pub ignored: Vec<String>,
}

impl Classified {
    pub fn needs_build(&self) -> bool {
        !self.renderable.is_empty()
    }
}

/// Classify a batch of changed paths.
pub fn classify<'a, I>(paths: I, content: &Regex) -> Classified
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Classified::default();
    for path in paths {
        let bucket = match classify_path(path, content) {
            PathClass::Renderable => &mut out.renderable,
            PathClass::Passthrough => &mut out.passthrough,
            PathClass::Ignored => &mut out.ignored,
        };
        bucket.push(path.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildSection;

    fn content() -> Regex {
        BuildSection::default().content_pattern().unwrap()
    }

    #[test]
    fn test_classify_path() {
        let re = content();

        assert_eq!(classify_path("about.md", &re), PathClass::Renderable);
        assert_eq!(classify_path("_posts/2024-01-01-a.markdown", &re), PathClass::Renderable);
        assert_eq!(classify_path("_layouts/default.html", &re), PathClass::Renderable);
        assert_eq!(classify_path("assets/logo.png", &re), PathClass::Passthrough);
        assert_eq!(classify_path("robots.txt", &re), PathClass::Passthrough);
        assert_eq!(classify_path("_sass/base.scss", &re), PathClass::Ignored);
        assert_eq!(classify_path("_drafts.txt", &re), PathClass::Ignored);
        assert_eq!(classify_path("assets/_partial.css", &re), PathClass::Ignored);
        // underscore inside a name is not private
        assert_eq!(classify_path("my_photo.jpg", &re), PathClass::Passthrough);
    }

    #[test]
    fn test_classify_batch() {
        let re = content();
        let result = classify(
            ["index.md", "css/site.css", "_data/nav.yml", "img/a.png", "post.HTML"],
            &re,
        );

        assert_eq!(result.renderable, vec!["index.md", "post.HTML"]);
        assert_eq!(result.passthrough, vec!["css/site.css", "img/a.png"]);
        assert_eq!(result.ignored, vec!["_data/nav.yml"]);
        assert!(result.needs_build());
    }

    #[test]
    fn test_static_only_needs_no_build() {
        let re = content();
        let result = classify(["css/site.css", "_config.rb"], &re);
        assert!(!result.needs_build());
    }

    #[test]
    fn test_extra_extensions() {
        let mut section = BuildSection::default();
        section.extensions = vec!["adoc".into()];
        let re = section.content_pattern().unwrap();
        assert_eq!(classify_path("guide.adoc", &re), PathClass::Renderable);
        assert_eq!(classify_path("guide.adoc", &content()), PathClass::Passthrough);
    }
}
