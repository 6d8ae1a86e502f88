//! Dotted import paths and the healing marker.
//!
//! An import path such as `modules.tools.greet` names the file
//! `modules/tools/greet.<ext>` relative to a search root. After the resolver
//! finds a module only under a fallback root it appends a marker recording
//! that root:
//!
//! ```text
//! modules.tools.greet # healed: ..
//! ```
//!
//! The marked root is then tried first on later resolutions.

use std::fmt;
use std::path::PathBuf;

/// Separator between the dotted path and the healed root.
pub const HEALED_MARKER: &str = " # healed: ";

/// A parsed import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPath {
    segments: Vec<String>,
    healed_root: Option<String>,
}

/// Reasons an import path string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportPathError {
    /// Nothing before the marker.
    #[error("import path is empty")]
    Empty,
    /// A segment is empty or contains characters that cannot name a file.
    #[error("invalid segment '{segment}' in import path '{path}'")]
    InvalidSegment {
        /// The whole dotted path.
        path: String,
        /// The offending segment.
        segment: String,
    },
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl ImportPath {
    /// Parse a stored import path, with or without a healing marker.
    ///
    /// Anything after a bare ` #` that is not a healing marker is treated as
    /// a comment and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ImportPathError`] if the dotted part is empty or has a
    /// segment that is not a plain identifier.
    pub fn parse(raw: &str) -> Result<Self, ImportPathError> {
        let (dotted, healed_root) = match raw.split_once(HEALED_MARKER) {
            Some((dotted, root)) => {
                let root = root.trim();
                (dotted, (!root.is_empty()).then(|| root.to_owned()))
            },
            None => (raw.split_once(" #").map_or(raw, |(d, _)| d), None),
        };

        let dotted = dotted.trim();
        if dotted.is_empty() {
            return Err(ImportPathError::Empty);
        }

        let segments = dotted
            .split('.')
            .map(|segment| {
                if valid_segment(segment) {
                    Ok(segment.to_owned())
                } else {
                    Err(ImportPathError::InvalidSegment {
                        path: dotted.to_owned(),
                        segment: segment.to_owned(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            healed_root,
        })
    }

    /// Build an import path from individual segments.
    ///
    /// Each segment is checked on its own, so a segment containing a dot is
    /// rejected rather than split.
    ///
    /// # Errors
    ///
    /// Returns [`ImportPathError`] if there are no segments or any segment
    /// is invalid.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ImportPathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect();
        if segments.is_empty() {
            return Err(ImportPathError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !valid_segment(s)) {
            return Err(ImportPathError::InvalidSegment {
                path: segments.join("."),
                segment: bad.clone(),
            });
        }
        Ok(Self {
            segments,
            healed_root: None,
        })
    }

    /// The dotted part without any marker.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Root recorded by a previous fallback resolution.
    #[must_use]
    pub fn healed_root(&self) -> Option<&str> {
        self.healed_root.as_deref()
    }

    /// The same path marked as found under `root`.
    #[must_use]
    pub fn healed_at(&self, root: &str) -> Self {
        Self {
            segments: self.segments.clone(),
            healed_root: Some(root.to_owned()),
        }
    }

    /// Relative file path for a loader extension (`a.b.c` → `a/b/c.rhai`).
    #[must_use]
    pub fn relative_file(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.segments.iter().collect();
        path.set_extension(extension);
        path
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())?;
        if let Some(root) = &self.healed_root {
            write!(f, "{HEALED_MARKER}{root}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parses_plain_path() {
        let path = ImportPath::parse("modules.tools.greet").unwrap();
        assert_eq!(path.dotted(), "modules.tools.greet");
        assert!(path.healed_root().is_none());
        assert_eq!(
            path.relative_file("rhai"),
            Path::new("modules").join("tools").join("greet.rhai")
        );
    }

    #[test]
    fn healed_form_round_trips_through_display() {
        let healed = ImportPath::parse("modules.greet").unwrap().healed_at("..");
        let text = healed.to_string();
        assert_eq!(text, "modules.greet # healed: ..");

        let reparsed = ImportPath::parse(&text).unwrap();
        assert_eq!(reparsed, healed);
        assert_eq!(reparsed.healed_root(), Some(".."));
    }

    #[test]
    fn foreign_comment_is_ignored() {
        let path = ImportPath::parse("modules.greet # moved by hand").unwrap();
        assert_eq!(path.dotted(), "modules.greet");
        assert!(path.healed_root().is_none());
    }

    #[test]
    fn rejects_traversal_and_empty_segments() {
        assert_eq!(ImportPath::parse("  "), Err(ImportPathError::Empty));
        assert!(matches!(
            ImportPath::parse("modules..greet"),
            Err(ImportPathError::InvalidSegment { .. })
        ));
        assert!(matches!(
            ImportPath::parse("modules/../etc.passwd"),
            Err(ImportPathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn from_segments_validates() {
        let path = ImportPath::from_segments(["plugins", "io", "read_file"]).unwrap();
        assert_eq!(path.dotted(), "plugins.io.read_file");
        assert!(ImportPath::from_segments(["plugins", "bad name"]).is_err());
    }

    #[test]
    fn from_segments_does_not_split_dotted_segment() {
        assert_eq!(
            ImportPath::from_segments(["modules", "greet.v2"]),
            Err(ImportPathError::InvalidSegment {
                path: "modules.greet.v2".to_owned(),
                segment: "greet.v2".to_owned(),
            })
        );
        assert_eq!(
            ImportPath::from_segments(Vec::<String>::new()),
            Err(ImportPathError::Empty)
        );
    }
}
