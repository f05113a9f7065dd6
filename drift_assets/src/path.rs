use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Reserved character used to flatten paths into cache file names.
///
/// Never valid inside a logical path, which keeps [`ResourcePath::cache_file_name`] injective.
pub const SEPARATOR: char = '~';

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Resource path is empty")]
    Empty,
    #[error("Resource path {0:?} contains an empty segment")]
    EmptySegment(String),
    #[error("Resource path {0:?} contains the reserved character '~'")]
    ReservedCharacter(String),
}

/// Logical, `/` delimited identifier of a resource
///
/// Leading and trailing slashes are trimmed on parse, so `"/a/b/"` and `"a/b"` are the same path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath(Arc<str>);

impl ResourcePath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.contains(SEPARATOR) {
            return Err(PathError::ReservedCharacter(path.to_string()));
        }
        if trimmed.split('/').any(|segment| segment.is_empty()) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All segments, root first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Folder segments leading to the last segment
    pub fn parent_segments(&self) -> impl Iterator<Item = &str> {
        let parent = self.0.rsplit_once('/').map(|(parent, _)| parent);
        parent.into_iter().flat_map(|parent| parent.split('/'))
    }

    /// Last segment of the path
    pub fn base_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Appends a single segment
    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        Self::parse(&format!("{}/{}", self.0, segment))
    }

    /// True if `self` is exactly one segment below `parent`
    pub fn is_child_of(&self, parent: &ResourcePath) -> bool {
        self.0
            .rsplit_once('/')
            .is_some_and(|(folder, _)| folder == &*parent.0)
    }

    /// Filesystem safe name of the cached bytes for this path in the given encoding.
    ///
    /// Slashes become [`SEPARATOR`]; a non-empty extension is appended after a doubled separator,
    /// which cannot occur otherwise since segments are never empty.
    pub fn cache_file_name(&self, extension: &str) -> String {
        let mut name = self.0.replace('/', &SEPARATOR.to_string());
        if !extension.is_empty() {
            name.push(SEPARATOR);
            name.push(SEPARATOR);
            name.push_str(extension);
        }
        name
    }

    /// Inverse of [`Self::cache_file_name`], returns the path and extension
    pub fn from_cache_file_name(name: &str) -> Option<(Self, String)> {
        let marker = format!("{SEPARATOR}{SEPARATOR}");
        let (flat, extension) = match name.split_once(&marker) {
            Some((flat, extension)) => (flat, extension.to_string()),
            None => (name, String::new()),
        };
        let path = Self::parse(&flat.replace(SEPARATOR, "/")).ok()?;
        Some((path, extension))
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ResourcePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_slashes() {
        let path = ResourcePath::parse("/textures/crate/").unwrap();
        assert_eq!(path.as_str(), "textures/crate");
        assert_eq!(path, ResourcePath::parse("textures/crate").unwrap());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(ResourcePath::parse(""), Err(PathError::Empty));
        assert_eq!(ResourcePath::parse("///"), Err(PathError::Empty));
        assert!(matches!(
            ResourcePath::parse("a//b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            ResourcePath::parse("a/b~c"),
            Err(PathError::ReservedCharacter(_))
        ));
    }

    #[test]
    fn test_segments() {
        let path = ResourcePath::parse("a/b/c").unwrap();
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(path.parent_segments().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(path.base_name(), "c");

        let single = ResourcePath::parse("c").unwrap();
        assert_eq!(single.parent_segments().count(), 0);
        assert_eq!(single.base_name(), "c");
    }

    #[test]
    fn test_is_child_of() {
        let prefix = ResourcePath::parse("ui/icons").unwrap();
        let child = ResourcePath::parse("ui/icons/close").unwrap();
        let grandchild = ResourcePath::parse("ui/icons/big/close").unwrap();
        let sibling = ResourcePath::parse("ui/iconsx/close").unwrap();
        assert!(child.is_child_of(&prefix));
        assert!(!grandchild.is_child_of(&prefix));
        assert!(!sibling.is_child_of(&prefix));
        assert!(!prefix.is_child_of(&prefix));
    }

    #[test]
    fn test_cache_file_name_is_reversible() {
        let path = ResourcePath::parse("ui/icons/close.v2").unwrap();
        let name = path.cache_file_name("png");
        assert_eq!(name, "ui~icons~close.v2~~png");
        assert_eq!(
            ResourcePath::from_cache_file_name(&name),
            Some((path.clone(), "png".to_string()))
        );

        let bare = path.cache_file_name("");
        assert_eq!(bare, "ui~icons~close.v2");
        assert_eq!(
            ResourcePath::from_cache_file_name(&bare),
            Some((path, String::new()))
        );
    }

    #[test]
    fn test_cache_file_name_distinguishes_extension_from_segment() {
        let dotted = ResourcePath::parse("a.png").unwrap().cache_file_name("");
        let typed = ResourcePath::parse("a").unwrap().cache_file_name("png");
        assert_ne!(dotted, typed);
    }
}
