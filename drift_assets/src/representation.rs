use std::borrow::Cow;

/// One binary encoding a converter accepts, described by file extension and MIME type
///
/// The extension may be empty, in which case the remote file name is the bare base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawDataRepresentation {
    extension: Cow<'static, str>,
    mime_type: Cow<'static, str>,
}

impl RawDataRepresentation {
    pub const fn from_static(extension: &'static str, mime_type: &'static str) -> Self {
        Self {
            extension: Cow::Borrowed(extension),
            mime_type: Cow::Borrowed(mime_type),
        }
    }

    pub fn new(extension: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            extension: Cow::Owned(extension.into()),
            mime_type: Cow::Owned(mime_type.into()),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Remote file name for `base` in this encoding
    pub fn file_name(&self, base: &str) -> String {
        if self.extension.is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", base, self.extension)
        }
    }

    /// Strips this encoding's extension from a remote file name, if it carries it
    pub fn strip_file_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        if self.extension.is_empty() {
            return Some(name);
        }
        name.strip_suffix(&*self.extension)
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
    }
}
