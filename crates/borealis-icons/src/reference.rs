//! Icon references and cache identity.
//!
//! An [`IconReference`] is the lightweight, cheap-to-compare request handed
//! to the loader: a symbolic theme name, an opaque themed descriptor, a
//! local path, or a URI. A [`CacheKey`] is the identity derived from a
//! reference and a pixel size, used both for de-duplication and for result
//! cache storage.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use url::Url;

/// An opaque themed-icon descriptor.
///
/// Descriptors are resolver-specific identifiers distinct from plain
/// symbolic names. A descriptor may wrap a concrete file, in which case the
/// loader reinterprets the request as a `file://` URI fetch instead of
/// asking the theme resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconDescriptor {
    value: String,
    file: Option<PathBuf>,
}

impl IconDescriptor {
    /// Create a descriptor for a themed icon.
    pub fn themed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            file: None,
        }
    }

    /// Create a descriptor wrapping a concrete file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            value: path.to_string_lossy().into_owned(),
            file: Some(path),
        }
    }

    /// The raw descriptor value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The wrapped file target, if this descriptor denotes a file-wrapped
    /// icon.
    pub fn file_target(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// A lightweight, cheap-to-compare request for an icon.
///
/// References are immutable once constructed. A `Path` reference is
/// normalized into a `file://` [`IconReference::Uri`] at the request entry
/// point, so local files and local paths funnel through the same URI
/// resolution strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconReference {
    /// A symbolic theme name such as `edit-find`.
    Name(String),
    /// An opaque themed-icon descriptor.
    Descriptor(IconDescriptor),
    /// A local filesystem path.
    Path(PathBuf),
    /// A URI: `file://`, or `http(s)://` with the `networking` feature.
    Uri(String),
}

impl IconReference {
    /// Classify a bare string the way shell callers hand them over:
    /// absolute paths start with `/`, URIs carry a scheme, everything else
    /// is a symbolic name.
    pub fn for_string(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        if s.starts_with('/') {
            IconReference::Path(PathBuf::from(s))
        } else if s.contains("://") {
            IconReference::Uri(s.to_string())
        } else {
            IconReference::Name(s.to_string())
        }
    }

    /// The raw value string this reference was built from.
    ///
    /// Cache identity is derived from this value alone; the kind is ignored
    /// (see [`CacheKey`]).
    pub fn value(&self) -> Cow<'_, str> {
        match self {
            IconReference::Name(name) => Cow::Borrowed(name.as_str()),
            IconReference::Descriptor(descriptor) => Cow::Borrowed(descriptor.value()),
            IconReference::Path(path) => path.to_string_lossy(),
            IconReference::Uri(uri) => Cow::Borrowed(uri.as_str()),
        }
    }

    /// Normalize a `Path` reference into a `file://` URI reference.
    ///
    /// Returns `None` for relative paths, which have no file URI form; the
    /// loader treats those as degenerate requests.
    pub(crate) fn normalize(self) -> Option<Self> {
        match self {
            IconReference::Path(path) => Url::from_file_path(&path)
                .ok()
                .map(|uri| IconReference::Uri(String::from(uri))),
            other => Some(other),
        }
    }
}

/// Derived identity for de-duplication and result cache storage.
///
/// Keys are built from the raw reference value and the requested pixel size
/// only. The reference kind is deliberately ignored, a carry-over from the
/// original design: a name and a URI with identical raw text collide in the
/// key space, so a request expressed differently can still hit an earlier
/// entry when the value strings coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    value: String,
    size: u32,
}

impl CacheKey {
    /// Derive the key for a reference at a pixel size.
    pub fn derive(reference: &IconReference, size: u32) -> Self {
        Self {
            value: reference.value().into_owned(),
            size,
        }
    }

    /// The raw value string the key was derived from.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The requested pixel size.
    pub fn size(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_string_classification() {
        assert!(matches!(
            IconReference::for_string("edit-find"),
            IconReference::Name(_)
        ));
        assert!(matches!(
            IconReference::for_string("/usr/share/pixmaps/app.png"),
            IconReference::Path(_)
        ));
        assert!(matches!(
            IconReference::for_string("https://example.com/icon.png"),
            IconReference::Uri(_)
        ));
        assert!(matches!(
            IconReference::for_string("file:///tmp/icon.png"),
            IconReference::Uri(_)
        ));
    }

    #[test]
    fn test_normalize_absolute_path() {
        let reference = IconReference::Path(PathBuf::from("/tmp/icon.png"));
        let normalized = reference.normalize().unwrap();
        assert_eq!(
            normalized,
            IconReference::Uri("file:///tmp/icon.png".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_relative_path() {
        let reference = IconReference::Path(PathBuf::from("icons/app.png"));
        assert!(reference.normalize().is_none());
    }

    #[test]
    fn test_key_ignores_kind() {
        let name = IconReference::Name("spotify".to_string());
        let descriptor = IconReference::Descriptor(IconDescriptor::themed("spotify"));

        assert_eq!(CacheKey::derive(&name, 48), CacheKey::derive(&descriptor, 48));
        assert_ne!(CacheKey::derive(&name, 48), CacheKey::derive(&name, 64));
    }

    #[test]
    fn test_file_descriptor_target() {
        let descriptor = IconDescriptor::file("/opt/app/icon.png");
        assert_eq!(
            descriptor.file_target(),
            Some(Path::new("/opt/app/icon.png"))
        );
        assert_eq!(descriptor.value(), "/opt/app/icon.png");

        let themed = IconDescriptor::themed("folder-music");
        assert!(themed.file_target().is_none());
    }
}
