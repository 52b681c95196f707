//! Collaborator interfaces the loader resolves through.
//!
//! The loader itself never touches icon themes, the filesystem, or the
//! network directly. It is constructed with one implementation of each of
//! these traits, which keeps the scheduling and caching logic testable with
//! in-memory fakes and lets the host wire in whatever theme machinery it
//! runs.

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::reference::IconDescriptor;

/// Completion callback for an asynchronous byte fetch.
///
/// Implementations of [`ContentFetcher`] invoke this exactly once, from any
/// thread, with the fetched bytes or the failure that prevented the fetch.
pub type FetchCallback = Box<dyn FnOnce(Result<Vec<u8>>) + Send + 'static>;

/// Resolves symbolic names and themed descriptors against an icon theme.
///
/// A miss is a normal outcome: the loader delivers `None` to the caller and
/// does not retry, except for the suffix-stripping fallback applied to
/// descriptor lookups.
pub trait ThemeResolver {
    /// Resolve a symbolic icon name at a pixel size.
    fn resolve_name(&self, name: &str, size: u32) -> Option<Bitmap>;

    /// Resolve an opaque themed descriptor at a pixel size.
    fn resolve_descriptor(&self, descriptor: &IconDescriptor, size: u32) -> Option<Bitmap>;
}

/// Retrieves the raw bytes behind a URI without blocking the caller.
pub trait ContentFetcher {
    /// Begin fetching `uri`, delivering the outcome through `on_complete`.
    ///
    /// Must return promptly; the actual transfer happens off the caller's
    /// thread. There is no timeout contract: a fetch that never completes
    /// leaves its request unresolved.
    fn fetch(&self, uri: &str, on_complete: FetchCallback);
}

/// Turns a byte stream into a bitmap scaled against a maximum dimension.
pub trait StreamDecoder {
    /// Decode `bytes`, scaling so the larger dimension equals
    /// `max_dimension` while preserving aspect ratio.
    fn decode_scaled(&self, bytes: &[u8], max_dimension: u32) -> Result<Bitmap>;
}
