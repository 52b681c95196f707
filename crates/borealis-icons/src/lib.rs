//! Icon resolution and asynchronous loading for the Borealis desktop
//! toolkit.
//!
//! Widgets hand the loader an [`IconReference`] (a theme name, a themed
//! descriptor, an absolute path, or a URI) together with a pixel size and a
//! callback; the loader answers from its result cache when it can and
//! otherwise queues the lookup, resolving it cooperatively from the host
//! event loop so icon work never blocks painting or input.
//!
//! The three collaborators the loader needs are injected as traits:
//! a [`ThemeResolver`] that maps names and descriptors to bitmaps, a
//! [`ContentFetcher`] that retrieves raw bytes for URIs off-thread
//! ([`ThreadFetcher`] is the stock implementation), and a [`StreamDecoder`]
//! that turns those bytes into size-fitted RGBA bitmaps
//! ([`ImageStreamDecoder`]).
//!
//! ```ignore
//! use borealis_icons::{IconLoader, IconReference, ImageStreamDecoder, ThreadFetcher};
//!
//! let mut loader = IconLoader::new(
//!     Box::new(theme),
//!     Box::new(ThreadFetcher::new()),
//!     Box::new(ImageStreamDecoder::new()),
//! );
//!
//! loader.request_icon(IconReference::for_string("edit-find"), 32, |_, _, bitmap| {
//!     if let Some(bitmap) = bitmap {
//!         // hand the pixels to the renderer
//!     }
//! });
//!
//! // Call from an idle handler until has_pending() is false:
//! loader.process();
//! ```

mod bitmap;
mod cache;
mod decoder;
mod error;
mod fetcher;
mod loader;
mod provider;
mod queue;
mod reference;

pub use bitmap::Bitmap;
pub use cache::{IconCache, IconCacheConfig};
pub use decoder::ImageStreamDecoder;
pub use error::{IconError, Result};
pub use fetcher::ThreadFetcher;
pub use loader::{IconLoader, IconLoaderConfig, WakeHook};
pub use provider::{ContentFetcher, FetchCallback, StreamDecoder, ThemeResolver};
pub use queue::{LoadCallback, LoadHandle};
pub use reference::{CacheKey, IconDescriptor, IconReference};
