//! Session-scoped store for the resources handed to the presentation layer.
//!
//! Each resource is registered under a `blob:` style locator that a host can
//! resolve back to its bytes until the resource is released.  Nothing here
//! is persisted; dropping the registry drops every resource.
//!
//! ```rust
//! use acoustic_capture::resource::ResourceRegistry;
//!
//! let registry = ResourceRegistry::new();
//! let handle = registry.register("audio/wav", vec![1, 2, 3]);
//! assert!(registry.resolve_locator(&handle.locator()).is_some());
//!
//! assert!(registry.release(&handle));
//! assert!(!registry.release(&handle)); // second release is a no-op
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::audio::{AudioClip, WAV_MIME};
use crate::spectrogram::SpectrogramImage;

const LOCATOR_PREFIX: &str = "blob:acoustic-capture/";

// ---------------------------------------------------------------------------
// ResourceHandle
// ---------------------------------------------------------------------------

/// Opaque identifier of a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Uuid);

impl ResourceHandle {
    /// Addressable locator, e.g. `blob:acoustic-capture/6f1c…`.
    pub fn locator(&self) -> String {
        format!("{LOCATOR_PREFIX}{}", self.0)
    }

    /// Parse a locator produced by [`locator`](Self::locator).
    pub fn from_locator(locator: &str) -> Option<Self> {
        let id = locator.strip_prefix(LOCATOR_PREFIX)?;
        Uuid::parse_str(id).ok().map(Self)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator())
    }
}

// ---------------------------------------------------------------------------
// StoredResource / ResourceRegistry
// ---------------------------------------------------------------------------

/// Bytes of a registered resource.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

/// In-memory locator → bytes map.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: Mutex<HashMap<ResourceHandle, StoredResource>>,
}

/// Registry shared between the controller and the host.
pub type SharedRegistry = Arc<ResourceRegistry>;

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, mime: &str, bytes: Vec<u8>) -> ResourceHandle {
        let handle = ResourceHandle(Uuid::new_v4());
        let resource = StoredResource {
            mime: mime.to_string(),
            bytes: bytes.into(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, resource);
        log::debug!("resource: registered {handle} ({mime})");
        handle
    }

    pub fn resolve(&self, handle: &ResourceHandle) -> Option<StoredResource> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .cloned()
    }

    pub fn resolve_locator(&self, locator: &str) -> Option<StoredResource> {
        ResourceHandle::from_locator(locator).and_then(|h| self.resolve(&h))
    }

    /// Drop the resource behind `handle`.
    ///
    /// Returns `false` when it was already released.
    pub fn release(&self, handle: &ResourceHandle) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
            .is_some();
        if removed {
            log::debug!("resource: released {handle}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// AudioResource / ImageResource
// ---------------------------------------------------------------------------

/// The playable recording exposed after a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResource {
    pub handle: ResourceHandle,
    pub duration_secs: f32,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioResource {
    pub fn publish(registry: &ResourceRegistry, clip: AudioClip) -> Self {
        let AudioClip {
            wav,
            format,
            duration_secs,
        } = clip;
        Self {
            handle: registry.register(WAV_MIME, wav),
            duration_secs,
            sample_rate: format.sample_rate,
            channels: format.channels,
        }
    }

    pub fn locator(&self) -> String {
        self.handle.locator()
    }
}

/// The displayable spectrogram exposed after processing.
///
/// A failed synthesis is published as an empty image with no handle, so the
/// lifecycle can still finish.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    pub handle: Option<ResourceHandle>,
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,…`, empty for a failed synthesis.
    pub data_uri: String,
}

impl ImageResource {
    pub fn publish(registry: &ResourceRegistry, image: SpectrogramImage) -> Self {
        if image.is_empty() {
            return Self {
                handle: None,
                width: 0,
                height: 0,
                data_uri: String::new(),
            };
        }
        let data_uri = image.data_uri();
        let (width, height, mime) = (image.width, image.height, image.mime());
        Self {
            handle: Some(registry.register(mime, image.into_png_bytes())),
            width,
            height,
            data_uri,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StreamFormat;

    #[test]
    fn locator_round_trips() {
        let registry = ResourceRegistry::new();
        let handle = registry.register("audio/wav", vec![0; 4]);

        let locator = handle.locator();
        assert!(locator.starts_with("blob:acoustic-capture/"));
        assert_eq!(ResourceHandle::from_locator(&locator), Some(handle));
        assert_eq!(handle.to_string(), locator);
    }

    #[test]
    fn foreign_locators_do_not_resolve() {
        let registry = ResourceRegistry::new();
        assert!(registry.resolve_locator("blob:other/123").is_none());
        assert!(registry.resolve_locator("blob:acoustic-capture/not-a-uuid").is_none());
    }

    #[test]
    fn release_is_idempotent() {
        let registry = ResourceRegistry::new();
        let a = registry.register("image/png", vec![1]);
        let b = registry.register("audio/wav", vec![2]);
        assert_eq!(registry.len(), 2);

        assert!(registry.release(&a));
        assert!(!registry.release(&a));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(&a).is_none());
        assert_eq!(&*registry.resolve(&b).unwrap().bytes, &[2]);
    }

    #[test]
    fn audio_publish_registers_wav() {
        let registry = ResourceRegistry::new();
        let format = StreamFormat {
            sample_rate: 16_000,
            channels: 1,
        };
        let clip = AudioClip::encode(&[0.0; 16_000], format).unwrap();
        let audio = AudioResource::publish(&registry, clip);

        let stored = registry.resolve_locator(&audio.locator()).unwrap();
        assert_eq!(stored.mime, "audio/wav");
        assert!((audio.duration_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_image_is_not_registered() {
        let registry = ResourceRegistry::new();
        let image = ImageResource::publish(&registry, SpectrogramImage::empty());
        assert!(image.is_empty());
        assert!(image.data_uri.is_empty());
        assert!(registry.is_empty());
    }
}
