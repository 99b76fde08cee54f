//! # Layer Trait
//!
//! Tower-style composition for store backends.
//!
//! ## Overview
//!
//! A [`Layer`] wraps a backend in something that adds behaviour. The crate
//! ships one: [`SessionLayer`](crate::SessionLayer), which puts a backend
//! behind an operation queue and an error reporter.
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! ## Fluent Composition
//!
//! ```rust
//! use vfstore::{ErrorReporter, LayerExt, SessionLayer, TreeNodeStore};
//!
//! let session = TreeNodeStore::new().layer(SessionLayer::new(ErrorReporter::new()));
//! assert!(session.create_directory("/docs"));
//! ```

use crate::Fs;

/// A layer that wraps a backend to add functionality.
///
/// `layer(self, backend)` consumes both the layer and the backend. Layers
/// needing more than [`Fs`] add bounds in their impl.
///
/// # Example
///
/// ```rust
/// use vfstore::Layer;
///
/// struct Audited<B> {
///     inner: B,
///     label: String,
/// }
///
/// struct AuditLayer {
///     label: String,
/// }
///
/// impl<B> Layer<B> for AuditLayer {
///     type Backend = Audited<B>;
///
///     fn layer(self, backend: B) -> Self::Backend {
///         Audited { inner: backend, label: self.label }
///     }
/// }
/// ```
pub trait Layer<B> {
    /// The resulting type after applying this layer.
    type Backend;

    /// Wrap the given backend.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait for fluent layer composition.
pub trait LayerExt: Fs + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

// Blanket implementation - any Fs backend gets LayerExt for free
impl<B: Fs> LayerExt for B {}
