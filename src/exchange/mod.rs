//! Host command boundary.
//!
//! The thin per-host command layer (menu items, keybindings — out of scope)
//! resolves the active document and selection, then calls [`on_copy`] /
//! [`on_paste`]. Both are single synchronous operations: the host document
//! lock is held only while native objects are read or written, and codec
//! work runs outside it.
//!
//! Copy policy: each selected object is processed independently and the
//! result carries a per-object outcome list, so one unsupported object does
//! not block transfer of the rest. A copy where every object fails returns
//! the first error.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::adapter::{SourceAdapter, TargetAdapter};
use crate::doc::{decode, decode_bundle, encode, encode_bundle, BUNDLE_MAGIC};
use crate::geom::GeometryObject;
use crate::util::{Error, Result};

static INIT: Once = Once::new();
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// One-time process-wide initialization.
///
/// Installs the tracing subscriber (respecting `RUST_LOG`). Idempotent; the
/// host command layer calls this once before the first copy or paste. A
/// subscriber installed earlier by the host wins silently.
pub fn ensure_initialized() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
        INITIALIZED.store(true, Ordering::Release);
        debug!("easytransfer core initialized");
    });
}

/// Check whether [`ensure_initialized`] has run.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Single-writer wrapper around a host document.
///
/// The native document is owned by the invoking host; the core only takes
/// the lock for the duration of one extract/construct pass and releases it
/// on every exit path, including failure.
pub struct HostDocument<D> {
    inner: Mutex<D>,
}

impl<D> HostDocument<D> {
    /// Wrap a host document.
    pub fn new(doc: D) -> Self {
        Self {
            inner: Mutex::new(doc),
        }
    }

    /// Run a closure with shared access to the document.
    pub fn read<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        let guard = self.inner.lock();
        f(&guard)
    }

    /// Run a closure with exclusive access to the document.
    pub fn write<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Unwrap the document.
    pub fn into_inner(self) -> D {
        self.inner.into_inner()
    }
}

/// Per-object result of a copy operation.
#[derive(Debug)]
pub struct ObjectOutcome<H> {
    pub handle: H,
    pub status: Result<()>,
}

/// Result of a copy: the bundle bytes plus per-object outcomes.
#[derive(Debug)]
pub struct CopyResult<H> {
    /// Bundle of interchange documents, one per successfully copied object.
    pub bytes: Vec<u8>,
    /// Outcome for every object in the original selection, in order.
    pub outcomes: Vec<ObjectOutcome<H>>,
}

impl<H> CopyResult<H> {
    /// Number of objects that copied successfully.
    pub fn num_copied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_ok()).count()
    }

    /// Number of objects that failed.
    pub fn num_failed(&self) -> usize {
        self.outcomes.len() - self.num_copied()
    }
}

/// Copy entry point: extract the selection and encode it into one bundle.
///
/// Objects are processed independently; failures are recorded per object
/// and skipped. Fails outright only for an empty selection or when no
/// object could be copied.
pub fn on_copy<S: SourceAdapter>(
    adapter: &S,
    host_doc: &HostDocument<S::Doc>,
    selection: &[S::Handle],
) -> Result<CopyResult<S::Handle>> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }
    debug!(
        host = adapter.host_name(),
        selected = selection.len(),
        "copy requested"
    );

    // Native reads happen under the lock; encoding is pure and runs after
    // the lock is released.
    let extracted: Vec<(S::Handle, Result<GeometryObject>)> = host_doc.read(|doc| {
        selection
            .iter()
            .map(|&handle| (handle, adapter.extract(doc, handle)))
            .collect()
    });

    let mut documents = Vec::with_capacity(extracted.len());
    let mut outcomes = Vec::with_capacity(extracted.len());
    for (handle, result) in extracted {
        match result.and_then(|object| encode(&object)) {
            Ok(bytes) => {
                documents.push(bytes);
                outcomes.push(ObjectOutcome {
                    handle,
                    status: Ok(()),
                });
            }
            Err(err) => {
                warn!(host = adapter.host_name(), error = %err, "object skipped");
                outcomes.push(ObjectOutcome {
                    handle,
                    status: Err(err),
                });
            }
        }
    }

    if documents.is_empty() {
        return Err(outcomes
            .into_iter()
            .find_map(|o| o.status.err())
            .unwrap_or(Error::EmptySelection));
    }

    let bytes = encode_bundle(&documents)?;
    info!(
        host = adapter.host_name(),
        copied = documents.len(),
        failed = outcomes.iter().filter(|o| o.status.is_err()).count(),
        bytes = bytes.len(),
        "copy complete"
    );
    Ok(CopyResult { bytes, outcomes })
}

/// Paste entry point: decode a bundle (or a bare single-object document)
/// and construct every object in the host document.
///
/// All documents are decoded and validated before any native mutation, so a
/// malformed buffer never leaves a half-pasted state.
pub fn on_paste<T: TargetAdapter>(
    adapter: &T,
    host_doc: &HostDocument<T::Doc>,
    bytes: &[u8],
) -> Result<Vec<T::Handle>> {
    let objects: Vec<GeometryObject> = if bytes.starts_with(&BUNDLE_MAGIC) {
        decode_bundle(bytes)?
            .into_iter()
            .map(decode)
            .collect::<Result<_>>()?
    } else {
        vec![decode(bytes)?]
    };
    debug!(
        host = adapter.host_name(),
        objects = objects.len(),
        "paste requested"
    );

    let handles = host_doc.write(|doc| {
        objects
            .iter()
            .map(|object| adapter.construct(doc, object))
            .collect::<Result<Vec<_>>>()
    })?;
    info!(
        host = adapter.host_name(),
        pasted = handles.len(),
        "paste complete"
    );
    Ok(handles)
}

/// Write a copy result to a clip file for the external transport to hand
/// over (the original workflow puts the file path on the OS clipboard).
pub fn write_clip(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    std::fs::write(&path, bytes)?;
    info!(path = %path.as_ref().display(), bytes = bytes.len(), "clip written");
    Ok(())
}

/// Read a clip file written by [`write_clip`].
pub fn read_clip(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::rhino::{
        MeshFace, RhinoDoc, RhinoGeometry, RhinoMesh, RhinoSource,
    };
    use crate::util::Vec3;

    fn triangle_mesh() -> RhinoGeometry {
        RhinoGeometry::Mesh(RhinoMesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 1.0, 0.0),
            ],
            faces: vec![MeshFace::triangle(0, 1, 2)],
            ..Default::default()
        })
    }

    #[test]
    fn test_ensure_initialized_is_idempotent() {
        ensure_initialized();
        ensure_initialized();
        assert!(is_initialized());
    }

    #[test]
    fn test_empty_selection_fails() {
        let host_doc = HostDocument::new(RhinoDoc::new());
        let err = on_copy(&RhinoSource, &host_doc, &[]).unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
    }

    #[test]
    fn test_copy_skips_unsupported_objects() {
        let mut doc = RhinoDoc::new();
        let mesh = doc.add(triangle_mesh());
        let brep = doc.add(RhinoGeometry::Brep { face_count: 6 });
        let host_doc = HostDocument::new(doc);

        let result = on_copy(&RhinoSource, &host_doc, &[mesh, brep]).unwrap();
        assert_eq!(result.num_copied(), 1);
        assert_eq!(result.num_failed(), 1);
        assert!(result.outcomes[0].status.is_ok());
        assert!(matches!(
            result.outcomes[1].status,
            Err(Error::UnsupportedGeometryKind(_))
        ));
    }

    #[test]
    fn test_copy_fails_when_nothing_copies() {
        let mut doc = RhinoDoc::new();
        let brep = doc.add(RhinoGeometry::Brep { face_count: 6 });
        let host_doc = HostDocument::new(doc);
        let err = on_copy(&RhinoSource, &host_doc, &[brep]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedGeometryKind(_)));
    }

    #[test]
    fn test_paste_rejects_garbage() {
        use crate::adapter::rhino::RhinoTarget;
        let host_doc = HostDocument::new(RhinoDoc::new());
        let err = on_paste(&RhinoTarget, &host_doc, b"not a document").unwrap_err();
        assert!(matches!(err, Error::InvalidMagic));
        // No native mutation happened.
        assert!(host_doc.read(|d| d.is_empty()));
    }

    #[test]
    fn test_copy_paste_same_host() {
        use crate::adapter::rhino::RhinoTarget;
        let mut doc = RhinoDoc::new();
        let mesh = doc.add(triangle_mesh());
        let source_doc = HostDocument::new(doc);

        let result = on_copy(&RhinoSource, &source_doc, &[mesh]).unwrap();
        let target_doc = HostDocument::new(RhinoDoc::new());
        let handles = on_paste(&RhinoTarget, &target_doc, &result.bytes).unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(
            source_doc.read(|d| d.geometry(mesh).cloned()),
            target_doc.read(|d| d.geometry(handles[0]).cloned())
        );
    }
}
