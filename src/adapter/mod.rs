//! Host application adapters.
//!
//! Each host contributes a [`SourceAdapter`] (native object -> neutral
//! [`GeometryObject`]) and a [`TargetAdapter`] (neutral -> native). They are
//! the only code aware of a host's object model; the rest of the core calls
//! through these traits and never branches on which application is on the
//! other side.
//!
//! - [`rhino`] - openNURBS-style kernel: tri/quad faces with n-gon groups,
//!   SubD with sharpness in [0, 10], point clouds with per-point values.
//! - [`blender`] - Blender-style kernel: arbitrary-degree polygons, [0, 1]
//!   edge creases, subdivision via a modifier, point clouds with radius.

pub mod blender;
pub mod rhino;

use crate::geom::GeometryObject;
use crate::util::Result;

/// Reads one native scene object into the neutral representation.
///
/// Classification is deterministic and total: every supported native kind
/// maps to exactly one [`GeometryObject`] variant, everything else fails
/// with [`crate::util::Error::UnsupportedGeometryKind`]. Implementations
/// must not hold on to native state beyond the duration of one call.
pub trait SourceAdapter {
    /// Host document type.
    type Doc;
    /// Native object handle.
    type Handle: Copy;

    /// Host name, for logging and error messages.
    fn host_name(&self) -> &'static str;

    /// Extract a native object into a neutral geometry object.
    fn extract(&self, doc: &Self::Doc, handle: Self::Handle) -> Result<GeometryObject>;
}

/// Reconstructs one native scene object from the neutral representation.
///
/// Performs n-gon-aware face creation: where the native kernel cannot store
/// faces of degree >= 5 directly, the loop is decomposed into a fan that
/// shares an origin-face group, so a later extract yields the single
/// logical face back.
pub trait TargetAdapter {
    /// Host document type.
    type Doc;
    /// Native object handle.
    type Handle: Copy;

    /// Host name, for logging and error messages.
    fn host_name(&self) -> &'static str;

    /// Build a native object from a neutral geometry object and add it to
    /// the host document.
    fn construct(&self, doc: &mut Self::Doc, object: &GeometryObject) -> Result<Self::Handle>;
}
