//! # EasyTransfer
//!
//! Geometry interchange core for copy/paste transfer between two modeling
//! applications. A copy reads a native scene object through a source adapter
//! into a neutral [`geom::GeometryObject`], serializes it with the
//! interchange document codec, and hands the bytes to an external transport
//! (clipboard, temp file). A paste decodes the bytes and reconstructs an
//! equivalent native object through a target adapter.
//!
//! Command registration, transport and UI live in the per-host plugin
//! layers, not here.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math re-exports, tolerance helpers
//! - [`attr`] - Per-vertex / per-point attribute columns
//! - [`topo`] - Polygonal topology (n-gons, edge creases)
//! - [`geom`] - The neutral `GeometryObject` sum type
//! - [`doc`] - Interchange document codec (encode/decode, bundles)
//! - [`adapter`] - Source/target adapters per host application
//! - [`exchange`] - Host command boundary (`on_copy` / `on_paste`)
//!
//! ## Example
//!
//! ```
//! use easytransfer::prelude::*;
//! use easytransfer::adapter::rhino::{RhinoDoc, RhinoSource};
//! use easytransfer::adapter::blender::{BlenderScene, BlenderTarget};
//! # use easytransfer::adapter::rhino::{MeshFace, RhinoGeometry, RhinoMesh};
//!
//! ensure_initialized();
//!
//! let mut doc = RhinoDoc::new();
//! # let handle = doc.add(RhinoGeometry::Mesh(RhinoMesh {
//! #     vertices: vec![glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y],
//! #     faces: vec![MeshFace::triangle(0, 1, 2)],
//! #     ..Default::default()
//! # }));
//! let source_doc = HostDocument::new(doc);
//! let copied = on_copy(&RhinoSource, &source_doc, &[handle])?;
//!
//! let target_scene = HostDocument::new(BlenderScene::new());
//! let pasted = on_paste(&BlenderTarget, &target_scene, &copied.bytes)?;
//! assert_eq!(pasted.len(), 1);
//! # Ok::<(), easytransfer::Error>(())
//! ```

pub mod adapter;
pub mod attr;
pub mod doc;
pub mod exchange;
pub mod geom;
pub mod topo;
pub mod util;

// Re-export commonly used types
pub use geom::GeometryObject;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapter::{SourceAdapter, TargetAdapter};
    pub use crate::attr::{AttrName, AttrValues, AttributeBuffer};
    pub use crate::doc::{decode, encode, SCHEMA_VERSION};
    pub use crate::exchange::{ensure_initialized, on_copy, on_paste, HostDocument};
    pub use crate::geom::{GeometryObject, PointSet, SubdivisionScheme};
    pub use crate::topo::{EdgeCreaseMap, EdgeKey, FaceRecord, FaceTopology};
    pub use crate::util::{Error, Result};
}
