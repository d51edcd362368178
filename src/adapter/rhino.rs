//! Rhino-style host adapter.
//!
//! The native model mirrors openNURBS conventions: a render mesh stores only
//! triangles and quads (`MeshFace`, triangle iff `c == d`), and an n-gon
//! exists as a `MeshNgon` group naming its member faces plus the boundary
//! vertex loop. A SubD is represented by its control net plus per-edge
//! sharpness in `[0, 10]`. Point clouds carry optional per-point normals,
//! RGB colors and a scalar value used as radius.

use tracing::debug;

use crate::adapter::{SourceAdapter, TargetAdapter};
use crate::attr::{rgb_to_rgba, AttrName, AttrValues, AttributeBuffer};
use crate::geom::{GeometryObject, PointSet, SubdivisionScheme};
use crate::topo::{EdgeCreaseMap, EdgeKey, FaceTopology};
use crate::util::{Error, Result, Vec3};

/// Maximum native edge sharpness. Interchange crease weight 1.0 maps here.
pub const MAX_SHARPNESS: f32 = 10.0;

/// One native mesh face: a quad, or a triangle when `c == d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshFace {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl MeshFace {
    /// Create a triangle face (`d` repeats `c`).
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c, d: c }
    }

    /// Create a quad face.
    pub fn quad(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Check whether this face is a triangle.
    pub fn is_triangle(&self) -> bool {
        self.c == self.d
    }
}

/// N-gon group: member faces plus the logical boundary loop.
///
/// The group id (index into `RhinoMesh::ngons`) is kernel-internal; it never
/// appears in the interchange document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeshNgon {
    pub boundary_vertices: Vec<u32>,
    pub face_indices: Vec<u32>,
}

/// Native render mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RhinoMesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<MeshFace>,
    pub ngons: Vec<MeshNgon>,
    /// Per-vertex normals, if computed.
    pub normals: Option<Vec<Vec3>>,
    /// Per-vertex RGB colors (this kernel stores no alpha).
    pub colors: Option<Vec<Vec3>>,
}

/// Per-edge sharpness on a SubD control net.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSharpness {
    pub v0: u32,
    pub v1: u32,
    /// Sharpness in `[0, MAX_SHARPNESS]`.
    pub sharpness: f32,
}

/// Native SubD: control net plus edge sharpness.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RhinoSubD {
    pub control_net: RhinoMesh,
    pub edge_sharpness: Vec<EdgeSharpness>,
}

/// Native point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RhinoPointCloud {
    pub points: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    /// Per-point RGB colors.
    pub colors: Option<Vec<Vec3>>,
    /// Per-point scalar values, interpreted as radii.
    pub values: Option<Vec<f32>>,
}

/// Native geometry kinds in a Rhino-style document.
#[derive(Clone, Debug, PartialEq)]
pub enum RhinoGeometry {
    Mesh(RhinoMesh),
    SubD(RhinoSubD),
    PointCloud(RhinoPointCloud),
    /// NURBS boundary representation; no adapter mapping.
    Brep { face_count: usize },
    /// Curve geometry; no adapter mapping.
    Curve { degree: u32 },
}

impl RhinoGeometry {
    /// Native kind name, used in unsupported-kind errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RhinoGeometry::Mesh(_) => "Mesh",
            RhinoGeometry::SubD(_) => "SubD",
            RhinoGeometry::PointCloud(_) => "PointCloud",
            RhinoGeometry::Brep { .. } => "Brep",
            RhinoGeometry::Curve { .. } => "Curve",
        }
    }
}

/// Handle to an object in a [`RhinoDoc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RhinoObjectId(pub u32);

/// A Rhino-style host document: a flat object table.
#[derive(Clone, Debug, Default)]
pub struct RhinoDoc {
    objects: Vec<RhinoGeometry>,
}

impl RhinoDoc {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add geometry, returning its handle.
    pub fn add(&mut self, geometry: RhinoGeometry) -> RhinoObjectId {
        self.objects.push(geometry);
        RhinoObjectId(self.objects.len() as u32 - 1)
    }

    /// Look up geometry by handle.
    pub fn geometry(&self, id: RhinoObjectId) -> Option<&RhinoGeometry> {
        self.objects.get(id.0 as usize)
    }

    /// Number of objects in the document.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the document holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Collapse native faces back into logical face loops.
///
/// Faces covered by an n-gon group are replaced by the group's boundary
/// loop, emitted once at the position of the group's first member face.
fn face_loops(mesh: &RhinoMesh) -> Result<Vec<Vec<u32>>> {
    let mut owner: Vec<Option<usize>> = vec![None; mesh.faces.len()];
    for (ngon_idx, ngon) in mesh.ngons.iter().enumerate() {
        // A group with no member faces would never emit its boundary loop.
        if ngon.face_indices.is_empty() {
            return Err(Error::topology(format!(
                "ngon {ngon_idx} has no member faces"
            )));
        }
        for &fi in &ngon.face_indices {
            let slot = owner.get_mut(fi as usize).ok_or_else(|| {
                Error::topology(format!(
                    "ngon {} references face {} (face count is {})",
                    ngon_idx,
                    fi,
                    mesh.faces.len()
                ))
            })?;
            if slot.is_some() {
                return Err(Error::topology(format!(
                    "face {fi} belongs to more than one ngon group"
                )));
            }
            *slot = Some(ngon_idx);
        }
    }

    let mut emitted = vec![false; mesh.ngons.len()];
    let mut loops = Vec::with_capacity(mesh.faces.len());
    for (fi, face) in mesh.faces.iter().enumerate() {
        match owner[fi] {
            Some(ngon_idx) => {
                if !emitted[ngon_idx] {
                    emitted[ngon_idx] = true;
                    loops.push(mesh.ngons[ngon_idx].boundary_vertices.clone());
                }
            }
            None if face.is_triangle() => loops.push(vec![face.a, face.b, face.c]),
            None => loops.push(vec![face.a, face.b, face.c, face.d]),
        }
    }
    Ok(loops)
}

fn mesh_topology(mesh: &RhinoMesh) -> Result<FaceTopology> {
    FaceTopology::build(mesh.vertices.clone(), face_loops(mesh)?)
}

fn mesh_attributes(mesh: &RhinoMesh, vertex_count: usize) -> Result<AttributeBuffer> {
    let mut attributes = AttributeBuffer::new();
    if let Some(normals) = &mesh.normals {
        attributes.set(AttrName::Normal, vertex_count, AttrValues::Vec3(normals.clone()))?;
    }
    if let Some(colors) = &mesh.colors {
        attributes.set(AttrName::Color, vertex_count, AttrValues::Vec4(rgb_to_rgba(colors)))?;
    }
    Ok(attributes)
}

/// Build a native mesh from a topology, fan-decomposing n-gons.
///
/// Each face of degree >= 5 becomes a triangle fan registered as one
/// `MeshNgon`, so the logical face survives a later extract.
fn build_native_mesh(topology: &FaceTopology) -> RhinoMesh {
    let mut faces = Vec::with_capacity(topology.num_faces());
    let mut ngons = Vec::new();
    for face in &topology.faces {
        let vi = &face.vertex_indices;
        match vi.len() {
            3 => faces.push(MeshFace::triangle(vi[0], vi[1], vi[2])),
            4 => faces.push(MeshFace::quad(vi[0], vi[1], vi[2], vi[3])),
            n => {
                let first = faces.len() as u32;
                for i in 1..n - 1 {
                    faces.push(MeshFace::triangle(vi[0], vi[i], vi[i + 1]));
                }
                ngons.push(MeshNgon {
                    boundary_vertices: vi.to_vec(),
                    face_indices: (first..faces.len() as u32).collect(),
                });
            }
        }
    }
    RhinoMesh {
        vertices: topology.vertices.clone(),
        faces,
        ngons,
        normals: None,
        colors: None,
    }
}

fn apply_mesh_attributes(mesh: &mut RhinoMesh, attributes: &AttributeBuffer) {
    if let Some(AttrValues::Vec3(normals)) = attributes.get(AttrName::Normal) {
        mesh.normals = Some(normals.clone());
    }
    if let Some(AttrValues::Vec4(colors)) = attributes.get(AttrName::Color) {
        // Alpha is dropped: this kernel stores RGB only.
        mesh.colors = Some(colors.iter().map(|c| c.truncate()).collect());
    }
}

/// Rhino-style source adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct RhinoSource;

impl SourceAdapter for RhinoSource {
    type Doc = RhinoDoc;
    type Handle = RhinoObjectId;

    fn host_name(&self) -> &'static str {
        "rhino"
    }

    fn extract(&self, doc: &RhinoDoc, handle: RhinoObjectId) -> Result<GeometryObject> {
        let geometry = doc
            .geometry(handle)
            .ok_or_else(|| Error::ObjectNotFound(format!("rhino object {}", handle.0)))?;
        debug!(kind = geometry.kind_name(), id = handle.0, "rhino extract");
        match geometry {
            RhinoGeometry::Mesh(mesh) => {
                let topology = mesh_topology(mesh)?;
                let attributes = mesh_attributes(mesh, topology.num_vertices())?;
                Ok(GeometryObject::Mesh {
                    topology,
                    attributes,
                })
            }
            RhinoGeometry::SubD(subd) => {
                let topology = mesh_topology(&subd.control_net)?;
                let attributes = mesh_attributes(&subd.control_net, topology.num_vertices())?;
                let mut crease = EdgeCreaseMap::new();
                for es in &subd.edge_sharpness {
                    crease.set(EdgeKey::new(es.v0, es.v1), es.sharpness / MAX_SHARPNESS);
                }
                crease.validate_against(&topology).map_err(|_| {
                    Error::topology("subd sharpness references a non-existent edge".to_string())
                })?;
                Ok(GeometryObject::SubdividedMesh {
                    topology,
                    crease,
                    scheme: SubdivisionScheme::CatmullClark,
                    attributes,
                })
            }
            RhinoGeometry::PointCloud(cloud) => {
                let count = cloud.points.len();
                let mut attributes = AttributeBuffer::new();
                if let Some(normals) = &cloud.normals {
                    attributes.set(AttrName::Normal, count, AttrValues::Vec3(normals.clone()))?;
                }
                if let Some(colors) = &cloud.colors {
                    attributes.set(AttrName::Color, count, AttrValues::Vec4(rgb_to_rgba(colors)))?;
                }
                if let Some(values) = &cloud.values {
                    let radii = values.iter().map(|v| v.max(0.0)).collect();
                    attributes.set(AttrName::Radius, count, AttrValues::Float(radii))?;
                }
                Ok(GeometryObject::PointCloud {
                    points: PointSet::new(cloud.points.clone()),
                    attributes,
                })
            }
            other => Err(Error::unsupported(other.kind_name())),
        }
    }
}

/// Rhino-style target adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct RhinoTarget;

impl TargetAdapter for RhinoTarget {
    type Doc = RhinoDoc;
    type Handle = RhinoObjectId;

    fn host_name(&self) -> &'static str {
        "rhino"
    }

    fn construct(&self, doc: &mut RhinoDoc, object: &GeometryObject) -> Result<RhinoObjectId> {
        object.validate()?;
        debug!(variant = object.variant_name(), "rhino construct");
        let geometry = match object {
            GeometryObject::Mesh {
                topology,
                attributes,
            } => {
                let mut mesh = build_native_mesh(topology);
                apply_mesh_attributes(&mut mesh, attributes);
                RhinoGeometry::Mesh(mesh)
            }
            GeometryObject::SubdividedMesh {
                topology,
                crease,
                attributes,
                // The native kernel subdivides Catmull-Clark only; the tag
                // is accepted as-is since the control net is what transfers.
                scheme: _,
            } => {
                let mut control_net = build_native_mesh(topology);
                apply_mesh_attributes(&mut control_net, attributes);
                let edge_sharpness = crease
                    .iter()
                    .map(|(edge, weight)| EdgeSharpness {
                        v0: edge.lo(),
                        v1: edge.hi(),
                        sharpness: weight * MAX_SHARPNESS,
                    })
                    .collect();
                RhinoGeometry::SubD(RhinoSubD {
                    control_net,
                    edge_sharpness,
                })
            }
            GeometryObject::PointCloud { points, attributes } => {
                let mut cloud = RhinoPointCloud {
                    points: points.positions.clone(),
                    ..Default::default()
                };
                if let Some(AttrValues::Vec3(normals)) = attributes.get(AttrName::Normal) {
                    cloud.normals = Some(normals.clone());
                }
                if let Some(AttrValues::Vec4(colors)) = attributes.get(AttrName::Color) {
                    cloud.colors = Some(colors.iter().map(|c| c.truncate()).collect());
                }
                if let Some(AttrValues::Float(radii)) = attributes.get(AttrName::Radius) {
                    cloud.values = Some(radii.clone());
                }
                RhinoGeometry::PointCloud(cloud)
            }
        };
        Ok(doc.add(geometry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pentagon_object() -> GeometryObject {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.5, 1.5, 0.0),
            Vec3::new(1.0, 2.5, 0.0),
            Vec3::new(-0.5, 1.5, 0.0),
        ];
        let topology = FaceTopology::build(vertices, vec![vec![0, 1, 2, 3, 4]]).unwrap();
        GeometryObject::Mesh {
            topology,
            attributes: AttributeBuffer::new(),
        }
    }

    #[test]
    fn test_ngon_fan_decomposition_and_reassembly() {
        let mut doc = RhinoDoc::new();
        let id = RhinoTarget.construct(&mut doc, &pentagon_object()).unwrap();

        // Natively: 3 fan triangles grouped under one ngon.
        let Some(RhinoGeometry::Mesh(mesh)) = doc.geometry(id) else {
            panic!("expected a native mesh");
        };
        assert_eq!(mesh.faces.len(), 3);
        assert!(mesh.faces.iter().all(|f| f.is_triangle()));
        assert_eq!(mesh.ngons.len(), 1);
        assert_eq!(mesh.ngons[0].face_indices, vec![0, 1, 2]);

        // Extract collapses the fan back to one degree-5 face, same loop.
        let extracted = RhinoSource.extract(&doc, id).unwrap();
        let GeometryObject::Mesh { topology, .. } = &extracted else {
            panic!("variant changed");
        };
        assert_eq!(topology.num_faces(), 1);
        assert_eq!(topology.faces[0].degree(), 5);
        assert!(extracted.structurally_eq(&pentagon_object()));
    }

    #[test]
    fn test_quads_and_triangles_map_one_to_one() {
        let vertices: Vec<Vec3> = (0..5).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let topology =
            FaceTopology::build(vertices, vec![vec![0, 1, 2], vec![1, 2, 3, 4]]).unwrap();
        let object = GeometryObject::Mesh {
            topology,
            attributes: AttributeBuffer::new(),
        };
        let mut doc = RhinoDoc::new();
        let id = RhinoTarget.construct(&mut doc, &object).unwrap();
        let Some(RhinoGeometry::Mesh(mesh)) = doc.geometry(id) else {
            panic!("expected a native mesh");
        };
        assert_eq!(mesh.faces.len(), 2);
        assert!(mesh.ngons.is_empty());
        assert!(RhinoSource.extract(&doc, id).unwrap().structurally_eq(&object));
    }

    #[test]
    fn test_subd_sharpness_maps_to_unit_weight() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let control_net = RhinoMesh {
            vertices,
            faces: vec![MeshFace::quad(0, 1, 2, 3)],
            ..Default::default()
        };
        let mut doc = RhinoDoc::new();
        let id = doc.add(RhinoGeometry::SubD(RhinoSubD {
            control_net,
            edge_sharpness: vec![EdgeSharpness {
                v0: 0,
                v1: 1,
                sharpness: 8.0,
            }],
        }));

        let object = RhinoSource.extract(&doc, id).unwrap();
        let GeometryObject::SubdividedMesh { crease, scheme, .. } = &object else {
            panic!("expected a subdivided mesh");
        };
        assert_eq!(*scheme, SubdivisionScheme::CatmullClark);
        assert!((crease.get(EdgeKey::new(0, 1)) - 0.8).abs() < 1e-6);

        // Back to native: weight scales to sharpness again.
        let mut out = RhinoDoc::new();
        let out_id = RhinoTarget.construct(&mut out, &object).unwrap();
        let Some(RhinoGeometry::SubD(subd)) = out.geometry(out_id) else {
            panic!("expected a native subd");
        };
        assert_eq!(subd.edge_sharpness.len(), 1);
        assert!((subd.edge_sharpness[0].sharpness - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_point_cloud_values_become_radii() {
        let mut doc = RhinoDoc::new();
        let id = doc.add(RhinoGeometry::PointCloud(RhinoPointCloud {
            points: vec![Vec3::ZERO, Vec3::X],
            values: Some(vec![0.25, -0.5]),
            ..Default::default()
        }));
        let object = RhinoSource.extract(&doc, id).unwrap();
        // Negative native values clamp to zero radius.
        assert_eq!(
            object.attributes().get(AttrName::Radius),
            Some(&AttrValues::Float(vec![0.25, 0.0]))
        );
        assert!(object.attributes().get(AttrName::Normal).is_none());
    }

    #[test]
    fn test_ngon_without_member_faces_is_rejected() {
        let mut doc = RhinoDoc::new();
        let id = doc.add(RhinoGeometry::Mesh(RhinoMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            faces: vec![MeshFace::triangle(0, 1, 2)],
            ngons: vec![MeshNgon {
                boundary_vertices: vec![0, 1, 2],
                face_indices: vec![],
            }],
            ..Default::default()
        }));
        assert!(matches!(
            RhinoSource.extract(&doc, id),
            Err(Error::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_unsupported_kinds_are_rejected() {
        let mut doc = RhinoDoc::new();
        let brep = doc.add(RhinoGeometry::Brep { face_count: 6 });
        let curve = doc.add(RhinoGeometry::Curve { degree: 3 });
        assert!(matches!(
            RhinoSource.extract(&doc, brep),
            Err(Error::UnsupportedGeometryKind(k)) if k == "Brep"
        ));
        assert!(matches!(
            RhinoSource.extract(&doc, curve),
            Err(Error::UnsupportedGeometryKind(k)) if k == "Curve"
        ));
    }

    #[test]
    fn test_missing_object_handle() {
        let doc = RhinoDoc::new();
        assert!(matches!(
            RhinoSource.extract(&doc, RhinoObjectId(3)),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_colors_widen_to_rgba_and_back() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
        ];
        let mesh = RhinoMesh {
            vertices,
            faces: vec![MeshFace::triangle(0, 1, 2)],
            colors: Some(vec![Vec3::X, Vec3::Y, Vec3::Z]),
            ..Default::default()
        };
        let mut doc = RhinoDoc::new();
        let id = doc.add(RhinoGeometry::Mesh(mesh.clone()));
        let object = RhinoSource.extract(&doc, id).unwrap();
        let Some(AttrValues::Vec4(rgba)) = object.attributes().get(AttrName::Color) else {
            panic!("expected widened colors");
        };
        assert!(rgba.iter().all(|c| c.w == 1.0));

        let mut out = RhinoDoc::new();
        let out_id = RhinoTarget.construct(&mut out, &object).unwrap();
        let Some(RhinoGeometry::Mesh(rebuilt)) = out.geometry(out_id) else {
            panic!("expected a native mesh");
        };
        assert_eq!(rebuilt.colors, mesh.colors);
    }
}
