//! Blender-style host adapter.
//!
//! The native model mirrors Blender's mesh: polygons are arbitrary-degree
//! vertex loops, so n-gons map one-to-one in both directions and no fan
//! decomposition is ever needed. Edge crease is a `[0, 1]` float layer; a
//! mesh carrying a subdivision-surface modifier classifies as a subdivision
//! surface. Point clouds have a per-point radius plus optional normal and
//! RGBA color attributes.

use tracing::debug;

use crate::adapter::{SourceAdapter, TargetAdapter};
use crate::attr::{AttrName, AttrValues, AttributeBuffer};
use crate::geom::{GeometryObject, PointSet, SubdivisionScheme};
use crate::topo::{EdgeCreaseMap, EdgeKey, FaceTopology};
use crate::util::{Error, Result, Vec3, Vec4};

/// Subdivision-surface modifier on a native mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubsurfModifier {
    pub scheme: SubdivisionScheme,
    /// Viewport subdivision level; not part of the transferred geometry.
    pub levels: u32,
}

impl Default for SubsurfModifier {
    fn default() -> Self {
        Self {
            scheme: SubdivisionScheme::CatmullClark,
            levels: 2,
        }
    }
}

/// Per-edge crease entry, weight in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCrease {
    pub v0: u32,
    pub v1: u32,
    pub crease: f32,
}

/// Native mesh data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlenderMesh {
    pub vertices: Vec<Vec3>,
    /// Polygon loops, any degree >= 3.
    pub polygons: Vec<Vec<u32>>,
    /// Edge crease layer; only meaningful under a subsurf modifier.
    pub edge_creases: Vec<EdgeCrease>,
    pub subsurf: Option<SubsurfModifier>,
    /// Per-vertex normals.
    pub normals: Option<Vec<Vec3>>,
    /// Per-vertex RGBA color attribute.
    pub colors: Option<Vec<Vec4>>,
}

/// Native point cloud data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlenderPointCloud {
    pub positions: Vec<Vec3>,
    pub radius: Option<Vec<f32>>,
    pub normals: Option<Vec<Vec3>>,
    pub colors: Option<Vec<Vec4>>,
}

/// Native object kinds in a Blender-style scene.
#[derive(Clone, Debug, PartialEq)]
pub enum BlenderObjectData {
    Mesh(BlenderMesh),
    PointCloud(BlenderPointCloud),
    /// Curve object; no adapter mapping.
    Curve { spline_count: usize },
    /// Grease pencil object; no adapter mapping.
    GreasePencil,
}

impl BlenderObjectData {
    /// Native kind name, used in unsupported-kind errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BlenderObjectData::Mesh(_) => "MESH",
            BlenderObjectData::PointCloud(_) => "POINTCLOUD",
            BlenderObjectData::Curve { .. } => "CURVE",
            BlenderObjectData::GreasePencil => "GREASEPENCIL",
        }
    }
}

/// Handle to an object in a [`BlenderScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlenderObjectId(pub u32);

/// A Blender-style scene: a flat object table.
#[derive(Clone, Debug, Default)]
pub struct BlenderScene {
    objects: Vec<BlenderObjectData>,
}

impl BlenderScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add object data, returning its handle.
    pub fn add(&mut self, data: BlenderObjectData) -> BlenderObjectId {
        self.objects.push(data);
        BlenderObjectId(self.objects.len() as u32 - 1)
    }

    /// Look up object data by handle.
    pub fn object(&self, id: BlenderObjectId) -> Option<&BlenderObjectData> {
        self.objects.get(id.0 as usize)
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn mesh_topology(mesh: &BlenderMesh) -> Result<FaceTopology> {
    FaceTopology::build(mesh.vertices.clone(), mesh.polygons.clone())
}

fn mesh_attributes(mesh: &BlenderMesh, vertex_count: usize) -> Result<AttributeBuffer> {
    let mut attributes = AttributeBuffer::new();
    if let Some(normals) = &mesh.normals {
        attributes.set(AttrName::Normal, vertex_count, AttrValues::Vec3(normals.clone()))?;
    }
    if let Some(colors) = &mesh.colors {
        attributes.set(AttrName::Color, vertex_count, AttrValues::Vec4(colors.clone()))?;
    }
    Ok(attributes)
}

fn apply_mesh_attributes(mesh: &mut BlenderMesh, attributes: &AttributeBuffer) {
    if let Some(AttrValues::Vec3(normals)) = attributes.get(AttrName::Normal) {
        mesh.normals = Some(normals.clone());
    }
    if let Some(AttrValues::Vec4(colors)) = attributes.get(AttrName::Color) {
        mesh.colors = Some(colors.clone());
    }
}

/// Blender-style source adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlenderSource;

impl SourceAdapter for BlenderSource {
    type Doc = BlenderScene;
    type Handle = BlenderObjectId;

    fn host_name(&self) -> &'static str {
        "blender"
    }

    fn extract(&self, scene: &BlenderScene, handle: BlenderObjectId) -> Result<GeometryObject> {
        let data = scene
            .object(handle)
            .ok_or_else(|| Error::ObjectNotFound(format!("blender object {}", handle.0)))?;
        debug!(kind = data.kind_name(), id = handle.0, "blender extract");
        match data {
            BlenderObjectData::Mesh(mesh) => {
                let topology = mesh_topology(mesh)?;
                let attributes = mesh_attributes(mesh, topology.num_vertices())?;
                match mesh.subsurf {
                    Some(modifier) => {
                        let mut crease = EdgeCreaseMap::new();
                        for ec in &mesh.edge_creases {
                            crease.set(EdgeKey::new(ec.v0, ec.v1), ec.crease);
                        }
                        crease.validate_against(&topology).map_err(|_| {
                            Error::topology("edge crease on a non-existent edge".to_string())
                        })?;
                        Ok(GeometryObject::SubdividedMesh {
                            topology,
                            crease,
                            scheme: modifier.scheme,
                            attributes,
                        })
                    }
                    None => Ok(GeometryObject::Mesh {
                        topology,
                        attributes,
                    }),
                }
            }
            BlenderObjectData::PointCloud(cloud) => {
                let count = cloud.positions.len();
                let mut attributes = AttributeBuffer::new();
                if let Some(normals) = &cloud.normals {
                    attributes.set(AttrName::Normal, count, AttrValues::Vec3(normals.clone()))?;
                }
                if let Some(colors) = &cloud.colors {
                    attributes.set(AttrName::Color, count, AttrValues::Vec4(colors.clone()))?;
                }
                if let Some(radius) = &cloud.radius {
                    let radii = radius.iter().map(|r| r.max(0.0)).collect();
                    attributes.set(AttrName::Radius, count, AttrValues::Float(radii))?;
                }
                Ok(GeometryObject::PointCloud {
                    points: PointSet::new(cloud.positions.clone()),
                    attributes,
                })
            }
            other => Err(Error::unsupported(other.kind_name())),
        }
    }
}

/// Blender-style target adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlenderTarget;

impl TargetAdapter for BlenderTarget {
    type Doc = BlenderScene;
    type Handle = BlenderObjectId;

    fn host_name(&self) -> &'static str {
        "blender"
    }

    fn construct(&self, scene: &mut BlenderScene, object: &GeometryObject) -> Result<BlenderObjectId> {
        object.validate()?;
        debug!(variant = object.variant_name(), "blender construct");
        let data = match object {
            GeometryObject::Mesh {
                topology,
                attributes,
            } => {
                let mut mesh = BlenderMesh {
                    vertices: topology.vertices.clone(),
                    polygons: topology
                        .faces
                        .iter()
                        .map(|f| f.vertex_indices.to_vec())
                        .collect(),
                    ..Default::default()
                };
                apply_mesh_attributes(&mut mesh, attributes);
                BlenderObjectData::Mesh(mesh)
            }
            GeometryObject::SubdividedMesh {
                topology,
                crease,
                scheme,
                attributes,
            } => {
                let mut mesh = BlenderMesh {
                    vertices: topology.vertices.clone(),
                    polygons: topology
                        .faces
                        .iter()
                        .map(|f| f.vertex_indices.to_vec())
                        .collect(),
                    edge_creases: crease
                        .iter()
                        .map(|(edge, weight)| EdgeCrease {
                            v0: edge.lo(),
                            v1: edge.hi(),
                            crease: weight,
                        })
                        .collect(),
                    subsurf: Some(SubsurfModifier {
                        scheme: *scheme,
                        ..Default::default()
                    }),
                    ..Default::default()
                };
                apply_mesh_attributes(&mut mesh, attributes);
                BlenderObjectData::Mesh(mesh)
            }
            GeometryObject::PointCloud { points, attributes } => {
                let mut cloud = BlenderPointCloud {
                    positions: points.positions.clone(),
                    ..Default::default()
                };
                if let Some(AttrValues::Vec3(normals)) = attributes.get(AttrName::Normal) {
                    cloud.normals = Some(normals.clone());
                }
                if let Some(AttrValues::Vec4(colors)) = attributes.get(AttrName::Color) {
                    cloud.colors = Some(colors.clone());
                }
                if let Some(AttrValues::Float(radii)) = attributes.get(AttrName::Radius) {
                    cloud.radius = Some(radii.clone());
                }
                BlenderObjectData::PointCloud(cloud)
            }
        };
        Ok(scene.add(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_vertices() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_plain_mesh_classification() {
        let mut scene = BlenderScene::new();
        let id = scene.add(BlenderObjectData::Mesh(BlenderMesh {
            vertices: quad_vertices(),
            polygons: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        }));
        let object = BlenderSource.extract(&scene, id).unwrap();
        assert_eq!(object.variant_name(), "mesh");
    }

    #[test]
    fn test_subsurf_mesh_classifies_as_subdivided() {
        let mut scene = BlenderScene::new();
        let id = scene.add(BlenderObjectData::Mesh(BlenderMesh {
            vertices: quad_vertices(),
            polygons: vec![vec![0, 1, 2, 3]],
            edge_creases: vec![EdgeCrease {
                v0: 0,
                v1: 1,
                crease: 0.8,
            }],
            subsurf: Some(SubsurfModifier::default()),
            ..Default::default()
        }));
        let object = BlenderSource.extract(&scene, id).unwrap();
        let GeometryObject::SubdividedMesh { crease, scheme, .. } = &object else {
            panic!("expected a subdivided mesh");
        };
        assert_eq!(*scheme, SubdivisionScheme::CatmullClark);
        assert_eq!(crease.get(EdgeKey::new(0, 1)), 0.8);
    }

    #[test]
    fn test_ngons_survive_natively() {
        let vertices: Vec<Vec3> = (0..6)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 6.0;
                Vec3::new(angle.cos(), angle.sin(), 0.0)
            })
            .collect();
        let topology = FaceTopology::build(vertices, vec![vec![0, 1, 2, 3, 4, 5]]).unwrap();
        let object = GeometryObject::Mesh {
            topology,
            attributes: AttributeBuffer::new(),
        };
        let mut scene = BlenderScene::new();
        let id = BlenderTarget.construct(&mut scene, &object).unwrap();
        let Some(BlenderObjectData::Mesh(mesh)) = scene.object(id) else {
            panic!("expected a native mesh");
        };
        // No decomposition: the hexagon is stored as one polygon.
        assert_eq!(mesh.polygons, vec![vec![0, 1, 2, 3, 4, 5]]);
        assert!(BlenderSource.extract(&scene, id).unwrap().structurally_eq(&object));
    }

    #[test]
    fn test_point_cloud_roundtrip_in_host() {
        let mut scene = BlenderScene::new();
        let id = scene.add(BlenderObjectData::PointCloud(BlenderPointCloud {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            radius: Some(vec![0.1, 0.2, 0.3]),
            ..Default::default()
        }));
        let object = BlenderSource.extract(&scene, id).unwrap();
        let mut out = BlenderScene::new();
        let out_id = BlenderTarget.construct(&mut out, &object).unwrap();
        assert_eq!(scene.object(id), out.object(out_id));
    }

    #[test]
    fn test_unsupported_kinds_are_rejected() {
        let mut scene = BlenderScene::new();
        let curve = scene.add(BlenderObjectData::Curve { spline_count: 2 });
        let pencil = scene.add(BlenderObjectData::GreasePencil);
        assert!(matches!(
            BlenderSource.extract(&scene, curve),
            Err(Error::UnsupportedGeometryKind(k)) if k == "CURVE"
        ));
        assert!(matches!(
            BlenderSource.extract(&scene, pencil),
            Err(Error::UnsupportedGeometryKind(k)) if k == "GREASEPENCIL"
        ));
    }

    #[test]
    fn test_crease_on_missing_edge_is_rejected() {
        let mut scene = BlenderScene::new();
        let id = scene.add(BlenderObjectData::Mesh(BlenderMesh {
            vertices: quad_vertices(),
            polygons: vec![vec![0, 1, 2, 3]],
            edge_creases: vec![EdgeCrease {
                v0: 0,
                v1: 2, // diagonal
                crease: 0.5,
            }],
            subsurf: Some(SubsurfModifier::default()),
            ..Default::default()
        }));
        assert!(matches!(
            BlenderSource.extract(&scene, id),
            Err(Error::InvalidTopology(_))
        ));
    }
}
