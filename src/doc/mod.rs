//! Interchange document codec.
//!
//! Serializes a [`GeometryObject`] to the versioned binary interchange
//! document and back. Layout (all little-endian):
//!
//! ```text
//! magic    : b"ETGO"
//! version  : u16
//! variant  : u8 (0 mesh, 1 subdivided_mesh, 2 point_cloud)
//! body     : variant-specific sections
//! ```
//!
//! Encoding is deterministic: the same object always yields byte-identical
//! output (crease edges and unknown attributes are stored in sorted order).
//! Decoding validates every data model invariant and never constructs a
//! half-checked object.
//!
//! A copy of several objects is framed as a bundle: a count followed by
//! length-prefixed single-object documents.

mod reader;
mod writer;

pub use reader::DocReader;
pub use writer::DocWriter;

use crate::attr::{AttrName, AttrValues, AttributeBuffer};
use crate::geom::{GeometryObject, PointSet, SubdivisionScheme};
use crate::topo::{EdgeCreaseMap, EdgeKey, FaceTopology};
use crate::util::{Error, Result, Vec3};

/// Magic bytes of a single-object interchange document.
pub const DOC_MAGIC: [u8; 4] = *b"ETGO";

/// Magic bytes of a multi-object bundle.
pub const BUNDLE_MAGIC: [u8; 4] = *b"ETBN";

/// Schema version written by this codec.
pub const SCHEMA_VERSION: u16 = 1;

const VARIANT_MESH: u8 = 0;
const VARIANT_SUBDIVIDED_MESH: u8 = 1;
const VARIANT_POINT_CLOUD: u8 = 2;

const ATTR_TAG_NORMAL: u8 = 1;
const ATTR_TAG_COLOR: u8 = 2;
const ATTR_TAG_RADIUS: u8 = 3;

fn attr_tag(name: AttrName) -> u8 {
    match name {
        AttrName::Normal => ATTR_TAG_NORMAL,
        AttrName::Color => ATTR_TAG_COLOR,
        AttrName::Radius => ATTR_TAG_RADIUS,
    }
}

fn scheme_tag(scheme: SubdivisionScheme) -> u8 {
    match scheme {
        SubdivisionScheme::CatmullClark => 0,
        SubdivisionScheme::Loop => 1,
        SubdivisionScheme::Bilinear => 2,
    }
}

fn scheme_from_tag(tag: u8) -> Result<SubdivisionScheme> {
    match tag {
        0 => Ok(SubdivisionScheme::CatmullClark),
        1 => Ok(SubdivisionScheme::Loop),
        2 => Ok(SubdivisionScheme::Bilinear),
        _ => Err(Error::malformed(format!("unknown subdivision scheme tag {tag}"))),
    }
}

/// Serialize a geometry object to interchange document bytes.
///
/// Validates the object's cross-component invariants first, so a malformed
/// object never reaches the wire.
pub fn encode(object: &GeometryObject) -> Result<Vec<u8>> {
    object.validate()?;
    let mut w = DocWriter::new();
    w.write_bytes(&DOC_MAGIC)?;
    w.write_u16(SCHEMA_VERSION)?;
    match object {
        GeometryObject::Mesh {
            topology,
            attributes,
        } => {
            w.write_u8(VARIANT_MESH)?;
            write_topology(&mut w, topology)?;
            write_attributes(&mut w, attributes)?;
        }
        GeometryObject::SubdividedMesh {
            topology,
            crease,
            scheme,
            attributes,
        } => {
            w.write_u8(VARIANT_SUBDIVIDED_MESH)?;
            write_topology(&mut w, topology)?;
            w.write_u8(scheme_tag(*scheme))?;
            w.write_u32(crease.len() as u32)?;
            for (edge, weight) in crease.iter() {
                w.write_u32(edge.lo())?;
                w.write_u32(edge.hi())?;
                w.write_f32(weight)?;
            }
            write_attributes(&mut w, attributes)?;
        }
        GeometryObject::PointCloud { points, attributes } => {
            w.write_u8(VARIANT_POINT_CLOUD)?;
            w.write_u32(points.len() as u32)?;
            w.write_vec3_slice(&points.positions)?;
            write_attributes(&mut w, attributes)?;
        }
    }
    Ok(w.into_bytes())
}

/// Deserialize an interchange document into a geometry object.
///
/// Fails with [`Error::SchemaVersionUnsupported`] for documents newer than
/// [`SCHEMA_VERSION`], [`Error::InvalidMagic`] for foreign bytes, and
/// [`Error::MalformedDocument`] for anything that violates the data model.
pub fn decode(bytes: &[u8]) -> Result<GeometryObject> {
    let mut r = DocReader::new(bytes);
    if r.read_bytes(4)? != DOC_MAGIC {
        return Err(Error::InvalidMagic);
    }
    let version = r.read_u16()?;
    if version > SCHEMA_VERSION {
        return Err(Error::SchemaVersionUnsupported(version));
    }
    let variant = r.read_u8()?;
    let object = match variant {
        VARIANT_MESH => {
            let topology = read_topology(&mut r)?;
            let attributes = read_attributes(&mut r, topology.num_vertices())?;
            GeometryObject::Mesh {
                topology,
                attributes,
            }
        }
        VARIANT_SUBDIVIDED_MESH => {
            let topology = read_topology(&mut r)?;
            let scheme = scheme_from_tag(r.read_u8()?)?;
            let crease = read_creases(&mut r, &topology)?;
            let attributes = read_attributes(&mut r, topology.num_vertices())?;
            GeometryObject::SubdividedMesh {
                topology,
                crease,
                scheme,
                attributes,
            }
        }
        VARIANT_POINT_CLOUD => {
            let count = checked_count(&mut r, 12)?;
            let mut positions: Vec<Vec3> = Vec::with_capacity(count);
            for _ in 0..count {
                positions.push(r.read_vec3()?);
            }
            let attributes = read_attributes(&mut r, count)?;
            GeometryObject::PointCloud {
                points: PointSet::new(positions),
                attributes,
            }
        }
        other => {
            return Err(Error::malformed(format!("unknown variant discriminator {other}")));
        }
    };
    if !r.is_at_end() {
        return Err(Error::malformed(format!(
            "{} trailing bytes after document body",
            r.remaining()
        )));
    }
    Ok(object)
}

// Read a u32 element count and reject counts that cannot fit in the
// remaining bytes, so a corrupt header cannot drive a huge allocation.
fn checked_count(r: &mut DocReader, min_elem_size: usize) -> Result<usize> {
    let count = r.read_u32()? as usize;
    if count.saturating_mul(min_elem_size) > r.remaining() {
        return Err(Error::UnexpectedEof(r.pos() as u64));
    }
    Ok(count)
}

fn write_topology(w: &mut DocWriter, topology: &FaceTopology) -> Result<()> {
    w.write_u32(topology.num_vertices() as u32)?;
    w.write_vec3_slice(&topology.vertices)?;
    w.write_u32(topology.num_faces() as u32)?;
    for face in &topology.faces {
        w.write_u32(face.degree() as u32)?;
        for &vi in &face.vertex_indices {
            w.write_u32(vi)?;
        }
    }
    Ok(())
}

fn read_topology(r: &mut DocReader) -> Result<FaceTopology> {
    let vertex_count = checked_count(r, 12)?;
    let mut vertices: Vec<Vec3> = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        vertices.push(r.read_vec3()?);
    }
    let face_count = checked_count(r, 16)?;
    let mut face_index_lists = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        let degree = checked_count(r, 4)?;
        let mut indices = Vec::with_capacity(degree);
        for _ in 0..degree {
            indices.push(r.read_u32()?);
        }
        face_index_lists.push(indices);
    }
    // Topology invariants are data model invariants of the document.
    FaceTopology::build(vertices, face_index_lists).map_err(|e| Error::malformed(e.to_string()))
}

fn read_creases(r: &mut DocReader, topology: &FaceTopology) -> Result<EdgeCreaseMap> {
    let count = checked_count(r, 12)?;
    let mut creases = EdgeCreaseMap::new();
    let mut prev: Option<EdgeKey> = None;
    for _ in 0..count {
        let v0 = r.read_u32()?;
        let v1 = r.read_u32()?;
        let weight = r.read_f32()?;
        if v0 >= v1 {
            return Err(Error::malformed(format!(
                "crease edge ({v0}, {v1}) is not in canonical (lo, hi) order"
            )));
        }
        if !(weight.is_finite() && (0.0..=1.0).contains(&weight)) {
            return Err(Error::malformed(format!(
                "crease weight {weight} outside [0, 1]"
            )));
        }
        let edge = EdgeKey::new(v0, v1);
        if prev.is_some_and(|p| p >= edge) {
            return Err(Error::malformed("crease edges not sorted".to_string()));
        }
        prev = Some(edge);
        creases.set(edge, weight);
    }
    creases.validate_against(topology)?;
    Ok(creases)
}

fn write_attributes(w: &mut DocWriter, attributes: &AttributeBuffer) -> Result<()> {
    w.write_u32(attributes.num_known() as u32)?;
    for (name, values) in attributes.iter_known() {
        w.write_u8(attr_tag(name))?;
        let mut payload = DocWriter::new();
        match values {
            AttrValues::Float(v) => payload.write_f32_slice(v)?,
            AttrValues::Vec3(v) => payload.write_vec3_slice(v)?,
            AttrValues::Vec4(v) => payload.write_vec4_slice(v)?,
        }
        w.write_payload(&payload.into_bytes())?;
    }
    w.write_u32(attributes.num_extra() as u32)?;
    for (name, payload) in attributes.iter_extra() {
        w.write_str(name)?;
        w.write_payload(payload)?;
    }
    Ok(())
}

fn read_attributes(r: &mut DocReader, domain_cardinality: usize) -> Result<AttributeBuffer> {
    let mut attributes = AttributeBuffer::new();
    let known_count = r.read_u32()?;
    let mut prev_tag = 0u8;
    for _ in 0..known_count {
        let tag = r.read_u8()?;
        if tag <= prev_tag {
            return Err(Error::malformed(
                "attribute tags not in ascending order".to_string(),
            ));
        }
        prev_tag = tag;
        let payload = r.read_payload()?;
        let (name, values) = parse_attr_payload(tag, &payload)?;
        if values.len() != domain_cardinality {
            return Err(Error::malformed(format!(
                "attribute '{}' has {} values for domain of {}",
                name.as_str(),
                values.len(),
                domain_cardinality
            )));
        }
        attributes
            .set(name, domain_cardinality, values)
            .map_err(|e| Error::malformed(e.to_string()))?;
    }
    let extra_count = r.read_u32()?;
    let mut prev_name: Option<String> = None;
    for _ in 0..extra_count {
        let name = r.read_str()?;
        if prev_name.as_deref().is_some_and(|p| p >= name.as_str()) {
            return Err(Error::malformed(
                "extra attributes not sorted by name".to_string(),
            ));
        }
        let payload = r.read_payload()?;
        attributes.set_extra(name.clone(), payload);
        prev_name = Some(name);
    }
    Ok(attributes)
}

fn parse_attr_payload(tag: u8, payload: &[u8]) -> Result<(AttrName, AttrValues)> {
    let mut p = DocReader::new(payload);
    match tag {
        ATTR_TAG_NORMAL => {
            if payload.len() % 12 != 0 {
                return Err(Error::malformed("normal payload not a multiple of 12 bytes"));
            }
            let mut values = Vec::with_capacity(payload.len() / 12);
            while !p.is_at_end() {
                values.push(p.read_vec3()?);
            }
            Ok((AttrName::Normal, AttrValues::Vec3(values)))
        }
        ATTR_TAG_COLOR => {
            if payload.len() % 16 != 0 {
                return Err(Error::malformed("color payload not a multiple of 16 bytes"));
            }
            let mut values = Vec::with_capacity(payload.len() / 16);
            while !p.is_at_end() {
                values.push(p.read_vec4()?);
            }
            Ok((AttrName::Color, AttrValues::Vec4(values)))
        }
        ATTR_TAG_RADIUS => {
            if payload.len() % 4 != 0 {
                return Err(Error::malformed("radius payload not a multiple of 4 bytes"));
            }
            let mut values = Vec::with_capacity(payload.len() / 4);
            while !p.is_at_end() {
                let radius = p.read_f32()?;
                if !(radius.is_finite() && radius >= 0.0) {
                    return Err(Error::malformed(format!("negative radius {radius}")));
                }
                values.push(radius);
            }
            Ok((AttrName::Radius, AttrValues::Float(values)))
        }
        other => Err(Error::malformed(format!("unknown attribute tag {other}"))),
    }
}

/// Frame several single-object documents into one bundle buffer.
pub fn encode_bundle(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut w = DocWriter::new();
    w.write_bytes(&BUNDLE_MAGIC)?;
    w.write_u16(SCHEMA_VERSION)?;
    w.write_u32(documents.len() as u32)?;
    for doc in documents {
        w.write_payload(doc)?;
    }
    Ok(w.into_bytes())
}

/// Split a bundle buffer back into single-object documents.
///
/// The documents themselves are not decoded; each slice is handed to
/// [`decode`] by the caller.
pub fn decode_bundle(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    let mut r = DocReader::new(bytes);
    if r.read_bytes(4)? != BUNDLE_MAGIC {
        return Err(Error::InvalidMagic);
    }
    let version = r.read_u16()?;
    if version > SCHEMA_VERSION {
        return Err(Error::SchemaVersionUnsupported(version));
    }
    let count = r.read_u32()? as usize;
    let mut documents = Vec::with_capacity(count.min(r.remaining()));
    for _ in 0..count {
        let len = r.read_u32()? as usize;
        documents.push(r.read_bytes(len)?);
    }
    if !r.is_at_end() {
        return Err(Error::malformed(format!(
            "{} trailing bytes after bundle",
            r.remaining()
        )));
    }
    Ok(documents)
}
