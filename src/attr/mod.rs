//! Typed, ordered columnar storage for per-vertex / per-point attributes.
//!
//! An [`AttributeBuffer`] holds the attribute columns of one geometry object:
//! normals, colors and radii for the vertices of a mesh or the points of a
//! point cloud. Positions live in the topology / point set, not here, so the
//! buffer only carries the optional columns. Attribute names outside the
//! known set are preserved as opaque byte payloads for forward compatibility.

use std::collections::BTreeMap;

use crate::util::{vec3_approx_eq, vec4_approx_eq, Error, Result, Vec3, Vec4};

/// Known attribute names understood by the adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrName {
    /// Per-vertex / per-point normal (3 floats, unit length not enforced).
    Normal,
    /// Per-vertex / per-point color (RGBA, 4 floats in [0, 1]).
    Color,
    /// Per-point radius (1 non-negative float).
    Radius,
}

impl AttrName {
    /// Canonical attribute name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrName::Normal => "normal",
            AttrName::Color => "color",
            AttrName::Radius => "radius",
        }
    }

    /// Parse an attribute name. Returns None for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(AttrName::Normal),
            "color" => Some(AttrName::Color),
            "radius" => Some(AttrName::Radius),
            _ => None,
        }
    }
}

/// A typed attribute column.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValues {
    /// One f32 per element (radius).
    Float(Vec<f32>),
    /// One 3-vector per element (normal).
    Vec3(Vec<Vec3>),
    /// One RGBA value per element (color).
    Vec4(Vec<Vec4>),
}

impl AttrValues {
    /// Number of elements in the column.
    pub fn len(&self) -> usize {
        match self {
            AttrValues::Float(v) => v.len(),
            AttrValues::Vec3(v) => v.len(),
            AttrValues::Vec4(v) => v.len(),
        }
    }

    /// Check if the column is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compare two columns within an absolute tolerance.
    pub fn approx_eq(&self, other: &AttrValues, eps: f32) -> bool {
        match (self, other) {
            (AttrValues::Float(a), AttrValues::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= eps)
            }
            (AttrValues::Vec3(a), AttrValues::Vec3(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| vec3_approx_eq(*x, *y, eps))
            }
            (AttrValues::Vec4(a), AttrValues::Vec4(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| vec4_approx_eq(*x, *y, eps))
            }
            _ => false,
        }
    }
}

/// Widen RGB colors to RGBA with alpha 1.0.
pub fn rgb_to_rgba(colors: &[Vec3]) -> Vec<Vec4> {
    colors.iter().map(|c| c.extend(1.0)).collect()
}

/// Attribute columns for one geometry object.
///
/// All columns share the cardinality of the owning domain (vertex count for
/// meshes, point count for point clouds). Missing columns are a valid state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeBuffer {
    known: BTreeMap<AttrName, AttrValues>,
    // Unknown attributes, kept opaque. BTreeMap keeps encode order stable.
    extra: BTreeMap<String, Vec<u8>>,
}

impl AttributeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a known attribute column, checking cardinality.
    ///
    /// Fails with [`Error::AttributeLengthMismatch`] if the column length
    /// does not equal `domain_cardinality`.
    pub fn set(
        &mut self,
        name: AttrName,
        domain_cardinality: usize,
        values: AttrValues,
    ) -> Result<()> {
        if values.len() != domain_cardinality {
            return Err(Error::AttributeLengthMismatch {
                name: name.as_str().to_string(),
                expected: domain_cardinality,
                actual: values.len(),
            });
        }
        self.known.insert(name, values);
        Ok(())
    }

    /// Get a known attribute column. Missing attributes return None.
    pub fn get(&self, name: AttrName) -> Option<&AttrValues> {
        self.known.get(&name)
    }

    /// Check whether a known attribute is present.
    pub fn has(&self, name: AttrName) -> bool {
        self.known.contains_key(&name)
    }

    /// Iterate known columns in canonical (enum) order.
    pub fn iter_known(&self) -> impl Iterator<Item = (AttrName, &AttrValues)> {
        self.known.iter().map(|(k, v)| (*k, v))
    }

    /// Store an unknown attribute payload opaquely.
    ///
    /// The payload is not interpreted; it round-trips through the
    /// interchange document byte for byte.
    pub fn set_extra(&mut self, name: impl Into<String>, payload: Vec<u8>) {
        self.extra.insert(name.into(), payload);
    }

    /// Get an unknown attribute payload.
    pub fn get_extra(&self, name: &str) -> Option<&[u8]> {
        self.extra.get(name).map(|v| v.as_slice())
    }

    /// Iterate unknown attributes in name order.
    pub fn iter_extra(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of known columns.
    pub fn num_known(&self) -> usize {
        self.known.len()
    }

    /// Number of unknown payloads.
    pub fn num_extra(&self) -> usize {
        self.extra.len()
    }

    /// Check that every known column matches the given cardinality.
    pub fn validate_cardinality(&self, domain_cardinality: usize) -> Result<()> {
        for (name, values) in &self.known {
            if values.len() != domain_cardinality {
                return Err(Error::AttributeLengthMismatch {
                    name: name.as_str().to_string(),
                    expected: domain_cardinality,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    /// Compare two buffers: known columns within tolerance, extras exact.
    pub fn approx_eq(&self, other: &AttributeBuffer, eps: f32) -> bool {
        if self.known.len() != other.known.len() || self.extra != other.extra {
            return false;
        }
        self.known.iter().all(|(name, values)| {
            other
                .known
                .get(name)
                .is_some_and(|o| values.approx_eq(o, eps))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_name_roundtrip() {
        for name in [AttrName::Normal, AttrName::Color, AttrName::Radius] {
            assert_eq!(AttrName::parse(name.as_str()), Some(name));
        }
        assert_eq!(AttrName::parse("uv"), None);
    }

    #[test]
    fn test_set_rejects_length_mismatch() {
        let mut buf = AttributeBuffer::new();
        let err = buf
            .set(AttrName::Radius, 4, AttrValues::Float(vec![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AttributeLengthMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_get_missing_is_none() {
        let buf = AttributeBuffer::new();
        assert!(buf.get(AttrName::Normal).is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut buf = AttributeBuffer::new();
        let normals = vec![Vec3::Y, Vec3::Y, Vec3::X];
        buf.set(AttrName::Normal, 3, AttrValues::Vec3(normals.clone()))
            .unwrap();
        assert_eq!(buf.get(AttrName::Normal), Some(&AttrValues::Vec3(normals)));
        assert!(buf.has(AttrName::Normal));
        assert!(!buf.has(AttrName::Color));
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgba = rgb_to_rgba(&[Vec3::new(0.5, 0.25, 1.0)]);
        assert_eq!(rgba, vec![Vec4::new(0.5, 0.25, 1.0, 1.0)]);
    }

    #[test]
    fn test_extra_preserved_opaque() {
        let mut buf = AttributeBuffer::new();
        buf.set_extra("uv", vec![1, 2, 3, 4]);
        assert_eq!(buf.get_extra("uv"), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(buf.get_extra("velocity"), None);
    }

    #[test]
    fn test_validate_cardinality() {
        let mut buf = AttributeBuffer::new();
        buf.set(AttrName::Radius, 2, AttrValues::Float(vec![0.1, 0.2]))
            .unwrap();
        assert!(buf.validate_cardinality(2).is_ok());
        assert!(buf.validate_cardinality(3).is_err());
    }
}
