//! CPU-side geometry for loaded artifacts and marker primitives.
//!
//! Assets are parsed into [`RawGeometry`] and never modified afterwards:
//! normalization is expressed as node transforms in the scene graph, so the
//! raw vertex positions and their [`Aabb`] stay in the asset's own space.
//!
//! # Supported Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | STL    | `.stl`     | Binary and ASCII, no UV coordinates |

use crate::mesh::Vertex3d;
use glam::{Mat4, Vec3};
use std::io::{Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when reading geometry.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// File format could not be determined from the extension.
    #[error("Unknown geometry format: '{0}'")]
    UnknownFormat(String),
    /// The geometry data was invalid or corrupt.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Geometry formats recognized by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryFormat {
    Stl,
}

impl GeometryFormat {
    /// Detects the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, GeometryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => Ok(Self::Stl),
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }
}

/// Minimal axis-aligned box containing a set of points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box from a center and full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest of the three extents.
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Bounds of this box after an affine transform (all eight corners).
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = (0..8).map(|i| {
            let pick = |bit: u32, lo: f32, hi: f32| if i & bit == 0 { lo } else { hi };
            matrix.transform_point3(Vec3::new(
                pick(1, self.min.x, self.max.x),
                pick(2, self.min.y, self.max.y),
                pick(4, self.min.z, self.max.z),
            ))
        });
        // Eight corners are always present.
        Self::from_points(corners).unwrap_or(*self)
    }
}

/// Raw geometry data as produced by an asset loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGeometry {
    /// Vertex positions, normals, and UVs.
    pub vertices: Vec<Vertex3d>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box, `None` if there are no vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.position)))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// An axis-aligned box with the given full size, centered at `center`.
    ///
    /// Stands in for real assets in tests and placeholder catalogs.
    pub fn cuboid(size: Vec3, center: Vec3) -> Self {
        let h = size * 0.5;
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv, uv) in [
                (-1.0, -1.0, [0.0, 0.0]),
                (1.0, -1.0, [1.0, 0.0]),
                (1.0, 1.0, [1.0, 1.0]),
                (-1.0, 1.0, [0.0, 1.0]),
            ] {
                let p = center + (normal + u * su + v * sv) * h;
                vertices.push(Vertex3d::new(p.into(), normal.into(), uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(vertices, indices)
    }

    /// A UV sphere centered at the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        let mut indices = Vec::with_capacity((segments * rings * 6) as usize);

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                vertices.push(Vertex3d::new(
                    (normal * radius).into(),
                    normal.into(),
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;
                indices.extend_from_slice(&[current, next, current + 1]);
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Parses geometry of a known format from bytes.
    pub fn from_bytes(format: GeometryFormat, bytes: &[u8]) -> Result<Self, GeometryError> {
        match format {
            GeometryFormat::Stl => Self::parse_stl(&mut std::io::Cursor::new(bytes)),
        }
    }

    fn parse_stl<R: Read + Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL parse error: {}", e)))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        // stl_io returns an IndexedMesh; unroll it so each face keeps its normal
        for (i, face) in stl.faces.iter().enumerate() {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let vertex = stl.vertices.get(vertex_idx).ok_or_else(|| {
                    GeometryError::Parse(format!("face {} references missing vertex {}", i, vertex_idx))
                })?;
                let position: [f32; 3] = (*vertex).into();
                vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
            }

            let base = (i * 3) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Ok(Self::new(vertices, indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_TRIANGLE_STL: &str = "solid t
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 4 0 0
    vertex 0 2 0
  endloop
endfacet
endsolid t
";

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let bounds = geom.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.max_dimension(), 4.0);
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert!(RawGeometry::default().bounds().is_none());
    }

    #[test]
    fn cuboid_bounds_match_request() {
        let geom = RawGeometry::cuboid(Vec3::splat(4.0), Vec3::splat(10.0));
        let bounds = geom.bounds().unwrap();

        assert_eq!(bounds.center(), Vec3::splat(10.0));
        assert_eq!(bounds.size(), Vec3::splat(4.0));
        assert_eq!(geom.triangle_count(), 12);
    }

    #[test]
    fn transformed_bounds_follow_scale_and_translation() {
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0));
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(0.5),
            glam::Quat::IDENTITY,
            Vec3::new(1.0, 0.0, 0.0),
        );

        let moved = bounds.transformed(&m);
        assert_eq!(moved.center(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(moved.size(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn sphere_stays_within_radius() {
        let geom = RawGeometry::sphere(0.1, 16, 16);
        let bounds = geom.bounds().unwrap();

        assert!(bounds.max_dimension() <= 0.2 + 1e-5);
        assert_eq!(geom.triangle_count(), 16 * 16 * 2);
    }

    #[test]
    fn parses_ascii_stl() {
        let geom = RawGeometry::from_bytes(GeometryFormat::Stl, ONE_TRIANGLE_STL.as_bytes()).unwrap();

        assert_eq!(geom.triangle_count(), 1);
        assert_eq!(geom.bounds().unwrap().size(), Vec3::new(4.0, 2.0, 0.0));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = GeometryFormat::from_path(Path::new("3d/object1/scene.gltf")).unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "gltf"));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = RawGeometry::from_bytes(GeometryFormat::Stl, b"not an stl").unwrap_err();
        assert!(matches!(err, GeometryError::Parse(_)));
    }
}
