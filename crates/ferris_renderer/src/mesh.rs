//! Triangle meshes and the line-oriented mesh loader.
//!
//! The loader understands the subset of Wavefront OBJ a path tracer needs:
//!
//! ```text
//! v x y z          vertex position (extra fields ignored)
//! f i j k ...      face, 1-based vertex indices; "i/t/n" sub-fields ignored
//! ```
//!
//! Faces with more than three indices are split into a triangle fan. Every
//! other record type, blank lines and `#` comments are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::hittable::{nearest_hit, HitRecord, Hittable};
use crate::{Material, Triangle};
use ferris_math::{Aabb, Interval, Ray, Vec3};

/// Errors that can occur while loading a mesh.
///
/// Any error aborts the whole load; a partially parsed mesh is never returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open mesh file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while reading mesh: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: face references vertex {index}, but only {vertex_count} vertices are defined so far")]
    FaceIndexOutOfRange {
        line: usize,
        index: i64,
        vertex_count: usize,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// A triangle mesh sharing one material.
///
/// The mesh owns its triangles exclusively; the bounding box is the union of
/// the triangle boxes and doubles as a cheap rejection test before the
/// per-triangle scan.
#[derive(Clone)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    bbox: Aabb,
}

impl Mesh {
    /// Build a mesh from already constructed triangles.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let bbox = triangles.iter().fold(Aabb::EMPTY, |acc, tri| {
            Aabb::surrounding(&acc, &tri.bounding_box())
        });

        Self { triangles, bbox }
    }

    /// Load a mesh file, translating every vertex by `center`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        material: Arc<dyn Material>,
        center: Vec3,
    ) -> LoadResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (mesh, vertex_count) = Self::parse_records(BufReader::new(file), material, center)?;
        log::info!(
            "Loaded mesh {}: {} vertices, {} triangles",
            path.display(),
            vertex_count,
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Parse mesh records from any buffered reader.
    pub fn parse<R: BufRead>(
        reader: R,
        material: Arc<dyn Material>,
        center: Vec3,
    ) -> LoadResult<Self> {
        Self::parse_records(reader, material, center).map(|(mesh, _)| mesh)
    }

    /// Parse records, also returning how many vertices were read.
    fn parse_records<R: BufRead>(
        reader: R,
        material: Arc<dyn Material>,
        center: Vec3,
    ) -> LoadResult<(Self, usize)> {
        let mut vertices: Vec<Vec3> = Vec::new();
        let mut triangles = Vec::new();
        let mut skipped = 0usize;

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let mut fields = line.split_whitespace();

            match fields.next() {
                Some("v") => vertices.push(parse_vertex(fields, line_no)? + center),
                Some("f") => {
                    let face = parse_face(fields, line_no, vertices.len())?;
                    // Triangle fan around the first corner
                    for pair in face[1..].windows(2) {
                        triangles.push(Triangle::from_vertices(
                            vertices[face[0]],
                            vertices[pair[0]],
                            vertices[pair[1]],
                            Arc::clone(&material),
                        ));
                    }
                }
                None => {}
                Some(prefix) if prefix.starts_with('#') => {}
                Some(prefix) => {
                    log::debug!("Skipping unrecognized record '{}' at line {}", prefix, line_no);
                    skipped += 1;
                }
            }
        }

        log::debug!(
            "Parsed {} vertices, {} triangles ({} records skipped)",
            vertices.len(),
            triangles.len(),
            skipped
        );

        Ok((Self::from_triangles(triangles), vertices.len()))
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl Hittable for Mesh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        if !self.bbox.hit(ray, ray_t) {
            return None;
        }
        nearest_hit(&self.triangles, ray, ray_t)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

fn parse_vertex<'a>(mut fields: impl Iterator<Item = &'a str>, line: usize) -> LoadResult<Vec3> {
    let mut coord = |axis: &str| -> LoadResult<f32> {
        let field = fields.next().ok_or_else(|| LoadError::Parse {
            line,
            message: format!("vertex is missing its {} coordinate", axis),
        })?;
        field.parse::<f32>().map_err(|_| LoadError::Parse {
            line,
            message: format!("invalid {} coordinate '{}'", axis, field),
        })
    };

    let x = coord("x")?;
    let y = coord("y")?;
    let z = coord("z")?;
    Ok(Vec3::new(x, y, z))
}

/// Parse face indices into 0-based positions, validated against the
/// vertices defined so far.
fn parse_face<'a>(
    fields: impl Iterator<Item = &'a str>,
    line: usize,
    vertex_count: usize,
) -> LoadResult<Vec<usize>> {
    let face = fields
        .map(|field| {
            // "7/2/5" or "7//5": only the position index matters
            let position = field.split('/').next().unwrap_or(field);
            let index = position.parse::<i64>().map_err(|_| LoadError::Parse {
                line,
                message: format!("invalid vertex index '{}'", field),
            })?;

            if index < 1 || index as u64 > vertex_count as u64 {
                return Err(LoadError::FaceIndexOutOfRange {
                    line,
                    index,
                    vertex_count,
                });
            }
            Ok((index - 1) as usize)
        })
        .collect::<LoadResult<Vec<_>>>()?;

    if face.len() < 3 {
        return Err(LoadError::Parse {
            line,
            message: format!("face needs at least 3 vertices, found {}", face.len()),
        });
    }

    Ok(face)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lambertian;
    use std::io::Cursor;

    fn grey() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    fn parse(source: &str) -> LoadResult<Mesh> {
        Mesh::parse(Cursor::new(source), grey(), Vec3::ZERO)
    }

    #[test]
    fn test_single_face_matches_direct_triangle() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let direct = Triangle::from_vertices(Vec3::ZERO, Vec3::X, Vec3::Y, grey());

        assert_eq!(mesh.triangle_count(), 1);
        let tri = &mesh.triangles()[0];
        assert_eq!(tri.vertices(), direct.vertices());
        assert_eq!(tri.edges(), direct.edges());
        assert_eq!(tri.normal(), direct.normal());
        assert_eq!(mesh.bounding_box(), direct.bounding_box());
    }

    #[test]
    fn test_out_of_range_face_is_rejected() {
        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").err().unwrap();

        match err {
            LoadError::FaceIndexOutOfRange {
                line,
                index,
                vertex_count,
            } => {
                assert_eq!(line, 4);
                assert_eq!(index, 4);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_forward_and_zero_indices_are_rejected() {
        // Vertex 3 is only defined after the face
        let err = parse("v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n").err().unwrap();
        assert!(matches!(err, LoadError::FaceIndexOutOfRange { index: 3, .. }));

        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n").err().unwrap();
        assert!(matches!(err, LoadError::FaceIndexOutOfRange { index: 0, .. }));

        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1 1 2\n").err().unwrap();
        assert!(matches!(err, LoadError::FaceIndexOutOfRange { index: -1, .. }));
    }

    #[test]
    fn test_sub_indices_are_ignored() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3//1\n";
        let mesh = parse(source).unwrap();

        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangles()[0].vertices(), [Vec3::ZERO, Vec3::X, Vec3::Y]);
    }

    #[test]
    fn test_unrecognized_records_are_skipped() {
        let source = "# a comment\n\no thing\ns off\nusemtl red\nv 0 0 0\nv 1 0 0\nv 0 1 0\n\nf 1 2 3\n";
        let mesh = parse(source).unwrap();

        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_center_offsets_vertices() {
        let mesh = Mesh::parse(
            Cursor::new("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"),
            grey(),
            Vec3::new(10.0, -2.0, 3.0),
        )
        .unwrap();

        let [a, b, c] = mesh.triangles()[0].vertices();
        assert_eq!(a, Vec3::new(10.0, -2.0, 3.0));
        assert_eq!(b, Vec3::new(11.0, -2.0, 3.0));
        assert_eq!(c, Vec3::new(10.0, -1.0, 3.0));
    }

    #[test]
    fn test_polygon_is_fan_triangulated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        let first = mesh.triangles()[0].vertices();
        let second = mesh.triangles()[1].vertices();
        assert_eq!(first, [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
        assert_eq!(second, [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]);
    }

    #[test]
    fn test_vertex_count_is_reported() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 5 5 5\nf 1 2 3 4\n";
        let (mesh, vertex_count) =
            Mesh::parse_records(Cursor::new(source), grey(), Vec3::ZERO).unwrap();

        // Unreferenced vertices still count
        assert_eq!(vertex_count, 5);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_malformed_records_are_parse_errors() {
        let err = parse("v 0 0\n").err().unwrap();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));

        let err = parse("v 0 zero 0\n").err().unwrap();
        assert!(matches!(err, LoadError::Parse { line: 1, .. }));

        let err = parse("v 0 0 0\nv 1 0 0\nf 1 2\n").err().unwrap();
        assert!(matches!(err, LoadError::Parse { line: 3, .. }));

        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 two 3\n").err().unwrap();
        assert!(matches!(err, LoadError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Mesh::load("/definitely/not/here.obj", grey(), Vec3::ZERO)
            .err()
            .unwrap();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("here.obj"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("ferris_mesh_{}.obj", std::process::id()));
        std::fs::write(&path, "v 0 0 0\nv 2 0 0\nv 0 2 0\nv 2 2 0\nf 1 2 3\nf 2 4 3\n").unwrap();

        let mesh = Mesh::load(&path, grey(), Vec3::ZERO);
        std::fs::remove_file(&path).ok();
        let mesh = mesh.unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.x, Interval::new(0.0, 2.0));
        assert_eq!(bbox.y, Interval::new(0.0, 2.0));
    }

    #[test]
    fn test_mesh_hit_returns_nearest_face() {
        // Two stacked faces, the far one listed first
        let source = "v 0 0 -1\nv 1 0 -1\nv 0 1 -1\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 1 2 3\nf 4 5 6\n";
        let mesh = parse(source).unwrap();
        let ray = Ray::new_simple(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));

        let rec = mesh.hit(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();
        assert!((rec.t - 4.0).abs() < 1e-5);

        // Outside the bounding box entirely
        let ray = Ray::new_simple(Vec3::new(3.0, 3.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(mesh.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none());
    }
}
