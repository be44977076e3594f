use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Construction parameters a geometry was generated from.
///
/// Kept next to the vertex data so consumers (colliders, inspectors) can read
/// the authored dimensions instead of reverse-engineering them from vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryShape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Plane {
        width: f32,
        height: f32,
    },
    TorusKnot {
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    },
    Points,
    Lines,
    Text,
    Imported,
}

/// Indexed vertex data. `indices` is empty for point and line geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds, `None` when there are no vertices.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p = (Vec3::from_array(*p) + offset).to_array();
        }
    }

    /// Move the bounding-box center to the origin.
    pub fn center(&mut self) {
        if let Some((lo, hi)) = self.bounding_box() {
            self.translate(-(lo + hi) * 0.5);
        }
    }

    pub fn scale(&mut self, factor: Vec3) {
        for p in &mut self.positions {
            *p = (Vec3::from_array(*p) * factor).to_array();
        }
    }

    /// Area-weighted smooth normals from the index buffer.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            // out-of-range triangles contribute nothing
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let [pa, pb, pc] = [pa, pb, pc].map(|p| Vec3::from_array(*p));
            let n = (pc - pb).cross(pa - pb);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }
}

/// A geometry: authored parameters plus generated vertex data.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub shape: GeometryShape,
    pub data: MeshData,
}

impl Geometry {
    pub fn new(shape: GeometryShape, data: MeshData) -> Self {
        Self { shape, data }
    }

    /// Axis-aligned box centered on the origin, 24 vertices with per-face normals.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        // (normal, u axis, v axis) with u x v == normal so faces wind CCW from outside
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut data = MeshData::default();
        for (n, u, v) in faces {
            let base = data.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * half;
                data.positions.push(p.to_array());
                data.normals.push(n.to_array());
                data.uvs.push([(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5]);
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(
            GeometryShape::Box {
                width,
                height,
                depth,
            },
            data,
        )
    }

    /// Single quad in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let data = MeshData {
            positions: vec![[-hw, -hh, 0.0], [hw, -hh, 0.0], [hw, hh, 0.0], [-hw, hh, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            colors: None,
            indices: vec![0, 1, 2, 2, 3, 0],
        };
        Self::new(GeometryShape::Plane { width, height }, data)
    }

    /// (p, q) torus knot swept with a circular tube.
    pub fn torus_knot(
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    ) -> Self {
        let tubular = tubular_segments.max(3);
        let radial = radial_segments.max(3);
        let curve = |u: f32| {
            let ratio = q as f32 / p as f32 * u;
            let cs = ratio.cos();
            Vec3::new(
                radius * (2.0 + cs) * 0.5 * u.cos(),
                radius * (2.0 + cs) * 0.5 * u.sin(),
                radius * ratio.sin() * 0.5,
            )
        };

        let mut data = MeshData::default();
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * p as f32 * TAU;
            let p1 = curve(u);
            let p2 = curve(u + 0.01);
            let t = p2 - p1;
            let n = p2 + p1;
            let b = t.cross(n).normalize();
            let n = b.cross(t).normalize();
            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let cx = -tube * v.cos();
                let cy = tube * v.sin();
                let vertex = p1 + n * cx + b * cy;
                data.positions.push(vertex.to_array());
                data.normals.push((vertex - p1).normalize().to_array());
                data.uvs
                    .push([i as f32 / tubular as f32, j as f32 / radial as f32]);
            }
        }
        let stride = radial + 1;
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = stride * (j - 1) + (i - 1);
                let b = stride * j + (i - 1);
                let c = stride * j + i;
                let d = stride * (j - 1) + i;
                data.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self::new(
            GeometryShape::TorusKnot {
                radius,
                tube,
                tubular_segments: tubular,
                radial_segments: radial,
                p,
                q,
            },
            data,
        )
    }

    /// Point cloud with optional per-point colors.
    pub fn points(positions: Vec<[f32; 3]>, colors: Option<Vec<[f32; 3]>>) -> Self {
        let data = MeshData {
            positions,
            colors,
            ..MeshData::default()
        };
        Self::new(GeometryShape::Points, data)
    }

    /// Line segments: consecutive position pairs.
    pub fn lines(positions: Vec<[f32; 3]>, colors: Vec<[f32; 3]>) -> Self {
        let data = MeshData {
            positions,
            colors: Some(colors),
            ..MeshData::default()
        };
        Self::new(GeometryShape::Lines, data)
    }

    /// Half-extents when this is a box geometry.
    pub fn box_half_extents(&self) -> Option<Vec3> {
        match self.shape {
            GeometryShape::Box {
                width,
                height,
                depth,
            } => Some(Vec3::new(width, height, depth) * 0.5),
            _ => None,
        }
    }
}
