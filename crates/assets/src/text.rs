use crate::font::signed_area;
use crate::{AssetError, Font, Shape};
use glam::Vec2;
use vitrine_scene::{Geometry, GeometryShape, MeshData};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion along +Z.
    pub depth: f32,
    pub curve_segments: u32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 100.0,
            depth: 50.0,
            curve_segments: 12,
        }
    }
}

/// Solid text: glyph shapes extruded from z=0 to z=`depth`.
pub fn text_geometry(font: &Font, text: &str, options: &TextOptions) -> Result<Geometry, AssetError> {
    let shapes = font.generate_shapes(text, options.size, options.curve_segments);
    let data = extrude_shapes(&shapes, options.depth)?;
    tracing::debug!(
        shapes = shapes.len(),
        triangles = data.triangle_count(),
        "built text geometry"
    );
    Ok(Geometry::new(GeometryShape::Text, data))
}

/// Extrude flat shapes into closed solids: a front cap at `depth`, a back
/// cap at 0 and flat-shaded side walls.
pub fn extrude_shapes(shapes: &[Shape], depth: f32) -> Result<MeshData, AssetError> {
    let mut mesh = MeshData::default();
    for shape in shapes {
        // outer ring clockwise, holes counter-clockwise
        let mut contour = shape.contour.clone();
        if signed_area(&contour) > 0.0 {
            contour.reverse();
        }
        let holes: Vec<Vec<Vec2>> = shape
            .holes
            .iter()
            .map(|h| {
                let mut h = h.clone();
                if signed_area(&h) < 0.0 {
                    h.reverse();
                }
                h
            })
            .collect();

        let mut points = contour.clone();
        let mut hole_starts = Vec::with_capacity(holes.len());
        for hole in &holes {
            hole_starts.push(points.len());
            points.extend_from_slice(hole);
        }
        let flat: Vec<f64> = points
            .iter()
            .flat_map(|p| [f64::from(p.x), f64::from(p.y)])
            .collect();
        let triangles = earcutr::earcut(&flat, &hole_starts, 2)
            .map_err(|e| AssetError::Triangulation(format!("{e:?}")))?;

        add_cap(&mut mesh, &points, &triangles, depth, true);
        add_cap(&mut mesh, &points, &triangles, 0.0, false);
        add_walls(&mut mesh, &contour, depth);
        for hole in &holes {
            add_walls(&mut mesh, hole, depth);
        }
    }
    Ok(mesh)
}

fn add_cap(mesh: &mut MeshData, points: &[Vec2], triangles: &[usize], z: f32, front: bool) {
    let base = mesh.positions.len() as u32;
    let normal = if front { [0.0, 0.0, 1.0] } else { [0.0, 0.0, -1.0] };
    for p in points {
        mesh.positions.push([p.x, p.y, z]);
        mesh.normals.push(normal);
        mesh.uvs.push([p.x, p.y]);
    }
    for tri in triangles.chunks_exact(3) {
        let (a, mut b, mut c) = (tri[0], tri[1], tri[2]);
        let ccw = (points[b] - points[a]).perp_dot(points[c] - points[a]) > 0.0;
        if ccw != front {
            std::mem::swap(&mut b, &mut c);
        }
        mesh.indices
            .extend([base + a as u32, base + b as u32, base + c as u32]);
    }
}

fn add_walls(mesh: &mut MeshData, ring: &[Vec2], depth: f32) {
    let mut along = 0.0;
    for i in 0..ring.len() {
        let (p, q) = (ring[i], ring[(i + 1) % ring.len()]);
        let d = q - p;
        let n = Vec2::new(-d.y, d.x).normalize_or_zero();
        let normal = [n.x, n.y, 0.0];
        let base = mesh.positions.len() as u32;
        let next = along + d.length();
        for (v, u, z) in [(p, along, 0.0), (q, next, 0.0), (q, next, depth), (p, along, depth)] {
            mesh.positions.push([v.x, v.y, z]);
            mesh.normals.push(normal);
            mesh.uvs.push([u, z]);
        }
        along = next;
        // a0 b0 b1, a0 b1 a1 with a = bottom, b = top
        mesh.indices
            .extend([base, base + 3, base + 2, base, base + 2, base + 1]);
    }
}
