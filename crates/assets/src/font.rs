//! Typeface fonts: the JSON glyph-outline format produced by facetype.js.
//!
//! Each glyph carries an advance (`ha`) and an outline string `o` of
//! `m x y`, `l x y`, `q x y cx cy` and `b x y c1x c1y c2x c2y` commands in
//! font units. Quadratic and cubic commands list the end point first.

use crate::AssetError;
use glam::Vec2;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    pub ha: f32,
    #[serde(default)]
    pub o: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "xMin", default)]
    pub x_min: f32,
    #[serde(rename = "yMin")]
    pub y_min: f32,
    #[serde(rename = "xMax", default)]
    pub x_max: f32,
    #[serde(rename = "yMax")]
    pub y_max: f32,
}

/// Raw typeface JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct Typeface {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    pub resolution: f32,
    #[serde(rename = "boundingBox")]
    pub bounding_box: BoundingBox,
    #[serde(rename = "underlineThickness", default)]
    pub underline_thickness: f32,
}

/// A closed outline with the holes cut out of it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub contour: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

#[derive(Debug, Clone)]
pub struct Font {
    face: Typeface,
}

impl Font {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        let face: Typeface = serde_json::from_str(json)?;
        if face.resolution <= 0.0 {
            return Err(AssetError::Font(format!(
                "resolution must be positive, got {}",
                face.resolution
            )));
        }
        Ok(Self { face })
    }

    pub fn read(path: &Path) -> Result<Self, AssetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn family_name(&self) -> &str {
        &self.face.family_name
    }

    pub fn glyph_count(&self) -> usize {
        self.face.glyphs.len()
    }

    /// Distance between baselines at `size`.
    pub fn line_height(&self, size: f32) -> f32 {
        let bb = self.face.bounding_box;
        (bb.y_max - bb.y_min + self.face.underline_thickness) * self.scale(size)
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.face.resolution
    }

    fn glyph(&self, c: char) -> Option<&Glyph> {
        let mut buf = [0u8; 4];
        self.face
            .glyphs
            .get(c.encode_utf8(&mut buf) as &str)
            .or_else(|| self.face.glyphs.get("?"))
    }

    /// Lay out `text` at `size` and flatten every glyph into shapes.
    /// `\n` starts a new line below. Curves become `curve_segments` segments.
    pub fn generate_shapes(&self, text: &str, size: f32, curve_segments: u32) -> Vec<Shape> {
        let scale = self.scale(size);
        let line_height = self.line_height(size);
        let mut offset = Vec2::ZERO;
        let mut shapes = Vec::new();

        for c in text.chars() {
            if c == '\n' {
                offset.x = 0.0;
                offset.y -= line_height;
                continue;
            }
            let Some(glyph) = self.glyph(c) else {
                tracing::warn!(
                    character = %c,
                    font = %self.face.family_name,
                    "glyph missing from font"
                );
                continue;
            };
            let paths = outline_paths(&glyph.o, scale, offset, curve_segments.max(1));
            shapes.extend(paths_to_shapes(paths));
            offset.x += glyph.ha * scale;
        }
        shapes
    }
}

fn outline_paths(outline: &str, scale: f32, offset: Vec2, segments: u32) -> Vec<Vec<Vec2>> {
    let mut tokens = outline.split_whitespace();
    let mut paths: Vec<Vec<Vec2>> = Vec::new();
    let mut current: Vec<Vec2> = Vec::new();

    let point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Option<Vec2> {
        let x: f32 = tokens.next()?.parse().ok()?;
        let y: f32 = tokens.next()?.parse().ok()?;
        Some(Vec2::new(x, y) * scale + offset)
    };

    while let Some(command) = tokens.next() {
        match command {
            "m" => {
                let Some(p) = point(&mut tokens) else { break };
                if current.len() > 1 {
                    paths.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push(p);
            }
            "l" => {
                let Some(p) = point(&mut tokens) else { break };
                current.push(p);
            }
            "q" => {
                let (Some(end), Some(cp)) = (point(&mut tokens), point(&mut tokens)) else {
                    break;
                };
                let Some(&start) = current.last() else { continue };
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(start * u * u + cp * 2.0 * u * t + end * t * t);
                }
            }
            "b" => {
                let (Some(end), Some(c1), Some(c2)) =
                    (point(&mut tokens), point(&mut tokens), point(&mut tokens))
                else {
                    break;
                };
                let Some(&start) = current.last() else { continue };
                for i in 1..=segments {
                    let t = i as f32 / segments as f32;
                    let u = 1.0 - t;
                    current.push(
                        start * u * u * u + c1 * 3.0 * u * u * t + c2 * 3.0 * u * t * t + end * t * t * t,
                    );
                }
            }
            _ => {}
        }
    }
    if current.len() > 1 {
        paths.push(current);
    }

    for path in &mut paths {
        path.dedup_by(|a, b| a.distance_squared(*b) < 1e-12);
        if path.len() > 1 && path[0].distance_squared(path[path.len() - 1]) < 1e-12 {
            path.pop();
        }
    }
    paths.retain(|p| p.len() >= 3);
    paths
}

/// Signed area; positive when counter-clockwise.
pub(crate) fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn contains(polygon: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Clockwise paths are solids, counter-clockwise ones are holes. A hole
/// belongs to the solid containing its first point, else the solid before
/// it. A single path, or a glyph with no clockwise path, is all solids.
fn paths_to_shapes(paths: Vec<Vec<Vec2>>) -> Vec<Shape> {
    if paths.len() == 1 || paths.iter().all(|p| signed_area(p) >= 0.0) {
        return paths
            .into_iter()
            .map(|contour| Shape {
                contour,
                holes: Vec::new(),
            })
            .collect();
    }

    let mut shapes: Vec<Shape> = Vec::new();
    let mut orphans: Vec<(usize, Vec<Vec2>)> = Vec::new();
    for path in paths {
        if signed_area(&path) < 0.0 {
            shapes.push(Shape {
                contour: path,
                holes: Vec::new(),
            });
        } else {
            orphans.push((shapes.len().saturating_sub(1), path));
        }
    }
    for (fallback, hole) in orphans {
        let owner = shapes
            .iter()
            .position(|s| contains(&s.contour, hole[0]))
            .unwrap_or(fallback);
        if let Some(shape) = shapes.get_mut(owner) {
            shape.holes.push(hole);
        }
    }
    shapes
}
