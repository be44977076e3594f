use crate::graph::TextureId;
use serde::{Deserialize, Serialize};
use vitrine_common::Color;

/// Lighting model a surface is shaded with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shading {
    /// Unlit flat color.
    Basic,
    /// Diffuse only.
    Lambert,
    /// Diffuse plus Blinn-Phong specular.
    Phong { shininess: f32 },
    /// Roughness/metalness approximation.
    Standard { roughness: f32, metalness: f32 },
    /// Color looked up from a matcap texture by view-space normal.
    Matcap,
    /// Camera-facing point sprites, `size` in world units.
    Points { size: f32 },
    /// Unlit line segments.
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Color,
    /// Base color texture.
    pub map: Option<TextureId>,
    /// Matcap lookup texture, only read by [`Shading::Matcap`].
    pub matcap: Option<TextureId>,
    pub side: Side,
    pub vertex_colors: bool,
    pub depth_write: bool,
}

impl Material {
    fn with_shading(shading: Shading, color: Color) -> Self {
        Self {
            shading,
            color,
            map: None,
            matcap: None,
            side: Side::Front,
            vertex_colors: false,
            depth_write: true,
        }
    }

    pub fn basic(color: impl Into<Color>) -> Self {
        Self::with_shading(Shading::Basic, color.into())
    }

    pub fn lambert(color: impl Into<Color>) -> Self {
        Self::with_shading(Shading::Lambert, color.into())
    }

    pub fn phong(color: impl Into<Color>) -> Self {
        Self::with_shading(Shading::Phong { shininess: 30.0 }, color.into())
    }

    pub fn standard(color: impl Into<Color>) -> Self {
        Self::with_shading(
            Shading::Standard {
                roughness: 1.0,
                metalness: 0.0,
            },
            color.into(),
        )
    }

    pub fn matcap(matcap: TextureId) -> Self {
        let mut m = Self::with_shading(Shading::Matcap, Color::WHITE);
        m.matcap = Some(matcap);
        m
    }

    pub fn points(size: f32) -> Self {
        Self::with_shading(Shading::Points { size }, Color::WHITE)
    }

    pub fn line() -> Self {
        let mut m = Self::with_shading(Shading::Line, Color::WHITE);
        m.vertex_colors = true;
        m
    }

    pub fn with_map(mut self, map: TextureId) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        if let Shading::Standard { metalness, .. } = self.shading {
            self.shading = Shading::Standard {
                roughness,
                metalness,
            };
        }
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_vertex_colors(mut self) -> Self {
        self.vertex_colors = true;
        self
    }

    pub fn is_lit(&self) -> bool {
        matches!(
            self.shading,
            Shading::Lambert | Shading::Phong { .. } | Shading::Standard { .. }
        )
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard(Color::WHITE)
    }
}

/// Decoded RGBA8 pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A texture slot. Pixels may arrive after the slot is created; `revision`
/// changes every time they do.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    image: Option<TextureImage>,
    revision: u64,
}

impl Texture {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
            revision: 0,
        }
    }

    pub fn with_image(name: impl Into<String>, image: TextureImage) -> Self {
        Self {
            name: name.into(),
            image: Some(image),
            revision: 1,
        }
    }

    pub fn image(&self) -> Option<&TextureImage> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: TextureImage) {
        self.image = Some(image);
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
