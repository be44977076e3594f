use crate::graph::TextureId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use vitrine_common::Color;

/// Shadow parameters carried on shadow-casting lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub cast: bool,
    pub map_size: u32,
    pub bias: f32,
    pub radius: f32,
    pub focus: f32,
    pub near: f32,
    pub far: f32,
    /// Orthographic extent for directional lights: left, right, top, bottom.
    pub extent: [f32; 4],
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            cast: false,
            map_size: 512,
            bias: 0.0,
            radius: 1.0,
            focus: 1.0,
            near: 0.5,
            far: 500.0,
            extent: [-5.0, 5.0, 5.0, -5.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Sky color from above (`Light::color`), ground color from below.
    Hemisphere { ground: Color },
    /// Parallel rays from the node position toward `target`.
    Directional { target: Vec3, shadow: Shadow },
    /// `distance == 0` means no cutoff.
    Point { distance: f32, decay: f32 },
    Spot {
        target: Vec3,
        distance: f32,
        angle: f32,
        penumbra: f32,
        decay: f32,
        shadow: Shadow,
        /// Projected texture. Carried for hosts; not rasterized.
        map: Option<TextureId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    pub fn ambient(color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
            kind: LightKind::Ambient,
        }
    }

    pub fn hemisphere(sky: impl Into<Color>, ground: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: sky.into(),
            intensity,
            kind: LightKind::Hemisphere {
                ground: ground.into(),
            },
        }
    }

    pub fn directional(color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
            kind: LightKind::Directional {
                target: Vec3::ZERO,
                shadow: Shadow::default(),
            },
        }
    }

    pub fn point(color: impl Into<Color>, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
            kind: LightKind::Point { distance, decay },
        }
    }

    pub fn spot(color: impl Into<Color>, intensity: f32) -> Self {
        Self {
            color: color.into(),
            intensity,
            kind: LightKind::Spot {
                target: Vec3::ZERO,
                distance: 0.0,
                angle: std::f32::consts::FRAC_PI_3,
                penumbra: 0.0,
                decay: 2.0,
                shadow: Shadow::default(),
                map: None,
            },
        }
    }

    pub fn shadow_mut(&mut self) -> Option<&mut Shadow> {
        match &mut self.kind {
            LightKind::Directional { shadow, .. } | LightKind::Spot { shadow, .. } => Some(shadow),
            _ => None,
        }
    }

    pub fn casts_shadow(&self) -> bool {
        match self.kind {
            LightKind::Directional { shadow, .. } | LightKind::Spot { shadow, .. } => shadow.cast,
            _ => false,
        }
    }
}

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// How linear scene radiance maps to display values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ToneMapping {
    #[default]
    None,
    /// ACES filmic curve after multiplying by `exposure`.
    Aces { exposure: f32 },
}

impl ToneMapping {
    pub fn apply(self, linear: [f32; 3]) -> [f32; 3] {
        match self {
            ToneMapping::None => linear,
            ToneMapping::Aces { exposure } => linear.map(|c| aces(c * exposure)),
        }
    }
}

// Narkowicz fit of the ACES reference curve.
fn aces(x: f32) -> f32 {
    let (a, b, c, d, e) = (2.51, 0.03, 2.43, 0.59, 0.14);
    ((x * (a * x + b)) / (x * (c * x + d) + e)).clamp(0.0, 1.0)
}
