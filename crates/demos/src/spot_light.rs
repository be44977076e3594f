use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6};
use vitrine_common::{Color, Transform};
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{AnimateCtx, Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{
    Geometry, GeometryId, GeometryShape, Light, LightKind, Material, Node, NodeId, Scene, TextureId,
    ToneMapping, helpers,
};
use vitrine_tools::ControlPanel;

const MODEL: &str = "models/ply/Lucy100k.ply";
const MAPS: [&str; 3] = ["disturb.jpg", "colors.png", "uv_grid_opengl.jpg"];
const ORBIT_RADIUS: f32 = 2.5;
const ORBIT_PERIOD_MS: f64 = 3000.0;
const LIGHT_HEIGHT: f32 = 5.0;

/// Node handles the per-frame callback works on.
struct Rig {
    spot: NodeId,
    cone: NodeId,
    cone_geometry: GeometryId,
    hemisphere: NodeId,
    axes: NodeId,
    maps: Vec<TextureId>,
}

fn controls() -> ControlPanel {
    let mut c = ControlPanel::new();
    c.add_toggle("spotLight", true);
    let mut options = vec!["none"];
    options.extend(MAPS);
    c.add_choice("map", &options, 0);
    c.add_color("color", Color::WHITE);
    c.add_number("intensity", 100.0, 0.0, 500.0, 0.0);
    c.add_number("distance", 0.0, 50.0, 200.0, 0.0);
    c.add_number("angle", FRAC_PI_6, 0.0, FRAC_PI_3, 0.0);
    c.add_number("penumbra", 1.0, 0.0, 1.0, 0.0);
    c.add_number("decay", 2.0, 1.0, 2.0, 0.0);
    c.add_number("focus", 1.0, 0.0, 1.0, 0.0);
    c.add_toggle("shadows", true);
    c.add_toggle("hemisphereLight", true);
    c.add_color("skyColor", Color::WHITE);
    c.add_color("groundColor", 0x8d8d8du32);
    c.add_number("hemisphereIntensity", 0.15, 0.0, 3.0, 0.0);
    c.add_toggle("axesHelper", false);
    c.add_toggle("lightHelper", true);
    c
}

fn cone_for(light: &Light, position: Vec3) -> Option<Geometry> {
    match light.kind {
        LightKind::Spot {
            target,
            distance,
            angle,
            ..
        } => Some(helpers::spot_cone(position, target, angle, distance, light.color)),
        _ => None,
    }
}

impl Rig {
    fn animate(&self, ctx: &mut AnimateCtx<'_>) {
        self.apply_controls(ctx);

        let t = (ctx.now_ms / ORBIT_PERIOD_MS) as f32;
        let position = Vec3::new(t.cos() * ORBIT_RADIUS, LIGHT_HEIGHT, t.sin() * ORBIT_RADIUS);
        let Some(node) = ctx.scene.get_mut(self.spot) else {
            return;
        };
        node.transform.position = position;
        let cone = node.as_light().and_then(|light| cone_for(light, position));
        if let Some(cone) = cone {
            if let Err(e) = ctx.scene.replace_geometry(self.cone_geometry, cone) {
                tracing::warn!(error = %e, "spot helper geometry missing");
            }
        }
    }

    fn apply_controls(&self, ctx: &mut AnimateCtx<'_>) {
        if ctx.changed.is_empty() {
            return;
        }
        let changed: Vec<String> = ctx.changed.to_vec();
        let controls = ctx.controls;
        let number = |key: &str| controls.number(key).unwrap_or(0.0);

        for key in &changed {
            let key = key.as_str();
            let visibility = match key {
                "spotLight" => Some(self.spot),
                "hemisphereLight" => Some(self.hemisphere),
                "axesHelper" => Some(self.axes),
                "lightHelper" => Some(self.cone),
                _ => None,
            };
            if let Some(id) = visibility {
                let show = controls.toggle(key).unwrap_or(false);
                if let Some(node) = ctx.scene.get_mut(id) {
                    node.visible = show;
                }
                continue;
            }

            let target = if matches!(key, "skyColor" | "groundColor" | "hemisphereIntensity") {
                self.hemisphere
            } else {
                self.spot
            };
            let Some(light) = ctx.scene.get_mut(target).and_then(|n| n.as_light_mut()) else {
                continue;
            };
            match (key, &mut light.kind) {
                ("color", _) | ("skyColor", _) => {
                    light.color = controls.color(key).unwrap_or(light.color);
                }
                ("intensity", _) => light.intensity = number(key),
                ("hemisphereIntensity", _) => light.intensity = number(key),
                ("groundColor", LightKind::Hemisphere { ground }) => {
                    *ground = controls.color(key).unwrap_or(*ground);
                }
                ("distance", LightKind::Spot { distance, .. }) => *distance = number(key),
                ("angle", LightKind::Spot { angle, .. }) => *angle = number(key),
                ("penumbra", LightKind::Spot { penumbra, .. }) => *penumbra = number(key),
                ("decay", LightKind::Spot { decay, .. }) => *decay = number(key),
                ("focus", LightKind::Spot { shadow, .. }) => shadow.focus = number(key),
                ("shadows", LightKind::Spot { shadow, .. }) => {
                    shadow.cast = controls.toggle(key).unwrap_or(true);
                }
                ("map", LightKind::Spot { map, .. }) => {
                    let index = controls.choice(key).unwrap_or(0);
                    *map = index.checked_sub(1).and_then(|i| self.maps.get(i).copied());
                }
                _ => {}
            }
        }
    }
}

/// An orbiting spot light over a scanned statue, with a slider for every
/// light parameter.
pub struct SpotLightDemo;

impl Demo for SpotLightDemo {
    fn name(&self) -> &'static str {
        "spot-light"
    }

    fn title(&self) -> &'static str {
        "Spot light"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        scene.tone_mapping = ToneMapping::Aces { exposure: 1.0 };

        let axes = scene.add_geometry(helpers::axes(6.0));
        let axes = scene.add(Node::lines("axesHelper", axes).hidden());

        let hemisphere = scene.add(Node::light(
            "hemisphere",
            Light::hemisphere(Color::WHITE, 0x8d8d8du32, 0.15),
        ));

        let maps: Vec<TextureId> = MAPS
            .iter()
            .map(|name| ctx.loader.load_texture(&mut scene, &format!("textures/{name}")))
            .collect();

        let mut light = Light::spot(Color::WHITE, 100.0);
        if let LightKind::Spot {
            angle,
            penumbra,
            decay,
            distance,
            shadow,
            ..
        } = &mut light.kind
        {
            *angle = FRAC_PI_6;
            *penumbra = 1.0;
            *decay = 2.0;
            *distance = 0.0;
            shadow.cast = true;
            shadow.map_size = 1024;
            shadow.near = 1.0;
            shadow.far = 10.0;
            shadow.focus = 1.0;
        }
        let start = Vec3::new(ORBIT_RADIUS, LIGHT_HEIGHT, ORBIT_RADIUS);
        let cone = cone_for(&light, start).unwrap_or_else(|| helpers::axes(0.0));
        let spot = scene.add(Node::light("spotLight", light).with_position(start));
        let cone_geometry = scene.add_geometry(cone);
        let cone = scene.add(Node::lines("lightHelper", cone_geometry));

        let plane = scene.add_geometry(Geometry::plane(200.0, 200.0));
        let mut ground = Transform::from_position(Vec3::new(0.0, -1.0, 0.0));
        ground.set_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0));
        scene.add(
            Node::mesh("ground", plane, Material::lambert(0xbcbcbcu32))
                .with_transform(ground)
                .with_shadows(false, true),
        );

        ctx.loader.load_ply(MODEL, |scene, mut data| {
            data.scale(Vec3::splat(0.0024));
            data.compute_vertex_normals();
            let geometry = scene.add_geometry(Geometry::new(GeometryShape::Imported, data));
            let mut transform = Transform::from_position(Vec3::new(0.0, 0.8, 0.0));
            transform.set_euler(Vec3::new(0.0, -FRAC_PI_2, 0.0));
            scene.add(
                Node::mesh("lucy", geometry, Material::lambert(Color::WHITE))
                    .with_transform(transform)
                    .with_shadows(true, true),
            );
        });

        let camera = PerspectiveCamera::new(40.0, ctx.viewport.aspect(), 0.1, 100.0)
            .with_position(Vec3::new(7.0, 4.0, 1.0));
        let controller = OrbitController::new()
            .with_target(Vec3::new(0.0, 1.0, 0.0))
            .with_distance_limits(2.0, 10.0)
            .with_polar_limits(0.0, FRAC_PI_2);

        let rig = Rig {
            spot,
            cone,
            cone_geometry,
            hemisphere,
            axes,
            maps,
        };
        Ok(DemoSetup::new(scene, camera)
            .with_controller(controller)
            .with_controls(controls())
            .with_animation(move |ctx| rig.animate(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run;
    use vitrine_render::DebugTextRenderer;

    fn spot_kind(scene: &Scene) -> LightKind {
        let id = scene.find_by_name("spotLight").unwrap();
        scene.get(id).unwrap().as_light().unwrap().kind
    }

    #[test]
    fn light_orbits_at_fixed_height() {
        let mut stage = run(&SpotLightDemo, 0);
        let mut renderer = DebugTextRenderer::new();
        for now in [0.0, 1500.0, 4712.0] {
            stage.on_refresh(now, &mut renderer);
            let scene = &stage.frame_loop().unwrap().scene;
            let id = scene.find_by_name("spotLight").unwrap();
            let p = scene.get(id).unwrap().transform.position;
            assert!((p.with_y(0.0).length() - ORBIT_RADIUS).abs() < 1e-4);
            assert_eq!(p.y, LIGHT_HEIGHT);
            let t = (now / ORBIT_PERIOD_MS) as f32;
            assert!((p.x - t.cos() * ORBIT_RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn helper_cone_follows_the_light() {
        let mut stage = run(&SpotLightDemo, 1);
        let before = {
            let scene = &stage.frame_loop().unwrap().scene;
            let helper = scene.find_by_name("lightHelper").unwrap();
            scene.get(helper).unwrap().geometry().unwrap()
        };
        let revision = |stage: &vitrine_runtime::Stage| {
            stage.frame_loop().unwrap().scene.geometry_revision(before).unwrap()
        };
        let r0 = revision(&stage);
        stage.on_refresh(100.0, &mut DebugTextRenderer::new());
        assert!(revision(&stage) > r0);
    }

    #[test]
    fn sliders_edit_the_spot() {
        let mut stage = run(&SpotLightDemo, 1);
        let frame_loop = stage.frame_loop_mut().unwrap();
        let controls = &mut frame_loop.controls;
        controls.set_number("angle", 0.5).unwrap();
        controls.set_number("distance", 120.0).unwrap();
        controls.set_toggle("shadows", false).unwrap();
        controls.set_choice("map", 2).unwrap();
        controls.set_color("groundColor", 0x112233u32).unwrap();
        controls.set_toggle("spotLight", false).unwrap();
        frame_loop.tick(32.0, &mut DebugTextRenderer::new());

        let scene = &frame_loop.scene;
        match spot_kind(scene) {
            LightKind::Spot {
                angle,
                distance,
                shadow,
                map,
                ..
            } => {
                assert_eq!(angle, 0.5);
                assert_eq!(distance, 120.0);
                assert!(!shadow.cast);
                let texture = scene.texture(map.unwrap()).unwrap();
                assert_eq!(texture.name, "textures/colors.png");
            }
            other => panic!("not a spot light: {other:?}"),
        }
        let hemi = scene.get(scene.find_by_name("hemisphere").unwrap()).unwrap();
        match hemi.as_light().unwrap().kind {
            LightKind::Hemisphere { ground } => assert_eq!(ground.to_hex(), 0x112233),
            other => panic!("not a hemisphere light: {other:?}"),
        }
        // the hidden spot no longer lights the scene
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn untouched_distance_keeps_no_cutoff() {
        let stage = run(&SpotLightDemo, 3);
        let scene = &stage.frame_loop().unwrap().scene;
        assert!(matches!(spot_kind(scene), LightKind::Spot { distance, .. } if distance == 0.0));
    }
}
