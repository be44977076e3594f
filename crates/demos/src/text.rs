use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use vitrine_assets::{Font, TextOptions, text_geometry};
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Geometry, Light, Material, Node, Scene, ToneMapping, helpers};

const FONT: &str = "fonts/SCFwxz_Regular.json";
const MATCAP: &str = "textures/matcaps/2.png";

/// The Lantingji Xu, one line per row of the original scroll.
const CONTENT: &str = "
永和九年岁在癸丑暮春之初会于
会稽山阴之兰亭修禊事也群贤毕
至少长咸集此地有崇山峻岭茂林
修竹又有清流激湍映带左右引以
为流觞曲水列坐其次虽无丝竹管
弦之盛一觞一咏亦足以畅叙幽情
是日也天朗气清惠风和畅仰观宇
宙之大俯察品类之盛所以游目骋
怀足以极视听之娱信可乐也夫人
之相与俯仰一世或取诸怀抱晤言
一室之内或因寄所托放浪形骸之
外虽取舍万殊静躁不同当其欣于
所遇暂得于己快然自足不知老之
将至及其所之既倦情随事迁感慨
系之矣向之所欣俯仰之间已为陈
迹犹不能不以之兴怀况修短随化
终期于尽古人云死生亦大矣岂不
痛哉每览昔人兴感之由若合一契
未尝不临文嗟悼不能喻之于怀固
知一死生为虚诞齐彭殇为妄作后
之视今亦犹今之视昔悲夫故列叙
时人录其所述虽世殊事异所以兴
怀其致一也后之览者亦将有感于
斯文
";

const OPTIONS: TextOptions = TextOptions {
    size: 20.0,
    depth: 5.0,
    curve_segments: 12,
};

/// Build the centered text solid. Runs on a loader worker.
fn centered_text(font: &Font, text: &str) -> Result<Geometry, vitrine_assets::AssetError> {
    let mut geometry = text_geometry(font, text, &OPTIONS)?;
    geometry.data.center();
    Ok(geometry)
}

/// Extruded calligraphy lit by a randomly tinted point light.
pub struct TextDemo;

impl Demo for TextDemo {
    fn name(&self) -> &'static str {
        "text"
    }

    fn title(&self) -> &'static str {
        "3D text"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        scene.tone_mapping = ToneMapping::Aces { exposure: 1.0 };

        let axes = scene.add_geometry(helpers::axes(1000.0));
        scene.add(Node::lines("axesHelper", axes).hidden());

        scene.add(
            Node::light("directional", Light::directional(Color::WHITE, 0.4))
                .with_position(Vec3::Z),
        );
        let tint = Color::from_hsl(rand::random::<f32>(), 1.0, 0.5);
        scene.add(
            Node::light("point", Light::point(tint, 4.5, 0.0, 0.0))
                .with_position(Vec3::new(0.0, 100.0, 90.0)),
        );

        let matcap = ctx.loader.load_texture(&mut scene, MATCAP);
        ctx.loader.load(
            FONT,
            |path| centered_text(&Font::read(path)?, CONTENT),
            move |scene: &mut Scene, geometry: Geometry| {
                let geometry = scene.add_geometry(geometry);
                scene.add(
                    Node::mesh("text", geometry, Material::matcap(matcap)).with_shadows(true, true),
                );
            },
        );

        let camera = PerspectiveCamera::new(40.0, ctx.viewport.aspect(), 0.1, 10000.0)
            .with_position(Vec3::new(300.0, 0.0, 1200.0));
        let controller = OrbitController::new().with_polar_limits(0.0, FRAC_PI_2);
        Ok(DemoSetup::new(scene, camera).with_controller(controller))
    }
}
