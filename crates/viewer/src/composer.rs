use crate::config::{ConfigError, PLANE_COUNT, RoomSpec, ViewerConfig};
use glam::{Quat, UVec2, Vec3};
use roomview_assets::{AssetLoader, AssetSource, LoadOutcome, LoadTicket};
use roomview_common::{EntityId, Transform};
use roomview_input::{Action, OrbitControl};
use roomview_render::{RenderSurface, Renderer};
use roomview_scene::{
    AmbientLight, DirectionalLight, Light, Material, MeshData, Node, NodeKind, PerspectiveCamera,
    Scene, SceneEvent, ShadowCamera, ShadowConfig, Side,
};
use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const CAMERA_FOV: f32 = 75.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(5.0, 5.0, 0.0);
pub const DAMPING_FACTOR: f32 = 0.05;

const SUN_DISTANCE: f32 = 25.0;
const SHADOW_MAP_SIZE: u32 = 2048;
const SHADOW_BIAS: f32 = 0.00005;
const SHADOW_EXTENT: f32 = 12.5;
const SHADOW_HELPER_COLOR: [f32; 4] = [1.0, 0.8, 0.0, 1.0];
const AMBIENT_INTENSITY: f32 = 0.8;

const PLANE_SIZE: f32 = 4.6;
const PLANE_OFFSET: Vec3 = Vec3::new(0.0, 2.5, 2.5);
const FLOOR_SIZE: f32 = 25.0;

/// Progress of the room loads issued at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl LoadStatus {
    /// Every issued load has reported, successfully or not.
    pub fn is_complete(&self) -> bool {
        self.loaded + self.failed == self.requested
    }
}

/// Builds the see-through room scene and drives it frame by frame.
///
/// Four invisible planes stamp stencil refs 1 to 4 around the origin. Each
/// room only draws where the stencil matches its ref, the frame draws
/// everywhere and the floor only where no plane was hit. Looking through a
/// plane therefore shows the room behind it and nothing else.
///
/// `advance` and `resize` are safe at any time, including before the rooms
/// have finished loading.
pub struct SceneComposer<R: Renderer, S: RenderSurface> {
    renderer: R,
    surface: S,
    scene: Scene,
    camera: PerspectiveCamera,
    camera_node: EntityId,
    controls: OrbitControl,
    loader: AssetLoader,
    pending: BTreeMap<LoadTicket, RoomSpec>,
    status: LoadStatus,
}

impl<R: Renderer, S: RenderSurface> SceneComposer<R, S> {
    /// Assemble the scene, size the renderer to the surface and start loading
    /// every configured room.
    pub fn initialize(
        mut renderer: R,
        surface: S,
        source: Arc<dyn AssetSource>,
        config: &ViewerConfig,
    ) -> Result<Self, ConfigError> {
        let _span = tracing::info_span!("initialize").entered();
        config.validate()?;

        let mut scene = Scene::new();

        let (width, height) = surface.client_size();
        renderer.set_size(width, height);
        let mut camera = PerspectiveCamera::new(CAMERA_FOV, width as f32 / height as f32);
        camera.position = CAMERA_POSITION;
        let camera_node = scene.add(
            Node::new(NodeKind::Camera)
                .named("camera")
                .with_transform(camera.transform()),
        );

        let mut controls = OrbitControl::new();
        controls.enable_damping = true;
        controls.damping_factor = DAMPING_FACTOR;
        controls.target = Vec3::ZERO;
        camera.look_at(controls.target);
        scene.set_transform(camera_node, camera.transform());

        add_lights(&mut scene, config.shadow_helper);
        add_stencil_planes(&mut scene);

        let mut loader = AssetLoader::new(source);
        let mut pending = BTreeMap::new();
        for room in &config.rooms {
            let ticket = loader.request(room.path.clone());
            tracing::debug!(%ticket, room = %room.name, stencil_ref = ?room.stencil_ref, "room requested");
            pending.insert(ticket, room.clone());
        }

        add_floor(&mut scene);

        let status = LoadStatus {
            requested: pending.len(),
            ..LoadStatus::default()
        };
        tracing::info!(
            width,
            height,
            nodes = scene.len(),
            rooms = status.requested,
            "scene composed"
        );

        Ok(Self {
            renderer,
            surface,
            scene,
            camera,
            camera_node,
            controls,
            loader,
            pending,
            status,
        })
    }

    /// Per-frame hook: integrate finished loads, tick the orbit control, render.
    pub fn advance(&mut self, dt: f32) -> R::Output {
        while let Some(outcome) = self.loader.try_next() {
            self.integrate(outcome);
        }

        if self.controls.update(&mut self.camera) {
            self.scene
                .set_transform(self.camera_node, self.camera.transform());
        }
        let changes = self.scene.drain_events();
        let added = changes
            .iter()
            .filter(|e| matches!(e, SceneEvent::Added { .. }))
            .count();
        if added > 0 {
            tracing::debug!(added, total = self.scene.len(), "scene grew");
        }
        tracing::trace!(dt, changes = changes.len(), "frame");
        self.renderer.render(&self.scene, &self.camera)
    }

    /// Resize hook: follow the surface's client size, then render at once.
    ///
    /// The size is used as-is, without device-pixel-ratio scaling. A zero
    /// height leaves the camera with a non-finite aspect.
    pub fn resize(&mut self) -> R::Output {
        let (width, height) = self.surface.client_size();
        self.renderer.set_size(width, height);
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        tracing::debug!(width, height, aspect = self.camera.aspect, "resized");
        self.renderer.render(&self.scene, &self.camera)
    }

    /// Feed a pointer action to the orbit control. It takes effect on the
    /// next `advance`.
    pub fn handle_action(&mut self, action: Action) {
        self.controls.apply(action, &self.camera);
    }

    /// Block until every issued load has reported or `timeout` passes.
    /// Returns whether all loads have reported.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.status.is_complete() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.loader.next_timeout(remaining) {
                Some(outcome) => self.integrate(outcome),
                None => break,
            }
        }
        self.status.is_complete()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControl {
        &self.controls
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn load_status(&self) -> LoadStatus {
        self.status
    }

    fn integrate(&mut self, outcome: LoadOutcome) {
        let Some(room) = self.pending.remove(&outcome.ticket) else {
            tracing::warn!(ticket = %outcome.ticket, "load outcome for unknown ticket");
            return;
        };
        let _span = tracing::info_span!("integrate", room = %room.name).entered();

        let mut imported = match outcome.result {
            Ok(imported) => imported,
            Err(e) => {
                self.status.failed += 1;
                tracing::error!(path = %outcome.path, "room failed to load: {e}");
                return;
            }
        };

        imported.visit_materials_mut(|material| room.apply_to(material));
        let primitives = imported.primitive_count();
        match imported.attach_to(&mut self.scene, room.name.clone()) {
            Ok(root) => {
                self.status.loaded += 1;
                tracing::info!(%root, path = %outcome.path, primitives, "room attached");
            }
            Err(e) => {
                self.status.failed += 1;
                tracing::error!(path = %outcome.path, "room failed to attach: {e}");
            }
        }
    }
}

fn add_lights(scene: &mut Scene, shadow_helper: bool) {
    let sun_position = Vec3::splat(0.5).normalize() * SUN_DISTANCE;
    let sun = DirectionalLight {
        cast_shadow: true,
        shadow: ShadowConfig {
            map_size: UVec2::splat(SHADOW_MAP_SIZE),
            bias: SHADOW_BIAS,
            camera: ShadowCamera::symmetric(SHADOW_EXTENT),
        },
        ..DirectionalLight::default()
    };
    scene.add(
        Node::new(NodeKind::Light(Light::Directional(sun)))
            .named("sun")
            .with_transform(Transform::from_position(sun_position)),
    );

    if shadow_helper {
        scene.add(
            Node::new(NodeKind::Helper {
                lines: sun.shadow_frustum_lines(sun_position),
                color: SHADOW_HELPER_COLOR,
            })
            .named("sun_shadow_helper"),
        );
    }

    scene.add(
        Node::new(NodeKind::Light(Light::Ambient(AmbientLight {
            color: [1.0, 1.0, 1.0],
            intensity: AMBIENT_INTENSITY,
        })))
        .named("ambient"),
    );
}

/// One shared quad, four rotated instances, each with its own material copy.
fn add_stencil_planes(scene: &mut Scene) {
    let mesh = scene.add_mesh(MeshData::plane(PLANE_SIZE, PLANE_SIZE).translated(PLANE_OFFSET));
    let template = Material::stencil_writer(0);

    for i in 1..=PLANE_COUNT {
        let mut material = template.clone();
        if let Some(stencil) = material.stencil.as_mut() {
            stencil.reference = i;
        }
        material.name = format!("stencil_writer_{i}");

        let rotation = Quat::from_rotation_y(f32::from(i) * FRAC_PI_2);
        let id = scene.add(
            Node::new(NodeKind::Mesh { mesh, material })
                .named(format!("stencil_plane_{i}"))
                .with_transform(Transform::from_rotation(rotation)),
        );
        tracing::debug!(%id, reference = i, "stencil plane added");
    }
}

fn add_floor(scene: &mut Scene) {
    let mesh = scene.add_mesh(MeshData::plane(FLOOR_SIZE, FLOOR_SIZE).rotated_x(-FRAC_PI_2));
    let material = Material {
        name: "floor".into(),
        ..Material::default()
    }
    .with_side(Side::Double)
    .with_stencil_equal(0);
    scene.add(Node::new(NodeKind::Mesh { mesh, material }).named("floor"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomview_assets::{AssetError, MemorySource, fixtures};
    use roomview_render::{DebugTextRenderer, FixedSurface};
    use roomview_scene::{StencilFunc, StencilOp};
    use std::cell::Cell;
    use std::rc::Rc;

    const WAIT: Duration = Duration::from_secs(10);
    const ROOMS: [&str; 4] = ["frame", "roomA", "roomB", "roomC"];

    type TestComposer<S> = SceneComposer<DebugTextRenderer, S>;

    fn compose(source: impl AssetSource + 'static) -> TestComposer<FixedSurface> {
        SceneComposer::initialize(
            DebugTextRenderer::new(),
            FixedSurface::new(800, 600),
            Arc::new(source),
            &ViewerConfig::default(),
        )
        .unwrap()
    }

    fn loaded() -> TestComposer<FixedSurface> {
        let mut composer = compose(fixtures::room_source(&ROOMS));
        assert!(composer.wait_for_loads(WAIT));
        composer
    }

    /// Blocks every fetch until the sender side is dropped.
    struct GatedSource {
        inner: MemorySource,
        gate: crossbeam_channel::Receiver<()>,
    }

    impl AssetSource for GatedSource {
        fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            let _ = self.gate.recv();
            self.inner.fetch(path)
        }
    }

    #[derive(Clone)]
    struct SharedSurface(Rc<Cell<(u32, u32)>>);

    impl RenderSurface for SharedSurface {
        fn client_size(&self) -> (u32, u32) {
            self.0.get()
        }
    }

    fn root_named<'a>(scene: &'a Scene, name: &str) -> &'a Node {
        let id = scene
            .roots()
            .iter()
            .copied()
            .find(|id| scene.get(*id).and_then(|n| n.name.as_deref()) == Some(name))
            .unwrap();
        scene.get(id).unwrap()
    }

    fn room_materials<'a>(scene: &'a Scene, name: &str) -> Vec<&'a Material> {
        let root = scene.find_by_name(name).unwrap();
        scene
            .descendants(root)
            .into_iter()
            .filter_map(|id| scene.get(id).and_then(|n| n.material()))
            .collect()
    }

    #[test]
    fn planes_have_unique_refs_and_quarter_turns() {
        let composer = compose(MemorySource::new());
        let scene = composer.scene();
        let mut refs = Vec::new();
        for i in 1..=4u8 {
            let plane = root_named(scene, &format!("stencil_plane_{i}"));
            let material = plane.material().unwrap();
            let stencil = material.stencil.unwrap();
            assert_eq!(stencil.func, StencilFunc::Always);
            assert_eq!(stencil.z_pass, StencilOp::Replace);
            assert!(!material.color_write);
            assert!(!material.depth_write);
            refs.push(stencil.reference);

            let expected = Quat::from_rotation_y(f32::from(i) * FRAC_PI_2);
            assert!(plane.transform.rotation.abs_diff_eq(expected, 1e-6));
        }
        assert_eq!(refs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn planes_share_one_quad() {
        let composer = compose(MemorySource::new());
        let scene = composer.scene();
        let meshes: Vec<_> = (1..=4)
            .map(|i| match &root_named(scene, &format!("stencil_plane_{i}")).kind {
                NodeKind::Mesh { mesh, .. } => *mesh,
                _ => unreachable!(),
            })
            .collect();
        assert!(meshes.iter().all(|m| *m == meshes[0]));
        let quad = scene.mesh(meshes[0]).unwrap();
        let corner = Vec3::from(quad.positions[0]);
        assert!(corner.distance(Vec3::new(-2.3, 0.2, 2.5)) < 1e-5);
    }

    #[test]
    fn aspect_after_initialize_and_resize() {
        let mut composer = compose(MemorySource::new());
        assert!((composer.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(composer.renderer().size(), (800, 600));
        assert!(composer.advance(0.0).contains("Frame 1 (800x600)"));
        composer.resize();
        assert!((composer.camera().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(composer.renderer().size(), (800, 600));
    }

    #[test]
    fn resize_is_idempotent() {
        let size = Rc::new(Cell::new((1024, 512)));
        let mut composer = SceneComposer::initialize(
            DebugTextRenderer::new(),
            SharedSurface(Rc::clone(&size)),
            Arc::new(MemorySource::new()),
            &ViewerConfig::default(),
        )
        .unwrap();

        size.set((800, 600));
        composer.resize();
        let first = (composer.camera().aspect, composer.renderer().size());
        let projection = composer.camera().projection_matrix();
        composer.resize();
        composer.resize();
        assert_eq!((composer.camera().aspect, composer.renderer().size()), first);
        assert_eq!(composer.camera().projection_matrix(), projection);
        assert_eq!(first.1, (800, 600));
    }

    #[test]
    fn zero_height_is_not_guarded() {
        let mut composer = SceneComposer::initialize(
            DebugTextRenderer::new(),
            FixedSurface::new(800, 0),
            Arc::new(MemorySource::new()),
            &ViewerConfig::default(),
        )
        .unwrap();
        assert!(!composer.camera().aspect.is_finite());
        composer.resize();
        assert!(!composer.camera().aspect.is_finite());
    }

    #[test]
    fn advance_before_loads_resolve() {
        let (release, gate) = crossbeam_channel::bounded::<()>(0);
        let source = GatedSource {
            inner: fixtures::room_source(&ROOMS),
            gate,
        };
        let mut composer = compose(source);

        let frame = composer.advance(0.016);
        assert!(frame.contains("Frame 1"));
        assert_eq!(composer.load_status().loaded, 0);
        // camera, sun, ambient, four planes, floor
        assert_eq!(composer.scene().roots().len(), 8);

        drop(release);
        assert!(composer.wait_for_loads(WAIT));
        composer.advance(0.016);
        assert_eq!(composer.scene().roots().len(), 12);
    }

    #[test]
    fn direct_entries_after_all_loads() {
        let composer = loaded();
        let scene = composer.scene();
        let (mut cameras, mut lights, mut planes, mut rooms, mut floors) = (0, 0, 0, 0, 0);
        for id in scene.roots() {
            let node = scene.get(*id).unwrap();
            match &node.kind {
                NodeKind::Camera => cameras += 1,
                NodeKind::Light(_) => lights += 1,
                NodeKind::Group => rooms += 1,
                NodeKind::Mesh { material, .. } if material.stencil_write_ref().is_some() => {
                    planes += 1
                }
                NodeKind::Mesh { .. } => floors += 1,
                NodeKind::Helper { .. } => panic!("helper is off by default"),
            }
        }
        assert_eq!((cameras, lights, planes, rooms, floors), (1, 2, 4, 4, 1));
        assert_eq!(
            composer.load_status(),
            LoadStatus {
                requested: 4,
                loaded: 4,
                failed: 0
            }
        );
    }

    #[test]
    fn stencil_refs_per_room() {
        let composer = loaded();
        let scene = composer.scene();

        let floor = root_named(scene, "floor").material().unwrap();
        assert_eq!(floor.stencil_test_ref(), Some(0));
        assert_eq!(floor.side, Side::Double);

        for (name, expected) in [("roomA", 1), ("roomB", 4), ("roomC", 2)] {
            let materials = room_materials(scene, name);
            assert!(!materials.is_empty());
            for material in materials {
                assert_eq!(material.stencil_test_ref(), Some(expected), "{name}");
                assert_eq!(material.side, Side::Front);
            }
        }

        for material in room_materials(scene, "frame") {
            assert!(material.stencil.is_none());
            // The fixture is double-sided; the room layout forces front faces.
            assert_eq!(material.side, Side::Front);
        }
    }

    #[test]
    fn failed_load_leaves_scene_without_room() {
        let mut composer = compose(fixtures::room_source(&["frame", "roomA", "roomB"]));
        assert!(composer.wait_for_loads(WAIT));
        let status = composer.load_status();
        assert_eq!((status.loaded, status.failed), (3, 1));
        assert!(composer.scene().find_by_name("roomC").is_none());
        let frame = composer.advance(0.016);
        assert!(frame.contains("roomA_mesh"));
        assert!(!frame.contains("roomC"));
    }

    #[test]
    fn shadow_helper_is_optional() {
        let config = ViewerConfig {
            shadow_helper: true,
            ..ViewerConfig::default()
        };
        let composer = SceneComposer::initialize(
            DebugTextRenderer::new(),
            FixedSurface::new(800, 600),
            Arc::new(MemorySource::new()),
            &config,
        )
        .unwrap();
        match &root_named(composer.scene(), "sun_shadow_helper").kind {
            NodeKind::Helper { lines, .. } => assert_eq!(lines.len(), 12),
            other => panic!("unexpected {}", other.label()),
        }
    }

    #[test]
    fn sun_and_ambient_settings() {
        let composer = compose(MemorySource::new());
        let scene = composer.scene();
        let sun = root_named(scene, "sun");
        let NodeKind::Light(Light::Directional(light)) = &sun.kind else {
            panic!("sun is not a directional light");
        };
        assert!(light.cast_shadow);
        assert_eq!(light.shadow.map_size, UVec2::splat(2048));
        assert_eq!(light.shadow.bias, 0.00005);
        assert_eq!(light.shadow.camera.left, -12.5);
        assert_eq!(light.shadow.camera.top, 12.5);
        assert!((sun.transform.position.length() - 25.0).abs() < 1e-4);

        let NodeKind::Light(Light::Ambient(ambient)) = &root_named(scene, "ambient").kind else {
            panic!("ambient is not an ambient light");
        };
        assert_eq!(ambient.color, [1.0, 1.0, 1.0]);
        assert_eq!(ambient.intensity, 0.8);
    }

    #[test]
    fn camera_and_controls_start_state() {
        let composer = compose(MemorySource::new());
        assert_eq!(composer.camera().position, CAMERA_POSITION);
        assert_eq!(composer.camera().fov_degrees, 75.0);
        assert!(composer.controls().enable_damping);
        assert_eq!(composer.controls().damping_factor, 0.05);
        assert_eq!(composer.controls().target, Vec3::ZERO);
    }

    #[test]
    fn orbit_input_moves_camera_over_frames() {
        let mut composer = compose(MemorySource::new());
        composer.advance(0.016);
        let start = composer.camera().position;
        composer.handle_action(Action::Orbit { dx: 0.1, dy: 0.0 });
        composer.advance(0.016);
        let after_one = composer.camera().position;
        assert!(after_one.distance(start) > 1e-4);
        composer.advance(0.016);
        assert!(composer.camera().position.distance(after_one) > 1e-5);
        // Orbiting keeps the distance to the target.
        assert!((composer.camera().position.length() - start.length()).abs() < 1e-3);

        let camera_node = composer.scene().find_by_name("camera").unwrap();
        let node = composer.scene().get(camera_node).unwrap();
        assert_eq!(node.transform.position, composer.camera().position);
        assert!(composer.scene().events().is_empty());
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let config = ViewerConfig {
            rooms: vec![RoomSpec::new("a", Some(9))],
            ..ViewerConfig::default()
        };
        let result = SceneComposer::initialize(
            DebugTextRenderer::new(),
            FixedSurface::new(800, 600),
            Arc::new(MemorySource::new()),
            &config,
        );
        assert!(matches!(result, Err(ConfigError::UnwrittenRef { .. })));
    }
}
