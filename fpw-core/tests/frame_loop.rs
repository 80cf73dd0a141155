//! Whole-frame scenarios driven only through the public API.

use std::path::PathBuf;

use approx::assert_relative_eq;
use fpw_core::prelude::*;

const FRAME: f64 = 1.0 / 60.0;

fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> [Triangle; 2] {
    [Triangle::new(a, b, c), Triangle::new(a, c, d)]
}

/// A 40 x 40 floor at y = -1 with a wall across z = -3 facing +Z.
fn store_geometry() -> Vec<Triangle> {
    let mut triangles = Vec::new();
    triangles.extend(quad(
        Vec3::new(-20.0, -1.0, 20.0),
        Vec3::new(20.0, -1.0, 20.0),
        Vec3::new(20.0, -1.0, -20.0),
        Vec3::new(-20.0, -1.0, -20.0),
    ));
    triangles.extend(quad(
        Vec3::new(-5.0, -1.0, -3.0),
        Vec3::new(5.0, -1.0, -3.0),
        Vec3::new(5.0, 4.0, -3.0),
        Vec3::new(-5.0, 4.0, -3.0),
    ));
    triangles
}

fn store_bundle() -> AssetBundle {
    AssetBundle {
        nodes: vec![
            SceneNode::new("Floor", Vec3::new(0.0, -101.0, 0.0)),
            SceneNode::new("Guitar", Vec3::new(1.5, 0.5, 0.0)),
            SceneNode::new("Drum_Kit", Vec3::new(-1.5, 0.5, 0.0)),
            SceneNode::new("Piano", Vec3::new(0.0, 0.5, 1.5)),
            SceneNode::new("Door", Vec3::new(0.0, 1.0, 6.0)),
            SceneNode::new("Poster", Vec3::new(0.0, 2.0, -2.9)),
        ],
        triangles: store_geometry(),
    }
}

fn empty_store() -> Simulation {
    let config = SimConfig::from_yaml("name: test\nspawn:\n  count: 0\n").unwrap();
    Simulation::new(config).unwrap()
}

fn run(sim: &mut Simulation, frames: usize) -> Vec<Notice> {
    let mut notices = Vec::new();
    for _ in 0..frames {
        notices.extend(sim.tick(FRAME).notices);
    }
    notices
}

fn press(sim: &mut Simulation, key: Key) -> Vec<Notice> {
    sim.push_input(InputEvent::KeyDown(key));
    let mut notices = sim.tick(FRAME).notices;
    sim.push_input(InputEvent::KeyUp(key));
    notices.extend(sim.tick(FRAME).notices);
    notices
}

#[test]
fn test_level_load_arrives_through_queue() {
    let mut sim = empty_store();
    sim.push_event(SimEvent::AssetsLoaded(store_bundle()));
    assert_eq!(sim.pending_events(), 1);

    let report = sim.tick(FRAME);

    assert_eq!(sim.pending_events(), 0);
    assert_eq!(
        report.notices,
        vec![Notice::LevelLoaded {
            proxies: 4,
            triangles: 4
        }]
    );
    assert!(sim.door_present());
}

#[test]
fn test_player_lands_on_level_floor() {
    let mut sim = empty_store();
    sim.push_event(SimEvent::AssetsLoaded(store_bundle()));

    run(&mut sim, 60);

    let player = sim.player();
    assert!(player.on_floor);
    assert_relative_eq!(player.capsule.start.y, -0.65, epsilon = 1e-2);
    assert!(player.vel.y.abs() < 1e-6, "still falling: {:?}", player.vel);
}

#[test]
fn test_wall_stops_walking_player() {
    let mut sim = empty_store();
    sim.push_event(SimEvent::AssetsLoaded(store_bundle()));
    run(&mut sim, 30);

    sim.push_input(InputEvent::KeyDown(Key::Forward));
    run(&mut sim, 180);

    let eye = sim.player().eye();
    assert!(eye.z > -3.0 + 0.35 - 0.05, "walked through the wall: {:?}", eye);
    assert!(eye.z < -2.0, "never reached the wall: {:?}", eye);
}

#[test]
fn test_instruments_open_door_and_restart() {
    let mut sim = empty_store();
    sim.push_event(SimEvent::AssetsLoaded(store_bundle()));
    run(&mut sim, 60);
    let report = sim.tick(FRAME);
    assert!(matches!(report.prompt, Some(Prompt::PressToPlay { .. })));

    let goal = sim.config().minigame.goal;
    let mut notices = Vec::new();
    for _ in 0..Instrument::ALL.len() {
        for _ in 0..=goal {
            notices.extend(press(&mut sim, Key::Interact));
        }
    }

    let completed: Vec<_> = notices
        .iter()
        .filter_map(|n| match n {
            Notice::InstrumentCompleted { instrument, .. } => Some(*instrument),
            _ => None,
        })
        .collect();
    assert_eq!(completed.len(), 3, "notices: {:?}", notices);
    for instrument in Instrument::ALL {
        assert!(completed.contains(&instrument));
    }
    assert_eq!(notices.last(), Some(&Notice::DoorOpened));

    assert!(sim.minigame().has_escaped());
    assert!(sim.proxies().iter().all(|p| p.instrument.is_none() || !p.interactive));
    assert_eq!(sim.tick(FRAME).prompt, Some(Prompt::Escaped));

    let notices = press(&mut sim, Key::Restart);
    assert!(notices.contains(&Notice::Restarted));
    assert!(!sim.minigame().has_escaped());
    assert!(sim.proxies().iter().all(|p| p.interactive));
}

#[test]
fn test_missing_door_keeps_player_inside() {
    let mut bundle = store_bundle();
    bundle.nodes.retain(|n| n.name != "Door");

    let mut sim = empty_store();
    sim.push_event(SimEvent::AssetsLoaded(bundle));
    run(&mut sim, 60);

    let goal = sim.config().minigame.goal;
    let mut notices = Vec::new();
    for _ in 0..Instrument::ALL.len() {
        for _ in 0..=goal {
            notices.extend(press(&mut sim, Key::Interact));
        }
    }

    assert_eq!(sim.minigame().completed_count(), 3);
    assert!(!notices.contains(&Notice::DoorOpened));
    assert!(!sim.minigame().has_escaped());
}

#[test]
fn test_store_scene_props_settle_above_min_height() {
    let scenes = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("scenes");
    let config = ConfigLoader::new(scenes).load_scene("store").unwrap();
    let mut sim = Simulation::new(config).unwrap();
    sim.push_event(SimEvent::AssetsLoaded(store_bundle()));

    run(&mut sim, 600);

    let props: Vec<_> = sim.proxies().iter().filter(|p| p.props.use_gravity).collect();
    assert_eq!(props.len(), 30);
    for p in props {
        assert!(p.pos.y >= p.props.min_height, "{} at {}", p.name, p.pos.y);
        assert!(p.vel.magnitude() < 1.0, "{} still moving: {:?}", p.name, p.vel);
    }
}

fn kick_cube(scene: &str) -> Vec3 {
    let scenes = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("scenes");
    let mut config = ConfigLoader::new(scenes).load_scene(scene).unwrap();
    config.spawn.count = 0;
    let mut sim = Simulation::new(config).unwrap();

    let mut cube = Proxy::new("cube", ProxyKind::Prop, Vec3::new(9.5, 1.0, 0.5), sim.config().presets.cube);
    cube.vel = Vec3::new(300.0, 0.0, -300.0);
    let id = sim.add_proxy(cube);

    run(&mut sim, 30);
    sim.proxies()[id].pos
}

#[test]
fn test_store_keeps_kicked_prop_on_shop_floor() {
    let pos = kick_cube("store");
    assert_eq!((pos.x, pos.z), (10.0, 0.0));
}

#[test]
fn test_vr_store_has_no_prop_bounds() {
    let pos = kick_cube("store_vr");
    assert!(pos.x > 10.0 && pos.z < 0.0, "prop was held back: {:?}", pos);
}

#[test]
fn test_voxel_world_supports_player() {
    let mut sim = empty_store();
    let terrain = VoxelTerrain::flat(Vec3::new(-8.0, -4.0, -8.0), 16, 16, 1.0, 2).unwrap();
    sim.set_world(Box::new(terrain));

    run(&mut sim, 90);

    assert_relative_eq!(sim.player().capsule.start.y, -2.0 + 0.35, epsilon = 2e-2);
}

#[test]
fn test_player_lands_on_generated_hills() {
    let mut sim = empty_store();
    // Sink the hills so the column under the spawn point tops out at y = -1
    let level = VoxelTerrain::generate(Vec3::new(-32.0, 0.0, -32.0), 64, 64, 1.0, 3).unwrap();
    let offset = -1.0 - level.surface_height(0.0, 0.0).unwrap();
    let terrain = VoxelTerrain::generate(Vec3::new(-32.0, offset, -32.0), 64, 64, 1.0, 3).unwrap();
    let ground = terrain.surface_height(0.0, 0.0).unwrap();
    assert_relative_eq!(ground, -1.0, epsilon = 1e-9);
    sim.set_world(Box::new(terrain));

    run(&mut sim, 240);

    let feet = sim.player().capsule.start.y - 0.35;
    assert!(sim.player().vel.y.abs() < 0.5, "still falling: {:?}", sim.player().vel);
    assert!(feet >= ground - 0.05, "sank below the hill top: {} < {}", feet, ground);
    assert!(feet <= ground + 3.0, "stuck in the air: {} > {}", feet, ground);
}
