//! # Scene Integration Tests
//!
//! Objects that own grid bodies: spawning during tick, hits through
//! broad-phase contacts, and bodies released by collect.

use cinder::core::{
    Constructed, Context, Object, ObjectError, ObjectRef, ObjectResult, ObjectType, Spawn,
    Tagged,
};
use cinder::shared::Vec2;
use cinder::spatial::BodyId;
use cinder::{CinderConfig, Scene, Service};

const DT: f32 = 1.0 / 60.0;

/// Static obstacle.
struct Rock {
    body: BodyId,
}

impl Object<Service> for Rock {}

impl Tagged for Rock {
    const TYPE: ObjectType = ObjectType(3);
}

impl Spawn<Service> for Rock {
    type Args = (Vec2, f32);

    fn spawn(cx: &mut Context<'_, Service>, (pos, radius): (Vec2, f32)) -> ObjectResult<Constructed<Self>> {
        let owner = cx.this();
        let body = cx.service().add_body(owner, pos, radius).map_err(|err| {
            ObjectError::InvalidArguments {
                tag: Self::TYPE,
                reason: err.to_string(),
            }
        })?;
        Ok(Constructed::new(Self { body }))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, Service>) {
        cx.service().grid.remove(self.body).unwrap();
    }
}

/// Moves itself every tick and destroys the first rock it touches.
struct Bullet {
    body: BodyId,
    life: u32,
}

impl Object<Service> for Bullet {
    fn tick(&mut self, cx: &mut Context<'_, Service>) {
        let (factory, service) = cx.split();
        let hit = service
            .contact_owners(self.body)
            .find(|&owner| factory.is_a(owner, Rock::TYPE) && factory.is_alive(owner));
        if let Some(rock) = hit {
            assert!(factory.kill(rock).unwrap());
            cx.kill().unwrap();
            return;
        }

        let dt = cx.service().dt();
        cx.service().grid.advance(self.body, dt).unwrap();

        self.life -= 1;
        if self.life == 0 {
            cx.kill().unwrap();
        }
    }
}

impl Tagged for Bullet {
    const TYPE: ObjectType = ObjectType(2);
}

impl Spawn<Service> for Bullet {
    type Args = (Vec2, Vec2);

    fn spawn(cx: &mut Context<'_, Service>, (pos, velocity): (Vec2, Vec2)) -> ObjectResult<Constructed<Self>> {
        let owner = cx.this();
        let service = cx.service();
        let body = service.add_body(owner, pos, 2.0).unwrap();
        service.grid.set_velocity(body, velocity).unwrap();
        Ok(Constructed::new(Self { body, life: 40 }).with_order(1))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, Service>) {
        cx.service().grid.remove(self.body).unwrap();
    }
}

/// Fires a bullet along +x every third frame.
struct Turret {
    body: BodyId,
    frames: u32,
    fired: u32,
}

impl Object<Service> for Turret {
    fn tick(&mut self, cx: &mut Context<'_, Service>) {
        self.frames += 1;
        if self.frames % 3 != 0 {
            return;
        }
        let pos = cx.service().grid.get(self.body).unwrap().pos();
        let bullet = cx.create_type::<Bullet>((pos + Vec2::new(12.0, 0.0), Vec2::new(300.0, 0.0)));
        assert!(bullet.valid());
        self.fired += 1;
    }
}

impl Tagged for Turret {
    const TYPE: ObjectType = ObjectType(1);
}

impl Spawn<Service> for Turret {
    type Args = Vec2;

    fn spawn(cx: &mut Context<'_, Service>, pos: Vec2) -> ObjectResult<Constructed<Self>> {
        let owner = cx.this();
        let body = cx.service().add_body(owner, pos, 8.0).unwrap();
        Ok(Constructed::new(Self {
            body,
            frames: 0,
            fired: 0,
        })
        .with_order(-1))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, Service>) {
        cx.service().grid.remove(self.body).unwrap();
    }
}

/// Scatters rocks from its constructor, then lets itself be collected.
struct Burst;

impl Object<Service> for Burst {}

impl Tagged for Burst {
    const TYPE: ObjectType = ObjectType(4);
}

impl Spawn<Service> for Burst {
    type Args = u32;

    fn spawn(cx: &mut Context<'_, Service>, count: u32) -> ObjectResult<Constructed<Self>> {
        for _ in 0..count {
            let random = &mut cx.service().random;
            let pos = Vec2::new(random.range_f32(500.0, 900.0), random.range_f32(500.0, 900.0));
            assert!(cx.create_type::<Rock>((pos, 4.0)).valid());
        }
        Ok(Constructed::new(Self).fire_and_forget())
    }
}

/// Body moved only by velocity integration.
struct Drifter {
    body: BodyId,
}

impl Object<Service> for Drifter {}

impl Tagged for Drifter {
    const TYPE: ObjectType = ObjectType(5);
}

impl Spawn<Service> for Drifter {
    type Args = Vec2;

    fn spawn(cx: &mut Context<'_, Service>, velocity: Vec2) -> ObjectResult<Constructed<Self>> {
        let owner = cx.this();
        let service = cx.service();
        let body = service.add_body(owner, Vec2::ZERO, 3.0).unwrap();
        service.grid.set_velocity(body, velocity).unwrap();
        Ok(Constructed::new(Self { body }))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, Service>) {
        cx.service().grid.remove(self.body).unwrap();
    }
}

fn scene(config: CinderConfig) -> Scene {
    let mut scene = Scene::new(CinderConfig {
        frame_budget_us: 0,
        ..config
    })
    .unwrap();
    scene.add_type::<Turret>().unwrap();
    scene.add_type::<Bullet>().unwrap();
    scene.add_type::<Rock>().unwrap();
    scene.add_type::<Burst>().unwrap();
    scene.add_type::<Drifter>().unwrap();
    scene
}

/// Every body belongs to a live object and sits in exactly the cells of its
/// bound.
fn assert_consistent(scene: &Scene) {
    let grid = &scene.service().grid;
    for (id, body) in grid.bodies() {
        assert!(scene.factory().contains(body.owner()), "orphan body {id}");
        assert_eq!(grid.cells_of(id).unwrap(), grid.expected_cells_of(id).unwrap());
    }
}

#[test]
fn bullets_destroy_rocks_and_release_bodies() {
    let mut scene = scene(CinderConfig {
        sort_every_frame: true,
        ..CinderConfig::default()
    });

    let turret = scene.create_type::<Turret>(Vec2::ZERO);
    let target = scene.create_type::<Rock>((Vec2::new(100.0, 0.0), 10.0));
    let bystander = scene.create_type::<Rock>((Vec2::new(0.0, 100.0), 10.0));

    for _ in 0..60 {
        scene.frame(DT).unwrap();
        assert_consistent(&scene);
        // Every object owns exactly one body.
        assert_eq!(scene.service().grid.body_count(), scene.factory().live_count());
    }

    assert!(!scene.factory().contains(target));
    assert!(scene.factory().is_alive(bystander));
    assert_eq!(
        scene.factory().get(target).err(),
        Some(ObjectError::NoSuchEntity(target))
    );

    let fired = scene.factory().cast::<Turret>(turret).unwrap().fired;
    assert_eq!(fired, 20);
    assert!(scene.stats().freed_sum >= 2);
}

#[test]
fn fire_and_forget_spawner_is_collected_first_frame() {
    let mut scene = scene(CinderConfig::default());

    let burst = scene.create_type::<Burst>(5);
    assert!(burst.valid());
    assert_eq!(scene.factory().ref_count(burst).unwrap(), 0);
    assert_eq!(scene.service().grid.body_count(), 5);

    let stats = scene.frame(DT).unwrap();
    assert_eq!(stats.ticked, 5);
    assert_eq!(stats.freed, 1);
    assert_eq!(stats.live, 5);
    assert!(!scene.factory().contains(burst));
    assert_consistent(&scene);
}

#[test]
fn retained_handle_defers_collection() {
    let mut scene = scene(CinderConfig::default());
    let rock = scene.create_type::<Rock>((Vec2::new(10.0, 10.0), 4.0));

    let factory = scene.factory_mut();
    let held: ObjectRef = factory.inc(rock).unwrap();
    assert_eq!(held, rock);
    assert!(factory.kill(rock).unwrap());
    assert_eq!(factory.ref_count(rock).unwrap(), 1);

    scene.frame(DT).unwrap();
    assert!(scene.factory().contains(rock));
    assert_eq!(scene.service().grid.body_count(), 1);

    assert_eq!(scene.factory_mut().dec(rock).unwrap(), 0);
    // Disposed but resolvable until the next collect.
    assert!(scene.factory().cast::<Rock>(rock).is_ok());

    let stats = scene.frame(DT).unwrap();
    assert_eq!(stats.freed, 1);
    assert_eq!(scene.service().grid.body_count(), 0);
    assert_eq!(
        scene.factory_mut().dec(rock).err(),
        Some(ObjectError::NoSuchEntity(rock))
    );
}

#[test]
fn overlapping_bodies_are_paired_once_per_frame() {
    let mut scene = scene(CinderConfig::default());
    let a = scene.create_type::<Rock>((Vec2::new(5.0, 5.0), 2.0));
    let b = scene.create_type::<Rock>((Vec2::new(6.0, 5.0), 2.0));
    scene.create_type::<Rock>((Vec2::new(200.0, 5.0), 2.0));

    let stats = scene.frame(DT).unwrap();
    assert_eq!(stats.pairs, 1);

    let body_a = scene.factory().cast::<Rock>(a).unwrap().body;
    let owners: Vec<ObjectRef> = scene.service().contact_owners(body_a).collect();
    assert_eq!(owners, vec![b]);
}

#[test]
fn velocity_integration_moves_bodies() {
    let mut scene = scene(CinderConfig {
        integrate_velocity: true,
        gather_pairs: false,
        ..CinderConfig::default()
    });
    let drifter = scene.create_type::<Drifter>(Vec2::new(60.0, -30.0));

    for _ in 0..60 {
        let stats = scene.frame(DT).unwrap();
        assert_eq!(stats.advanced, 1);
        assert_eq!(stats.pairs, 0);
    }

    let body = scene.factory().cast::<Drifter>(drifter).unwrap().body;
    let pos = scene.service().grid.get(body).unwrap().pos();
    assert!((pos.x - 60.0).abs() < 1e-2);
    assert!((pos.y + 30.0).abs() < 1e-2);
    assert_consistent(&scene);
}

#[test]
fn scene_from_toml() {
    let mut scene = Scene::from_toml_str(
        r"
        seed = 7
        frame_budget_us = 0

        [grid]
        cell_width = 16.0
        buckets = 256

        [factory]
        capacity = 8
        ",
    )
    .unwrap();
    scene.add_type::<Rock>().unwrap();

    assert!((scene.service().grid.cell_width() - 16.0).abs() < f32::EPSILON);
    assert_eq!(scene.factory().capacity(), 8);

    for i in 0..8 {
        assert!(scene.create_type::<Rock>((Vec2::new(i as f32 * 20.0, 0.0), 1.0)).valid());
    }
    // Pool exhausted: invalid handle, nothing else changes.
    let overflow = scene.create_type::<Rock>((Vec2::ZERO, 1.0));
    assert!(!overflow.valid());
    assert_eq!(scene.factory().live_count(), 8);
    assert_eq!(
        scene.try_create(Rock::TYPE, (Vec2::ZERO, 1.0f32)).err(),
        Some(ObjectError::PoolExhausted { capacity: 8 })
    );
}
