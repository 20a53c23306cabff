//! # Lifecycle Integration Tests
//!
//! Mark-then-sweep behaviour of the factory when objects create and dispose
//! each other from inside `tick()`.

use cinder_core::{
    Constructed, Context, Object, ObjectError, ObjectFactory, ObjectRef, ObjectResult,
    ObjectType, Spawn, Tagged,
};
use cinder_shared::Random;

/// Application context for these tests.
struct World {
    random: Random,
    /// Every (frame, id) update, in order.
    updates: Vec<(u32, u32)>,
    frame: u32,
    next_id: u32,
    destroyed: Vec<u32>,
    /// What each beacon saw of itself while being destroyed, and the drone it
    /// left behind.
    teardowns: Vec<(Teardown, ObjectRef)>,
}

/// A beacon's view of its own slot from inside `despawn`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Teardown {
    order_before: i32,
    order_after: i32,
    ref_count: u32,
    alive: bool,
    busy: bool,
}

impl World {
    fn new(seed: u64) -> Self {
        Self {
            random: Random::new(seed),
            updates: Vec::new(),
            frame: 0,
            next_id: 0,
            destroyed: Vec::new(),
            teardowns: Vec::new(),
        }
    }

    fn issue_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Spawns one child per update until it has spawned `budget` children.
struct Emitter {
    id: u32,
    budget: u32,
}

impl Object<World> for Emitter {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        let frame = cx.service().frame;
        cx.service().updates.push((frame, self.id));
        if self.budget > 0 {
            self.budget -= 1;
            let child = cx.create_type::<Drone>(());
            assert!(child.valid());
        }
    }
}

impl Tagged for Emitter {
    const TYPE: ObjectType = ObjectType(10);
}

impl Spawn<World> for Emitter {
    type Args = u32;

    fn spawn(cx: &mut Context<'_, World>, budget: u32) -> ObjectResult<Constructed<Self>> {
        let id = cx.service().issue_id();
        Ok(Constructed::new(Self { id, budget }))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, World>) {
        cx.service().destroyed.push(self.id);
    }
}

/// Plain updatable object.
struct Drone {
    id: u32,
}

impl Object<World> for Drone {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        let frame = cx.service().frame;
        cx.service().updates.push((frame, self.id));
    }
}

impl Tagged for Drone {
    const TYPE: ObjectType = ObjectType(11);
}

impl Spawn<World> for Drone {
    type Args = ();

    fn spawn(cx: &mut Context<'_, World>, (): ()) -> ObjectResult<Constructed<Self>> {
        let id = cx.service().issue_id();
        Ok(Constructed::new(Self { id }))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, World>) {
        cx.service().destroyed.push(self.id);
    }
}

/// Kills its target on its first update, then itself.
struct Assassin {
    target: ObjectRef,
}

impl Object<World> for Assassin {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        let target = self.target;
        let factory = cx.factory();
        factory.kill(target).unwrap();
        // The target is disposed, but it must still resolve until collect.
        assert!(factory.is_disposed(target).unwrap());
        assert!(factory.get(target).is_ok());
        // Our own object is checked out while we run.
        let this = cx.this();
        assert_eq!(cx.factory().get(this).err(), Some(ObjectError::Busy(this)));
        cx.kill().unwrap();
    }
}

impl Tagged for Assassin {
    const TYPE: ObjectType = ObjectType(12);
}

impl Spawn<World> for Assassin {
    type Args = ObjectRef;

    fn spawn(_cx: &mut Context<'_, World>, target: ObjectRef) -> ObjectResult<Constructed<Self>> {
        Ok(Constructed::new(Self { target }).with_order(-10))
    }
}

/// Tries to run the other frame phases from inside its own update.
struct Meddler {
    results: Vec<ObjectError>,
}

impl Object<World> for Meddler {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        let (factory, world) = cx.split();
        if let Err(err) = factory.collect(world) {
            self.results.push(err);
        }
        if let Err(err) = factory.sort() {
            self.results.push(err);
        }
        if let Err(err) = factory.tick(world) {
            self.results.push(err);
        }
    }
}

impl Tagged for Meddler {
    const TYPE: ObjectType = ObjectType(13);
}

impl Spawn<World> for Meddler {
    type Args = ();

    fn spawn(_cx: &mut Context<'_, World>, (): ()) -> ObjectResult<Constructed<Self>> {
        Ok(Constructed::new(Self {
            results: Vec::new(),
        }))
    }
}

/// Object whose update kills it at random, like a short-lived particle.
struct Mayfly;

impl Object<World> for Mayfly {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        if cx.service().random.rand_chance(10) {
            cx.kill().unwrap();
        }
    }
}

impl Tagged for Mayfly {
    const TYPE: ObjectType = ObjectType(14);
}

impl Spawn<World> for Mayfly {
    type Args = ();

    fn spawn(cx: &mut Context<'_, World>, (): ()) -> ObjectResult<Constructed<Self>> {
        let order = (cx.service().random.rand_u32() & 0xff) as i32;
        Ok(Constructed::new(Self).with_order(order))
    }
}

/// Creates a wave of drones from its constructor and gives itself up.
struct Wave;

impl Object<World> for Wave {}

impl Tagged for Wave {
    const TYPE: ObjectType = ObjectType(15);
}

impl Spawn<World> for Wave {
    type Args = u32;

    fn spawn(cx: &mut Context<'_, World>, count: u32) -> ObjectResult<Constructed<Self>> {
        for _ in 0..count {
            cx.create_type::<Drone>(());
        }
        Ok(Constructed::new(Self).fire_and_forget())
    }
}

/// Fire-and-forget object that kills itself on its first update.
struct Oneshot;

impl Object<World> for Oneshot {
    fn tick(&mut self, cx: &mut Context<'_, World>) {
        let frame = cx.service().frame;
        cx.service().updates.push((frame, 0));
        assert!(cx.kill().unwrap());
    }
}

impl Tagged for Oneshot {
    const TYPE: ObjectType = ObjectType(16);
}

impl Spawn<World> for Oneshot {
    type Args = ();

    fn spawn(_cx: &mut Context<'_, World>, (): ()) -> ObjectResult<Constructed<Self>> {
        Ok(Constructed::new(Self).fire_and_forget())
    }
}

/// Inspects its own slot while being destroyed and leaves a drone behind.
struct Beacon;

impl Object<World> for Beacon {}

impl Tagged for Beacon {
    const TYPE: ObjectType = ObjectType(17);
}

impl Spawn<World> for Beacon {
    type Args = ();

    fn spawn(_cx: &mut Context<'_, World>, (): ()) -> ObjectResult<Constructed<Self>> {
        Ok(Constructed::new(Self).with_order(7))
    }

    fn despawn(self: Box<Self>, cx: &mut Context<'_, World>) {
        let this = cx.this();
        let order_before = cx.order().unwrap();
        cx.set_order(3).unwrap();
        let order_after = cx.order().unwrap();

        let factory = cx.factory();
        let seen = Teardown {
            order_before,
            order_after,
            ref_count: factory.ref_count(this).unwrap(),
            alive: factory.is_alive(this),
            busy: factory.get(this).err() == Some(ObjectError::Busy(this)),
        };

        let child = cx.create_type::<Drone>(());
        cx.service().teardowns.push((seen, child));
    }
}

fn factory() -> ObjectFactory<World> {
    let mut factory = ObjectFactory::with_capacity(2048);
    factory.add_type::<Emitter>().unwrap();
    factory.add_type::<Drone>().unwrap();
    factory.add_type::<Assassin>().unwrap();
    factory.add_type::<Meddler>().unwrap();
    factory.add_type::<Mayfly>().unwrap();
    factory.add_type::<Wave>().unwrap();
    factory.add_type::<Oneshot>().unwrap();
    factory.add_type::<Beacon>().unwrap();
    factory
}

#[test]
fn objects_created_during_tick_wait_for_next_tick() {
    let mut world = World::new(1);
    let mut factory = factory();

    factory.create_type::<Emitter>(&mut world, 2);

    world.frame = 1;
    assert_eq!(factory.tick(&mut world).unwrap(), 1);
    assert_eq!(world.updates, vec![(1, 1)]);
    assert_eq!(factory.live_count(), 2);

    world.frame = 2;
    assert_eq!(factory.tick(&mut world).unwrap(), 2);
    // Emitter first, then the drone it spawned last frame.
    assert_eq!(world.updates[1..], [(2, 1), (2, 2)]);
    assert_eq!(factory.live_count(), 3);
}

#[test]
fn disposal_during_tick_is_deferred_to_collect() {
    let mut world = World::new(2);
    let mut factory = factory();

    let victim = factory.create_type::<Drone>(&mut world, ());
    let assassin = factory.create_type::<Assassin>(&mut world, victim);
    factory.sort().unwrap();

    factory.tick(&mut world).unwrap();
    // The assassin sorts first, so the victim is disposed before its turn.
    assert!(world.updates.is_empty());
    assert!(factory.contains(victim));
    assert!(factory.contains(assassin));
    assert_eq!(factory.pending_count(), 2);

    assert_eq!(factory.collect(&mut world).unwrap(), 2);
    assert!(!factory.contains(victim));
    assert!(!factory.contains(assassin));
    assert_eq!(world.destroyed, vec![1]);
    assert_eq!(factory.live_count(), 0);
}

#[test]
fn frame_phases_refuse_to_nest() {
    let mut world = World::new(3);
    let mut factory = factory();

    let meddler = factory.create_type::<Meddler>(&mut world, ());
    factory.tick(&mut world).unwrap();

    let results = &factory.cast::<Meddler>(meddler).unwrap().results;
    assert_eq!(
        results,
        &vec![
            ObjectError::Reentrant {
                operation: "collect",
                phase: "tick"
            },
            ObjectError::Reentrant {
                operation: "sort",
                phase: "tick"
            },
            ObjectError::Reentrant {
                operation: "tick",
                phase: "tick"
            },
        ]
    );
}

#[test]
fn fire_and_forget_constructor_spawns_children() {
    let mut world = World::new(4);
    let mut factory = factory();

    let wave = factory.create_type::<Wave>(&mut world, 3);
    assert!(wave.valid());
    assert_eq!(factory.ref_count(wave).unwrap(), 0);
    assert_eq!(factory.live_count(), 4);

    // Disposed on creation: never updated, freed by the first collect.
    factory.tick(&mut world).unwrap();
    assert_eq!(world.updates.len(), 3);
    assert_eq!(factory.collect(&mut world).unwrap(), 1);
    assert!(!factory.contains(wave));
    assert_eq!(factory.live_count(), 3);
}

#[test]
fn random_churn_keeps_counts_consistent() {
    let mut world = World::new(0x1234);
    let mut factory = factory();

    let mut freed = 0usize;
    for _ in 0..100 {
        for _ in 0..10 {
            assert!(factory.create_type::<Mayfly>(&mut world, ()).valid());
        }
        factory.tick(&mut world).unwrap();
        factory.sort().unwrap();
        freed += factory.collect(&mut world).unwrap();

        // Nothing left on the live list is disposed after a collect.
        assert_eq!(factory.pending_count(), 0);
        let orders: Vec<i32> = factory
            .live()
            .iter()
            .map(|this| factory.order(*this).unwrap())
            .collect();
        assert!(orders.windows(2).all(|w| w[0] <= w[1]));
    }

    assert_eq!(factory.created_total(), 1000);
    assert_eq!(factory.freed_total() as usize, freed);
    assert_eq!(factory.live_count() + freed, 1000);
}

#[test]
fn held_fire_and_forget_object_survives_killing_itself() {
    let mut world = World::new(5);
    let mut factory = factory();

    let oneshot = factory.create_type::<Oneshot>(&mut world, ());
    let held = factory.inc(oneshot).unwrap();
    assert_eq!(factory.ref_count(held).unwrap(), 1);

    assert_eq!(factory.tick(&mut world).unwrap(), 1);
    assert!(!factory.is_alive(held));
    // The kill had no self-held reference left to drop.
    assert_eq!(factory.ref_count(held).unwrap(), 1);

    assert_eq!(factory.collect(&mut world).unwrap(), 0);
    assert!(factory.contains(held));

    assert_eq!(factory.dec(held).unwrap(), 0);
    assert_eq!(factory.collect(&mut world).unwrap(), 1);
    assert!(!factory.contains(held));
}

#[test]
fn destroy_hook_sees_its_own_slot() {
    let mut world = World::new(6);
    let mut factory = factory();

    let beacon = factory.create_type::<Beacon>(&mut world, ());
    assert!(factory.kill(beacon).unwrap());
    assert_eq!(factory.collect(&mut world).unwrap(), 1);

    let (seen, _) = world.teardowns[0];
    assert_eq!(
        seen,
        Teardown {
            order_before: 7,
            order_after: 3,
            ref_count: 0,
            alive: false,
            busy: true,
        }
    );
    assert!(!factory.contains(beacon));
    assert_eq!(factory.freed_total(), 1);
}

#[test]
fn objects_created_by_destroy_hooks_join_the_live_list() {
    let mut world = World::new(7);
    let mut factory = factory();

    let first = factory.create_type::<Drone>(&mut world, ());
    let beacon = factory.create_type::<Beacon>(&mut world, ());
    let last = factory.create_type::<Drone>(&mut world, ());
    factory.kill(beacon).unwrap();

    assert_eq!(factory.collect(&mut world).unwrap(), 1);
    let (_, child) = world.teardowns[0];
    assert!(child.valid());
    // Survivors keep their order; the child is appended after them.
    assert_eq!(factory.live(), &[first, last, child]);
    assert_eq!(factory.ref_count(child).unwrap(), 1);
    assert_eq!(factory.pending_count(), 0);

    world.frame = 1;
    assert_eq!(factory.tick(&mut world).unwrap(), 3);
    assert_eq!(world.updates, vec![(1, 1), (1, 2), (1, 3)]);
}
