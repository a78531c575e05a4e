use nalgebra::Point3;
use shared::{
    ActorFlag, ArchetypeId, CommandSource, IdentityConfig, IdentityRecord, IdentityReplica,
    IdentityServices, LocalWorld, OpenWorld, RenderDirective, ReplicaUpdate, ShadowFlag,
};

fn services() -> IdentityServices {
    IdentityServices::vanilla(IdentityConfig::default())
}

#[test]
fn grant_equip_test_scenario() {
    let services = services();
    let auth = services.authorization(&OpenWorld);
    let mut world = LocalWorld::default();
    let steve = world.spawn_player("Steve", Point3::origin());
    let op = CommandSource::console(2);

    let granted = auth.run(&mut world, &op, "identity grant Steve minecraft:wolf");
    assert_eq!(granted.exit_code, 1);
    assert!(granted.feedback.iter().any(|line| line.key == "identity.grant_success"));

    let again = auth.run(&mut world, &op, "identity grant Steve minecraft:wolf");
    assert_eq!(again.feedback[0].key, "identity.already_has");

    let wolf = ArchetypeId::new("wolf");
    world
        .equip_self(steve, Some(&wolf), &services, &OpenWorld)
        .unwrap();

    assert_eq!(auth.run(&mut world, &op, "identity test Steve minecraft:wolf").exit_code, 1);
    assert_eq!(auth.run(&mut world, &op, "identity test Steve minecraft:cow").exit_code, 0);
    assert_eq!(auth.run(&mut world, &op, "identity test Steve not minecraft:wolf").exit_code, 0);
    assert_eq!(auth.run(&mut world, &op, "identity test not Steve minecraft:cow").exit_code, 1);

    auth.run(&mut world, &op, "identity unequip @a");
    assert_eq!(auth.run(&mut world, &op, "identity test Steve not minecraft:wolf").exit_code, 1);
}

#[test]
fn revoked_identity_blocks_self_service_but_not_operators() {
    let services = services();
    let auth = services.authorization(&OpenWorld);
    let mut world = LocalWorld::default();
    let alex = world.spawn_player("Alex", Point3::origin());
    let op = CommandSource::console(4);
    let creeper = ArchetypeId::new("creeper");

    auth.run(&mut world, &op, "identity grant Alex creeper");
    auth.run(&mut world, &op, "identity revoke Alex creeper");
    assert!(world.equip_self(alex, Some(&creeper), &services, &OpenWorld).is_err());

    auth.run(&mut world, &op, &format!("identity equip #{alex} creeper"));
    assert!(world.identity(alex).unwrap().is_equipped_with(&creeper));
}

#[test]
fn authoritative_state_reaches_an_observer() {
    let services = services();
    let auth = services.authorization(&OpenWorld);
    let mut world = LocalWorld::default();
    let alex = world.spawn_player("Alex", Point3::origin());

    auth.run(&mut world, &CommandSource::console(2), "identity equip Alex phantom");
    {
        let actor = world.actor_mut(alex).unwrap();
        actor.position = Point3::new(8.0, 90.0, 8.0);
        actor.set_flag(ActorFlag::Sprinting, true);
    }
    world.tick(&services);

    // Drift correction after the tick so the observer sees the mirrored state.
    let mut messages = world.drain_replication();
    let mut snapshot = world.identity(alex).unwrap().clone();
    snapshot.enqueue_snapshot();
    messages.extend(snapshot.drain_replication());

    let mut observed = world.actor(alex).unwrap().clone();
    let mut replica = IdentityReplica::new(alex);
    for message in messages.iter().rev() {
        replica.apply(message, &services, &OpenWorld, &mut observed);
    }

    let shadow = replica.state().identity().unwrap();
    assert_eq!(shadow.archetype().as_str(), "phantom");
    assert_eq!(shadow.state.position, Point3::new(8.0, 90.0, 8.0));
    assert!(shadow.flag(ShadowFlag::Sprinting));

    observed.pitch = 20.0;
    let directive = services.sync().render(&observed, replica.state_mut());
    assert_eq!(directive, RenderDirective::Shadow);
    assert_eq!(replica.state().identity().unwrap().state.pitch, -20.0);

    let stale = replica.apply(&messages[0], &services, &OpenWorld, &mut observed);
    assert!(matches!(stale, ReplicaUpdate::Stale));
}

#[test]
fn persisted_record_survives_a_reload() {
    let services = services();
    let mut world = LocalWorld::default();
    let alex = world.spawn_player("Alex", Point3::origin());
    services
        .authorization(&OpenWorld)
        .run(&mut world, &CommandSource::console(2), "identity equip Alex villager");
    world.actor_mut(alex).unwrap().set_flag(ActorFlag::Sneaking, true);
    world.tick(&services);

    let json = world.identity(alex).unwrap().serialize().to_json();
    let record = IdentityRecord::from_json(&json).unwrap();
    assert_eq!(record.id, "villager");

    let mut reloaded = LocalWorld::default();
    let alex_again = reloaded.spawn_player("Alex", Point3::origin());
    let mut actor = reloaded.actor(alex_again).unwrap().clone();
    let mut state = shared::IdentityState::new(alex_again);
    state
        .deserialize(&record, &services, &OpenWorld, &mut actor)
        .unwrap();

    assert!(state.identity().unwrap().flag(ShadowFlag::Sneaking));
    assert_eq!(actor.dimensions.height, 1.95);
}
