mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use common::{MockHost, character, monster, on_main, world};
use game_core::BotConfig;
use runtime::{
    BrainEvent, Decision, Event, Home, Host, JsonFileStore, Mode, Runtime, StateStore, Topic,
};

fn config() -> BotConfig {
    let mut config = BotConfig::default();
    config.brain.panic_skill = Some("use_town".into());
    config
}

fn runtime(host: &Arc<MockHost>, store: Option<Arc<dyn StateStore>>) -> Runtime {
    common::init_tracing();
    let mut builder = Runtime::builder()
        .host(Arc::clone(host) as Arc<dyn Host>)
        .world(world())
        .bot_config(config());
    if let Some(store) = store {
        builder = builder.store(store);
    }
    builder.build().expect("runtime builds")
}

#[tokio::test(start_paused = true)]
async fn critical_health_away_from_home_panics_despite_target() {
    let host = MockHost::new(world(), character("me", on_main(600.0, -600.0)));
    host.add_entity(monster("goo", "goo", on_main(620.0, -600.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();

    brain.set_home(on_main(0.0, 0.0), 400.0).expect("home saved");
    brain.set_target(Some("goo"));
    host.update_me(|me| me.hp = 25.0);
    assert_eq!(brain.decide(), Decision::Panic);

    let tick = tokio::spawn({
        let brain = brain.clone();
        async move { brain.tick().await }
    });
    time::sleep(Duration::from_secs(10)).await;

    assert_eq!(host.casts()[0].skill, "use_town");
    let here = host.character().position;
    assert!(here.distance(&on_main(0.0, 0.0)).expect("same map") <= 50.0);
    assert!(!tick.is_finished());

    host.update_me(|me| me.hp = me.max_hp);
    assert_eq!(tick.await.expect("tick joins"), Some(Mode::Panic));
    assert_eq!(brain.state().mode, Some(Mode::Panic));

    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn critical_health_at_home_rests_instead() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();

    brain.set_home_here().expect("home saved");
    host.update_me(|me| me.hp = 25.0);

    assert_eq!(brain.decide(), Decision::Rest);
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn find_selects_target_then_attacks_it() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let mut goo = monster("goo", "goo", on_main(30.0, 200.0));
    goo.attack = 1.0;
    host.add_entity(goo);
    let runtime = runtime(&host, None);
    let brain = runtime.brain();
    let mut events = runtime.subscribe(Topic::Brain);

    assert_eq!(brain.tick().await, Some(Mode::Find));
    let state = brain.state();
    assert_eq!(state.target.as_deref(), Some("goo"));
    let difficulty = state.target_difficulty.expect("difficulty computed");
    assert!((difficulty - 0.5).abs() < 1e-9, "{difficulty}");

    assert_eq!(brain.tick().await, Some(Mode::Attack));
    assert!(
        host.casts()
            .iter()
            .any(|cast| cast.skill == "attack" && cast.target.as_deref() == Some("goo"))
    );

    let mut modes = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::Brain(BrainEvent::ModeChanged { mode }) = event {
            modes.push(mode);
        }
    }
    assert_eq!(modes, [Mode::Find, Mode::Attack]);

    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn dead_target_is_dropped() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    host.add_entity(monster("goo", "goo", on_main(30.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();

    brain.set_target(Some("goo"));
    host.update_entity("goo", |goo| goo.dead = true);

    assert_eq!(brain.tick().await, Some(Mode::Find));
    assert_eq!(brain.state().target, None);
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn failing_step_stops_the_brain() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();

    brain.set_home(on_main(-600.0, -600.0), 100.0).expect("home saved");
    host.panic_on_move(true);

    assert_eq!(brain.tick().await, Some(Mode::Find));
    let state = brain.state();
    assert!(state.stopped);
    assert!(
        state
            .stop_reason
            .as_deref()
            .is_some_and(|reason| reason.contains("panicked")),
        "{state:?}"
    );
    assert_eq!(brain.tick().await, None);

    host.panic_on_move(false);
    brain.resume().expect("resume persists");
    assert!(!brain.is_stopped());
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn unreachable_home_abandons_intent_without_stopping() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();

    brain
        .set_home(game_core::Position::new(0.0, 0.0, "nowhere"), 100.0)
        .expect("home saved");

    assert_eq!(brain.tick().await, Some(Mode::Find));
    assert!(!brain.is_stopped());
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn home_and_stop_flag_survive_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("bots").join("me.json");
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));

    let first = runtime(&host, Some(Arc::new(JsonFileStore::new(&path).expect("store"))));
    first
        .brain()
        .set_home(on_main(10.0, 20.0), 150.0)
        .expect("home saved");
    first.brain().stop("operator request");
    first.shutdown().await.expect("clean shutdown");

    let second = runtime(&host, Some(Arc::new(JsonFileStore::new(&path).expect("store"))));
    let brain = second.brain();
    let state = brain.state();
    assert_eq!(
        state.home,
        Some(Home {
            position: on_main(10.0, 20.0),
            radius: 150.0,
        })
    );
    assert!(state.stopped);
    assert_eq!(brain.tick().await, None);
    second.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn interrupt_ends_resting_early() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();
    brain.set_home_here().expect("home saved");
    host.update_me(|me| me.hp = 40.0);

    let tick = tokio::spawn({
        let brain = brain.clone();
        async move { brain.tick().await }
    });
    time::sleep(Duration::from_secs(3)).await;
    assert!(!tick.is_finished());

    brain.interrupt();
    assert_eq!(tick.await.expect("tick joins"), Some(Mode::Rest));
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn losing_health_abandons_rest() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();
    brain.set_home_here().expect("home saved");
    host.update_me(|me| me.hp = 40.0);

    let tick = tokio::spawn({
        let brain = brain.clone();
        async move { brain.tick().await }
    });
    time::sleep(Duration::from_secs(1)).await;
    host.update_me(|me| me.hp = 30.0);

    assert_eq!(tick.await.expect("tick joins"), Some(Mode::Rest));
    runtime.shutdown().await.expect("clean shutdown");
}

#[tokio::test(start_paused = true)]
async fn started_brain_rests_and_drinks_potions() {
    let host = MockHost::new(world(), character("me", on_main(0.0, 200.0)));
    let runtime = runtime(&host, None);
    let brain = runtime.brain();
    brain.set_home_here().expect("home saved");
    host.update_me(|me| me.hp = 40.0);

    runtime.start();
    time::sleep(Duration::from_millis(2_500)).await;

    assert_eq!(brain.state().mode, Some(Mode::Rest));
    let potions = host
        .casts()
        .iter()
        .filter(|cast| cast.skill == "use_hp")
        .count();
    assert!(potions >= 2, "{potions}");

    host.update_me(|me| me.hp = me.max_hp);
    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(brain.state().mode, Some(Mode::Find));

    runtime.shutdown().await.expect("clean shutdown");
}
