//! Behavioural tests for the hierarchical traversal.

use std::cell::RefCell;

use regiomap_core::test_support::{RecordingReporter, ReportEvent, ScriptedBuilder};
use regiomap_core::{
    BuildContext, BuildOutcome, RegionDefaults, RegionNode, RegionSpec, process_subtree,
    resolve_regions,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// World state shared by traversal scenarios.
#[derive(Debug, Default)]
struct TraversalWorld {
    specs: RefCell<Vec<RegionSpec>>,
    builder: RefCell<ScriptedBuilder>,
    reporter: RecordingReporter,
    outcome: RefCell<Option<BuildOutcome>>,
}

impl TraversalWorld {
    fn outcome(&self) -> BuildOutcome {
        self.outcome
            .borrow()
            .expect("the plan should have been processed")
    }

    fn published(&self) -> Vec<String> {
        self.reporter
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Published(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

#[fixture]
fn world() -> TraversalWorld {
    TraversalWorld::default()
}

#[given("a plan where europe carves a subset without a map")]
fn given_europe(world: &TraversalWorld) {
    world.specs.borrow_mut().push(RegionSpec {
        creates_data_subset: Some(true),
        creates_map_artifact: Some(false),
        ..RegionSpec::named("europe")
    });
}

#[given("europe contains greece and albania")]
fn given_children(world: &TraversalWorld) {
    let mut specs = world.specs.borrow_mut();
    let europe = specs.first_mut().expect("europe should be declared");
    europe.children = vec![RegionSpec::named("greece"), RegionSpec::named("albania")];
}

#[given("a sibling region asia with a map")]
fn given_asia(world: &TraversalWorld) {
    world.specs.borrow_mut().push(RegionSpec::named("asia"));
}

#[given("building the europe subset fails")]
fn given_subset_failure(world: &TraversalWorld) {
    let builder = world.builder.take().failing_subset("europe");
    world.builder.replace(builder);
}

#[given("building the greece map fails")]
fn given_map_failure(world: &TraversalWorld) {
    let builder = world.builder.take().failing_map("europe/greece");
    world.builder.replace(builder);
}

#[when("the plan is processed")]
fn when_processed(world: &TraversalWorld) {
    let regions: Vec<RegionNode> =
        resolve_regions(&world.specs.borrow(), &RegionDefaults::default())
            .expect("plan should resolve");
    let context = BuildContext::root("planet.osm.pbf");
    let outcome = process_subtree(&regions, &context, &*world.builder.borrow(), &world.reporter);
    world.outcome.replace(Some(outcome));
}

#[then("maps are published for greece, albania and asia")]
fn then_all_published(world: &TraversalWorld) {
    assert_eq!(world.published(), ["europe/greece", "europe/albania", "asia"]);
}

#[then("only the asia map is published")]
fn then_asia_published(world: &TraversalWorld) {
    assert_eq!(world.published(), ["asia"]);
}

#[then("maps are published for albania and asia")]
fn then_albania_and_asia_published(world: &TraversalWorld) {
    assert_eq!(world.published(), ["europe/albania", "asia"]);
}

#[then("the europe subset is removed")]
fn then_removed(world: &TraversalWorld) {
    assert!(
        world
            .reporter
            .events()
            .contains(&ReportEvent::SubsetRemoved("europe".to_owned()))
    );
}

#[then("the europe subset is retained")]
fn then_retained(world: &TraversalWorld) {
    assert!(
        world
            .reporter
            .events()
            .contains(&ReportEvent::SubsetRetained("europe".to_owned()))
    );
}

#[then("no region below europe is evaluated")]
fn then_subtree_skipped(world: &TraversalWorld) {
    let started = world.reporter.started();
    assert!(
        !started.iter().any(|name| name.starts_with("europe/")),
        "unexpected descendants in {started:?}"
    );
    assert!(started.contains(&"asia".to_owned()));
}

#[then("no error is reported")]
fn then_clean(world: &TraversalWorld) {
    assert!(!world.outcome().error_occurred);
}

#[then("an error is reported")]
fn then_error(world: &TraversalWorld) {
    assert!(world.outcome().error_occurred);
}

#[scenario(path = "tests/features/traversal.feature", index = 0)]
fn clean_run(world: TraversalWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/traversal.feature", index = 1)]
fn subset_failure(world: TraversalWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/traversal.feature", index = 2)]
fn map_failure(world: TraversalWorld) {
    let _ = world;
}
