//! End-to-end behaviour of the Osmosis builder driven by the traversal.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use regiomap_core::{
    BuildContext, BuildOutcome, LogReporter, RegionDefaults, RegionNode, RegionSpec,
    process_subtree, resolve_regions,
};
use regiomap_data::test_support::RecordingRunner;
use regiomap_data::{BuildLayout, Invocation, OsmosisBuilder, Toolchain};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const EUROPE_POLY: &str = "europe\n1\n-10 35\n40 35\n40 70\n-10 70\n-10 35\nEND\nEND\n";
const GREECE_POLY: &str = "greece\n1\n20 35\n28 35\n28 42\n20 42\n20 35\nEND\nEND\n";

/// World state for hierarchy build scenarios.
struct BuildWorld {
    _guard: TempDir,
    layout: BuildLayout,
    regions: RefCell<Vec<RegionNode>>,
    invocations: RefCell<Vec<Invocation>>,
    outcome: RefCell<Option<BuildOutcome>>,
}

impl BuildWorld {
    fn write(&self, path: &Utf8PathBuf, contents: &str) {
        regiomap_fs::write_file(path, contents).expect("write fixture file");
    }

    fn osmosis_calls(&self) -> Vec<Invocation> {
        self.invocations
            .borrow()
            .iter()
            .filter(|call| call.program.as_str() == "osmosis")
            .cloned()
            .collect()
    }

    fn europe_subset(&self) -> Utf8PathBuf {
        self.layout.pbf_staging.join("europe.osm.pbf")
    }

    fn outcome(&self) -> BuildOutcome {
        self.outcome
            .borrow()
            .expect("the hierarchy should have been built")
    }
}

#[fixture]
fn world() -> BuildWorld {
    let guard = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(guard.path().to_path_buf()).expect("utf-8 temp dir");
    BuildWorld {
        layout: BuildLayout {
            pbf_staging: root.join("pbf"),
            map_staging: root.join("map-staging"),
            polygons: root.join("polygons"),
            map_target: root.join("maps"),
            logs: root.join("logs"),
            land_polygons: None,
        },
        _guard: guard,
        regions: RefCell::new(Vec::new()),
        invocations: RefCell::new(Vec::new()),
        outcome: RefCell::new(None),
    }
}

#[given("a staged planet extract")]
fn given_planet(world: &BuildWorld) {
    world.write(&world.layout.pbf_staging.join("planet.osm.pbf"), "planet");
    world.write(&world.layout.polygons.join("europe.poly"), EUROPE_POLY);
    world.write(&world.layout.polygons.join("europe/greece.poly"), GREECE_POLY);
}

#[given("a plan where europe carves a subset and greece builds a map")]
fn given_plan(world: &BuildWorld) {
    let specs = [RegionSpec {
        creates_data_subset: Some(true),
        creates_map_artifact: Some(false),
        children: vec![RegionSpec::named("greece")],
        ..RegionSpec::named("europe")
    }];
    let regions = resolve_regions(&specs, &RegionDefaults::default()).expect("valid plan");
    world.regions.replace(regions);
}

#[given("the greece polygon is missing")]
fn given_missing_polygon(world: &BuildWorld) {
    let removed = regiomap_fs::remove_file(&world.layout.polygons.join("europe/greece.poly"))
        .expect("remove polygon");
    assert!(removed);
}

#[when("the hierarchy is built")]
fn when_built(world: &BuildWorld) {
    let builder = OsmosisBuilder::new(
        world.layout.clone(),
        Toolchain::default(),
        RecordingRunner::default(),
    );
    let context = BuildContext::root("planet.osm.pbf");
    let outcome = process_subtree(&world.regions.borrow(), &context, &builder, &LogReporter);
    world.invocations.replace(builder.runner().invocations());
    world.outcome.replace(Some(outcome));
}

#[then("osmosis carved the europe subset once")]
fn then_subset_once(world: &BuildWorld) {
    let target = format!("file={}", world.europe_subset());
    let carving: Vec<Invocation> = world
        .osmosis_calls()
        .into_iter()
        .filter(|call| call.args.contains(&target))
        .collect();
    assert_eq!(carving.len(), 1);
    assert!(carving[0].args.contains(&"--wb".to_owned()));
}

#[then("the greece map was built from the europe subset")]
fn then_map_from_subset(world: &BuildWorld) {
    let calls = world.osmosis_calls();
    let map = calls
        .iter()
        .find(|call| call.args.contains(&"--mw".to_owned()))
        .expect("map invocation");
    assert_eq!(map.args[1], world.europe_subset().to_string());
    assert!(map.args.contains(&format!(
        "file={}",
        world.layout.polygons.join("europe/greece.poly")
    )));
    assert_eq!(calls.len(), 2);
}

#[then("the greece map is published under europe")]
fn then_published(world: &BuildWorld) {
    assert!(!world.outcome().error_occurred);
    assert_eq!(world.outcome().published, 1);
    let published = world.layout.map_target.join("europe/greece.map");
    assert_eq!(regiomap_fs::file_len(&published).expect("stat map"), Some(4));
}

#[then("the europe subset was removed")]
fn then_subset_removed(world: &BuildWorld) {
    assert_eq!(regiomap_fs::file_len(&world.europe_subset()).expect("stat"), None);
}

#[then("the build reports an error")]
fn then_error(world: &BuildWorld) {
    assert!(world.outcome().error_occurred);
    assert_eq!(world.outcome().published, 0);
}

#[then("the europe subset was kept")]
fn then_subset_kept(world: &BuildWorld) {
    assert!(regiomap_fs::file_is_file(&world.europe_subset()).expect("stat"));
}

#[scenario(path = "tests/features/hierarchy_build.feature", index = 0)]
fn country_from_continent(world: BuildWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/hierarchy_build.feature", index = 1)]
fn missing_country_polygon(world: BuildWorld) {
    let _ = world;
}
