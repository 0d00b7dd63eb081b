//! Focused unit tests covering build configuration and plan loading.

use super::helpers::{PlanWorkspace, build_plan};
use super::*;
use crate::build::{BuildConfig, config_from_layers_for_test};
use crate::plan::locate_toolchain;
use camino::Utf8PathBuf;
use ortho_config::MergeComposer;
use regiomap_core::{RegionConfigError, StorageType};
use regiomap_data::Toolchain;
use regiomap_data::test_support::RecordingRunner;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn workspace() -> PlanWorkspace {
    PlanWorkspace::new()
}

#[rstest]
#[case(&["--plan", "plan.json", "--dry-run"])]
#[case(&["-c", "plan.json", "-d"])]
fn build_flags_parse(#[case] flags: &[&str]) {
    let invocation = ["regiomap", "build"].iter().chain(flags).copied();
    let cli = Cli::try_parse_from(invocation).expect("flags should parse");
    let Command::Build(args) = cli.command;
    assert_eq!(args.plan, Some(Utf8PathBuf::from("plan.json")));
    assert!(args.dry_run);
}

#[rstest]
fn converting_without_plan_errors() {
    let err = BuildConfig::try_from(BuildArgs::default()).expect_err("plan is required");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_PLAN);
            assert_eq!(env, ENV_PLAN);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn environment_layer_supplies_plan_path() {
    let mut composer = MergeComposer::new();
    composer.push_environment(json!({ "plan": "/etc/regiomap/plan.json", "dry_run": true }));

    let config = config_from_layers_for_test(composer.layers()).expect("env layer suffices");

    assert_eq!(config.plan, Utf8PathBuf::from("/etc/regiomap/plan.json"));
    assert!(config.dry_run);
}

#[rstest]
fn cli_plan_flag_wins_over_environment_and_file() {
    let mut composer = MergeComposer::new();
    composer.push_file(json!({ "plan": "/srv/file-plan.json" }), None);
    composer.push_environment(json!({ "plan": "/srv/env-plan.json" }));
    composer.push_cli(json!({ "plan": "cli-plan.json" }));

    let config = config_from_layers_for_test(composer.layers()).expect("layers merge");

    assert_eq!(config.plan, Utf8PathBuf::from("cli-plan.json"));
    assert!(!config.dry_run);
}

#[rstest]
fn malformed_configuration_layer_is_reported() {
    let mut composer = MergeComposer::new();
    composer.push_environment(json!({ "plan": 42 }));

    let err = config_from_layers_for_test(composer.layers()).expect_err("plan must be a path");

    assert!(matches!(err, CliError::Configuration(_)), "{err:?}");
}

#[rstest]
fn empty_layers_leave_plan_missing() {
    let err = config_from_layers_for_test(MergeComposer::new().layers())
        .expect_err("no layer names a plan");
    assert!(matches!(err, CliError::MissingArgument { .. }), "{err:?}");
}

#[rstest]
fn plan_defaults_are_applied(workspace: PlanWorkspace) {
    let path = workspace.write_plan(&workspace.plan());
    let plan = Plan::load(&path)
        .expect("plan loads")
        .resolve(&path)
        .expect("plan resolves");

    assert_eq!(plan.toolchain, Toolchain::default());
    assert_eq!(
        plan.layout.land_polygons(),
        workspace.path("pbf/land-polygons-split-4326/land_polygons.shp")
    );
    assert_eq!(plan.context.source().as_str(), "planet.osm.pbf");
    assert_eq!(plan.context.zoom_interval_conf(), None);
    assert!(plan.context.simplification().abs() < f64::EPSILON);
    let greece = plan
        .regions
        .first()
        .and_then(|europe| europe.children().first())
        .expect("greece below europe");
    assert_eq!(greece.start_zoom(), 14);
    assert_eq!(greece.preferred_languages(), "en");
    assert_eq!(greece.storage_type(), StorageType::Ram);
}

#[rstest]
#[expect(
    clippy::float_arithmetic,
    reason = "test uses float maths for assertions"
)]
fn plan_overrides_reach_regions_and_context(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["default_start_zoom"] = json!(9);
    plan["default_preferred_languages"] = json!("el,en");
    plan["zoom_interval_conf"] = json!("5,0,7,10,8,11,14,12,21");
    plan["land_simplification"] = json!(0.2);
    let path = workspace.write_plan(&plan);

    let resolved = Plan::load(&path)
        .expect("plan loads")
        .resolve(&path)
        .expect("plan resolves");

    let europe = resolved.regions.first().expect("europe");
    assert_eq!(europe.start_zoom(), 9);
    assert_eq!(europe.preferred_languages(), "el,en");
    assert_eq!(
        resolved.context.zoom_interval_conf(),
        Some("5,0,7,10,8,11,14,12,21")
    );
    assert!((resolved.context.simplification() - 0.2).abs() < f64::EPSILON);
}

#[rstest]
fn blank_zoom_interval_conf_is_omitted(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["zoom_interval_conf"] = json!("");
    let path = workspace.write_plan(&plan);
    let resolved = Plan::load(&path)
        .expect("plan loads")
        .resolve(&path)
        .expect("plan resolves");
    assert_eq!(resolved.context.zoom_interval_conf(), None);
}

#[rstest]
fn unknown_plan_fields_are_rejected(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["osmosis"] = json!("/usr/bin/osmosis");
    let path = workspace.write_plan(&plan);
    let err = Plan::load(&path).expect_err("typo should be rejected");
    assert!(matches!(err, CliError::ParsePlan { .. }), "{err:?}");
}

#[rstest]
fn missing_plan_file_is_reported(workspace: PlanWorkspace) {
    let err = Plan::load(&workspace.path("absent.json")).expect_err("no plan on disk");
    assert!(matches!(err, CliError::ReadPlan { .. }), "{err:?}");
}

#[rstest]
fn negative_simplification_is_rejected(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["land_simplification"] = json!(-0.5);
    let path = workspace.write_plan(&plan);
    let err = Plan::load(&path)
        .expect("plan loads")
        .resolve(&path)
        .expect_err("negative tolerance");
    assert!(matches!(err, CliError::InvalidSimplification { .. }), "{err:?}");
}

#[rstest]
fn duplicate_regions_are_rejected(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["regions"] = json!([{ "name": "europe" }, { "name": "europe" }]);
    let path = workspace.write_plan(&plan);
    let err = Plan::load(&path)
        .expect("plan loads")
        .resolve(&path)
        .expect_err("duplicate sibling");
    match err {
        CliError::InvalidRegions { path: origin, source } => {
            assert_eq!(origin, path);
            assert_eq!(
                source,
                RegionConfigError::DuplicateSibling {
                    path: "europe".to_owned()
                }
            );
        }
        other => panic!("expected InvalidRegions, found {other:?}"),
    }
}

#[rstest]
fn unresolvable_tools_are_reported(workspace: PlanWorkspace) {
    let toolchain = Toolchain {
        osmosis: workspace.path("bin/osmosis"),
        ..Toolchain::default()
    };
    let err = locate_toolchain(&toolchain).expect_err("osmosis is absent");
    match err {
        CliError::MissingExecutable { field, program } => {
            assert_eq!(field, "osmosis_path");
            assert_eq!(program, workspace.path("bin/osmosis"));
        }
        other => panic!("expected MissingExecutable, found {other:?}"),
    }
}

#[rstest]
fn missing_tools_fail_startup_outside_dry_run(workspace: PlanWorkspace) {
    let mut plan = workspace.plan();
    plan["osmosis_path"] = json!(workspace.path("bin/osmosis").as_str());
    let config = BuildConfig {
        plan: workspace.write_plan(&plan),
        dry_run: false,
    };
    let runner = RecordingRunner::default();
    let err = build_plan(&config, &runner).expect_err("tools must resolve");
    assert!(matches!(err, CliError::MissingExecutable { .. }), "{err:?}");
    assert!(runner.invocations().is_empty());
}

#[cfg(unix)]
#[rstest]
fn build_publishes_maps_and_removes_subsets(workspace: PlanWorkspace) {
    let config = BuildConfig {
        plan: workspace.write_plan(&workspace.plan_with_resolvable_tools()),
        dry_run: false,
    };
    let runner = RecordingRunner::default();

    let outcome = build_plan(&config, &runner).expect("build runs");

    assert!(!outcome.error_occurred);
    assert_eq!(outcome.published, 1);
    assert_eq!(workspace.file_len("maps/europe/greece.map"), Some(4));
    assert_eq!(workspace.file_len("pbf/europe.osm.pbf"), None);
    let programs: Vec<_> = runner
        .invocations()
        .into_iter()
        .map(|call| call.program)
        .collect();
    assert!(programs.iter().all(|program| program.as_str() == "/bin/sh"));
}

#[cfg(unix)]
#[rstest]
fn failed_map_is_reported_in_the_outcome(workspace: PlanWorkspace) {
    let config = BuildConfig {
        plan: workspace.write_plan(&workspace.plan_with_resolvable_tools()),
        dry_run: false,
    };
    let runner = RecordingRunner::default().failing_for("greece.map");

    let outcome = build_plan(&config, &runner).expect("startup succeeds");

    assert!(outcome.error_occurred);
    assert_eq!(outcome.published, 0);
    assert_eq!(workspace.file_len("maps/europe/greece.map"), None);
    assert_eq!(workspace.file_len("pbf/europe.osm.pbf"), Some(4));
}

#[cfg(unix)]
#[rstest]
fn land_archive_is_unpacked_before_building(workspace: PlanWorkspace) {
    workspace.write_land_archive("shapes");
    let config = BuildConfig {
        plan: workspace.write_plan(&workspace.plan_with_resolvable_tools()),
        dry_run: false,
    };

    build_plan(&config, &RecordingRunner::default()).expect("build runs");

    assert_eq!(
        workspace.file_len("pbf/land-polygons-split-4326/land_polygons.shp"),
        Some(6)
    );
}

#[cfg(unix)]
#[rstest]
fn corrupt_land_archive_fails_startup(workspace: PlanWorkspace) {
    workspace.write("pbf/land-polygons-split-4326.zip", "truncated");
    let config = BuildConfig {
        plan: workspace.write_plan(&workspace.plan_with_resolvable_tools()),
        dry_run: false,
    };
    let runner = RecordingRunner::default();

    let err = build_plan(&config, &runner).expect_err("archive is unreadable");

    assert!(matches!(err, CliError::UnpackLandArchive { .. }), "{err:?}");
    assert!(runner.invocations().is_empty());
}

#[rstest]
fn dry_run_stages_maps_without_publishing(workspace: PlanWorkspace) {
    workspace.write_land_archive("shapes");
    let config = BuildConfig {
        plan: workspace.write_plan(&workspace.plan()),
        dry_run: true,
    };

    let outcome = build_plan(&config, &RecordingRunner::default()).expect("dry run");

    assert!(!outcome.error_occurred);
    assert_eq!(outcome.published, 0);
    assert_eq!(workspace.file_len("map-staging/europe/greece.map"), Some(0));
    assert_eq!(workspace.file_len("maps/europe/greece.map"), None);
    assert_eq!(
        workspace.file_len("pbf/land-polygons-split-4326/land_polygons.shp"),
        None
    );
}
