//! Test helpers staging plan files and their inputs on disk.

use camino::Utf8PathBuf;
use regiomap_core::BuildOutcome;
use regiomap_data::CommandRunner;
use serde_json::{Value, json};
use std::io::Write;
use tempfile::TempDir;
use zip::{ZipWriter, write::FileOptions};

use crate::build::{BuildConfig, execute_build};
use crate::{CliError, Plan};

/// Load the plan named by `config` and build it with `runner`.
pub(super) fn build_plan<R: CommandRunner>(
    config: &BuildConfig,
    runner: R,
) -> Result<BuildOutcome, CliError> {
    let plan = Plan::load(&config.plan)?.resolve(&config.plan)?;
    execute_build(config, plan, runner)
}

const EUROPE_POLY: &str = "europe\n1\n-10 35\n40 35\n40 70\n-10 70\n-10 35\nEND\nEND\n";
const GREECE_POLY: &str = "greece\n1\n20 35\n28 35\n28 42\n20 42\n20 35\nEND\nEND\n";

/// Temporary build root holding a planet extract, polygons and a plan.
pub(super) struct PlanWorkspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl PlanWorkspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let workspace = Self { _dir: dir, root };
        workspace.write("pbf/planet.osm.pbf", "planet");
        workspace.write("polygons/europe.poly", EUROPE_POLY);
        workspace.write("polygons/europe/greece.poly", GREECE_POLY);
        workspace
    }

    pub(super) fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    pub(super) fn write(&self, relative: &str, contents: &str) {
        regiomap_fs::write_file(&self.path(relative), contents).expect("write fixture file");
    }

    /// Plan where europe carves a subset and greece builds a map from it.
    pub(super) fn plan(&self) -> Value {
        json!({
            "initial_source_pbf": "planet.osm.pbf",
            "pbf_staging_path": self.path("pbf").as_str(),
            "map_staging_path": self.path("map-staging").as_str(),
            "polygons_path": self.path("polygons").as_str(),
            "map_target_path": self.path("maps").as_str(),
            "logging_path": self.path("logs").as_str(),
            "regions": [{
                "name": "europe",
                "creates_data_subset": true,
                "creates_map_artifact": false,
                "children": [{ "name": "greece" }]
            }]
        })
    }

    /// Plan running every tool through `/bin/sh`, which always resolves.
    pub(super) fn plan_with_resolvable_tools(&self) -> Value {
        let mut plan = self.plan();
        for field in ["osmosis_path", "ogr2ogr_path", "converter_path"] {
            plan[field] = json!("/bin/sh");
        }
        plan
    }

    /// Zip a land polygon shapefile where the build expects the archive.
    pub(super) fn write_land_archive(&self, shapes: &str) {
        regiomap_fs::ensure_dir(&self.path("pbf")).expect("create staging root");
        let file = std::fs::File::create(self.path("pbf/land-polygons-split-4326.zip"))
            .expect("create archive");
        let mut writer = ZipWriter::new(file);
        writer
            .start_file(
                "land-polygons-split-4326/land_polygons.shp",
                FileOptions::default(),
            )
            .expect("start entry");
        writer.write_all(shapes.as_bytes()).expect("write entry");
        writer.finish().expect("finish archive");
    }

    pub(super) fn write_plan(&self, plan: &Value) -> Utf8PathBuf {
        self.write("plan.json", &plan.to_string());
        self.path("plan.json")
    }

    pub(super) fn file_len(&self, relative: &str) -> Option<u64> {
        regiomap_fs::file_len(&self.path(relative)).expect("stat fixture file")
    }
}
