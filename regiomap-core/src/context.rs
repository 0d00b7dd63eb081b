//! Per-level build state threaded down the region hierarchy.

use camino::{Utf8Path, Utf8PathBuf};

use crate::RegionNode;

/// Immutable state inherited by every region at one level of the tree.
///
/// Paths are relative: the source PBF to the PBF staging root, the staging
/// prefix to every staging root, the target prefix to the publication root.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
    source: Utf8PathBuf,
    staging_prefix: Utf8PathBuf,
    target_prefix: Utf8PathBuf,
    zoom_interval_conf: Option<String>,
    simplification: f64,
}

impl BuildContext {
    /// Context for the top of the hierarchy, reading from `source`.
    pub fn root(source: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source: source.into(),
            staging_prefix: Utf8PathBuf::new(),
            target_prefix: Utf8PathBuf::new(),
            zoom_interval_conf: None,
            simplification: 0.0,
        }
    }

    /// Attach the map writer's zoom interval configuration. Blank values are
    /// treated as absent.
    #[must_use]
    pub fn with_zoom_interval_conf(mut self, conf: Option<String>) -> Self {
        self.zoom_interval_conf = conf.filter(|value| !value.trim().is_empty());
        self
    }

    /// Attach the land polygon simplification tolerance in degrees.
    #[must_use]
    pub fn with_simplification(mut self, tolerance: f64) -> Self {
        self.simplification = tolerance;
        self
    }

    /// Source PBF regions at this level read from.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Hierarchical staging prefix, empty at the top level.
    #[must_use]
    pub fn staging_prefix(&self) -> &Utf8Path {
        &self.staging_prefix
    }

    /// Publication prefix, empty at the top level.
    #[must_use]
    pub fn target_prefix(&self) -> &Utf8Path {
        &self.target_prefix
    }

    /// Zoom interval configuration handed to the map writer.
    #[must_use]
    pub fn zoom_interval_conf(&self) -> Option<&str> {
        self.zoom_interval_conf.as_deref()
    }

    /// Land polygon simplification tolerance; zero disables simplification.
    #[must_use]
    pub const fn simplification(&self) -> f64 {
        self.simplification
    }

    /// Context for the children of `node`, which read from `source`.
    #[must_use]
    pub fn descend(&self, node: &RegionNode, source: Utf8PathBuf) -> Self {
        let target_prefix = if node.defines_hierarchy_level() {
            self.target_prefix.join(node.name())
        } else {
            self.target_prefix.clone()
        };
        Self {
            source,
            staging_prefix: self.staging_prefix.join(node.name()),
            target_prefix,
            zoom_interval_conf: self.zoom_interval_conf.clone(),
            simplification: self.simplification,
        }
    }
}

/// A region paired with the context it is processed in.
#[derive(Debug, Clone, Copy)]
pub struct RegionJob<'a> {
    node: &'a RegionNode,
    context: &'a BuildContext,
}

impl<'a> RegionJob<'a> {
    /// Pair `node` with the context inherited from its parent.
    #[must_use]
    pub const fn new(node: &'a RegionNode, context: &'a BuildContext) -> Self {
        Self { node, context }
    }

    /// The region being processed.
    #[must_use]
    pub const fn node(&self) -> &'a RegionNode {
        self.node
    }

    /// The inherited context.
    #[must_use]
    pub const fn context(&self) -> &'a BuildContext {
        self.context
    }

    /// Region name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    /// Full hierarchical name, e.g. `europe/greece`.
    #[must_use]
    pub fn hierarchical_name(&self) -> Utf8PathBuf {
        self.context.staging_prefix().join(self.node.name())
    }

    /// Hierarchical name flattened into a single file stem, e.g.
    /// `europe-greece`.
    #[must_use]
    pub fn flat_name(&self) -> String {
        self.hierarchical_name().as_str().replace('/', "-")
    }

    /// Whether the map build must filter the source by the region polygon.
    ///
    /// No filter is needed when a subset is carved for this region or the
    /// inherited source already is this region's extract.
    #[must_use]
    pub fn needs_area_filter(&self) -> bool {
        let inherited_extract = self
            .context
            .source()
            .file_name()
            .is_some_and(|file| file.starts_with(self.node.name()));
        !(self.node.creates_data_subset() || inherited_extract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RegionDefaults, RegionSpec, resolve_regions};
    use rstest::rstest;

    fn node(spec: RegionSpec) -> RegionNode {
        resolve_regions(&[spec], &RegionDefaults::default())
            .expect("valid spec")
            .remove(0)
    }

    #[rstest]
    fn hierarchy_level_extends_target_prefix() {
        let europe = node(RegionSpec::named("europe"));
        let root = BuildContext::root("planet.osm.pbf");
        let child = root.descend(&europe, Utf8PathBuf::from("europe.osm.pbf"));
        assert_eq!(child.target_prefix().as_str(), "europe");
        assert_eq!(child.staging_prefix().as_str(), "europe");
        assert_eq!(child.source().as_str(), "europe.osm.pbf");
    }

    #[rstest]
    fn flat_regions_keep_target_prefix_but_extend_staging() {
        let europe = node(RegionSpec::named("europe"));
        let grouping = node(RegionSpec {
            defines_hierarchy_level: Some(false),
            ..RegionSpec::named("balkans")
        });
        let level_one = BuildContext::root("planet.osm.pbf")
            .descend(&europe, Utf8PathBuf::from("planet.osm.pbf"));
        let level_two = level_one.descend(&grouping, Utf8PathBuf::from("planet.osm.pbf"));
        assert_eq!(level_two.target_prefix().as_str(), "europe");
        assert_eq!(level_two.staging_prefix().as_str(), "europe/balkans");
    }

    #[rstest]
    #[expect(
        clippy::float_arithmetic,
        reason = "test uses float maths for assertions"
    )]
    fn descend_keeps_plan_wide_options() {
        let europe = node(RegionSpec::named("europe"));
        let root = BuildContext::root("planet.osm.pbf")
            .with_zoom_interval_conf(Some("5,0,7,10,8,11".to_owned()))
            .with_simplification(0.2);
        let child = root.descend(&europe, Utf8PathBuf::from("planet.osm.pbf"));
        assert_eq!(child.zoom_interval_conf(), Some("5,0,7,10,8,11"));
        assert!((child.simplification() - 0.2).abs() < f64::EPSILON);
        assert_eq!(root.staging_prefix().as_str(), "", "ancestor context is untouched");
    }

    #[rstest]
    fn blank_zoom_interval_conf_is_absent() {
        let root = BuildContext::root("planet.osm.pbf").with_zoom_interval_conf(Some("  ".into()));
        assert_eq!(root.zoom_interval_conf(), None);
    }

    #[rstest]
    #[case(false, "planet.osm.pbf", true)]
    #[case(true, "planet.osm.pbf", false)]
    #[case(false, "europe/greece.osm.pbf", false)]
    #[case(false, "greece-latest.osm.pbf", false)]
    #[case(false, "europe.osm.pbf", true)]
    fn area_filter_depends_on_subset_flag_and_source_name(
        #[case] subset: bool,
        #[case] source: &str,
        #[case] expected: bool,
    ) {
        let greece = node(RegionSpec {
            creates_data_subset: Some(subset),
            ..RegionSpec::named("greece")
        });
        let context = BuildContext::root(source);
        assert_eq!(RegionJob::new(&greece, &context).needs_area_filter(), expected);
    }

    #[rstest]
    fn nested_names_are_qualified_and_flattened() {
        let europe = node(RegionSpec::named("europe"));
        let greece = node(RegionSpec::named("greece"));
        let context = BuildContext::root("planet.osm.pbf")
            .descend(&europe, Utf8PathBuf::from("europe.osm.pbf"));
        let job = RegionJob::new(&greece, &context);
        assert_eq!(job.hierarchical_name().as_str(), "europe/greece");
        assert_eq!(job.flat_name(), "europe-greece");
    }
}
