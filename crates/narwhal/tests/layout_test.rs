use narwhal::{
    Diagnostic, Error, Graph, GraphSpec, LayoutOptions, LayoutResult, LayoutState, NodeSpec,
    Strategy, layout,
};

const EPS: f64 = 1e-3;

fn fruit_graph() -> GraphSpec {
    let mut spec = GraphSpec::default();
    for id in ["apple", "lemon", "banana", "sugar", "fruit", "sweet", "sour"] {
        spec = spec.node(id);
    }
    spec.related("apple", "fruit")
        .related("apple", "sweet")
        .related("lemon", "fruit")
        .related("lemon", "sour")
        .related("banana", "fruit")
        .related("banana", "sweet")
        .related("sugar", "sweet")
}

fn tree_graph() -> GraphSpec {
    GraphSpec::default()
        .node("root")
        .node("a")
        .node("b")
        .node("a1")
        .node("a2")
        .node("b1")
        .node("b2")
        .depends_on("a", ["root"])
        .depends_on("b", ["root"])
        .depends_on("a1", ["a"])
        .depends_on("a2", ["a"])
        .depends_on("b1", ["b"])
        .depends_on("b2", ["b"])
}

/// Two roots feeding a shared child, a second child of one root and a wide leaf, the shape
/// of a small service map.
fn services_graph() -> GraphSpec {
    let mut spec = GraphSpec::default()
        .node("db")
        .node("cache")
        .node("api")
        .node("worker")
        .depends_on("api", ["db", "cache"])
        .depends_on("worker", ["db"])
        .related("api", "worker");
    spec.nodes.push(NodeSpec::new("web").with_size(140.0, 40.0));
    spec.depends_on("web", ["api"])
}

/// Relations only, linking each node to the next, so every node shares level 0.
fn flat_chain(len: usize) -> GraphSpec {
    let mut spec = GraphSpec::default();
    for i in 0..len {
        spec = spec.node(format!("n{i:02}"));
    }
    for i in 1..len {
        spec = spec.related(format!("n{:02}", i - 1), format!("n{i:02}"));
    }
    spec
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

/// Every node draws a target level below `depth`; non-roots take one or two parents among
/// earlier nodes on shallower levels. A third as many random relations are sprinkled on top.
fn random_layered(seed: u64, node_count: usize, depth: usize) -> GraphSpec {
    let mut rng = Lcg(seed);
    let id = |i: usize| format!("n{i:02}");
    let mut spec = GraphSpec::default();
    for i in 0..node_count {
        spec = spec.node(id(i));
    }
    let mut target = vec![0];
    target.extend((1..node_count).map(|_| rng.next(depth)));
    for child in 1..node_count {
        let candidates: Vec<usize> = (0..child).filter(|&p| target[p] < target[child]).collect();
        if candidates.is_empty() {
            continue;
        }
        for _ in 0..1 + rng.next(2) {
            let parent = candidates[rng.next(candidates.len())];
            spec = spec.depends_on(id(child), [id(parent)]);
        }
    }
    for _ in 0..node_count / 3 {
        let a = rng.next(node_count);
        let b = rng.next(node_count);
        if a != b {
            spec = spec.related(id(a), id(b));
        }
    }
    spec
}

fn node_size(spec: &GraphSpec, id: &str, opts: &LayoutOptions) -> (f64, f64) {
    let node = spec.nodes.iter().find(|n| n.id == id).expect("node in spec");
    (
        node.width.unwrap_or(opts.default_node_width),
        node.height.unwrap_or(opts.default_node_height),
    )
}

fn assert_in_bounds(spec: &GraphSpec, result: &LayoutResult, opts: &LayoutOptions) {
    let pad = opts.container_padding;
    for (id, p) in &result.positions {
        let (w, h) = node_size(spec, id, opts);
        assert!(
            p.x - w / 2.0 >= pad - EPS && p.x + w / 2.0 <= opts.container_width - pad + EPS,
            "{id} leaves the canvas horizontally: {p:?}"
        );
        assert!(
            p.y - h / 2.0 >= pad - EPS && p.y + h / 2.0 <= opts.container_height - pad + EPS,
            "{id} leaves the canvas vertically: {p:?}"
        );
    }
}

fn assert_separated(spec: &GraphSpec, result: &LayoutResult, opts: &LayoutOptions) {
    let entries: Vec<_> = result.positions.iter().collect();
    for (i, (a_id, a)) in entries.iter().enumerate() {
        for (b_id, b) in &entries[i + 1..] {
            let (aw, ah) = node_size(spec, a_id, opts);
            let (bw, bh) = node_size(spec, b_id, opts);
            let spacing = opts.min_dist.max(aw.max(ah) / 2.0 + bw.max(bh) / 2.0);
            let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
            assert!(
                d >= spacing - EPS,
                "{a_id} and {b_id} are {d} apart, expected at least {spacing}"
            );
        }
    }
}

fn assert_hierarchy(spec: &GraphSpec, result: &LayoutResult, opts: &LayoutOptions) {
    for dep in &spec.dependencies {
        let child = result.positions[&dep.child];
        for parent in dep.parents.iter() {
            let p = result.positions[parent];
            assert!(
                child.y >= p.y + opts.level_offset - EPS,
                "{} (y={}) is not below {} (y={})",
                dep.child,
                child.y,
                parent,
                p.y
            );
            assert!(child.level > p.level);
        }
    }
}

#[test]
fn flat_relation_graph_spreads_out_with_either_seed() {
    let spec = fruit_graph();
    for strategy in [Strategy::Row, Strategy::Radial] {
        let opts = LayoutOptions {
            strategy,
            ..Default::default()
        };
        let result = layout(&spec, &opts).expect("layout");
        assert_eq!(result.positions.len(), 7);
        assert_eq!(result.levels.len(), 1);
        assert!(result.positions.values().all(|p| p.level == 0));
        assert!(result.diagnostics.is_empty());
        assert_in_bounds(&spec, &result, &opts);
        assert_separated(&spec, &result, &opts);
    }
}

#[test]
fn flat_relation_graph_with_relation_springs_stays_valid() {
    let spec = fruit_graph();
    let opts = LayoutOptions {
        relation_attraction: true,
        strategy: Strategy::Radial,
        ..Default::default()
    };
    let result = layout(&spec, &opts).expect("layout");
    assert_in_bounds(&spec, &result, &opts);
    assert_separated(&spec, &result, &opts);
}

#[test]
fn three_level_chain_is_ordered_top_to_bottom() {
    let spec = GraphSpec::default()
        .node("A")
        .node("B")
        .node("C")
        .depends_on("C", ["B"])
        .depends_on("B", ["A"]);
    let opts = LayoutOptions::default();
    let result = layout(&spec, &opts).expect("layout");

    assert_eq!(result.level("A"), Some(0));
    assert_eq!(result.level("B"), Some(1));
    assert_eq!(result.level("C"), Some(2));

    let y = |id: &str| result.positions[id].y;
    assert!(y("C") > y("B") && y("B") > y("A"));
    assert_hierarchy(&spec, &result, &opts);
    assert_in_bounds(&spec, &result, &opts);
}

#[test]
fn tree_respects_every_constraint() {
    let spec = tree_graph();
    for strategy in [Strategy::Row, Strategy::Radial] {
        let opts = LayoutOptions {
            strategy,
            ..Default::default()
        };
        let result = layout(&spec, &opts).expect("layout");
        assert_eq!(
            result.levels,
            vec![
                vec!["root".to_string()],
                vec!["a".to_string(), "b".to_string()],
                vec![
                    "a1".to_string(),
                    "a2".to_string(),
                    "b1".to_string(),
                    "b2".to_string()
                ],
            ]
        );
        assert_hierarchy(&spec, &result, &opts);
        assert_separated(&spec, &result, &opts);
        assert_in_bounds(&spec, &result, &opts);
    }
}

#[test]
fn layout_is_deterministic() {
    let spec = tree_graph();
    let opts = LayoutOptions::default();
    let first = layout(&spec, &opts).expect("layout");
    let second = layout(&spec, &opts).expect("layout");
    assert_eq!(first, second);

    let mut graph = Graph::from_spec(&spec);
    let a = graph.layout(&opts).expect("layout").clone();
    let b = graph.layout(&opts).expect("layout").clone();
    for (id, p) in &a.positions {
        let q = b.positions[id];
        assert!((p.x - q.x).abs() < 1e-9 && (p.y - q.y).abs() < 1e-9);
    }
}

#[test]
fn cyclic_dependencies_degrade_instead_of_failing() {
    let spec = GraphSpec::default()
        .node("A")
        .node("B")
        .node("C")
        .depends_on("A", ["B"])
        .depends_on("B", ["A"])
        .depends_on("C", ["A"]);
    let opts = LayoutOptions::default();
    let result = layout(&spec, &opts).expect("layout");
    assert!(result.has_cycle_warning());
    assert_eq!(result.positions.len(), 3);
    assert_in_bounds(&spec, &result, &opts);
}

#[test]
fn unknown_endpoints_are_reported_and_skipped() {
    let spec = GraphSpec::default()
        .node("A")
        .node("B")
        .depends_on("B", ["A", "Z"])
        .related("A", "Q");
    let result = layout(&spec, &LayoutOptions::default()).expect("layout");
    assert_eq!(result.level("B"), Some(1));
    let unknown: Vec<&str> = result
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::Skipped {
                error: Error::UnknownNode { id, .. },
            } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(unknown, vec!["Z", "Q"]);
}

#[test]
fn empty_and_single_node_graphs() {
    let opts = LayoutOptions::default();
    let empty = layout(&GraphSpec::default(), &opts).expect("layout");
    assert!(empty.positions.is_empty());
    assert!(empty.levels.is_empty());

    let single = layout(&GraphSpec::default().node("only"), &opts).expect("layout");
    let p = single.positions["only"];
    assert!((p.x - opts.container_width / 2.0).abs() < 1e-9);
    assert!((p.y - opts.container_height / 2.0).abs() < 1e-9);
}

#[test]
fn invalid_options_are_rejected_before_running() {
    let opts = LayoutOptions {
        iterations: 0,
        ..Default::default()
    };
    let err = layout(&GraphSpec::default().node("a"), &opts).unwrap_err();
    assert!(matches!(err, Error::InvalidOption { .. }));
}

#[test]
fn resizing_a_node_invalidates_and_widens_its_spacing() {
    let spec = GraphSpec::default().node("left").node("right").node("third");
    let opts = LayoutOptions::default();
    let mut graph = Graph::from_spec(&spec);
    graph.layout(&opts).expect("layout");
    assert_eq!(graph.state(), LayoutState::Fresh);

    graph.set_node_size("left", 240.0, 40.0).expect("resize");
    assert_eq!(graph.state(), LayoutState::Stale);
    let result = graph.ensure_layout(&opts).expect("layout").clone();

    let mut resized = spec.clone();
    resized.nodes[0] = NodeSpec::new("left").with_size(240.0, 40.0);
    assert_separated(&resized, &result, &opts);
    assert_in_bounds(&resized, &result, &opts);
}

#[test]
fn early_exit_reports_fewer_iterations() {
    let opts = LayoutOptions {
        iterations: 2_000,
        convergence_epsilon: Some(1e-4),
        ..Default::default()
    };
    let result = layout(&tree_graph(), &opts).expect("layout");
    assert!(result.iterations <= 2_000);
    let full = layout(
        &tree_graph(),
        &LayoutOptions {
            iterations: 2_000,
            ..Default::default()
        },
    )
    .expect("layout");
    assert_eq!(full.iterations, 2_000);
}

#[test]
fn shared_children_keep_their_parents_above_them() {
    let spec = services_graph();
    for strategy in [Strategy::Row, Strategy::Radial] {
        for (level_offset, iterations) in [(100.0, 300), (120.0, 200)] {
            let opts = LayoutOptions {
                strategy,
                level_offset,
                iterations,
                ..Default::default()
            };
            let result = layout(&spec, &opts).expect("layout");
            assert_eq!(result.level("web"), Some(2));
            assert!(!result.has_unmet_constraints(), "{strategy:?}/{level_offset}");
            assert_hierarchy(&spec, &result, &opts);
            assert_separated(&spec, &result, &opts);
            assert_in_bounds(&spec, &result, &opts);
        }
    }
}

#[test]
fn wide_single_level_rows_do_not_pile_up() {
    for len in [12, 20] {
        let spec = flat_chain(len);
        for strategy in [Strategy::Row, Strategy::Radial] {
            let opts = LayoutOptions {
                strategy,
                ..Default::default()
            };
            let result = layout(&spec, &opts).expect("layout");
            assert_eq!(result.levels.len(), 1);
            assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
            assert_separated(&spec, &result, &opts);
            assert_in_bounds(&spec, &result, &opts);
        }
    }
}

#[test]
fn generated_graphs_meet_every_constraint_together() {
    for seed in 1..=30u64 {
        let node_count = 20 + (seed % 11) as usize;
        let spec = random_layered(seed, node_count, 4);
        for strategy in [Strategy::Row, Strategy::Radial] {
            for relation_attraction in [false, true] {
                let opts = LayoutOptions {
                    strategy,
                    relation_attraction,
                    container_width: 1200.0,
                    container_height: 900.0,
                    ..Default::default()
                };
                let result = layout(&spec, &opts).expect("layout");
                assert_eq!(result.positions.len(), node_count);
                assert!(
                    !result.has_unmet_constraints(),
                    "seed {seed}, {strategy:?}, relation springs {relation_attraction}"
                );
                assert_in_bounds(&spec, &result, &opts);
                assert_separated(&spec, &result, &opts);
                assert_hierarchy(&spec, &result, &opts);
            }
        }
    }
}

#[test]
fn impossible_constraints_are_reported_and_stay_in_bounds() {
    // Six offsets of 100 need more height than the default canvas has.
    let mut spec = GraphSpec::default();
    for i in 0..7 {
        spec = spec.node(format!("c{i}"));
    }
    for i in 1..7 {
        spec = spec.depends_on(format!("c{i}"), [format!("c{}", i - 1)]);
    }
    for strategy in [Strategy::Row, Strategy::Radial] {
        let opts = LayoutOptions {
            strategy,
            ..Default::default()
        };
        let result = layout(&spec, &opts).expect("layout");
        assert!(result.has_unmet_constraints());
        assert!(result.diagnostics.contains(&Diagnostic::ConstraintsUnmet {
            passes: opts.settle_passes
        }));
        assert!(!result.has_cycle_warning());
        assert_in_bounds(&spec, &result, &opts);
    }
}
