use crate::*;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cat {
    Group,
    Item,
    Wrap,
    Branch,
}

fn classify(label: &&'static str) -> Cat {
    if *label == "if" {
        Cat::Wrap
    } else if label.starts_with("when") || *label == "else" {
        Cat::Branch
    } else if *label == "room" || *label == "name" {
        Cat::Group
    } else {
        Cat::Item
    }
}

fn options() -> TagTreeOptions<&'static str, Cat> {
    TagTreeOptions::new(classify).with_wrappers(|label: &&'static str| *label == "if")
}

fn n(label: &'static str, children: Vec<TreeNode<&'static str>>) -> TreeNode<&'static str> {
    TreeNode::new(label).with_children(children)
}

fn leaf(label: &'static str) -> TreeNode<&'static str> {
    TreeNode::new(label)
}

fn is(label: &'static str) -> TagTreeMatch<&'static str> {
    TagTreeMatch::exact(label)
}

fn labels(lists: &[TagList<&'static str>]) -> Vec<Vec<&'static str>> {
    lists
        .iter()
        .map(|list| list.iter().map(|entry| entry.data).collect())
        .collect()
}

fn conditional_exits() -> Tree<&'static str> {
    vec![n(
        "room",
        vec![
            n("name", vec![leaf("a")]),
            n(
                "if",
                vec![
                    n("when:c", vec![leaf("exit1")]),
                    n("else", vec![leaf("exit2")]),
                ],
            ),
        ],
    )]
}

#[test]
fn test_flatten_and_fold_is_lossless() {
    let tree = conditional_exits();
    let engine = TagTree::new(&tree, options()).unwrap();
    assert_eq!(engine.tree(), tree);
    assert_eq!(
        labels(&engine.tag_list()),
        vec![
            vec!["room", "name", "a"],
            vec!["room", "if", "when:c", "exit1"],
            vec!["room", "if", "else", "exit2"],
        ]
    );
}

#[test]
fn test_same_instance_merges_even_when_compare_never_matches() {
    let tree = conditional_exits();
    let engine = TagTree::new(&tree, options().with_compare(|_, _| false)).unwrap();
    assert_eq!(engine.tree(), tree);
}

#[test]
fn test_filter_keeps_placeholder_for_dropped_branch() {
    let engine = TagTree::new(&conditional_exits(), options()).unwrap();

    let first = engine.filter(is("exit1")).tree();
    assert_eq!(
        first,
        vec![n(
            "room",
            vec![n("if", vec![n("when:c", vec![leaf("exit1")]), leaf("else")])]
        )]
    );

    let second = engine.filter(is("exit2")).tree();
    assert_eq!(
        second,
        vec![n(
            "room",
            vec![n("if", vec![leaf("when:c"), n("else", vec![leaf("exit2")])])]
        )]
    );
}

#[test]
fn test_filter_drops_wrapper_group_without_survivors() {
    let engine = TagTree::new(&conditional_exits(), options()).unwrap();
    let tree = engine.filter(is("a")).tree();
    assert_eq!(tree, vec![n("room", vec![n("name", vec![leaf("a")])])]);

    assert!(engine.filter(is("missing")).tree().is_empty());
}

#[test]
fn test_filter_output_is_structural_subset() {
    let engine = TagTree::new(&conditional_exits(), options()).unwrap();
    let original = labels(&engine.tag_list());

    for expr in [is("exit1"), is("exit2"), is("a"), TagTreeMatch::any()] {
        for path in labels(&engine.filter(expr).tag_list()) {
            let from_source = original
                .iter()
                .any(|source| source.len() >= path.len() && source[..path.len()] == path[..]);
            assert!(from_source, "unexpected path {:?}", path);
        }
    }
}

#[test]
fn test_prune_forgets_a_level() {
    let engine = TagTree::new(&conditional_exits(), options()).unwrap();
    let tree = engine.filter(is("a")).prune(is("name")).tree();
    assert_eq!(tree, vec![n("room", vec![leaf("a")])]);
}

#[test]
fn test_prune_drops_paths_that_become_empty() {
    let tree = vec![leaf("room"), n("name", vec![leaf("a")])];
    let engine = TagTree::new(&tree, options()).unwrap();
    assert_eq!(engine.prune(is("room")).tree(), vec![n("name", vec![leaf("a")])]);
}

#[test]
fn test_reordered_moves_matches_to_window_front() {
    let tree = vec![n(
        "if",
        vec![n("when:c", vec![n("room", vec![n("name", vec![leaf("b")])])])],
    )];
    let engine = TagTree::new(&tree, options()).unwrap();
    let reordered = engine.reordered(vec![
        is("room"),
        is("name"),
        TagTreeMatch::predicate(|label: &&'static str| *label == "if" || label.starts_with("when")),
    ]);

    assert_eq!(
        labels(&reordered.tag_list()),
        vec![vec!["room", "name", "if", "when:c", "b"]]
    );
    assert_eq!(
        reordered.tree(),
        vec![n("room", vec![n("name", vec![n("if", vec![n("when:c", vec![leaf("b")])])])])]
    );
}

#[test]
fn test_reordered_is_stable_outside_matches() {
    let tree = vec![n("x", vec![n("y", vec![n("room", vec![leaf("z")])])])];
    let engine = TagTree::new(&tree, options()).unwrap();
    let lists = engine.reordered(vec![is("room")]).tag_list();
    assert_eq!(labels(&lists), vec![vec!["x", "y", "room", "z"]]);

    let lists = engine.reordered(vec![is("room"), is("x")]).tag_list();
    assert_eq!(labels(&lists), vec![vec!["room", "x", "y", "z"]]);
}

#[test]
fn test_merge_search_stops_at_order_dependent_sibling() {
    let tree = vec![
        n("room", vec![n("name", vec![leaf("a")]), leaf("exit1")]),
        n("room", vec![n("name", vec![leaf("b")])]),
    ];

    let strict = TagTree::new(&tree, options()).unwrap().tree();
    assert_eq!(
        strict,
        vec![n(
            "room",
            vec![n("name", vec![leaf("a")]), leaf("exit1"), n("name", vec![leaf("b")])]
        )]
    );

    let relaxed = TagTree::new(
        &tree,
        options().with_order_independence(vec![vec![Cat::Group, Cat::Item]]),
    )
    .unwrap()
    .tree();
    assert_eq!(
        relaxed,
        vec![n("room", vec![n("name", vec![leaf("a"), leaf("b")]), leaf("exit1")])]
    );
}

#[test]
fn test_reordered_siblings_inserts_by_rank() {
    let tree = vec![n("room", vec![leaf("exit1")]), n("room", vec![n("name", vec![leaf("a")])])];
    let engine = TagTree::new(
        &tree,
        options().with_order_independence(vec![vec![Cat::Group, Cat::Item]]),
    )
    .unwrap()
    .reordered_siblings(vec![Cat::Group, Cat::Item]);

    assert_eq!(
        engine.tree(),
        vec![n("room", vec![n("name", vec![leaf("a")]), leaf("exit1")])]
    );
}

#[test]
fn test_wrappers_never_merge_across_instances() {
    let tree = vec![
        n("room", vec![n("if", vec![n("when:c", vec![leaf("exit1")])])]),
        n("room", vec![n("if", vec![n("when:c", vec![leaf("exit2")])])]),
    ];
    let merged = TagTree::new(&tree, options()).unwrap().tree();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].children.len(), 2);
    assert!(merged[0].children.iter().all(|child| child.data == "if"));
}

#[test]
fn test_default_merge_keeps_known_id() {
    let tree = vec![
        TreeNode::new("room").with_extra(NodeExtra::with_id("r1")),
        n("room", vec![leaf("name")]),
    ];
    let merged = TagTree::new(&tree, options()).unwrap().tree();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].extra.id.as_deref(), Some("r1"));
    assert_eq!(merged[0].children, vec![leaf("name")]);
}

#[test]
fn test_custom_merge_is_applied() {
    let tree = vec![
        TreeNode::new("room").with_extra(NodeExtra::inherited()),
        TreeNode::new("room"),
    ];
    let options = options().with_merge(|existing, incoming| {
        (incoming.data, NodeExtra {
            id: None,
            inherited: existing.extra.inherited && incoming.extra.inherited,
        })
    });
    let merged = TagTree::new(&tree, options).unwrap().tree();
    assert_eq!(merged, vec![leaf("room")]);
}

#[test]
fn test_terminal_wrapper_is_rejected() {
    let tree = vec![n("room", vec![leaf("if")])];
    let result = TagTree::new(&tree, options());
    assert_eq!(result.err(), Some(TagTreeError::MalformedWrapper { depth: 1 }));
}

#[test]
fn test_depth_guard() {
    let mut node = leaf("x");
    for _ in 0..MAX_DEPTH {
        node = n("x", vec![node]);
    }
    let result = TagTree::new(&vec![node], options());
    assert_eq!(result.err(), Some(TagTreeError::DepthExceeded { max_depth: MAX_DEPTH }));
}

#[test]
fn test_from_tag_lists_round_trips() {
    let engine = TagTree::new(&conditional_exits(), options()).unwrap();
    let rebuilt = TagTree::from_tag_lists(engine.tag_list(), options()).unwrap();
    assert_eq!(rebuilt.tree(), conditional_exits());
}

#[test]
fn test_group_by_root_splits_top_level_subtrees() {
    let tree = vec![n("room", vec![leaf("a"), leaf("b")]), n("room", vec![leaf("c")])];
    let lists = TagTree::new(&tree, options()).unwrap().tag_list();
    let groups = group_by_root(&lists);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[1].len(), 1);
}
