use crate::{standardize, ContainerKind, ImportOrigin, StandardizeError, StandardForm};
use wml_schema::{
    identifiers, matchers, node, select_branch, text, BranchSelection, EntityKind, FieldKind, Keyed, SchemaError, Tag,
    TagNode, WmlTree,
};
use wml_tagtree::TagTreeMatch;

fn asset(key: &str, children: Vec<TagNode>) -> WmlTree {
    vec![node(Tag::asset(key), children)]
}

fn room(key: &str, children: Vec<TagNode>) -> TagNode {
    node(Tag::room(key), children)
}

fn name(children: Vec<TagNode>) -> TagNode {
    node(Tag::Name, children)
}

fn description(children: Vec<TagNode>) -> TagNode {
    node(Tag::Description, children)
}

fn when(condition: &str, children: Vec<TagNode>) -> TagNode {
    node(Tag::If, vec![node(Tag::statement(condition), children)])
}

fn exit(from: &str, to: &str) -> TagNode {
    node(
        Tag::Exit {
            key: format!("{from}#{to}"),
            to: to.to_string(),
        },
        vec![],
    )
}

fn field(form: &StandardForm, key: &str, field: FieldKind) -> Vec<TagNode> {
    form.component(key)
        .and_then(|component| component.field(field))
        .map(|node| node.children.clone())
        .unwrap_or_default()
}

#[test]
fn test_conditional_overlay_lands_inside_field() {
    let base = asset("a", vec![room("x", vec![name(vec![text("A")])])]);
    let overlay = asset("a", vec![when("c", vec![room("x", vec![name(vec![text("B")])])])]);

    let form = standardize(vec![base, overlay]).unwrap();

    assert_eq!(form.keys(), &["x".to_string()]);
    assert_eq!(
        field(&form, "x", FieldKind::Name),
        vec![text("A"), when("c", vec![text("B")])]
    );
}

#[test]
fn test_remove_prefix_from_inherited_description() {
    let base = asset("a", vec![room("x", vec![description(vec![text("old door")])])]);
    let edit = asset(
        "a",
        vec![room("x", vec![description(vec![node(Tag::Remove, vec![text("old")])])])],
    );

    let form = standardize(vec![base, edit]).unwrap();
    assert_eq!(field(&form, "x", FieldKind::Description), vec![text("door")]);
}

#[test]
fn test_remove_everything_leaves_empty_field() {
    let base = asset("a", vec![room("x", vec![description(vec![text("old door")])])]);
    let edit = asset(
        "a",
        vec![room("x", vec![description(vec![node(Tag::Remove, vec![text("old door")])])])],
    );

    let form = standardize(vec![base, edit]).unwrap();
    assert!(field(&form, "x", FieldKind::Description).is_empty());
    assert_eq!(form.schema(), asset("a", vec![room("x", vec![])]));
}

#[test]
fn test_remove_spans_text_from_several_documents() {
    let base = asset("a", vec![room("x", vec![description(vec![text("old ")])])]);
    let overlay = asset("a", vec![room("x", vec![description(vec![text("door")])])]);
    let edit = asset(
        "a",
        vec![room("x", vec![description(vec![node(Tag::Remove, vec![text("old door")])])])],
    );

    let form = standardize(vec![base, overlay, edit]).unwrap();
    assert!(field(&form, "x", FieldKind::Description).is_empty());
    assert_eq!(form.schema(), asset("a", vec![room("x", vec![])]));
}

#[test]
fn test_replace_spans_text_from_several_documents() {
    let base = asset("a", vec![room("x", vec![description(vec![text("An old ")])])]);
    let overlay = asset("a", vec![room("x", vec![description(vec![text("door")])])]);
    let edit = asset(
        "a",
        vec![room(
            "x",
            vec![description(vec![node(
                Tag::Replace,
                vec![
                    node(Tag::ReplaceMatch, vec![text("old door")]),
                    node(Tag::ReplacePayload, vec![text("gate")]),
                ],
            )])],
        )],
    );

    let form = standardize(vec![base, overlay, edit]).unwrap();
    assert_eq!(
        field(&form, "x", FieldKind::Description),
        vec![text("An"), node(Tag::Space, vec![]), text("gate")]
    );
}

#[test]
fn test_misaligned_edit_is_merge_conflict() {
    let base = asset("a", vec![room("x", vec![description(vec![text("an old door")])])]);
    let edit = asset(
        "a",
        vec![room("x", vec![description(vec![node(Tag::Remove, vec![text("old")])])])],
    );

    assert!(matches!(
        standardize(vec![base, edit]),
        Err(StandardizeError::MergeConflict { .. })
    ));
}

#[test]
fn test_entity_without_fields_gets_shells() {
    let form = standardize(vec![asset("a", vec![room("x", vec![])])]).unwrap();
    let component = form.component("x").unwrap();

    let declared: Vec<FieldKind> = component.fields.iter().map(|field| field.field).collect();
    assert_eq!(declared, EntityKind::Room.fields());
    assert!(component.fields.iter().all(|field| field.is_empty()));
    assert!(component.is_empty());
    assert_eq!(form.schema(), asset("a", vec![room("x", vec![])]));
}

#[test]
fn test_schema_follows_kind_order() {
    let input = asset(
        "a",
        vec![
            node(Tag::feature("f"), vec![]),
            room("r", vec![]),
            node(Tag::entity(EntityKind::Variable, "v"), vec![]),
            room("q", vec![]),
        ],
    );
    let form = standardize(vec![input]).unwrap();
    assert_eq!(form.keys(), &["v", "r", "q", "f"]);
}

#[test]
fn test_kind_conflict() {
    let input = asset("a", vec![room("k", vec![]), node(Tag::feature("k"), vec![])]);
    assert_eq!(
        standardize(vec![input]),
        Err(StandardizeError::Schema(SchemaError::kind_conflict("k", "Room", "Feature")))
    );
}

fn import_lobby() -> TagNode {
    node(
        Tag::Import {
            from: "base".to_string(),
        },
        vec![node(
            Tag::Room(Keyed {
                key: "lobby".to_string(),
                from: Some("entrance".to_string()),
            }),
            vec![],
        )],
    )
}

#[test]
fn test_import_guarantees_entry_and_is_elided() {
    let form = standardize(vec![asset("a", vec![import_lobby(), room("x", vec![])])]).unwrap();

    let lobby = form.component("lobby").unwrap();
    assert_eq!(lobby.kind, EntityKind::Room);
    assert_eq!(
        lobby.from,
        Some(ImportOrigin {
            asset: "base".to_string(),
            key: "entrance".to_string(),
        })
    );
    assert!(lobby.is_elided());
    assert_eq!(form.imports(), &[import_lobby()]);
    assert_eq!(form.schema(), asset("a", vec![import_lobby(), room("x", vec![])]));
}

#[test]
fn test_imported_component_with_local_content_is_emitted() {
    let input = asset(
        "a",
        vec![import_lobby(), room("lobby", vec![name(vec![text("Lobby")])])],
    );
    let form = standardize(vec![input]).unwrap();

    let lobby = form.component("lobby").unwrap();
    assert!(!lobby.is_elided());
    assert_eq!(lobby.tag, Tag::room("lobby"));
    assert_eq!(
        form.schema(),
        asset(
            "a",
            vec![import_lobby(), room("lobby", vec![name(vec![text("Lobby")])])]
        )
    );
}

#[test]
fn test_records_carry_import_origin() {
    let form = standardize(vec![asset("a", vec![import_lobby(), room("x", vec![])])]).unwrap();
    let records = form.records();

    assert_eq!(records.len(), 2);
    let lobby = records.iter().find(|record| record.key == "lobby").unwrap();
    assert_eq!(lobby.from.as_ref().map(|origin| origin.key.as_str()), Some("entrance"));
    let x = records.iter().find(|record| record.key == "x").unwrap();
    assert_eq!(x.from, None);
    assert_eq!(x.kind, EntityKind::Room);
}

#[test]
fn test_inherited_wrapper_is_dissolved() {
    let base = asset(
        "a",
        vec![node(Tag::Inherited, vec![room("x", vec![name(vec![text("Hall")]), exit("x", "y")])])],
    );
    let local = asset("a", vec![room("x", vec![description(vec![text("Wide")])])]);

    let form = standardize(vec![base, local]).unwrap();
    let component = form.component("x").unwrap();

    assert_eq!(field(&form, "x", FieldKind::Name), vec![text("Hall")]);
    assert_eq!(field(&form, "x", FieldKind::Description), vec![text("Wide")]);
    assert_eq!(component.items, vec![exit("x", "y")]);
    assert!(!component.extra.inherited);
}

#[test]
fn test_nested_entity_becomes_reference() {
    let input = asset(
        "a",
        vec![room(
            "x",
            vec![node(Tag::feature("f"), vec![name(vec![text("Statue")])])],
        )],
    );
    let form = standardize(vec![input]).unwrap();

    assert_eq!(form.component("x").unwrap().items, vec![node(Tag::feature("f"), vec![])]);
    assert_eq!(field(&form, "f", FieldKind::Name), vec![text("Statue")]);
    assert_eq!(form.keys(), &["x", "f"]);
}

#[test]
fn test_conditional_exits_stay_after_fields() {
    let input = asset(
        "a",
        vec![room(
            "x",
            vec![when("open", vec![exit("x", "y")]), name(vec![text("Hall")])],
        )],
    );
    let form = standardize(vec![input]).unwrap();
    let component = form.component("x").unwrap();

    assert_eq!(component.items, vec![when("open", vec![exit("x", "y")])]);
    assert_eq!(
        form.schema(),
        asset(
            "a",
            vec![room(
                "x",
                vec![name(vec![text("Hall")]), when("open", vec![exit("x", "y")])]
            )]
        )
    );
}

#[test]
fn test_conditional_chain_split_across_field_and_items() {
    let input = asset(
        "a",
        vec![room(
            "x",
            vec![node(
                Tag::If,
                vec![
                    node(Tag::statement("c"), vec![name(vec![text("B")])]),
                    node(Tag::Fallthrough, vec![exit("x", "y")]),
                ],
            )],
        )],
    );
    let form = standardize(vec![input]).unwrap();
    let component = form.component("x").unwrap();

    assert_eq!(
        field(&form, "x", FieldKind::Name),
        vec![node(
            Tag::If,
            vec![node(Tag::statement("c"), vec![text("B")]), node(Tag::Fallthrough, vec![])],
        )]
    );
    assert_eq!(
        component.items,
        vec![node(
            Tag::If,
            vec![node(Tag::statement("c"), vec![]), node(Tag::Fallthrough, vec![exit("x", "y")])],
        )]
    );

    let when_true = select_branch(&component.items[0], |condition| condition == "c").unwrap();
    assert!(matches!(when_true, BranchSelection::Statement(_)));
    assert!(when_true.contents().is_empty());
    let when_false = select_branch(&component.items[0], |_| false).unwrap();
    assert_eq!(when_false.contents(), &[exit("x", "y")]);

    assert_eq!(standardize(vec![form.schema()]).unwrap(), form);
}

#[test]
fn test_conditional_chain_split_across_two_fields() {
    let input = asset(
        "a",
        vec![room(
            "x",
            vec![node(
                Tag::If,
                vec![
                    node(Tag::statement("lit"), vec![name(vec![text("Bright hall")])]),
                    node(Tag::statement("dusk"), vec![description(vec![text("Shadows")])]),
                    node(Tag::Fallthrough, vec![]),
                ],
            )],
        )],
    );
    let form = standardize(vec![input]).unwrap();

    assert_eq!(
        field(&form, "x", FieldKind::Name),
        vec![node(
            Tag::If,
            vec![
                node(Tag::statement("lit"), vec![text("Bright hall")]),
                node(Tag::statement("dusk"), vec![]),
                node(Tag::Fallthrough, vec![]),
            ],
        )]
    );
    assert_eq!(
        field(&form, "x", FieldKind::Description),
        vec![node(
            Tag::If,
            vec![
                node(Tag::statement("lit"), vec![]),
                node(Tag::statement("dusk"), vec![text("Shadows")]),
                node(Tag::Fallthrough, vec![]),
            ],
        )]
    );
    assert!(form.component("x").unwrap().items.is_empty());
}

#[test]
fn test_character_container() {
    let input = vec![node(
        Tag::character("tess"),
        vec![
            name(vec![text("Tess")]),
            node(Tag::Pronouns(Default::default()), vec![]),
        ],
    )];
    let form = standardize(vec![input.clone()]).unwrap();

    assert_eq!(form.kind, ContainerKind::Character);
    assert_eq!(form.key, "tess");
    assert_eq!(form.schema(), input);
}

#[test]
fn test_schema_is_a_fixed_point() {
    let base = asset(
        "a",
        vec![
            import_lobby(),
            room("x", vec![name(vec![text("A")]), exit("x", "lobby")]),
            node(Tag::feature("f"), vec![description(vec![text("Shiny")])]),
        ],
    );
    let overlay = asset(
        "a",
        vec![when("c", vec![room("x", vec![name(vec![text("B")])])])],
    );

    let form = standardize(vec![base, overlay]).unwrap();
    let again = standardize(vec![form.schema()]).unwrap();
    assert_eq!(again, form);
}

#[test]
fn test_standardize_is_deterministic() {
    let inputs = vec![
        asset("a", vec![room("x", vec![name(vec![text("A")])])]),
        asset("a", vec![when("c", vec![room("x", vec![name(vec![text("B")])])])]),
    ];
    let first = standardize(inputs.clone()).unwrap();
    let second = standardize(inputs).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.schema(), second.schema());
}

#[test]
fn test_merge_disjoint_keys_copy_through() {
    let a = standardize(vec![asset("a", vec![room("x", vec![name(vec![text("X")])])])]).unwrap();
    let b = standardize(vec![asset("b", vec![node(Tag::feature("y"), vec![])])]).unwrap();

    let merged = a.merge(&b).unwrap();
    assert_eq!(merged.component("x"), a.component("x"));
    assert_eq!(merged.component("y"), b.component("y"));

    let reversed = b.merge(&a).unwrap();
    assert_eq!(reversed.component("x"), a.component("x"));
    assert_eq!(reversed.component("y"), b.component("y"));
}

#[test]
fn test_merge_shared_keys_concatenate() {
    let base = standardize(vec![asset(
        "a",
        vec![room("x", vec![name(vec![text("Old")]), exit("x", "y")])],
    )])
    .unwrap();
    let local = standardize(vec![asset(
        "a",
        vec![room("x", vec![name(vec![text(" hall")]), exit("x", "y")])],
    )])
    .unwrap();

    let merged = base.merge(&local).unwrap();
    assert_eq!(field(&merged, "x", FieldKind::Name), vec![text("Old hall")]);
    assert_eq!(merged.component("x").unwrap().items, vec![exit("x", "y"), exit("x", "y")]);
}

#[test]
fn test_merge_kind_conflict() {
    let a = standardize(vec![asset("a", vec![room("k", vec![])])]).unwrap();
    let b = standardize(vec![asset("a", vec![node(Tag::feature("k"), vec![])])]).unwrap();
    assert!(matches!(
        a.merge(&b),
        Err(StandardizeError::Schema(SchemaError::KindConflict { .. }))
    ));
}

fn scenario_a_form() -> StandardForm {
    standardize(vec![
        asset("a", vec![room("x", vec![name(vec![text("A")])])]),
        asset("a", vec![when("c", vec![room("x", vec![name(vec![text("B")])])])]),
    ])
    .unwrap()
}

#[test]
fn test_filter_keeps_field_roots() {
    let form = scenario_a_form();
    let unconditional = TagTreeMatch::and(vec![
        matchers::any_field(),
        TagTreeMatch::not(TagTreeMatch::any().before(matchers::conditional())),
    ]);

    let filtered = form.filter(unconditional).unwrap();
    assert_eq!(field(&filtered, "x", FieldKind::Name), vec![text("A")]);
    let component = filtered.component("x").unwrap();
    assert_eq!(component.field(FieldKind::Description), Some(&description(vec![])));
}

#[test]
fn test_prune_conditionals() {
    let form = scenario_a_form();
    let pruned = form.prune(matchers::conditional()).unwrap();
    assert_eq!(field(&pruned, "x", FieldKind::Name), vec![text("A"), text("B")]);
}

#[test]
fn test_assign_dependencies() {
    let form = standardize(vec![asset(
        "a",
        vec![room("x", vec![name(vec![when("power && !broken", vec![text("Lit")])])])],
    )])
    .unwrap();

    let annotated = form.assign_dependencies(identifiers).unwrap();
    let name_children = field(&annotated, "x", FieldKind::Name);
    let Tag::Statement(statement) = &name_children[0].children[0].data else {
        panic!("expected a statement");
    };
    assert_eq!(statement.dependencies, vec!["power", "broken"]);
}

#[test]
fn test_invalid_root_and_empty_input() {
    assert_eq!(standardize(Vec::new()), Err(StandardizeError::EmptyInput));
    assert!(matches!(
        standardize(vec![vec![room("x", vec![])]]),
        Err(StandardizeError::Schema(SchemaError::InvalidRoot { .. }))
    ));
}
