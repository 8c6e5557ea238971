use crate::{parse, PrintError, PrintOptions, Printer};
use wml_schema::{node, text, SchemaError, Tag, TagNode, WmlTree};

fn asset(key: &str, children: Vec<TagNode>) -> WmlTree {
    vec![node(Tag::asset(key), children)]
}

fn room(key: &str, children: Vec<TagNode>) -> TagNode {
    node(Tag::room(key), children)
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

fn printer(width: usize) -> Printer {
    Printer::new(PrintOptions::default().with_width(width))
}

const LONG_DESCRIPTION: &str = "A long hallway stretches north, its walls hung with faded portraits of people nobody remembers.";

#[test]
fn test_long_description_renders_nested() {
    let tree = asset(
        "a",
        vec![room("hall", vec![node(Tag::Description, vec![text(LONG_DESCRIPTION)])])],
    );
    let printed = printer(80).print(&tree).unwrap();

    assert!(printed.contains("    <Description>\n      A long hallway"));
    assert!(printed.contains("\n    </Description>\n"));
    assert!(printed.lines().count() > 7);
    assert!(printed.lines().all(|line| line.chars().count() <= 80));
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_short_description_renders_naive() {
    let tree = asset(
        "a",
        vec![room("hall", vec![node(Tag::Description, vec![text("A short hall.")])])],
    );
    let printed = printer(80).print(&tree).unwrap();

    assert_eq!(
        printed,
        "<Asset key=(a)>\n  <Room key=(hall)><Description>A short hall.</Description></Room>\n</Asset>\n"
    );
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_lines_stay_within_width() {
    let words = "one two three four five six seven eight nine ten eleven twelve thirteen";
    let tree = asset(
        "a",
        vec![room(
            "hall",
            vec![
                node(Tag::Name, vec![text("Hall")]),
                node(Tag::Description, vec![text(words), text(" "), text(words)]),
            ],
        )],
    );
    let printed = printer(30).print(&tree).unwrap();

    for line in printed.lines() {
        assert!(line.chars().count() <= 30, "line too wide: {line:?}");
    }
}

#[test]
fn test_overflow_falls_back_to_property_nested() {
    let tree = vec![exit("a", "b")];
    let printed = printer(10).print(&tree).unwrap();

    assert_eq!(printed, "<Exit\n  key=(a#b)\n  to=(b)\n/>\n");
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_conditional_branches_print_at_if_indent() {
    let tree = asset(
        "a",
        vec![room(
            "x",
            vec![
                node(Tag::Name, vec![text("Hall")]),
                node(
                    Tag::If,
                    vec![
                        node(Tag::statement("open"), vec![exit("x", "y")]),
                        node(Tag::Fallthrough, vec![exit("x", "z")]),
                    ],
                ),
            ],
        )],
    );
    let printed = printer(40).print(&tree).unwrap();

    assert!(printed.contains(
        "    <If {open}>\n      <Exit key=(x#y) to=(y) />\n    <Else />\n      <Exit key=(x#z) to=(z) />\n    </If>\n"
    ));
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_inline_conditional_stays_on_one_line() {
    let tree = vec![node(
        Tag::Name,
        vec![
            text("Hall"),
            node(Tag::If, vec![node(Tag::statement("lit"), vec![text(" (lit)")])]),
        ],
    )];
    let printed = printer(80).print(&tree).unwrap();

    assert_eq!(printed, "<Name>Hall<If {lit}> (lit)</If></Name>\n");
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_boundary_whitespace_keeps_one_line() {
    let tree = vec![node(Tag::Description, vec![text(" starts with a space and runs long")])];
    let printed = printer(20).print(&tree).unwrap();

    assert_eq!(printed.lines().count(), 1);
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_links_wrap_as_units() {
    let tree = vec![node(
        Tag::Description,
        vec![
            text("Go through"),
            text(" "),
            node(Tag::Link { to: "door".to_string() }, vec![text("the old door")]),
            text(" quickly"),
        ],
    )];
    let printed = printer(20).print(&tree).unwrap();

    assert!(printed.contains("\n  <Link to=(door)>the old door</Link>\n"));
}

#[test]
fn test_empty_field_self_closes() {
    let printed = printer(80).print(&[node(Tag::Name, vec![])]).unwrap();
    assert_eq!(printed, "<Name />\n");
}

#[test]
fn test_text_is_escaped() {
    let tree = vec![node(Tag::Name, vec![text("a<b> \\ c")])];
    let printed = printer(80).print(&tree).unwrap();

    assert_eq!(printed, "<Name>a\\<b\\> \\\\ c</Name>\n");
    assert_eq!(parse(&printed).unwrap(), tree);
}

#[test]
fn test_malformed_conditional_is_an_invariant_violation() {
    let tree = vec![node(Tag::If, vec![text("x")])];
    let result = printer(80).print(&tree);
    assert!(matches!(
        result,
        Err(PrintError::Schema(SchemaError::InvariantViolation(_)))
    ));
}

#[test]
fn test_depth_guard() {
    let mut deep = node(Tag::Export, vec![]);
    for _ in 0..250 {
        deep = node(Tag::Export, vec![deep]);
    }
    let result = printer(80).print(&[deep]);
    assert!(matches!(result, Err(PrintError::MaxNestingDepthExceeded { .. })));
}

#[test]
fn test_print_is_deterministic() {
    let tree = asset(
        "a",
        vec![room("hall", vec![node(Tag::Description, vec![text(LONG_DESCRIPTION)])])],
    );
    assert_eq!(printer(50).print(&tree).unwrap(), printer(50).print(&tree).unwrap());
}
