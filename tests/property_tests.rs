use proptest::prelude::*;
use proptest::string::string_regex;
use pyrubric::rules::{Constraint, NamePattern, Selector};
use pyrubric::{dotted_name, PythonParser, SyntaxTree};

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "case", "class", "continue", "def", "del",
    "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with",
    "yield",
];

fn identifier() -> impl Strategy<Value = String> {
    string_regex("[a-z][a-z0-9_]{0,8}")
        .expect("regex")
        .prop_filter("not a python keyword", |name| {
            !PYTHON_KEYWORDS.contains(&name.as_str())
        })
}

fn dotted_chain() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(identifier(), 1..5)
}

fn parse(source: &str) -> SyntaxTree {
    let mut parser = PythonParser::new().unwrap();
    let parsed = parser.parse_with_source(source).unwrap();
    let mut tree = SyntaxTree::from_parsed(&parsed);
    tree.annotate();
    tree
}

proptest! {
    /// Parts `[a, b, c]` written as `a.b.c` in source come back out of the
    /// chain builder as the same dotted string, so a selector configured
    /// with that string matches.
    #[test]
    fn dotted_chain_round_trips(parts in dotted_chain()) {
        let chain = parts.join(".");
        let source = format!("{chain} = 1\n");
        let tree = parse(&source);

        let selector = Selector::Assignment {
            target: NamePattern::parse(&chain),
            scope: None,
        };
        let nodes = selector.select(&tree);
        prop_assert_eq!(nodes.len(), 1);
        prop_assert_eq!(dotted_name(&tree, nodes[0]), Some(chain));
    }

    /// For any selection, is_required (without a count) and is_forbidden
    /// are exact complements.
    #[test]
    fn required_and_forbidden_are_complements(
        names in prop::collection::vec(identifier(), 0..6),
        target in identifier(),
    ) {
        let mut source = String::new();
        for name in &names {
            source.push_str(&format!("def {name}():\n    pass\n\n"));
        }
        if source.is_empty() {
            source.push_str("x = 1\n");
        }
        let tree = parse(&source);

        let selector = Selector::FunctionDef {
            name: NamePattern::parse(&target),
            scope: None,
        };
        let nodes = selector.select(&tree);

        let required = Constraint::IsRequired { expected_count: None };
        let forbidden = Constraint::IsForbidden;
        prop_assert_ne!(required.check(&tree, &nodes), forbidden.check(&tree, &nodes));
    }

    /// Selection order is deterministic for a fixed source.
    #[test]
    fn selection_is_reproducible(names in prop::collection::vec(identifier(), 1..6)) {
        let mut source = String::new();
        for name in &names {
            source.push_str(&format!("def {name}():\n    pass\n\n"));
        }
        let tree = parse(&source);

        let selector = Selector::FunctionDef {
            name: NamePattern::parse("*"),
            scope: None,
        };
        prop_assert_eq!(selector.select(&tree), selector.select(&tree));
    }

    /// The parser wrapper never panics on arbitrary text.
    #[test]
    fn parser_never_panics_on_arbitrary_text(
        input in prop::collection::vec(any::<char>(), 0..1024)
            .prop_map(|chars| chars.into_iter().collect::<String>())
    ) {
        let mut parser = PythonParser::new().unwrap();
        let _ = parser.parse_with_source(&input);
    }
}
