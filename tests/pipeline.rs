use canonlr::{
    compile_and_parse, Action, Automaton, ConflictKind, Driver, FirstSets, Grammar, ParseError,
    ParseResult, ParseTable, PrecLevel, PrecedenceConfig, Scanner, Symbol,
};

fn pipeline(grammar_text: &str, levels: Option<&str>) -> (Grammar, ParseTable) {
    let grammar = Grammar::from_text(grammar_text).expect("grammar parses");
    let first = FirstSets::compute(&grammar);
    let automaton = Automaton::build(&grammar, &first);

    let config = levels.map(|payload| {
        let levels: Vec<PrecLevel> = serde_json::from_str(payload).expect("payload parses");
        PrecedenceConfig::new(&grammar, levels)
    });
    let table =
        ParseTable::build(&grammar, &automaton, config.as_ref()).expect("table builds");
    (grammar, table)
}

fn run(grammar: &Grammar, table: &ParseTable, input: &str) -> ParseResult {
    let tokens = Scanner::new(input, grammar).tokenize_all();
    Driver::new(table).parse(&tokens)
}

fn reductions(result: &ParseResult) -> Vec<String> {
    result
        .steps
        .iter()
        .filter_map(|step| step.reduced.clone())
        .collect()
}

#[test]
fn optional_prefix_via_epsilon() {
    let (grammar, table) = pipeline("S -> A B\nA -> 'a' | ε\nB -> 'b'\n", None);

    let accepted = run(&grammar, &table, "a b");
    assert!(accepted.accepted);
    assert_eq!(accepted.steps.last().unwrap().action, "acc");

    // A reduces via ε before b is shifted.
    let empty_a = run(&grammar, &table, "b");
    assert!(empty_a.accepted);
    assert_eq!(reductions(&empty_a)[0], "A→ε");

    let rejected = run(&grammar, &table, "a");
    assert!(!rejected.accepted);
    assert!(matches!(
        rejected.error,
        Some(ParseError::Syntax { ref symbol, .. }) if symbol.is_end()
    ));
}

#[test]
fn expression_grammar_with_precedence() {
    let (grammar, table) = pipeline(
        "E -> E '+' E | E '*' E | '(' E ')' | id\n",
        Some(r#"[{"assoc": "left", "tokens": ["+"]}, {"assoc": "left", "tokens": ["*"]}]"#),
    );
    assert!(table.is_lr1(), "conflicts: {:?}", table.conflicts());

    let result = run(&grammar, &table, "id + id * id");
    assert!(result.accepted);

    // The * subtree is reduced before the + reduction.
    let reduced = reductions(&result);
    let times = reduced.iter().position(|r| r == "E→E * E").unwrap();
    let plus = reduced.iter().position(|r| r == "E→E + E").unwrap();
    assert!(times < plus);
}

#[test]
fn dangling_else() {
    let text = "S -> 'if' E 'then' S | 'if' E 'then' S 'else' S | id\nE -> id\n";

    let (_, bare) = pipeline(text, None);
    assert!(bare
        .conflicts()
        .iter()
        .any(|c| c.symbol == Symbol::new("else") && c.kind() == ConflictKind::ShiftReduce));

    let (grammar, resolved) = pipeline(
        text,
        Some(r#"[{"assoc": "right", "tokens": ["else"]}]"#),
    );
    assert!(resolved.is_lr1(), "conflicts: {:?}", resolved.conflicts());

    // The else binds to the nearest if: it is shifted, and the inner if is
    // never reduced away while else is the lookahead.
    let result = run(&grammar, &resolved, "if x then if y then z else w");
    assert!(result.accepted);
    let else_steps: Vec<_> = result
        .steps
        .iter()
        .filter(|step| step.lookahead == Symbol::new("else"))
        .collect();
    assert!(else_steps.iter().any(|step| step.action.starts_with('d')));
    assert!(else_steps
        .iter()
        .all(|step| step.reduced.as_deref() != Some("S→if E then S")));
}

#[test]
fn left_associative_list() {
    let (grammar, table) = pipeline("L -> L ',' a | a\n", None);

    let result = run(&grammar, &table, "a , a , a");
    assert!(result.accepted);
    assert_eq!(reductions(&result), vec!["L→a", "L→L , a", "L→L , a"]);
}

#[test]
fn undeclared_symbol() {
    let (grammar, table) = pipeline("S -> a\n", None);

    let result = run(&grammar, &table, "b");
    assert!(!result.accepted);
    match result.error {
        Some(ParseError::Syntax { state, symbol, .. }) => {
            assert_eq!(state, 0);
            // b is not a declared terminal, so the scanner reports ERR.
            assert_eq!(symbol, Symbol::error());
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn step_limit() {
    let (grammar, table) = pipeline("L -> L ',' a | a\n", None);
    let tokens = Scanner::new("a , a , a , a , a", &grammar).tokenize_all();

    let result = Driver::with_step_limit(&table, 4).parse(&tokens);
    assert!(!result.accepted);
    assert_eq!(result.error, Some(ParseError::StepLimitExceeded { limit: 4 }));
    assert_eq!(result.steps.len(), 4);
}

#[test]
fn empty_input_acceptance_follows_nullability() {
    // S derives ε: empty input is accepted, one state beyond I0 suffices.
    let grammar = Grammar::from_text("S -> ε\n").unwrap();
    let first = FirstSets::compute(&grammar);
    let automaton = Automaton::build(&grammar, &first);
    assert_eq!(automaton.states().len(), 2);

    let table = ParseTable::build(&grammar, &automaton, None).unwrap();
    let result = run(&grammar, &table, "");
    assert!(result.accepted);

    // S does not derive ε: empty input is rejected.
    let (grammar, table) = pipeline("S -> 'a'\n", None);
    assert!(!run(&grammar, &table, "").accepted);
}

#[test]
fn first_sets_are_a_fixed_point() {
    let grammar =
        Grammar::from_text("E -> E '+' T | T\nT -> T '*' F | F\nF -> '(' E ')' | id\n").unwrap();
    let first = FirstSets::compute(&grammar);
    let recomputed = FirstSets::compute(&grammar);
    assert_eq!(first, recomputed);
}

#[test]
fn every_state_is_its_own_closure() {
    let grammar =
        Grammar::from_text("E -> E '+' T | T\nT -> T '*' F | F\nF -> '(' E ')' | id\n").unwrap();
    let first = FirstSets::compute(&grammar);
    let automaton = Automaton::build(&grammar, &first);

    for state in automaton.states() {
        let closed = canonlr::closure(state.items.iter().cloned(), &grammar, &first);
        assert_eq!(state.items, closed, "state I{} is not closed", state.id);
    }
}

#[test]
fn production_indices_are_unique_and_augmented_first() {
    let grammar = Grammar::from_text("S -> A B\nA -> 'a' | ε\nB -> 'b'\n").unwrap();

    assert_eq!(grammar.productions()[0].lhs, *grammar.augmented_start());
    assert_eq!(
        grammar.productions()[0].rhs,
        vec![grammar.start().clone()]
    );
    assert_eq!(
        grammar
            .productions()
            .iter()
            .filter(|p| p.lhs == *grammar.augmented_start())
            .count(),
        1
    );
}

#[test]
fn conflicted_cells_keep_a_single_entry() {
    let (_, table) = pipeline("E -> E '+' E | id\n", None);
    assert!(!table.is_lr1());

    // Every conflicted cell still resolves to exactly the earlier action.
    for conflict in table.conflicts() {
        assert_eq!(
            table.action(conflict.state, &conflict.symbol),
            Some(&conflict.existing)
        );
    }
}

#[test]
fn grammar_roundtrips_through_pretty_printing() {
    let text = "Start: S\nS -> 'if' E 'then' S | id\nE -> id | ε\n";
    let first_pass = Grammar::from_text(text).unwrap();
    let second_pass = Grammar::from_text(&first_pass.to_string()).unwrap();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn building_twice_is_byte_identical() {
    let text = "E -> E '+' T | T\nT -> T '*' F | F\nF -> '(' E ')' | id\n";
    let (_, one) = pipeline(text, None);
    let (_, two) = pipeline(text, None);
    assert_eq!(one.to_string(), two.to_string());

    let (grammar, _) = pipeline(text, None);
    let first = FirstSets::compute(&grammar);
    assert_eq!(
        Automaton::build(&grammar, &first).to_dot(true),
        Automaton::build(&grammar, &first).to_dot(true)
    );
}

#[test]
fn accept_renders_differently_per_surface() {
    let (grammar, table) = pipeline("S -> 'a'\n", None);

    // Table surface: the augmented reduction.
    assert_eq!(table.render_action(&Action::Accept), "r[S'→S]");

    // Trace surface: acc.
    let result = run(&grammar, &table, "a");
    assert!(result.accepted);
    assert_eq!(result.steps.last().unwrap().action, "acc");
}

#[test]
fn compile_and_parse_wires_the_pipeline() {
    let (table, result) = compile_and_parse("S -> A B\nA -> 'a' | ε\nB -> 'b'\n", "a b").unwrap();
    assert!(result.accepted);
    assert!(table.is_lr1());

    // A bare RHS is an ε production, so the empty input is accepted.
    let (_, result) = compile_and_parse("S ->", "").unwrap();
    assert!(result.accepted);
}
