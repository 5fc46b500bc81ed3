pub mod error;
pub mod export;
pub mod first;
pub mod grammar;
pub mod item;
pub mod lr;
pub mod precedence;
pub mod scanner;
pub mod symbol;
pub mod token;

pub use error::{BuildError, GrammarError, ParseError, TableError};
pub use first::FirstSets;
pub use grammar::{Grammar, Production, ProductionId};
pub use item::{closure, goto, Lr1Item};
pub use lr::{
    Action, Automaton, Conflict, ConflictKind, Driver, ParseResult, ParseStep, ParseTable, State,
    StateId, DEFAULT_STEP_LIMIT,
};
pub use precedence::{expression_preview, Assoc, PrecLevel, PrecedenceConfig, Resolution};
pub use scanner::Scanner;
pub use symbol::Symbol;
pub use token::Token;

/// Runs the whole pipeline without precedence: grammar text in, table and
/// trace out.
pub fn compile_and_parse(
    grammar_text: &str,
    input: &str,
) -> Result<(ParseTable, ParseResult), BuildError> {
    let grammar = Grammar::from_text(grammar_text)?;
    let first = FirstSets::compute(&grammar);
    let automaton = Automaton::build(&grammar, &first);
    let table = ParseTable::build(&grammar, &automaton, None)?;

    let tokens = Scanner::new(input, &grammar).tokenize_all();
    let result = Driver::new(&table).parse(&tokens);
    Ok((table, result))
}

#[cfg(test)]
pub mod fixtures {
    use crate::Grammar;

    /// Optional prefix through an ε-production.
    pub const OPTIONAL_GRAMMAR: &str = "S -> A B\nA -> 'a' | ε\nB -> 'b'\n";

    /// The classical ambiguous expression grammar.
    pub const EXPR_GRAMMAR: &str = "E -> E '+' E | E '*' E | '(' E ')' | id\n";

    pub const DANGLING_ELSE_GRAMMAR: &str =
        "S -> 'if' E 'then' S | 'if' E 'then' S 'else' S | id\nE -> id\n";

    /// Left-recursive comma list.
    pub const LIST_GRAMMAR: &str = "L -> L ',' a | a\n";

    pub fn grammar(text: &str) -> Grammar {
        Grammar::from_text(text).expect("fixture grammar parses")
    }
}
