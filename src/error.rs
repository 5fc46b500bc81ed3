use thiserror::Error;

use crate::grammar::Production;
use crate::symbol::Symbol;

/// Errors raised while parsing the grammar DSL.
///
/// Every syntactic kind carries the 1-based line it was found on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("[L{line}] missing '->' in: {text}")]
    MissingArrow { line: usize, text: String },

    #[error("[L{line}] empty left-hand side before '->'")]
    EmptyLhs { line: usize },

    #[error("[L{line}] 'Start:' without a symbol")]
    MissingStartSymbol { line: usize },

    #[error("[L{line}] empty literal (use '' or \"\" alone for an ε alternative)")]
    EmptyLiteral { line: usize },

    #[error("empty grammar: no productions")]
    Empty,

    #[error("start symbol {0} never appears as a left-hand side")]
    UndefinedStart(Symbol),
}

/// Table-construction failures.
///
/// A complete item whose (lhs, α) matches no declared production means the
/// canonical collection and the grammar disagree; the builder refuses to
/// fabricate a production for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("state I{state} reduces by undeclared production {production}")]
    MissingProduction { state: usize, production: Production },
}

/// Driver failures, embedded in the [`ParseResult`](crate::lr::ParseResult)
/// next to the trace collected so far.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error: state I{state}, lookahead '{symbol}' (lexeme '{lexeme}' at {line}:{column})")]
    Syntax {
        state: usize,
        symbol: Symbol,
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("goto undefined for (I{state}, {nonterminal}) after reducing {production}")]
    MissingGoto {
        state: usize,
        nonterminal: Symbol,
        production: String,
    },

    #[error("step limit of {limit} exceeded (possible reduction loop)")]
    StepLimitExceeded { limit: usize },
}

/// Umbrella for the grammar-to-table pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Table(#[from] TableError),
}
