use itertools::Itertools;

use crate::error::ParseError;
use crate::symbol::Symbol;
use crate::token::Token;

use super::{Action, ParseTable, StateId};

/// Iteration cap bounding runaway reduction loops.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// How many upcoming lexemes the trace shows as the remaining-input window.
const INPUT_WINDOW: usize = 7;

/// One trace entry: the machine configuration after the iteration, the
/// lookahead it saw, and the action it took (in the stable rendering, `·`
/// when the lookup failed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStep {
    pub step: usize,
    pub states: Vec<StateId>,
    pub symbols: Vec<Symbol>,
    pub lookahead: Symbol,
    pub action: String,
    pub reduced: Option<String>,
    pub window: String,
}

/// Outcome of a parse: the full trace, and on failure the typed error next
/// to the steps collected up to and including the failing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub accepted: bool,
    pub steps: Vec<ParseStep>,
    pub error: Option<ParseError>,
}

impl ParseResult {
    fn accepted(steps: Vec<ParseStep>) -> Self {
        Self {
            accepted: true,
            steps,
            error: None,
        }
    }

    fn rejected(steps: Vec<ParseStep>, error: ParseError) -> Self {
        Self {
            accepted: false,
            steps,
            error: Some(error),
        }
    }
}

/// The table-driven shift-reduce machine. Borrows the table read-only; one
/// driver can run any number of inputs.
pub struct Driver<'table> {
    table: &'table ParseTable,
    step_limit: usize,
}

impl<'table> Driver<'table> {
    pub fn new(table: &'table ParseTable) -> Self {
        Self::with_step_limit(table, DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(table: &'table ParseTable, step_limit: usize) -> Self {
        Self { table, step_limit }
    }

    /// Runs the stack machine over the token stream, producing one trace
    /// step per iteration.
    pub fn parse(&self, tokens: &[Token]) -> ParseResult {
        let mut states: Vec<StateId> = vec![0];
        let mut symbols: Vec<Symbol> = Vec::new();
        let mut steps: Vec<ParseStep> = Vec::new();
        let mut cursor = 0;
        let mut step = 0;
        let end = Token::end(0, 0);

        loop {
            step += 1;
            if step > self.step_limit {
                return ParseResult::rejected(
                    steps,
                    ParseError::StepLimitExceeded {
                        limit: self.step_limit,
                    },
                );
            }

            let lookahead = tokens.get(cursor).unwrap_or(&end);
            let state = *states.last().expect("state stack is never empty");

            let Some(&action) = self.table.action(state, &lookahead.symbol) else {
                steps.push(ParseStep {
                    step,
                    states: states.clone(),
                    symbols: symbols.clone(),
                    lookahead: lookahead.symbol.clone(),
                    action: "·".to_string(),
                    reduced: None,
                    window: window(tokens, cursor),
                });
                return ParseResult::rejected(
                    steps,
                    ParseError::Syntax {
                        state,
                        symbol: lookahead.symbol.clone(),
                        lexeme: lookahead.lexeme.clone(),
                        line: lookahead.line,
                        column: lookahead.column,
                    },
                );
            };

            match action {
                Action::Shift(target) => {
                    states.push(target);
                    symbols.push(lookahead.symbol.clone());
                    cursor += 1;
                    steps.push(ParseStep {
                        step,
                        states: states.clone(),
                        symbols: symbols.clone(),
                        lookahead: lookahead.symbol.clone(),
                        action: self.table.render_action(&action),
                        reduced: None,
                        window: window(tokens, cursor),
                    });
                }
                Action::Reduce(id) => {
                    let production = &self.table.productions()[id];
                    let arity = production.rhs.len();
                    states.truncate(states.len() - arity);
                    symbols.truncate(symbols.len() - arity);

                    let top = *states.last().expect("state stack is never empty");
                    let reduced = format!("{}→{}", production.lhs, production.rhs_string());

                    let Some(target) = self.table.goto(top, &production.lhs) else {
                        steps.push(ParseStep {
                            step,
                            states: states.clone(),
                            symbols: symbols.clone(),
                            lookahead: lookahead.symbol.clone(),
                            action: self.table.render_action(&action),
                            reduced: Some(reduced.clone()),
                            window: window(tokens, cursor),
                        });
                        return ParseResult::rejected(
                            steps,
                            ParseError::MissingGoto {
                                state: top,
                                nonterminal: production.lhs.clone(),
                                production: reduced,
                            },
                        );
                    };

                    symbols.push(production.lhs.clone());
                    states.push(target);
                    steps.push(ParseStep {
                        step,
                        states: states.clone(),
                        symbols: symbols.clone(),
                        lookahead: lookahead.symbol.clone(),
                        action: self.table.render_action(&action),
                        reduced: Some(reduced),
                        window: window(tokens, cursor),
                    });
                }
                Action::Accept => {
                    steps.push(ParseStep {
                        step,
                        states: states.clone(),
                        symbols: symbols.clone(),
                        lookahead: lookahead.symbol.clone(),
                        action: "acc".to_string(),
                        reduced: None,
                        window: window(tokens, cursor),
                    });
                    return ParseResult::accepted(steps);
                }
            }
        }
    }
}

fn window(tokens: &[Token], from: usize) -> String {
    tokens
        .iter()
        .skip(from)
        .take(INPUT_WINDOW)
        .map(|token| token.lexeme.as_str())
        .join(" ")
}
