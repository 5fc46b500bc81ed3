use std::collections::{HashMap, HashSet};

use log::warn;
use prettytable::Table as PtTable;

use crate::error::TableError;
use crate::grammar::{Grammar, Production, ProductionId};
use crate::precedence::{PrecedenceConfig, Resolution};
use crate::symbol::Symbol;

use super::{Action, Automaton, StateId};

/// One table row: ACTION entries keyed by terminal (or `$`), GOTO entries
/// keyed by nonterminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    actions: HashMap<Symbol, Action>,
    gotos: HashMap<Symbol, StateId>,
}

impl Row {
    pub fn action(&self, symbol: &Symbol) -> Option<&Action> {
        self.actions.get(symbol)
    }

    pub fn goto(&self, symbol: &Symbol) -> Option<StateId> {
        self.gotos.get(symbol).copied()
    }
}

/// How the two colliding actions relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
    Other,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::ShiftReduce => write!(f, "shift/reduce"),
            ConflictKind::ReduceReduce => write!(f, "reduce/reduce"),
            ConflictKind::Other => write!(f, "other"),
        }
    }
}

/// A collision the builder could not resolve. The earlier entry stays in the
/// table; the kind is computed from the two variants, not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub symbol: Symbol,
    pub existing: Action,
    pub incoming: Action,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match (self.existing, self.incoming) {
            (Action::Shift(_), Action::Reduce(_)) | (Action::Reduce(_), Action::Shift(_)) => {
                ConflictKind::ShiftReduce
            }
            (Action::Reduce(_), Action::Reduce(_)) => ConflictKind::ReduceReduce,
            _ => ConflictKind::Other,
        }
    }

    pub fn describe(&self, productions: &[Production]) -> String {
        format!(
            "[I{}, sym='{}'] {} conflict: existing={} vs incoming={}",
            self.state,
            self.symbol,
            self.kind(),
            self.existing.render(productions),
            self.incoming.render(productions)
        )
    }
}

/// The ACTION/GOTO table, with ordered columns and the conflicts left after
/// precedence resolution. Owns a copy of the production list so actions and
/// conflicts render without the grammar at hand.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTable {
    rows: Vec<Row>,
    conflicts: Vec<Conflict>,
    terminals: Vec<Symbol>,
    nonterminals: Vec<Symbol>,
    productions: Vec<Production>,
}

impl ParseTable {
    /// Builds the table from the canonical collection.
    ///
    /// Shifts and gotos come from the DFA transitions; reductions and accept
    /// from complete items. A shift/reduce collision consults the resolver
    /// when a precedence config is supplied; anything still unresolved is
    /// recorded as a [`Conflict`] and the earlier entry kept, so a table is
    /// produced for every grammar.
    pub fn build(
        grammar: &Grammar,
        automaton: &Automaton,
        precedence: Option<&PrecedenceConfig>,
    ) -> Result<Self, TableError> {
        let productions: Vec<Production> = grammar.productions().to_vec();
        let mut rows: Vec<Row> = vec![Row::default(); automaton.states().len()];
        let mut conflicts: Vec<Conflict> = Vec::new();

        // Shifts and gotos from transitions.
        for state in automaton.states() {
            let Some(edges) = automaton.transitions_from(state.id) else {
                continue;
            };
            for (symbol, &target) in edges {
                if grammar.is_terminal(symbol) {
                    propose(
                        &mut rows,
                        &mut conflicts,
                        precedence,
                        &productions,
                        state.id,
                        symbol,
                        Action::Shift(target),
                    );
                } else if grammar.is_nonterminal(symbol) {
                    rows[state.id].gotos.insert(symbol.clone(), target);
                }
            }
        }

        // Reductions and accept from complete items.
        let by_body: HashMap<(&Symbol, &[Symbol]), ProductionId> = productions
            .iter()
            .enumerate()
            .map(|(id, p)| ((&p.lhs, p.rhs.as_slice()), id))
            .collect();
        let end = Symbol::end();

        for state in automaton.states() {
            for item in state.items.iter().filter(|item| item.is_complete()) {
                if item.lhs == *grammar.augmented_start() && item.lookahead.is_end() {
                    propose(
                        &mut rows,
                        &mut conflicts,
                        precedence,
                        &productions,
                        state.id,
                        &end,
                        Action::Accept,
                    );
                    continue;
                }

                let Some(&id) = by_body.get(&(&item.lhs, item.alpha.as_slice())) else {
                    return Err(TableError::MissingProduction {
                        state: state.id,
                        production: Production::new(item.lhs.clone(), item.alpha.clone()),
                    });
                };
                propose(
                    &mut rows,
                    &mut conflicts,
                    precedence,
                    &productions,
                    state.id,
                    &item.lookahead,
                    Action::Reduce(id),
                );
            }
        }

        Ok(Self {
            rows,
            conflicts,
            terminals: terminal_columns(grammar),
            nonterminals: nonterminal_columns(grammar),
            productions,
        })
    }

    pub fn action(&self, state: StateId, symbol: &Symbol) -> Option<&Action> {
        self.rows.get(state)?.action(symbol)
    }

    pub fn goto(&self, state: StateId, symbol: &Symbol) -> Option<StateId> {
        self.rows.get(state)?.goto(symbol)
    }

    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// A grammar is LR(1) under the given precedence iff nothing collided.
    pub fn is_lr1(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Terminal columns: `$` first, then first appearance on any RHS, then
    /// any remaining declared terminals.
    pub fn terminals(&self) -> &[Symbol] {
        &self.terminals
    }

    /// Nonterminal columns in LHS first-appearance order, without the
    /// augmented start.
    pub fn nonterminals(&self) -> &[Symbol] {
        &self.nonterminals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn render_action(&self, action: &Action) -> String {
        action.render(&self.productions)
    }
}

fn propose(
    rows: &mut [Row],
    conflicts: &mut Vec<Conflict>,
    precedence: Option<&PrecedenceConfig>,
    productions: &[Production],
    state: StateId,
    symbol: &Symbol,
    incoming: Action,
) {
    let row = &mut rows[state];
    let Some(&existing) = row.actions.get(symbol) else {
        row.actions.insert(symbol.clone(), incoming);
        return;
    };
    if existing == incoming {
        return;
    }

    if let Some(config) = precedence {
        let shift_reduce = match (existing, incoming) {
            (Action::Shift(_), Action::Reduce(production)) => Some((existing, production)),
            (Action::Reduce(production), Action::Shift(_)) => Some((incoming, production)),
            _ => None,
        };
        if let Some((shift, production)) = shift_reduce {
            match config.resolve(symbol, production) {
                Some(Resolution::Shift) => {
                    row.actions.insert(symbol.clone(), shift);
                    return;
                }
                Some(Resolution::Reduce) => {
                    row.actions.insert(symbol.clone(), Action::Reduce(production));
                    return;
                }
                None => {}
            }
        }
    }

    let conflict = Conflict {
        state,
        symbol: symbol.clone(),
        existing,
        incoming,
    };
    warn!("{}", conflict.describe(productions));
    conflicts.push(conflict);
}

fn terminal_columns(grammar: &Grammar) -> Vec<Symbol> {
    let mut order = vec![Symbol::end()];
    let mut seen: HashSet<&Symbol> = HashSet::new();

    for production in grammar.productions() {
        for symbol in &production.rhs {
            if grammar.terminals().contains(symbol) && seen.insert(symbol) {
                order.push(symbol.clone());
            }
        }
    }
    // Declared but never used on a RHS; appended in sorted order.
    for terminal in grammar.terminals() {
        if !seen.contains(terminal) {
            order.push(terminal.clone());
        }
    }
    order
}

fn nonterminal_columns(grammar: &Grammar) -> Vec<Symbol> {
    let mut order = Vec::new();
    let mut seen: HashSet<&Symbol> = HashSet::from([grammar.augmented_start()]);

    for production in grammar.productions() {
        if seen.insert(&production.lhs) {
            order.push(production.lhs.clone());
        }
    }
    order
}

impl std::fmt::Display for ParseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = PtTable::new();

        table.add_row(
            ["#".to_string()]
                .into_iter()
                .chain(self.terminals.iter().map(ToString::to_string))
                .chain(self.nonterminals.iter().map(ToString::to_string))
                .collect(),
        );

        for (id, row) in self.rows.iter().enumerate() {
            table.add_row(
                [id.to_string()]
                    .into_iter()
                    .chain(self.terminals.iter().map(|terminal| {
                        row.action(terminal)
                            .map(|action| action.render(&self.productions))
                            .unwrap_or_default()
                    }))
                    .chain(self.nonterminals.iter().map(|nonterminal| {
                        row.goto(nonterminal)
                            .map(|target| target.to_string())
                            .unwrap_or_default()
                    }))
                    .collect(),
            );
        }

        write!(f, "{table}")?;

        if !self.conflicts.is_empty() {
            writeln!(f, "conflicts:")?;
            for conflict in &self.conflicts {
                writeln!(f, "  - {}", conflict.describe(&self.productions))?;
            }
        }
        Ok(())
    }
}
