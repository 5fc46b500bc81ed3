use std::collections::BTreeSet;

use itertools::Itertools;

use crate::first::FirstSets;
use crate::grammar::Grammar;
use crate::symbol::Symbol;

/// An LR(1) item `[lhs → α · β, lookahead]`.
///
/// Equality, hashing and ordering are structural over all four fields; the
/// derived `Ord` gives item sets the normalized order their hashing relies
/// on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lr1Item {
    pub lhs: Symbol,
    pub alpha: Vec<Symbol>,
    pub beta: Vec<Symbol>,
    pub lookahead: Symbol,
}

impl Lr1Item {
    pub fn new(lhs: Symbol, alpha: Vec<Symbol>, beta: Vec<Symbol>, lookahead: Symbol) -> Self {
        Self {
            lhs,
            alpha,
            beta,
            lookahead,
        }
    }

    /// The dotted augmented production with `$` lookahead; the seed of
    /// state 0.
    pub fn start(grammar: &Grammar) -> Self {
        let production = grammar.augmented_production();
        Self::new(
            production.lhs.clone(),
            Vec::new(),
            production.rhs.clone(),
            Symbol::end(),
        )
    }

    /// The dot has reached the end of the production.
    pub fn is_complete(&self) -> bool {
        self.beta.is_empty()
    }

    /// The symbol immediately after the dot, if any.
    pub fn next_symbol(&self) -> Option<&Symbol> {
        self.beta.first()
    }

    /// Moves the dot one symbol to the right.
    ///
    /// # Panics
    /// Panics on a complete item.
    pub fn advance_dot(&self) -> Self {
        assert!(
            !self.beta.is_empty(),
            "cannot advance the dot of a complete item"
        );
        let mut alpha = self.alpha.clone();
        alpha.push(self.beta[0].clone());
        Self::new(
            self.lhs.clone(),
            alpha,
            self.beta[1..].to_vec(),
            self.lookahead.clone(),
        )
    }
}

impl std::fmt::Display for Lr1Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let alpha = self.alpha.iter().join(" ");
        let beta = self.beta.iter().join(" ");
        let rhs = match (alpha.is_empty(), beta.is_empty()) {
            (false, false) => format!("{alpha} · {beta}"),
            (false, true) => format!("{alpha} ·"),
            (true, false) => format!("· {beta}"),
            (true, true) => "·".to_string(),
        };
        write!(f, "{} → {} , {}", self.lhs, rhs, self.lookahead)
    }
}

/// Saturates `items` under the closure rule: for every `[A → α · X β, a]`
/// with nonterminal X, every production `X → γ` and every terminal
/// `b ∈ FIRST(β a)`, the item `[X → · γ, b]` is added.
pub fn closure<I>(items: I, grammar: &Grammar, first: &FirstSets) -> BTreeSet<Lr1Item>
where
    I: IntoIterator<Item = Lr1Item>,
{
    let mut result: BTreeSet<Lr1Item> = items.into_iter().collect();
    let mut stack: Vec<Lr1Item> = result.iter().cloned().collect();

    while let Some(item) = stack.pop() {
        let Some(next) = item.next_symbol() else {
            continue;
        };
        if !grammar.is_nonterminal(next) {
            continue;
        }

        let mut context: Vec<&Symbol> = item.beta[1..].iter().collect();
        context.push(&item.lookahead);
        let lookaheads = first.of_sequence(context);

        for production in grammar.productions_of(next) {
            for lookahead in &lookaheads {
                if lookahead.is_epsilon() {
                    continue;
                }
                let new_item = Lr1Item::new(
                    next.clone(),
                    Vec::new(),
                    production.rhs.clone(),
                    lookahead.clone(),
                );
                if result.insert(new_item.clone()) {
                    stack.push(new_item);
                }
            }
        }
    }

    result
}

/// The goto transition: advance the dot over `symbol` for every applicable
/// item, then close. An empty result stays empty (no transition).
pub fn goto(
    items: &BTreeSet<Lr1Item>,
    symbol: &Symbol,
    grammar: &Grammar,
    first: &FirstSets,
) -> BTreeSet<Lr1Item> {
    let moved: Vec<Lr1Item> = items
        .iter()
        .filter(|item| item.next_symbol() == Some(symbol))
        .map(Lr1Item::advance_dot)
        .collect();

    if moved.is_empty() {
        return BTreeSet::new();
    }
    closure(moved, grammar, first)
}
