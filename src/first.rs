use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::Grammar;
use crate::symbol::{Symbol, EPSILON};

/// FIRST sets for every declared symbol.
///
/// For a terminal `t` the set is `{t}`; for a nonterminal it is the least
/// fixed point of the usual FIRST rules, with `ε` marking nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    map: BTreeMap<Symbol, BTreeSet<Symbol>>,
}

impl FirstSets {
    /// Runs the fixpoint over the grammar's productions until no set grows.
    ///
    /// Terminates because every pass can only add terminals (or `ε`) drawn
    /// from a finite alphabet.
    pub fn compute(grammar: &Grammar) -> Self {
        let mut map: BTreeMap<Symbol, BTreeSet<Symbol>> = BTreeMap::new();
        for terminal in grammar.terminals() {
            map.insert(terminal.clone(), BTreeSet::from([terminal.clone()]));
        }
        for nonterminal in grammar.nonterminals() {
            map.entry(nonterminal.clone()).or_default();
        }

        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.productions() {
                let lhs = &production.lhs;

                if production.rhs.is_empty() {
                    changed |= map
                        .get_mut(lhs)
                        .expect("every nonterminal has a FIRST entry")
                        .insert(Symbol::epsilon());
                    continue;
                }

                let mut all_nullable = true;
                for symbol in &production.rhs {
                    let first_of_symbol = current_first(grammar, &map, symbol);
                    let target = map
                        .get_mut(lhs)
                        .expect("every nonterminal has a FIRST entry");
                    changed |= union_excluding_epsilon(target, &first_of_symbol);

                    if !first_of_symbol.contains(EPSILON) {
                        all_nullable = false;
                        break;
                    }
                }

                if all_nullable {
                    changed |= map
                        .get_mut(lhs)
                        .expect("every nonterminal has a FIRST entry")
                        .insert(Symbol::epsilon());
                }
            }
        }

        Self { map }
    }

    /// FIRST of a single symbol. `$` yields `{$}`; a symbol without an entry
    /// (never declared) yields the singleton of itself.
    pub fn of_symbol(&self, symbol: &Symbol) -> BTreeSet<Symbol> {
        if symbol.is_end() {
            return BTreeSet::from([Symbol::end()]);
        }
        match self.map.get(symbol) {
            Some(set) => set.clone(),
            None => BTreeSet::from([symbol.clone()]),
        }
    }

    /// FIRST of a sequence: the empty sequence yields `{ε}`; otherwise the
    /// non-ε FIRSTs accumulate left to right until a non-nullable symbol is
    /// hit, and `ε` is included only when every symbol was nullable.
    pub fn of_sequence<'a, I>(&self, sequence: I) -> BTreeSet<Symbol>
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        let mut result = BTreeSet::new();
        let mut all_nullable = true;

        for symbol in sequence {
            let first = self.of_symbol(symbol);
            result.extend(first.iter().filter(|s| !s.is_epsilon()).cloned());
            if !first.contains(EPSILON) {
                all_nullable = false;
                break;
            }
        }

        if all_nullable {
            result.insert(Symbol::epsilon());
        }
        result
    }

    pub fn is_nullable(&self, symbol: &Symbol) -> bool {
        self.of_symbol(symbol).contains(EPSILON)
    }

    pub fn is_nullable_sequence<'a, I>(&self, sequence: I) -> bool
    where
        I: IntoIterator<Item = &'a Symbol>,
    {
        self.of_sequence(sequence).contains(EPSILON)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&BTreeSet<Symbol>> {
        self.map.get(symbol)
    }
}

/// FIRST of a symbol as currently known, mid-fixpoint.
fn current_first(
    grammar: &Grammar,
    map: &BTreeMap<Symbol, BTreeSet<Symbol>>,
    symbol: &Symbol,
) -> BTreeSet<Symbol> {
    if symbol.is_end() {
        return BTreeSet::from([Symbol::end()]);
    }
    if grammar.is_nonterminal(symbol) {
        return map.get(symbol).cloned().unwrap_or_default();
    }
    BTreeSet::from([symbol.clone()])
}

/// Adds `source \ {ε}` to `target`; reports whether `target` grew.
fn union_excluding_epsilon(target: &mut BTreeSet<Symbol>, source: &BTreeSet<Symbol>) -> bool {
    let before = target.len();
    target.extend(source.iter().filter(|s| !s.is_epsilon()).cloned());
    target.len() != before
}
