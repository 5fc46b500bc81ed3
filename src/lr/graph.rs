use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use itertools::Itertools;
use log::debug;

use crate::first::FirstSets;
use crate::grammar::Grammar;
use crate::item::{closure, goto, Lr1Item};
use crate::symbol::Symbol;

/// Identifier of an item set, assigned at first insertion.
pub type StateId = usize;

/// One state of the item-set DFA: a closed set of LR(1) items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    pub items: BTreeSet<Lr1Item>,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "I{}:", self.id)?;
        for item in &self.items {
            writeln!(f, "  {item}")?;
        }
        Ok(())
    }
}

/// The canonical LR(1) collection: every item set reachable from state 0
/// under goto, with the transitions between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: Vec<State>,
    transitions: BTreeMap<StateId, BTreeMap<Symbol, StateId>>,
}

impl Automaton {
    /// Worklist construction. State 0 is the closure of the dotted augmented
    /// production; each state is probed with every grammar symbol in sorted
    /// order, and goto targets are interned by item-set equality.
    ///
    /// Terminates because the item sets over a finite grammar are finite.
    pub fn build(grammar: &Grammar, first: &FirstSets) -> Self {
        let start = closure([Lr1Item::start(grammar)], grammar, first);

        let mut states = vec![State {
            id: 0,
            items: start.clone(),
        }];
        let mut index: HashMap<BTreeSet<Lr1Item>, StateId> = HashMap::from([(start, 0)]);
        let mut transitions: BTreeMap<StateId, BTreeMap<Symbol, StateId>> = BTreeMap::new();
        let mut worklist = VecDeque::from([0]);

        let symbols: Vec<Symbol> = grammar.all_symbols().into_iter().collect();

        while let Some(state_id) = worklist.pop_front() {
            let items = states[state_id].items.clone();

            for symbol in &symbols {
                let target = goto(&items, symbol, grammar, first);
                if target.is_empty() {
                    continue;
                }

                let target_id = match index.get(&target) {
                    Some(&existing) => existing,
                    None => {
                        let id = states.len();
                        states.push(State {
                            id,
                            items: target.clone(),
                        });
                        index.insert(target, id);
                        worklist.push_back(id);
                        id
                    }
                };

                transitions
                    .entry(state_id)
                    .or_default()
                    .insert(symbol.clone(), target_id);
            }
        }

        let edge_count: usize = transitions.values().map(BTreeMap::len).sum();
        debug!(
            "canonical collection: {} states, {} transitions",
            states.len(),
            edge_count
        );

        Self {
            states,
            transitions,
        }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn transitions(&self) -> &BTreeMap<StateId, BTreeMap<Symbol, StateId>> {
        &self.transitions
    }

    pub fn transitions_from(&self, id: StateId) -> Option<&BTreeMap<Symbol, StateId>> {
        self.transitions.get(&id)
    }

    /// Graphviz rendering of the DFA; with `show_items` each node lists its
    /// items in normalized order.
    pub fn to_dot(&self, show_items: bool) -> String {
        let mut lines = vec![
            "digraph LR1 {".to_string(),
            "  rankdir=LR;".to_string(),
            "  node [shape=record];".to_string(),
        ];

        for state in &self.states {
            if show_items {
                let body = state
                    .items
                    .iter()
                    .map(|item| escape(&item.to_string()))
                    .join("\\l")
                    + "\\l";
                lines.push(format!(
                    "  S{} [label=\"{{I{}|{}}}\"];",
                    state.id, state.id, body
                ));
            } else {
                lines.push(format!("  S{} [label=\"I{}\"];", state.id, state.id));
            }
        }

        for (source, edges) in &self.transitions {
            for (symbol, target) in edges {
                lines.push(format!(
                    "  S{source} -> S{target} [label=\"{}\"];",
                    escape(symbol.as_str())
                ));
            }
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl std::fmt::Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for state in &self.states {
            write!(f, "{state}")?;
            if let Some(edges) = self.transitions.get(&state.id) {
                for (symbol, target) in edges {
                    writeln!(f, "    -- {symbol} --> I{target}")?;
                }
            }
        }
        Ok(())
    }
}

fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
}
