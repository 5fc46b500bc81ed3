use std::collections::BTreeSet;

use itertools::Itertools;

use crate::error::GrammarError;
use crate::symbol::{Symbol, EPSILON};

/// Index of a production in declaration order.
///
/// Index 0 is always the augmented production after [`Grammar::from_text`].
pub type ProductionId = usize;

/// A single production `lhs → rhs`. An empty `rhs` is an ε-production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
}

impl Production {
    pub fn new(lhs: Symbol, rhs: Vec<Symbol>) -> Self {
        Self { lhs, rhs }
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    /// The RHS as a space-joined string, `ε` when empty.
    pub fn rhs_string(&self) -> String {
        if self.rhs.is_empty() {
            EPSILON.to_string()
        } else {
            self.rhs.iter().join(" ")
        }
    }
}

impl std::fmt::Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.lhs, self.rhs_string())
    }
}

/// A context-free grammar with its augmented start production at index 0.
///
/// Classification is derived, not declared: nonterminals are the symbols
/// appearing as an LHS, terminals are every other RHS symbol. `$` and `ε`
/// are reserved markers and never part of the declared alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    nonterminals: BTreeSet<Symbol>,
    terminals: BTreeSet<Symbol>,
    productions: Vec<Production>,
    start: Symbol,
    augmented_start: Symbol,
}

impl Grammar {
    /// Parses the rule DSL.
    ///
    /// Supported format:
    /// - empty lines and lines starting with `#` are ignored;
    /// - `Start: S` (optional, case-insensitive) declares the start symbol,
    ///   otherwise the first LHS is taken;
    /// - `A -> α | β | ε` where ε can be written `ε`, `eps`, `''` or `""`,
    ///   symbols are whitespace-separated, and terminals may be quoted;
    /// - the arrows `→`, `⇒`, `—>` and `–>` are accepted as `->`.
    pub fn from_text(text: &str) -> Result<Self, GrammarError> {
        let text = normalize_arrows(text);

        let mut declared_start: Option<Symbol> = None;
        let mut raw_rules: Vec<(Symbol, Vec<Vec<Symbol>>)> = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = strip_start_directive(line) {
                let start = rest.trim();
                if start.is_empty() {
                    return Err(GrammarError::MissingStartSymbol { line: line_no });
                }
                declared_start = Some(Symbol::new(start));
                continue;
            }

            let Some((left, right)) = line.split_once("->") else {
                return Err(GrammarError::MissingArrow {
                    line: line_no,
                    text: line.to_string(),
                });
            };

            let left = left.trim();
            if left.is_empty() {
                return Err(GrammarError::EmptyLhs { line: line_no });
            }

            let mut alternatives: Vec<Vec<Symbol>> = Vec::new();
            for alternative in right.split('|') {
                let alternative = alternative.trim();
                if is_epsilon_alternative(alternative) {
                    alternatives.push(Vec::new());
                    continue;
                }

                let mut symbols = Vec::new();
                for token in alternative.split_whitespace() {
                    let literal = strip_quotes(token);
                    if literal.is_empty() {
                        return Err(GrammarError::EmptyLiteral { line: line_no });
                    }
                    symbols.push(Symbol::new(literal));
                }
                alternatives.push(symbols);
            }

            raw_rules.push((Symbol::new(left), alternatives));
        }

        if raw_rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let start = declared_start.unwrap_or_else(|| raw_rules[0].0.clone());
        let nonterminals: BTreeSet<Symbol> =
            raw_rules.iter().map(|(lhs, _)| lhs.clone()).collect();

        if !nonterminals.contains(&start) {
            return Err(GrammarError::UndefinedStart(start));
        }

        let mut productions = Vec::new();
        let mut rhs_symbols: BTreeSet<Symbol> = BTreeSet::new();
        for (lhs, alternatives) in raw_rules {
            for rhs in alternatives {
                rhs_symbols.extend(rhs.iter().cloned());
                productions.push(Production::new(lhs.clone(), rhs));
            }
        }

        let terminals: BTreeSet<Symbol> = rhs_symbols
            .into_iter()
            .filter(|sym| !nonterminals.contains(sym))
            .collect();

        let mut grammar = Self {
            nonterminals,
            terminals,
            productions,
            augmented_start: start.clone(),
            start,
        };
        grammar.augment();
        Ok(grammar)
    }

    /// Ensures an augmented production `S' → S` exists at index 0.
    ///
    /// - A start symbol already ending in `'` is taken as the augmented start.
    /// - An existing `X' → start` production is adopted and rotated to the
    ///   front so the augmented production is always `productions[0]`.
    /// - Otherwise a fresh name (`start'`, `start''`, ...) is created and the
    ///   new production inserted at index 0.
    fn augment(&mut self) {
        let base = self.start.clone();

        if base.as_str().ends_with('\'') {
            self.augmented_start = base;
            return;
        }

        if let Some(position) = self.productions.iter().position(|p| {
            p.lhs.as_str().ends_with('\'') && p.rhs.len() == 1 && p.rhs[0] == base
        }) {
            let adopted = self.productions.remove(position);
            self.augmented_start = adopted.lhs.clone();
            self.productions.insert(0, adopted);
            return;
        }

        let mut candidate = format!("{}'", base);
        while self.nonterminals.contains(candidate.as_str()) {
            candidate.push('\'');
        }
        let augmented = Symbol::new(candidate);
        self.nonterminals.insert(augmented.clone());
        self.productions
            .insert(0, Production::new(augmented.clone(), vec![base]));
        self.augmented_start = augmented;
    }

    pub fn start(&self) -> &Symbol {
        &self.start
    }

    pub fn augmented_start(&self) -> &Symbol {
        &self.augmented_start
    }

    pub fn nonterminals(&self) -> &BTreeSet<Symbol> {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id)
    }

    /// The production whose LHS is the augmented start.
    ///
    /// # Panics
    /// Panics if the grammar was not augmented, which `from_text` guarantees
    /// cannot happen.
    pub fn augmented_production(&self) -> &Production {
        self.productions
            .iter()
            .find(|p| p.lhs == self.augmented_start)
            .expect("augmented grammar carries a production for its augmented start")
    }

    /// A symbol is a terminal if the grammar declares it so, or if it is `$`.
    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        self.terminals.contains(symbol) || symbol.is_end()
    }

    pub fn is_nonterminal(&self, symbol: &Symbol) -> bool {
        self.nonterminals.contains(symbol)
    }

    pub fn productions_of<'a>(
        &'a self,
        lhs: &'a Symbol,
    ) -> impl Iterator<Item = &'a Production> + 'a {
        self.productions.iter().filter(move |p| p.lhs == *lhs)
    }

    /// All declared symbols, terminals and nonterminals alike, in sorted
    /// order.
    pub fn all_symbols(&self) -> BTreeSet<Symbol> {
        self.terminals.union(&self.nonterminals).cloned().collect()
    }
}

/// Prints the grammar back as DSL text.
///
/// The synthetic augmented production is omitted; reparsing the output
/// recreates it at index 0, so print-then-parse round-trips.
impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Start: {}", self.start)?;

        let mut order: Vec<&Symbol> = Vec::new();
        for production in &self.productions {
            if production.lhs == self.augmented_start && self.augmented_start != self.start {
                continue;
            }
            if !order.contains(&&production.lhs) {
                order.push(&production.lhs);
            }
        }

        for lhs in order {
            let alternatives = self
                .productions_of(lhs)
                .map(|p| p.rhs_string())
                .join(" | ");
            writeln!(f, "{} -> {}", lhs, alternatives)?;
        }
        Ok(())
    }
}

fn normalize_arrows(text: &str) -> String {
    text.replace("—>", "->")
        .replace("–>", "->")
        .replace('→', "->")
        .replace('⇒', "->")
}

fn strip_start_directive(line: &str) -> Option<&str> {
    let prefix = line.get(..6)?;
    prefix.eq_ignore_ascii_case("start:").then(|| &line[6..])
}

/// True for the alternatives spelling out the empty right side.
fn is_epsilon_alternative(alternative: &str) -> bool {
    matches!(alternative, "''" | "\"\"" | "ε" | "eps")
}

/// Strips one pair of matching single or double quotes, if present.
fn strip_quotes(token: &str) -> &str {
    if token.len() >= 2
        && ((token.starts_with('\'') && token.ends_with('\''))
            || (token.starts_with('"') && token.ends_with('"')))
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}
