use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grammar::{Grammar, ProductionId};
use crate::symbol::Symbol;

/// Operator associativity within one precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

/// One precedence level: an associativity and the terminals living on it.
///
/// Deserializes straight from the collaborator payload shape
/// `{"assoc": "left", "tokens": ["+", "-"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecLevel {
    pub assoc: Assoc,
    pub tokens: Vec<Symbol>,
}

/// Outcome of a shift-vs-reduce consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Shift,
    Reduce,
}

/// Yacc-style operator precedence, derived from an ordered list of levels
/// (index 0 is the lowest).
///
/// A production's level is the level of the rightmost terminal on its RHS
/// that has a declared level; productions without such a terminal have no
/// level.
#[derive(Debug, Clone)]
pub struct PrecedenceConfig {
    levels: Vec<PrecLevel>,
    token_level: HashMap<Symbol, usize>,
    token_assoc: HashMap<Symbol, Assoc>,
    production_level: HashMap<ProductionId, usize>,
}

impl PrecedenceConfig {
    pub fn new(grammar: &Grammar, levels: Vec<PrecLevel>) -> Self {
        let mut token_level = HashMap::new();
        let mut token_assoc = HashMap::new();
        for (index, level) in levels.iter().enumerate() {
            for token in &level.tokens {
                token_level.insert(token.clone(), index);
                token_assoc.insert(token.clone(), level.assoc);
            }
        }

        let mut production_level = HashMap::new();
        for (id, production) in grammar.productions().iter().enumerate() {
            let level = production
                .rhs
                .iter()
                .rev()
                .filter(|symbol| grammar.terminals().contains(*symbol))
                .find_map(|symbol| token_level.get(symbol).copied());
            if let Some(level) = level {
                production_level.insert(id, level);
            }
        }

        Self {
            levels,
            token_level,
            token_assoc,
            production_level,
        }
    }

    pub fn levels(&self) -> &[PrecLevel] {
        &self.levels
    }

    pub fn token_level(&self, token: &Symbol) -> Option<usize> {
        self.token_level.get(token).copied()
    }

    pub fn token_assoc(&self, token: &Symbol) -> Option<Assoc> {
        self.token_assoc.get(token).copied()
    }

    pub fn production_level(&self, production: ProductionId) -> Option<usize> {
        self.production_level.get(&production).copied()
    }

    /// Decides a shift(`token`) vs reduce(`production`) collision.
    ///
    /// Neither side leveled: undefined. Only the token leveled: shift wins.
    /// Only the production leveled: reduce wins. Otherwise the higher level
    /// wins, and a tie falls back to the token's associativity (`left` ⇒
    /// reduce, `right` ⇒ shift, `nonassoc` ⇒ undefined, leaving the conflict
    /// to signal that chaining the operator is disallowed).
    pub fn resolve(&self, token: &Symbol, production: ProductionId) -> Option<Resolution> {
        let token_level = self.token_level(token);
        let production_level = self.production_level(production);

        match (token_level, production_level) {
            (None, None) => None,
            (None, Some(_)) => Some(Resolution::Reduce),
            (Some(_), None) => Some(Resolution::Shift),
            (Some(t), Some(p)) if t > p => Some(Resolution::Shift),
            (Some(t), Some(p)) if t < p => Some(Resolution::Reduce),
            _ => match self.token_assoc(token).unwrap_or(Assoc::Left) {
                Assoc::Left => Some(Resolution::Reduce),
                Assoc::Right => Some(Resolution::Shift),
                Assoc::Nonassoc => None,
            },
        }
    }
}

/// A non-executable DSL sketch of an operator grammar stratified by the
/// configured levels: one nonterminal per level, shaped by associativity,
/// with the original parenthesized/atomic productions as primaries.
///
/// Returns `None` when no levels are configured or no nonterminal of the
/// grammar uses a leveled operator.
pub fn expression_preview(grammar: &Grammar, config: &PrecedenceConfig) -> Option<String> {
    if config.levels().is_empty() {
        return None;
    }

    let expr = guess_expression_symbol(grammar, config)?;

    // Parenthesis-like productions, then atomic non-operator terminals.
    let mut primaries: Vec<String> = Vec::new();
    for production in grammar.productions_of(&expr) {
        let rhs = &production.rhs;
        if rhs.len() == 3
            && grammar.terminals().contains(&rhs[0])
            && rhs[1] == expr
            && grammar.terminals().contains(&rhs[2])
        {
            primaries.push(format!("'{}' {} '{}'", rhs[0], expr, rhs[2]));
        }
    }
    for production in grammar.productions_of(&expr) {
        let rhs = &production.rhs;
        if rhs.len() == 1
            && grammar.terminals().contains(&rhs[0])
            && config.token_level(&rhs[0]).is_none()
        {
            primaries.push(format!("'{}'", rhs[0]));
        }
    }
    if primaries.is_empty() {
        primaries.push(expr.to_string());
    }

    let levels = config.levels();
    let names: Vec<String> = (0..=levels.len()).map(|i| format!("{expr}{i}")).collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "# preview (non-executable): precedence-disambiguated grammar for {expr}"
    ));
    lines.push(format!("{} -> {}", names[levels.len()], primaries.join(" | ")));

    for (index, level) in levels.iter().enumerate().rev() {
        let current = &names[index];
        let higher = &names[index + 1];
        let tokens: Vec<String> = level
            .tokens
            .iter()
            .filter(|t| config.token_level(t).is_some())
            .map(|t| format!("'{t}'"))
            .collect();

        if tokens.is_empty() {
            lines.push(format!("{current} -> {higher}"));
            continue;
        }

        let alternatives: Vec<String> = match level.assoc {
            Assoc::Left => tokens
                .iter()
                .map(|t| format!("{current} {t} {higher}"))
                .chain([higher.clone()])
                .collect(),
            Assoc::Right => tokens
                .iter()
                .map(|t| format!("{higher} {t} {current}"))
                .chain([higher.clone()])
                .collect(),
            Assoc::Nonassoc => [higher.clone()]
                .into_iter()
                .chain(tokens.iter().map(|t| format!("{higher} {t} {higher}")))
                .collect(),
        };
        lines.push(format!("{current} -> {}", alternatives.join(" | ")));
    }

    if expr == *grammar.start() {
        lines.insert(0, format!("Start: {expr}"));
    }
    Some(lines.join("\n"))
}

/// The start symbol if its productions mention a leveled operator, otherwise
/// the first nonterminal (sorted order) that does.
fn guess_expression_symbol(grammar: &Grammar, config: &PrecedenceConfig) -> Option<Symbol> {
    let uses_operator = |symbol: &Symbol| {
        grammar
            .productions_of(symbol)
            .any(|p| p.rhs.iter().any(|s| config.token_level(s).is_some()))
    };

    if uses_operator(grammar.start()) {
        return Some(grammar.start().clone());
    }
    grammar
        .nonterminals()
        .iter()
        .filter(|n| *n != grammar.augmented_start())
        .find(|n| uses_operator(n))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn expr_config(grammar: &Grammar) -> PrecedenceConfig {
        PrecedenceConfig::new(
            grammar,
            vec![
                PrecLevel {
                    assoc: Assoc::Left,
                    tokens: vec![Symbol::new("+")],
                },
                PrecLevel {
                    assoc: Assoc::Left,
                    tokens: vec![Symbol::new("*")],
                },
            ],
        )
    }

    #[test]
    fn test_production_level_uses_rightmost_leveled_terminal() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let config = expr_config(&grammar);

        let plus = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&Symbol::new("+")))
            .unwrap();
        let times = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&Symbol::new("*")))
            .unwrap();
        let parens = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&Symbol::new("(")))
            .unwrap();

        assert_eq!(config.production_level(plus), Some(0));
        assert_eq!(config.production_level(times), Some(1));
        // '(' and ')' carry no level, so neither does the production.
        assert_eq!(config.production_level(parens), None);
    }

    #[test]
    fn test_resolution_rules() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let config = expr_config(&grammar);

        let plus = Symbol::new("+");
        let times = Symbol::new("*");
        let plus_prod = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&plus))
            .unwrap();
        let times_prod = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&times))
            .unwrap();
        let id_prod = grammar
            .productions()
            .iter()
            .position(|p| p.rhs == vec![Symbol::new("id")])
            .unwrap();

        // Higher token level shifts; lower reduces.
        assert_eq!(config.resolve(&times, plus_prod), Some(Resolution::Shift));
        assert_eq!(config.resolve(&plus, times_prod), Some(Resolution::Reduce));
        // Tie on a left-associative token reduces.
        assert_eq!(config.resolve(&plus, plus_prod), Some(Resolution::Reduce));
        // Only the token leveled: shift wins.
        assert_eq!(config.resolve(&plus, id_prod), Some(Resolution::Shift));
        // Neither side leveled: undefined.
        assert_eq!(config.resolve(&Symbol::new("("), id_prod), None);
    }

    #[test]
    fn test_nonassoc_tie_stays_unresolved() {
        let grammar = fixtures::grammar("E -> E '<' E | id\n");
        let config = PrecedenceConfig::new(
            &grammar,
            vec![PrecLevel {
                assoc: Assoc::Nonassoc,
                tokens: vec![Symbol::new("<")],
            }],
        );

        let less_prod = grammar
            .productions()
            .iter()
            .position(|p| p.rhs.contains(&Symbol::new("<")))
            .unwrap();
        assert_eq!(config.resolve(&Symbol::new("<"), less_prod), None);
    }

    #[test]
    fn test_payload_shape_deserializes() {
        let levels: Vec<PrecLevel> = serde_json::from_str(
            r#"[{"assoc": "left", "tokens": ["+", "-"]},
                {"assoc": "nonassoc", "tokens": ["<"]}]"#,
        )
        .unwrap();
        assert_eq!(levels[0].assoc, Assoc::Left);
        assert_eq!(levels[1].assoc, Assoc::Nonassoc);
        assert_eq!(levels[0].tokens, vec![Symbol::new("+"), Symbol::new("-")]);
    }

    #[test]
    fn test_expression_preview_stratifies_levels() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let config = expr_config(&grammar);

        let preview = expression_preview(&grammar, &config).unwrap();
        assert!(preview.starts_with("Start: E"));
        assert!(preview.contains("E2 -> '(' E ')' | 'id'"));
        assert!(preview.contains("E1 -> E1 '*' E2 | E2"));
        assert!(preview.contains("E0 -> E0 '+' E1 | E1"));
    }
}
