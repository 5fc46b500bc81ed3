use crate::grammar::{Production, ProductionId};

use super::StateId;

/// A parse-table action. `Reduce` carries the production index; the arity
/// popped by the driver is derived from that production's RHS length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

impl Action {
    /// Stable cell rendering shared by table cells and conflict messages:
    /// `d{t}` for shifts, `r[A→α]` for reductions (`ε` for an empty RHS),
    /// and the augmented reduction `r[S'→S]` for accept.
    ///
    /// The driver's trace writes `acc` for accept instead; both surfaces are
    /// kept.
    pub fn render(&self, productions: &[Production]) -> String {
        match self {
            Action::Shift(target) => format!("d{target}"),
            Action::Reduce(id) => {
                let production = &productions[*id];
                format!("r[{}→{}]", production.lhs, production.rhs_string())
            }
            Action::Accept => {
                let production = &productions[0];
                format!("r[{}→{}]", production.lhs, production.rhs_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    #[test]
    fn test_render() {
        let productions = vec![
            Production::new(Symbol::new("S'"), vec![Symbol::new("S")]),
            Production::new(Symbol::new("S"), vec![Symbol::new("a"), Symbol::new("S")]),
            Production::new(Symbol::new("S"), vec![]),
        ];

        assert_eq!(Action::Shift(7).render(&productions), "d7");
        assert_eq!(Action::Reduce(1).render(&productions), "r[S→a S]");
        assert_eq!(Action::Reduce(2).render(&productions), "r[S→ε]");
        assert_eq!(Action::Accept.render(&productions), "r[S'→S]");
    }
}
