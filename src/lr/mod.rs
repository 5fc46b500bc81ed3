mod action;
mod driver;
mod graph;
mod table;

pub use action::Action;
pub use driver::{Driver, ParseResult, ParseStep, DEFAULT_STEP_LIMIT};
pub use graph::{Automaton, State, StateId};
pub use table::{Conflict, ConflictKind, ParseTable, Row};
