pub mod engine;
pub mod query;
pub mod results;

pub use engine::{PatternQueryEngine, QueryEngine};
pub use query::{Query, QueryBuilder};
pub use results::ResultTable;
