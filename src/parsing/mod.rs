pub mod query_parser;
pub mod turtle;

pub use query_parser::parse_query;
