pub mod relational_importer;
pub mod relational_source;

pub use relational_importer::{ImportSummary, RelationalImporter};
pub use relational_source::{ImportBatch, JsonFileSource, RelationalSource};
