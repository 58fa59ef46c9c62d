pub mod triple_store;
pub mod util;
pub mod indexing {
    pub mod dictionary;
}

pub use triple_store::TripleStore;
