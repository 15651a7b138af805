pub mod filter;
pub mod pool;

pub use filter::ItemFilter;
pub use pool::{create_pool, run_migrations};
