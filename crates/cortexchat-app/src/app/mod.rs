pub mod render;
pub mod repl;

pub use repl::{run_query_mode, run_repl_mode};
