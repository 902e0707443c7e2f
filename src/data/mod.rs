//! Training data containers and loaders
//!
//! `Problem` holds labelled examples; `libsvm` reads and writes them in
//! the LIBSVM sparse text format.

pub mod libsvm;
pub mod problem;

pub use self::libsvm::{read_problem, read_problem_file, write_problem};
pub use self::problem::Problem;
