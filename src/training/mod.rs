mod epoch;
mod evaluation;
mod run;

pub use epoch::train_epoch;
pub use evaluation::{evaluate, evaluate_errors, TOP_K};
pub use run::{run, run_with, RunOptions, RunSummary, LEARNING_RATE, NUM_EPOCHS};
