//! Supervised training of multi-class classifiers.
//!
//! `training` holds the loop: an optimization pass per epoch, an evaluation pass after each one
//! and a final top-1/top-5 error report. Models, losses, optimizers and data loading live in the
//! `machine_learning` crate.

pub mod configs;
pub mod error;
pub mod metrics;
pub mod report;
pub mod training;

pub use error::{Result, TrainErr};
pub use training::{evaluate, evaluate_errors, run, run_with, train_epoch, RunOptions, RunSummary};
