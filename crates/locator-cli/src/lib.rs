//! locator-cli: the `train-model` driver.
//!
//! The binary takes a subject name and a bug id, then clusters the variable
//! features and trains the variable and expression models in that order.
pub mod driver;
