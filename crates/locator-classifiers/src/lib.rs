//! locator-classifiers: models that predict predicates for statistical fault localization.
//!
//! The crate holds the run configuration, a clustering stage that produces the
//! shared categorical encoder, gradient-boosted variable and expression
//! trainers, and the `pipeline` module that sequences them.
//!
//! Every stage sits behind a small trait so the driver can be exercised with
//! stand-in collaborators, while the bundled implementations read feature
//! tables from `input/`, write models to `model/` and predictions to `output/`.
pub mod cluster;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod trainer;
