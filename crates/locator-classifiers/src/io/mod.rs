pub mod feature_csv;
pub mod output;

pub use feature_csv::read_feature_table;
pub use output::{ensure_dir, write_json, write_predictions_tsv};
