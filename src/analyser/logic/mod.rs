pub mod apa;
pub mod cleaning;
pub mod descriptive;
pub mod execution;
pub mod hypothesis;
pub mod io;
pub mod normality;
pub mod profiling;
pub mod selection;
pub mod types;

pub use apa::{GroupTable, TestTable, format_p, group_table, test_table};
pub use cleaning::{CleaningReport, clean_dataset};
pub use execution::{execute_named, execute_test, execute_test_with, group_summary};
pub use io::{column_cells, load_df, save_df};
pub use profiling::{infer_kind, profile_as, profile_column, profile_dataset};
pub use selection::select_test;
pub use types::{
    DataProfile, EffectSizeMetric, GroupStats, TestKind, TestPlan, TestResults, VariableKind,
    VariableProfile,
};

#[cfg(test)]
mod tests;
