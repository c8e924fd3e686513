pub mod merge;
pub mod partition;
pub mod run;
pub mod stats;
