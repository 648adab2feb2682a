//! CLI command implementations

pub mod run;
pub mod topic;

pub use run::RunCommand;
pub use topic::CreateTopicCommand;
