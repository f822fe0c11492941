mod audit;
mod init;
mod report;
mod serve;

pub use audit::cmd_audit;
pub use init::cmd_init;
pub use report::cmd_report;
pub use serve::cmd_serve;
