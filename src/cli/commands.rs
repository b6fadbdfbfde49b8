//! Command implementations / 命令实现

pub mod init;
pub mod report;
pub mod run;
