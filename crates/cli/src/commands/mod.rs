pub mod init;
pub mod plan;
pub mod pump;
pub mod report;
pub mod send;
pub mod task;
pub mod tasks;
pub mod timeline;
pub mod watch;
