pub mod create;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod reorder;
pub mod serve;
pub mod show;
