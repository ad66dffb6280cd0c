pub mod extract;
pub mod init;
pub mod list;
pub mod serve;
pub mod sync;
