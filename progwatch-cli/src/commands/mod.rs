pub mod check;
pub mod init;
pub mod logs;
pub mod publish;
pub mod run;
