pub mod hooks;
pub mod serve;
