pub mod hooks;
pub mod keys;
pub mod protocol;
