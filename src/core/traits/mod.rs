pub mod clock;
pub mod hook_runner;
pub mod signer;
