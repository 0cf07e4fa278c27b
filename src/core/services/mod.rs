pub mod approval_gateway;
pub mod custodian;
pub mod expiry_reaper;
pub mod key_vault;
pub mod notification_bus;
pub mod signing_pipeline;
