pub mod event;
pub mod key_entry;
pub mod key_material;
pub mod signature;
