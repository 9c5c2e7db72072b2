pub mod resolver;
pub mod store;

pub use resolver::{ConfigOverrides, ConfigResolver};
#[cfg(test)]
pub use store::MemorySettingsStore;
pub use store::{FileSettingsStore, SettingsError, SettingsStore};
