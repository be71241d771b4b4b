pub mod config;
pub mod context;
pub mod httpsign;
pub mod locks;
pub mod transport;
pub mod traits;
pub mod actor;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use context::Context;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
