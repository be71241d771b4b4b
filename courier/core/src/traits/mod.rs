pub mod store;
pub mod app;
pub mod fetch;
pub mod address;
pub mod normalize;
pub mod process;

pub use store::{Database, Clock, StorageError};
pub use app::{Application, FollowPolicy, KeyMaterial, PolicyError};
pub use fetch::Fetcher;
pub use address::Addresser;
pub use normalize::Normalizer;
pub use process::Processor;
