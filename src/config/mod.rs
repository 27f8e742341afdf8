pub mod app;
pub mod credentials;
pub mod digest;
pub mod locations;

pub use app::AppConfig;
pub use credentials::{CredentialSource, FileCredentials, StaticCredentials};
pub use digest::{AreaHour, DigestConfig};
pub use locations::{Coordinates, LocationDirectory};
