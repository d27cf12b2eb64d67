//! Concrete capabilities plugged into `sshprobe-core`: the ssh2 transport,
//! the HTTP drafter and the risk scorers.

pub mod drafter;
pub mod factory;
pub mod llm;
pub mod scorer;
pub mod services;
pub mod transport;

pub use services::PluginServicesFactory;
