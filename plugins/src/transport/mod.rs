pub mod ssh;

pub use ssh::{Ssh2Session, Ssh2Transport};
