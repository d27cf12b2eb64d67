pub mod http;

pub use http::HttpDrafter;
