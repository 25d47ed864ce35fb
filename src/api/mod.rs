pub mod backend;
pub mod client;
pub mod response;

pub use backend::ModelBackend;
pub use client::HttpBackend;
