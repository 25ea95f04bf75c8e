pub mod base;
pub mod http;

#[cfg(test)]
pub mod mock;

pub use base::AgentApi;
pub use http::HttpAgentClient;
