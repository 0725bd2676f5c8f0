mod handler;
mod server;
mod types;

#[cfg(test)]
mod tests;

pub use server::MCPServer;
