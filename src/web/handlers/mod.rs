pub mod agent_handlers;
pub mod chat_handlers;
pub mod mcp_handlers;
pub mod system_handlers;

pub use agent_handlers::*;
pub use chat_handlers::*;
pub use mcp_handlers::*;
pub use system_handlers::*;
