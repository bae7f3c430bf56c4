// Public modules
pub mod content_block;
pub mod image_block;
pub mod role;
pub mod text_block;
pub mod tool_result_block;
pub mod tool_use_block;
pub mod turn;

// Re-exports
pub use content_block::{ContentBlock, KnownBlock};
pub use image_block::{ImageBlock, ImageSource};
pub use role::Role;
pub use text_block::TextBlock;
pub use tool_result_block::ToolResultBlock;
pub use tool_use_block::ToolUseBlock;
pub use turn::{Turn, TurnContent};
