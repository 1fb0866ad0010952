pub mod error;
pub mod executor;
pub mod function;
pub mod registry;
pub mod traits;

pub use error::{Result, ToolError};
pub use executor::ToolExecutor;
pub use function::FunctionTool;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolOutput};

pub mod prelude {
    pub use crate::error::{Result, ToolError};
    pub use crate::executor::ToolExecutor;
    pub use crate::function::FunctionTool;
    pub use crate::registry::ToolRegistry;
    pub use crate::traits::{Tool, ToolOutput};
}
