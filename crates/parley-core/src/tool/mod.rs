mod schema;

pub use schema::{JsonSchemaType, ToolDefinition, ToolParameter};
