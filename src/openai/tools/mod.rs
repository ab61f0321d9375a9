//! Tools module aggregator: tool definitions, lookup services, registry.

mod core; // core definitions: ToolDefinition, ToolKind, ToolParameters, builders
mod ddg; // DuckDuckGo web search
mod lookup; // LookupService trait + shared HTTP helpers
mod registry;
mod wikipedia; // Wikipedia reference lookup

pub use core::{
    ToolDefinition,
    ToolHandler,
    ToolKind,
    ToolParameters,
    ToolParametersBuilder,
    issue_argument,
};
pub use ddg::{DuckDuckGoSearch, build_ddg_issue_tool};
pub use lookup::LookupService;
pub use registry::ToolRegistry;
pub use wikipedia::{WikipediaSearch, build_wikipedia_issue_tool};
