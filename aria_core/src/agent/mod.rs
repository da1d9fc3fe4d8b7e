mod assistant;

pub use assistant::{Assistant, AssistantConfig, Reply};
