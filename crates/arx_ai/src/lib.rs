pub mod draft;
pub mod embeddings;
pub mod index;
pub mod judge;
pub mod llm;
pub mod ollama;
pub mod pipeline;
pub mod providers;
