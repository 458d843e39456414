pub mod assembler;
pub mod charts;
pub mod document;
pub mod llm;
pub mod narrative;
pub(crate) mod pptx;
pub mod visuals;
pub mod workflow;
