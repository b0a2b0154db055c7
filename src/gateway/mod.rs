//! Gateway Module
//!
//! The model-inference collaborator behind the `ModelGateway` trait.

mod openai;

pub use openai::OpenAiGateway;
