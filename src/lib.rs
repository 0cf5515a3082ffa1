//! A console harness for exercising a local finance-assistant model.
//!
//! A user message is wrapped in an instruction prompt ([`prompt`]), sent to a
//! [`TextGenerator`] (normally the llama.cpp engine in [`llm`]), and the reply
//! is parsed into an [`ActionRequest`] ([`interpreter`]) and described for the
//! console ([`dispatch`]).

pub mod args_handler;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod generation;
pub mod interpreter;
pub mod llm;
pub mod prompt;
pub mod session;

pub use catalog::Catalog;
pub use dispatch::{describe, describe_unparsed, Reply};
pub use error::{Error, Result};
pub use generation::{GenerationConfig, TextGenerator};
pub use interpreter::{parse_response, ActionRequest, Interpretation, Period, TransactionParams};
pub use llm::{LoadConfig, LLM};
pub use prompt::PromptBuilder;
pub use session::Session;
