//! The seam between the harness and a text-generation engine.

use crate::error::Result;
use crate::prompt::{IM_END, IM_START};

/// Per-call sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: i32,
    pub top_p: f32,
    pub repeat_penalty: f32,
    /// Generation halts as soon as one of these appears; it is not returned.
    pub stop: Vec<String>,
    pub seed: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            temperature: 0.3,
            top_k: 20,
            top_p: 0.85,
            repeat_penalty: 1.1,
            stop: vec![IM_END.to_string(), IM_START.to_string(), "\n\n".to_string()],
            seed: 561371,
        }
    }
}

/// Anything that turns a prompt into generated text.
pub trait TextGenerator {
    fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Cut `output` at the earliest stop string. Returns true if one was found.
pub fn truncate_at_stop(output: &mut String, stop: &[String]) -> bool {
    let earliest = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| output.find(s.as_str()))
        .min();

    match earliest {
        Some(pos) => {
            output.truncate(pos);
            true
        }
        None => false,
    }
}
