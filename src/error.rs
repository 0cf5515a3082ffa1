//! Error types for moneymate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error(
        "the prompt needs {prompt_tokens} tokens plus {max_tokens} for the reply, \
         but the context only holds {n_ctx}; reduce --max-tokens or increase --ctx-size"
    )]
    ContextOverflow {
        prompt_tokens: usize,
        max_tokens: u32,
        n_ctx: u32,
    },

    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
