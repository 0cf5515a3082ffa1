use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use hf_hub::api::sync::ApiBuilder;
use llama_cpp_2::model::params::kv_overrides::ParamOverrideValue;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use crate::generation::GenerationConfig;
use crate::llm::LoadConfig;

#[derive(Subcommand, Debug, Clone)]
pub enum Model {
    /// Use an already downloaded model
    #[clap(name = "local")]
    Local {
        /// The path to the model. e.g. `./qwen2.5-0.5b-instruct-q4_k_m.gguf`
        path: PathBuf,
    },
    /// Download a model from huggingface (or use a cached version)
    #[clap(name = "hf-model")]
    HuggingFace {
        /// the repo containing the model. e.g. `Qwen/Qwen2.5-0.5B-Instruct-GGUF`
        repo: String,
        /// the model name. e.g. `qwen2.5-0.5b-instruct-q4_k_m.gguf`
        model: String,
    },
}

impl Model {
    /// Convert the model to a path - may download from huggingface
    pub fn get_or_load(self) -> anyhow::Result<PathBuf> {
        match self {
            Model::Local { path } => Ok(path),
            Model::HuggingFace { model, repo } => ApiBuilder::new()
                .with_progress(true)
                .build()
                .with_context(|| "unable to create huggingface api")?
                .model(repo)
                .get(&model)
                .with_context(|| "unable to download model"),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Interactive console session
    Chat,
    /// Run `--prompt` once and exit
    Single,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "moneymate", about = "Try a local finance-assistant model from the console")]
pub struct Args {
    /// The path to the model
    #[command(subcommand)]
    pub model: Model,

    /// Interactive chat, or a single message
    #[clap(value_enum, short = 'm', long, default_value = "chat")]
    pub mode: Mode,

    /// The message to send - valid only if the mode is `single`
    #[clap(short = 'p', long, required_if_eq("mode", "single"))]
    pub prompt: Option<String>,

    /// TOML file with `expense`, `income` and optional `fallback` category labels
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// size of the prompt context
    #[clap(short = 'c', long, default_value_t = 2048)]
    pub ctx_size: u32,

    /// number of threads to use during generation and prompt processing
    #[clap(long, default_value_t = 4)]
    pub threads: i32,

    /// maximum number of prompt tokens decoded at once
    #[clap(long, default_value_t = 512)]
    pub batch_size: u32,

    /// override some parameters of the model
    #[clap(short = 'o', value_parser = parse_key_val)]
    pub key_value_overrides: Vec<(String, ParamOverrideValue)>,

    /// how many layers to keep on the gpu - zero is cpu mode
    #[clap(short = 'g', long, default_value_t = 0)]
    pub n_gpu_layers: u32,

    /// maximum number of tokens to generate per reply
    #[clap(long, default_value_t = 200)]
    pub max_tokens: u32,

    #[clap(long, default_value_t = 0.3)]
    pub temperature: f32,

    #[clap(long, default_value_t = 20)]
    pub top_k: i32,

    #[clap(long, default_value_t = 0.85)]
    pub top_p: f32,

    #[clap(long, default_value_t = 1.1)]
    pub repeat_penalty: f32,

    /// set the seed for the RNG
    #[clap(short = 's', long, default_value_t = 561371)]
    pub seed: u32,

    /// show llama.cpp's own logs while loading and generating
    #[clap(short = 'v', long, action)]
    pub verbose: bool,
}

impl Args {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            repeat_penalty: self.repeat_penalty,
            seed: self.seed,
            ..GenerationConfig::default()
        }
    }

    /// Resolve the model source and collect the load settings.
    pub fn load_config(&self) -> anyhow::Result<LoadConfig> {
        let model_path = self
            .model
            .clone()
            .get_or_load()
            .with_context(|| "failed to get model from args")?;

        let n_ctx = NonZeroU32::new(self.ctx_size)
            .ok_or_else(|| anyhow!("the context size must be greater than zero"))?;

        Ok(LoadConfig {
            model_path,
            n_ctx,
            n_threads: self.threads,
            n_batch: self.batch_size,
            n_gpu_layers: self.n_gpu_layers,
            verbose: self.verbose,
            kv_overrides: self.key_value_overrides.clone(),
        })
    }
}

/// Parse a single key-value pair
fn parse_key_val(s: &str) -> anyhow::Result<(String, ParamOverrideValue)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    let key = s[..pos].parse()?;
    let value: String = s[pos + 1..].parse()?;
    let value = i64::from_str(&value)
        .map(ParamOverrideValue::Int)
        .or_else(|_| f64::from_str(&value).map(ParamOverrideValue::Float))
        .or_else(|_| bool::from_str(&value).map(ParamOverrideValue::Bool))
        .map_err(|_| anyhow!("must be one of i64, f64, or bool"))?;

    Ok((key, value))
}
