use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::pin::pin;

use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::kv_overrides::ParamOverrideValue;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use llama_cpp_2::{send_logs_to_tracing, LogOptions};

use crate::error::{Error, Result};
use crate::generation::{truncate_at_stop, GenerationConfig, TextGenerator};

/// How many recent tokens the repetition penalty looks back over.
const PENALTY_LAST_N: i32 = 64;

/// Load-time settings for the llama.cpp engine.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub model_path: PathBuf,
    pub n_ctx: NonZeroU32,
    pub n_threads: i32,
    pub n_batch: u32,
    /// how many layers to keep on the gpu - zero is cpu mode
    pub n_gpu_layers: u32,
    /// forward llama.cpp's own logging
    pub verbose: bool,
    pub kv_overrides: Vec<(String, ParamOverrideValue)>,
}

/// A loaded GGUF model.
///
/// Every call to `generate` runs in a fresh context, so turns never see each
/// other.
pub struct LLM {
    model: LlamaModel,
    backend: LlamaBackend,
    ctx_params: LlamaContextParams,
    n_batch: usize,
}

impl LLM {
    pub fn load(config: &LoadConfig) -> Result<Self> {
        send_logs_to_tracing(LogOptions::default().with_logs_enabled(config.verbose));

        let backend = LlamaBackend::init()
            .map_err(|e| Error::Load(format!("could not initialize llama backend: {e}")))?;

        // offload layers to the gpu when asked
        let model_params = {
            if config.n_gpu_layers > 0 {
                LlamaModelParams::default().with_n_gpu_layers(config.n_gpu_layers)
            } else {
                LlamaModelParams::default()
            }
        };

        let mut model_params = pin!(model_params);

        for (k, v) in &config.kv_overrides {
            let k = CString::new(k.as_bytes())
                .map_err(|_| Error::Load(format!("invalid override key: {k}")))?;
            model_params.as_mut().append_kv_override(k.as_c_str(), *v);
        }

        if !config.model_path.is_file() {
            return Err(Error::Load(format!(
                "model file not found: {}",
                config.model_path.display()
            )));
        }

        let model = LlamaModel::load_from_file(&backend, &config.model_path, &model_params)
            .map_err(|e| Error::Load(format!("{}: {e}", config.model_path.display())))?;

        log::info!("loaded model from {}", config.model_path.display());

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(Some(config.n_ctx))
            .with_n_batch(config.n_batch)
            .with_n_threads(config.n_threads)
            .with_n_threads_batch(config.n_threads);

        Ok(Self {
            model,
            backend,
            ctx_params,
            n_batch: config.n_batch.max(1) as usize,
        })
    }
}

impl TextGenerator for LLM {
    fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let mut ctx = self
            .model
            .new_context(&self.backend, self.ctx_params.clone())
            .map_err(|e| Error::Generation(format!("unable to create the llama_context: {e}")))?;

        let tokens_list = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| Error::Generation(format!("failed to tokenize prompt: {e}")))?;

        if tokens_list.is_empty() {
            return Err(Error::Generation("prompt produced no tokens".into()));
        }

        // make sure the KV cache is big enough to hold all the prompt and generated tokens
        let n_ctx = ctx.n_ctx();
        if tokens_list.len() + config.max_tokens as usize > n_ctx as usize {
            return Err(Error::ContextOverflow {
                prompt_tokens: tokens_list.len(),
                max_tokens: config.max_tokens,
                n_ctx,
            });
        }

        log::debug!("prompt is {} tokens", tokens_list.len());

        // the prompt can be longer than one batch, feed it in chunks
        let mut batch = LlamaBatch::new(self.n_batch, 1);
        let last_index = tokens_list.len() - 1;
        for (chunk_index, chunk) in tokens_list.chunks(self.n_batch).enumerate() {
            batch.clear();
            for (offset, token) in chunk.iter().enumerate() {
                let i = chunk_index * self.n_batch + offset;
                // llama_decode will output logits only for the last token of the prompt
                batch
                    .add(*token, i as i32, &[0], i == last_index)
                    .map_err(|e| Error::Generation(format!("failed to fill batch: {e}")))?;
            }
            ctx.decode(&mut batch)
                .map_err(|e| Error::Generation(format!("llama_decode() failed: {e}")))?;
        }

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::penalties(PENALTY_LAST_N, config.repeat_penalty, 0.0, 0.0),
            LlamaSampler::top_k(config.top_k),
            LlamaSampler::top_p(config.top_p, 1),
            LlamaSampler::temp(config.temperature),
            LlamaSampler::dist(config.seed),
        ]);

        let mut n_cur = tokens_list.len() as i32;
        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut llm_output = String::new();

        for _ in 0..config.max_tokens {
            // `sample` also accepts the token into the chain
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);

            // is it an end of stream?
            if self.model.is_eog_token(token) {
                break;
            }

            let output_bytes = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| Error::Generation(format!("failed to detokenize: {e}")))?;
            let capacity = decoder
                .max_utf8_buffer_length(output_bytes.len())
                .unwrap_or(32);
            let mut output_string = String::with_capacity(capacity);
            let _decode_result = decoder.decode_to_string(&output_bytes, &mut output_string, false);
            llm_output.push_str(&output_string);

            if truncate_at_stop(&mut llm_output, &config.stop) {
                return Ok(llm_output);
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| Error::Generation(format!("failed to fill batch: {e}")))?;
            n_cur += 1;

            ctx.decode(&mut batch)
                .map_err(|e| Error::Generation(format!("failed to eval: {e}")))?;
        }

        // flush a trailing partial utf-8 sequence
        let mut tail = String::with_capacity(8);
        let _decode_result = decoder.decode_to_string(&[], &mut tail, true);
        llm_output.push_str(&tail);
        truncate_at_stop(&mut llm_output, &config.stop);

        Ok(llm_output)
    }
}
