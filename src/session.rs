//! The interactive console loop.
//!
//! One line in, one blocking generation, one reply out. Generation errors are
//! reported and the loop moves on to the next line.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dispatch::Reply;
use crate::error::Result;
use crate::generation::{GenerationConfig, TextGenerator};
use crate::interpreter::{parse_response, Interpretation};
use crate::prompt::PromptBuilder;

pub const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];
const GOODBYE: &str = "👋 Goodbye!";

pub fn is_exit_word(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

pub struct Session<G> {
    generator: G,
    prompts: PromptBuilder,
    config: GenerationConfig,
}

impl<G: TextGenerator> Session<G> {
    pub fn new(generator: G, prompts: PromptBuilder, config: GenerationConfig) -> Self {
        Self {
            generator,
            prompts,
            config,
        }
    }

    pub fn into_generator(self) -> G {
        self.generator
    }

    /// Run one message through the model and describe the result.
    pub fn respond(&mut self, message: &str) -> Result<Reply> {
        let prompt = self.prompts.build_prompt(message);
        let raw = self.generator.generate(&prompt, &self.config)?;
        log::debug!("raw model output: {raw:?}");
        let interpretation = parse_response(&raw);
        if let Interpretation::Parsed { request, .. } = &interpretation {
            log::debug!("parsed action {}", request.action_name());
        }
        let fallback = self.prompts.catalog().fallback();
        Ok(Reply::from_response(raw.trim(), &interpretation, fallback))
    }

    /// Read lines from `input` until an exit word, end of input, or
    /// `interrupted` is set.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
        interrupted: &AtomicBool,
    ) -> io::Result<()> {
        let mut line = String::new();
        loop {
            if interrupted.load(Ordering::SeqCst) {
                writeln!(output, "\n{GOODBYE}")?;
                break;
            }

            write!(output, "\n👤 You: ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output, "\n{GOODBYE}")?;
                break;
            }
            if interrupted.load(Ordering::SeqCst) {
                writeln!(output, "\n{GOODBYE}")?;
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            if is_exit_word(message) {
                writeln!(output, "{GOODBYE}")?;
                break;
            }

            write!(output, "🤖 AI: ")?;
            output.flush()?;

            match self.respond(message) {
                Ok(reply) => {
                    writeln!(output, "{}", reply.headline)?;
                    if let Some(detail) = reply.detail {
                        writeln!(output, "   {detail}")?;
                    }
                }
                Err(e) => {
                    log::error!("generation failed: {e}");
                    writeln!(output, "❌ Error generating: {e}")?;
                }
            }
        }
        Ok(())
    }
}
