use std::fs;
use std::io::{self, BufWriter, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use transcript_qa::answer_encoder::encoder_for;
use transcript_qa::logging;
use transcript_qa::openai::{DEFAULT_BASE_URL, OpenAiClient, OpenAiConfig};
use transcript_qa::{Engine, Opts, OutputType};

fn main() {
    let params = Params::parse();
    logging::init_with_default(logging::level_for_verbosity(params.verbose));

    if let Err(err) = run(params) {
        error!(error = ?err, "transcript-qa failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(params: Params) -> Result<()> {
    let transcript = read_transcript(&params.transcript)?;
    let client = OpenAiClient::new(params.client_config())?;
    let engine = Engine::with_opts(client, params.opts());

    let answer = engine.answer(&params.query, &transcript)?;

    let stdout = io::stdout();
    let mut encoder = encoder_for(params.output_type, BufWriter::new(stdout.lock()));
    encoder.write_answer(&answer)?;
    encoder.close()?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "transcript-qa")]
#[command(about = "Ask grounded questions about a timestamped transcript")]
struct Params {
    /// Transcript file with one `[start --> end] text` cue per line, or `-` for stdin.
    #[arg(short = 't', long = "transcript")]
    transcript: String,

    /// The question to answer.
    #[arg(short = 'q', long = "query")]
    query: String,

    /// OpenAI-compatible API root. The key is read from `OPENAI_API_KEY`.
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long = "chat-model", default_value = "gpt-4o-mini")]
    chat_model: String,

    #[arg(long = "embedding-model", default_value = "text-embedding-3-small")]
    embedding_model: String,

    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Text
    )]
    output_type: OutputType,

    /// Timeout for each model call, in seconds. `0` disables timeouts.
    #[arg(long = "timeout-secs", default_value_t = 60)]
    timeout_secs: u64,

    /// Maximum number of segments kept by relevance ranking.
    #[arg(long = "top-k", default_value_t = 6)]
    top_k: usize,

    /// Minimum cosine similarity for a segment to count as relevant.
    #[arg(long = "min-similarity", default_value_t = 0.30)]
    min_similarity: f32,

    /// Raise the default log level (`-v` warn, `-vv` info, `-vvv` debug). `TRANSCRIPT_QA_LOG`
    /// overrides it.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Params {
    fn opts(&self) -> Opts {
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        Opts {
            top_k: self.top_k,
            min_similarity: self.min_similarity,
            ..Opts::default()
        }
        .with_timeout(timeout)
    }

    fn client_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            chat_model: self.chat_model.clone(),
            embedding_model: self.embedding_model.clone(),
            ..OpenAiConfig::default()
        }
    }
}

fn read_transcript(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read transcript from stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(Path::new(path))
        .with_context(|| format!("failed to read transcript: {path}"))
}
