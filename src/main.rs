//! AI Agent - command-line entry point.
//!
//! Sends the prompt (positional words, or read interactively) to the model
//! and prints the final answer.

use std::io::Write;
use std::sync::Arc;

use ai_agent::agent::{Agent, AgentEvent, LoopOutcome};
use ai_agent::config::Config;
use ai_agent::llm::GeminiClient;
use ai_agent::progress::SpinningClient;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SPINNER_MESSAGE: &str = "Processing your prompt, please wait one moment ";

/// Coding agent that works inside a sandboxed directory
#[derive(Parser, Debug)]
#[command(name = "ai-agent")]
#[command(version, about, long_about = None)]
struct Args {
    /// Print tool arguments, tool results and token usage
    #[arg(long)]
    verbose: bool,

    /// Model to use for this run (also: GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Prompt words; read from stdin when omitted. Put words starting with `-` after `--`
    prompt: Vec<String>,
}

/// Prompt given on the command line, words joined with single spaces.
fn prompt_from(args: &Args) -> Option<String> {
    if args.prompt.is_empty() {
        None
    } else {
        Some(args.prompt.join(" "))
    }
}

fn is_blank(prompt: &str) -> bool {
    prompt.trim().is_empty()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename("geminiapi.env").ok();
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout only carries the answer
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_agent=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let prompt = match prompt_from(&args) {
        Some(prompt) => prompt,
        None => read_prompt()?,
    };
    if is_blank(&prompt) {
        eprintln!("ERR: No prompt provided.");
        std::process::exit(1);
    }

    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    info!("Loaded configuration: model={}", config.model);

    let llm = Arc::new(SpinningClient::new(
        GeminiClient::new(&config)?,
        SPINNER_MESSAGE,
    ));
    let verbose = args.verbose;
    let agent = Agent::new(config, llm)?.on_event(Arc::new(move |event: &AgentEvent<'_>| {
        print_event(event, verbose);
    }));

    if verbose {
        println!("User prompt: {}", prompt);
        println!(
            "Working directory: {}\n",
            agent.tools().sandbox().path().display()
        );
    }

    let run = agent.run(&prompt).await;

    match run.outcome {
        LoopOutcome::Completed { text, .. } => {
            if verbose {
                println!(
                    "Total tokens: {} prompt, {} response",
                    run.usage.prompt_tokens, run.usage.response_tokens
                );
            }
            println!("Final response:");
            println!("{}", text.trim());
            Ok(())
        }
        LoopOutcome::Exhausted { iterations } => {
            eprintln!(
                "ERR: Reached the maximum of {} iterations without a final response.",
                iterations
            );
            std::process::exit(1);
        }
        LoopOutcome::Faulted { iteration, reason } => {
            eprintln!("ERR: Iteration {} failed: {}", iteration, reason);
            std::process::exit(1);
        }
    }
}

fn read_prompt() -> anyhow::Result<String> {
    print!("Enter your prompt: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn print_event(event: &AgentEvent<'_>, verbose: bool) {
    match event {
        AgentEvent::ToolCalled { invocation } => {
            if verbose {
                println!(
                    " - Calling function: {}({})",
                    invocation.name,
                    serde_json::Value::Object(invocation.arguments.clone())
                );
            } else {
                println!(" - Calling function: {}", invocation.name);
            }
        }
        AgentEvent::ToolFinished { result } => {
            if verbose {
                println!("-> {}", result.content());
            }
        }
        AgentEvent::ModelReplied { iteration, usage } => {
            if verbose {
                match usage {
                    Some(usage) => {
                        println!("Prompt tokens: {}", usage.prompt_tokens);
                        println!("Response tokens: {}", usage.response_tokens);
                    }
                    None => println!("No usage metadata available for iteration {}.", iteration),
                }
            }
        }
    }
}
