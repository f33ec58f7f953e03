use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use wayfarer_agents::{
    ConciergeAgent, PipelineConfig, PipelineEvent, ProgressSink, StagePhase, TripPlanner,
};
use wayfarer_core::{parse_trip_request, render_failure, render_report, ChatInput};
use wayfarer_llm::{OpenAiConfig, OpenAiGenerator};
use wayfarer_observability::{init_tracing, AppMetrics};
use wayfarer_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "wayfarer")]
#[command(about = "Wayfarer travel planner CLI")]
struct Cli {
    /// SQLite URL for chat history; in-memory when unset.
    #[arg(long, env = "WAYFARER_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive planning session.
    Chat,
    /// Plan a single trip from a free-text description.
    Plan {
        text: String,
        /// Print the full report as JSON instead of markdown.
        #[arg(long)]
        json: bool,
    },
    /// Show what the parser extracts, without calling any model.
    Parse { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfarer_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Parse { text } => match parse_trip_request(&text) {
            Ok(request) => println!("{}", serde_json::to_string_pretty(&request)?),
            Err(error) => bail!(render_failure(&error)),
        },
        Command::Plan { text, json } => {
            let planner = build_planner(AppMetrics::shared())?;
            let (progress, events) = ProgressSink::channel();
            let printer = spawn_progress_printer(events);

            let result = planner.plan(&text, &progress).await;
            drop(progress);
            let _ = printer.await;

            match result {
                Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
                Ok(report) => println!("{}", render_report(&report)),
                Err(error) => bail!(render_failure(&error)),
            }
        }
        Command::Chat => {
            let agent = build_agent(cli.database_url.as_deref()).await?;
            run_chat(agent).await?;
        }
    }

    Ok(())
}

async fn run_chat(agent: ConciergeAgent<Store>) -> Result<()> {
    let mut session_id: Option<String> = None;

    println!("Wayfarer chat mode. Describe a trip, or type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let (progress, events) = ProgressSink::channel();
        let printer = spawn_progress_printer(events);
        let reply = agent
            .handle_chat_with_progress(
                ChatInput {
                    session_id: session_id.clone(),
                    text: message.to_string(),
                },
                &progress,
            )
            .await;
        drop(progress);
        let _ = printer.await;
        let reply = reply?;

        session_id = Some(reply.session_id);
        println!("\n{}\n", reply.reply_text);
    }

    Ok(())
}

fn spawn_progress_printer(mut events: UnboundedReceiver<PipelineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let marker = match event.phase {
                StagePhase::Started => "..",
                StagePhase::Finished => "ok",
                StagePhase::Degraded => "!!",
                StagePhase::Failed => "xx",
            };
            match event.detail {
                Some(detail) => eprintln!("[{marker}] {} ({detail})", event.stage.as_str()),
                None => eprintln!("[{marker}] {}", event.stage.as_str()),
            }
        }
    })
}

fn build_planner(metrics: Arc<AppMetrics>) -> Result<TripPlanner> {
    let Some(config) = OpenAiConfig::from_env() else {
        bail!("WAYFARER_OPENAI_API_KEY is not set; export it to plan trips");
    };
    let generator = OpenAiGenerator::new(config).context("failed to build OpenAI HTTP client")?;

    Ok(TripPlanner::new(
        Arc::new(generator),
        PipelineConfig::from_env(),
        metrics,
    ))
}

async fn build_agent(database_url: Option<&str>) -> Result<ConciergeAgent<Store>> {
    let metrics = AppMetrics::shared();
    let planner = build_planner(metrics.clone())?;

    let store = match database_url {
        Some(url) => Store::sqlite(url)
            .await
            .with_context(|| format!("failed opening chat history at {url}"))?,
        None => Store::memory(),
    };

    Ok(ConciergeAgent::new(planner, Arc::new(store), metrics))
}
