use chrono::Utc;
use clap::{Parser, Subcommand};
use syllabus_rag_core::{
    AnswerOutcome, GroqGenerator, MiniLmEmbedder, PineconeClient, PineconeIndex, PipelineOptions,
    Session, SyllabusPipeline, DEFAULT_CONTROL_PLANE_URL, DEFAULT_GROQ_URL, DEFAULT_INDEX_NAME,
    EMBEDDING_DIMENSIONS,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "syllabus-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pinecone API key. Without it the index is unavailable: queries run
    /// with an empty context and ingestion fails at the upsert stage.
    #[arg(long, env = "PINECONE_API_KEY")]
    pinecone_api_key: Option<String>,

    /// Pinecone control-plane URL.
    #[arg(long, default_value = DEFAULT_CONTROL_PLANE_URL)]
    pinecone_url: String,

    /// Vector index name.
    #[arg(long, default_value = DEFAULT_INDEX_NAME)]
    index_name: String,

    /// Groq API key. Without it answer generation fails per question.
    #[arg(long, env = "GROQ_API_KEY")]
    groq_api_key: Option<String>,

    /// Groq base URL (OpenAI-compatible).
    #[arg(long, default_value = DEFAULT_GROQ_URL)]
    groq_url: String,

    /// Base URL of the OpenAI-compatible embedding endpoint serving MiniLM.
    #[arg(long, env = "EMBEDDING_URL", default_value = "http://localhost:8080/v1")]
    embedding_url: String,

    /// API key for the embedding endpoint, if it requires one.
    #[arg(long, env = "EMBEDDING_API_KEY")]
    embedding_api_key: Option<String>,

    /// Maximum chunk length in characters.
    #[arg(long, default_value = "500")]
    chunk_size: usize,

    /// Characters of overlap between consecutive chunks.
    #[arg(long, default_value = "50")]
    chunk_overlap: usize,

    /// Number of chunks retrieved per question.
    #[arg(long, default_value = "5")]
    top_k: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a syllabus PDF into the vector index.
    Ingest {
        /// Path to the PDF file.
        #[arg(long)]
        pdf: String,
    },
    /// Ask a single question about the ingested syllabus.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Also print the retrieved context the answer was grounded in.
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },
    /// Interactive chat. `:ingest <path>` ingests a PDF, `:context` shows
    /// the retrieval context of the last answer, `:quit` exits.
    Chat {
        /// PDF to ingest before the first question.
        #[arg(long)]
        pdf: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "syllabus-rag boot"
    );

    let embedder = MiniLmEmbedder::new(&cli.embedding_url, cli.embedding_api_key.clone())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    let generator = GroqGenerator::new(&cli.groq_url, cli.groq_api_key.clone())
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;
    if cli.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; answer generation will fail until it is provided");
    }

    let index = connect_index(&cli).await;
    let options = PipelineOptions {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
        top_k: cli.top_k,
    };
    let pipeline = SyllabusPipeline::new(embedder, index, generator, options);

    match cli.command {
        Command::Ingest { pdf } => {
            ingest_pdf(&pipeline, &pdf).await;
        }
        Command::Ask {
            question,
            show_context,
        } => {
            let mut session = Session::new();
            match pipeline.answer(&mut session, &question).await {
                Ok(outcome) => {
                    println!("assistant: {}", outcome.answer);
                    if show_context {
                        print_context(&outcome);
                    }
                }
                Err(error) => println!("query failed: {error}"),
            }
        }
        Command::Chat { pdf } => {
            if let Some(path) = pdf {
                ingest_pdf(&pipeline, &path).await;
            }
            chat_loop(&pipeline).await?;
        }
    }

    Ok(())
}

/// Resolves the vector index at startup. Every failure mode downgrades to
/// `None` with a warning so the surface stays usable.
async fn connect_index(cli: &Cli) -> Option<PineconeIndex> {
    let api_key = match &cli.pinecone_api_key {
        Some(key) => key,
        None => {
            warn!("PINECONE_API_KEY not set; continuing without a vector index");
            return None;
        }
    };

    let client = match PineconeClient::new(&cli.pinecone_url, api_key) {
        Ok(client) => client,
        Err(error) => {
            warn!(%error, "invalid pinecone configuration; continuing without a vector index");
            return None;
        }
    };

    match client
        .ensure_index(&cli.index_name, EMBEDDING_DIMENSIONS, "cosine")
        .await
    {
        Ok(index) => {
            info!(index = %index.name(), host = %index.host(), "vector index ready");
            Some(index)
        }
        Err(error) => {
            warn!(%error, "could not reach the vector index; continuing without it");
            None
        }
    }
}

async fn ingest_pdf<E, V, G>(pipeline: &SyllabusPipeline<E, V, G>, path: &str)
where
    E: syllabus_rag_core::Embedder + Send + Sync,
    V: syllabus_rag_core::VectorIndex + Send + Sync,
    G: syllabus_rag_core::AnswerGenerator + Send + Sync,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            println!("could not read {path}: {error}");
            return;
        }
    };

    info!(path = %path, bytes = bytes.len(), "ingesting pdf");
    match pipeline.ingest(&bytes).await {
        Ok(report) if report.is_empty() => {
            println!(
                "no text could be extracted from {path}; 0 chunks ingested (document {})",
                report.document_id
            );
        }
        Ok(report) => {
            println!(
                "{} chunks ingested from {path} (document {}) at {}",
                report.chunk_count,
                report.document_id,
                report.ingested_at.to_rfc3339()
            );
        }
        Err(error) => println!("ingestion failed: {error}"),
    }
}

async fn chat_loop<E, V, G>(pipeline: &SyllabusPipeline<E, V, G>) -> anyhow::Result<()>
where
    E: syllabus_rag_core::Embedder + Send + Sync,
    V: syllabus_rag_core::VectorIndex + Send + Sync,
    G: syllabus_rag_core::AnswerGenerator + Send + Sync,
{
    let mut session = Session::new();
    let mut last_outcome: Option<AnswerOutcome> = None;

    println!("syllabus chat. :ingest <path> loads a PDF, :context shows the last");
    println!("retrieval context, :quit exits.");
    if !pipeline.has_index() {
        println!("note: no vector index is connected; answers will not use retrieval.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }

        if input == ":quit" {
            break;
        } else if input == ":context" {
            match &last_outcome {
                Some(outcome) => print_context(outcome),
                None => println!("no answer yet"),
            }
        } else if let Some(path) = input.strip_prefix(":ingest ") {
            ingest_pdf(pipeline, path.trim()).await;
        } else {
            match pipeline.answer(&mut session, input).await {
                Ok(outcome) => {
                    println!("assistant: {}", outcome.answer);
                    last_outcome = Some(outcome);
                }
                // The user message stays in the transcript; the next
                // question starts a fresh query flow.
                Err(error) => println!("query failed: {error}"),
            }
        }

        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    info!(turns = session.len(), "chat session ended");
    Ok(())
}

fn print_context(outcome: &AnswerOutcome) {
    if outcome.context.is_empty() {
        println!("(no context was retrieved)");
    } else {
        println!("--- retrieved context ---");
        println!("{}", outcome.context);
        println!("-------------------------");
    }
}
