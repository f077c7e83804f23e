//! Command-line interface parsing and handling
//!
//! `render` replays a file through a conversation in chunks, the way a model
//! would stream it, and prints the resulting transcript.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::conversation::Conversation;
use crate::core::message::MessageKind;
use crate::ui::dispatch::UiThread;
use crate::ui::highlight::SearchHighlighter;
use crate::ui::theme::Theme;
use crate::ui::transcript::TranscriptView;
use crate::utils::logging::{init_tracing, TranscriptLog};

#[derive(Parser)]
#[command(name = "markstream")]
#[command(about = "Incremental Markdown and edit-block renderer for streamed assistant replies")]
#[command(
    long_about = "markstream parses Markdown as it streams in, re-parsing only the part of a \
message that can still change. Fenced code and SEARCH/REPLACE edit blocks are recognized \
while they arrive.\n\n\
Environment Variables:\n\
  MARKSTREAM_LOG    tracing filter, e.g. 'debug' or 'markstream=trace'"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug traces to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a file as a streamed message and print the transcript
    Render {
        /// File with the message text
        file: PathBuf,
        /// Message kind (user, assistant, system, custom)
        #[arg(short = 'k', long, default_value = "assistant")]
        kind: MessageKind,
        /// Bytes per streamed chunk
        #[arg(short = 'c', long)]
        chunk_size: Option<usize>,
        /// Skip compaction after the stream completes
        #[arg(long)]
        no_compact: bool,
        /// Theme name (dark or light)
        #[arg(short = 't', long)]
        theme: Option<String>,
        /// Print one line per block instead of the rendered transcript
        #[arg(short = 'b', long)]
        blocks: bool,
        /// Append the completed message to this transcript log
        #[arg(short = 'l', long)]
        log: Option<PathBuf>,
        /// Mark whole-word matches of this term and report the count
        #[arg(short = 'f', long)]
        find: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

pub struct RenderArgs {
    pub file: PathBuf,
    pub kind: MessageKind,
    pub chunk_size: Option<usize>,
    pub no_compact: bool,
    pub theme: Option<String>,
    pub blocks: bool,
    pub log: Option<PathBuf>,
    pub find: Option<String>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Render {
            file,
            kind,
            chunk_size,
            no_compact,
            theme,
            blocks,
            log,
            find,
        } => {
            let config = Config::load()?;
            let output = render_file(
                &config,
                RenderArgs {
                    file,
                    kind,
                    chunk_size,
                    no_compact,
                    theme,
                    blocks,
                    log,
                    find,
                },
            )?;
            println!("{output}");
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            config.print_all();
            Ok(())
        }
    }
}

/// Streams the file through a conversation and returns what the view shows.
///
/// Runs on a plain thread: the runtime only hosts the session workers, and
/// flushing blocks this thread until the view has caught up.
pub fn render_file(config: &Config, args: RenderArgs) -> Result<String, Box<dyn Error>> {
    let text = fs::read_to_string(&args.file)?;
    let chunk_size = args.chunk_size.filter(|n| *n > 0).unwrap_or(config.chunk_size());
    let theme_name = args
        .theme
        .as_deref()
        .or(config.theme.as_deref())
        .unwrap_or("dark");
    let compact = config.compact_on_complete() && !args.no_compact;

    let runtime = tokio::runtime::Runtime::new()?;
    let ui = UiThread::spawn(TranscriptView::new(Theme::from_name(theme_name)))?;
    let mut conversation = Conversation::new(
        runtime.handle().clone(),
        ui.clone(),
        config.render_options(MessageKind::Assistant),
    );

    let highlighter = args
        .find
        .as_deref()
        .and_then(|term| SearchHighlighter::new(term, false, true));
    if let Some(highlighter) = highlighter {
        ui.invoke_and_wait(move |view| view.set_highlighter(Some(Box::new(highlighter))))?;
    }

    info!(file = %args.file.display(), bytes = text.len(), chunk_size, "replaying file");
    let chunks = split_chunks(&text, chunk_size);
    debug!(chunks = chunks.len(), "split input");
    for chunk in &chunks {
        conversation.append(chunk, args.kind);
    }
    conversation.complete_all();

    if compact {
        let (round, done) = conversation.compact_all();
        runtime.block_on(done)?;
        debug!(%round, "compaction done");
    }
    conversation.flush()?;

    if let Some(path) = args.log {
        let log = TranscriptLog::new(Some(path));
        for message in conversation.messages() {
            log.log_message(&message)?;
        }
    }

    let mut output = if args.blocks {
        ui.invoke_and_wait(|view| view.block_summary().join("\n"))?
    } else {
        ui.invoke_and_wait(|view| view.plain_text())?
    };
    if let Some(term) = args.find {
        let matches = ui.invoke_and_wait(|view| {
            let ids = view.marker_ids();
            view.set_current_marker(ids.first().copied());
            ids.len()
        })?;
        output.push_str(&format!("\n{matches} matches for \"{term}\""));
    }
    Ok(output)
}

/// Splits `text` into pieces of about `size` bytes without cutting a char.
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / size + 1);
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}
