use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};

use trellis::decoder::Decoder;
use trellis::fst::VectorFst;
use trellis::hypothesis::Hypothesis;
use trellis::opts::DecoderOpts;
use trellis::output_type::OutputType;
use trellis::scorer::MatrixScorer;
use trellis::symbols::SymbolTable;

fn main() -> Result<()> {
    trellis::logging::init();
    let params = Params::parse();

    if params.graph == "-" && params.scores == "-" {
        bail!("only one of --graph and --scores can read from stdin");
    }

    // Map CLI flags into library options.
    // We keep this mapping explicit so the library stays reusable and the CLI stays thin.
    let opts = DecoderOpts {
        beam: params.beam,
        max_active: params.max_active,
        ..DecoderOpts::default()
    };

    // Load the decoding graph (typically the large input; load it once even
    // if we later grow a multi-utterance mode).
    let graph: VectorFst = serde_json::from_str(&read_input(&params.graph)?)
        .with_context(|| format!("failed to parse decoding graph from {}", params.graph))?;

    // Load the per-frame score matrix for this utterance.
    let scorer: MatrixScorer = serde_json::from_str(&read_input(&params.scores)?)
        .with_context(|| format!("failed to parse score matrix from {}", params.scores))?;
    let num_frames = scorer.num_frames();

    let symbols = params
        .symbols
        .as_deref()
        .map(|path| -> Result<SymbolTable> {
            let file =
                File::open(path).with_context(|| format!("failed to open symbol table: {path}"))?;
            SymbolTable::read(BufReader::new(file))
                .with_context(|| format!("failed to parse symbol table: {path}"))
        })
        .transpose()?;

    let mut decoder = Decoder::with_opts(&graph, opts);
    let reached_final = decoder.decode(&scorer)?;
    let hyp = decoder.best_path();

    if num_frames > 0 {
        tracing::info!(
            reached_final,
            weight = hyp.weight,
            weight_per_frame = hyp.weight / num_frames as f32,
            "decode finished"
        );
    }

    match params.output_type {
        OutputType::Json => {
            serde_json::to_writer(io::stdout().lock(), &hyp)?;
            println!();
        }
        OutputType::Text => {
            println!("{}", render_text(&hyp, symbols.as_ref()));
        }
    }

    Ok(())
}

/// Render the hypothesis in spoken order: through the symbol table when one
/// was given, as raw ids otherwise.
fn render_text(hyp: &Hypothesis, symbols: Option<&SymbolTable>) -> String {
    match symbols {
        Some(table) => hyp.render(table),
        None => hyp
            .spoken_order()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Read a JSON input from a file path, or from stdin when the path is "-".
fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read input file: {path}"))
    }
}

/// CLI parameters for `trellis`.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Decode a per-frame score matrix against a WFST decoding graph")]
struct Params {
    /// Decoding graph as JSON, or "-" to read it from stdin.
    #[arg(short = 'g', long = "graph", required = true)]
    pub graph: String,

    /// Per-frame log-likelihood matrix as a JSON array of rows
    /// (frames x labels), or "-" to read it from stdin.
    #[arg(short = 's', long = "scores", required = true)]
    pub scores: String,

    /// Optional symbol table (`word id` lines) used to render words as text.
    #[arg(short = 'w', long = "symbols")]
    pub symbols: Option<String>,

    /// Output format for the decoded hypothesis.
    #[arg(
        short = 'o',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Text
    )]
    pub output_type: OutputType,

    /// Beam width in cost units; tokens worse than the frame's best by more
    /// than this are pruned.
    #[arg(long = "beam", default_value_t = DecoderOpts::default().beam)]
    pub beam: f32,

    /// Target ceiling on live tokens per frame.
    #[arg(long = "max-active", default_value_t = DecoderOpts::default().max_active)]
    pub max_active: usize,
}
