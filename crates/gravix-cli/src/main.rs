//! Gravix CLI - knowledge-graph embedding training from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Train on a TSV of (subject, relation, object) facts
//! gravix train facts.tsv -o model.safetensors --width 200 --convolutions 3
//!
//! # Score triples against a trained checkpoint
//! gravix score model.safetensors model.vocab.json queries.tsv
//!
//! # Link-prediction metrics on held-out facts
//! gravix evaluate facts.tsv --test held_out.tsv
//! ```

use anyhow::{bail, Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use gravix_core::{EdgeOrientation, KnowledgeGraph, Triple, Vocabulary};
use gravix_kge::{persistence, scoring, GcnDistMult, ModelConfig, TrainableModel, Trainer};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gravix")]
#[command(about = "Graph-convolutional knowledge graph embeddings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model on a TSV triplet file
    Train {
        /// Input file: one tab-separated (subject, relation, object) per line
        input: PathBuf,

        /// Checkpoint output path
        #[arg(short, long, default_value = "model.safetensors")]
        output: PathBuf,

        /// Embedding width
        #[arg(long, default_value_t = 200)]
        width: usize,

        /// Number of convolution layers
        #[arg(long, default_value_t = 3)]
        convolutions: usize,

        /// Negative samples per positive
        #[arg(long, default_value_t = 10)]
        negatives: usize,

        /// Minibatch size
        #[arg(long, default_value_t = 4831)]
        batch_size: usize,

        /// Iteration cap
        #[arg(long, default_value_t = 50_000)]
        max_iterations: usize,

        /// Use the direction-distinguishing adjacency variant
        #[arg(long)]
        directed: bool,

        /// Seed for initialization and sampling
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Score triples with a trained checkpoint (raw-parameter path)
    Score {
        /// Checkpoint file
        model: PathBuf,

        /// Vocabulary sidecar written during training
        vocab: PathBuf,

        /// TSV triples to score
        input: PathBuf,
    },

    /// Train and report link-prediction rank metrics on held-out triples
    Evaluate {
        /// Training TSV
        input: PathBuf,

        /// Held-out TSV scored against the trained model
        #[arg(long)]
        test: PathBuf,

        /// Embedding width
        #[arg(long, default_value_t = 200)]
        width: usize,

        /// Iteration cap
        #[arg(long, default_value_t = 50_000)]
        max_iterations: usize,

        /// Seed for initialization and sampling
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

/// Read a TSV triplet file, interning labels as they appear.
fn load_triples(path: &Path, vocab: &mut Vocabulary) -> Result<Vec<Triple>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);
    let progress = ProgressBar::new_spinner();
    progress.set_message(format!("loading {}", path.display()));

    let mut triples = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(s), Some(r), Some(o)) => triples.push(vocab.intern(s, r, o)),
            _ => bail!(
                "{}:{}: expected three tab-separated fields",
                path.display(),
                lineno + 1
            ),
        }
        progress.tick();
    }
    progress.finish_and_clear();

    Ok(triples)
}

/// Resolve an already-interned TSV file against a fixed vocabulary.
fn resolve_triples(path: &Path, vocab: &Vocabulary) -> Result<Vec<(String, String, String, Triple)>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut resolved = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let (Some(s), Some(r), Some(o)) = (fields.next(), fields.next(), fields.next()) else {
            bail!(
                "{}:{}: expected three tab-separated fields",
                path.display(),
                lineno + 1
            );
        };
        let subject = vocab
            .entity_id(s)
            .with_context(|| format!("unknown entity: {s}"))?;
        let relation = vocab
            .relation_id(r)
            .with_context(|| format!("unknown relation: {r}"))?;
        let object = vocab
            .entity_id(o)
            .with_context(|| format!("unknown entity: {o}"))?;
        resolved.push((
            s.to_string(),
            r.to_string(),
            o.to_string(),
            Triple::new(subject, relation, object),
        ));
    }
    Ok(resolved)
}

fn vocab_sidecar(output: &Path) -> PathBuf {
    output.with_extension("vocab.json")
}

#[allow(clippy::too_many_arguments)]
fn train_model(
    input: &Path,
    width: usize,
    convolutions: usize,
    negatives: usize,
    batch_size: usize,
    max_iterations: usize,
    directed: bool,
    seed: u64,
) -> Result<(GcnDistMult, Vocabulary)> {
    let mut vocab = Vocabulary::new();
    let triples = load_triples(input, &mut vocab)?;
    if triples.is_empty() {
        bail!("{}: no triples found", input.display());
    }

    let graph = KnowledgeGraph::new(triples, vocab.entity_count(), vocab.relation_count())?;
    eprintln!(
        "{} entities, {} relations, {} triples",
        graph.n_entities(),
        graph.n_relations(),
        graph.triple_count()
    );

    let orientation = if directed {
        EdgeOrientation::Directed
    } else {
        EdgeOrientation::Collapsed
    };
    let config = ModelConfig::default()
        .with_embedding_width(width)
        .with_convolutions(convolutions)
        .with_negative_samples(negatives)
        .with_batch_size(batch_size)
        .with_edge_orientation(orientation)
        .with_seed(seed);

    let model = GcnDistMult::new(&graph, config, &Device::Cpu)?;
    let options = model
        .optimizer_options()
        .with_max_iterations(max_iterations);

    let mut rng = StdRng::seed_from_u64(seed);
    let report = Trainer::new(options).fit(&model, graph.triples(), &mut rng)?;
    eprintln!(
        "finished after {} iterations, best loss {:.4}",
        report.iterations, report.best_loss
    );

    Ok((model, vocab))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            input,
            output,
            width,
            convolutions,
            negatives,
            batch_size,
            max_iterations,
            directed,
            seed,
        } => {
            let (model, vocab) = train_model(
                &input,
                width,
                convolutions,
                negatives,
                batch_size,
                max_iterations,
                directed,
                seed,
            )?;

            model.save(&output)?;
            let sidecar = vocab_sidecar(&output);
            let mut file = File::create(&sidecar)
                .with_context(|| format!("cannot create {}", sidecar.display()))?;
            serde_json::to_writer(&mut file, &vocab)?;
            file.flush()?;
            eprintln!("wrote {} and {}", output.display(), sidecar.display());
        }

        Commands::Score {
            model,
            vocab,
            input,
        } => {
            let checkpoint = persistence::load(&model, &Device::Cpu)?;

            let file =
                File::open(&vocab).with_context(|| format!("cannot open {}", vocab.display()))?;
            let mut vocab: Vocabulary = serde_json::from_reader(BufReader::new(file))?;
            vocab.rebuild_indexes();

            let queries = resolve_triples(&input, &vocab)?;
            let examples: Vec<Triple> = queries.iter().map(|(_, _, _, t)| *t).collect();
            let scores = scoring::predict(
                &checkpoint.w_embedding,
                &checkpoint.w_relation,
                &examples,
            )?
            .to_vec1::<f32>()?;

            for ((s, r, o, _), score) in queries.iter().zip(scores) {
                println!("{s}\t{r}\t{o}\t{score:.6}");
            }
        }

        Commands::Evaluate {
            input,
            test,
            width,
            max_iterations,
            seed,
        } => {
            let defaults = ModelConfig::default();
            let (model, vocab) = train_model(
                &input,
                width,
                defaults.n_convolutions,
                defaults.negative_samples,
                defaults.batch_size,
                max_iterations,
                false,
                seed,
            )?;

            let held_out = resolve_triples(&test, &vocab)?;
            let examples: Vec<Triple> = held_out.iter().map(|(_, _, _, t)| *t).collect();
            let metrics = gravix_kge::evaluation::evaluate(&model, &examples)?;

            println!("ranks     {}", metrics.num_ranks);
            println!("mrr       {:.4}", metrics.mrr);
            println!("mr        {:.1}", metrics.mr);
            println!("hits@1    {:.4}", metrics.hits_at_1);
            println!("hits@3    {:.4}", metrics.hits_at_3);
            println!("hits@10   {:.4}", metrics.hits_at_10);
        }
    }

    Ok(())
}
