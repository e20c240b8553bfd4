//! ontomatch CLI: align two knowledge-base snapshots.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use ontomatch::alignment::{self, Alignment, RelationKind};
use ontomatch::context::MatchContext;
use ontomatch::entity::EntityType;
use ontomatch::matcher::SynonymTable;
use ontomatch::pipeline::{Pipeline, SizeCategory};
use ontomatch::selection::SelectionType;

#[derive(Parser)]
#[command(name = "ontomatch", version, about = "Ontology alignment engine")]
struct Cli {
    /// Source knowledge-base snapshot (JSON).
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Target knowledge-base snapshot (JSON).
    #[arg(long, global = true)]
    target: Option<PathBuf>,

    /// Match configuration (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the matching pipeline and write the alignment.
    Match {
        /// Output file; `.tsv`, `.rdf` or `.xml`.
        #[arg(long)]
        output: PathBuf,

        /// Synonym tables used as background knowledge (one group per line).
        #[arg(long)]
        synonyms: Vec<PathBuf>,

        /// Print the stage reports as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Convert an alignment file between the TSV and RDF formats.
    Convert {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },

    /// Summarize an alignment file.
    Stats {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = load_context(&cli)?;

    match cli.command {
        Commands::Match {
            output,
            synonyms,
            json,
        } => {
            let mut pipeline = Pipeline::from_config(ctx.config())?;
            for path in &synonyms {
                pipeline.add_knowledge(Box::new(SynonymTable::load(path)?));
            }

            let outcome = pipeline.run(&ctx)?;
            alignment::io::save(&outcome.alignment, &ctx, &output)?;

            if json {
                let reports = serde_json::to_string_pretty(&outcome.reports).into_diagnostic()?;
                println!("{reports}");
            } else {
                println!("Size: {}", SizeCategory::of(&ctx));
                println!("{:<28} {:>9} {:>9} {:>7} {:>9}", "stage", "produced", "merged", "gain", "kept");
                for r in &outcome.reports {
                    println!(
                        "{:<28} {:>9} {:>9} {:>7.3} {:>9}",
                        r.stage.to_string(),
                        r.produced,
                        r.merged,
                        r.gain,
                        r.kept
                    );
                }
            }
            println!(
                "Wrote {} mappings ({}) to {}",
                outcome.alignment.len(),
                outcome.selection,
                output.display()
            );
        }

        Commands::Convert { input, output } => {
            let a = alignment::io::load(&ctx, &input)?;
            alignment::io::save(&a, &ctx, &output)?;
            println!(
                "Converted {} mappings: {} -> {}",
                a.len(),
                input.display(),
                output.display()
            );
        }

        Commands::Stats { input } => {
            let a = alignment::io::load(&ctx, &input)?;
            print_stats(&ctx, &a, &input);
        }
    }

    Ok(())
}

fn load_context(cli: &Cli) -> Result<MatchContext> {
    let (Some(source), Some(target)) = (&cli.source, &cli.target) else {
        miette::bail!("both --source and --target snapshots are required");
    };
    Ok(MatchContext::load(source, target, cli.config.as_deref())?)
}

fn print_stats(ctx: &MatchContext, a: &Alignment, input: &Path) {
    println!("Alignment: {}", input.display());
    println!("  mappings:        {}", a.len());
    println!("  cardinality:     {:.3}", a.cardinality());
    println!(
        "  max per entity:  {} source / {} target",
        a.max_source_cardinality(),
        a.max_target_cardinality()
    );
    println!("  suggested policy: {}", SelectionType::detect(a));

    for kind in EntityType::ALL {
        let mapped = a
            .sources()
            .into_iter()
            .filter(|&s| ctx.source().type_of(s) == Some(kind))
            .count();
        if mapped > 0 {
            let coverage = mapped as f64 / ctx.source().count(kind).max(1) as f64;
            println!("  {kind}: {mapped} mapped, {:.1}% of source", coverage * 100.0);
        }
    }
    for relation in RelationKind::ALL {
        let n = a.iter().filter(|m| m.relation == relation).count();
        if n > 0 {
            println!("  relation {relation}: {n}");
        }
    }
}
