use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use trekipsum::config::Config;
use trekipsum::{logging, ChainStore, DialogChooser, DialogLearner};

/// TrekIpsum generator
#[derive(Parser, Debug)]
#[command(name = "trekipsum", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Chain store file (overrides the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON config file
    #[arg(long, default_value = "trekipsum.json", global = true)]
    config: PathBuf,

    /// Verbose mode; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the chain store from a JSON list of [speaker, line] pairs
    Build {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Print generated lines of dialog
    Generate {
        /// Limit output to this speaker
        #[arg(short, long)]
        speaker: Option<String>,

        /// Lines of dialog to output
        #[arg(short, long)]
        count: Option<usize>,

        /// Hide speaker attribution
        #[arg(long)]
        no_attribute: bool,

        /// Seed for repeatable output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List speakers with dialog
    Speakers,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    logging::init(cli.verbose, &config.log_level);

    let command = cli.command.unwrap_or(Commands::Generate {
        speaker: None,
        count: None,
        no_attribute: false,
        seed: None,
    });

    match command {
        Commands::Build { input } => {
            let reader = BufReader::new(
                File::open(&input).with_context(|| format!("opening {}", input.display()))?,
            );
            let dialog: Vec<(String, String)> = serde_json::from_reader(reader)
                .with_context(|| format!("parsing {}", input.display()))?;

            let mut learner = DialogLearner::new();
            learner.learn_all(dialog);

            let mut store = ChainStore::open(&config.store_path)?;
            let rows = learner.write_to(&mut store)?;
            store.close()?;
            eprintln!(
                "Stored {} links for {} lines in '{}'",
                rows,
                learner.line_count(),
                config.store_path.display()
            );
        }
        Commands::Generate {
            speaker,
            count,
            no_attribute,
            seed,
        } => {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let store = ChainStore::open(&config.store_path)?;
            let mut chooser = DialogChooser::with_rng(store, rng);
            for _ in 0..count.unwrap_or(config.count) {
                match chooser.random_dialog(speaker.as_deref()) {
                    Ok((speaker, line)) => println!("{}", format_dialog(&line, &speaker, !no_attribute)),
                    Err(e) if e.is_no_dialog() => {
                        eprintln!("{}", e);
                        return Ok(ExitCode::FAILURE);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            chooser.into_store().close()?;
        }
        Commands::Speakers => {
            let store = ChainStore::open(&config.store_path)?;
            let chooser = DialogChooser::new(store);
            for speaker in chooser.speakers()? {
                println!("{}", title_case(&speaker));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `'line' -- Speaker`, or just `'line'` without attribution.
fn format_dialog(line: &str, speaker: &str, show_speaker: bool) -> String {
    let quoted = quote_line(line);
    if show_speaker {
        format!("{} -- {}", quoted, title_case(speaker))
    } else {
        quoted
    }
}

/// Quotes `line` the way a Python `repr` would: single quotes unless the line
/// holds a `'` and no `"`, with backslashes and control characters escaped.
fn quote_line(line: &str) -> String {
    let quote = if line.contains('\'') && !line.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(line.len() + 2);
    out.push(quote);
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\x7f' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Upper-cases the first letter of each alphabetic run, lower-cases the rest.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
