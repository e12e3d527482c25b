//! mkdict: command-line access to the Macedonian morphological dictionary
//!
//! ```bash
//! mkdict count
//! mkdict lookup куќа
//! mkdict suggest ку --limit 5
//! mkdict --dataset ./msd-mk.sqlite --json details куќи
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use mkdict_lib::config::{default_config_path, load_config};
use mkdict_lib::lexicon::queries::DEFAULT_SUGGESTION_LIMIT;
use mkdict_lib::{decode_tag, Lexicon, LexiconError, SearchOutcome, WordForm};

#[derive(Parser, Debug)]
#[command(name = "mkdict")]
#[command(version)]
#[command(about = "Query the Macedonian morphological dictionary", long_about = None)]
struct Args {
    /// Server hosting the dataset file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Read the dataset from a local file instead of downloading it
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Skip the persistent dataset cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Number of forms in the dictionary
    Count,
    /// Exact, case-sensitive lookup of a form
    Lookup { form: String },
    /// Forms starting with a letter
    Letter { letter: String },
    /// Free-text search; an exact match wins over the list
    Search { term: String },
    /// Ranked search suggestions
    Suggest {
        term: String,
        #[arg(short, long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Other forms of a lemma
    Similar { lemma: String, form: String },
    /// A random form
    Random,
    /// Look up several forms at once
    Batch {
        #[arg(required = true)]
        forms: Vec<String>,
    },
    /// Form, decoded tag and related forms
    Details { form: String },
    /// Decode a morphosyntactic tag without loading the dataset
    Decode { tag: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mkdict: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), LexiconError> {
    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(path) = args.dataset {
        config.dataset_file = Some(path);
    }
    if args.no_cache {
        config.cache_enabled = false;
    }

    // Nothing is downloaded until the first query, so `decode` stays offline
    let lexicon = Lexicon::from_config(&config)?;
    query(&lexicon, args.command, args.json).await
}

async fn query(lexicon: &Lexicon, command: Command, json: bool) -> Result<(), LexiconError> {
    match command {
        Command::Count => {
            let count = lexicon.total_forms().await?;
            if json {
                print_json(&count)?;
            } else {
                println!("{}", count);
            }
        }
        Command::Lookup { form } => match lexicon.word_by_form(&form).await? {
            Some(word) if !json => print_word(&word),
            None if !json => eprintln!("no such form: {}", form),
            found => print_json(&found)?,
        },
        Command::Letter { letter } => print_words(&lexicon.words_by_letter(&letter).await?, json)?,
        Command::Search { term } => {
            let outcome = lexicon.search(&term).await?;
            if json {
                print_json(&outcome)?;
            } else {
                match outcome {
                    SearchOutcome::Exact(word) => print_word(&word),
                    SearchOutcome::Matches(words) => print_words(&words, false)?,
                }
            }
        }
        Command::Suggest { term, limit } => {
            print_lines(&lexicon.search_suggestions(&term, limit).await?, json)?
        }
        Command::Similar { lemma, form } => {
            print_lines(&lexicon.similar_forms(&lemma, &form).await?, json)?
        }
        Command::Random => match lexicon.random_form().await? {
            Some(form) if !json => println!("{}", form),
            None if !json => eprintln!("the dictionary is empty"),
            form => print_json(&form)?,
        },
        Command::Batch { forms } => print_words(&lexicon.words_by_forms(&forms).await?, json)?,
        Command::Details { form } => match lexicon.details(&form).await? {
            Some(details) if !json => {
                print_word(&details.word);
                println!("  {}", details.description);
                if !details.similar.is_empty() {
                    println!("  {}", details.similar.join(", "));
                }
            }
            None if !json => eprintln!("no such form: {}", form),
            details => print_json(&details)?,
        },
        Command::Decode { tag } => {
            let description = decode_tag(Some(tag.as_str()));
            if json {
                print_json(&description)?;
            } else {
                println!("{}", description);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LexiconError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| LexiconError::Io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_word(word: &WordForm) {
    println!(
        "{}\t{}\t{}",
        word.form,
        word.lemma,
        word.tag.as_deref().unwrap_or("-")
    );
}

fn print_words(words: &[WordForm], json: bool) -> Result<(), LexiconError> {
    if json {
        return print_json(&words);
    }
    for word in words {
        print_word(word);
    }
    Ok(())
}

fn print_lines(lines: &[String], json: bool) -> Result<(), LexiconError> {
    if json {
        return print_json(&lines);
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
