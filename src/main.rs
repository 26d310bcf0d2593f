//! chapterize - split an EPUB into per-chapter text files

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chapterize::extract::DEFAULT_MIN_TEXT_LEN;
use chapterize::{
    EpubImporter, Error, ExtractConfig, GenericTitles, Importer, ProgressEvent, TocEntry,
    extract_book,
};

#[derive(Parser)]
#[command(name = "chapterize")]
#[command(version, about = "Split an EPUB into one text file per chapter", long_about = None)]
#[command(after_help = "EXAMPLES:
    chapterize novel.epub               Write chapters to ./novel/
    chapterize novel.epub out/          Write chapters to out/
    chapterize -i novel.epub            Show book metadata
    chapterize --json novel.epub        Emit progress as JSON lines")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output directory [default: next to INPUT, named after it]
    #[arg(value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Show book metadata without extracting
    #[arg(short, long)]
    info: bool,

    /// Skip chapters with less text than this
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MIN_TEXT_LEN)]
    min_length: usize,

    /// Treat TEXT as a placeholder title (repeatable)
    #[arg(long = "generic-title", value_name = "TEXT")]
    generic_titles: Vec<String>,

    /// Print progress events as JSON lines
    #[arg(long)]
    json: bool,

    /// Suppress per-chapter output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    // Paths pasted from a file manager often keep their quotes.
    let input = PathBuf::from(cli.input.trim().trim_matches('"'));

    let result = if cli.info {
        show_info(&input)
    } else {
        extract(&input, &cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn open(path: &Path) -> Result<EpubImporter<std::io::BufReader<std::fs::File>>, Error> {
    EpubImporter::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn show_info(path: &Path) -> Result<(), Error> {
    let book = open(path)?;

    let meta = book.metadata();
    println!("File: {}", path.display());
    println!("Title: {}", meta.title);
    if !meta.authors.is_empty() {
        println!("Authors: {}", meta.authors.join(", "));
    }
    if !meta.language.is_empty() {
        println!("Language: {}", meta.language);
    }
    if let Some(ref publisher) = meta.publisher {
        println!("Publisher: {publisher}");
    }
    if let Some(ref desc) = meta.description {
        let desc = desc.trim();
        match desc.char_indices().nth(200) {
            Some((end, _)) => println!("Description: {}...", &desc[..end]),
            None => println!("Description: {desc}"),
        }
    }
    println!("Chapters: {}", book.spine().len());
    println!(
        "TOC entries: {}",
        book.toc().iter().map(TocEntry::count).sum::<usize>()
    );

    Ok(())
}

fn extract(input: &Path, cli: &Cli) -> Result<(), Error> {
    let mut book = open(input)?;
    let out_dir = match &cli.output {
        Some(dir) => dir.clone(),
        None => default_output_dir(input),
    };

    let generic = GenericTitles::default().with_all(cli.generic_titles.iter().map(String::as_str));
    let config = ExtractConfig::default()
        .with_min_text_len(cli.min_length)
        .with_generic_titles(generic);

    let summary = extract_book(&mut book, &out_dir, &config, |event| {
        if cli.json {
            print_json(event);
        } else if !cli.quiet {
            println!("[{:5.1}%] {}", event.percent, event.status);
        }
    })?;

    if !cli.quiet && !cli.json {
        println!(
            "Wrote {} of {} chapters to {}",
            summary.written,
            summary.total,
            out_dir.display()
        );
    }
    Ok(())
}

fn print_json(event: &ProgressEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "cannot serialize progress event"),
    }
}

/// `<dir>/<stem>` beside the input file.
fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "chapters".into());
    let dir = input.with_file_name(&stem);
    if dir == input {
        input.with_file_name(format!("{}_chapters", stem.to_string_lossy()))
    } else {
        dir
    }
}
