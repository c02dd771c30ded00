//! doclist CLI - Work with a Google Documents List account.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

use doclist::models::format_size;
use doclist::{
    ClientConfig, ConvertOptions, Credentials, DeleteOptions, DocsClient, GetOptions, LocalFile,
    PutOptions, ResourceId, SearchOptions,
};

/// CLI tool for the Google Documents List API.
#[derive(Parser)]
#[command(name = "doclist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account email.
    #[arg(long, env = "DOCLIST_EMAIL")]
    email: Option<String>,

    /// Account password.
    #[arg(long, env = "DOCLIST_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// JSON file with "email" and "password" (overrides --email/--password).
    #[arg(long, env = "DOCLIST_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Skip TLS certificate verification.
    #[arg(long)]
    insecure: bool,

    /// Log requests to stderr.
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search documents by title.
    Search {
        query: String,

        /// Match the title exactly.
        #[arg(long)]
        exact: bool,
    },

    /// Upload files.
    Put {
        /// File patterns to upload (supports glob patterns like *.csv, file_{1,2,3}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Title to store the upload under (defaults to the file name).
        #[arg(long)]
        title: Option<String>,
    },

    /// Export a resource to the local filesystem.
    Get {
        /// Resource id (e.g. document:12345) or exact title.
        query: String,

        /// Export format (e.g. pdf, doc, csv).
        #[arg(long, short = 'f')]
        format: Option<String>,

        /// Spreadsheet sheet index.
        #[arg(long)]
        sheet: Option<u32>,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Delete a resource.
    Delete {
        /// Resource id or exact title.
        query: String,

        /// Move to trash instead of deleting permanently.
        #[arg(long)]
        trash: bool,
    },

    /// Convert a local file through the service.
    Convert {
        file: PathBuf,

        /// Target format.
        #[arg(long, short = 'f')]
        format: String,

        #[arg(long)]
        title: Option<String>,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let credentials = match &cli.credentials {
        Some(path) => Credentials::from_file(path)
            .with_context(|| format!("Failed to load credentials from {:?}", path))?,
        None => Credentials::new(
            cli.email.clone().unwrap_or_default(),
            cli.password.clone().unwrap_or_default(),
        ),
    };

    let config = ClientConfig::default()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_accept_invalid_certs(cli.insecure);
    let client = DocsClient::new(credentials, config).context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Search { query, exact } => {
            let ids = client
                .search(&query, &SearchOptions { exact })
                .with_context(|| format!("Failed to search for: {}", query))?;

            if ids.is_empty() {
                println!("No documents found.");
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }

        Commands::Put { patterns, title } => {
            let files = expand_patterns(&patterns)?;
            if files.is_empty() {
                anyhow::bail!("No files to upload");
            }
            if title.is_some() && files.len() > 1 {
                anyhow::bail!("--title can only be used with a single file");
            }

            println!("Uploading {} file(s)...", files.len());

            let options = PutOptions { title };
            let mut failures = 0;
            for (idx, path) in files.iter().enumerate() {
                let filename = path.file_name().unwrap_or_default().to_string_lossy();
                print!("[{}/{}] Uploading {}... ", idx + 1, files.len(), filename);

                let result = LocalFile::open(path)
                    .map_err(doclist::DocsError::from)
                    .and_then(|mut file| client.put(&mut file, &options));
                match result {
                    Ok(Some(id)) => println!("OK ({})", id),
                    Ok(None) => {
                        failures += 1;
                        println!("FAILED");
                        eprintln!("  Error: upload was not accepted");
                    }
                    Err(e) => {
                        failures += 1;
                        println!("FAILED");
                        eprintln!("  Error: {}", e);
                    }
                }
            }

            println!("Done.");
            if failures > 0 {
                anyhow::bail!("{} upload(s) failed", failures);
            }
        }

        Commands::Get {
            query,
            format,
            sheet,
            to,
        } => {
            let options = GetOptions {
                format: format.clone(),
                sheet,
            };
            print!("Downloading {}... ", query);

            let exported = client
                .get(&query, &options)
                .with_context(|| format!("Failed to download: {}", query))?
                .with_context(|| format!("Nothing found for: {}", query))?;

            let name = export_name(&query, format.as_deref());
            let saved = save(exported, &to, &name)?;
            println!("OK");
            println!("Saved to: {:?} ({})", saved, file_size(&saved));
        }

        Commands::Delete { query, trash } => {
            client
                .delete_strict(&query, &DeleteOptions { trash })
                .with_context(|| format!("Failed to delete: {}", query))?;
            println!("Deleted {}", query);
        }

        Commands::Convert {
            file,
            format,
            title,
            to,
        } => {
            let mut upload = LocalFile::open(&file)
                .with_context(|| format!("Failed to open {:?}", file))?;
            let options = ConvertOptions {
                title,
                format: Some(format.clone()),
            };

            let converted = client
                .convert(&mut upload, &options)
                .with_context(|| format!("Failed to convert {:?}", file))?
                .with_context(|| format!("Upload of {:?} was not accepted", file))?;

            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "converted".to_string());
            let saved = save(converted, &to, &format!("{}.{}", stem, format))?;
            println!("Saved to: {:?} ({})", saved, file_size(&saved));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "doclist=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand glob and brace patterns into existing files, deduplicated.
fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        for expanded_pattern in expand_braces(pattern) {
            let matches: Vec<PathBuf> = glob(&expanded_pattern)
                .with_context(|| format!("Invalid glob pattern: {}", expanded_pattern))?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();

            if matches.is_empty() {
                // If no glob matches, treat as literal path
                let path = PathBuf::from(&expanded_pattern);
                if path.is_file() {
                    files.push(path);
                } else {
                    eprintln!("Warning: No files matched pattern: {}", expanded_pattern);
                }
            } else {
                files.extend(matches);
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand brace patterns like file_{1,2,3}.txt into multiple patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}') {
            let end = start + end;
            let prefix = &pattern[..start];
            let suffix = &pattern[end + 1..];
            let alternatives = &pattern[start + 1..end];

            return alternatives
                .split(',')
                .flat_map(|alt| {
                    let expanded = format!("{}{}{}", prefix, alt.trim(), suffix);
                    expand_braces(&expanded)
                })
                .collect();
        }
    }

    vec![pattern.to_string()]
}

/// Default file name for an export: the opaque id (or title) plus format.
fn export_name(query: &str, format: Option<&str>) -> String {
    let base = query
        .parse::<ResourceId>()
        .map(|id| id.opaque().to_string())
        .unwrap_or_else(|_| query.replace(['/', '\\'], "_"));
    match format {
        Some(format) => format!("{}.{}", base, format),
        None => base,
    }
}

/// Copy a temporary export to its destination; directories get `name`.
fn save(exported: NamedTempFile, to: &Path, name: &str) -> Result<PathBuf> {
    let final_path = if to.is_dir() || to.to_string_lossy().ends_with('/') {
        std::fs::create_dir_all(to)
            .with_context(|| format!("Failed to create directory: {:?}", to))?;
        to.join(name)
    } else {
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }
        to.to_path_buf()
    };

    std::fs::copy(exported.path(), &final_path)
        .with_context(|| format!("Failed to write {:?}", final_path))?;
    Ok(final_path)
}

fn file_size(path: &Path) -> String {
    std::fs::metadata(path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "-".to_string())
}
