//! Attestation Schema CLI
//!
//! Command-line interface for compiling attestation schemas, computing
//! registry UIDs, deriving DID index addresses, and linting schema files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use attestation_schema::{
    address_hex, calculate_uid, did_to_index_address, lint, parse_resolver, uid_hex,
    CompileOptions, CompileSession, FileStatus, Registry, Severity,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attestation-schema")]
#[command(about = "Compile JSON Schemas into on-chain attestation schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RegistryArg {
    /// UID over schema, resolver and revocable (record includes resolver)
    Eas,
    /// UID over the schema string only (record has no resolver)
    SchemaOnly,
}

impl From<RegistryArg> for Registry {
    fn from(arg: RegistryArg) -> Self {
        match arg {
            RegistryArg::Eas => Registry::Eas,
            RegistryArg::SchemaOnly => Registry::SchemaOnly,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON Schema into a registry record
    Compile {
        /// Schema file path
        schema: PathBuf,

        /// Target registry
        #[arg(long, value_enum, default_value = "eas")]
        registry: RegistryArg,

        /// Record name (default: schema title with whitespace as hyphens)
        #[arg(long)]
        name: Option<String>,

        /// Revocable flag (default: auto-detect from a service-handled `revoked` field)
        #[arg(long, action = clap::ArgAction::Set)]
        revocable: Option<bool>,

        /// Resolver address for the eas registry (default: zero address)
        #[arg(long)]
        resolver: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Print the schema UID to stdout after the record
        #[arg(long)]
        print_uid: bool,
    },

    /// Compute the UID of a schema string
    Uid {
        /// Flattened schema string, e.g. "string subject, uint256 score"
        #[arg(long)]
        schema: String,

        /// Target registry
        #[arg(long, value_enum, default_value = "eas")]
        registry: RegistryArg,

        /// Resolver address (default: zero address)
        #[arg(long)]
        resolver: Option<String>,

        /// Revocable flag
        #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
        revocable: bool,
    },

    /// Derive the index address for a DID
    DidIndex {
        /// DID, e.g. did:web:example.com
        did: String,

        /// Output as JSON with the canonical DID hash
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files for errors (syntax, broken refs, unknown annotations)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            schema,
            registry,
            name,
            revocable,
            resolver,
            output,
            pretty,
            print_uid,
        } => run_compile(CompileArgs {
            schema,
            registry: registry.into(),
            name,
            revocable,
            resolver,
            output,
            pretty,
            print_uid,
        }),

        Commands::Uid {
            schema,
            registry,
            resolver,
            revocable,
        } => run_uid(&schema, registry.into(), resolver.as_deref(), revocable),

        Commands::DidIndex { did, json } => run_did_index(&did, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

struct CompileArgs {
    schema: PathBuf,
    registry: Registry,
    name: Option<String>,
    revocable: Option<bool>,
    resolver: Option<String>,
    output: Option<PathBuf>,
    pretty: bool,
    print_uid: bool,
}

fn run_compile(args: CompileArgs) -> Result<(), u8> {
    let mut options = CompileOptions::new(args.registry);
    options.name = args.name;
    options.revocable = args.revocable;
    if let Some(resolver) = &args.resolver {
        options.resolver = Some(parse_resolver(resolver).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?);
    }

    let mut session = CompileSession::new();
    let compiled = session.compile_file(&args.schema, &options).map_err(|e| {
        eprintln!("Error: {}: {}", args.schema.display(), e);
        e.exit_code() as u8
    })?;

    let json_output = if args.pretty {
        serde_json::to_string_pretty(&compiled.record)
    } else {
        serde_json::to_string(&compiled.record)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    if args.print_uid {
        println!("{}", compiled.uid);
    }

    Ok(())
}

fn run_uid(
    schema: &str,
    registry: Registry,
    resolver: Option<&str>,
    revocable: bool,
) -> Result<(), u8> {
    let resolver = match resolver {
        Some(value) => parse_resolver(value).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        None => attestation_schema::Address::ZERO,
    };

    let uid = calculate_uid(registry, schema, resolver, revocable);
    println!("{}", uid_hex(&uid));
    Ok(())
}

fn run_did_index(did: &str, json_output: bool) -> Result<(), u8> {
    let address = did_to_index_address(did).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    if json_output {
        let hash = attestation_schema::did_hash(did).map_err(|e| {
            eprintln!("Error: {}", e);
            2u8
        })?;
        let output = serde_json::json!({
            "did": did,
            "didHash": uid_hex(&hash),
            "indexAddress": address_hex(&address),
        });
        println!("{}", output);
    } else {
        println!("{}", address_hex(&address));
    }
    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let json_output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json_output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
