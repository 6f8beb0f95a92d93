//! xmlpipe command line: stream a document between files or stdio, piping
//! selected elements through long-lived shell subscribers.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use xmlpipe::StreamEditor;

#[derive(Debug, Parser)]
#[command(
    name = "xmlpipe",
    version,
    about = "Edit XML streams in place by piping selected elements through shell commands",
    after_help = "Example:\n  \
        echo '<foo><bar>a</bar></foo>' | xmlpipe -s \"foo=jq -c '.bar |= ascii_upcase'\"\n  \
        <foo><bar>A</bar></foo>"
)]
struct Cli {
    /// Input file, or `-` for standard input.
    #[arg(default_value = "-")]
    input: String,

    /// Output file, or `-` for standard output.
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Subscriber shells per element name, as `NAME=SHELL`. Each matched
    /// element's JSON projection is piped through the shell, one line in,
    /// one line out.
    #[arg(short, long = "subscribers", value_name = "NAME=SHELL")]
    subscribers: Vec<String>,

    /// Element names scanned past and dropped inside matched subtrees.
    #[arg(long = "skip", value_name = "NAME")]
    skip: Vec<String>,

    /// Log verbosity: off, error, warn, info, debug or trace.
    #[arg(short, long, default_value = "warn", value_name = "LEVEL")]
    verbosity: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(cli: &Cli) -> Result<()> {
    let reader: Box<dyn Read> = match cli.input.as_str() {
        "-" => Box::new(io::stdin().lock()),
        path => Box::new(File::open(path).with_context(|| format!("cannot open {path}"))?),
    };
    let writer: Box<dyn Write> = match cli.output.as_str() {
        "-" => Box::new(io::stdout().lock()),
        path => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {path}"))?,
        )),
    };

    let mut editor = StreamEditor::new(reader, writer);
    for name in &cli.skip {
        editor.skip_element(name.clone());
    }
    for entry in &cli.subscribers {
        let (name, command) = entry
            .split_once('=')
            .with_context(|| format!("subscriber `{entry}` is not of the form NAME=SHELL"))?;
        editor.register_shell(name, command)?;
    }

    editor.run()?;
    info!("processed {} bytes", editor.bytes_read());
    Ok(())
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
