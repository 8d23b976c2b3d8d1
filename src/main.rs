use std::io::{self, Write};

use clap::{Parser, ValueEnum};
use minire::{Flags, Found, Haystack, Match, Pattern, PatternBuilder};
use tracing_subscriber::EnvFilter;

/// Run a pattern against one input and print the match and its groups.
#[derive(Parser)]
#[command(name = "minire")]
#[command(version, about, long_about = None)]
struct Cli {
    pattern: String,
    input: String,

    #[arg(long, value_enum, default_value_t = Mode::Search)]
    mode: Mode,

    /// Inline flag letters, e.g. `ix`
    #[arg(long, default_value = "")]
    flags: String,

    /// Treat pattern and input as bytes (one byte per char, which must be below U+0100)
    #[arg(long)]
    bytes: bool,

    /// Maximum VM steps per match
    #[arg(long)]
    step_limit: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Search,
    Match,
    Fullmatch,
    Findall,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    if let Err(err) = run(&cli, &mut out) {
        writeln!(out, "ERROR:{err}")?;
    }
    Ok(())
}

fn run(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let flags = Flags::from_letters(&cli.flags)
        .ok_or_else(|| anyhow::anyhow!("unknown flag letters: {}", cli.flags))?;
    if cli.bytes {
        let pattern = latin1(&cli.pattern)?;
        let input = latin1(&cli.input)?;
        let mut builder = PatternBuilder::bytes(&pattern);
        configure(&mut builder, cli, flags);
        report(&builder.build()?, input.as_slice(), cli.mode, out)
    } else {
        let mut builder = PatternBuilder::new(&cli.pattern);
        configure(&mut builder, cli, flags);
        report(&builder.build()?, cli.input.as_str(), cli.mode, out)
    }
}

fn configure(builder: &mut PatternBuilder, cli: &Cli, flags: Flags) {
    builder.flags(flags);
    if let Some(limit) = cli.step_limit {
        builder.step_limit(limit);
    }
}

fn latin1(text: &str) -> anyhow::Result<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(c).map_err(|_| anyhow::anyhow!("{c:?} is not a single byte")))
        .collect()
}

fn report<H: Haystack + ?Sized>(
    pattern: &Pattern,
    input: &H,
    mode: Mode,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let found = match mode {
        Mode::Search => pattern.search(input)?,
        Mode::Match => pattern.prefix_match(input)?,
        Mode::Fullmatch => pattern.fullmatch(input)?,
        Mode::Findall => {
            let items = pattern.findall(input)?;
            if items.is_empty() {
                writeln!(out, "NO_MATCH")?;
            }
            for item in items {
                match item {
                    Found::Text(text) => writeln!(out, "MATCH:{}", display(text))?,
                    Found::Groups(groups) => {
                        let parts: Vec<String> = groups.into_iter().map(display).collect();
                        writeln!(out, "MATCH:({})", parts.join(", "))?;
                    }
                }
            }
            return Ok(());
        }
    };
    match found {
        Some(m) => print_match(&m, out)?,
        None => writeln!(out, "NO_MATCH")?,
    }
    Ok(())
}

fn print_match<H: Haystack + ?Sized>(m: &Match<'_, H>, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "MATCH:{}", display(m.as_text()))?;
    for (i, group) in m.groups().into_iter().enumerate() {
        let text = group.map(display).unwrap_or_default();
        writeln!(out, "GROUP {}:{}", i + 1, text)?;
    }
    Ok(())
}

fn display<H: Haystack + ?Sized>(text: &H) -> String {
    text.to_pattern_text()
}
