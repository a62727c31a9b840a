use clap::Parser;
use mscript_docs::{DocFormat, generate_docs};
use mscript_lang::Registry;

/// Show documentation for the built-in functions
#[derive(Parser, Debug)]
#[command(name = "mscript-docs")]
struct Cli {
    /// Only document the named functions
    names: Option<Vec<String>>,
    /// Specify the documentation output format
    #[arg(short = 'F', long, value_enum, default_value_t)]
    format: DocFormat,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let output = generate_docs(&Registry::standard(), &cli.names, &cli.format)?;
    println!("{output}");
    Ok(())
}
