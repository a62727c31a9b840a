use std::{
    fmt::Display,
    fs,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use clap::Parser;
use miette::{IntoDiagnostic, miette};
use mscript_lang::{Engine, StdoutConsole};

use crate::config::Config;

#[derive(Parser, Debug, Default)]
#[command(name = "mscript")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(after_help = "# Examples:\n\n\
    ## To run a script:\n\
    mscript \"reg_replace('(\\w+)@(\\w+)', '$2 at $1', 'me@home')\"\n\n\
    ## To run a script file:\n\
    mscript -f script.ms\n\n\
    ## To show the program after optimization:\n\
    mscript --emit-ast \"reg_split(',', 'a,b')\"\n\n\
    ## To read the script from stdin:\n\
    echo \"reg_count('a', 'banana')\" | mscript")]
#[command(
    about = "mscript evaluates scripts built from regular expression and string functions.",
    long_about = None
)]
pub struct Cli {
    /// Load the script from the file
    #[arg(short, long, default_value_t = false)]
    from_file: bool,

    /// Evaluate the script as parsed, without the optimizer
    #[arg(long, default_value_t = false)]
    no_optimize: bool,

    /// Do not memoise calls with literal arguments
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Print the compiled program instead of evaluating it
    #[arg(long, default_value_t = false)]
    emit_ast: bool,

    /// Script text, or a path when --from-file is set. Read from stdin when omitted.
    #[arg(value_name = "SCRIPT OR FILE")]
    script: Option<String>,
}

impl Cli {
    /// Applies the command line flags on top of `config`.
    pub fn apply(&self, mut config: Config) -> Config {
        if self.no_optimize {
            config.optimize = false;
        }
        if self.no_cache {
            config.cache_results = false;
        }
        config
    }

    pub fn run(&self, config: &Config) -> miette::Result<()> {
        let (code, file_name) = self.read_script()?;
        let engine = self.engine(config, file_name);
        let program = engine.compile(&code)?;

        if self.emit_ast {
            return print(program.iter());
        }

        tracing::debug!(
            optimize = config.optimize,
            cache = config.cache_results,
            statements = program.len(),
            "evaluating script"
        );
        let value = engine.eval_program(&program, &code)?;
        print(std::iter::once(value))
    }

    fn engine(&self, config: &Config, file_name: Option<String>) -> Engine {
        let mut engine = Engine::default().with_console(Arc::new(StdoutConsole));
        engine.set_optimize(config.optimize);
        engine.set_cache_results(config.cache_results);
        if let Some(file_name) = file_name {
            engine.set_file_name(file_name);
        }
        engine
    }

    fn read_script(&self) -> miette::Result<(String, Option<String>)> {
        match self.script.as_ref() {
            Some(path) if self.from_file => {
                let path = PathBuf::from_str(path).into_diagnostic()?;
                if !path.exists() {
                    return Err(miette!("File not found: {}", path.display()));
                }
                let code = fs::read_to_string(&path).into_diagnostic()?;
                Ok((code, Some(path.to_string_lossy().to_string())))
            }
            Some(code) => Ok((code.clone(), None)),
            None if self.from_file => Err(miette!("A file name is required with --from-file")),
            None => {
                let mut code = String::new();
                io::stdin().read_to_string(&mut code).into_diagnostic()?;
                Ok((code, None))
            }
        }
    }
}

fn print<T: Display>(items: impl IntoIterator<Item = T>) -> miette::Result<()> {
    let stdout = io::stdout();
    let mut handle = BufWriter::new(stdout.lock());

    for item in items {
        writeln!(handle, "{}", item).into_diagnostic()?;
    }

    handle.flush().into_diagnostic()
}
