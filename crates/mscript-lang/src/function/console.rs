use std::{
    fmt::Debug,
    io::Write,
    sync::{Arc, Mutex},
};

use crate::{
    Environment, Target, Value,
    error::runtime::{Exception, ExceptionKind},
};

use super::{Arity, Example, Function, ThreadAffinity, arg};

/// Where `console` writes. Installed into an [`Environment`] as `Arc<dyn Console>`.
pub trait Console: Send + Sync + Debug {
    fn write_line(&self, line: &str);
}

#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", line) {
            tracing::warn!(error = %e, "failed to write console output");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct BufferConsole {
    lines: Mutex<Vec<String>>,
}

impl BufferConsole {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl Console for BufferConsole {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[derive(Debug)]
pub struct ConsoleWrite;

impl Function for ConsoleWrite {
    fn name(&self) -> &'static str {
        "console"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn params(&self) -> &'static [&'static str] {
        &["message"]
    }

    fn docs(&self) -> &'static str {
        "Writes message to the console and returns null."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[Example::new("Print a line", "console('hello')", "null")];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        &[]
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::MainThread
    }

    fn execute(&self, args: &[Value], _target: &Target, env: &Environment) -> Result<Value, Exception> {
        let message = arg(args, 0).to_text();

        match env.get::<Arc<dyn Console>>() {
            Some(console) => console.write_line(&message),
            None => tracing::info!(target: "mscript::console", "{}", message),
        }

        Ok(Value::Null)
    }
}
