//! Interactive input collection
//!
//! Generic over the reader and writer so the prompts can be driven from a
//! byte buffer in tests.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::error::{OnboardError, OnboardResult};
use crate::types::{Scheme, ServiceRequest};

/// Answers supplied up front; any `None` is asked for interactively
#[derive(Debug, Clone, Default)]
pub struct Answers {
    pub name: Option<String>,
    pub address: Option<String>,
    pub scheme: Option<String>,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one line, without its line terminator
    pub fn ask(&mut self, question: &str) -> OnboardResult<String> {
        write!(self.output, "{}", question)
            .and_then(|_| self.output.flush())
            .map_err(stdio_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(stdio_error)?;
        if read == 0 {
            return Err(OnboardError::NoInput(question.trim().to_string()));
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Gather name, address and scheme, prompting for whatever is missing.
    ///
    /// Only the scheme is validated.
    pub fn collect(&mut self, preset: Answers) -> OnboardResult<ServiceRequest> {
        let name = match preset.name {
            Some(name) => name,
            None => self.ask("Enter the name of your service: ")?,
        };
        let address = match preset.address {
            Some(address) => address,
            None => self.ask(&format!("Enter the IP address of {}: ", name))?,
        };
        let scheme = match preset.scheme {
            Some(scheme) => scheme,
            None => self.ask("Enter the scheme (http or https) for the service: ")?,
        };
        let scheme: Scheme = scheme.parse()?;

        Ok(ServiceRequest {
            name,
            address,
            scheme,
        })
    }
}

fn stdio_error(source: std::io::Error) -> OnboardError {
    OnboardError::Io {
        path: PathBuf::from("<stdio>"),
        source,
    }
}
