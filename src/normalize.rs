//! Field-value normalization of reconstructed regions.
//!
//! A [`Normalizer`] turns a region's serialized content into a JSON document of
//! field/value pairs. Failures never fail a page: they are recorded on the
//! region as `normalize_error`.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::{Error, Result};
use crate::model::{FragmentKind, RegionRecord};

/// Trait for region normalizers.
pub trait Normalizer: Send + Sync {
    /// Normalize a region's content. The returned text must be JSON.
    fn normalize(&self, content: &str, kind: FragmentKind) -> Result<String>;

    /// Normalizer name, used in log messages.
    fn name(&self) -> &str {
        "normalizer"
    }
}

impl<F> Normalizer for F
where
    F: Fn(&str, FragmentKind) -> Result<String> + Send + Sync,
{
    fn normalize(&self, content: &str, kind: FragmentKind) -> Result<String> {
        self(content, kind)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Normalizer backed by an external command.
///
/// The content is written to the command's stdin and its stdout is read back.
/// The fragment kind is passed in the `DOCORDER_KIND` environment variable.
#[derive(Debug, Clone)]
pub struct CommandNormalizer {
    program: String,
    args: Vec<String>,
}

impl CommandNormalizer {
    /// Create a normalizer running `program` without arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Parse a whitespace-separated command line.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::Normalize("empty normalizer command".into()))?;
        Ok(Self::new(program).with_args(parts))
    }

    /// Append an argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Normalizer for CommandNormalizer {
    fn normalize(&self, content: &str, kind: FragmentKind) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("DOCORDER_KIND", kind.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Normalize(format!("failed to run '{}': {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Normalize("stdin not captured".into()))?;
        let input = content.to_string();
        // Feed stdin from another thread so a chatty child cannot block us.
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            // The child may legitimately exit without reading everything.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(Error::Normalize("stdin writer panicked".into())),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Normalize(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::Normalize(format!("output is not UTF-8: {}", e)))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Run `normalizer` on a region and store the outcome on it.
///
/// Returns `true` when the region received a parsed JSON value.
pub fn apply(normalizer: &dyn Normalizer, region: &mut RegionRecord) -> bool {
    let outcome = normalizer
        .normalize(&region.content, region.kind)
        .and_then(|text| serde_json::from_str(text.trim()).map_err(Error::from));

    match outcome {
        Ok(value) => {
            region.normalized = Some(value);
            region.normalize_error = None;
            true
        }
        Err(err) => {
            log::warn!(
                "Page {}: {} failed on {} region: {}",
                region.page_no,
                normalizer.name(),
                region.kind,
                err
            );
            region.normalized = None;
            region.normalize_error = Some(err.to_string());
            false
        }
    }
}
