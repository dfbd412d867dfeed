//! `tb scan` command implementation.

use std::path::PathBuf;

use clap::Args;
use tb_content::{Candidate, diagram_keyword, find_diagrams};

use super::{GlobalArgs, body_source};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the scan command.
#[derive(Args)]
pub(crate) struct ScanArgs {
    /// HTML file with the post body (default: stdin).
    file: Option<PathBuf>,

    /// Fetch the post with this slug from the blog API.
    #[arg(long, conflicts_with = "file")]
    slug: Option<String>,
}

impl ScanArgs {
    /// Execute the scan command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let config = global.load_config()?;

        let body = body_source(self.file.as_deref(), self.slug.as_deref(), None).read(&config)?;
        let found = find_diagrams(&body.html)?;

        if found.is_empty() {
            output.info("No diagram blocks found.");
            return Ok(());
        }

        output.highlight(&format!("Found {} diagram block(s):", found.len()));
        for (index, candidate) in found.iter().enumerate() {
            output.info(&describe(index, candidate));
            for line in candidate.text.lines().skip(1).take(3) {
                output.detail(&format!("      {line}"));
            }
        }
        Ok(())
    }
}

fn describe(index: usize, candidate: &Candidate) -> String {
    let keyword = diagram_keyword(&candidate.text).unwrap_or("?");
    let lines = candidate.text.lines().count();
    format!(
        "  {}. {keyword} ({}, {lines} line(s))",
        index + 1,
        candidate.shape.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tb_content::CandidateShape;

    #[test]
    fn test_describe_candidate() {
        let candidate = Candidate {
            shape: CandidateShape::CodeLineRun,
            text: "sequenceDiagram\nA->>B: hi".to_owned(),
            parent: vec![0],
            members: vec![0, 1],
        };
        assert_eq!(
            describe(0, &candidate),
            "  1. sequenceDiagram (code-lines, 2 line(s))"
        );
    }
}
