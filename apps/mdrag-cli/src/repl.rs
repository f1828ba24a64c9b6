use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use mdrag_core::types::QueryResult;
use mdrag_qa::QueryService;

pub const PROMPT: &str = "Enter your query (or 'exit' to quit): ";

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Read questions from `input` until `exit`/`quit` or end of input, printing
/// each answer and its sources to `output`. A failed question is reported
/// and the loop carries on.
pub async fn run<R: AsyncBufRead + Unpin, W: Write>(service: &QueryService, mut input: R, mut output: W) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            writeln!(output)?;
            return Ok(());
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit(question) {
            return Ok(());
        }

        match service.answer(question).await {
            Ok(result) => print_result(&mut output, &result)?,
            Err(e) => {
                tracing::warn!(error = %e, "question failed");
                writeln!(output, "\nError: {e}\n")?;
            }
        }
    }
}

/// The answer followed by one `- source` line per cited chunk.
pub fn print_result<W: Write>(output: &mut W, result: &QueryResult) -> std::io::Result<()> {
    writeln!(output, "\nAnswer: {}\n", result.answer)?;
    writeln!(output, "Source Documents:")?;
    for source in &result.sources {
        writeln!(output, "- {source}")?;
    }
    writeln!(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_ignore_case() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(is_exit("Exit"));
        assert!(!is_exit("exit now"));
    }
}
