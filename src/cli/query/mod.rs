//! Query command - answers questions from the command line or stdin

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::domain::{GlutenPipeline, QueryRequest, QueryResponse};

/// Arguments for the query command
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Question to answer; one question per stdin line when omitted
    pub text: Option<String>,

    /// Region hint for substitute ranking (ISO country code, e.g. MA)
    #[arg(long)]
    pub region: Option<String>,

    /// Knowledge base file (overrides config)
    #[arg(long)]
    pub kb: Option<PathBuf>,

    /// Print the structured response as JSON
    #[arg(long)]
    pub json: bool,

    /// Print answers in logical order instead of the shaped rendering
    #[arg(long)]
    pub raw: bool,

    /// Narrate answers with the configured chat model
    #[arg(long)]
    pub narrate: bool,
}

/// Run the query command
pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    if let Some(path) = &args.kb {
        config.knowledge_base.path = Some(path.clone());
    }
    if args.narrate {
        config.generation.enabled = true;
    }

    let pipeline = crate::build_pipeline(&config).await?;

    match &args.text {
        Some(text) => answer(&pipeline, &args, QueryRequest::new(text.as_str())).await,
        None => answer_lines(&pipeline, &args).await,
    }
}

async fn answer_lines(pipeline: &GlutenPipeline, args: &QueryArgs) -> anyhow::Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut answered = 0usize;

    while let Some(request) = next_request(&mut reader).await? {
        answer(pipeline, args, request).await?;
        answered += 1;
    }

    info!(answered, "Finished reading questions from stdin");
    Ok(())
}

/// Next non-blank line as a request. Lines are read as bytes so one line of
/// invalid UTF-8 is repaired instead of ending the batch.
async fn next_request<R>(reader: &mut R) -> std::io::Result<Option<QueryRequest>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }

        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        return Ok(Some(QueryRequest::from_bytes(line)));
    }
}

async fn answer(
    pipeline: &GlutenPipeline,
    args: &QueryArgs,
    mut request: QueryRequest,
) -> anyhow::Result<()> {
    if let Some(region) = &args.region {
        request = request.with_region(region);
    }

    let response = pipeline.query(request).await?;
    for failure in &response.failures {
        warn!(stage = %failure.stage, span = ?failure.span, "{}", failure.message);
    }

    if args.json {
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", format_response(&response, args.raw));
    }

    Ok(())
}

/// Human-readable rendering: the composed answer, then the narration when
/// one was accepted
pub fn format_response(response: &QueryResponse, raw: bool) -> String {
    let mut out = String::new();

    let body = if raw {
        &response.text
    } else {
        &response.display_text
    };
    out.push_str(body);

    if let Some(narration) = &response.narration {
        let narration = if raw {
            narration.clone()
        } else {
            crate::domain::ScriptNormalizer::new().render_for_display(narration)
        };
        let _ = write!(out, "\n\n{}", narration);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AggregateStatus, Language, ScriptTag};
    use uuid::Uuid;

    fn response(text: &str, narration: Option<&str>) -> QueryResponse {
        QueryResponse {
            session_id: Uuid::new_v4(),
            language: Language::English,
            script: ScriptTag::Latin,
            status: AggregateStatus::Contains,
            confidence: 1.0,
            mentions: Vec::new(),
            evidence: Vec::new(),
            caveats: Vec::new(),
            suggestions: Vec::new(),
            text: text.to_string(),
            display_text: text.to_string(),
            narration: narration.map(str::to_string),
            degraded: false,
            failures: Vec::new(),
            index_version: 1,
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_batch() {
        let mut input = &b"wheat\nri\xffce\r\n  \nbarley"[..];

        let mut requests = Vec::new();
        while let Some(request) = next_request(&mut input).await.unwrap() {
            requests.push(request);
        }

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].text, "wheat");
        assert!(requests[0].raw.is_none());
        assert_eq!(requests[1].text, "ri\u{FFFD}ce");
        assert_eq!(requests[1].raw.as_deref(), Some(&b"ri\xffce"[..]));
        assert_eq!(requests[2].text, "barley");
    }

    #[test]
    fn test_format_plain_answer() {
        let formatted = format_response(&response("Bread contains gluten.", None), false);
        assert_eq!(formatted, "Bread contains gluten.");
    }

    #[test]
    fn test_format_appends_narration() {
        let formatted = format_response(
            &response("Bread contains gluten.", Some("Bread is made from wheat.")),
            true,
        );

        assert_eq!(formatted, "Bread contains gluten.\n\nBread is made from wheat.");
    }

    #[test]
    fn test_raw_uses_logical_text() {
        let mut answer = response("الخبز يحتوي على الغلوتين", None);
        answer.display_text = "shaped".to_string();

        assert_eq!(format_response(&answer, true), "الخبز يحتوي على الغلوتين");
        assert_eq!(format_response(&answer, false), "shaped");
    }
}
