//! Terminal rendering for answers and source lists.

use lantern_core::types::{Source, SourceSet, Turn, TurnStatus};
use lantern_engine::{resolve, Segment};

/// Sources actually cited by the answer, in first-citation order,
/// deduplicated by position.
pub fn cited_sources(turn: &Turn) -> Vec<Source> {
    let mut seen = Vec::new();
    let mut out: Vec<Source> = Vec::new();
    for segment in resolve(&turn.answer, &turn.sources) {
        if let Segment::Citation { source, .. } = segment {
            if !seen.contains(&source.position) {
                seen.push(source.position);
                out.push(source);
            }
        }
    }
    out
}

/// Footer printed after a turn seals: cited sources for a completed
/// answer, or the recorded error for a failed one.
pub fn render_footer(turn: &Turn) -> String {
    match turn.status {
        TurnStatus::Failed => {
            let reason = turn.error.as_deref().unwrap_or("unknown error");
            format!("\nError: {}", reason)
        }
        _ => {
            let cited = cited_sources(turn);
            if cited.is_empty() {
                String::new()
            } else {
                let mut out = String::from("\nSources:");
                for source in cited {
                    out.push_str(&format!(
                        "\n  [{}] {} ({})",
                        source.position, source.title, source.link
                    ));
                }
                out
            }
        }
    }
}

/// Full source listing for the `/sources` command.
pub fn render_source_list(sources: &SourceSet) -> String {
    if sources.is_empty() {
        return "No sources for this turn.".to_string();
    }
    let mut out = String::new();
    for source in &sources.search_results {
        out.push_str(&format!(
            "[{}] {} ({})\n    {}\n",
            source.position, source.title, source.link, source.snippet
        ));
    }
    if !sources.video_results.is_empty() {
        out.push_str("Videos:\n");
        for video in &sources.video_results {
            out.push_str(&format!("  {} ({})\n", video.title, video.link));
        }
    }
    out.trim_end().to_string()
}
