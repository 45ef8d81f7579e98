//! Citation marker resolution.
//!
//! Maps an answer string plus a source list to a sequence of renderable
//! segments. Markers look like `[3]`: an opening bracket, one or more
//! digits, a closing bracket, indexing 1-based into the turn's web sources.
//! Pure and stateless; the presentation layer consumes the segments.

use std::sync::LazyLock;

use regex::Regex;

use lantern_core::types::{Source, SourceSet};

/// `[digits]` citation marker. Compiled once, reused across calls.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("Invalid citation marker regex"));

/// One renderable piece of an answer.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Literal answer text, including any markers that failed to resolve.
    Text(String),
    /// A resolved citation link. `index` is the 1-based marker value.
    Citation { index: u32, source: Source },
}

/// Resolve citation markers in `answer` against the turn's source list.
///
/// Ordering and multiplicity of markers are preserved exactly; the same
/// source may be cited any number of times. Out-of-range or unparsable
/// markers degrade to literal text rather than erroring. Adjacent literal
/// runs are merged into a single `Text` segment.
pub fn resolve(answer: &str, sources: &SourceSet) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut cursor = 0;

    for caps in MARKER.captures_iter(answer) {
        let whole = caps.get(0).expect("capture 0 always present");
        text.push_str(&answer[cursor..whole.start()]);
        cursor = whole.end();

        // Digit runs longer than u32 fail to parse and stay literal.
        let resolved = caps[1]
            .parse::<u32>()
            .ok()
            .and_then(|n| sources.by_position(n).map(|s| (n, s.clone())));

        match resolved {
            Some((index, source)) => {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Citation { index, source });
            }
            None => text.push_str(whole.as_str()),
        }
    }

    text.push_str(&answer[cursor..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}

// =============================================================================
// Tests
// =============================================================================
