//! Transcript markup — keyword highlighting over finalized words.
//!
//! Finalized transcripts are split into word tokens; tokens found in the
//! keyword table are wrapped in a colored span, everything else is appended
//! as plain text. Within a session the accumulated markup only ever grows.
//! Pure functions, no I/O.

use regex::Regex;
use std::sync::LazyLock;

use crate::locale::KeywordTable;

/// Opening wrapper of the provisional (interim) fragment.
const INTERIM_OPEN: &str = "<i style=\"color:#999999;\">";

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_DIM: &str = "\x1b[2m";

// Compiled regexes — allocated once, reused across calls.
static RE_OPEN_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span class="transcript" style="background-color: ([a-z]+);">"#).unwrap()
});
static RE_ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?(?:span|i)[^>]*>").unwrap());

/// Append one finalized transcript to the accumulated markup.
///
/// The transcript is trimmed and split on single spaces; each token is
/// looked up (case-folded, punctuation intact) in the keyword table.
/// Keyword hits become a background-colored span, misses stay plain.
/// Every token lands with a leading separator space.
pub fn append_final(out: &mut String, transcript: &str, table: &KeywordTable) {
    for token in transcript.trim().split(' ') {
        match table.color_for(token) {
            Some(color) => out.push_str(&format!(
                " <span class=\"transcript\" style=\"background-color: {color};\">{token}</span>"
            )),
            None => {
                out.push(' ');
                out.push_str(token);
            }
        }
    }
}

/// Full display markup: accumulated final output followed by the
/// provisional fragment in muted italics. The caller replaces any prior
/// rendering wholesale with this.
pub fn render(accumulated: &str, interim: &str) -> String {
    format!("{accumulated}{}{interim}</i>", INTERIM_OPEN)
}

/// Strip all markup, leaving the raw transcript text.
pub fn to_plain_text(markup: &str) -> String {
    RE_ANY_TAG.replace_all(markup, "").into_owned()
}

/// Convert transcript markup to ANSI-colored terminal text: keyword spans
/// become background-colored words, the provisional fragment becomes dim.
pub fn to_ansi(markup: &str) -> String {
    let s = RE_OPEN_SPAN.replace_all(markup, |caps: &regex::Captures| ansi_bg(&caps[1]));
    let s = s.replace("</span>", ANSI_RESET);
    let s = s.replace(INTERIM_OPEN, ANSI_DIM);
    s.replace("</i>", ANSI_RESET)
}

/// ANSI background code for one of the five keyword colors.
fn ansi_bg(color: &str) -> &'static str {
    match color {
        "red" => "\x1b[41;97m",
        "orange" => "\x1b[48;5;208;30m",
        "yellow" => "\x1b[43;30m",
        "green" => "\x1b[42;30m",
        "blue" => "\x1b[44;97m",
        _ => "",
    }
}
