//! Note export surfaces
//!
//! Markdown download of the polished content, and a styled standalone
//! HTML document suitable for printing to PDF with fixed page margins.

use crate::store::Note;

/// Filename for a Markdown download: title with spaces replaced by
/// underscores, `.md` suffix. Control characters and double quotes are
/// stripped; the name ends up inside a quoted Content-Disposition
/// header value.
pub fn markdown_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let base = cleaned.trim();
    let base = if base.is_empty() { "note" } else { base };
    format!("{}.md", base.replace(' ', "_"))
}

/// Markdown export body: the polished content, falling back to the raw
/// transcription when no polish has landed yet.
pub fn markdown_body(note: &Note) -> String {
    if note.polished_note.is_empty() {
        note.raw_transcription.clone()
    } else {
        note.polished_note.clone()
    }
}

/// Render the note as a styled, print-ready HTML document.
pub fn printable_document(note: &Note) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  @page {{ size: a4; margin: 20mm 15mm; }}
  body {{ font-family: Georgia, serif; color: #1a1a1a; max-width: 720px; margin: 0 auto; padding: 24px; line-height: 1.6; }}
  h1.note-title {{ font-size: 28px; border-bottom: 1px solid #ddd; padding-bottom: 8px; }}
  .note-body h1, .note-body h2, .note-body h3 {{ margin-top: 1.2em; }}
  .note-body code {{ background: #f4f4f4; padding: 1px 4px; border-radius: 3px; }}
</style>
</head>
<body>
<h1 class="note-title">{title}</h1>
<div class="note-body">
{body}
</div>
</body>
</html>
"#,
        title = escape(&note.title),
        body = note.polished_note,
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
