//! Envelope Formatter: the fixed, byte-exact textual super-chunk
//! format. Every `render_*` function here is also the authority the
//! Packer uses for size accounting — the two must never drift, so the
//! packer calls these same functions (or their `_len` counterparts)
//! rather than re-deriving the format.

use crate::core::packer::SuperChunk;

/// Worst-case reserved digit width for the "N of M" super-chunk
/// counters. The true counts are only known once packing finishes, so
/// the Packer budgets space using this reservation (comfortably larger
/// than any realistic run) and the Formatter then renders with the
/// real numbers, which are always no wider than reserved — keeping
/// every emitted SuperChunk at or under its budgeted size.
const RESERVED_DIGITS: usize = 4;

pub fn super_chunk_header_budget() -> usize {
    render_super_chunk_header_raw(
        &"9".repeat(RESERVED_DIGITS),
        &"9".repeat(RESERVED_DIGITS),
        false,
    )
    .len()
}

pub fn super_chunk_continuation_header_budget() -> usize {
    render_super_chunk_header_raw(
        &"9".repeat(RESERVED_DIGITS),
        &"9".repeat(RESERVED_DIGITS),
        true,
    )
    .len()
}

fn render_super_chunk_header_raw(n: &str, m: &str, continued: bool) -> String {
    let mut s = format!("[[super chunk {n} of {m}]]\n");
    if continued {
        s.push_str("[[continued from previous super chunk]]\n");
    }
    s.push('\n');
    s
}

pub fn render_super_chunk_header(n: usize, m: usize, continued: bool) -> String {
    render_super_chunk_header_raw(&n.to_string(), &m.to_string(), continued)
}

fn render_super_chunk_footer_raw(n: &str) -> String {
    format!("[[/super chunk {n}]]\n")
}

pub fn render_super_chunk_footer(n: usize) -> String {
    render_super_chunk_footer_raw(&n.to_string())
}

pub fn super_chunk_footer_budget() -> usize {
    render_super_chunk_footer_raw(&"9".repeat(RESERVED_DIGITS)).len()
}

/// The per-super-chunk overhead the Packer must reserve for every fresh
/// `SuperChunk` it opens: its `[[super chunk N of M]]` header (plus the
/// continuation marker once this is no longer the very first one), its
/// `[[/super chunk N]]` footer, and the package footer — since which
/// super chunk will turn out to be last isn't known during the single
/// pack pass, every fresh super chunk reserves room for it, which
/// slightly under-packs every super chunk but one.
pub fn super_chunk_overhead_budget(continuation: bool) -> usize {
    let header = if continuation {
        super_chunk_continuation_header_budget()
    } else {
        super_chunk_header_budget()
    };
    header + super_chunk_footer_budget() + render_package_footer().len()
}

pub fn render_package_footer() -> &'static str {
    "\n[[/chat package]]"
}

/// The one-time package header, sized exactly by the final question list.
pub fn render_package_header(questions: &[String]) -> String {
    let mut s = String::new();
    s.push_str("[[chat package]]\n");
    s.push_str("[[Only respond with OK until all Super Chunks have been provided to you.]]\n\n");
    s.push_str("[[paste all super chunks sequentially]]\n\n");
    s.push_str(
        "[[Answer questions ONLY from the provided content and tell user if other content is needed.]]\n\n",
    );
    s.push_str("Questions:\n");
    for (i, q) in questions.iter().enumerate() {
        s.push_str(&format!("  Q{}: {}\n", i + 1, q));
    }
    s.push('\n');
    s
}

pub fn render_topic_section_header(topic_question: &str, is_continuation: bool) -> String {
    let suffix = if is_continuation { " (continued)" } else { "" };
    format!("[[topic: {topic_question}{suffix}]]\n\n")
}

pub fn render_document_line(document_name: &str) -> String {
    format!("[[document: {document_name}]]\n\n")
}

pub fn render_chunk_envelope(chunk_number: u32, score: f64, content: &str) -> String {
    format!("[[chunk {chunk_number}]] (score: {score:.1})\n{content}\n\n")
}

/// Render a fully packed `SuperChunk` into its final text, matching
/// the byte-exact envelope format above. `index` is 1-based N, `total`
/// is M, `is_last` controls whether the package footer is appended.
pub fn render_super_chunk(
    super_chunk: &SuperChunk,
    index: usize,
    total: usize,
    is_last: bool,
    package_header: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(header) = package_header {
        out.push_str(header);
    }
    out.push_str(&render_super_chunk_header(index, total, index > 1));

    for section in &super_chunk.topics {
        out.push_str(&render_topic_section_header(
            &section.topic_question,
            section.is_continuation,
        ));
        if let Some(first) = section.chunks.first() {
            out.push_str(&render_document_line(&first.document_name));
        }
        for c in &section.chunks {
            out.push_str(&render_chunk_envelope(c.chunk_number, c.score, &c.content));
        }
    }

    out.push_str(&render_super_chunk_footer(index));
    if is_last {
        out.push_str(render_package_footer());
    }
    out
}
