//! Human-readable rendering of conflicts.
//!
//! Everything here is built from the structured [`Conflict`] values, so a
//! resolution prompt never has to parse previously displayed text.

use similar::{ChangeTag, TextDiff};

use crate::models::{Conflict, Quote};

/// One-line description of a conflict
pub fn summarize(conflict: &Conflict) -> String {
    let mut fields = Vec::new();
    if conflict.text_differs() {
        fields.push("text");
    }
    if conflict.category_differs() {
        fields.push("category");
    }
    format!("Quote {} differs in {}", conflict.id, fields.join(" and "))
}

/// Unified line diff between the local and server version of a conflict
pub fn diff_preview(conflict: &Conflict) -> String {
    let local = render(&conflict.local);
    let server = render(&conflict.server);
    let diff = TextDiff::from_lines(&local, &server);

    let mut output = String::new();
    output.push_str("--- Local\n");
    output.push_str("+++ Server\n");

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(sign);
        output.push_str(change.value());
    }

    output
}

fn render(quote: &Quote) -> String {
    format!("text: {}\ncategory: {}\n", quote.text, quote.category)
}
