use shared::domain::{Draft, DraftField, Talk};

/// Speaker, title and description for each talk, in list order.
pub fn render_talks(talks: &[Talk]) -> String {
    if talks.is_empty() {
        return "(no talks yet)\n".to_string();
    }
    let mut out = String::new();
    for talk in talks {
        out.push_str(&format!(
            "## {}\n   {}\n   {}\n",
            talk.speaker_name, talk.name, talk.description
        ));
    }
    out
}

pub fn render_draft(draft: &Draft) -> String {
    let mut out = String::new();
    for field in DraftField::ALL {
        out.push_str(&format!("{:<12} {}\n", field.input_name(), draft.get(field)));
    }
    out
}
