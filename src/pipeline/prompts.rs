//! Instruction template for the model path.

use chrono::{Datelike, NaiveDate};

use crate::dates::format_iso;
use crate::types::Category;

/// Build the system prompt, anchored to `reference`.
///
/// Relative phrases in the user's prompt are only deterministic if the
/// model knows what "today" is.
pub fn instruction_template(reference: NaiveDate) -> String {
    let categories = Category::ALL
        .iter()
        .map(|c| format!("{} for {}", c.id(), c.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a task creation assistant. Today is {weekday}, {today}.\n\
         Based on the user's description, extract the following details:\n\
         - title: a concise title for the task\n\
         - description: a detailed description of what needs to be done\n\
         - priority: exactly one of 'Low', 'Medium' or 'High'\n\
         - category_id: a category ID ({categories})\n\
         - due_date: the due date in YYYY-MM-DD format, resolving relative \
           phrases such as 'next Monday' against today's date\n\
         - assigned_to: the name of the person the task is for, only if one is mentioned\n\
         \n\
         Respond with a single JSON object with these fields and nothing else.",
        weekday = reference.weekday(),
        today = format_iso(reference),
    )
}
