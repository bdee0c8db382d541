use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::filter::ViewQuery;
use crate::session::Draft;
use crate::store::{Stats, TaskStore};
use crate::task::Task;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// `color` should already account for whether the sink is a terminal.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_dashboard<W: Write>(
        &self,
        out: &mut W,
        store: &TaskStore,
        query: &ViewQuery,
    ) -> anyhow::Result<()> {
        if store.is_loading() {
            writeln!(out, "Loading your todos...")?;
            return Ok(());
        }

        if let Some(error) = store.error() {
            writeln!(out, "{}", self.paint("Unable to load todos", "31"))?;
            writeln!(out, "{error}")?;
            return Ok(());
        }

        self.print_stats(out, store.stats())?;
        writeln!(out)?;

        let visible = query.apply(store.tasks());
        if visible.is_empty() {
            if query.is_narrowed() {
                writeln!(out, "No matching todos found")?;
                writeln!(out, "Try adjusting your search or filter criteria")?;
            } else {
                writeln!(out, "No todos yet")?;
                writeln!(out, "Start by adding your first todo item")?;
            }
            return Ok(());
        }

        if query.is_narrowed() {
            writeln!(
                out,
                "Showing {} of {} (search: {:?}, filter: {})",
                visible.len(),
                store.len(),
                query.search(),
                query.mode()
            )?;
        }
        self.print_task_table(out, &visible)
    }

    pub fn print_stats<W: Write>(&self, out: &mut W, stats: Stats) -> anyhow::Result<()> {
        writeln!(
            out,
            "Total Tasks {}   Completed {}   In Progress {}",
            self.paint(&stats.total.to_string(), "34"),
            self.paint(&stats.completed.to_string(), "32"),
            self.paint(&stats.pending.to_string(), "33"),
        )?;
        Ok(())
    }

    pub fn print_task_table<W: Write>(&self, out: &mut W, tasks: &[&Task]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Owner".to_string(),
            "Task".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                let status = if task.completed {
                    self.paint(task.status_label(), "32")
                } else {
                    self.paint(task.status_label(), "33")
                };
                vec![
                    task.id.to_string(),
                    status,
                    format!("User {}", task.owner_id),
                    task.text.clone(),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_add_form<W: Write>(&self, out: &mut W, draft: &Draft) -> anyhow::Result<()> {
        writeln!(out, "Create New Todo")?;
        writeln!(out, "  description  {}", draft.text)?;
        writeln!(
            out,
            "  status       {}",
            if draft.completed {
                "Completed"
            } else {
                "In Progress"
            }
        )?;
        writeln!(out, "  user id      {}", draft.owner)?;
        writeln!(
            out,
            "Set fields with 'text', 'owner', 'done' or 'pending'; then 'submit' or 'cancel'."
        )?;
        Ok(())
    }

    pub fn print_added<W: Write>(&self, out: &mut W, task: &Task) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} (ID {})",
            self.paint("Todo added successfully!", "32"),
            task.id
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
