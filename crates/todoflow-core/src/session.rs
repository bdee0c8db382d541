use std::io::{BufRead, Write};

use tracing::{debug, info, instrument};

use crate::error::SessionError;
use crate::filter::{FilterMode, ViewQuery};
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Task;

const HELP: &str = "\
Dashboard:
  list                     show the dashboard
  search [term]            set or clear the search term
  filter <mode>            all, completed or pending
  stats                    show task counts
  new                      open the add form
Add form:
  text <description>       set the description
  owner <id>               set the user ID
  done | pending           set the status
  submit                   add the task and return to the dashboard
  cancel                   return to the dashboard, keeping the draft
Other:
  help                     this text
  quit                     leave the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Dashboard,
    AddTask,
}

/// Add-form values as typed, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub text: String,
    pub completed: bool,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    New,
    Search(Option<String>),
    Filter(FilterMode),
    Text(String),
    Owner(String),
    MarkDone,
    MarkPending,
    Submit,
    Cancel,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, SessionError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "list" | "home" | "dashboard" => Command::Home,
            "new" | "add" => Command::New,
            "search" => Command::Search((!rest.is_empty()).then(|| rest.to_string())),
            "filter" => {
                if rest.is_empty() {
                    return Err(SessionError::MissingArgument {
                        command: "filter",
                        hint: "all, completed or pending",
                    });
                }
                let mode = rest.parse::<FilterMode>().map_err(SessionError::InvalidFilter)?;
                Command::Filter(mode)
            }
            "text" => Command::Text(rest.to_string()),
            "owner" | "user" => Command::Owner(rest.to_string()),
            "done" | "completed" => Command::MarkDone,
            "pending" | "undone" => Command::MarkPending,
            "submit" | "save" => Command::Submit,
            "cancel" | "back" => Command::Cancel,
            "stats" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(SessionError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// What the caller should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Dashboard,
    AddForm,
    Added(Task),
    Stats,
    Help,
    Quit,
}

/// Controller state for one run: the store plus what the user is looking at.
#[derive(Debug, Clone)]
pub struct Session {
    store: TaskStore,
    query: ViewQuery,
    page: Page,
    draft: Draft,
}

impl Session {
    pub fn new(store: TaskStore, mode: FilterMode) -> Self {
        Self {
            store,
            query: ViewQuery::new("", mode),
            page: Page::Dashboard,
            draft: Draft::default(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    #[instrument(skip(self))]
    pub fn execute(&mut self, command: Command) -> Result<Response, SessionError> {
        match command {
            Command::Home => {
                self.page = Page::Dashboard;
                Ok(Response::Dashboard)
            }
            Command::New => {
                self.page = Page::AddTask;
                Ok(Response::AddForm)
            }
            Command::Search(term) => {
                self.query.set_search(term.unwrap_or_default());
                self.page = Page::Dashboard;
                Ok(Response::Dashboard)
            }
            Command::Filter(mode) => {
                self.query.set_mode(mode);
                self.page = Page::Dashboard;
                Ok(Response::Dashboard)
            }
            Command::Text(text) => {
                self.require_add_page("text")?;
                self.draft.text = text;
                Ok(Response::AddForm)
            }
            Command::Owner(owner) => {
                self.require_add_page("owner")?;
                self.draft.owner = owner;
                Ok(Response::AddForm)
            }
            Command::MarkDone => {
                self.require_add_page("done")?;
                self.draft.completed = true;
                Ok(Response::AddForm)
            }
            Command::MarkPending => {
                self.require_add_page("pending")?;
                self.draft.completed = false;
                Ok(Response::AddForm)
            }
            Command::Submit => {
                self.require_add_page("submit")?;
                self.submit()
            }
            Command::Cancel => {
                self.page = Page::Dashboard;
                Ok(Response::Dashboard)
            }
            Command::Stats => Ok(Response::Stats),
            Command::Help => Ok(Response::Help),
            Command::Quit => Ok(Response::Quit),
        }
    }

    fn submit(&mut self) -> Result<Response, SessionError> {
        let task = self
            .store
            .insert(&self.draft.text, self.draft.completed, &self.draft.owner)?
            .clone();

        info!(id = task.id, "task added from draft");
        self.draft = Draft::default();
        self.page = Page::Dashboard;
        Ok(Response::Added(task))
    }

    fn require_add_page(&self, command: &'static str) -> Result<(), SessionError> {
        if self.page == Page::AddTask {
            Ok(())
        } else {
            Err(SessionError::NotOnAddPage(command))
        }
    }

    pub fn render<W: Write>(
        &self,
        out: &mut W,
        renderer: &Renderer,
        response: &Response,
    ) -> anyhow::Result<()> {
        match response {
            Response::Dashboard => renderer.print_dashboard(out, &self.store, &self.query),
            Response::AddForm => renderer.print_add_form(out, &self.draft),
            Response::Added(task) => {
                renderer.print_added(out, task)?;
                renderer.print_dashboard(out, &self.store, &self.query)
            }
            Response::Stats => renderer.print_stats(out, self.store.stats()),
            Response::Help => {
                writeln!(out, "{HELP}")?;
                Ok(())
            }
            Response::Quit => Ok(()),
        }
    }

    /// Reads commands line by line until `quit` or end of input.
    ///
    /// Command errors are printed and the loop carries on.
    #[instrument(skip_all)]
    pub fn drive<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
        renderer: &Renderer,
    ) -> anyhow::Result<()> {
        self.render(out, renderer, &Response::Dashboard)?;
        self.prompt(out)?;

        for line in input.lines() {
            let line = line?;
            let response = Command::parse(&line).and_then(|command| match command {
                Some(command) => self.execute(command).map(Some),
                None => Ok(None),
            });

            match response {
                Ok(Some(Response::Quit)) => {
                    debug!("session quit");
                    return Ok(());
                }
                Ok(Some(response)) => self.render(out, renderer, &response)?,
                Ok(None) => {}
                Err(err) => writeln!(out, "error: {err}")?,
            }
            self.prompt(out)?;
        }

        debug!("session input closed");
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let label = match self.page {
            Page::Dashboard => "todoflow> ",
            Page::AddTask => "todoflow:new> ",
        };
        write!(out, "{label}")?;
        out.flush()?;
        Ok(())
    }
}
