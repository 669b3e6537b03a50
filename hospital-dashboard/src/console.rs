//! 命令行展示层
//!
//! 把输入的命令行转换为导航、登录或记录操作意图，并把结果渲染为文本。
//! 校验和修改全部交给实体仓储，这里只负责显示。

use chrono::Local;
use hospital_admin::AuthContext;
use hospital_core::{HospitalError, RecordId, Result};
use hospital_records::{
    Chip, Collection, CommitOutcome, ConfirmPrompt, Confirmation, DeleteRequest, EditSession,
    EntityStore, IdStrategy, Intent, Reaction, SessionEvent, Summary,
};
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::dashboard::Overview;
use crate::navigation::{Navigator, Route};

const HELP: &str = "\
commands:
  login <email> <password>   log in
  logout                     log out
  go <page>                  login | dashboard | patients | appointments | billings
  list                       show the current page
  search [term]              filter the current list (empty clears)
  add                        open a new record dialog
  edit <id>                  open an edit dialog
  set <field> <value>        change a field in the open dialog
  save | cancel              close the dialog
  delete <id>                delete a record after confirmation
  summary                    totals by status (billings)
  export                     print the current list as JSON
  help | quit";

/// 一条控制台命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Login { email: String, password: String },
    Logout,
    Go(Route),
    List,
    Search(String),
    Add,
    Edit(RecordId),
    Set { field: String, value: String },
    Save,
    Cancel,
    Delete(RecordId),
    Summary,
    Export,
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "login" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some(email), Some(password)) => Command::Login {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    _ => return Err("usage: login <email> <password>".to_string()),
                }
            }
            "logout" => Command::Logout,
            "go" => Command::Go(Route::parse(rest).ok_or_else(|| format!("unknown page '{}'", rest))?),
            "list" | "show" => Command::List,
            "search" => Command::Search(rest.to_string()),
            "add" => Command::Add,
            "edit" => Command::Edit(required_id(rest, "edit")?),
            "set" => match rest.split_once(char::is_whitespace) {
                Some((field, value)) => Command::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                },
                None if !rest.is_empty() => Command::Set {
                    field: rest.to_string(),
                    value: String::new(),
                },
                None => return Err("usage: set <field> <value>".to_string()),
            },
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "delete" => Command::Delete(required_id(rest, "delete")?),
            "summary" => Command::Summary,
            "export" => Command::Export,
            "" => return Err(String::new()),
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(command)
    }
}

fn required_id(rest: &str, command: &str) -> std::result::Result<RecordId, String> {
    match rest.split_whitespace().next() {
        Some(id) => Ok(RecordId::new(id.to_ascii_uppercase())),
        None => Err(format!("usage: {} <id>", command)),
    }
}

/// 从同一输入流读取 y/N 回答
pub struct LinePrompt<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> LinePrompt<'a, R, W> {
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmPrompt for LinePrompt<'_, R, W> {
    fn confirm(&mut self, request: &DeleteRequest) -> Confirmation {
        let asked = write!(self.output, "{} [y/N] ", request.message()).and_then(|_| self.output.flush());
        if asked.is_err() {
            return Confirmation::Cancelled;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(n) if n > 0 => {
                Confirmation::from(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
            }
            _ => Confirmation::Cancelled,
        }
    }
}

/// 控制台
pub struct Console {
    auth: AuthContext,
    navigator: Navigator,
    stores: HashMap<Collection, EntityStore>,
}

impl Console {
    pub fn new(auth: AuthContext, navigator: Navigator, strategy: IdStrategy) -> Result<Self> {
        let mut stores = HashMap::new();
        for collection in Collection::ALL {
            stores.insert(collection, EntityStore::for_collection(collection, strategy)?);
        }
        Ok(Self {
            auth,
            navigator,
            stores,
        })
    }

    pub fn route(&self) -> Route {
        self.navigator.current()
    }

    pub fn store(&self, collection: Collection) -> Option<&EntityStore> {
        self.stores.get(&collection)
    }

    /// 打开启动页：已登录时进入仪表盘
    pub fn start(&mut self) -> String {
        self.go(Route::Dashboard)
    }

    /// 逐行读取命令直到输入结束或 `quit`
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> anyhow::Result<()> {
        writeln!(output, "{}", self.start())?;
        let mut line = String::new();
        loop {
            write!(output, "{}> ", self.route().path())?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let command = match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => command,
                Err(message) => {
                    if !message.is_empty() {
                        writeln!(output, "{}", message)?;
                    }
                    continue;
                }
            };

            let mut prompt = LinePrompt::new(&mut input, &mut output);
            let text = self.execute(command, &mut prompt);
            writeln!(output, "{}", text)?;
        }
        Ok(())
    }

    /// 执行一条命令，返回要显示的文本
    pub fn execute(&mut self, command: Command, prompt: &mut dyn ConfirmPrompt) -> String {
        match self.try_execute(command, prompt) {
            Ok(text) => text,
            // 顺序ID策略在删除中间记录后会与现有记录冲突
            Err(e @ HospitalError::DuplicateId(_)) => format!(
                "error: {}\nhint: set records.id_strategy = \"monotonic\" to allocate ids that are never reused",
                e
            ),
            Err(e) => format!("error: {}", e),
        }
    }

    fn try_execute(&mut self, command: Command, prompt: &mut dyn ConfirmPrompt) -> Result<String> {
        let intent = match command {
            Command::Help => return Ok(HELP.to_string()),
            Command::Quit => return Ok(String::new()),
            Command::Login { email, password } => {
                let session = self.auth.login(&email, &password)?;
                let welcome = format!("Welcome, {}", session.email);
                return Ok(format!("{}\n{}", welcome, self.go(Route::Dashboard)));
            }
            Command::Logout => {
                self.auth.logout()?;
                return Ok(format!("Logged out\n{}", self.go(Route::Login)));
            }
            Command::Go(route) => return Ok(self.go(route)),
            Command::List => return Ok(self.render_page()),
            Command::Summary => {
                let summary = self.current_store()?.summarize("status", "amount")?;
                return Ok(render_summary(&summary));
            }
            Command::Export => {
                let rows = self.current_store()?.rows();
                return Ok(serde_json::to_string_pretty(&rows)?);
            }
            Command::Search(term) => Intent::Search(term),
            Command::Add => Intent::Add {
                today: Local::now().date_naive(),
            },
            Command::Edit(id) => Intent::Edit(id),
            Command::Set { field, value } => Intent::SetField { field, value },
            Command::Save => Intent::Save,
            Command::Cancel => Intent::Cancel,
            Command::Delete(id) => Intent::Delete(id),
        };

        let store = self.current_store_mut()?;
        let reaction = store.dispatch(intent, prompt)?;
        let singular = store.schema().singular;
        let text = match reaction {
            Reaction::Refreshed => match store.session() {
                Some(session) => render_draft(session, &store.available_events()),
                None => render_table(store),
            },
            Reaction::Saved(CommitOutcome::Committed(id)) => {
                format!("Saved {} {}\n{}", singular, id, render_table(store))
            }
            Reaction::Saved(CommitOutcome::Rejected(errors)) => match store.session() {
                Some(session) => format!(
                    "Cannot save: {}\n{}",
                    errors,
                    render_draft(session, &store.available_events())
                ),
                None => format!("Cannot save: {}", errors),
            },
            Reaction::Deleted(Confirmation::Confirmed) => {
                format!("Deleted {}\n{}", singular, render_table(store))
            }
            Reaction::Deleted(Confirmation::Cancelled) => "Delete cancelled".to_string(),
        };
        Ok(text)
    }

    fn go(&mut self, route: Route) -> String {
        let mounted = self.navigator.navigate(route, &self.auth);
        if mounted != route {
            return format!("Please log in first\n{}", self.render_page());
        }
        self.render_page()
    }

    fn render_page(&self) -> String {
        let route = self.navigator.current();
        if let Some(store) = route.collection().and_then(|c| self.stores.get(&c)) {
            return render_table(store);
        }
        match route {
            Route::Dashboard => self.render_dashboard(),
            _ => "Hospital Dashboard\nlogin <email> <password>".to_string(),
        }
    }

    fn render_dashboard(&self) -> String {
        let stores = (
            self.stores.get(&Collection::Patients),
            self.stores.get(&Collection::Appointments),
            self.stores.get(&Collection::Billings),
        );
        let (Some(patients), Some(appointments), Some(billings)) = stores else {
            return "Dashboard unavailable".to_string();
        };
        let now = self.navigator.clock().map(|clock| clock.now());
        match Overview::collect(patients, appointments, billings, now) {
            Ok(overview) => render_overview(&overview),
            Err(e) => format!("error: {}", e),
        }
    }

    fn current_store(&self) -> Result<&EntityStore> {
        let collection = self.current_collection()?;
        self.stores
            .get(&collection)
            .ok_or_else(|| hospital_core::HospitalError::NotFound(collection.name().to_string()))
    }

    fn current_store_mut(&mut self) -> Result<&mut EntityStore> {
        let collection = self.current_collection()?;
        self.stores
            .get_mut(&collection)
            .ok_or_else(|| hospital_core::HospitalError::NotFound(collection.name().to_string()))
    }

    fn current_collection(&self) -> Result<Collection> {
        self.navigator.current().collection().ok_or_else(|| {
            hospital_core::HospitalError::Config(
                "open patients, appointments or billings first".to_string(),
            )
        })
    }
}

/// 状态芯片，例如 `[Critical #f44336]`
pub fn render_chip(chip: &Chip) -> String {
    format!("[{} {}]", chip.label, chip.color)
}

fn render_table(store: &EntityStore) -> String {
    let schema = store.schema();
    let chip_field = schema.chip_field();
    let mut lines = Vec::new();

    let mut header = vec!["id"];
    header.extend(schema.fields.iter().map(|f| f.label));
    lines.push(header.join(" | "));

    let rows = store.rows();
    for row in &rows {
        let mut cells = vec![row.record.id.to_string()];
        for spec in &schema.fields {
            let cell = match (&row.chip, chip_field) {
                (Some(chip), Some(field)) if field == spec.name => render_chip(chip),
                _ => row.record.text(spec.name).unwrap_or_default(),
            };
            cells.push(cell);
        }
        lines.push(cells.join(" | "));
    }

    if !store.search_term().trim().is_empty() {
        lines.push(format!(
            "{} of {} {} match '{}'",
            rows.len(),
            store.repository().len(),
            schema.name,
            store.search_term()
        ));
    }
    lines.join("\n")
}

fn render_draft(session: &EditSession, events: &[SessionEvent]) -> String {
    let schema = session.schema();
    let mut lines = vec![format!(
        "{:?} {} {}",
        session.mode(),
        schema.singular,
        session.id()
    )];

    for spec in &schema.fields {
        let marker = if spec.required { "*" } else { " " };
        let value = match session.chip(spec.name) {
            Some(chip) => render_chip(&chip),
            None => session.value(spec.name).unwrap_or_default().to_string(),
        };
        lines.push(format!("  {}{}: {}", marker, spec.name, value));
    }

    if let Some(errors) = session.errors().filter(|e| !e.is_empty()) {
        lines.push(format!("  ! {}", errors));
    }

    let actions: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Commit => Some("save"),
            SessionEvent::Discard => Some("cancel"),
            _ => None,
        })
        .collect();
    if !actions.is_empty() {
        lines.push(format!("  actions: set <field> <value> | {}", actions.join(" | ")));
    }
    lines.join("\n")
}

fn render_summary(summary: &Summary) -> String {
    let mut lines: Vec<String> = summary
        .groups
        .iter()
        .map(|group| {
            let icon = group.chip.icon.map(|i| format!(" {}", i)).unwrap_or_default();
            format!(
                "{}{} {} record(s), total {:.2}",
                render_chip(&group.chip),
                icon,
                group.count,
                group.total
            )
        })
        .collect();
    lines.push(format!("total {:.2}", summary.grand_total()));
    lines.join("\n")
}

fn render_overview(overview: &Overview) -> String {
    let mut lines = Vec::new();
    if let Some(now) = overview.now {
        lines.push(now.format("%A, %B %-d, %Y %H:%M:%S").to_string());
    }
    lines.push(format!(
        "Patients {} | Appointments {} | Bills {}",
        overview.patients, overview.appointments, overview.bills
    ));
    lines.push("Patients by status:".to_string());
    for group in &overview.patients_by_status.groups {
        lines.push(format!("  {} {}", render_chip(&group.chip), group.count));
    }
    lines.push("Appointments by status:".to_string());
    for group in &overview.appointments_by_status.groups {
        lines.push(format!("  {} {}", render_chip(&group.chip), group.count));
    }
    lines.push(format!(
        "Billing: collected {:.2}, outstanding {:.2}",
        overview.collected, overview.outstanding
    ));
    lines.join("\n")
}
