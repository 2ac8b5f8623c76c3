//! The tool catalog as an MCP [`ToolService`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use hermod_config::ServerConfig;
use hermod_mcp::{CallToolResult, ServerInfo, ToolInfo, ToolService};
use serde_json::Value;

use crate::calculator;
use crate::catalog::{self, ToolKind};
use crate::error::{ToolError, ToolResult};
use crate::git::{self, GitCli, LocalGit};
use crate::tasks::{self, JsonTaskStore, TaskPriority, TaskStatus, TaskStore};
use crate::tickets::{self, JsonTicketStore, NewTicket, TicketStore};
use crate::weather::{self, OpenMeteoClient, WeatherService};

pub const SERVER_NAME: &str = "hermod-server";

/// Every catalog tool wired to its collaborator.
#[derive(Clone)]
pub struct ToolCatalog {
    weather: Arc<dyn WeatherService>,
    git: Arc<dyn LocalGit>,
    tickets: Arc<dyn TicketStore>,
    tasks: Arc<dyn TaskStore>,
}

impl ToolCatalog {
    pub fn new(
        weather: Arc<dyn WeatherService>,
        git: Arc<dyn LocalGit>,
        tickets: Arc<dyn TicketStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            weather,
            git,
            tickets,
            tasks,
        }
    }

    /// Production collaborators. Relative store paths resolve against `data_dir`.
    pub fn from_config(config: &ServerConfig, data_dir: &Path) -> ToolResult<Self> {
        let git_repo = config.resolve_git_repo_path();
        if git_repo.is_none() {
            tracing::info!("no git repository configured, git tools will report an error");
        }
        Ok(Self::new(
            Arc::new(OpenMeteoClient::new()?),
            Arc::new(GitCli::new(git_repo)),
            Arc::new(JsonTicketStore::new(config.tickets_path_in(data_dir))),
            Arc::new(JsonTaskStore::new(config.tasks_path_in(data_dir))),
        ))
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherService>) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_git(mut self, git: Arc<dyn LocalGit>) -> Self {
        self.git = git;
        self
    }

    pub fn with_tickets(mut self, tickets: Arc<dyn TicketStore>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn with_tasks(mut self, tasks: Arc<dyn TaskStore>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Run one tool and render its output as text.
    pub async fn run(&self, kind: ToolKind, arguments: &Value) -> ToolResult<String> {
        let args = Args(arguments);
        match kind {
            ToolKind::GetCurrentWeather => {
                let city = args.required_str("city")?;
                let (lat, lon) = self.locate(city).await?;
                let current = self.weather.current(lat, lon).await?;
                Ok(weather::format_current(city, &current))
            }
            ToolKind::GetHourlyForecast => {
                let city = args.required_str("city")?;
                let hours = weather::clamp_hours(args.optional_i64("hours")?);
                let (lat, lon) = self.locate(city).await?;
                let entries = self.weather.hourly(lat, lon, hours).await?;
                if entries.is_empty() {
                    return Err(ToolError::NoForecast(city.to_string()));
                }
                Ok(weather::format_hourly(city, &entries))
            }
            ToolKind::GetDailyForecast => {
                let city = args.required_str("city")?;
                let date = args.required_str("date")?;
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| ToolError::invalid("date", "expected YYYY-MM-DD"))?;
                let (lat, lon) = self.locate(city).await?;
                let day = self
                    .weather
                    .daily(lat, lon, date)
                    .await?
                    .ok_or_else(|| ToolError::NoForecast(format!("{} on {}", city, date)))?;
                Ok(weather::format_daily(city, &day))
            }
            ToolKind::Calculate => {
                let expression = args.required_str("expression")?;
                let value = calculator::evaluate(expression)?;
                Ok(format!("Result: {}", calculator::format_number(value)))
            }
            ToolKind::GetTime => Ok(format!(
                "Current time: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            )),
            ToolKind::GitStatusLocal => {
                let status = self.git.status().await?;
                Ok(git::format_status(&status))
            }
            ToolKind::GitLogLocal => {
                let limit = git::clamp_limit(args.optional_i64("limit")?);
                let branch = args.optional_str("branch");
                let commits = self.git.log(limit, branch).await?;
                Ok(git::format_log(&commits))
            }
            ToolKind::GitBranchesLocal => {
                let branches = self.git.branches().await?;
                Ok(git::format_branches(&branches))
            }
            ToolKind::GitDiffLocal => {
                let file_path = args.optional_str("file_path");
                let staged = args.optional_bool("staged")?.unwrap_or(false);
                let diff = self.git.diff(file_path, staged).await?;
                Ok(git::format_diff(&diff))
            }
            ToolKind::ListTickets => {
                let all = self.tickets.list().await?;
                Ok(tickets::format_tickets(&all))
            }
            ToolKind::CreateTicket => {
                let ticket = NewTicket {
                    username: args.required_str("username")?.to_string(),
                    title: args.required_str("title")?.to_string(),
                    question: args.required_str("question")?.to_string(),
                    answer: args.optional_str("answer").map(str::to_string),
                    date: args.optional_str("date").map(str::to_string),
                };
                let created = self.tickets.create(ticket).await?;
                Ok(format!(
                    "Created ticket '{}' for {} on {}",
                    created.title, created.username, created.date
                ))
            }
            ToolKind::ListTasks => {
                let priority = args.priority()?;
                let status = args.status()?;
                let found = self.tasks.list(priority, status).await?;
                Ok(tasks::format_tasks(&found))
            }
            ToolKind::CreateTask => {
                let name = args.required_str("name")?.to_string();
                let description = args.required_str("description")?.to_string();
                let priority = args.priority()?.unwrap_or_default();
                let status = args.status()?.unwrap_or_default();
                let task = self.tasks.create(name, description, priority, status).await?;
                Ok(tasks::format_task(&task))
            }
        }
    }

    async fn locate(&self, city: &str) -> ToolResult<(f64, f64)> {
        self.weather
            .coordinates(city)
            .await?
            .ok_or_else(|| ToolError::CityNotFound(city.to_string()))
    }
}

#[async_trait]
impl ToolService for ToolCatalog {
    fn server_info(&self) -> ServerInfo {
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }

    async fn list_tools(&self) -> hermod_mcp::Result<Vec<ToolInfo>> {
        Ok(catalog::tool_infos())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> hermod_mcp::Result<CallToolResult> {
        let Some(kind) = ToolKind::from_name(name) else {
            tracing::debug!(tool = %name, "unknown tool");
            return Ok(CallToolResult::error(format!("Tool '{}' not found", name)));
        };

        match self.run(kind, &arguments).await {
            Ok(text) => Ok(CallToolResult::text(text)),
            Err(e) => {
                tracing::debug!(tool = %kind.name(), error = %e, "tool failed");
                Ok(CallToolResult::error(e.to_string()))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

struct Args<'a>(&'a Value);

impl<'a> Args<'a> {
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    fn required_str(&self, name: &'static str) -> ToolResult<&'a str> {
        self.optional_str(name)
            .ok_or(ToolError::MissingArgument(name))
    }

    /// Non-blank string, if present.
    fn optional_str(&self, name: &str) -> Option<&'a str> {
        self.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Integer argument. Accepts numbers (truncated) and numeric strings.
    fn optional_i64(&self, name: &'static str) -> ToolResult<Option<i64>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| ToolError::invalid(name, "expected a number"))
    }

    fn optional_bool(&self, name: &'static str) -> ToolResult<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(ToolError::invalid(name, "expected true or false")),
            },
            Some(_) => Err(ToolError::invalid(name, "expected true or false")),
        }
    }

    fn priority(&self) -> ToolResult<Option<TaskPriority>> {
        self.optional_str("priority")
            .map(|s| {
                s.parse()
                    .map_err(|_| ToolError::invalid("priority", format!("expected {}", TaskPriority::NAMES)))
            })
            .transpose()
    }

    fn status(&self) -> ToolResult<Option<TaskStatus>> {
        self.optional_str("status")
            .map(|s| {
                s.parse()
                    .map_err(|_| ToolError::invalid("status", format!("expected {}", TaskStatus::NAMES)))
            })
            .transpose()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::git::{BranchInfo, CommitInfo, GitStatus};
    use crate::tasks::Task;
    use crate::tickets::Ticket;
    use crate::weather::{CurrentWeather, DailyWeather, HourlyWeather};
    use serde_json::json;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        fn push(&self, entry: String) {
            self.0.lock().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeWeather {
        calls: Recorder,
    }

    #[async_trait]
    impl WeatherService for FakeWeather {
        async fn coordinates(&self, city: &str) -> ToolResult<Option<(f64, f64)>> {
            Ok((city == "Oslo").then_some((59.91, 10.75)))
        }

        async fn current(&self, _lat: f64, _lon: f64) -> ToolResult<CurrentWeather> {
            Ok(CurrentWeather {
                time: "2026-10-19T12:00".to_string(),
                temperature: 8.0,
                weather_code: 3,
                wind_speed: 12.5,
            })
        }

        async fn hourly(&self, _lat: f64, _lon: f64, hours: u32) -> ToolResult<Vec<HourlyWeather>> {
            self.calls.push(format!("hourly:{}", hours));
            Ok((0..hours)
                .map(|h| HourlyWeather {
                    time: format!("T{:03}", h),
                    temperature: 5.0,
                    weather_code: 0,
                    wind_speed: 3.0,
                })
                .collect())
        }

        async fn daily(&self, _lat: f64, _lon: f64, date: &str) -> ToolResult<Option<DailyWeather>> {
            Ok((date == "2026-10-20").then(|| DailyWeather {
                date: date.to_string(),
                temperature_max: 10.0,
                temperature_min: 2.0,
                weather_code: 61,
                wind_speed_max: 20.0,
            }))
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeGit {
        calls: Recorder,
    }

    #[async_trait]
    impl LocalGit for FakeGit {
        async fn status(&self) -> ToolResult<GitStatus> {
            Ok(GitStatus {
                branch: "main".to_string(),
                modified: vec!["src/lib.rs".to_string()],
                ..Default::default()
            })
        }

        async fn log(&self, limit: u32, branch: Option<&str>) -> ToolResult<Vec<CommitInfo>> {
            self.calls.push(format!("log:{}:{}", limit, branch.unwrap_or("-")));
            Ok(vec![CommitInfo {
                sha: "abc1234".to_string(),
                message: "init".to_string(),
                author: "Dev".to_string(),
                date: "2026-10-19".to_string(),
            }])
        }

        async fn branches(&self) -> ToolResult<Vec<BranchInfo>> {
            Ok(Vec::new())
        }

        async fn diff(&self, file_path: Option<&str>, staged: bool) -> ToolResult<String> {
            self.calls.push(format!("diff:{}:{}", file_path.unwrap_or("-"), staged));
            Ok(String::new())
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryTickets(Mutex<Vec<Ticket>>);

    #[async_trait]
    impl TicketStore for MemoryTickets {
        async fn list(&self) -> ToolResult<Vec<Ticket>> {
            Ok(self.0.lock().clone())
        }

        async fn create(&self, ticket: NewTicket) -> ToolResult<Ticket> {
            let ticket = Ticket {
                username: ticket.username,
                date: ticket.date.unwrap_or_else(tickets::today),
                title: ticket.title,
                question: ticket.question,
                answer: ticket.answer,
            };
            self.0.lock().push(ticket.clone());
            Ok(ticket)
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryTasks(Mutex<Vec<Task>>);

    #[async_trait]
    impl TaskStore for MemoryTasks {
        async fn list(
            &self,
            priority: Option<TaskPriority>,
            status: Option<TaskStatus>,
        ) -> ToolResult<Vec<Task>> {
            Ok(self
                .0
                .lock()
                .iter()
                .filter(|t| priority.is_none_or(|p| t.priority == p))
                .filter(|t| status.is_none_or(|s| t.status == s))
                .cloned()
                .collect())
        }

        async fn create(
            &self,
            name: String,
            description: String,
            priority: TaskPriority,
            status: TaskStatus,
        ) -> ToolResult<Task> {
            let task = Task {
                id: format!("task-{}", self.0.lock().len() + 1),
                name,
                description,
                priority,
                status,
            };
            self.0.lock().push(task.clone());
            Ok(task)
        }
    }

    /// Catalog with in-memory collaborators and an unconfigured git repo.
    pub(crate) fn test_catalog() -> ToolCatalog {
        ToolCatalog::new(
            Arc::new(FakeWeather::default()),
            Arc::new(GitCli::new(None)),
            Arc::new(MemoryTickets::default()),
            Arc::new(MemoryTasks::default()),
        )
    }

    async fn call(catalog: &ToolCatalog, name: &str, args: Value) -> CallToolResult {
        catalog.call_tool(name, args).await.unwrap()
    }

    #[tokio::test]
    async fn test_every_listed_tool_dispatches() {
        let catalog = test_catalog();
        for info in catalog.list_tools().await.unwrap() {
            let result = call(&catalog, &info.name, json!({})).await;
            assert!(
                !result.text_content().contains("not found"),
                "{} did not dispatch: {}",
                info.name,
                result.text_content()
            );
        }
    }

    #[tokio::test]
    async fn test_list_tools_is_idempotent() {
        let catalog = test_catalog();
        let first = catalog.list_tools().await.unwrap();
        let second = catalog.list_tools().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), ToolKind::ALL.len());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = call(&test_catalog(), "launch_rockets", json!({})).await;
        assert!(result.is_error());
        assert_eq!(result.text_content(), "Tool 'launch_rockets' not found");
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let result = call(&test_catalog(), "CALCULATE", json!({"expression": "6*7"})).await;
        assert!(!result.is_error());
        assert_eq!(result.text_content(), "Result: 42");
    }

    #[tokio::test]
    async fn test_calculate_errors() {
        let catalog = test_catalog();
        let missing = call(&catalog, "calculate", json!({})).await;
        assert!(missing.is_error());
        assert_eq!(missing.text_content(), "missing required argument 'expression'");

        let bad = call(&catalog, "calculate", json!({"expression": "1/0"})).await;
        assert!(bad.is_error());
        assert!(bad.text_content().contains("division by zero"));
    }

    #[tokio::test]
    async fn test_get_time_format() {
        let result = call(&test_catalog(), "get_time", json!({})).await;
        let text = result.text_content();
        let stamp = text.strip_prefix("Current time: ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[tokio::test]
    async fn test_git_status_without_repo_is_tool_error() {
        let result = call(&test_catalog(), "git_status_local", json!({})).await;
        assert!(result.is_error());
        assert!(result.text_content().contains("GIT_REPO_PATH"));
    }

    #[tokio::test]
    async fn test_git_arguments_are_clamped_and_forwarded() {
        let git = Arc::new(FakeGit::default());
        let catalog = test_catalog().with_git(git.clone());

        call(&catalog, "git_log_local", json!({})).await;
        call(&catalog, "git_log_local", json!({"limit": 5000, "branch": "dev"})).await;
        let diff = call(&catalog, "git_diff_local", json!({"file_path": "a.rs", "staged": true})).await;
        assert_eq!(diff.text_content(), "No changes");

        assert_eq!(
            git.calls.entries(),
            vec!["log:30:-", "log:1000:dev", "diff:a.rs:true"]
        );

        let status = call(&catalog, "git_status_local", json!({})).await;
        assert!(!status.is_error());
        assert!(status.text_content().contains("Modified (1):"));
    }

    #[tokio::test]
    async fn test_hourly_forecast_clamps_hours() {
        let weather = Arc::new(FakeWeather::default());
        let catalog = test_catalog().with_weather(weather.clone());

        let result = call(&catalog, "get_hourly_forecast", json!({"city": "Oslo", "hours": 500})).await;
        assert!(!result.is_error());
        assert!(result.text_content().starts_with("Hourly forecast for Oslo (168 hours):"));

        call(&catalog, "get_hourly_forecast", json!({"city": "Oslo"})).await;
        call(&catalog, "get_hourly_forecast", json!({"city": "Oslo", "hours": "3"})).await;
        assert_eq!(weather.calls.entries(), vec!["hourly:168", "hourly:24", "hourly:3"]);
    }

    #[tokio::test]
    async fn test_weather_errors() {
        let catalog = test_catalog();
        let unknown = call(&catalog, "get_current_weather", json!({"city": "Atlantis"})).await;
        assert!(unknown.is_error());
        assert_eq!(unknown.text_content(), "city not found: Atlantis");

        let bad_date = call(&catalog, "get_daily_forecast", json!({"city": "Oslo", "date": "tomorrow"})).await;
        assert!(bad_date.is_error());

        let out_of_range =
            call(&catalog, "get_daily_forecast", json!({"city": "Oslo", "date": "2030-01-01"})).await;
        assert!(out_of_range.is_error());
        assert!(out_of_range.text_content().contains("no forecast"));

        let ok = call(&catalog, "get_daily_forecast", json!({"city": "Oslo", "date": "2026-10-20"})).await;
        assert!(!ok.is_error());
        assert!(ok.text_content().contains("Slight rain"));
    }

    #[tokio::test]
    async fn test_tickets_round_trip() {
        let catalog = test_catalog();
        let created = call(
            &catalog,
            "create_ticket",
            json!({"username": "ivan", "title": "VPN", "question": "How do I connect?"}),
        )
        .await;
        assert!(!created.is_error());
        assert!(created.text_content().contains(&tickets::today()));

        let listed = call(&catalog, "list_tickets", json!({})).await;
        assert!(listed.text_content().contains("VPN (from ivan)"));

        let missing = call(&catalog, "create_ticket", json!({"username": "ivan"})).await;
        assert!(missing.is_error());
    }

    #[tokio::test]
    async fn test_tasks_defaults_and_filters() {
        let catalog = test_catalog();
        let created = call(&catalog, "create_task", json!({"name": "a", "description": "d"})).await;
        assert!(created.text_content().contains("priority MEDIUM, status NEW"));

        call(
            &catalog,
            "create_task",
            json!({"name": "b", "description": "d", "priority": "high", "status": "completed"}),
        )
        .await;

        let high = call(&catalog, "list_tasks", json!({"priority": "HIGH"})).await;
        assert!(high.text_content().starts_with("1 tasks:"));

        let bad = call(&catalog, "create_task", json!({"name": "c", "description": "d", "priority": "urgent"})).await;
        assert!(bad.is_error());
        assert!(bad.text_content().contains("LOW, MEDIUM or HIGH"));
    }
}
