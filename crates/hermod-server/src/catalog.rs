//! The static tool catalog.
//!
//! Every tool is a [`ToolKind`] variant with an immutable [`ToolDescriptor`].
//! Lookup by name is case-insensitive through an index built once on first
//! use.

use std::collections::HashMap;
use std::sync::LazyLock;

use hermod_mcp::ToolInfo;
use serde_json::{Map, Value, json};

/// JSON Schema type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Number,
    Boolean,
}

impl ArgType {
    fn as_str(self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
        }
    }
}

/// One argument in a tool's input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgType,
    pub description: &'static str,
}

const fn arg(name: &'static str, kind: ArgType, description: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        kind,
        description,
    }
}

/// Name, description and input schema of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub properties: &'static [ArgSpec],
    pub required: &'static [&'static str],
}

impl ToolDescriptor {
    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({"type": p.kind.as_str(), "description": p.description}),
                )
            })
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }

    pub fn to_tool_info(&self) -> ToolInfo {
        ToolInfo::new(self.name, self.description, self.input_schema())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetCurrentWeather,
    GetHourlyForecast,
    GetDailyForecast,
    Calculate,
    GetTime,
    GitStatusLocal,
    GitLogLocal,
    GitBranchesLocal,
    GitDiffLocal,
    ListTickets,
    CreateTicket,
    ListTasks,
    CreateTask,
}

const CITY: ArgSpec = arg("city", ArgType::String, "City name");

impl ToolKind {
    /// All tools, in catalog order.
    pub const ALL: [ToolKind; 13] = [
        ToolKind::GetCurrentWeather,
        ToolKind::GetHourlyForecast,
        ToolKind::GetDailyForecast,
        ToolKind::Calculate,
        ToolKind::GetTime,
        ToolKind::GitStatusLocal,
        ToolKind::GitLogLocal,
        ToolKind::GitBranchesLocal,
        ToolKind::GitDiffLocal,
        ToolKind::ListTickets,
        ToolKind::CreateTicket,
        ToolKind::ListTasks,
        ToolKind::CreateTask,
    ];

    pub fn descriptor(self) -> &'static ToolDescriptor {
        match self {
            ToolKind::GetCurrentWeather => &GET_CURRENT_WEATHER,
            ToolKind::GetHourlyForecast => &GET_HOURLY_FORECAST,
            ToolKind::GetDailyForecast => &GET_DAILY_FORECAST,
            ToolKind::Calculate => &CALCULATE,
            ToolKind::GetTime => &GET_TIME,
            ToolKind::GitStatusLocal => &GIT_STATUS_LOCAL,
            ToolKind::GitLogLocal => &GIT_LOG_LOCAL,
            ToolKind::GitBranchesLocal => &GIT_BRANCHES_LOCAL,
            ToolKind::GitDiffLocal => &GIT_DIFF_LOCAL,
            ToolKind::ListTickets => &LIST_TICKETS,
            ToolKind::CreateTicket => &CREATE_TICKET,
            ToolKind::ListTasks => &LIST_TASKS,
            ToolKind::CreateTask => &CREATE_TASK,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<ToolKind> {
        INDEX.get(&name.to_lowercase()).copied()
    }

    /// True for the tools backed by the local git repository.
    pub fn is_git(self) -> bool {
        matches!(
            self,
            ToolKind::GitStatusLocal
                | ToolKind::GitLogLocal
                | ToolKind::GitBranchesLocal
                | ToolKind::GitDiffLocal
        )
    }
}

const GET_CURRENT_WEATHER: ToolDescriptor = ToolDescriptor {
    name: "get_current_weather",
    description: "Get the current weather for a city: temperature, conditions and wind",
    properties: &[CITY],
    required: &["city"],
};

const GET_HOURLY_FORECAST: ToolDescriptor = ToolDescriptor {
    name: "get_hourly_forecast",
    description: "Get an hourly weather forecast for a city",
    properties: &[
        CITY,
        arg(
            "hours",
            ArgType::Number,
            "Number of hours to forecast (default 24, maximum 168)",
        ),
    ],
    required: &["city"],
};

const GET_DAILY_FORECAST: ToolDescriptor = ToolDescriptor {
    name: "get_daily_forecast",
    description: "Get the weather forecast for a city on a given date (up to 16 days ahead)",
    properties: &[
        CITY,
        arg("date", ArgType::String, "Date in YYYY-MM-DD format"),
    ],
    required: &["city", "date"],
};

const CALCULATE: ToolDescriptor = ToolDescriptor {
    name: "calculate",
    description: "Evaluate an arithmetic expression with + - * / and parentheses",
    properties: &[arg(
        "expression",
        ArgType::String,
        "Arithmetic expression to evaluate",
    )],
    required: &["expression"],
};

const GET_TIME: ToolDescriptor = ToolDescriptor {
    name: "get_time",
    description: "Get the current local date and time",
    properties: &[],
    required: &[],
};

const GIT_STATUS_LOCAL: ToolDescriptor = ToolDescriptor {
    name: "git_status_local",
    description: "Show the working tree status of the local git repository",
    properties: &[],
    required: &[],
};

const GIT_LOG_LOCAL: ToolDescriptor = ToolDescriptor {
    name: "git_log_local",
    description: "Show the commit history of the local git repository",
    properties: &[
        arg(
            "limit",
            ArgType::Number,
            "Maximum number of commits (default 30, maximum 1000)",
        ),
        arg(
            "branch",
            ArgType::String,
            "Branch to read (defaults to the current branch)",
        ),
    ],
    required: &[],
};

const GIT_BRANCHES_LOCAL: ToolDescriptor = ToolDescriptor {
    name: "git_branches_local",
    description: "List local branches with their last commit",
    properties: &[],
    required: &[],
};

const GIT_DIFF_LOCAL: ToolDescriptor = ToolDescriptor {
    name: "git_diff_local",
    description: "Show uncommitted changes in the local git repository",
    properties: &[
        arg("file_path", ArgType::String, "Limit the diff to one file"),
        arg(
            "staged",
            ArgType::Boolean,
            "Show staged changes instead of unstaged ones",
        ),
    ],
    required: &[],
};

const LIST_TICKETS: ToolDescriptor = ToolDescriptor {
    name: "list_tickets",
    description: "List all support tickets",
    properties: &[],
    required: &[],
};

const CREATE_TICKET: ToolDescriptor = ToolDescriptor {
    name: "create_ticket",
    description: "Create a support ticket",
    properties: &[
        arg("username", ArgType::String, "Who asked"),
        arg("title", ArgType::String, "Short summary"),
        arg("question", ArgType::String, "The question asked"),
        arg("answer", ArgType::String, "Answer, if already known"),
        arg(
            "date",
            ArgType::String,
            "Date in YYYY-MM-DD format (defaults to today)",
        ),
    ],
    required: &["username", "title", "question"],
};

const LIST_TASKS: ToolDescriptor = ToolDescriptor {
    name: "list_tasks",
    description: "List tasks, optionally filtered by priority and status",
    properties: &[
        arg("priority", ArgType::String, "LOW, MEDIUM or HIGH"),
        arg("status", ArgType::String, "NEW, IN_PROGRESS or COMPLETED"),
    ],
    required: &[],
};

const CREATE_TASK: ToolDescriptor = ToolDescriptor {
    name: "create_task",
    description: "Create a task",
    properties: &[
        arg("name", ArgType::String, "Task name"),
        arg("description", ArgType::String, "What needs to be done"),
        arg(
            "priority",
            ArgType::String,
            "LOW, MEDIUM or HIGH (default MEDIUM)",
        ),
        arg(
            "status",
            ArgType::String,
            "NEW, IN_PROGRESS or COMPLETED (default NEW)",
        ),
    ],
    required: &["name", "description"],
};

static INDEX: LazyLock<HashMap<String, ToolKind>> = LazyLock::new(|| {
    ToolKind::ALL
        .iter()
        .map(|kind| (kind.name().to_lowercase(), *kind))
        .collect()
});

/// The catalog as MCP tool descriptors.
pub fn tool_infos() -> Vec<ToolInfo> {
    ToolKind::ALL
        .iter()
        .map(|kind| kind.descriptor().to_tool_info())
        .collect()
}
