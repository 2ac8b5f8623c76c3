//! REPL (Read-Eval-Print Loop) for interactive chat.

use anyhow::Result;
use console::{Style, Term, style};
use hermod_agent::{Agent, AgentResponse};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

/// REPL state.
pub struct Repl {
    agent: Agent,
    session_id: String,
    editor: Editor<(), DefaultHistory>,
    term: Term,
    verbose: bool,
}

/// What the loop does after a slash command.
#[derive(Debug, PartialEq, Eq)]
enum ControlFlow {
    Continue,
    Exit,
}

impl Repl {
    pub fn new(agent: Agent, session_id: String, verbose: bool) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let editor = Editor::with_config(config)?;

        Ok(Self {
            agent,
            session_id,
            editor,
            term: Term::stdout(),
            verbose,
        })
    }

    /// Run the REPL loop until `/quit` or Ctrl+D.
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        loop {
            let prompt = format!("{} ", style(format!("{}>", self.session_id)).green());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = line.strip_prefix('/') {
                        match self.handle_slash_command(command).await {
                            Ok(ControlFlow::Continue) => continue,
                            Ok(ControlFlow::Exit) => break,
                            Err(e) => {
                                self.print_error(&format!("Command error: {}", e));
                                continue;
                            }
                        }
                    }

                    match self.agent.turn(&self.session_id, line).await {
                        Ok(response) => self.print_response(&response),
                        Err(e) => self.print_error(&format!("Error: {}", e)),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!();
                    self.print_dim("(Interrupted - type /quit to exit)");
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(e) => {
                    self.print_error(&format!("Input error: {}", e));
                    break;
                }
            }
        }

        self.print_dim("Goodbye!");
        Ok(())
    }

    async fn handle_slash_command(&mut self, input: &str) -> Result<ControlFlow> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "quit" | "q" | "exit" => return Ok(ControlFlow::Exit),
            "help" | "h" | "?" => self.print_help(),
            "clear" | "cls" => self.term.clear_screen()?,
            "reset" => {
                self.agent.reset(&self.session_id).await?;
                self.print_dim("Conversation cleared");
            }
            "session" => match parts.get(1) {
                Some(id) => {
                    self.session_id = id.to_string();
                    self.print_dim(&format!("Switched to session '{}'", self.session_id));
                }
                None => println!("Current session: {}", self.session_id),
            },
            "tools" => self.print_tools().await,
            "" => self.print_dim("Type /help for available commands"),
            _ => {
                self.print_error(&format!("Unknown command: /{}", cmd));
                self.print_dim("Type /help for available commands");
            }
        }

        Ok(ControlFlow::Continue)
    }

    fn print_response(&self, response: &AgentResponse) {
        let dim = Style::new().dim();
        for call in &response.tool_calls {
            let status = if call.success { "done" } else { "failed" };
            println!("{}", dim.apply_to(format!("[{}: {}]", call.name, status)));
        }

        println!("{}", response.text);

        if response.truncated {
            println!(
                "{}",
                Style::new()
                    .yellow()
                    .apply_to("(stopped after the iteration limit)")
            );
        }
        if self.verbose {
            println!(
                "{}",
                dim.apply_to(format!(
                    "{} model calls, {} tokens, {} ms",
                    response.iterations,
                    response.usage.total_tokens,
                    response.duration_ms()
                ))
            );
        }
        println!();
    }

    async fn print_tools(&self) {
        let Some(orchestrator) = self.agent.orchestrator() else {
            self.print_dim("No tools configured");
            return;
        };
        orchestrator.ensure_discovered().await;

        let mut names: Vec<String> = orchestrator.tools().into_iter().map(|t| t.name).collect();
        if names.is_empty() {
            self.print_dim("No tools available");
            return;
        }
        names.sort();
        for name in names {
            println!("  {}", style(name).cyan());
        }
    }

    fn print_welcome(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Hermod Chat").bold().cyan());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!(
            "{}",
            dim.apply_to("Type your message and press Enter to chat.")
        );
        println!(
            "{}",
            dim.apply_to("Use /help for commands, Ctrl+D to exit.")
        );
        println!();
    }

    fn print_help(&self) {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Available Commands").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {}  - Exit the REPL", style("/quit, /q").cyan());
        println!("  {}  - Show this help", style("/help, /h, /?").cyan());
        println!("  {}  - Clear the screen", style("/clear").cyan());
        println!("  {}  - Forget this conversation", style("/reset").cyan());
        println!(
            "  {}  - Show or switch the session",
            style("/session [id]").cyan()
        );
        println!("  {}  - List available tools", style("/tools").cyan());
        println!();
        println!("{}", dim.apply_to("Keyboard shortcuts:"));
        println!("  {} - Interrupt the current line", dim.apply_to("Ctrl+C"));
        println!("  {} - Exit the REPL", dim.apply_to("Ctrl+D"));
        println!();
    }

    fn print_dim(&self, msg: &str) {
        println!("{}", Style::new().dim().apply_to(msg));
    }

    fn print_error(&self, msg: &str) {
        eprintln!("{}", Style::new().red().apply_to(msg));
    }
}
