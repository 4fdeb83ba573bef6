//! Chat command dispatcher.
//!
//! Commands are typed into chat as `/<name> <arg1> <arg2> ...`. Arguments are
//! split on whitespace; there is no quoting. Handlers validate their own
//! arguments and report back through the context's [`Feedback`] sink.
//!
//! # Usage
//! ```ignore
//! let mut commands: Commands<ChatLog> = Commands::new();
//! commands.register("echo", Some("<text>"), "Repeats the text", |args, log| {
//!     log.receive(&args.join(" "));
//! });
//! assert!(commands.handle("/echo hello", &mut log));
//! ```

use crate::chat::{Feedback, GREY};

/// Command handler function type.
pub type CommandHandler<C> = Box<dyn Fn(&[&str], &mut C) + Send + Sync>;

enum Action<C> {
    /// Lists every command; needs the registry itself, so it is built in.
    Help,
    Run(CommandHandler<C>),
}

struct Entry<C> {
    name: String,
    args: Option<String>,
    desc: String,
    action: Action<C>,
}

/// Registered commands, kept in registration order.
pub struct Commands<C> {
    entries: Vec<Entry<C>>,
}

impl<C: Feedback> Default for Commands<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Feedback> Commands<C> {
    /// Creates a dispatcher with `help` as its first command.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                name: "help".to_string(),
                args: None,
                desc: "Displays the list of all commands".to_string(),
                action: Action::Help,
            }],
        }
    }

    /// Registers a command. A second registration under the same name
    /// replaces the first but keeps its place in the list.
    pub fn register<F>(&mut self, name: &str, args: Option<&str>, desc: &str, handler: F)
    where
        F: Fn(&[&str], &mut C) + Send + Sync + 'static,
    {
        let entry = Entry {
            name: name.to_string(),
            args: args.map(str::to_string),
            desc: desc.to_string(),
            action: Action::Run(Box::new(handler)),
        };

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                tracing::debug!(name, "Replacing command");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Runs a command line. Returns false if the line is not a known command.
    pub fn handle(&self, line: &str, ctx: &mut C) -> bool {
        let Some(body) = line.trim().strip_prefix('/') else {
            return false;
        };
        // the name must follow the slash directly
        if body.starts_with(char::is_whitespace) {
            return false;
        }

        let mut tokens = body.split_whitespace();
        let Some(name) = tokens.next() else {
            return false;
        };
        let args: Vec<&str> = tokens.collect();

        let Some(entry) = self.entries.iter().find(|e| e.name == name) else {
            return false;
        };

        match &entry.action {
            Action::Help => {
                for line in self.help_lines() {
                    ctx.receive(&line);
                }
            }
            Action::Run(handler) => handler(&args, ctx),
        }
        true
    }

    /// One formatted line per command, in registration order.
    pub fn help_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| match &e.args {
                Some(args) => format!("[14]/{} [{GREY}]{args}[] - {}[]", e.name, e.desc),
                None => format!("[14]/{} - {}[]", e.name, e.desc),
            })
            .collect()
    }

    /// Name, usage hint and description of every command.
    pub fn list(&self) -> impl Iterator<Item = (&str, Option<&str>, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.args.as_deref(), e.desc.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ctx {
        lines: Vec<String>,
        seen: Vec<Vec<String>>,
    }

    impl Feedback for Ctx {
        fn receive(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    fn commands() -> Commands<Ctx> {
        let mut commands = Commands::new();
        commands.register("echo", Some("<text>"), "Repeats the arguments", |args, ctx: &mut Ctx| {
            ctx.seen.push(args.iter().map(|s| s.to_string()).collect());
        });
        commands.register("hello", None, "Greets", |_, ctx: &mut Ctx| ctx.receive("hi"));
        commands
    }

    // =============================================================================
    // Dispatch
    // =============================================================================

    #[test]
    fn handler_sees_split_args() {
        let commands = commands();
        let mut ctx = Ctx::default();

        assert!(commands.handle("/echo a b", &mut ctx));
        assert_eq!(ctx.seen, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn extra_whitespace_is_ignored() {
        let commands = commands();
        let mut ctx = Ctx::default();

        assert!(commands.handle("  /echo   a \t b  ", &mut ctx));
        assert_eq!(ctx.seen[0], vec!["a", "b"]);
    }

    #[test]
    fn unknown_command_does_nothing() {
        let commands = commands();
        let mut ctx = Ctx::default();

        assert!(!commands.handle("/doesnotexist", &mut ctx));
        assert!(!commands.handle("echo a", &mut ctx));
        assert!(!commands.handle("/", &mut ctx));
        assert!(!commands.handle("/ hello", &mut ctx));
        assert!(ctx.lines.is_empty());
        assert!(ctx.seen.is_empty());
    }

    // =============================================================================
    // Help
    // =============================================================================

    #[test]
    fn help_lists_in_registration_order() {
        let commands = commands();
        let mut ctx = Ctx::default();

        assert!(commands.handle("/help", &mut ctx));
        assert_eq!(
            ctx.lines,
            vec![
                "[14]/help - Displays the list of all commands[]",
                "[14]/echo [#BBBBBB]<text>[] - Repeats the arguments[]",
                "[14]/hello - Greets[]",
            ]
        );
    }

    #[test]
    fn reregistration_replaces_in_place() {
        let mut commands = commands();
        commands.register("echo", None, "Silent", |_, _| {});
        let mut ctx = Ctx::default();

        assert!(commands.handle("/echo a", &mut ctx));
        assert!(ctx.seen.is_empty());

        let names: Vec<&str> = commands.list().map(|(n, _, _)| n).collect();
        assert_eq!(names, vec!["help", "echo", "hello"]);
        assert_eq!(commands.len(), 3);
    }
}
