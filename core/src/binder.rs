//! Command line binding and dispatch.
//!
//! An extracted [`CommandDescriptor`] tree is turned into a [`clap::Command`],
//! argv is parsed, and the selected path of commands is resolved into a
//! [`Plan`]: one optional value per flag, taken from the command line or the
//! environment, plus the residual positional arguments of the selected leaf.
//! Only once the whole path resolved cleanly is the plan applied, writing
//! values root to leaf and invoking the leaf's callbacks. A parse or
//! environment error therefore leaves the target untouched.

use std::path::Path;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches};
use tracing::debug;

use crate::config::Config;
use crate::env::{EnvSource, ProcessEnv};
use crate::error::{DecliError, Result};
use crate::schema::{CommandDescriptor, Describe, extract};
use crate::types::{CommandSpec, FlagSpec, Value, ValueKind};

/// Argument id of the residual positional arguments.
const ARGS_ID: &str = "decli:args";

/// Root name used when neither the config nor argv provide one.
const FALLBACK_NAME: &str = "app";

/// Resolved values for one command on the selected path.
pub(crate) struct Plan {
    values: Vec<Option<Value>>,
    next: Step,
}

enum Step {
    Child {
        index: usize,
        name: String,
        plan: Box<Plan>,
    },
    Leaf {
        args: Vec<String>,
    },
}

impl Plan {
    /// Names of the subcommands selected below the root.
    fn selected_path(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut plan = self;
        while let Step::Child { name, plan: next, .. } = &plan.next {
            names.push(name.clone());
            plan = next.as_ref();
        }
        names
    }
}

impl<T: Describe> CommandDescriptor<T> {
    /// Builds the parser definition for this node and its subcommands.
    ///
    /// Runnable nodes accept trailing positional arguments, which are
    /// forwarded to the run callback. Subcommand names are only recognized
    /// before the first positional argument.
    pub fn command(&self) -> clap::Command {
        let head = &self.head;
        let mut command = clap::Command::new(head.name.clone())
            .args_override_self(true)
            .hide(head.hidden)
            .visible_aliases(head.aliases.clone());
        if let Some(usage) = &head.usage {
            command = command.about(usage.clone());
        }

        for field in &self.fields {
            command = command.arg(flag_arg(field.spec()));
        }
        if head.runnable {
            command = command.arg(
                Arg::new(ARGS_ID)
                    .value_name("ARGS")
                    .help("Arguments passed to the command")
                    .num_args(0..)
                    .action(ArgAction::Append)
                    .value_parser(clap::value_parser!(String)),
            );
        }
        for child in &self.children {
            command = command.subcommand(child.command());
        }
        command
    }

    /// Resolves every flag on the selected path, without touching the
    /// target.
    pub(crate) fn resolve(
        &self,
        matches: &ArgMatches,
        env: &dyn EnvSource,
        path: &mut Vec<String>,
    ) -> Result<Plan> {
        path.push(self.head.name.clone());
        let plan = self.resolve_node(matches, env, path);
        path.pop();
        plan
    }

    fn resolve_node(
        &self,
        matches: &ArgMatches,
        env: &dyn EnvSource,
        path: &mut Vec<String>,
    ) -> Result<Plan> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let spec = field.spec();
            let value = match matches.value_source(&spec.name) {
                Some(ValueSource::CommandLine) => matches.get_one::<Value>(&spec.name).cloned(),
                _ => lookup_env(spec, env)?,
            };
            if value.is_none() && spec.required {
                return Err(DecliError::MissingRequired {
                    command: path.join(" "),
                    flag: spec.name.clone(),
                });
            }
            values.push(value);
        }

        let selected = matches.subcommand().and_then(|(name, sub_matches)| {
            self.children
                .iter()
                .position(|child| child.name() == name)
                .map(|index| (index, name, sub_matches))
        });
        let next = match selected {
            Some((index, name, sub_matches)) => Step::Child {
                index,
                name: name.to_string(),
                plan: Box::new(self.children[index].resolve(sub_matches, env, path)?),
            },
            None => Step::Leaf {
                args: residual_args(matches),
            },
        };

        Ok(Plan { values, next })
    }

    /// Writes resolved values root to leaf and runs the selected command.
    ///
    /// Returns `false` when the selected command has no run callback.
    pub(crate) fn apply(&self, target: &mut T, plan: Plan) -> Result<bool> {
        for (field, value) in self.fields.iter().zip(plan.values) {
            if let Some(value) = value {
                field.write(target, value)?;
            }
        }

        match plan.next {
            Step::Child { index, plan, .. } => self.children[index].apply(target, *plan),
            Step::Leaf { args } => invoke(target, &self.head, &args),
        }
    }
}

fn invoke<T: Describe>(target: &mut T, head: &CommandSpec, args: &[String]) -> Result<bool> {
    if let Some(pre) = target.pre_runnable() {
        debug!(command = %head.name, "before run");
        pre.before_run(args).map_err(DecliError::Run)?;
    }
    match target.runnable() {
        Some(runnable) => {
            debug!(command = %head.name, args = args.len(), "run");
            runnable.run(args).map_err(DecliError::Run)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Returns the value of the first set environment variable of `spec`.
fn lookup_env(spec: &FlagSpec, env: &dyn EnvSource) -> Result<Option<Value>> {
    for var in &spec.env_vars {
        let Some(raw) = env.var(var) else {
            continue;
        };
        debug!(flag = %spec.name, var = %var, "value from environment");
        return spec
            .kind
            .parse(&raw)
            .map(Some)
            .map_err(|reason| DecliError::InvalidEnvValue {
                flag: spec.name.clone(),
                var: var.clone(),
                value: raw,
                reason,
            });
    }
    Ok(None)
}

fn residual_args(matches: &ArgMatches) -> Vec<String> {
    matches
        .try_get_many::<String>(ARGS_ID)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn flag_arg(spec: &FlagSpec) -> Arg {
    let kind = spec.kind;
    let mut arg = Arg::new(spec.name.clone())
        .long(spec.name.clone())
        .help(help_text(spec))
        .hide(spec.hidden)
        .value_name(kind.value_name())
        .action(ArgAction::Set)
        .value_parser(move |raw: &str| kind.parse(raw));

    arg = if kind == ValueKind::Bool {
        arg.num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
    } else {
        arg.num_args(1)
            .allow_negative_numbers(kind.is_signed())
            .allow_hyphen_values(kind == ValueKind::String)
    };

    let mut has_short = false;
    for alias in &spec.aliases {
        let mut chars = alias.chars();
        arg = match (chars.next(), chars.next()) {
            (Some(short), None) if !has_short => {
                has_short = true;
                arg.short(short)
            }
            (Some(short), None) => arg.visible_short_alias(short),
            _ => arg.visible_alias(alias.clone()),
        };
    }
    arg
}

/// Help line of a flag: usage followed by default, environment and
/// requirement annotations.
fn help_text(spec: &FlagSpec) -> String {
    let mut parts = Vec::new();
    if let Some(usage) = &spec.usage {
        parts.push(usage.clone());
    }
    if let Some(default) = spec.default_display() {
        parts.push(format!("[default: {default}]"));
    }
    if !spec.env_vars.is_empty() {
        parts.push(format!("[env: {}]", spec.env_vars.join(", ")));
    }
    if spec.required {
        parts.push("[required]".to_string());
    }
    parts.join(" ")
}

fn root_name(config: &Config, program: Option<&str>) -> String {
    config
        .name
        .clone()
        .or_else(|| {
            program
                .and_then(|program| Path::new(program).file_name())
                .map(|name| name.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

fn root_command<T: Describe>(descriptor: &CommandDescriptor<T>, config: &Config) -> clap::Command {
    let command = descriptor.command();
    match &config.version {
        Some(version) => command.version(version.clone()),
        None => command,
    }
}

fn print_help(command: &mut clap::Command, path: &[String]) -> Result<()> {
    match path.split_first() {
        Some((name, rest)) => match command.find_subcommand_mut(name) {
            Some(sub) => print_help(sub, rest),
            None => Ok(command.print_help()?),
        },
        None => Ok(command.print_help()?),
    }
}

/// Binds `argv` to `target` and dispatches, reading the process
/// environment with the default [`Config`].
///
/// `argv[0]` is the program name.
pub fn run<T, I>(target: &mut T, argv: I) -> Result<()>
where
    T: Describe,
    I: IntoIterator,
    I::Item: Into<String>,
{
    run_with(target, argv, &Config::default(), &ProcessEnv)
}

/// Binds `argv` to `target` and dispatches.
///
/// Extraction and validation happen first, so configuration errors are
/// reported even for an empty argv. Each flag takes its value from the
/// command line, else from the first set variable among its environment
/// variables, else keeps the field's current value. Values are written to
/// every struct on the selected path, then the selected command's
/// before-run and run callbacks are invoked with the residual arguments. If
/// the selected command has no run callback, its help is printed instead.
///
/// `--help` and `--version` print to stdout and return `Ok(())` without
/// touching `target`.
pub fn run_with<T, I>(target: &mut T, argv: I, config: &Config, env: &dyn EnvSource) -> Result<()>
where
    T: Describe,
    I: IntoIterator,
    I::Item: Into<String>,
{
    let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
    let name = root_name(config, argv.first().map(String::as_str));
    let descriptor = extract(target, &name, config)?;

    let mut command = root_command(&descriptor, config);
    let matches = match command.try_get_matches_from_mut(&argv) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let plan = descriptor.resolve(&matches, env, &mut Vec::new())?;

    let selected = plan.selected_path();
    debug!(command = %name, path = %selected.join(" "), "dispatching");
    if !descriptor.apply(target, plan)? {
        print_help(&mut command, &selected)?;
    }
    Ok(())
}

/// Like [`run`], but reports errors and exits the process.
///
/// Parse errors exit with the parser's usage status. Every other error is
/// printed as `error: <message>` with status 1.
pub fn run_and_finish<T, I>(target: &mut T, argv: I)
where
    T: Describe,
    I: IntoIterator,
    I::Item: Into<String>,
{
    if let Err(err) = run(target, argv) {
        exit_with(err)
    }
}

fn exit_with(err: DecliError) -> ! {
    if let DecliError::Parse(parse) = &err {
        parse.exit()
    }
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    std::process::exit(1)
}

/// A configured binder.
///
/// Holds a [`Config`] and the environment source consulted for flags absent
/// from argv.
///
/// # Examples
///
/// ```
/// use decli_core::{Config, Decli, Describe, MapEnv, Schema};
///
/// #[derive(Default)]
/// struct Opts {
///     retries: u64,
/// }
///
/// impl Describe for Opts {
///     fn describe(schema: &mut Schema<Self>) {
///         schema.field("Retries", "", |o| &mut o.retries);
///     }
/// }
///
/// let decli = Decli::new()
///     .with_config(Config::new().with_name("tool").with_env_prefix("TOOL_"))
///     .with_env(MapEnv::new().with("TOOL_RETRIES", "3"));
///
/// let mut opts = Opts::default();
/// let command = decli.command(&mut opts).unwrap();
/// assert_eq!(command.get_name(), "tool");
///
/// decli.run(&mut opts, ["tool"]).unwrap();
/// assert_eq!(opts.retries, 3);
/// ```
pub struct Decli {
    config: Config,
    env: Box<dyn EnvSource>,
}

impl Default for Decli {
    fn default() -> Self {
        Self::new()
    }
}

impl Decli {
    /// Creates a binder with the default config over the process
    /// environment.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            env: Box::new(ProcessEnv),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the environment source.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extracts and validates the command tree of `target`.
    pub fn descriptor<T: Describe>(&self, target: &mut T) -> Result<CommandDescriptor<T>> {
        extract(target, &root_name(&self.config, None), &self.config)
    }

    /// Builds the parser definition for `target`, e.g. to render help or
    /// generate completions.
    pub fn command<T: Describe>(&self, target: &mut T) -> Result<clap::Command> {
        Ok(root_command(&self.descriptor(target)?, &self.config))
    }

    /// Renders the root help text of `target`.
    pub fn render_help<T: Describe>(&self, target: &mut T) -> Result<String> {
        Ok(self.command(target)?.render_help().to_string())
    }

    /// Binds `argv` to `target` and dispatches; see [`run_with`].
    pub fn run<T, I>(&self, target: &mut T, argv: I) -> Result<()>
    where
        T: Describe,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        run_with(target, argv, &self.config, self.env.as_ref())
    }

    /// Like [`Decli::run`], but reports errors and exits the process; see
    /// [`run_and_finish`].
    pub fn run_and_finish<T, I>(&self, target: &mut T, argv: I)
    where
        T: Describe,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if let Err(err) = self.run(target, argv) {
            exit_with(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, kind: ValueKind) -> FlagSpec {
        FlagSpec::new(name, kind)
    }

    #[test]
    fn test_help_text_annotations() {
        let mut spec = flag("age", ValueKind::Int)
            .with_usage("your age")
            .with_env_vars(["AGE"]);
        spec.default_value = Some("-1".to_string());
        spec.required = true;

        assert_eq!(
            help_text(&spec),
            "your age [default: -1] [env: AGE] [required]"
        );
    }

    #[test]
    fn test_help_text_without_default() {
        let spec = flag("name", ValueKind::String).with_env_vars(["NAME", "USER_NAME"]);
        assert_eq!(help_text(&spec), "[env: NAME, USER_NAME]");
    }

    #[test]
    fn test_root_name_resolution() {
        let config = Config::default();
        assert_eq!(root_name(&config, Some("/usr/local/bin/hello")), "hello");
        assert_eq!(root_name(&config, None), "app");
        assert_eq!(root_name(&config, Some("")), "app");
        assert_eq!(
            root_name(&Config::new().with_name("greet"), Some("/bin/hello")),
            "greet"
        );
    }

    #[test]
    fn test_flag_arg_aliases() {
        let spec = flag("first-name", ValueKind::String).with_aliases(["fn", "f", "n"]);
        let arg = flag_arg(&spec);

        assert_eq!(arg.get_long(), Some("first-name"));
        assert_eq!(arg.get_short(), Some('f'));
        assert_eq!(arg.get_visible_aliases(), Some(vec!["fn"]));
        assert_eq!(arg.get_visible_short_aliases(), Some(vec!['n']));
    }

    #[test]
    fn test_lookup_env_first_set_variable_wins() {
        let spec = flag("port", ValueKind::Uint64).with_env_vars(["PORT", "APP_PORT"]);
        let env = crate::MapEnv::new().with("PORT", "").with("APP_PORT", "8080");

        assert_eq!(lookup_env(&spec, &env).unwrap(), Some(Value::Uint64(8080)));
        assert_eq!(lookup_env(&spec, &crate::MapEnv::new()).unwrap(), None);
    }

    #[test]
    fn test_lookup_env_rejects_bad_value() {
        let spec = flag("port", ValueKind::Uint64).with_env_vars(["PORT"]);
        let env = crate::MapEnv::new().with("PORT", "eighty");

        let err = lookup_env(&spec, &env).unwrap_err();
        assert!(matches!(
            err,
            DecliError::InvalidEnvValue { ref var, ref value, .. } if var == "PORT" && value == "eighty"
        ));
    }
}
