//! Struct description and command tree extraction.
//!
//! A struct opts into binding by implementing [`Describe`]: it lists its
//! fields, in declaration order, on a [`Schema`]. Scalar fields become flags,
//! nested runnable structs become subcommands. [`extract`] walks that
//! description once against a live value and produces a
//! [`CommandDescriptor`] tree: the resolved [`CommandSpec`] data plus the
//! accessors used to write parsed values back into the struct.
//!
//! Fields are reached through plain accessor functions
//! (`fn(&mut T) -> &mut V`), so write-back never holds a reference into the
//! struct beyond a single call.

use std::any::{Any, type_name};
use std::fmt;

use clap::ArgMatches;
use tracing::debug;

use crate::binder::Plan;
use crate::config::{Config, NamingPolicy};
use crate::env::EnvSource;
use crate::error::{DecliError, Result, RunError};
use crate::naming::{env_var_name, kebab_case};
use crate::tag::FieldTag;
use crate::types::{CommandSpec, FlagSpec, Value, ValueKind};
use crate::validate::validate_command_with;

/// A command node that does something once its flags are bound.
pub trait Runnable {
    /// Runs the command with the positional arguments left after parsing.
    fn run(&mut self, args: &[String]) -> std::result::Result<(), RunError>;
}

/// A command node that validates or prepares before [`Runnable::run`].
pub trait PreRunnable {
    /// Called with the same arguments as `run`; an error aborts dispatch.
    fn before_run(&mut self, args: &[String]) -> std::result::Result<(), RunError>;
}

/// Describes a struct's bindable shape.
///
/// `describe` registers fields on the schema in declaration order, which is
/// also the order flags and subcommands are listed in help output. The
/// capability probes opt the struct into being a runnable command node;
/// a struct used as a subcommand must return `Some` from
/// [`runnable`](Describe::runnable).
///
/// # Examples
///
/// ```
/// use decli_core::{Describe, RunError, Runnable, Schema};
///
/// #[derive(Default)]
/// struct Serve {
///     port: u64,
///     verbose: bool,
/// }
///
/// impl Describe for Serve {
///     fn describe(schema: &mut Schema<Self>) {
///         schema
///             .field("Port", r#"usage:"port to listen on" aliases:"p""#, |s| &mut s.port)
///             .field("Verbose", "", |s| &mut s.verbose);
///     }
///
///     fn runnable(&mut self) -> Option<&mut dyn Runnable> {
///         Some(self)
///     }
/// }
///
/// impl Runnable for Serve {
///     fn run(&mut self, _args: &[String]) -> Result<(), RunError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Describe: Sized + 'static {
    /// Registers the struct's fields.
    fn describe(schema: &mut Schema<Self>);

    /// Returns the run capability, if the struct has one.
    fn runnable(&mut self) -> Option<&mut dyn Runnable> {
        None
    }

    /// Returns the before-run capability, if the struct has one.
    fn pre_runnable(&mut self) -> Option<&mut dyn PreRunnable> {
        None
    }
}

/// Field registrations for a struct `T`, in declaration order.
pub struct Schema<T> {
    entries: Vec<Entry<T>>,
}

enum Entry<T> {
    Field(FieldEntry<T>),
    Command(CommandEntry<T>),
}

struct FieldEntry<T> {
    ident: &'static str,
    tag: &'static str,
    type_name: &'static str,
    kind: Option<ValueKind>,
    slot: Box<dyn Slot<T>>,
}

struct CommandEntry<T> {
    ident: &'static str,
    tag: &'static str,
    nest: Box<dyn Nest<T>>,
}

impl<T: Describe> Schema<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a flag field.
    ///
    /// `ident` is the field identifier used for name derivation and error
    /// messages, `tag` the raw tag string (see [`crate::tag`]). A field
    /// whose type is not a supported [`ValueKind`] is rejected by
    /// [`extract`].
    pub fn field<V: Any>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        access: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.entries.push(Entry::Field(FieldEntry {
            ident,
            tag,
            type_name: type_name::<V>(),
            kind: ValueKind::of::<V>(),
            slot: Box::new(Accessor { access }),
        }));
        self
    }

    /// Registers a nested struct as a subcommand.
    pub fn command<C: Describe>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        access: fn(&mut T) -> &mut C,
    ) -> &mut Self {
        self.nest(ident, tag, Access::Direct(access))
    }

    /// Registers a boxed nested struct as a subcommand.
    pub fn boxed_command<C: Describe>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        access: fn(&mut T) -> &mut Box<C>,
    ) -> &mut Self {
        self.nest(ident, tag, Access::Boxed(access))
    }

    fn nest<C: Describe>(
        &mut self,
        ident: &'static str,
        tag: &'static str,
        access: Access<T, C>,
    ) -> &mut Self {
        self.entries.push(Entry::Command(CommandEntry {
            ident,
            tag,
            nest: Box::new(Nested { access }),
        }));
        self
    }
}

/// Type-erased access to one field of `T`.
trait Slot<T> {
    fn get<'a>(&self, target: &'a mut T) -> &'a mut dyn Any;
}

struct Accessor<T, V> {
    access: fn(&mut T) -> &mut V,
}

impl<T, V: Any> Slot<T> for Accessor<T, V> {
    fn get<'a>(&self, target: &'a mut T) -> &'a mut dyn Any {
        (self.access)(target)
    }
}

enum Access<P, C> {
    Direct(fn(&mut P) -> &mut C),
    Boxed(fn(&mut P) -> &mut Box<C>),
}

impl<P, C> Clone for Access<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C> Copy for Access<P, C> {}

impl<P, C> Access<P, C> {
    fn project<'a>(&self, parent: &'a mut P) -> &'a mut C {
        match *self {
            Access::Direct(access) => access(parent),
            Access::Boxed(access) => access(parent).as_mut(),
        }
    }
}

/// Extracts a registered subcommand against its parent value.
trait Nest<P> {
    fn extract(
        &self,
        parent: &mut P,
        head: CommandSpec,
        config: &Config,
        path: &mut Vec<String>,
    ) -> Result<Box<dyn Child<P>>>;
}

struct Nested<P, C> {
    access: Access<P, C>,
}

impl<P: 'static, C: Describe> Nest<P> for Nested<P, C> {
    fn extract(
        &self,
        parent: &mut P,
        mut head: CommandSpec,
        config: &Config,
        path: &mut Vec<String>,
    ) -> Result<Box<dyn Child<P>>> {
        let target = self.access.project(parent);
        head.runnable = target.runnable().is_some();
        head.pre_runnable = target.pre_runnable().is_some();
        if !head.runnable {
            return Err(DecliError::NotRunnable {
                field: head.field.clone().unwrap_or_default(),
                type_name: type_name::<C>(),
            });
        }

        debug!(command = %head.name, type_name = type_name::<C>(), "nested subcommand");
        path.push(head.name.clone());
        let descriptor = extract_node(target, head, config, path);
        path.pop();

        Ok(Box::new(ChildCommand {
            access: self.access,
            descriptor: descriptor?,
        }))
    }
}

/// A subcommand node as seen from its parent struct `P`.
pub(crate) trait Child<P> {
    fn name(&self) -> &str;
    fn spec(&self) -> CommandSpec;
    fn command(&self) -> clap::Command;
    fn resolve(
        &self,
        matches: &ArgMatches,
        env: &dyn EnvSource,
        path: &mut Vec<String>,
    ) -> Result<Plan>;
    fn apply(&self, parent: &mut P, plan: Plan) -> Result<bool>;
}

struct ChildCommand<P, C> {
    access: Access<P, C>,
    descriptor: CommandDescriptor<C>,
}

impl<P, C: Describe> Child<P> for ChildCommand<P, C> {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn spec(&self) -> CommandSpec {
        self.descriptor.spec()
    }

    fn command(&self) -> clap::Command {
        self.descriptor.command()
    }

    fn resolve(
        &self,
        matches: &ArgMatches,
        env: &dyn EnvSource,
        path: &mut Vec<String>,
    ) -> Result<Plan> {
        self.descriptor.resolve(matches, env, path)
    }

    fn apply(&self, parent: &mut P, plan: Plan) -> Result<bool> {
        self.descriptor.apply(self.access.project(parent), plan)
    }
}

/// One bound flag: its resolved spec and the accessor of its field.
pub struct FieldDescriptor<T> {
    spec: FlagSpec,
    slot: Box<dyn Slot<T>>,
}

impl<T> FieldDescriptor<T> {
    /// The resolved flag.
    pub fn spec(&self) -> &FlagSpec {
        &self.spec
    }

    /// Reads the field's current value.
    pub fn read(&self, target: &mut T) -> Option<Value> {
        self.spec.kind.read(self.slot.get(target))
    }

    /// Writes a value into the field.
    pub fn write(&self, target: &mut T, value: Value) -> Result<()> {
        if value.kind() == self.spec.kind && value.write_to(self.slot.get(target)) {
            Ok(())
        } else {
            Err(DecliError::KindMismatch {
                field: self.spec.field.clone(),
                kind: self.spec.kind,
            })
        }
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// One node of an extracted command tree for struct `T`.
pub struct CommandDescriptor<T> {
    pub(crate) head: CommandSpec,
    pub(crate) fields: Vec<FieldDescriptor<T>>,
    pub(crate) children: Vec<Box<dyn Child<T>>>,
}

impl<T> CommandDescriptor<T> {
    /// The command name.
    pub fn name(&self) -> &str {
        &self.head.name
    }

    /// Bound flags in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Assembles the full [`CommandSpec`] tree rooted at this node.
    pub fn spec(&self) -> CommandSpec {
        let mut spec = self.head.clone();
        spec.flags = self.fields.iter().map(|f| f.spec.clone()).collect();
        spec.subcommands = self.children.iter().map(|c| c.spec()).collect();
        spec
    }
}

impl<T> fmt::Debug for CommandDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("spec", &self.spec())
            .finish_non_exhaustive()
    }
}

/// Extracts the command tree of `target`, naming the root `name`.
///
/// Every field is resolved against the current value of `target`, which
/// becomes the flag's default. Configuration errors (unsupported field
/// kinds, non-runnable subcommands, malformed tags, missing names under
/// [`NamingPolicy::Explicit`], structural problems) are reported here,
/// before any argument is parsed. `target` is not modified.
///
/// # Examples
///
/// ```
/// use decli_core::{Config, Describe, Schema, extract};
///
/// struct Limits {
///     max_items: usize,
/// }
///
/// impl Describe for Limits {
///     fn describe(schema: &mut Schema<Self>) {
///         schema.field("MaxItems", r#"usage:"upper bound""#, |l| &mut l.max_items);
///     }
/// }
///
/// let mut limits = Limits { max_items: 10 };
/// let spec = extract(&mut limits, "limits", &Config::default()).unwrap().spec();
/// let flag = spec.find_flag("max-items").unwrap();
/// assert_eq!(flag.env_vars, vec!["MAX_ITEMS"]);
/// assert_eq!(flag.default_value.as_deref(), Some("10"));
/// ```
pub fn extract<T: Describe>(
    target: &mut T,
    name: &str,
    config: &Config,
) -> Result<CommandDescriptor<T>> {
    let mut head = CommandSpec::new(name);
    head.usage = config.about.clone();
    head.runnable = target.runnable().is_some();
    head.pre_runnable = target.pre_runnable().is_some();

    let mut path = vec![name.to_string()];
    let descriptor = extract_node(target, head, config, &mut path)?;

    let errors = validate_command_with(&descriptor.spec(), &config.reserved_flags());
    if !errors.is_empty() {
        return Err(DecliError::Invalid(errors));
    }
    Ok(descriptor)
}

fn extract_node<T: Describe>(
    target: &mut T,
    head: CommandSpec,
    config: &Config,
    path: &mut Vec<String>,
) -> Result<CommandDescriptor<T>> {
    let mut schema = Schema::new();
    T::describe(&mut schema);

    let mut fields = Vec::new();
    let mut children = Vec::new();
    for entry in schema.entries {
        match entry {
            Entry::Field(field) => {
                let descriptor =
                    extract_field(target, field, config).map_err(|err| err.configuring(path))?;
                fields.push(descriptor);
            }
            Entry::Command(command) => {
                let head = command_head(&command, config).map_err(|err| err.configuring(path))?;
                let child = command
                    .nest
                    .extract(target, head, config, path)
                    .map_err(|err| err.configuring(path))?;
                children.push(child);
            }
        }
    }

    debug!(
        command = %path.join(" "),
        flags = fields.len(),
        subcommands = children.len(),
        "extracted command"
    );
    Ok(CommandDescriptor {
        head,
        fields,
        children,
    })
}

fn extract_field<T>(
    target: &mut T,
    entry: FieldEntry<T>,
    config: &Config,
) -> Result<FieldDescriptor<T>> {
    let field = entry.ident.to_string();
    let tag = FieldTag::parse(entry.tag).map_err(|reason| DecliError::InvalidTag {
        field: field.clone(),
        reason,
    })?;
    let kind = entry.kind.ok_or_else(|| DecliError::UnsupportedFieldKind {
        field: field.clone(),
        type_name: entry.type_name,
    })?;
    let name = resolve_name(entry.ident, tag.name.as_deref(), config)?;

    let env_vars = if tag.env_vars.is_empty() {
        vec![env_var_name(&name, config.env_prefix.as_deref())]
    } else {
        tag.env_vars
    };

    let current = kind
        .read(entry.slot.get(target))
        .ok_or_else(|| DecliError::KindMismatch {
            field: field.clone(),
            kind,
        })?;
    let default_value = Some(current.to_string()).filter(|text| !text.is_empty());

    debug!(flag = %name, %kind, field = entry.ident, "bound flag");
    Ok(FieldDescriptor {
        spec: FlagSpec {
            name,
            field,
            kind,
            usage: tag.usage,
            hidden: tag.hidden,
            aliases: tag.aliases,
            env_vars,
            default_text: tag.default_text,
            default_value,
            required: tag.required,
        },
        slot: entry.slot,
    })
}

fn command_head<T>(entry: &CommandEntry<T>, config: &Config) -> Result<CommandSpec> {
    let tag = FieldTag::parse(entry.tag).map_err(|reason| DecliError::InvalidTag {
        field: entry.ident.to_string(),
        reason,
    })?;
    let name = resolve_name(entry.ident, tag.name.as_deref(), config)?;

    let mut head = CommandSpec::new(&name);
    head.field = Some(entry.ident.to_string());
    head.usage = tag.usage;
    head.aliases = tag.aliases;
    head.hidden = tag.hidden;
    Ok(head)
}

fn resolve_name(ident: &str, explicit: Option<&str>, config: &Config) -> Result<String> {
    match (explicit, config.naming) {
        (Some(name), _) => Ok(name.to_string()),
        (None, NamingPolicy::Derived) => Ok(kebab_case(ident)),
        (None, NamingPolicy::Explicit) => Err(DecliError::MissingName {
            field: ident.to_string(),
        }),
    }
}
