//! Descriptor data model for bound command lines.
//!
//! This module defines the plain-data half of a binding: the closed set of
//! [`ValueKind`]s a field may carry, the parsed [`Value`] union, and the
//! serializable [`FlagSpec`]/[`CommandSpec`] views that describe the flag and
//! subcommand tree derived from a described struct.

use std::any::{Any, TypeId};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::naming::{format_duration, parse_bool, parse_duration};

/// Value kind of a bindable field.
///
/// The set is closed: a field whose Rust type is not one of the types listed
/// below is rejected when the command tree is extracted. Adding a kind means
/// adding a variant here and teaching [`Value`] about it.
///
/// | Kind       | Rust type                  |
/// |------------|----------------------------|
/// | `String`   | `String`                   |
/// | `Int`      | `isize`                    |
/// | `Uint`     | `usize`                    |
/// | `Int64`    | `i64`                      |
/// | `Uint64`   | `u64`                      |
/// | `Float`    | `f64`                      |
/// | `Bool`     | `bool`                     |
/// | `Duration` | `std::time::Duration`      |
///
/// # Examples
///
/// ```
/// use decli_core::ValueKind;
///
/// assert_eq!(ValueKind::of::<i64>(), Some(ValueKind::Int64));
/// assert_eq!(ValueKind::of::<Vec<String>>(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Int,
    Uint,
    Int64,
    Uint64,
    Float,
    Bool,
    Duration,
}

impl ValueKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [ValueKind; 8] = [
        ValueKind::String,
        ValueKind::Int,
        ValueKind::Uint,
        ValueKind::Int64,
        ValueKind::Uint64,
        ValueKind::Float,
        ValueKind::Bool,
        ValueKind::Duration,
    ];

    /// Resolves the kind of the Rust type `V`, or `None` when `V` is not
    /// bindable.
    pub fn of<V: Any>() -> Option<Self> {
        let id = TypeId::of::<V>();
        Self::ALL.into_iter().find(|kind| kind.rust_type_id() == id)
    }

    fn rust_type_id(self) -> TypeId {
        match self {
            ValueKind::String => TypeId::of::<String>(),
            ValueKind::Int => TypeId::of::<isize>(),
            ValueKind::Uint => TypeId::of::<usize>(),
            ValueKind::Int64 => TypeId::of::<i64>(),
            ValueKind::Uint64 => TypeId::of::<u64>(),
            ValueKind::Float => TypeId::of::<f64>(),
            ValueKind::Bool => TypeId::of::<bool>(),
            ValueKind::Duration => TypeId::of::<Duration>(),
        }
    }

    /// Placeholder shown for the flag value in help output.
    pub fn value_name(self) -> &'static str {
        match self {
            ValueKind::String => "STRING",
            ValueKind::Int => "INT",
            ValueKind::Uint => "UINT",
            ValueKind::Int64 => "INT64",
            ValueKind::Uint64 => "UINT64",
            ValueKind::Float => "FLOAT",
            ValueKind::Bool => "BOOL",
            ValueKind::Duration => "DURATION",
        }
    }

    /// Returns `true` for kinds that accept a leading `-` in their values.
    pub fn is_signed(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Int64 | ValueKind::Float)
    }

    /// Parses command-line or environment text into a value of this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use decli_core::{Value, ValueKind};
    ///
    /// assert_eq!(ValueKind::Int.parse("-42"), Ok(Value::Int(-42)));
    /// assert_eq!(
    ///     ValueKind::Duration.parse("5ms"),
    ///     Ok(Value::Duration(Duration::from_millis(5)))
    /// );
    /// assert!(ValueKind::Uint.parse("-1").is_err());
    /// ```
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        let text = raw.trim();
        match self {
            ValueKind::String => Ok(Value::String(raw.to_string())),
            ValueKind::Int => text
                .parse()
                .map(Value::Int)
                .map_err(|err| format!("invalid int {raw:?}: {err}")),
            ValueKind::Uint => text
                .parse()
                .map(Value::Uint)
                .map_err(|err| format!("invalid uint {raw:?}: {err}")),
            ValueKind::Int64 => text
                .parse()
                .map(Value::Int64)
                .map_err(|err| format!("invalid int64 {raw:?}: {err}")),
            ValueKind::Uint64 => text
                .parse()
                .map(Value::Uint64)
                .map_err(|err| format!("invalid uint64 {raw:?}: {err}")),
            ValueKind::Float => text
                .parse()
                .map(Value::Float)
                .map_err(|err| format!("invalid float {raw:?}: {err}")),
            ValueKind::Bool => parse_bool(text)
                .map(Value::Bool)
                .ok_or_else(|| format!("invalid bool {raw:?}")),
            ValueKind::Duration => parse_duration(text).map(Value::Duration),
        }
    }

    /// Snapshots the current value of a field slot holding this kind.
    ///
    /// Returns `None` if the slot holds a different type.
    pub fn read(self, slot: &dyn Any) -> Option<Value> {
        match self {
            ValueKind::String => slot.downcast_ref::<String>().cloned().map(Value::String),
            ValueKind::Int => slot.downcast_ref::<isize>().copied().map(Value::Int),
            ValueKind::Uint => slot.downcast_ref::<usize>().copied().map(Value::Uint),
            ValueKind::Int64 => slot.downcast_ref::<i64>().copied().map(Value::Int64),
            ValueKind::Uint64 => slot.downcast_ref::<u64>().copied().map(Value::Uint64),
            ValueKind::Float => slot.downcast_ref::<f64>().copied().map(Value::Float),
            ValueKind::Bool => slot.downcast_ref::<bool>().copied().map(Value::Bool),
            ValueKind::Duration => slot.downcast_ref::<Duration>().copied().map(Value::Duration),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Uint => "uint",
            ValueKind::Int64 => "int64",
            ValueKind::Uint64 => "uint64",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// A parsed flag value, one variant per [`ValueKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(isize),
    Uint(usize),
    Int64(i64),
    Uint64(u64),
    Float(f64),
    Bool(bool),
    Duration(Duration),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::Uint(_) => ValueKind::Uint,
            Value::Int64(_) => ValueKind::Int64,
            Value::Uint64(_) => ValueKind::Uint64,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Duration(_) => ValueKind::Duration,
        }
    }

    /// Writes this value into a field slot.
    ///
    /// Returns `false`, leaving the slot untouched, when the slot holds a
    /// different type than the value's kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use decli_core::Value;
    ///
    /// let mut port: u64 = 0;
    /// assert!(Value::Uint64(8080).write_to(&mut port));
    /// assert_eq!(port, 8080);
    ///
    /// let mut name = String::new();
    /// assert!(!Value::Uint64(1).write_to(&mut name));
    /// ```
    pub fn write_to(self, slot: &mut dyn Any) -> bool {
        fn put<V: Any>(slot: &mut dyn Any, value: V) -> bool {
            match slot.downcast_mut::<V>() {
                Some(target) => {
                    *target = value;
                    true
                }
                None => false,
            }
        }

        match self {
            Value::String(v) => put(slot, v),
            Value::Int(v) => put(slot, v),
            Value::Uint(v) => put(slot, v),
            Value::Int64(v) => put(slot, v),
            Value::Uint64(v) => put(slot, v),
            Value::Float(v) => put(slot, v),
            Value::Bool(v) => put(slot, v),
            Value::Duration(v) => put(slot, v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Duration(v) => f.write_str(&format_duration(*v)),
        }
    }
}

/// Resolved description of one bindable flag.
///
/// Produced by extraction from a single struct field. `name` is the long
/// flag (`--name`); single-character aliases become short flags.
///
/// # Examples
///
/// ```
/// use decli_core::{FlagSpec, ValueKind};
///
/// let flag = FlagSpec::new("first-name", ValueKind::String)
///     .with_usage("your first name")
///     .with_aliases(["fn", "f"]);
/// assert!(flag.matches("first-name"));
/// assert!(flag.matches("f"));
/// assert!(!flag.matches("last-name"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Long flag name without leading dashes
    pub name: String,
    /// Identifier of the originating struct field
    pub field: String,
    /// Kind of value the flag accepts
    pub kind: ValueKind,
    /// Help text
    pub usage: Option<String>,
    /// Excluded from help output, still accepted on the command line
    pub hidden: bool,
    /// Alternative names (single characters become short flags)
    pub aliases: Vec<String>,
    /// Environment variables consulted, in order, when the flag is absent
    pub env_vars: Vec<String>,
    /// Help-display override for the default
    pub default_text: Option<String>,
    /// Field value at extraction time, rendered as text
    pub default_value: Option<String>,
    /// Must be supplied on the command line or through the environment
    pub required: bool,
}

impl FlagSpec {
    /// Creates a flag with no usage, aliases, or environment variables.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            field: String::new(),
            kind,
            usage: None,
            hidden: false,
            aliases: Vec::new(),
            env_vars: Vec::new(),
            default_text: None,
            default_value: None,
            required: false,
        }
    }

    /// Sets the help text.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Replaces the alias list.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the environment variable list.
    pub fn with_env_vars<I, S>(mut self, env_vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars = env_vars.into_iter().map(Into::into).collect();
        self
    }

    /// Checks whether `name` is the flag name or one of its aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Iterates over the flag name followed by its aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Text shown as the default in help output: the explicit default text if
    /// present, otherwise the extraction-time value.
    ///
    /// # Examples
    ///
    /// ```
    /// use decli_core::{FlagSpec, ValueKind};
    ///
    /// let mut flag = FlagSpec::new("age", ValueKind::Int);
    /// flag.default_value = Some("-1".into());
    /// assert_eq!(flag.default_display(), Some("-1"));
    ///
    /// flag.default_text = Some("unknown".into());
    /// assert_eq!(flag.default_display(), Some("unknown"));
    /// ```
    pub fn default_display(&self) -> Option<&str> {
        self.default_text
            .as_deref()
            .or(self.default_value.as_deref())
    }
}

/// Resolved description of one node in the command tree.
///
/// The root node describes the application; every nested runnable struct
/// becomes a child node in [`subcommands`](CommandSpec::subcommands), in
/// declaration order.
///
/// # Examples
///
/// ```
/// use decli_core::{CommandSpec, FlagSpec, ValueKind};
///
/// let mut root = CommandSpec::new("app");
/// root.flags.push(FlagSpec::new("verbose", ValueKind::Bool));
/// root.subcommands.push(
///     CommandSpec::new("serve").with_flag(FlagSpec::new("port", ValueKind::Uint64)),
/// );
///
/// assert_eq!(root.subcommand_names(), vec!["serve"]);
/// assert!(root.find_flag("verbose").is_some());
/// assert!(root.find_subcommand("serve").unwrap().find_flag("port").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Command name as typed on the command line
    pub name: String,
    /// Identifier of the originating struct field (`None` for the root)
    pub field: Option<String>,
    /// Short description
    pub usage: Option<String>,
    /// Alternative names for this subcommand
    pub aliases: Vec<String>,
    /// Excluded from help output
    pub hidden: bool,
    /// Flags in declaration order
    pub flags: Vec<FlagSpec>,
    /// Nested subcommands in declaration order
    pub subcommands: Vec<CommandSpec>,
    /// The node exposes a run callback
    pub runnable: bool,
    /// The node exposes a before-run callback
    pub pre_runnable: bool,
}

impl CommandSpec {
    /// Creates an empty command node.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a flag.
    pub fn with_flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds a nested subcommand.
    pub fn with_subcommand(mut self, sub: CommandSpec) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Finds a direct subcommand by name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandSpec> {
        self.subcommands
            .iter()
            .find(|s| s.name == name || s.aliases.iter().any(|a| a == name))
    }

    /// Finds a flag of this node by name or alias.
    pub fn find_flag(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.matches(name))
    }

    /// Gets all subcommand names.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }

    /// Serializes the tree as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_supported_types() {
        let resolved = [
            ValueKind::of::<String>(),
            ValueKind::of::<isize>(),
            ValueKind::of::<usize>(),
            ValueKind::of::<i64>(),
            ValueKind::of::<u64>(),
            ValueKind::of::<f64>(),
            ValueKind::of::<bool>(),
            ValueKind::of::<Duration>(),
        ];
        assert_eq!(resolved, ValueKind::ALL.map(Some));
    }

    #[test]
    fn test_kind_of_value_kind_itself_is_unsupported() {
        assert_eq!(ValueKind::of::<ValueKind>(), None);
    }

    #[test]
    fn test_parsed_value_has_requested_kind() {
        let samples = ["x", "-1", "1", "-1", "1", "1.5", "t", "1s"];
        for (kind, raw) in ValueKind::ALL.into_iter().zip(samples) {
            assert_eq!(kind.parse(raw).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_kind_of_unsupported_types() {
        assert_eq!(ValueKind::of::<i32>(), None);
        assert_eq!(ValueKind::of::<&'static str>(), None);
        assert_eq!(ValueKind::of::<std::collections::HashMap<String, String>>(), None);
    }

    #[test]
    fn test_parse_bool_is_strict_for_values() {
        assert_eq!(ValueKind::Bool.parse("T"), Ok(Value::Bool(true)));
        assert_eq!(ValueKind::Bool.parse("0"), Ok(Value::Bool(false)));
        assert!(ValueKind::Bool.parse("maybe").is_err());
    }

    #[test]
    fn test_parse_keeps_string_whitespace() {
        assert_eq!(
            ValueKind::String.parse("  padded "),
            Ok(Value::String("  padded ".to_string()))
        );
        assert_eq!(ValueKind::Uint64.parse(" 789 "), Ok(Value::Uint64(789)));
    }

    #[test]
    fn test_read_and_write_slot() {
        let mut timeout = Duration::from_secs(1);
        assert_eq!(
            ValueKind::Duration.read(&timeout),
            Some(Value::Duration(Duration::from_secs(1)))
        );
        assert!(Value::Duration(Duration::from_millis(5)).write_to(&mut timeout));
        assert_eq!(timeout, Duration::from_millis(5));
        assert_eq!(ValueKind::Int.read(&timeout), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(12.3).to_string(), "12.3");
        assert_eq!(Value::Int(-1).to_string(), "-1");
        assert_eq!(
            Value::Duration(Duration::from_secs(5400)).to_string(),
            "1h30m0s"
        );
    }

    #[test]
    fn test_command_spec_find_subcommand_by_alias() {
        let mut sub = CommandSpec::new("serve");
        sub.aliases.push("s".to_string());
        let root = CommandSpec::new("app").with_subcommand(sub);

        assert!(root.find_subcommand("s").is_some());
        assert!(root.find_subcommand("run").is_none());
    }

    #[test]
    fn test_command_spec_json() {
        let root = CommandSpec::new("app").with_flag(FlagSpec::new("some-int", ValueKind::Int));
        let json = root.to_json().unwrap();
        assert!(json.contains("\"some-int\""));
        assert!(json.contains("\"int\""));

        let back: CommandSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
