//! Declarative command line binding for plain structs.
//!
//! A struct describes its fields once, through [`Describe`], and the fields
//! become flags of a command line interface. Nested runnable structs become
//! subcommands. The crate turns that description into a [`clap`] command,
//! fills the struct from argv and the environment, and runs the selected
//! command.
//!
//! - [`Describe`] and [`Schema`]: field registration, with per-field tags
//!   such as `name:"first-name" usage:"your first name" aliases:"fn"` (see
//!   [`tag`]).
//! - [`Runnable`] and [`PreRunnable`]: command callbacks receiving the
//!   residual positional arguments.
//! - [`extract`]: builds the [`CommandDescriptor`] tree and its serializable
//!   [`CommandSpec`] view, reporting configuration errors up front.
//! - [`run`], [`run_with`], [`run_and_finish`] and [`Decli`]: parse, resolve
//!   values (command line, then environment, then the field's current
//!   value) and dispatch.
//!
//! # Example
//!
//! ```
//! use decli_core::{Decli, Describe, MapEnv, RunError, Runnable, Schema};
//!
//! #[derive(Default)]
//! struct Hello {
//!     first_name: String,
//!     age: isize,
//!     greeted: bool,
//! }
//!
//! impl Describe for Hello {
//!     fn describe(schema: &mut Schema<Self>) {
//!         schema
//!             .field("FirstName", r#"usage:"your first name" aliases:"fn""#, |h| &mut h.first_name)
//!             .field("Age", r#"usage:"your age""#, |h| &mut h.age);
//!     }
//!
//!     fn runnable(&mut self) -> Option<&mut dyn Runnable> {
//!         Some(self)
//!     }
//! }
//!
//! impl Runnable for Hello {
//!     fn run(&mut self, _args: &[String]) -> Result<(), RunError> {
//!         self.greeted = true;
//!         Ok(())
//!     }
//! }
//!
//! let mut hello = Hello {
//!     first_name: "John".to_string(),
//!     ..Default::default()
//! };
//! Decli::new()
//!     .with_env(MapEnv::new().with("AGE", "42"))
//!     .run(&mut hello, ["hello", "--fn", "Jane"])
//!     .unwrap();
//!
//! assert_eq!(hello.first_name, "Jane");
//! assert_eq!(hello.age, 42);
//! assert!(hello.greeted);
//! ```

mod binder;
mod config;
mod env;
mod error;
pub mod naming;
mod schema;
pub mod tag;
mod types;
mod validate;

pub use binder::{Decli, run, run_and_finish, run_with};
pub use config::{Config, NamingPolicy};
pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{DecliError, Result, RunError};
pub use schema::{
    CommandDescriptor, Describe, FieldDescriptor, PreRunnable, Runnable, Schema, extract,
};
pub use tag::{FieldTag, Tag};
pub use types::*;
pub use validate::{DEFAULT_RESERVED, ValidationError, validate_command, validate_command_with};
