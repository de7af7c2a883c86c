use decli_core::{Config, Decli, Describe, RunError, Runnable, Schema};
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Greets whoever is named on the command line or in the environment.
#[derive(Debug, Clone, PartialEq)]
struct Hello {
    first_name: String,
    last_name: String,
    age: isize,
}

impl Default for Hello {
    fn default() -> Self {
        Self {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            age: -1,
        }
    }
}

impl Hello {
    fn greeting(&self) -> String {
        format!("Hello {} {} ({})", self.first_name, self.last_name, self.age)
    }
}

impl Describe for Hello {
    fn describe(schema: &mut Schema<Self>) {
        schema
            .field(
                "FirstName",
                r#"name:"first-name" usage:"your first name" aliases:"fn""#,
                |h| &mut h.first_name,
            )
            .field(
                "LastName",
                r#"name:"last-name" usage:"your last name" aliases:"ln""#,
                |h| &mut h.last_name,
            )
            .field(
                "Age",
                r#"usage:"your age" aliases:"a" defaultText:"unknown""#,
                |h| &mut h.age,
            );
    }

    fn runnable(&mut self) -> Option<&mut dyn Runnable> {
        Some(self)
    }
}

impl Runnable for Hello {
    fn run(&mut self, args: &[String]) -> Result<(), RunError> {
        tracing::debug!(residual = args.len(), "greeting");
        println!("{}", self.greeting());
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new()
        .with_version(PACKAGE_VERSION)
        .with_about("Say hello");
    let mut hello = Hello::default();
    Decli::new()
        .with_config(config)
        .run_and_finish(&mut hello, std::env::args());
}

#[cfg(test)]
mod tests {
    use decli_core::MapEnv;

    use super::*;

    #[test]
    fn test_defaults_greeting() {
        assert_eq!(Hello::default().greeting(), "Hello John Doe (-1)");
    }

    #[test]
    fn test_flags_and_env() {
        let mut hello = Hello::default();
        Decli::new()
            .with_env(MapEnv::new().with("AGE", "33"))
            .run(&mut hello, ["decli-hello", "--fn", "Jane", "--last-name=Roe"])
            .unwrap();

        assert_eq!(hello.greeting(), "Hello Jane Roe (33)");
    }

    #[test]
    fn test_help_shows_default_text() {
        let help = Decli::new()
            .render_help(&mut Hello::default())
            .unwrap();
        assert!(help.contains("--first-name"));
        assert!(help.contains("[default: unknown]"));
        assert!(help.contains("[env: FIRST_NAME]"));
    }
}
