//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn html_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("html")
                .value_name("HTML_BASE64")
                .required_unless_present("file")
                .help("Base64-encoded HTML document"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("html")
                .help("Read the HTML document from a file instead"),
        )
        .arg(
            Arg::new("context")
                .long("context")
                .default_value("{}")
                .help("Context object as JSON, echoed into the report"),
        )
}

fn filter_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("include")
                .long("include")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Tasks to remediate (ALT_TEXT, BUTTON, SKIP_CONTENT, SEMANTIC_STRUCTURE)"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Tasks never remediated; wins over --include"),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .value_parser(value_parser!(usize))
                .help("Largest filtered issue count that still passes"),
        )
        .arg(
            Arg::new("no-semantic")
                .long("no-semantic")
                .action(ArgAction::SetTrue)
                .help("Skip the model-judged control semantics rule"),
        )
}

/// Build the `a11y` command
pub(crate) fn build() -> Command {
    Command::new("a11y")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Detect, classify and repair accessibility defects in HTML documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .global(true)
                .help("Completion service credential (default: $OPENAI_API_KEY)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .short('m')
                .global(true)
                .help("Model identifier"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs to stderr as JSON"),
        )
        .subcommand(filter_args(html_args(
            Command::new("report").about("Report classified accessibility issues as JSON"),
        )))
        .subcommand(
            filter_args(html_args(
                Command::new("improve").about("Generate and apply fixes, printing the fixed document"),
            ))
            .arg(
                Arg::new("raw")
                    .long("raw")
                    .action(ArgAction::SetTrue)
                    .help("Print the fixed document as is instead of base64"),
            )
            .arg(
                Arg::new("verify")
                    .long("verify")
                    .action(ArgAction::SetTrue)
                    .help("Re-scan the fixed document"),
            )
            .arg(
                Arg::new("asset-root")
                    .long("asset-root")
                    .value_parser(value_parser!(PathBuf))
                    .help("Directory that relative image sources resolve against"),
            )
            .arg(
                Arg::new("concurrency")
                    .long("concurrency")
                    .value_parser(value_parser!(usize))
                    .help("Generation calls in flight at once"),
            ),
        )
        .subcommand(
            Command::new("alt-text")
                .about("Generate alt text for an image, or score existing alt text")
                .arg(
                    Arg::new("image")
                        .value_name("IMAGE")
                        .required_unless_present("existing-alt")
                        .help("Image file, data URL, plain base64 or http(s) URL"),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .help("Page context: text, JSON with a context field, or base64 HTML"),
                )
                .arg(
                    Arg::new("existing-alt")
                        .long("existing-alt")
                        .requires("context")
                        .help("Score this alt text against --context instead of generating"),
                ),
        )
        .subcommand(
            Command::new("solve-issue")
                .about("Propose a fix for a single issue")
                .arg(
                    Arg::new("issue")
                        .value_name("ISSUE_JSON")
                        .required(true)
                        .help("Issue as JSON"),
                )
                .arg(
                    Arg::new("html")
                        .value_name("HTML_BASE64")
                        .required_unless_present("file")
                        .help("Base64-encoded HTML document containing the issue"),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .short('f')
                        .value_parser(value_parser!(PathBuf))
                        .conflicts_with("html")
                        .help("Read the HTML document from a file instead"),
                )
                .arg(
                    Arg::new("issue-type")
                        .long("issue-type")
                        .help("Task to solve as; classified from the issue when omitted"),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .default_value("{}")
                        .help("Context object as JSON, echoed into the response"),
                ),
        )
        .subcommand(Command::new("list-models").about("List vision-capable models"))
}
