use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agent-tools")]
#[command(author, version, about = "Shell, git and GitHub tools for LLM agent runtimes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered tools
    List,

    /// Print the JSON input schema of a tool
    Schema { name: String },

    /// Invoke a tool once and print its result envelope
    Call {
        name: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Serve the tools over MCP (JSON-RPC on stdin/stdout)
    Serve,
}
