use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "paperchat")]
#[command(about = "Chat with a research-paper MCP tool server", long_about = None)]
pub struct Args {
    #[arg(
        long = "server-command",
        help = "Command used to launch the MCP tool server"
    )]
    pub server_command: Option<String>,

    #[arg(
        long = "server-arg",
        help = "Argument passed to the tool server command (repeatable)"
    )]
    pub server_args: Vec<String>,

    #[arg(short = 'm', long = "model", help = "Chat model identifier")]
    pub model: Option<String>,

    #[arg(
        long = "api-endpoint",
        help = "Custom API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(
        long = "max-rounds",
        help = "Maximum tool-call rounds per query before the query errors"
    )]
    pub max_rounds: Option<u32>,

    #[arg(
        long = "tool-timeout",
        help = "Per-tool-call timeout in seconds"
    )]
    pub tool_timeout: Option<u64>,

    #[arg(short = 'v', long = "verbose", help = "Print diagnostic output")]
    pub verbose: bool,
}
