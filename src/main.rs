use clap::Parser;
use colored::*;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::process;

use paperchat::api::HttpBackend;
use paperchat::cli::Args;
use paperchat::config::Config;
use paperchat::error::{PaperChatError, Result};
use paperchat::mcp::{McpClient, ToolRegistry};
use paperchat::orchestrator::{run_query, ChatSettings};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    // A failure to reach or initialize the tool server is fatal; every
    // other error stays inside the chat loop.
    let client = match McpClient::connect(
        &config.server_command,
        &config.server_args,
        HashMap::new(),
        config.tool_timeout,
        config.verbose,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    let result = chat_loop(&client, &config).await;

    // Teardown runs on every exit path, success or not.
    client.shutdown().await;

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}

async fn chat_loop(client: &McpClient, config: &Config) -> Result<()> {
    let backend = HttpBackend::new(&config.api_key, &config.api_endpoint, &config.model)?;
    let registry = ToolRegistry::discover(client).await?;

    let info = client.server_info();
    println!(
        "Connected to {} v{} with tools: {}",
        info.name.bold(),
        info.version,
        registry.tool_names().join(", ")
    );
    if registry.is_empty() {
        println!(
            "{}",
            "Server exposes no tools; continuing as a plain chatbot.".yellow()
        );
    }
    println!("Type your queries or 'quit' to exit.");

    let date_prompt = format!("Today's date is {}.", Config::current_date());
    let system_prompt = match &config.system_prompt {
        Some(prompt) => format!("{}\n\n{}", date_prompt, prompt),
        None => date_prompt,
    };

    let settings = ChatSettings {
        system_prompt: Some(system_prompt),
        max_rounds: config.max_rounds,
        verbose: config.verbose,
    };

    let stdin = io::stdin();
    loop {
        print!("\n{} ", "query>".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        // Ctrl-C during a query abandons that query's conversation
        // wholesale and returns to the prompt.
        let result = tokio::select! {
            res = run_query(&backend, client, &registry, &settings, query) => res,
            _ = tokio::signal::ctrl_c() => Err(PaperChatError::Cancelled),
        };

        if let Err(e) = result {
            eprintln!("{} {}", "Error:".red(), e);
        }
    }

    Ok(())
}
