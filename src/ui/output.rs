use colored::*;

const ARGS_PREVIEW_CHARS: usize = 100;
const RESULT_PREVIEW_CHARS: usize = 400;

/// Char-based truncation; tool arguments and results routinely carry
/// non-ASCII text, so byte slicing is not safe here.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

/// Announce a tool call before it runs.
pub fn display_tool_call(name: &str, arguments: &str) {
    println!(
        "{}",
        format!(
            "Calling tool {} with args {}",
            name,
            preview(arguments, ARGS_PREVIEW_CHARS)
        )
        .cyan()
    );
}

/// Display a tool result, truncated for the terminal. The conversation
/// keeps the full text; only the display is shortened.
pub fn display_tool_result(name: &str, result: &str) {
    println!("{}", format!("[{}]", name).cyan().bold());
    println!("{}", preview(result, RESULT_PREVIEW_CHARS).dimmed());
}

pub fn display_tool_error(name: &str, error: &str) {
    println!("{}", format!("[{}]", name).red().bold());
    println!("{}", error.red());
}

pub fn display_content(content: &str) {
    println!("{}", content);
}
