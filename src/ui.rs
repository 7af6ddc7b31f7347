use colored::Colorize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message to stderr, alongside errors
pub fn hint(msg: &str) {
    eprintln!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Pluralize a count: `plural(1, "step")` is "1 step"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Print the hoist banner
pub fn banner() {
    println!(
        "{}",
        r"
  ██╗  ██╗ ██████╗ ██╗███████╗████████╗
  ██║  ██║██╔═══██╗██║██╔════╝╚══██╔══╝
  ███████║██║   ██║██║███████╗   ██║
  ██╔══██║██║   ██║██║╚════██║   ██║
  ██║  ██║╚██████╔╝██║███████║   ██║
  ╚═╝  ╚═╝ ╚═════╝ ╚═╝╚══════╝   ╚═╝
"
        .cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0, "change"), "0 changes");
        assert_eq!(plural(1, "change"), "1 change");
        assert_eq!(plural(8, "step"), "8 steps");
    }
}
