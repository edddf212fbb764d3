/// Marker the model is asked to put in front of a runnable command
pub const COMMAND_MARKER: char = '$';

/// Find the first `$ <command>` line in a model reply.
///
/// Lines are trimmed before matching. Only the `$` marker is stripped and the
/// rest is trimmed, so `$ whoami` and `$whoami` both give `whoami`. A bare `$`
/// carries no command and is skipped, so scanning moves on to the next line.
pub fn extract_command(text: &str) -> Option<String> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix(COMMAND_MARKER))
        .map(str::trim)
        .find(|command| !command.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_command_between_prose() {
        let reply = "Sure, try:\n$ ls -la\nThat lists files.";
        assert_eq!(extract_command(reply), Some("ls -la".to_string()));
    }

    #[test]
    fn test_first_command_wins() {
        let reply = "Two options:\n$ df -h\n$ du -sh *";
        assert_eq!(extract_command(reply), Some("df -h".to_string()));
    }

    #[test]
    fn test_indented_marker_and_trailing_whitespace() {
        let reply = "Run this:\n    $ ps aux | grep nginx   \n";
        assert_eq!(extract_command(reply), Some("ps aux | grep nginx".to_string()));
    }

    #[test]
    fn test_no_command() {
        assert_eq!(extract_command("`ls` - lists directory contents"), None);
        assert_eq!(extract_command(""), None);
        assert_eq!(extract_command("costs $5 per month"), None);
    }

    #[test]
    fn test_bare_marker_is_not_a_command() {
        assert_eq!(extract_command("$"), None);
        assert_eq!(extract_command("$   \nnothing else"), None);
        assert_eq!(extract_command("$\n$ uptime"), Some("uptime".to_string()));
    }

    #[test]
    fn test_marker_without_space() {
        assert_eq!(extract_command("$whoami"), Some("whoami".to_string()));
    }

    #[test]
    fn test_windows_line_endings() {
        assert_eq!(
            extract_command("Try:\r\n$ ipconfig /all\r\nDone."),
            Some("ipconfig /all".to_string())
        );
    }
}
