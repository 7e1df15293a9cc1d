//! Optional git commit recording what a deploy changed.
//!
//! Never fatal: the deploy is already published when this runs.

use std::path::Path;
use std::process::Command;

/// `DEPLOY: <message>` followed by the touched paths.
pub fn commit_message(user_message: &str, files: &[&str]) -> String {
    let mut message = format!("DEPLOY: {user_message}");
    if !files.is_empty() {
        message.push_str("\n\nFiles:\n");
        let list: Vec<String> = files.iter().map(|f| format!("- {f}")).collect();
        message.push_str(&list.join("\n"));
    }
    message
}

/// Stage everything under `repo_root` and commit with [`commit_message`].
///
/// An empty `user_message` skips the commit entirely.
pub fn maybe_commit(user_message: &str, files: &[&str], repo_root: &Path) {
    if user_message.trim().is_empty() {
        return;
    }

    let add = Command::new("git")
        .args(["add", "-A"])
        .current_dir(repo_root)
        .status();
    if let Err(e) = add {
        println!("Git not available; skipping commit ({e}).");
        return;
    }

    let result = Command::new("git")
        .args(["commit", "--allow-empty", "-m"])
        .arg(commit_message(user_message.trim(), files))
        .current_dir(repo_root)
        .output();

    match result {
        Ok(output) if output.status.success() => {
            println!("{}", String::from_utf8_lossy(&output.stdout).trim());
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let reason = if stderr.trim().is_empty() { stdout } else { stderr };
            println!("Commit skipped: {}", reason.trim());
        }
        Err(e) => println!("Git not available; skipping commit ({e})."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_files() {
        let msg = commit_message("new landing page", &["index.html", "old.css"]);
        assert_eq!(
            msg,
            "DEPLOY: new landing page\n\nFiles:\n- index.html\n- old.css"
        );
    }

    #[test]
    fn message_without_files_is_single_line() {
        assert_eq!(commit_message("noop", &[]), "DEPLOY: noop");
    }

    #[test]
    fn blank_message_skips_git() {
        // Would fail loudly if git ran against a non-existent directory.
        maybe_commit("   ", &["a.txt"], Path::new("/definitely/not/a/repo"));
    }
}
