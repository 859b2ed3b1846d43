use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use shellkeep_terminal::{SessionConfig, SessionManager, SessionState, SharedSessionManager};
use shellkeep_toolcore::{Tool, ToolContext, ToolParameters, ToolRegistry};
use shellkeep_tools::{register_shell_tools, BashTool, Project, SHELL_CATEGORY};
use tempfile::TempDir;

fn bash_available() -> bool {
    let found = Path::new("/bin/bash").exists();
    if !found {
        eprintln!("skipping: /bin/bash not available");
    }
    found
}

fn shared_manager(command_timeout: Duration) -> SharedSessionManager {
    let config = SessionConfig::new()
        .with_command_timeout(command_timeout)
        .with_prompt_timeout(Duration::from_secs(10));
    SessionManager::new(config).into_shared()
}

fn canonical(path: &str) -> std::path::PathBuf {
    std::fs::canonicalize(path).unwrap()
}

fn fenced_body(text: &str) -> &str {
    text.strip_prefix("```\n")
        .and_then(|rest| rest.strip_suffix("\n```"))
        .unwrap_or_else(|| panic!("not a fenced block: {text:?}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_output_is_fenced() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    assert_eq!(tool.run("echo hello", false).await, "```\nhello\n```");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_call_starts_in_project_root() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    let text = tool.run("pwd", false).await;
    assert_eq!(canonical(fenced_body(&text)), canonical(root.path().to_str().unwrap()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_directory_persists_until_reset_cwd() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    tool.run("mkdir -p sub && cd sub", false).await;
    let inside = tool.run("pwd", false).await;
    assert_eq!(
        canonical(fenced_body(&inside)),
        canonical(root.path().join("sub").to_str().unwrap())
    );

    let back = tool.run("pwd", true).await;
    assert_eq!(canonical(fenced_body(&back)), canonical(root.path().to_str().unwrap()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_is_reported_and_reset_recovers() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_millis(500)),
        Project::new(root.path()).unwrap(),
    );

    let text = tool.run("sleep 5", false).await;
    assert!(text.starts_with("Error: command timed out"), "{text}");

    assert_eq!(tool.run("echo ok", true).await, "```\nok\n```");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exited_shell_is_replaced_on_next_call() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let manager = shared_manager(Duration::from_secs(10));
    let tool = BashTool::new(Arc::clone(&manager), Project::new(root.path()).unwrap());

    let text = tool.run("exit", false).await;
    assert!(text.starts_with("Error: "), "{text}");
    assert_eq!(manager.lock().await.state(), SessionState::Closed);

    assert_eq!(tool.run("echo again", false).await, "```\nagain\n```");
    assert_eq!(manager.lock().await.state(), SessionState::Ready);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_working_directory_and_reset() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    tool.run("cd /", false).await;
    assert_eq!(tool.working_directory().await.unwrap(), Path::new("/"));

    tool.reset().await.unwrap();
    let dir = tool.working_directory().await.unwrap();
    assert_eq!(std::fs::canonicalize(dir).unwrap(), canonical(root.path().to_str().unwrap()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_registry_dispatch() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    register_shell_tools(
        &mut registry,
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    assert_eq!(registry.get_tools_by_category(SHELL_CATEGORY).len(), 1);

    let context = ToolContext::new(root.path().to_path_buf(), "registry".to_string());
    let params = ToolParameters::from_json(r#"{"command": "echo from-registry"}"#).unwrap();
    let result = registry.execute_tool("bash", params, &context).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.content, "```\nfrom-registry\n```");

    let params = ToolParameters::new().set("command", "exit 4");
    let result = registry.execute_tool("bash", params, &context).await;
    assert!(!result.success);
    assert!(result.text().starts_with("Error: "));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_caller_directory_does_not_move_the_shell() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let tool = BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    );

    let context = ToolContext::new(elsewhere.path().to_path_buf(), "caller".to_string());
    let params = ToolParameters::new().set("command", "pwd");
    let result = tool.execute(params, &context).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        canonical(fenced_body(&result.content)),
        canonical(root.path().to_str().unwrap())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_calls_are_serialized() {
    if !bash_available() {
        return;
    }
    let root = TempDir::new().unwrap();
    let tool = Arc::new(BashTool::new(
        shared_manager(Duration::from_secs(10)),
        Project::new(root.path()).unwrap(),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let tool = Arc::clone(&tool);
        handles.push(tokio::spawn(async move {
            let text = tool.run(&format!("echo call-{i}"), false).await;
            (i, text)
        }));
    }

    for handle in handles {
        let (i, text) = handle.await.unwrap();
        assert_eq!(text, format!("```\ncall-{i}\n```"));
    }
}
