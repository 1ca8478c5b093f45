//! Kubectl wrapper utilities

use anyhow::{Context, Result, anyhow};
use std::process::Command;

/// Run a kubectl command against a minikube profile context
pub fn run_kubectl(args: &[&str], context: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("kubectl");

    if let Some(ctx) = context {
        cmd.args(["--context", ctx]);
    }

    cmd.args(args);

    let status = cmd.status().context("Failed to run kubectl command")?;

    if !status.success() {
        return Err(anyhow!("kubectl command failed: {}", args.join(" ")));
    }

    Ok(())
}

/// Run kubectl and capture output
pub fn run_kubectl_output(args: &[&str], context: Option<&str>) -> Result<String> {
    let mut cmd = Command::new("kubectl");

    if let Some(ctx) = context {
        cmd.args(["--context", ctx]);
    }

    cmd.args(args);

    let output = cmd.output().context("Failed to run kubectl command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "kubectl command failed: {}\n{}",
            args.join(" "),
            stderr
        ));
    }

    Ok(String::from_utf8(output.stdout)?)
}

/// Probe node readiness via `kubectl get nodes`
pub fn nodes_ready(context: Option<&str>) -> Result<bool> {
    let output = run_kubectl_output(&["get", "nodes", "--no-headers"], context)?;
    Ok(parse_nodes_ready(&output))
}

/// Get the node table for status display
pub fn get_nodes_wide(context: Option<&str>) -> Result<String> {
    run_kubectl_output(&["get", "nodes", "-o", "wide"], context)
}

/// Parse `kubectl get nodes --no-headers` output: ready iff at least one
/// node is listed and every node's status field is exactly "Ready"
/// (a "NotReady" or "Ready,SchedulingDisabled" node does not count).
fn parse_nodes_ready(output: &str) -> bool {
    let mut saw_node = false;

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let name = fields.next();
        let status = fields.next();

        match (name, status) {
            (Some(_), Some(status)) => {
                saw_node = true;
                if status != "Ready" {
                    return false;
                }
            }
            _ => continue,
        }
    }

    saw_node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_ready_node() {
        let output = "minikube   Ready   control-plane   2m   v1.31.0\n";
        assert!(parse_nodes_ready(output));
    }

    #[test]
    fn test_parse_not_ready_node() {
        let output = "minikube   NotReady   control-plane   10s   v1.31.0\n";
        assert!(!parse_nodes_ready(output));
    }

    #[test]
    fn test_parse_mixed_nodes() {
        let output = "\
minikube       Ready      control-plane   2m   v1.31.0
minikube-m02   NotReady   <none>          5s   v1.31.0
";
        assert!(!parse_nodes_ready(output));
    }

    #[test]
    fn test_parse_all_ready_multi_node() {
        let output = "\
minikube       Ready   control-plane   5m   v1.31.0
minikube-m02   Ready   <none>          4m   v1.31.0
minikube-m03   Ready   <none>          3m   v1.31.0
";
        assert!(parse_nodes_ready(output));
    }

    #[test]
    fn test_parse_cordoned_node_not_ready() {
        let output = "minikube   Ready,SchedulingDisabled   control-plane   2m   v1.31.0\n";
        assert!(!parse_nodes_ready(output));
    }

    #[test]
    fn test_parse_empty_output_not_ready() {
        assert!(!parse_nodes_ready(""));
        assert!(!parse_nodes_ready("\n"));
    }
}
