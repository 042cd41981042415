use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;
use settle_core::{ConditionError, Node};
use tracing::{info, warn};

use crate::lifecycle::{LifecycleError, RunContext};
use crate::remote::{ExecOptions, ExecutionError, RemoteExecutor};

static INET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"inet (\d+\.\d+\.\d+\.\d+)/\d+").expect("valid regex"));

/// `10.8.128.100/21` -> `10.8.128.100`.
pub fn strip_vip_prefix(vip: &str) -> &str {
    vip.split('/').next().unwrap_or(vip)
}

/// IPv4 addresses from `ip -o addr show` output.
pub fn parse_ipv4_addrs(output: &str) -> Vec<String> {
    INET_RE
        .captures_iter(output)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Changes on every boot.
const BOOT_ID_COMMAND: &str = "cat /proc/sys/kernel/random/boot_id";

async fn boot_id(exec: &dyn RemoteExecutor, node: &Node) -> Result<String, ExecutionError> {
    let out = exec.exec(node, BOOT_ID_COMMAND, &ExecOptions::default()).await?;
    Ok(out.stdout.trim().to_string())
}

/// Reboot `node` and wait until it answers with a new boot id.
async fn reboot(
    ctx: RunContext,
    exec: Arc<dyn RemoteExecutor>,
    node: Node,
) -> Result<(), LifecycleError> {
    let before = boot_id(exec.as_ref(), &node).await?;
    info!(node = %node, boot_id = %before, "rebooting");
    match exec
        .exec(&node, "systemctl reboot", &ExecOptions::sudo().unchecked())
        .await
    {
        // The connection usually drops before ssh sees an exit status.
        Ok(_) | Err(ExecutionError::Connection { .. }) | Err(ExecutionError::Timeout { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    // The node can still answer for a moment after the reboot was issued.
    let poller = ctx.poller(format!("{node} back after reboot"))?;
    let before = before.as_str();
    poller
        .poll_until(|_| {
            let exec = exec.clone();
            let node = node.clone();
            async move {
                match boot_id(exec.as_ref(), &node).await {
                    Ok(current) if current != before => Ok(true),
                    Ok(_) => Err(ConditionError::transient(format!(
                        "{node} has not gone down yet"
                    ))),
                    Err(e) => Err(ConditionError::transient(e.to_string())),
                }
            }
        })
        .await?;
    Ok(())
}

async fn find_vip_holder(
    exec: &dyn RemoteExecutor,
    candidates: &[Node],
    vip: &str,
    holder: &Mutex<Option<Node>>,
) -> Result<bool, ConditionError> {
    let mut last_error = None;
    for node in candidates {
        match exec.exec(node, "ip -o addr show", &ExecOptions::default()).await {
            Ok(out) => {
                let addrs = parse_ipv4_addrs(&out.stdout);
                if addrs.iter().any(|a| a == vip) {
                    if let Ok(mut slot) = holder.lock() {
                        *slot = Some(node.clone());
                    }
                    return Ok(true);
                }
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }
    match last_error {
        Some(e) => Err(ConditionError::transient(e)),
        None => Err(ConditionError::transient(format!("{vip} not assigned yet"))),
    }
}

/// Reboot `failed` and check that another of `nodes` takes over `vip`.
///
/// Returns the node now holding the VIP. After a successful takeover this also waits for the
/// rebooted node to come back with a new boot id. When the takeover poll expires the error is
/// returned right away and the reboot is no longer waited for.
pub async fn validate_failover(
    ctx: &RunContext,
    exec: Arc<dyn RemoteExecutor>,
    nodes: &[Node],
    failed: &Node,
    vip: &str,
) -> Result<Node, LifecycleError> {
    let vip = strip_vip_prefix(vip);
    let candidates: Vec<Node> = nodes.iter().filter(|n| *n != failed).cloned().collect();

    let poller = ctx.poller(format!("failover of {vip}"))?;
    let reboot_task = tokio::spawn(reboot(ctx.clone(), exec.clone(), failed.clone()));

    let holder = Mutex::new(None);
    let takeover = poller
        .poll_until(|_| find_vip_holder(exec.as_ref(), &candidates, vip, &holder))
        .await;
    if let Err(err) = takeover {
        reboot_task.abort();
        warn!(vip, node = %failed, "takeover failed, not waiting for the reboot");
        return Err(err.into());
    }

    match reboot_task.await {
        Ok(result) => result?,
        Err(e) => {
            return Err(LifecycleError::Reboot {
                node: failed.name.clone(),
                message: e.to_string(),
            })
        }
    }

    let holder = holder.into_inner().ok().flatten();
    match holder {
        Some(node) => {
            info!(vip, node = %node, "vip moved");
            Ok(node)
        }
        None => {
            warn!(vip, "takeover reported without a holder");
            Err(LifecycleError::Reboot {
                node: failed.name.clone(),
                message: format!("{vip} holder unknown"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip_addr_output() {
        let out = "1: lo    inet 127.0.0.1/8 scope host lo\n\
                   2: eth0    inet 10.8.128.21/21 brd 10.8.135.255 scope global eth0\n\
                   2: eth0    inet 10.8.128.100/21 scope global secondary eth0\n\
                   2: eth0    inet6 fe80::1/64 scope link\n";
        assert_eq!(
            parse_ipv4_addrs(out),
            vec!["127.0.0.1", "10.8.128.21", "10.8.128.100"]
        );
    }

    #[test]
    fn vip_prefix_is_dropped() {
        assert_eq!(strip_vip_prefix("10.8.128.100/21"), "10.8.128.100");
        assert_eq!(strip_vip_prefix("10.8.128.100"), "10.8.128.100");
    }
}
