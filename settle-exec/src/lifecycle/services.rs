use settle_core::{ConditionError, ServiceStatus, Settled};

use crate::cluster::{ClusterControl, ClusterError};
use crate::lifecycle::{LifecycleError, RunContext};

/// Probe failures from the transport are worth another attempt; garbled output is not.
pub(crate) fn probe_error(err: ClusterError) -> ConditionError {
    match err {
        ClusterError::Exec(e) => ConditionError::transient(e.to_string()),
        e @ ClusterError::Decode { .. } => ConditionError::unexpected(e.to_string()),
    }
}

/// The `orch ls` rows a wait is about.
#[derive(Debug, Clone, Copy)]
enum Selector<'a> {
    /// Every service of one type.
    Type(&'a str),
    /// Exactly these services, whatever their type.
    Names(&'a [String]),
}

impl Selector<'_> {
    async fn list(&self, ctl: &dyn ClusterControl) -> Result<Vec<ServiceStatus>, ConditionError> {
        match self {
            Self::Type(ty) => ctl.orch_ls(Some(*ty)).await.map_err(probe_error),
            Self::Names(names) => {
                let services = ctl.orch_ls(None).await.map_err(probe_error)?;
                Ok(services
                    .into_iter()
                    .filter(|s| names.contains(&s.service_name))
                    .collect())
            }
        }
    }

    /// Expected services the orchestrator does not report yet.
    fn missing(&self, services: &[ServiceStatus]) -> Vec<String> {
        match self {
            Self::Type(ty) if services.is_empty() => vec![format!("no {ty} services reported")],
            Self::Type(_) => Vec::new(),
            Self::Names(names) => names
                .iter()
                .filter(|n| !services.iter().any(|s| &s.service_name == *n))
                .map(|n| format!("{n} not reported"))
                .collect(),
        }
    }
}

fn pending(services: &[ServiceStatus], settled: impl Fn(&ServiceStatus) -> bool) -> Vec<String> {
    services
        .iter()
        .filter(|s| !settled(s))
        .map(ServiceStatus::summary)
        .collect()
}

async fn services_ready(
    ctl: &dyn ClusterControl,
    selector: Selector<'_>,
) -> Result<bool, ConditionError> {
    let services = selector.list(ctl).await?;
    let mut waiting = selector.missing(&services);
    waiting.extend(pending(&services, ServiceStatus::is_converged));
    if waiting.is_empty() {
        Ok(true)
    } else {
        Err(ConditionError::transient(waiting.join(", ")))
    }
}

async fn services_absent(
    ctl: &dyn ClusterControl,
    selector: Selector<'_>,
) -> Result<bool, ConditionError> {
    let services = selector.list(ctl).await?;
    let running = pending(&services, ServiceStatus::is_stopped);
    if running.is_empty() {
        Ok(true)
    } else {
        Err(ConditionError::transient(running.join(", ")))
    }
}

async fn wait_ready(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    label: String,
    selector: Selector<'_>,
) -> Result<Settled, LifecycleError> {
    let poller = ctx.poller(label)?;
    Ok(poller.poll_until(|_| services_ready(ctl, selector)).await?)
}

async fn wait_absent(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    label: String,
    selector: Selector<'_>,
) -> Result<Settled, LifecycleError> {
    let poller = ctx.poller(label)?;
    Ok(poller.poll_until(|_| services_absent(ctl, selector)).await?)
}

/// Wait until at least one `service_type` service exists and all of them run at full size.
pub async fn wait_for_services_ready(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    service_type: &str,
) -> Result<Settled, LifecycleError> {
    let label = format!("{service_type} services ready");
    wait_ready(ctx, ctl, label, Selector::Type(service_type)).await
}

/// Wait until no `service_type` service has a running daemon.
pub async fn wait_for_services_absent(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    service_type: &str,
) -> Result<Settled, LifecycleError> {
    let label = format!("{service_type} services absent");
    wait_absent(ctx, ctl, label, Selector::Type(service_type)).await
}

/// Wait until every service in `names` is reported and runs at full size.
///
/// Other services are ignored. Expiry is reported under `label`.
pub async fn wait_for_named_services_ready(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    label: impl Into<String>,
    names: &[String],
) -> Result<Settled, LifecycleError> {
    wait_ready(ctx, ctl, label.into(), Selector::Names(names)).await
}

/// Wait until none of the services in `names` has a running daemon.
pub async fn wait_for_named_services_absent(
    ctx: &RunContext,
    ctl: &dyn ClusterControl,
    label: impl Into<String>,
    names: &[String],
) -> Result<Settled, LifecycleError> {
    wait_absent(ctx, ctl, label.into(), Selector::Names(names)).await
}
