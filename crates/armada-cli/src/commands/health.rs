//! `armada health` - probe every targeted cluster.

use armada_report::Renderer;

use crate::settings::Settings;

pub(crate) async fn run(settings: &Settings) -> anyhow::Result<bool> {
    let fleet = super::connect_fleet(settings).await?;
    let statuses = fleet.manager.health_check_detailed(&fleet.ctx).await;

    let renderer = Renderer::new(settings.output, settings.color);
    println!("{}", renderer.render_health(&statuses)?);

    let all_healthy = statuses.iter().all(|s| s.healthy);
    fleet.manager.close().await;
    Ok(fleet.connect_failures.is_empty() && all_healthy)
}
