//! `armada contexts` - list the contexts known to the kubeconfig.

use armada_report::{OutputFormat, Renderer};
use armada_session::ContextResolver;

use crate::settings::Settings;
use crate::theme::Theme;

pub(crate) async fn run(settings: &Settings) -> anyhow::Result<bool> {
    let resolver = super::build_resolver(settings)?;
    let contexts = resolver.list_contexts().await?;
    let current = resolver.current_context().await.ok();

    let renderer = Renderer::new(settings.output, settings.color);
    println!("{}", renderer.render_contexts(&contexts, current.as_deref())?);

    if current.is_none() && settings.output == OutputFormat::Table {
        eprintln!("{}", Theme::dimmed("no current context is set"));
    }
    Ok(true)
}
