use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use charter_dash::{Dashboard, DashboardConfig, SchoolId, ViewId, ViewRequest};
use log::info;

/// Environment variable naming a TOML configuration file
const CONFIG_ENV: &str = "CHARTER_DASH_CONFIG";

const USAGE: &str = "usage: charter-dash <school_id> <view> [year]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (school, view, year) = match args.as_slice() {
        [school, view] => (school, view, None),
        [school, view, year] => (school, view, Some(year)),
        _ => bail!("{USAGE}\nviews: {}", ViewId::ALL.map(ViewId::slug).join(", ")),
    };
    let school: SchoolId = school.parse().with_context(|| format!("invalid school id '{school}'"))?;
    let view: ViewId = view.parse()?;
    let year = year
        .map(|y| y.parse::<u16>().with_context(|| format!("invalid year '{y}'")))
        .transpose()?;

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            DashboardConfig::load(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => DashboardConfig::from_env()?,
    };
    info!("Configuration: {config}");

    let start = Instant::now();
    let dashboard = Dashboard::open_async(config)
        .await
        .context("failed to load the data snapshot")?;
    info!("Snapshot loaded in {:?}", start.elapsed());

    let mut request = ViewRequest::new(school, view);
    if let Some(year) = year {
        request = request.with_year(year);
    }
    let model = dashboard.build(&request)?;
    println!("{}", model.to_json()?);
    Ok(())
}
