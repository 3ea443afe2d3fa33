mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use nimbus_core::{AppError, Config, WeatherError};
use nimbus_ui::render::{render_city_list, render_details, render_home, render_suggestions};
use nimbus_ui::{AppServices, CityDetailsModel, HomeModel, NavigationHistory};

/// Extra time on top of the refresh timeout before the CLI stops waiting
const WAIT_MARGIN: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    let cli = Cli::parse();

    nimbus_core::init()?;

    let config = load_config(&cli)?;
    let services = Arc::new(
        AppServices::from_config(&config).map_err(|e| user_facing(&e))?,
    );

    tracing::info!("Nimbus started");

    let command = cli.command.unwrap_or(Commands::Home);
    let result = run(command, &services, &config);

    // Graceful shutdown
    services.shutdown();

    result.map_err(|e| user_facing(&e))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let Some(path) = &cli.config else {
        let (config, _) = Config::load_validated()?;
        return Ok(config);
    };

    let config = Config::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    let validation = config.validate();
    if !validation.is_valid() {
        anyhow::bail!(
            "Configuration validation failed: {}",
            validation.error_summary()
        );
    }
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    Ok(config)
}

fn run(command: Commands, services: &Arc<AppServices>, config: &Config) -> Result<(), AppError> {
    let state = services.state();

    match command {
        Commands::Home => {
            let navigator = Arc::new(NavigationHistory::new());
            let mut home = HomeModel::new(services.clone(), navigator);

            home.on_mount();
            let wait = Duration::from_secs(config.weather.refresh_timeout_secs) + WAIT_MARGIN;
            home.wait_for_refresh(wait);

            print!("{}", render_home(&home.view()));
        }
        Commands::List => {
            print!(
                "{}",
                render_city_list(&state.cities(), state.last_update().as_deref())
            );
        }
        Commands::Search { query, limit } => {
            let results = services.search_cities(&query, limit)?;
            print!("{}", render_suggestions(&results));
        }
        Commands::Add { query, pick } => {
            let results = services.search_cities(&query, pick.max(1))?;
            let choice = pick
                .checked_sub(1)
                .and_then(|i| results.into_iter().nth(i))
                .ok_or_else(|| AppError::Weather(WeatherError::CityNotFound(query.clone())))?;

            let city = choice.into_city();
            let name = city.display_name();
            let id = city.id.clone();
            state.add_city(city)?;

            println!("Added {} (#{})", name, id);
        }
        Commands::Remove { id } => match state.remove_city(&id)? {
            Some(city) => println!("Removed {}", city.display_name()),
            None => return Err(AppError::Weather(WeatherError::CityNotFound(id))),
        },
        Commands::Show { id } => {
            if !state.select_city_by_id(&id) {
                return Err(AppError::Weather(WeatherError::CityNotFound(id)));
            }
            if let Some(view) = CityDetailsModel::new(state).view() {
                print!("{}", render_details(&view));
            }
        }
    }

    Ok(())
}

/// Log the full error and hand the user the friendly message
fn user_facing(e: &AppError) -> anyhow::Error {
    tracing::error!("{}", e);
    anyhow::anyhow!("{}", e.user_message())
}
