mod config;
mod generate_cmd;
mod plan_cmds;
mod prompt_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use sage_db::pool;

use config::SageConfig;

#[derive(Parser)]
#[command(name = "sage", about = "Guarded LLM study-plan generator")]
struct Cli {
    /// Database URL (overrides SAGE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a sage config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/sage")]
        db_url: String,
        /// Gemini API key to store in the config file
        #[arg(long)]
        gemini_api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the sage database (requires config file or env vars)
    DbInit,
    /// Run the HTTP service
    Serve {
        /// Listen address (overrides SAGE_BIND and the config file)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Generate a study plan from a request
    Generate {
        /// The request text (omit to read from --file)
        input: Option<String>,
        /// Read the request text from a file
        #[arg(long)]
        file: Option<String>,
        /// Preferred study hours per day (e.g. "2-3")
        #[arg(long)]
        hours: Option<String>,
        /// Comma-separated available days (e.g. "Monday,Wednesday,Friday")
        #[arg(long)]
        days: Option<String>,
        /// Write a locally rendered HTML page to this path
        #[arg(long)]
        html: Option<String>,
        /// Write a model-styled HTML page to this path (costs an extra model call)
        #[arg(long)]
        styled_html: Option<String>,
    },
    /// Stored plan management
    Plans {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Prompt template management
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List stored plans, newest first
    List {
        /// Owner whose plans to list
        #[arg(long, default_value = serve_cmd::DEFAULT_OWNER)]
        owner: String,
        /// Maximum number of plans to show
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Show a stored plan with its feedback
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// Delete a stored plan
    Delete {
        /// Plan ID to delete
        plan_id: String,
    },
}

#[derive(Subcommand)]
pub enum PromptCommands {
    /// Print the template a stage currently resolves to, as TOML
    Show {
        /// Stage name: classify, plan, render, judge or refine
        stage: String,
        /// Pin a specific template version instead of latest
        #[arg(long)]
        version: Option<String>,
    },
    /// Publish a template file as the stage's new version
    Push {
        /// Stage name: classify, plan, render, judge or refine
        stage: String,
        /// Path to a TOML file with `system` and `user` keys
        #[arg(long)]
        file: String,
    },
}

/// Execute the `sage init` command: write config file.
fn cmd_init(db_url: &str, gemini_api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path()?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        gemini: config::GeminiSection {
            api_key: gemini_api_key.map(str::to_string),
            ..Default::default()
        },
        hub: config::HubSection::default(),
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
        },
        server: config::ServerSection {
            bind: Some(config::DEFAULT_BIND.to_string()),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    match gemini_api_key {
        Some(_) => println!("  gemini.api_key = (set)"),
        None => println!("  gemini.api_key = (not set; edit the file or export SAGE_GEMINI_API_KEY)"),
    }
    println!("  server.bind = {}", config::DEFAULT_BIND);
    println!();
    println!("Next: run `sage db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `sage db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = SageConfig::resolve(cli_db_url)?;

    println!("Initializing sage database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("sage db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            gemini_api_key,
            force,
        } => {
            cmd_init(&db_url, gemini_api_key.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind } => {
            let resolved = SageConfig::resolve(cli.database_url.as_deref())?;
            serve_cmd::run_serve(&resolved, bind.as_deref()).await?;
        }
        Commands::Generate {
            input,
            file,
            hours,
            days,
            html,
            styled_html,
        } => {
            let resolved = SageConfig::resolve(cli.database_url.as_deref())?;
            generate_cmd::run_generate(
                &resolved,
                input.as_deref(),
                file.as_deref(),
                hours.as_deref(),
                days.as_deref(),
                html.as_deref(),
                styled_html.as_deref(),
            )
            .await?;
        }
        Commands::Plans { command } => {
            let resolved = SageConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Prompt { command } => {
            let resolved = SageConfig::resolve(cli.database_url.as_deref())?;
            prompt_cmds::run_prompt_command(command, &resolved).await?;
        }
    }

    Ok(())
}
