//! anidex - anime catalog browsing CLI.

/// Application configuration (TOML).
mod config;

use std::io;
use std::path::PathBuf;

use anidex_api::jikan::{
    AggregateResolver, Anime, DEFAULT_MIN_GENRE_COUNT, JikanClient, LocalCatalogApi,
    PaginatedResult, Progress, TopFilter, popular_genres,
};
use anidex_api::session::{Credentials, ListKind, LocalSessionApi, RegisterRequest, SessionClient};
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// Default User-Agent sent to both backends.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse the Jikan anime catalog.
    Catalog(CatalogCommand),
    /// Account and personal lists.
    Session(SessionCommand),
    /// Manage the config file.
    Config(ConfigCommand),
    /// Print shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `catalog` subcommand.
#[derive(clap::Args)]
struct CatalogCommand {
    /// Catalog subcommand to run.
    #[command(subcommand)]
    command: CatalogSubcommands,
}

/// Available catalog subcommands.
#[derive(Subcommand)]
enum CatalogSubcommands {
    /// Top 10 list.
    Top(TopArgs),
    /// Search titles by text.
    Search(SearchArgs),
    /// Show one title.
    Details(IdArgs),
    /// Show the cast of a title.
    Characters(IdArgs),
    /// Show recommendations for a title.
    Recommendations(IdArgs),
    /// Top movies.
    Movies(PageArgs),
    /// Top TV series.
    Series(PageArgs),
    /// List genres.
    Genres(GenresArgs),
    /// Best scored titles of a genre.
    Genre(GenreArgs),
    /// Resolve several titles by id, one at a time.
    Resolve(ResolveArgs),
}

/// `filter` values for `catalog top`.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum TopFilterArg {
    /// Currently airing.
    #[default]
    Airing,
    /// Not yet aired.
    Upcoming,
    /// Most popular.
    Bypopularity,
    /// Most favorited.
    Favorite,
}

impl From<TopFilterArg> for TopFilter {
    fn from(arg: TopFilterArg) -> Self {
        match arg {
            TopFilterArg::Airing => Self::Airing,
            TopFilterArg::Upcoming => Self::Upcoming,
            TopFilterArg::Bypopularity => Self::ByPopularity,
            TopFilterArg::Favorite => Self::Favorite,
        }
    }
}

/// Arguments for the `catalog top` subcommand.
#[derive(clap::Args)]
struct TopArgs {
    /// Ranking to show.
    #[arg(long, value_enum, default_value_t)]
    filter: TopFilterArg,
}

/// Arguments for the `catalog search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "frieren").
    #[arg(long, required = true)]
    query: String,
    /// Page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for single-title subcommands.
#[derive(clap::Args)]
struct IdArgs {
    /// `MyAnimeList` ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for paginated listings.
#[derive(clap::Args)]
struct PageArgs {
    /// Page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `catalog genres` subcommand.
#[derive(clap::Args)]
struct GenresArgs {
    /// Hide genres with at most this many titles.
    #[arg(long, default_value_t = DEFAULT_MIN_GENRE_COUNT)]
    min_count: u64,
    /// Show every genre in API order.
    #[arg(long)]
    all: bool,
}

/// Arguments for the `catalog genre` subcommand.
#[derive(clap::Args)]
struct GenreArgs {
    /// Genre ID (see `catalog genres`).
    #[arg(long, required = true)]
    id: u64,
    /// Page number.
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `catalog resolve` subcommand.
#[derive(clap::Args)]
struct ResolveArgs {
    /// Comma-separated title IDs (e.g. "52991,5114").
    #[arg(long, required = true, value_delimiter = ',')]
    ids: Vec<String>,
}

/// Arguments for the `session` subcommand.
#[derive(clap::Args)]
struct SessionCommand {
    /// Bearer token for protected calls.
    #[arg(long, global = true, env = "ANIDEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Session subcommand to run.
    #[command(subcommand)]
    command: SessionSubcommands,
}

/// Available session subcommands.
#[derive(Subcommand)]
enum SessionSubcommands {
    /// Create an account.
    Register(RegisterArgs),
    /// Log in and print a token.
    Login(LoginArgs),
    /// Show the current profile.
    Me,
    /// Add or remove a title from a list.
    Toggle(ToggleArgs),
    /// Show the titles of a list.
    List(ListArgs),
}

/// Arguments for the `session register` subcommand.
#[derive(clap::Args)]
struct RegisterArgs {
    /// Display name.
    #[arg(long, required = true)]
    username: String,
    /// Login email.
    #[arg(long, required = true)]
    email: String,
    /// Password.
    #[arg(long, required = true)]
    password: String,
}

/// Arguments for the `session login` subcommand.
#[derive(clap::Args)]
struct LoginArgs {
    /// Login email.
    #[arg(long, required = true)]
    email: String,
    /// Password.
    #[arg(long, required = true)]
    password: String,
}

/// Arguments for the `session toggle` subcommand.
#[derive(clap::Args)]
struct ToggleArgs {
    /// List to change (watchlist, favorites, bookmarks).
    #[arg(long, required = true)]
    list: ListKind,
    /// Title ID.
    #[arg(long, required = true)]
    id: String,
}

/// Arguments for the `session list` subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// List to show (watchlist, favorites, bookmarks).
    #[arg(long, required = true)]
    list: ListKind,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write a config file with default pacing values.
    Init(InitArgs),
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Loads the config file for `dir`.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds the catalog client from config.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid or the client fails to build.
fn build_catalog_client(config: &AppConfig) -> Result<JikanClient> {
    let catalog = &config.catalog;
    let mut builder = JikanClient::builder()
        .user_agent(catalog.user_agent.as_deref().unwrap_or(USER_AGENT))
        .spacing(catalog.spacing());
    if let Some(url) = &catalog.base_url {
        builder = builder.base_url(url.parse().context("invalid catalog.base_url")?);
    }
    if let Some(depth) = catalog.max_queue_depth {
        builder = builder.max_queue_depth(depth);
    }
    builder.build().context("failed to build catalog client")
}

/// Builds the session client from config.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid or the client fails to build.
fn build_session_client(config: &AppConfig) -> Result<SessionClient> {
    let mut builder = SessionClient::builder().user_agent(USER_AGENT);
    if let Some(url) = &config.session.base_url {
        builder = builder.base_url(url.parse().context("invalid session.base_url")?);
    }
    builder.build().context("failed to build session client")
}

/// Returns the token or explains how to pass one.
fn require_token(token: Option<&str>) -> Result<&str> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => bail!("no token given: pass --token or set ANIDEX_TOKEN (see `session login`)"),
    }
}

fn log_progress(progress: Progress) {
    tracing::info!(
        "Resolving: {}/{} ({}%)",
        progress.completed,
        progress.total,
        progress.percent()
    );
}

fn log_anime_table(items: &[Anime]) {
    tracing::info!("ID\tScore\tType\tEpisodes\tTitle");
    for anime in items {
        tracing::info!(
            "{}\t{}\t{}\t{}\t\t{}",
            anime.mal_id,
            anime
                .score
                .map_or_else(|| String::from("-"), |s| format!("{s:.2}")),
            anime.media_type.as_deref().unwrap_or("-"),
            anime
                .episodes
                .map_or_else(|| String::from("-"), |e| e.to_string()),
            anime.display_title(),
        );
    }
}

fn log_anime_page(page: &PaginatedResult<Anime>) {
    log_anime_table(&page.items);
    tracing::info!(
        "Total: {} titles{}",
        page.items.len(),
        if page.has_next_page {
            " (more pages available)"
        } else {
            ""
        }
    );
}

/// Runs the `catalog details` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_catalog_details(client: &JikanClient, args: &IdArgs) -> Result<()> {
    let anime = client
        .anime_details(args.id)
        .await
        .context("failed to fetch details")?;

    tracing::info!("ID:        {}", anime.mal_id);
    tracing::info!("Title:     {}", anime.display_title());
    if let Some(japanese) = &anime.title_japanese {
        tracing::info!("Japanese:  {japanese}");
    }
    tracing::info!("Type:      {}", anime.media_type.as_deref().unwrap_or("-"));
    tracing::info!(
        "Episodes:  {}",
        anime
            .episodes
            .map_or_else(|| String::from("-"), |e| e.to_string())
    );
    tracing::info!("Status:    {}", anime.status.as_deref().unwrap_or("-"));
    tracing::info!(
        "Score:     {}",
        anime
            .score
            .map_or_else(|| String::from("-"), |s| format!("{s:.2}"))
    );
    let genres: Vec<&str> = anime.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres:    {}", genres.join(", "));
    if let Some(synopsis) = &anime.synopsis {
        tracing::info!("Synopsis:  {synopsis}");
    }

    Ok(())
}

/// Runs the `catalog characters` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_catalog_characters(client: &JikanClient, args: &IdArgs) -> Result<()> {
    let cast = client
        .anime_characters(args.id)
        .await
        .context("failed to fetch characters")?;

    tracing::info!("ID\tRole\t\tCharacter\t\tVoice (Japanese)");
    for entry in &cast {
        let voice = entry
            .voice_actors
            .iter()
            .find(|va| va.language == "Japanese")
            .map_or("-", |va| va.person.name.as_str());
        tracing::info!(
            "{}\t{}\t\t{}\t\t{}",
            entry.character.mal_id,
            entry.role,
            entry.character.name,
            voice,
        );
    }
    tracing::info!("Total: {} characters", cast.len());

    Ok(())
}

/// Runs the `catalog recommendations` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_catalog_recommendations(client: &JikanClient, args: &IdArgs) -> Result<()> {
    let recommendations = client
        .anime_recommendations(args.id)
        .await
        .context("failed to fetch recommendations")?;

    tracing::info!("ID\tVotes\tTitle");
    for rec in &recommendations {
        tracing::info!("{}\t{}\t{}", rec.entry.mal_id, rec.votes, rec.entry.title);
    }
    tracing::info!("Total: {} recommendations", recommendations.len());

    Ok(())
}

/// Runs the `catalog genres` subcommand.
///
/// # Errors
///
/// Returns an error if the API request fails.
#[instrument(skip_all)]
async fn run_catalog_genres(client: &JikanClient, args: &GenresArgs) -> Result<()> {
    let genres = client.genres().await.context("failed to fetch genres")?;
    let shown = if args.all {
        genres
    } else {
        popular_genres(&genres, args.min_count)
    };

    tracing::info!("ID\tCount\tName");
    for genre in &shown {
        tracing::info!("{}\t{}\t{}", genre.mal_id, genre.count, genre.name);
    }
    tracing::info!("Total: {} genres", shown.len());

    Ok(())
}

/// Runs the `catalog resolve` subcommand.
#[instrument(skip_all)]
async fn run_catalog_resolve(
    client: &JikanClient,
    resolver: &AggregateResolver,
    args: &ResolveArgs,
) {
    let resolved = resolver
        .resolve_titles(client, &args.ids, log_progress)
        .await;

    log_anime_table(&resolved);
    tracing::info!("Resolved {} of {} titles", resolved.len(), args.ids.len());
    tracing::debug!(snapshot = ?client.dispatcher().snapshot(), "dispatcher state");
}

/// Runs a `catalog` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the API request fails.
async fn run_catalog(command: CatalogSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_catalog_client(&config)?;

    match command {
        CatalogSubcommands::Top(args) => {
            let page = client
                .top_anime(args.filter.into())
                .await
                .context("failed to fetch top list")?;
            log_anime_page(&page);
            Ok(())
        }
        CatalogSubcommands::Search(args) => {
            let page = client
                .search_anime(&args.query, args.page)
                .await
                .context("failed to search titles")?;
            log_anime_page(&page);
            Ok(())
        }
        CatalogSubcommands::Details(args) => run_catalog_details(&client, &args).await,
        CatalogSubcommands::Characters(args) => run_catalog_characters(&client, &args).await,
        CatalogSubcommands::Recommendations(args) => {
            run_catalog_recommendations(&client, &args).await
        }
        CatalogSubcommands::Movies(args) => {
            let page = client
                .movies(args.page)
                .await
                .context("failed to fetch movies")?;
            log_anime_page(&page);
            Ok(())
        }
        CatalogSubcommands::Series(args) => {
            let page = client
                .series(args.page)
                .await
                .context("failed to fetch series")?;
            log_anime_page(&page);
            Ok(())
        }
        CatalogSubcommands::Genres(args) => run_catalog_genres(&client, &args).await,
        CatalogSubcommands::Genre(args) => {
            let page = client
                .anime_by_genre(args.id, args.page)
                .await
                .context("failed to fetch genre listing")?;
            log_anime_page(&page);
            Ok(())
        }
        CatalogSubcommands::Resolve(args) => {
            let resolver = AggregateResolver::new(config.resolver.item_delay())
                .paced_by(client.dispatcher().clone());
            run_catalog_resolve(&client, &resolver, &args).await;
            Ok(())
        }
    }
}

/// Runs the `session list` subcommand.
///
/// Fetches the profile, then resolves every id of the list through the catalog.
///
/// # Errors
///
/// Returns an error if the token is missing or the profile request fails.
#[instrument(skip_all)]
async fn run_session_list(
    session: &SessionClient,
    config: &AppConfig,
    token: &str,
    args: &ListArgs,
) -> Result<()> {
    let profile = session.me(token).await.context("failed to fetch profile")?;
    let ids = profile.list(args.list);

    if ids.is_empty() {
        tracing::info!("{} is empty.", args.list);
        return Ok(());
    }

    let client = build_catalog_client(config)?;
    let resolver = AggregateResolver::new(config.resolver.item_delay())
        .paced_by(client.dispatcher().clone());
    let resolved = resolver.resolve_titles(&client, ids, log_progress).await;

    log_anime_table(&resolved);
    tracing::info!(
        "{}: {} titles ({} could not be resolved)",
        args.list,
        ids.len(),
        ids.len().saturating_sub(resolved.len())
    );

    Ok(())
}

/// Runs a `session` subcommand.
///
/// # Errors
///
/// Returns an error if the token is missing, the client fails to build,
/// or the backend rejects the call.
async fn run_session(cmd: SessionCommand, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let token = cmd.token.as_deref();

    match cmd.command {
        SessionSubcommands::Register(args) => {
            let client = build_session_client(&config)?;
            let request = RegisterRequest {
                username: args.username,
                email: args.email,
                password: args.password,
            };
            let auth = client
                .register(&request)
                .await
                .context("registration failed")?;
            tracing::info!("Registered {} <{}>", auth.username, auth.email);
            tracing::info!("Token: {}", auth.token);
            Ok(())
        }
        SessionSubcommands::Login(args) => {
            let client = build_session_client(&config)?;
            let credentials = Credentials {
                email: args.email,
                password: args.password,
            };
            let auth = client.login(&credentials).await.context("login failed")?;
            tracing::info!("Logged in as {} <{}>", auth.username, auth.email);
            tracing::info!("Token: {}", auth.token);
            Ok(())
        }
        SessionSubcommands::Me => {
            let token = require_token(token)?;
            let client = build_session_client(&config)?;
            let profile = client.me(token).await.context("failed to fetch profile")?;
            tracing::info!("User:  {} <{}>", profile.username, profile.email);
            for kind in ListKind::ALL {
                tracing::info!("{:<10} {}", kind.as_str(), profile.list(kind).join(","));
            }
            Ok(())
        }
        SessionSubcommands::Toggle(args) => {
            let token = require_token(token)?;
            let client = build_session_client(&config)?;
            let response = client
                .toggle(token, args.list, &args.id)
                .await
                .context("failed to update list")?;
            tracing::info!(
                "{}",
                response
                    .message
                    .unwrap_or_else(|| format!("Toggled {} in {}", args.id, args.list))
            );
            Ok(())
        }
        SessionSubcommands::List(args) => {
            let token = require_token(token)?;
            let client = build_session_client(&config)?;
            run_session_list(&client, &config, token, &args).await
        }
    }
}

/// Runs a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written.
fn run_config(command: &ConfigSubcommands, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;

    match command {
        ConfigSubcommands::Show => {
            let config = AppConfig::load(&config_path).context("failed to load config")?;
            let content =
                toml::to_string_pretty(&config.with_defaults()).context("failed to render config")?;
            tracing::info!("# {}", config_path.display());
            for line in content.lines() {
                tracing::info!("{line}");
            }
            Ok(())
        }
        ConfigSubcommands::Init(args) => {
            if config_path.exists() && !args.force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            AppConfig::default().with_defaults().save(&config_path)?;
            tracing::info!("Wrote {}", config_path.display());
            Ok(())
        }
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog(cmd) => run_catalog(cmd.command, cli.dir.as_ref()).await,
        Commands::Session(cmd) => run_session(cmd, cli.dir.as_ref()).await,
        Commands::Config(cmd) => run_config(&cmd.command, cli.dir.as_ref()),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "anidex", &mut io::stdout());
            Ok(())
        }
    }
}
