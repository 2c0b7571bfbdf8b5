use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::MovieId;
use server::services::{MovieSummary, catalogue};
use server::{RepositoryKind, ServerConfig, SharedRepository};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// Movie catalogue web app and tools
#[derive(Parser)]
#[command(name = "movie-web")]
#[command(about = "Browse, review and watch-list movies from the Data1000Movies catalogue", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON web server
    Serve,

    /// Rebuild the SQLite database from the CSV files
    Populate,

    /// Search movies by title (case-insensitive substring match)
    Search {
        #[arg(long)]
        title: String,
    },

    /// List genres in catalogue order
    Genres,

    /// Show one movie with its reviews
    Movie {
        #[arg(long)]
        id: MovieId,
    },

    /// Hammer the home page service and report latencies
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Settings may live in a .env file next to the binary's working dir
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => server::serve(cli.config).await?,
        Commands::Populate => handle_populate(cli.config).await?,
        Commands::Search { title } => handle_search(&load(&cli.config).await?, title).await?,
        Commands::Genres => handle_genres(&load(&cli.config).await?).await?,
        Commands::Movie { id } => handle_movie(&load(&cli.config).await?, id).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(load(&cli.config).await?, requests, concurrent).await?,
    }

    Ok(())
}

async fn load(config: &ServerConfig) -> Result<SharedRepository> {
    println!("Loading catalogue from {}...", config.data_dir.display());
    let start = Instant::now();
    let repo = server::open_repository(config).await?;
    println!("{} Loaded catalogue in {:?}", "✓".green(), start.elapsed());
    Ok(repo)
}

/// Handle the 'populate' command
async fn handle_populate(mut config: ServerConfig) -> Result<()> {
    config.repository = RepositoryKind::Database;
    config.testing = true;
    info!("Rebuilding {:?} from {:?}", config.database_path, config.data_dir);
    let repo = load(&config).await?;

    let (movies, genres) = tokio::task::spawn_blocking(move || {
        Ok::<_, repository::RepositoryError>((repo.get_number_of_movies()?, repo.get_genre_list()?.len()))
    })
    .await
    .context("Populate task panicked")??;

    println!(
        "{} {} now holds {} movies in {} genres",
        "✓".green(),
        config.database_path.display(),
        movies,
        genres
    );
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(repo: &SharedRepository, title: String) -> Result<()> {
    let movies = catalogue::search_movies(repo, title.clone()).await?;

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if movies.is_empty() {
        println!("  no matches");
    }
    for movie in &movies {
        print_summary(movie);
    }
    Ok(())
}

/// Handle the 'genres' command
async fn handle_genres(repo: &SharedRepository) -> Result<()> {
    let genres = catalogue::get_genre_names(repo).await?;

    println!("{}", "Genres:".bold().blue());
    for (position, genre) in genres.iter().enumerate() {
        println!("{:>3}. {}", (position + 1).to_string().green(), genre);
    }
    Ok(())
}

/// Handle the 'movie' command
async fn handle_movie(repo: &SharedRepository, id: MovieId) -> Result<()> {
    let movie = catalogue::get_movie(repo, id)
        .await
        .map_err(|err| anyhow!("Could not show movie {}: {}", id, err))?;

    println!("{}", format!("{} ({})", movie.title, movie.year).bold().blue());
    println!("{}{}", "• ".green(), movie.description);
    if let Some(director) = &movie.director {
        println!("{}Director: {}", "• ".green(), director);
    }
    println!("{}Actors: {}", "• ".green(), movie.actors.join(", "));
    let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
    println!("{}Genres: {}", "• ".green(), genres.join(", "));
    if let Some(minutes) = movie.runtime_minutes {
        println!("{}Runtime: {} minutes", "• ".cyan(), minutes);
    }
    if let (Some(rating), Some(votes)) = (movie.rating, movie.votes) {
        println!("{}Rating: {:.1} ({} votes)", "• ".cyan(), rating, votes);
    }

    println!("Reviews:");
    for review in &movie.reviews {
        let author = review.user_name.as_deref().unwrap_or("anonymous");
        let rating = review
            .rating
            .map(|r| format!(" [{}/10]", r))
            .unwrap_or_default();
        println!(
            "  - {} {}{}: {}",
            review.timestamp.dimmed(),
            author.bold(),
            rating,
            review.review_text
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(repo: SharedRepository, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        return Err(anyhow!("requests and concurrent must both be positive"));
    }

    info!("Benchmarking {} home page requests, {} at a time", requests, concurrent);
    let permits = Arc::new(Semaphore::new(concurrent));
    let wall_clock = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let repo = Arc::clone(&repo);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            catalogue::home_page(&repo).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();
    info!("Benchmark finished in {:?}", total_time);

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / total_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_summary(movie: &MovieSummary) {
    let rating = movie
        .rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}: {} ({}) rated {}",
        movie.id.to_string().green(),
        movie.title,
        movie.year,
        rating
    );
}
