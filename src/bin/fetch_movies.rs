//! Offline batch job: fetch full movie payloads from TMDB for every id in
//! the input file. Progress is checkpointed every 1000 movies so an
//! interrupted run resumes from the last persisted offset.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use recommend_a_movie_api::config::Config;
use recommend_a_movie_api::services::tmdb::{
    load_raw_output, read_movie_ids, save_raw_output, Checkpoint, TmdbClient,
};

const CHECKPOINT_INTERVAL: usize = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_movies=info,recommend_a_movie_api=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let client = TmdbClient::new(&config.tmdb_api_key, &config.tmdb_base_url)?;

    let movie_ids =
        read_movie_ids(&config.movie_ids_path).context("Failed to read movie id file")?;
    let start_index = Checkpoint::load(&config.checkpoint_path).processed_count;
    let mut all_movie_data =
        load_raw_output(&config.raw_movies_path).context("Failed to read previous output")?;

    info!(
        "Fetching {} movies, resuming at offset {}",
        movie_ids.len(),
        start_index
    );

    let progress = ProgressBar::new(movie_ids.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len} ({eta})")
            .progress_chars("=> "),
    );
    progress.set_message("Fetching movie data");
    progress.set_position(start_index as u64);

    for (i, movie_id) in movie_ids.iter().enumerate().skip(start_index) {
        if let Some(movie_data) = client.get_movie_details(*movie_id).await? {
            all_movie_data.push(movie_data);
        }
        progress.inc(1);

        let processed = i + 1;
        if processed % CHECKPOINT_INTERVAL == 0 || processed == movie_ids.len() {
            save_raw_output(&config.raw_movies_path, &all_movie_data)?;
            Checkpoint {
                processed_count: processed,
            }
            .save(&config.checkpoint_path)?;
            info!("Checkpoint saved. Processed {} movies so far.", processed);
        }
    }

    progress.finish();
    info!(
        "Data for {} movies has been saved to {}",
        all_movie_data.len(),
        config.raw_movies_path.display()
    );
    Ok(())
}
