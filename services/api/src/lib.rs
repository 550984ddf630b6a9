mod cli;
mod infra;
mod routes;
mod score;
mod server;

use uplift_policy::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
