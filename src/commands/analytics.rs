//! Analytics command handlers.

use anyhow::Result;
use book_analytics_core::Catalog;

use crate::output;

pub async fn run_availability_command(catalog: &Catalog) -> Result<()> {
    output::print_json(&catalog.availability_distribution().await?)
}

pub async fn run_price_stats_command(catalog: &Catalog) -> Result<()> {
    output::print_json(&catalog.price_stats().await?)
}

pub async fn run_price_buckets_command(catalog: &Catalog, bucket_size: f64) -> Result<()> {
    output::print_json(&catalog.price_buckets(bucket_size).await?)
}

pub async fn run_title_words_command(catalog: &Catalog, top_n: usize) -> Result<()> {
    output::print_json(&catalog.title_words(top_n).await?)
}
