//! `performline tree`: brands, their campaigns, and each campaign's scored
//! items, one line per node.

use std::collections::HashMap;
use std::io::IsTerminal;

use anyhow::Result;
use clap::Args;
use performline_lib::{Client, Item, ItemQuery, ListQuery};

#[derive(Args)]
pub struct TreeArgs {
    /// Only walk this brand
    #[arg(long)]
    pub brand: Option<i64>,

    /// Disable coloured scores even on a terminal
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    fn of(score: i64) -> Self {
        match score {
            s if s <= 30 => Self::Low,
            s if s <= 70 => Self::Medium,
            _ => Self::High,
        }
    }

    fn ansi(self) -> &'static str {
        match self {
            Self::Low => "\x1b[1;31m",
            Self::Medium => "\x1b[1;33m",
            Self::High => "\x1b[1;32m",
        }
    }
}

fn score_label(score: i64, color: bool) -> String {
    let label = format!("(score: {:2})", score);
    if color {
        format!("{}{}\x1b[0m", ScoreBand::of(score).ansi(), label)
    } else {
        label
    }
}

fn item_line(item: &Item, source: &str, color: bool) -> String {
    let score = item.field_i64("score").unwrap_or(0);
    format!(
        "| \u{2514} Item {}: {} {} (source: {})",
        item.field_i64("id").unwrap_or_default(),
        item.field_str("type").unwrap_or_default(),
        score_label(score, color),
        source
    )
}

/// Caches traffic source names so each is fetched at most once.
struct SourceNames<'a> {
    client: &'a Client,
    names: HashMap<i64, String>,
}

impl<'a> SourceNames<'a> {
    fn new(client: &'a Client) -> Self {
        Self {
            client,
            names: HashMap::new(),
        }
    }

    async fn name_for(&mut self, item: &Item) -> String {
        let Some(id) = item.field_i64("traffic_source_id") else {
            return String::new();
        };
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }

        let name = match self.client.common().item_traffic_source(item).await {
            Ok(source) => source.field_str("name").unwrap_or_default().to_string(),
            Err(e) => {
                tracing::debug!("Traffic source {} unavailable: {}", id, e);
                String::new()
            }
        };
        self.names.insert(id, name.clone());
        name
    }
}

pub async fn run(args: &TreeArgs, client: &Client) -> Result<()> {
    let color = !args.no_color && std::io::stdout().is_terminal();
    let common = client.common();
    let mut sources = SourceNames::new(client);

    let brands = match args.brand {
        Some(id) => vec![common.brand(id).await?],
        None => common.brands(&Default::default()).await?,
    };

    for brand in &brands {
        println!(
            "Brand: {} (id: {})",
            brand.field_str("name").unwrap_or_default(),
            brand.field_i64("id").unwrap_or_default()
        );

        for campaign in common.brand_campaigns(brand, &ListQuery::default()).await? {
            println!(
                "| Campaign: {} (id: {})",
                campaign.field_str("name").unwrap_or_default(),
                campaign.field_i64("id").unwrap_or_default()
            );

            for item in common.campaign_items(&campaign, &ItemQuery::default()).await? {
                let source = sources.name_for(&item).await;
                println!("{}", item_line(&item, &source, color));
            }
        }
    }

    Ok(())
}
