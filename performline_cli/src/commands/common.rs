use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use performline_lib::{BrandQuery, CampaignQuery, Client, ItemQuery, ListQuery};

use super::ListArgs;
use crate::output::{print, OutputFormat};

#[derive(Args)]
pub struct BrandsArgs {
    #[command(subcommand)]
    pub action: BrandsAction,
}

#[derive(Subcommand)]
pub enum BrandsAction {
    /// List all brands
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Only brands created on this date (YYYY-MM-DD)
        #[arg(long)]
        created: Option<NaiveDate>,
    },
    /// Show details about a single brand
    Show { id: i64 },
    /// List all rules associated with a brand
    Rules {
        id: i64,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Args)]
pub struct CampaignsArgs {
    #[command(subcommand)]
    pub action: CampaignsAction,
}

#[derive(Subcommand)]
pub enum CampaignsAction {
    /// List all campaigns
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Only campaigns belonging to this brand
        #[arg(long)]
        brand: Option<i64>,
    },
    /// Show details about a campaign
    Show { id: i64 },
    /// List all rules associated with a campaign
    Rules {
        id: i64,
        #[command(flatten)]
        list: ListArgs,
    },
}

/// `list`/`show` pair for resources with no extra filters.
#[derive(Subcommand)]
pub enum SimpleAction {
    /// List all records
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show details about one record
    Show { id: i64 },
}

#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: SimpleAction,
}

#[derive(Args)]
pub struct SourcesArgs {
    #[command(subcommand)]
    pub action: SimpleAction,
}

/// Brand and campaign filters for scored content.
#[derive(Args, Clone, Debug, Default)]
pub struct ContentFilter {
    /// Only content for this brand
    #[arg(long)]
    pub brand: Option<i64>,

    /// Only content for this campaign
    #[arg(long)]
    pub campaign: Option<i64>,
}

impl ContentFilter {
    pub fn query(&self, list: &ListArgs) -> ItemQuery {
        let mut query = list.apply(ItemQuery::default());
        query.brand = self.brand;
        query.campaign = self.campaign;
        query
    }
}

#[derive(Subcommand)]
pub enum ContentAction {
    /// List scored content
    List {
        #[command(flatten)]
        list: ListArgs,
        #[command(flatten)]
        filter: ContentFilter,
    },
    /// Show details about one record
    Show { id: i64 },
}

#[derive(Args)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub action: ContentAction,
}

pub async fn run_brands(args: &BrandsArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let common = client.common();
    match &args.action {
        BrandsAction::List { list, created } => {
            let mut query = list.apply(BrandQuery::default());
            if let Some(date) = created {
                query = query.with_create_date(*date);
            }
            print(&common.brands(&query).await?, format)
        }
        BrandsAction::Show { id } => print(&common.brand(*id).await?, format),
        BrandsAction::Rules { id, list } => {
            let query = list.apply(ListQuery::default());
            print(&common.brand_rules(*id, &query).await?, format)
        }
    }
}

pub async fn run_campaigns(
    args: &CampaignsArgs,
    client: &Client,
    format: &OutputFormat,
) -> Result<()> {
    let common = client.common();
    match &args.action {
        CampaignsAction::List { list, brand } => {
            let mut query = list.apply(CampaignQuery::default());
            query.brand = *brand;
            print(&common.campaigns(&query).await?, format)
        }
        CampaignsAction::Show { id } => print(&common.campaign(*id).await?, format),
        CampaignsAction::Rules { id, list } => {
            let query = list.apply(ListQuery::default());
            print(&common.campaign_rules(*id, &query).await?, format)
        }
    }
}

pub async fn run_rules(args: &RulesArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let common = client.common();
    match &args.action {
        SimpleAction::List { list } => {
            print(&common.rules(&list.apply(ListQuery::default())).await?, format)
        }
        SimpleAction::Show { id } => print(&common.rule(*id).await?, format),
    }
}

pub async fn run_sources(args: &SourcesArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let common = client.common();
    match &args.action {
        SimpleAction::List { list } => print(
            &common.traffic_sources(&list.apply(ListQuery::default())).await?,
            format,
        ),
        SimpleAction::Show { id } => print(&common.traffic_source(*id).await?, format),
    }
}

pub async fn run_items(args: &ItemsArgs, client: &Client, format: &OutputFormat) -> Result<()> {
    let common = client.common();
    match &args.action {
        ContentAction::List { list, filter } => {
            print(&common.items(&filter.query(list)).await?, format)
        }
        ContentAction::Show { id } => print(&common.item(*id).await?, format),
    }
}

pub async fn run_statuses(client: &Client, format: &OutputFormat) -> Result<()> {
    let statuses = client.common().remediation_statuses().await?;
    print(&statuses, format)
}
