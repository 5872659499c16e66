//! Resources shared by every product: brands, campaigns, rules, traffic
//! sources, items and remediation statuses.

use futures::stream::{BoxStream, StreamExt};
use performline_api::{Envelope, Record, RequestOptions, Resource, RestClient};
use serde_json::Value;

use crate::error::PerformLineError;
use crate::models::{
    Brand, BrandRule, Campaign, CampaignRule, Item, Rule, TrafficSource, REMEDIATION_STATUS_PATH,
};
use crate::query::{BrandQuery, CampaignQuery, ItemQuery, ListQuery, Query};

pub struct Common<'a> {
    rest: &'a RestClient,
}

/// Reads an integer id another record points at.
fn related_id<R: Resource>(
    record: &Record<R>,
    field: &str,
) -> Result<i64, PerformLineError> {
    record.field_i64(field).ok_or_else(|| {
        PerformLineError::InvalidInput(format!("{} has no {}", R::NAME, field))
    })
}

fn own_id<R: Resource>(
    record: &Record<R>,
) -> Result<i64, PerformLineError> {
    related_id(record, R::PRIMARY_KEY)
}

impl<'a> Common<'a> {
    pub(crate) fn new(rest: &'a RestClient) -> Self {
        Self { rest }
    }

    pub async fn brands(&self, query: &BrandQuery) -> Result<Vec<Brand>, PerformLineError> {
        Ok(Brand::all(self.rest, query.list_options()).await?)
    }

    pub async fn brand(&self, id: i64) -> Result<Brand, PerformLineError> {
        Ok(Brand::get(self.rest, id).await?)
    }

    /// Rules applied to one brand.
    pub async fn brand_rules(
        &self,
        brand_id: i64,
        query: &ListQuery,
    ) -> Result<Vec<BrandRule>, PerformLineError> {
        let options = query.list_options().with_path_value("brand_id", brand_id);
        Ok(BrandRule::all(self.rest, options).await?)
    }

    pub async fn campaigns(&self, query: &CampaignQuery) -> Result<Vec<Campaign>, PerformLineError> {
        Ok(Campaign::all(self.rest, query.list_options()).await?)
    }

    pub async fn campaign(&self, id: i64) -> Result<Campaign, PerformLineError> {
        Ok(Campaign::get(self.rest, id).await?)
    }

    /// Rules applied to one campaign.
    pub async fn campaign_rules(
        &self,
        campaign_id: i64,
        query: &ListQuery,
    ) -> Result<Vec<CampaignRule>, PerformLineError> {
        let options = query.list_options().with_path_value("campaign_id", campaign_id);
        Ok(CampaignRule::all(self.rest, options).await?)
    }

    pub async fn rules(&self, query: &ListQuery) -> Result<Vec<Rule>, PerformLineError> {
        Ok(Rule::all(self.rest, query.list_options()).await?)
    }

    pub async fn rule(&self, id: i64) -> Result<Rule, PerformLineError> {
        Ok(Rule::get(self.rest, id).await?)
    }

    pub async fn traffic_sources(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<TrafficSource>, PerformLineError> {
        Ok(TrafficSource::all(self.rest, query.list_options()).await?)
    }

    pub async fn traffic_source(&self, id: i64) -> Result<TrafficSource, PerformLineError> {
        Ok(TrafficSource::get(self.rest, id).await?)
    }

    pub async fn items(&self, query: &ItemQuery) -> Result<Vec<Item>, PerformLineError> {
        Ok(Item::all(self.rest, query.list_options()).await?)
    }

    pub async fn item(&self, id: i64) -> Result<Item, PerformLineError> {
        Ok(Item::get(self.rest, id).await?)
    }

    /// Streams items page by page instead of collecting them.
    pub fn items_stream(&self, query: &ItemQuery) -> BoxStream<'a, Result<Item, PerformLineError>> {
        Item::iall(self.rest, query.list_options())
            .map(|r| r.map_err(PerformLineError::from))
            .boxed()
    }

    /// Names of every remediation status defined on the platform.
    pub async fn remediation_statuses(&self) -> Result<Vec<String>, PerformLineError> {
        let response = self
            .rest
            .get(REMEDIATION_STATUS_PATH, RequestOptions::new())
            .await?;

        let statuses = match response.get("Results/Statuses") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(statuses)
    }

    /// Campaigns belonging to `brand`.
    pub async fn brand_campaigns(
        &self,
        brand: &Brand,
        query: &ListQuery,
    ) -> Result<Vec<Campaign>, PerformLineError> {
        let options = query.list_options().with_param("brand", own_id(brand)?);
        Ok(Campaign::all(self.rest, options).await?)
    }

    /// The brand `campaign` belongs to.
    pub async fn campaign_brand(&self, campaign: &Campaign) -> Result<Brand, PerformLineError> {
        self.brand(related_id(campaign, "brand_id")?).await
    }

    /// Items scored under `campaign`, optionally narrowed to one brand.
    pub async fn campaign_items(
        &self,
        campaign: &Campaign,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, PerformLineError> {
        let query = ItemQuery {
            campaign: Some(own_id(campaign)?),
            ..query.clone()
        };
        self.items(&query).await
    }

    pub async fn item_brand(&self, item: &Item) -> Result<Brand, PerformLineError> {
        self.brand(related_id(item, "brand_id")?).await
    }

    pub async fn item_campaign(&self, item: &Item) -> Result<Campaign, PerformLineError> {
        self.campaign(related_id(item, "campaign_id")?).await
    }

    pub async fn item_traffic_source(&self, item: &Item) -> Result<TrafficSource, PerformLineError> {
        self.traffic_source(related_id(item, "traffic_source_id")?)
            .await
    }
}
