//! Query builders for list endpoints: the [`Query`] trait, [`QueryCommon`]
//! fields, and one builder per filter set.

use chrono::NaiveDate;
use performline_api::ListOptions;

/// Trait implemented by all list query builders. Converts the builder into
/// [`ListOptions`] and provides shared builder methods for pagination.
pub trait Query {
    /// Appends this query's filter parameters to `options`.
    fn add_to_options(&self, options: ListOptions) -> ListOptions;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    fn common(&self) -> &QueryCommon;

    /// Builds the list options for this query.
    fn list_options(&self) -> ListOptions {
        self.add_to_options(self.common().list_options())
    }

    /// Caps the number of records returned. Also used as the page size.
    fn with_limit(mut self, limit: usize) -> Self
    where
        Self: Sized,
    {
        self.get_common().limit = Some(limit);
        self
    }

    /// Skips this many records.
    fn with_offset(mut self, offset: usize) -> Self
    where
        Self: Sized,
    {
        self.get_common().offset = Some(offset);
        self
    }

    /// Retrieves every listed record individually for its full payload.
    fn with_autoload(mut self, autoload: bool) -> Self
    where
        Self: Sized,
    {
        self.get_common().autoload = autoload;
        self
    }
}

/// Pagination fields shared by every list query.
#[derive(Clone, Debug, Default)]
pub struct QueryCommon {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub autoload: bool,
}

impl QueryCommon {
    fn list_options(&self) -> ListOptions {
        let mut options = ListOptions::new().with_autoload(self.autoload);
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(offset) = self.offset {
            options = options.with_param("offset", offset);
        }
        options
    }
}

/// Query with no filters beyond pagination.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub common: QueryCommon,
}

impl Query for ListQuery {
    fn add_to_options(&self, options: ListOptions) -> ListOptions {
        options
    }

    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn common(&self) -> &QueryCommon {
        &self.common
    }
}

#[derive(Clone, Debug, Default)]
pub struct BrandQuery {
    pub common: QueryCommon,
    pub create_date: Option<NaiveDate>,
}

impl BrandQuery {
    /// Filters by creation date.
    pub fn with_create_date(mut self, create_date: NaiveDate) -> Self {
        self.create_date = Some(create_date);
        self
    }
}

impl Query for BrandQuery {
    fn add_to_options(&self, options: ListOptions) -> ListOptions {
        match self.create_date {
            Some(date) => options.with_param("create_date", date.format("%Y-%m-%d").to_string()),
            None => options,
        }
    }

    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn common(&self) -> &QueryCommon {
        &self.common
    }
}

#[derive(Clone, Debug, Default)]
pub struct CampaignQuery {
    pub common: QueryCommon,
    pub brand: Option<i64>,
}

impl CampaignQuery {
    pub fn with_brand(mut self, brand: i64) -> Self {
        self.brand = Some(brand);
        self
    }
}

impl Query for CampaignQuery {
    fn add_to_options(&self, options: ListOptions) -> ListOptions {
        match self.brand {
            Some(brand) => options.with_param("brand", brand),
            None => options,
        }
    }

    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn common(&self) -> &QueryCommon {
        &self.common
    }
}

/// Filters for scored content: items and chats.
#[derive(Clone, Debug, Default)]
pub struct ItemQuery {
    pub common: QueryCommon,
    pub brand: Option<i64>,
    pub campaign: Option<i64>,
}

pub type ChatQuery = ItemQuery;

impl ItemQuery {
    pub fn with_brand(mut self, brand: i64) -> Self {
        self.brand = Some(brand);
        self
    }

    pub fn with_campaign(mut self, campaign: i64) -> Self {
        self.campaign = Some(campaign);
        self
    }
}

impl Query for ItemQuery {
    fn add_to_options(&self, mut options: ListOptions) -> ListOptions {
        if let Some(brand) = self.brand {
            options = options.with_param("brand", brand);
        }
        if let Some(campaign) = self.campaign {
            options = options.with_param("campaign", campaign);
        }
        options
    }

    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn common(&self) -> &QueryCommon {
        &self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_has_no_params() {
        let options = ListQuery::default().list_options();
        assert!(options.params.is_empty());
        assert_eq!(options.limit, None);
        assert!(!options.autoload);
    }

    #[test]
    fn common_fields() {
        let options = ListQuery::default()
            .with_limit(10)
            .with_offset(20)
            .with_autoload(true)
            .list_options();
        assert_eq!(options.params["limit"], json!(10));
        assert_eq!(options.params["offset"], json!(20));
        assert_eq!(options.limit, Some(10));
        assert!(options.autoload);
    }

    #[test]
    fn brand_create_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let options = BrandQuery::default().with_create_date(date).list_options();
        assert_eq!(options.params["create_date"], json!("2024-02-29"));
    }

    #[test]
    fn item_filters() {
        let options = ItemQuery::default()
            .with_brand(3)
            .with_campaign(4)
            .with_limit(1)
            .list_options();
        assert_eq!(options.params["brand"], json!(3));
        assert_eq!(options.params["campaign"], json!(4));

        let options = CampaignQuery::default().with_brand(8).list_options();
        assert_eq!(options.params["brand"], json!(8));
        assert!(!options.params.contains_key("campaign"));
    }
}
