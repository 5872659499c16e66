//! Web product: crawled pages.

use performline_api::RestClient;

use crate::error::PerformLineError;
use crate::models::WebPage;
use crate::query::{ListQuery, Query};

pub struct Web<'a> {
    rest: &'a RestClient,
}

impl<'a> Web<'a> {
    pub(crate) fn new(rest: &'a RestClient) -> Self {
        Self { rest }
    }

    pub async fn pages(&self, query: &ListQuery) -> Result<Vec<WebPage>, PerformLineError> {
        Ok(WebPage::all(self.rest, query.list_options()).await?)
    }

    pub async fn page(&self, id: i64) -> Result<WebPage, PerformLineError> {
        Ok(WebPage::get(self.rest, id).await?)
    }
}
